use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::article::Article;
use crate::checker::LineErrors;
use crate::config::CONFIG_FILE;
use crate::error::{Error, LinkError};

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// An article's anchors and front matter in the `ids` JSON output.
#[derive(Serialize)]
struct JsonArticle<'a> {
    /// Article path relative to the repository root.
    file: String,
    /// Leading YAML front matter, empty when absent.
    front_matter: &'a serde_yaml::Mapping,
    /// Identifiers a fragment may target, sorted.
    identifiers: &'a BTreeSet<String>,
}

/// One failing link in the JSON report.
#[derive(Serialize)]
struct JsonFailure<'a> {
    /// One-based character column of the link's opening bracket.
    column: usize,
    /// Classified failure.
    error: &'a LinkError,
    /// Article containing the link.
    file: String,
    /// One-based line number.
    line: usize,
    /// Link location as written.
    location: &'a str,
}

/// One-based character column of a byte offset in a line.
fn column(raw_line: &str, byte_offset: usize) -> usize {
    let chars = raw_line.get(..byte_offset).map_or(0, |before| return before.chars().count());
    return chars.saturating_add(1);
}

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::FileNotFound { path } => format!("\
# Error: File Not Found

`{}` does not exist.
", path.display()),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::Json(e) => format!("\
# Error: JSON Serialization

{e}
"),
        Error::RedirectsNotFound { path } => render_redirects_not_found(path),
        Error::TomlDe(e) => format!("\
# Error: Invalid Config

{e}

## Fix

Correct `{CONFIG_FILE}`, or delete it to use the defaults.
"),
        Error::UnhandledLink { article, location } => render_unhandled_link(article, location),
        Error::Watch { reason } => format!("\
# Error: Watch

{reason}
"),
    };
}

/// Render an article's identifiers and front matter as pretty-printed JSON.
///
/// # Errors
///
/// Returns `Error::Json` if the front matter has keys JSON cannot represent.
pub fn render_article_json(article: &Article) -> Result<String, Error> {
    let json = JsonArticle {
        file: article.path.display().to_string(),
        front_matter: &article.front_matter,
        identifiers: &article.identifiers,
    };
    return Ok(serde_json::to_string_pretty(&json)?);
}

/// Render every failure as `path:line:column: location: message` lines.
pub fn render_failures_text(report: &[(&Article, &LineErrors)]) -> String {
    let mut out = String::new();
    for (article, errors) in report {
        for (number, failures) in *errors {
            let raw_line = article.lines.get(number).map_or("", |line| return line.raw.as_str());
            for failure in failures {
                let _ = writeln!(
                    out,
                    "{}:{number}:{}: {}: {}",
                    article.path.display(),
                    column(raw_line, failure.link.span.start),
                    failure.link.raw_location,
                    failure.error,
                );
            }
        }
    }
    return out;
}

/// Render every failure as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails.
pub fn render_failures_json(report: &[(&Article, &LineErrors)]) -> Result<String, Error> {
    let mut failures = Vec::new();
    for (article, errors) in report {
        for (&number, line_failures) in *errors {
            let raw_line = article.lines.get(&number).map_or("", |line| return line.raw.as_str());
            for failure in line_failures {
                failures.push(JsonFailure {
                    column: column(raw_line, failure.link.span.start),
                    error: &failure.error,
                    file: article.path.display().to_string(),
                    line: number,
                    location: &failure.link.raw_location,
                });
            }
        }
    }
    return Ok(serde_json::to_string_pretty(&failures)?);
}

fn render_redirects_not_found(path: &Path) -> String {
    return format!("\
# Error: Redirect File Not Found

`{}` does not exist.

## Fix

Run from the repository root, or point `redirects` in `{CONFIG_FILE}` at the file:

    redirects = \"wiki/redirect.yaml\"
", path.display());
}

fn render_unhandled_link(article: &Path, location: &str) -> String {
    return format!("\
# Error: Unhandled Link Type

`{location}` in `{}` has a host but no scheme.

This is a bug in link extraction, not in the article. Please report it with
the line containing the link.
", article.display());
}
