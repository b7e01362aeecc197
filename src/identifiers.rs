//! Section identifiers exposed by a line: explicit tags and heading slugs.

use crate::links;

/// Prefixes that turn a `{` into an explicit identifier tag, in scan order.
const ID_PREFIXES: [&str; 2] = ["#", "id="];

/// Derive the identifier a line exposes, if any.
///
/// Recognized, in priority order:
/// - explicit tags `{#identifier}` or `{id=identifier}` anywhere on the line
///   (the first qualifying brace wins);
/// - headings, slugified: lowercased, whitespace runs joined with `-`.
///
/// Only lines starting with `#` are headings, and a line starting with `# `
/// (hash then space) is deliberately not one: `#text` yields `text`, while
/// `# text` yields nothing.
///
/// Lines inside HTML comments or code blocks are not recognized as such here;
/// callers must not pass them in.
pub fn extract_identifier(line: &str) -> Option<String> {
    if let Some(explicit) = find_explicit_identifier(line) {
        return non_empty(explicit.to_string());
    }

    if !line.starts_with('#') || line.starts_with("# ") {
        return None;
    }

    let body_start = line.find(|c| return c != '#' && c != ' ').unwrap_or(line.len());
    let heading = heading_text(line, body_start);
    let slug = heading
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    return non_empty(slug);
}

/// Scan every `{` for a known prefix followed by a closing `}`.
fn find_explicit_identifier(line: &str) -> Option<&str> {
    for (brace, _) in line.match_indices('{') {
        let after_brace = brace.saturating_add(1);
        for prefix in ID_PREFIXES {
            let id_start = after_brace.saturating_add(prefix.len());
            if id_start >= line.len() || line.get(after_brace..id_start) != Some(prefix) {
                continue;
            }
            let Some(rest) = line.get(id_start..) else {
                continue;
            };
            if let Some(length) = rest.find('}') {
                return rest.get(..length);
            }
        }
    }
    return None;
}

/// Heading text with at most one embedded link simplified: a figure is
/// dropped entirely, any other link is replaced by its alt text.
fn heading_text(line: &str, body_start: usize) -> String {
    let body = line.get(body_start..).unwrap_or("");
    let Some(link) = links::find_link(line, body_start) else {
        return body.to_string();
    };

    let before = line.get(body_start..link.span.start).unwrap_or("");
    let after = line.get(link.span.end..).unwrap_or("");
    return match before.strip_suffix('!') {
        Some(before_figure) => format!("{before_figure}{after}"),
        None => format!("{before}{}{after}", link.alt_text),
    };
}

/// An empty identifier cannot be targeted by a fragment.
fn non_empty(identifier: String) -> Option<String> {
    return (!identifier.is_empty()).then_some(identifier);
}
