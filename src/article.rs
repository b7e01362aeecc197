//! Article model: one wiki file parsed into line-indexed links and identifiers.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde_yaml::Mapping;

use crate::error::Error;
use crate::identifiers;
use crate::links;
use crate::references::ReferenceTable;
use crate::types::{Link, LinkKind};

/// The canonical-language article file every article directory is expected to have.
pub const CANONICAL_FILENAME: &str = "en.md";

/// Front matter block delimiter.
const FRONT_MATTER_DELIMITER: &str = "---";

/// Opening and closing markers of fenced code blocks.
const FENCES: [&str; 2] = ["```", "~~~"];

/// A parsed wiki article. Immutable once built.
#[derive(Debug, Clone)]
pub struct Article {
    /// Directory containing the article, relative to the repository root.
    pub directory: PathBuf,
    /// File name such as `en.md` or `pt-br.md`.
    pub filename: String,
    /// Leading YAML front matter, empty when absent.
    pub front_matter: Mapping,
    /// Every identifier a fragment may target.
    pub identifiers: BTreeSet<String>,
    /// One-based line number to line contents, for every body line.
    pub lines: BTreeMap<usize, ArticleLine>,
    /// Normalized path relative to the repository root.
    pub path: PathBuf,
    /// Reference definitions declared anywhere in the article.
    pub references: ReferenceTable,
}

/// A single body line and the links found on it.
#[derive(Debug, Clone)]
pub struct ArticleLine {
    /// Links in order of appearance. Empty inside code blocks.
    pub links: Vec<Link>,
    /// The line exactly as written.
    pub raw: String,
}

impl Article {
    /// Build an article from file content without touching the filesystem.
    ///
    /// Code blocks and HTML comments contribute no links, references or
    /// identifiers; inline code spans contribute no links. A leading `---`
    /// block that is not a YAML mapping is body text.
    pub fn from_content(path: &Path, content: &str) -> Self {
        let raw_lines: Vec<&str> = content.lines().collect();
        let (front_matter, body_start) = split_front_matter(path, &raw_lines);
        let scannable = scannable_lines(&raw_lines, body_start);
        let references =
            ReferenceTable::from_lines(scannable.values().filter_map(|text| return text.as_deref()));

        let mut identifiers = BTreeSet::new();
        let mut lines = BTreeMap::new();
        for (&number, text) in &scannable {
            let links = match text {
                Some(text) => {
                    if let Some(identifier) = identifiers::extract_identifier(text) {
                        identifiers.insert(identifier);
                    }
                    extract_line_links(text, &references)
                },
                None => Vec::new(),
            };
            let raw = raw_lines
                .get(number.saturating_sub(1))
                .copied()
                .unwrap_or_default()
                .to_string();
            lines.insert(number, ArticleLine { links, raw });
        }

        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let filename = path
            .file_name()
            .map(|name| return name.to_string_lossy().into_owned())
            .unwrap_or_default();

        return Self {
            directory,
            filename,
            front_matter,
            identifiers,
            lines,
            path: path.to_path_buf(),
            references,
        };
    }

    /// Whether this is the canonical-language version of its article.
    pub fn is_canonical(&self) -> bool {
        return self.filename == CANONICAL_FILENAME;
    }

    /// Total number of links across all lines.
    pub fn link_count(&self) -> usize {
        return self.lines.values().map(|line| return line.links.len()).sum();
    }

    /// Read and parse an article. `path` is relative to `root`.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` if the file doesn't exist, or
    /// `Error::Io` for other read failures.
    pub fn parse(root: &Path, path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(root.join(path)) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Ok(Self::from_content(path, &content));
    }
}

/// Byte ranges of inline code spans: a backtick run up to the next run of
/// the same length. An unmatched run is literal text.
fn code_spans(line: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut cursor = 0_usize;
    while let Some(offset) = line.get(cursor..).and_then(|rest| return rest.find('`')) {
        let open = cursor.saturating_add(offset);
        let run = backtick_run(line, open);
        let content_start = open.saturating_add(run);
        match find_closing_run(line, content_start, run) {
            Some(end) => {
                spans.push(open..end);
                cursor = end;
            },
            None => cursor = content_start,
        }
    }
    return spans;
}

/// Length of the backtick run starting at `start`.
fn backtick_run(line: &str, start: usize) -> usize {
    return line
        .get(start..)
        .map_or(0, |rest| return rest.bytes().take_while(|&b| return b == b'`').count());
}

/// Links on a scannable line, minus those inside code spans and shortcut
/// brackets whose label is not declared (those are plain text).
fn extract_line_links(text: &str, references: &ReferenceTable) -> Vec<Link> {
    let spans = code_spans(text);
    return links::find_links(text)
        .into_iter()
        .filter(|link| return !spans.iter().any(|span| return span.contains(&link.span.start)))
        .filter(|link| {
            return link.kind != LinkKind::Shortcut || references.get(&link.raw_location).is_some();
        })
        .collect();
}

/// End offset of the first backtick run of exactly `run` characters at or after `from`.
fn find_closing_run(line: &str, from: usize, run: usize) -> Option<usize> {
    let mut cursor = from;
    loop {
        let offset = line.get(cursor..)?.find('`')?;
        let start = cursor.saturating_add(offset);
        let length = backtick_run(line, start);
        let end = start.saturating_add(length);
        if length == run {
            return Some(end);
        }
        cursor = end;
    }
}

/// The fence marker a line opens or closes, if any.
fn fence_marker(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    return FENCES.into_iter().find(|fence| return trimmed.starts_with(fence));
}

/// Replace HTML comment text with spaces of the same byte length, so link
/// offsets on the rest of the line stay valid. `in_comment` carries an open
/// comment across lines.
fn mask_comments(line: &str, in_comment: &mut bool) -> String {
    let mut masked = String::with_capacity(line.len());
    let mut rest = line;
    loop {
        if *in_comment {
            let Some(end) = rest.find("-->") else {
                masked.push_str(&" ".repeat(rest.len()));
                return masked;
            };
            let (comment, after) = rest.split_at(end.saturating_add(3));
            masked.push_str(&" ".repeat(comment.len()));
            rest = after;
            *in_comment = false;
        } else {
            let Some(start) = rest.find("<!--") else {
                masked.push_str(rest);
                return masked;
            };
            let (before, comment) = rest.split_at(start);
            masked.push_str(before);
            masked.push_str("    ");
            rest = comment.get(4..).unwrap_or_default();
            *in_comment = true;
        }
    }
}

/// Body lines keyed by one-based number. Lines inside fenced code blocks map
/// to `None`; other lines map to their text with comments masked out.
fn scannable_lines(raw_lines: &[&str], body_start: usize) -> BTreeMap<usize, Option<String>> {
    let mut scannable = BTreeMap::new();
    let mut open_fence: Option<&str> = None;
    let mut in_comment = false;

    for (index, line) in raw_lines.iter().enumerate().skip(body_start) {
        let number = index.saturating_add(1);
        let marker = fence_marker(line);
        if let Some(fence) = open_fence {
            if marker == Some(fence) {
                open_fence = None;
            }
            scannable.insert(number, None);
            continue;
        }
        if marker.is_some() && !in_comment {
            open_fence = marker;
            scannable.insert(number, None);
            continue;
        }
        scannable.insert(number, Some(mask_comments(line, &mut in_comment)));
    }
    return scannable;
}

/// Parse a leading `---` delimited YAML block. Returns the mapping and the
/// index of the first body line. A block that is not a YAML mapping is
/// left in the body, since `---` is also a thematic break.
fn split_front_matter(path: &Path, raw_lines: &[&str]) -> (Mapping, usize) {
    if raw_lines.first() != Some(&FRONT_MATTER_DELIMITER) {
        return (Mapping::new(), 0);
    }
    let Some(close) = raw_lines
        .iter()
        .skip(1)
        .position(|line| return *line == FRONT_MATTER_DELIMITER)
        .map(|offset| return offset.saturating_add(1))
    else {
        return (Mapping::new(), 0);
    };

    let yaml = raw_lines.get(1..close).unwrap_or_default().join("\n");
    if yaml.trim().is_empty() {
        return (Mapping::new(), close.saturating_add(1));
    }
    return match serde_yaml::from_str::<Mapping>(&yaml) {
        Ok(front_matter) => (front_matter, close.saturating_add(1)),
        Err(e) => {
            log::warn!("{}: leading `---` block is not front matter: {e}", path.display());
            (Mapping::new(), 0)
        },
    };
}
