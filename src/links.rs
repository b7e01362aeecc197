//! Link extraction: inline links, images, reference usages and definitions.
//!
//! Scanning works on bytes. Every delimiter is ASCII, so all offsets land on
//! char boundaries and can be used to slice the line.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{Link, LinkKind};

/// `[label]: location`, indented by at most three spaces.
#[allow(clippy::expect_used, reason = "hardcoded pattern, checked by tests")]
static DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^ {0,3}\[([^\]]+)\]:\s*(?:<([^>]*)>|(\S+))").expect("valid regex");
});

/// Labels of shortcut brackets that are task list boxes, not links.
const TASK_BOXES: [&str; 2] = ["x", "X"];

/// Find the opening bracket matching `open` and return the index of its closer.
/// Backslash-escaped delimiters are skipped.
fn find_matching(bytes: &[u8], open: usize, opening: u8, closing: u8) -> Option<usize> {
    let mut depth = 0_usize;
    let mut escaped = false;
    for (index, &byte) in bytes.iter().enumerate().skip(open) {
        if escaped {
            escaped = false;
            continue;
        }
        if byte == b'\\' {
            escaped = true;
        } else if byte == opening {
            depth = depth.saturating_add(1);
        } else if byte == closing {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(index);
            }
        }
    }
    return None;
}

/// Parse a `[label]: location` declaration line into a `Definition` link.
/// Footnote definitions (`[^1]: text`) are not references.
pub fn find_definition(line: &str) -> Option<Link> {
    let captures = DEFINITION.captures(line)?;
    let label = captures.get(1)?.as_str();
    if label.starts_with('^') {
        return None;
    }
    let location = captures.get(2).or_else(|| return captures.get(3))?.as_str();
    let start = line.find('[')?;
    let end = captures.get(0)?.end();
    return Some(Link::new(label, LinkKind::Definition, location, start..end));
}

/// Find the first link construct starting at or after byte offset `start`.
///
/// Returns `None` if there is none, or if `start` is not a char boundary.
pub fn find_link(line: &str, start: usize) -> Option<Link> {
    let mut cursor = start;
    loop {
        let offset = line.get(cursor..)?.find('[')?;
        let open = cursor.saturating_add(offset);
        if !is_escaped(line.as_bytes(), open)
            && let Some(link) = link_at(line, open)
        {
            return Some(link);
        }
        cursor = open.saturating_add(1);
    }
}

/// Find every link on a line, in order of their opening brackets.
///
/// A definition line yields only its definition. Links nested in another
/// link's alt text (a figure inside a link) are reported after the outer link.
pub fn find_links(line: &str) -> Vec<Link> {
    if let Some(definition) = find_definition(line) {
        return vec![definition];
    }

    let mut links = Vec::new();
    let mut cursor = 0_usize;
    while let Some(link) = find_link(line, cursor) {
        cursor = if link.alt_text.contains('[') {
            link.span.start.saturating_add(1)
        } else {
            link.span.end
        };
        links.push(link);
    }
    return links;
}

/// `[alt][label]`, with an empty label meaning the alt text is the label.
fn full_reference(line: &str, open: usize, alt_text: &str, label_open: usize) -> Option<Link> {
    let label_start = label_open.saturating_add(1);
    let label_close = label_start.saturating_add(line.get(label_start..)?.find(']')?);
    let label = line.get(label_start..label_close)?;
    let label = if label.trim().is_empty() { alt_text } else { label };
    let end = label_close.saturating_add(1);
    return Some(Link::new(alt_text, LinkKind::Reference, label, open..end));
}

/// `[alt](destination "title")`; the destination may be wrapped in `<>`.
fn inline_link(line: &str, open: usize, alt_text: &str, paren_open: usize) -> Option<Link> {
    let paren_close = find_matching(line.as_bytes(), paren_open, b'(', b')')?;
    let inner = line.get(paren_open.saturating_add(1)..paren_close)?.trim();
    let destination = match inner.strip_prefix('<') {
        Some(wrapped) => wrapped.split_once('>').map_or(wrapped, |(inside, _)| return inside),
        None => inner.split_whitespace().next().unwrap_or(""),
    };
    let end = paren_close.saturating_add(1);
    return Some(Link::new(alt_text, LinkKind::Inline, destination, open..end));
}

/// Whether the byte at `index` is escaped: preceded by an odd run of backslashes.
fn is_escaped(bytes: &[u8], index: usize) -> bool {
    let backslashes = bytes
        .get(..index)
        .unwrap_or_default()
        .iter()
        .rev()
        .take_while(|&&byte| return byte == b'\\')
        .count();
    return !backslashes.is_multiple_of(2);
}

/// Try to read a link whose alt text opens at `open`.
fn link_at(line: &str, open: usize) -> Option<Link> {
    let bytes = line.as_bytes();
    let close = find_matching(bytes, open, b'[', b']')?;
    let alt_text = line.get(open.saturating_add(1)..close)?;
    let after = close.saturating_add(1);

    return match bytes.get(after) {
        Some(b'(') => inline_link(line, open, alt_text, after),
        Some(b'[') => full_reference(line, open, alt_text, after),
        Some(b':') => None,
        _ => shortcut_reference(open, alt_text, after),
    };
}

/// A bare `[label]`. Footnote markers and task boxes are never links.
fn shortcut_reference(open: usize, label: &str, end: usize) -> Option<Link> {
    let trimmed = label.trim();
    if trimmed.is_empty() || trimmed.starts_with('^') || TASK_BOXES.contains(&trimmed) {
        return None;
    }
    return Some(Link::new(label, LinkKind::Shortcut, label, open..end));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_link_offsets_cover_construct() {
        let line = "See [the team](/wiki/People/The_Team) now.";
        let link = find_link(line, 0).unwrap();
        assert_eq!(link.kind, LinkKind::Inline);
        assert_eq!(link.alt_text, "the team");
        assert_eq!(link.raw_location, "/wiki/People/The_Team");
        assert_eq!(&line[link.span.clone()], "[the team](/wiki/People/The_Team)");
    }

    #[test]
    fn image_span_starts_at_bracket() {
        let line = "![Logo](img/logo.png \"osu! logo\")";
        let link = find_link(line, 0).unwrap();
        assert_eq!(link.span.start, 1);
        assert_eq!(link.raw_location, "img/logo.png");
        assert_eq!(link.span.end, line.len());
    }

    #[test]
    fn balanced_parentheses_in_location() {
        let line = "[x](/wiki/Foo_(bar)) tail";
        let link = find_link(line, 0).unwrap();
        assert_eq!(link.raw_location, "/wiki/Foo_(bar)");
    }

    #[test]
    fn angle_bracket_destination() {
        let link = find_link("[x](<img/a b.png>)", 0).unwrap();
        assert_eq!(link.raw_location, "img/a b.png");
    }

    #[test]
    fn search_starts_at_offset() {
        let line = "[a](/wiki/A) and [b](/wiki/B)";
        let link = find_link(line, 1).unwrap();
        assert_eq!(link.raw_location, "/wiki/B");
    }

    #[test]
    fn multiple_links_on_one_line() {
        let links = find_links("[a](/wiki/A), [b][ref] and [c][]");
        let kinds: Vec<LinkKind> = links.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LinkKind::Inline, LinkKind::Reference, LinkKind::Reference]);
        assert_eq!(links[1].raw_location, "ref");
        assert_eq!(links[2].raw_location, "c");
    }

    #[test]
    fn figure_nested_in_link_is_found() {
        let links = find_links("[![Badge](img/badge.png)](/wiki/Badges)");
        let locations: Vec<&str> = links.iter().map(|l| l.raw_location.as_str()).collect();
        assert_eq!(locations, vec!["/wiki/Badges", "img/badge.png"]);
    }

    #[test]
    fn shortcut_reference() {
        let link = find_link("Read the [ASC] first.", 0).unwrap();
        assert_eq!(link.kind, LinkKind::Shortcut);
        assert_eq!(link.raw_location, "ASC");
    }

    #[test]
    fn footnotes_and_task_boxes_are_not_links() {
        assert!(find_links("Claim[^1] and - [x] done - [ ] todo").is_empty(), "no links expected");
    }

    #[test]
    fn escaped_bracket_is_skipped() {
        assert!(find_link(r"not \[a link](/wiki/A)", 0).is_none(), "escaped bracket");
    }

    #[test]
    fn escaped_backslash_does_not_escape_bracket() {
        let link = find_link(r"a literal \\[link](/wiki/A)", 0).unwrap();
        assert_eq!(link.raw_location, "/wiki/A");
        assert!(find_link(r"\\\[not](/wiki/A)", 0).is_none(), "odd run escapes");
    }

    #[test]
    fn definition_line() {
        let links = find_links("[asc]: /wiki/Article_styling_criteria \"ASC\"");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].kind, LinkKind::Definition);
        assert_eq!(links[0].alt_text, "asc");
        assert_eq!(links[0].raw_location, "/wiki/Article_styling_criteria");
    }

    #[test]
    fn footnote_definition_is_not_a_reference() {
        assert!(find_definition("[^note]: Some text.").is_none(), "footnote definition");
    }

    #[test]
    fn definition_is_not_a_usage() {
        assert!(find_link("[asc]: /wiki/ASC", 0).is_none(), "definition syntax");
    }
}
