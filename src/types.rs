/// Core domain types: links and their parsed locations.
use std::ops::Range;

use crate::references::ReferenceTable;

/// A link construct found in one line of an article.
/// Immutable once extracted; resolution produces a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Text between the square brackets.
    pub alt_text: String,
    /// Which syntax the link was written in.
    pub kind: LinkKind,
    /// Parsed form of `raw_location`. Empty for unresolved reference usages.
    pub location: Location,
    /// Location as written: a path or URL, or a label for reference usages.
    pub raw_location: String,
    /// Byte range in the source line, from the opening `[` to one past the
    /// closing `)` or `]`. A leading `!` of an image is not included.
    pub span: Range<usize>,
}

impl Link {
    /// Build a link, parsing the location unless it is a reference label.
    pub fn new(alt_text: &str, kind: LinkKind, raw_location: &str, span: Range<usize>) -> Self {
        let location = match kind {
            LinkKind::Definition | LinkKind::Inline => Location::parse(raw_location),
            LinkKind::Reference | LinkKind::Shortcut => Location::default(),
        };
        return Self {
            alt_text: alt_text.to_string(),
            kind,
            location,
            raw_location: raw_location.to_string(),
            span,
        };
    }

    /// Substitute reference indirection. Direct links resolve to themselves;
    /// reference usages resolve through the article's table, or to `None`
    /// when the label was never declared.
    pub fn resolve(&self, references: &ReferenceTable) -> Option<Self> {
        return match self.kind {
            LinkKind::Definition | LinkKind::Inline => Some(self.clone()),
            LinkKind::Reference | LinkKind::Shortcut => {
                let target = references.get(&self.raw_location)?;
                Some(Self {
                    alt_text: self.alt_text.clone(),
                    kind: LinkKind::Inline,
                    location: Location::parse(target),
                    raw_location: target.to_string(),
                    span: self.span.clone(),
                })
            },
        };
    }
}

/// The syntax a link was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// A `[label]: location` line declaring a reference target.
    Definition,
    /// `[alt](location)` or `![alt](location)`.
    Inline,
    /// `[alt][label]` or the collapsed `[label][]`.
    Reference,
    /// A bare `[label]`. Only a link when the label is declared.
    Shortcut,
}

/// URL-like components of a link location. The query string is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Section anchor after `#`, if non-empty.
    pub fragment: Option<String>,
    /// Authority after `//`, if non-empty.
    pub host: Option<String>,
    /// Path component, possibly empty.
    pub path: String,
    /// Lowercased scheme such as `https` or `mailto`.
    pub scheme: Option<String>,
}

impl Location {
    /// Split a raw location into scheme, host, path and fragment.
    ///
    /// `/wiki/Foo#bar` has no scheme or host; `//example.com/x` has a host
    /// but no scheme; `mailto:someone` has a scheme and a path.
    pub fn parse(raw: &str) -> Self {
        let (rest, fragment) = match raw.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (raw, None),
        };
        let rest = rest.split_once('?').map_or(rest, |(before, _)| return before);
        let (scheme, rest) = split_scheme(rest);

        let (host, path) = match rest.strip_prefix("//") {
            Some(authority) => {
                let end = authority.find('/').unwrap_or(authority.len());
                let (host, path) = authority.split_at(end);
                (Some(host), path)
            },
            None => (None, rest),
        };

        return Self {
            fragment: non_empty(fragment),
            host: non_empty(host),
            path: path.to_string(),
            scheme: scheme.map(str::to_ascii_lowercase),
        };
    }
}

/// Treat an empty component the same as an absent one.
fn non_empty(part: Option<&str>) -> Option<String> {
    return part.filter(|p| return !p.is_empty()).map(String::from);
}

/// Detect a leading `scheme:` as defined by RFC 3986.
fn split_scheme(raw: &str) -> (Option<&str>, &str) {
    let Some((candidate, rest)) = raw.split_once(':') else {
        return (None, raw);
    };
    let mut chars = candidate.chars();
    let valid_start = chars.next().is_some_and(|c| return c.is_ascii_alphabetic());
    let valid_rest = chars.all(|c| return c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if valid_start && valid_rest {
        return (Some(candidate), rest);
    }
    return (None, raw);
}
