//! Redirect table: legacy wiki paths mapped to their current destination.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;

/// A `"source": "destination"` data line.
#[allow(clippy::expect_used, reason = "hardcoded pattern, checked by tests")]
static ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r#"^"([^"]+)"\s*:\s*"([^"]*)""#).expect("valid regex");
});

/// Where a redirect points, and where it was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Destination path relative to the wiki root, possibly with a fragment.
    pub destination: String,
    /// One-based line number of the entry in the redirect file.
    pub line: usize,
}

/// Redirects keyed by lowercased source path. Lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct Redirects {
    /// Lowercased source path to redirect.
    entries: HashMap<String, Redirect>,
}

impl Redirects {
    /// Look up a source path, ignoring case.
    pub fn get(&self, source: &str) -> Option<&Redirect> {
        return self.entries.get(&source.to_lowercase());
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }

    /// Number of distinct source keys.
    pub fn len(&self) -> usize {
        return self.entries.len();
    }

    /// Read and parse a redirect file.
    ///
    /// # Errors
    ///
    /// Returns `Error::RedirectsNotFound` if the file doesn't exist,
    /// or `Error::Io` for other read failures.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::RedirectsNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        let redirects = Self::parse(&content);
        if redirects.is_empty() {
            log::warn!("{} has no redirects", path.display());
        } else {
            log::debug!("loaded {} redirects from {}", redirects.len(), path.display());
        }
        return Ok(redirects);
    }

    /// Parse redirect file content. Blank lines and `#` comments are skipped,
    /// as are malformed lines (with a warning). Line numbers count every
    /// physical line from the top. A repeated key keeps its last entry.
    pub fn parse(content: &str) -> Self {
        let mut entries: HashMap<String, Redirect> = HashMap::new();

        for (index, raw_line) in content.lines().enumerate() {
            let line = index.saturating_add(1);
            let trimmed = raw_line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((source, destination)) = parse_entry(trimmed) else {
                log::warn!("redirects:{line}: skipping malformed entry `{trimmed}`");
                continue;
            };

            let key = source.to_lowercase();
            let redirect = Redirect { destination: destination.to_string(), line };
            if let Some(previous) = entries.insert(key, redirect) {
                log::warn!(
                    "redirects:{line}: `{source}` overrides the entry on line {}",
                    previous.line
                );
            }
        }

        return Self { entries };
    }
}

/// Split a data line into its quoted source and destination.
fn parse_entry(line: &str) -> Option<(&str, &str)> {
    let captures = ENTRY.captures(line)?;
    return Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()));
}
