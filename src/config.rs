use std::path::{Path, PathBuf};

use crate::error::Error;

/// Name of the config file at the repository root.
pub const CONFIG_FILE: &str = ".wikicheck.toml";

/// Article paths containing any of these are never checked, unless the
/// config replaces the list.
const DEFAULT_EXCLUDE_CONTAINING: [&str; 2] = ["TEMPLATE", "Article_styling_criteria"];

/// Link locations that are never checked, unless the config replaces the list.
const DEFAULT_IGNORE_LINKS: [&str; 1] = ["/wiki/Sitemap"];

/// Redirect table location used when the config doesn't name one.
const DEFAULT_REDIRECTS: &str = "wiki/redirect.yaml";

/// Project configuration loaded from `.wikicheck.toml`.
/// Include/exclude patterns are path prefixes applied to article paths.
#[derive(Debug)]
pub struct Config {
    /// Article path prefixes to skip.
    exclude: Vec<String>,
    /// Substrings that exclude an article path, walked or named explicitly.
    exclude_containing: Vec<String>,
    /// Link locations, after reference resolution, that are never reported.
    ignore_links: Vec<String>,
    /// Article path prefixes to check; empty means everything.
    include: Vec<String>,
    /// Redirect file, relative to the repository root.
    pub redirects: PathBuf,
}

/// Raw TOML structure for `.wikicheck.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct WikicheckTomlConfig {
    /// Article path prefixes to skip.
    #[serde(default)]
    exclude: Vec<String>,
    /// Replacement for the default path substrings to skip.
    exclude_containing: Option<Vec<String>>,
    /// Replacement for the default ignored link locations.
    ignore_links: Option<Vec<String>>,
    /// Article path prefixes to check.
    #[serde(default)]
    include: Vec<String>,
    /// Redirect file override.
    redirects: Option<PathBuf>,
}

impl Config {
    /// Load config from `.wikicheck.toml` in the given root directory.
    /// Returns a default that checks everything if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; never silently
    /// falls back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::check_everything_by_default());
            },
            Err(e) => return Err(Error::Io(e)),
        };

        return Self::parse(&content);
    }

    /// Parse config content.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or has unknown keys.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: WikicheckTomlConfig = toml::from_str(content)?;
        return Ok(Self {
            exclude: raw.exclude,
            exclude_containing: raw
                .exclude_containing
                .unwrap_or_else(|| return to_strings(&DEFAULT_EXCLUDE_CONTAINING)),
            ignore_links: raw.ignore_links.unwrap_or_else(|| return to_strings(&DEFAULT_IGNORE_LINKS)),
            include: raw.include,
            redirects: raw.redirects.unwrap_or_else(|| return PathBuf::from(DEFAULT_REDIRECTS)),
        });
    }

    /// Whether an article path contains one of the `exclude_containing`
    /// substrings. Applies to explicitly named files as well as walked ones.
    pub fn is_ignored_file(&self, relative_path: &str) -> bool {
        return self.exclude_containing.iter().any(|p| return relative_path.contains(p.as_str()));
    }

    /// Whether a link location is exempt from checking.
    pub fn is_ignored_link(&self, location: &str) -> bool {
        return self.ignore_links.iter().any(|l| return l == location);
    }

    /// Check whether a walked article path should be checked.
    ///
    /// A path is included if no include patterns are set (check everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern
    /// or contains any `exclude_containing` substring.
    pub fn should_check(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included || self.is_ignored_file(relative_path) {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }

    /// Default config that includes everything and excludes nothing.
    fn check_everything_by_default() -> Self {
        return Self {
            exclude: Vec::new(),
            exclude_containing: to_strings(&DEFAULT_EXCLUDE_CONTAINING),
            ignore_links: to_strings(&DEFAULT_IGNORE_LINKS),
            include: Vec::new(),
            redirects: PathBuf::from(DEFAULT_REDIRECTS),
        };
    }
}

/// Own a list of default strings.
fn to_strings(defaults: &[&str]) -> Vec<String> {
    return defaults.iter().map(|s| return (*s).to_string()).collect();
}
