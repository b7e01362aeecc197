/// Crate-level error types: fatal run errors and per-link content errors.
use std::path::PathBuf;

/// Errors that abort a run. Content problems in articles are never reported
/// through this type; they are collected as [`LinkError`] values instead.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An article that had to be parsed does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON report serialization failed.
    #[error("json serialize: {0}")]
    Json(
        /// The wrapped serialization error.
        #[from]
        serde_json::Error,
    ),

    /// The redirect table does not exist on disk.
    #[error("redirect file not found: {}", path.display())]
    RedirectsNotFound {
        /// Path to the missing redirect file.
        path: PathBuf,
    },

    /// TOML deserialization of `.wikicheck.toml` failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// A link has a host but no scheme. The extractor never produces such a
    /// location for well-formed input, so this is a tooling bug rather than
    /// an article problem.
    #[error("unhandled link type in {}: `{location}`", article.display())]
    UnhandledLink {
        /// Article containing the link.
        article: PathBuf,
        /// The raw link location.
        location: String,
    },

    /// The filesystem watcher could not be set up.
    #[error("watch: {reason}")]
    Watch {
        /// Description of the watcher failure.
        reason: String,
    },
}

/// Why a single link failed to resolve. Collected per line, never raised.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LinkError {
    /// The link target is missing, but a redirect exists whose destination is missing too.
    #[error("broken redirect (redirect.yaml:{line}: {redirect_source} --> {destination})")]
    BrokenRedirect {
        /// Destination recorded in the redirect table.
        destination: String,
        /// One-based line of the redirect entry.
        line: usize,
        /// The path tail the redirect was looked up by.
        #[serde(rename = "source")]
        redirect_source: String,
    },

    /// Neither the target nor a redirect for it exists.
    #[error("no such file or directory: {target}")]
    LinkNotFound {
        /// The path tail that could not be found.
        target: String,
    },

    /// The target article exists but exposes no such identifier.
    #[error(
        "no identifier `#{fragment}` in {}{}",
        file.display(),
        if *translation_available { "" } else { " (no translation available)" }
    )]
    MissingIdentifier {
        /// The article file the fragment was checked against.
        file: PathBuf,
        /// The fragment that was not found.
        fragment: String,
        /// Whether `file` is a genuine translation rather than the canonical fallback.
        translation_available: bool,
    },

    /// A reference-style link uses a label with no `[label]: location` line.
    #[error("no reference definition for `[{label}]`")]
    MissingReference {
        /// The undeclared label.
        label: String,
    },
}
