//! File watcher: runs `check` on startup, then re-runs whenever the wiki changes.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::checker::WIKI_DIR;
use crate::commands::{self, OutputFormat};
use crate::config::{CONFIG_FILE, Config};
use crate::diagnostics;
use crate::error;

/// Debounce delay between filesystem events and re-check.
const DEBOUNCE_MS: u64 = 100;

/// Exit code for a check that failed fatally.
const EXIT_FATAL: u8 = 2;

/// Paths to watch: the wiki tree, the redirect file, and the config file.
fn collect_watch_paths(root: &Path) -> Vec<(PathBuf, RecursiveMode)> {
    let mut paths = vec![(root.join(WIKI_DIR), RecursiveMode::Recursive)];
    if let Ok(config) = Config::load(root) {
        let redirects = root.join(&config.redirects);
        if !redirects.starts_with(root.join(WIKI_DIR)) {
            paths.push((redirects, RecursiveMode::NonRecursive));
        }
    }
    paths.push((root.join(CONFIG_FILE), RecursiveMode::NonRecursive));
    return paths;
}

/// Create a filesystem watcher that sends events on the given channel.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<()>,
) -> Result<notify::RecommendedWatcher, error::Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            )
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| {
        return error::Error::Watch {
            reason: format!("watcher setup failed: {e}"),
        };
    });
}

/// Entry point for the watch command.
///
/// Runs an initial check, then watches the wiki and re-checks on changes.
/// Every re-check starts from an empty article registry.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be set up.
pub fn run(files: &[String], format: OutputFormat) -> Result<ExitCode, error::Error> {
    let root = PathBuf::from(".");

    eprintln!("watch: initial check");
    let mut last_code = run_check(files, format);

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx)?;

    let mut watched = 0_usize;
    for (path, mode) in collect_watch_paths(&root) {
        if !path.exists() {
            log::debug!("not watching missing {}", path.display());
            continue;
        }
        watcher.watch(&path, mode).map_err(|e| {
            return error::Error::Watch {
                reason: format!("cannot watch {}: {e}", path.display()),
            };
        })?;
        watched = watched.saturating_add(1);
    }

    eprintln!("watch: monitoring {watched} paths, press Ctrl+C to stop");

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        eprintln!("watch: change detected, re-checking...");
        last_code = run_check(files, format);
    }

    return Ok(last_code);
}

/// Run check once and print the result. Fatal errors are printed, not returned.
fn run_check(files: &[String], format: OutputFormat) -> ExitCode {
    return match commands::check(files, format) {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(EXIT_FATAL)
        },
    };
}
