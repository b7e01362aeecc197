//! CLI commands for wikicheck: check and ids.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use walkdir::WalkDir;

use crate::article::Article;
use crate::checker::{self, LineErrors, WIKI_DIR};
use crate::config::Config;
use crate::diagnostics;
use crate::error;
use crate::redirects::Redirects;
use crate::registry::{ArticleRegistry, normalize_path};

/// Exit code when at least one link failed.
const EXIT_BROKEN: u8 = 1;

/// Result of checking a set of articles.
pub struct CheckOutcome {
    /// Number of articles that were checked.
    pub articles_checked: usize,
    /// Number of articles in the registry afterwards, including lazily parsed targets.
    pub articles_parsed: usize,
    /// Articles with at least one failing link, in path order.
    pub failures: Vec<(Arc<Article>, LineErrors)>,
}

impl CheckOutcome {
    /// Total number of failing links.
    pub fn failure_count(&self) -> usize {
        return self
            .failures
            .iter()
            .flat_map(|(_, errors)| return errors.values())
            .map(Vec::len)
            .sum();
    }
}

/// How `check` prints failures.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON on stdout.
    Json,
    /// One `path:line:column: location: message` line per failure.
    #[default]
    Text,
}

/// Check the given articles, or every article under `wiki/` when none are
/// given, and print the failures.
///
/// # Errors
///
/// Returns fatal errors from config or redirect loading, article parsing,
/// link checking, or report serialization.
pub fn check(files: &[String], format: OutputFormat) -> Result<ExitCode, error::Error> {
    let root = PathBuf::from(".");
    let outcome = run_check(&root, files)?;

    let report: Vec<(&Article, &LineErrors)> = outcome
        .failures
        .iter()
        .map(|(article, errors)| return (article.as_ref(), errors))
        .collect();
    match format {
        OutputFormat::Json => println!("{}", diagnostics::render_failures_json(&report)?),
        OutputFormat::Text => print!("{}", diagnostics::render_failures_text(&report)),
    }

    let count = outcome.failure_count();
    let checked = outcome.articles_checked;
    let parsed = outcome.articles_parsed;
    if count > 0 {
        eprintln!(
            "{count} broken links in {} of {checked} articles ({parsed} parsed)",
            outcome.failures.len()
        );
        return Ok(ExitCode::from(EXIT_BROKEN));
    }
    eprintln!("All links valid in {checked} articles ({parsed} parsed)");
    return Ok(ExitCode::SUCCESS);
}

/// Walk `wiki/` for markdown articles that pass the config filters.
fn collect_articles(root: &Path, config: &Config) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root.join(WIKI_DIR))
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| return e.file_type().is_file())
        .filter(|e| return e.path().extension().is_some_and(|ext| return ext == "md"))
        .map(|e| return normalize_path(e.path().strip_prefix(root).unwrap_or(e.path())))
        .filter(|path| return config.should_check(&path.to_string_lossy()))
        .collect();
    paths.sort();
    return paths;
}

/// List every identifier an article exposes, as `file#identifier` lines, or
/// as a JSON object that also carries the article's front matter.
///
/// # Errors
///
/// Returns errors from reading the article or serializing the JSON output.
pub fn ids(file: &str, format: OutputFormat) -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    let path = normalize_argument(file).unwrap_or_else(|| return normalize_path(Path::new(file)));
    let article = Article::parse(&root, &path)?;
    match format {
        OutputFormat::Json => println!("{}", diagnostics::render_article_json(&article)?),
        OutputFormat::Text => {
            for identifier in &article.identifiers {
                println!("{}#{identifier}", path.display());
            }
        },
    }
    return Ok(());
}

/// Drop failures of links the config exempts, then lines left empty.
fn drop_ignored_links(article: &Article, errors: &mut LineErrors, config: &Config) {
    for failures in errors.values_mut() {
        failures.retain(|failure| {
            let location = failure
                .link
                .resolve(&article.references)
                .map_or_else(|| return failure.link.raw_location.clone(), |link| return link.raw_location);
            return !config.is_ignored_link(&location);
        });
    }
    errors.retain(|_, failures| return !failures.is_empty());
}

/// Normalize a command-line article path: backslashes become slashes and a
/// leading `./` is dropped. Returns `None` for non-markdown files.
fn normalize_argument(argument: &str) -> Option<PathBuf> {
    let unified = argument.replace('\\', "/");
    if !unified.ends_with(".md") {
        log::debug!("skipping non-markdown argument {argument}");
        return None;
    }
    return Some(normalize_path(Path::new(&unified)));
}

/// Load config and redirects, then check the requested articles.
///
/// Every requested article is parsed before checking starts; targets of
/// fragment links are parsed on demand and cached for the rest of the run.
///
/// # Errors
///
/// Returns fatal errors from config or redirect loading, article parsing,
/// or link checking.
pub fn run_check(root: &Path, files: &[String]) -> Result<CheckOutcome, error::Error> {
    let config = Config::load(root)?;
    let redirects = Redirects::load(&root.join(&config.redirects))?;

    let mut requested: Vec<PathBuf> = if files.is_empty() {
        collect_articles(root, &config)
    } else {
        files
            .iter()
            .filter_map(|f| return normalize_argument(f))
            .filter(|path| return !config.is_ignored_file(&path.to_string_lossy()))
            .collect()
    };
    requested.sort();
    requested.dedup();

    let mut articles = ArticleRegistry::new(root);
    for path in &requested {
        articles.get_or_parse(path)?;
    }
    if articles.is_empty() {
        log::warn!("no articles to check");
    }

    let snapshot = articles.paths();
    let mut failures = Vec::new();
    for path in &snapshot {
        let article = articles.get_or_parse(path)?;
        log::debug!("checking {} ({} links)", path.display(), article.link_count());
        let mut errors = checker::check_article(&article, &redirects, &mut articles)?;
        drop_ignored_links(&article, &mut errors, &config);
        if !errors.is_empty() {
            failures.push((article, errors));
        }
    }

    return Ok(CheckOutcome {
        articles_checked: snapshot.len(),
        articles_parsed: articles.len(),
        failures,
    });
}
