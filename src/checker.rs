//! Link validation: resolve every link of an article and classify failures.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::article::{Article, CANONICAL_FILENAME};
use crate::error::{Error, LinkError};
use crate::redirects::Redirects;
use crate::references::ReferenceTable;
use crate::registry::{ArticleRegistry, normalize_path};
use crate::types::Link;

/// Directory holding all articles, relative to the repository root.
pub const WIKI_DIR: &str = "wiki";

/// Link path prefix that addresses the wiki root.
const WIKI_PREFIX: &str = "/wiki/";

/// A failing link together with the reason it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedError {
    /// Why the link failed.
    pub error: LinkError,
    /// The link as extracted, before reference resolution.
    pub link: Link,
}

/// Failures of one article: line number to failures on that line, in order.
pub type LineErrors = BTreeMap<usize, Vec<DetailedError>>;

/// Rewrite a link path to an absolute wiki path. Paths not starting at the
/// wiki root are taken relative to the article's directory. `.` and `..`
/// are collapsed lexically.
pub fn absolute_location(directory: &Path, path: &str) -> String {
    let joined = if path.starts_with(WIKI_PREFIX) {
        PathBuf::from(path)
    } else {
        Path::new("/").join(directory).join(path.trim_start_matches('/'))
    };
    return slash_path(&normalize_path(&joined));
}

/// Check every link of an article. Lines without failing links are omitted.
///
/// # Errors
///
/// Returns fatal errors from `check_link`.
pub fn check_article(
    article: &Article,
    redirects: &Redirects,
    articles: &mut ArticleRegistry,
) -> Result<LineErrors, Error> {
    let mut result = LineErrors::new();
    for (&number, line) in &article.lines {
        for link in &line.links {
            let Some(error) = check_link(article, link, redirects, &article.references, articles)?
            else {
                continue;
            };
            result.entry(number).or_default().push(DetailedError {
                error,
                link: link.clone(),
            });
        }
    }
    return Ok(result);
}

/// Check the fragment of a link whose target directory exists.
///
/// Prefers a translation in the current article's language next to the
/// target, falling back to the canonical article. The target article is
/// parsed and registered on first use.
///
/// # Errors
///
/// Returns errors from parsing the target article.
fn check_fragment(
    article: &Article,
    target: &Path,
    fragment: &str,
    articles: &mut ArticleRegistry,
) -> Result<Option<LinkError>, Error> {
    let translation = normalize_path(&target.join(&article.filename));
    let translation_available = !article.is_canonical() && is_known(articles, &translation);
    let target_file = if translation_available {
        translation
    } else {
        normalize_path(&target.join(CANONICAL_FILENAME))
    };

    let missing_identifier = || {
        return LinkError::MissingIdentifier {
            file: target_file.clone(),
            fragment: fragment.to_string(),
            translation_available,
        };
    };

    if !is_known(articles, &target_file) {
        return Ok(Some(missing_identifier()));
    }
    let target_article = articles.get_or_parse(&target_file)?;
    if target_article.identifiers.contains(fragment) {
        return Ok(None);
    }
    return Ok(Some(missing_identifier()));
}

/// Resolve one link and classify it.
///
/// Steps, stopping at the first that decides: reference indirection,
/// external scheme, host without scheme (fatal), path normalization,
/// existence with redirect fallback, and finally the fragment.
///
/// # Errors
///
/// Returns `Error::UnhandledLink` for a location with a host but no scheme,
/// or errors from parsing a fragment's target article.
pub fn check_link(
    article: &Article,
    link: &Link,
    redirects: &Redirects,
    references: &ReferenceTable,
    articles: &mut ArticleRegistry,
) -> Result<Option<LinkError>, Error> {
    let Some(resolved) = link.resolve(references) else {
        return Ok(Some(LinkError::MissingReference {
            label: link.raw_location.clone(),
        }));
    };
    let location = &resolved.location;

    if location.scheme.is_some() {
        return Ok(None);
    }
    if location.host.is_some() {
        return Err(Error::UnhandledLink {
            article: article.path.clone(),
            location: resolved.raw_location.clone(),
        });
    }

    let absolute = absolute_location(&article.directory, &location.path);
    let mut target = PathBuf::from(absolute.trim_start_matches('/'));
    let mut fragment = location.fragment.as_deref();

    if !articles.exists(&target) {
        let tail = extract_tail(&absolute);
        let Some(redirect) = redirects.get(tail) else {
            return Ok(Some(LinkError::LinkNotFound {
                target: tail.to_string(),
            }));
        };

        let (destination, destination_fragment) = match redirect.destination.split_once('#') {
            Some((path, anchor)) => (path, Some(anchor).filter(|a| return !a.is_empty())),
            None => (redirect.destination.as_str(), None),
        };
        // The link's own fragment overrides the one stored in the redirect.
        fragment = fragment.or(destination_fragment);
        target = normalize_path(&Path::new(WIKI_DIR).join(destination));
        if !articles.exists(&target) {
            return Ok(Some(LinkError::BrokenRedirect {
                destination: redirect.destination.clone(),
                line: redirect.line,
                redirect_source: tail.to_string(),
            }));
        }
    }

    let Some(fragment) = fragment else {
        return Ok(None);
    };
    return check_fragment(article, &target, fragment, articles);
}

/// Everything past the first non-root slash.
///
/// `/wiki/Beatmaps/Category` gives `Beatmaps/Category`, `img/users/2.png`
/// gives `users/2.png`. A path without such a slash is returned whole.
pub fn extract_tail(path: &str) -> &str {
    return path
        .get(1..)
        .and_then(|rest| return rest.find('/'))
        .and_then(|slash| return path.get(slash.saturating_add(2)..))
        .unwrap_or(path);
}

/// An article file is usable if it was registered or exists on disk.
fn is_known(articles: &ArticleRegistry, path: &Path) -> bool {
    return articles.get(path).is_some() || articles.exists(path);
}

/// Render a path with `/` separators regardless of platform.
fn slash_path(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        let part = component.as_os_str().to_string_lossy();
        if !out.is_empty() && !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(&part);
    }
    return out;
}

#[cfg(test)]
mod tests {
    use super::*;

    const REDIRECTS: &str = "\
# legacy paths
\"beatmap/category\": \"Beatmaps/Category\"
\"old_team\": \"People/Former_team\"
\"asc/images\": \"Beatmaps/Category#images\"
\"ranking\": \"Beatmaps/Category#ranked\"";

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn wiki() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "wiki/Beatmaps/Category/en.md", "# Category\n\n## Ranked\n\n## Loved {#loved}\n");
        write(root, "wiki/Beatmaps/Category/fr.md", "# Catégorie\n\n## Classée {#ranked}\n");
        write(root, "wiki/Beatmaps/Category/images/foo.png", "");
        write(root, "wiki/People/en.md", "# People\n");
        write(root, "wiki/People/de.md", "# Leute\n");
        write(root, "wiki/Empty_dir/notes.txt", "");
        return dir;
    }

    fn check(root: &Path, article_path: &str, content: &str) -> Result<Option<LinkError>, Error> {
        let article = Article::from_content(Path::new(article_path), content);
        let link = article.lines[&1].links[0].clone();
        let redirects = Redirects::parse(REDIRECTS);
        let mut registry = ArticleRegistry::new(root);
        return check_link(&article, &link, &redirects, &article.references, &mut registry);
    }

    #[test]
    fn tail_extraction() {
        assert_eq!(extract_tail("/wiki/Beatmap/Category"), "Beatmap/Category");
        assert_eq!(extract_tail("img/users/2.png"), "users/2.png");
        assert_eq!(extract_tail("/wiki"), "/wiki");
    }

    #[test]
    fn relative_link_becomes_absolute() {
        let directory = Path::new("wiki/Beatmaps/Category");
        assert_eq!(
            absolute_location(directory, "images/foo.png"),
            "/wiki/Beatmaps/Category/images/foo.png"
        );
        assert_eq!(absolute_location(directory, "../Ranking"), "/wiki/Beatmaps/Ranking");
        assert_eq!(absolute_location(directory, "/wiki/People"), "/wiki/People");
        assert_eq!(absolute_location(directory, "/home"), "/wiki/Beatmaps/Category/home");
    }

    #[test]
    fn existing_absolute_link_is_valid() {
        let dir = wiki();
        let result = check(dir.path(), "wiki/People/en.md", "[c](/wiki/Beatmaps/Category)").unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn existing_relative_image_is_valid() {
        let dir = wiki();
        let result = check(dir.path(), "wiki/Beatmaps/Category/en.md", "![f](images/foo.png)").unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn external_links_are_not_checked() {
        let dir = wiki();
        assert_eq!(check(dir.path(), "wiki/People/en.md", "[x](https://osu.ppy.sh/nowhere)").unwrap(), None);
        assert_eq!(check(dir.path(), "wiki/People/en.md", "[x](mailto:nobody@ppy.sh)").unwrap(), None);
    }

    #[test]
    fn host_without_scheme_is_fatal() {
        let dir = wiki();
        let result = check(dir.path(), "wiki/People/en.md", "[x](//osu.ppy.sh/home)");
        assert!(matches!(result, Err(Error::UnhandledLink { .. })), "expected UnhandledLink");
    }

    #[test]
    fn missing_reference() {
        let dir = wiki();
        let result = check(dir.path(), "wiki/People/en.md", "[x][nowhere]").unwrap();
        assert_eq!(result, Some(LinkError::MissingReference { label: "nowhere".to_string() }));
    }

    #[test]
    fn reference_resolves_before_existence_check() {
        let dir = wiki();
        let content = "[c][cat]\n\n[cat]: /wiki/Beatmaps/Category";
        assert_eq!(check(dir.path(), "wiki/People/en.md", content).unwrap(), None);
    }

    #[test]
    fn missing_target_without_redirect() {
        let dir = wiki();
        let result = check(dir.path(), "wiki/People/en.md", "[x](/wiki/No/Such_Article)").unwrap();
        assert_eq!(result, Some(LinkError::LinkNotFound { target: "No/Such_Article".to_string() }));
    }

    #[test]
    fn redirect_to_existing_article_is_valid() {
        let dir = wiki();
        let result = check(dir.path(), "wiki/People/en.md", "[x](/wiki/Beatmap/Category)").unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn redirect_destination_fragment_is_checked() {
        let dir = wiki();
        let result = check(dir.path(), "wiki/People/en.md", "[x](/wiki/ASC/images)").unwrap();
        assert_eq!(
            result,
            Some(LinkError::MissingIdentifier {
                file: PathBuf::from("wiki/Beatmaps/Category/en.md"),
                fragment: "images".to_string(),
                translation_available: false,
            })
        );

        let found = check(dir.path(), "wiki/People/en.md", "[x](/wiki/Ranking)").unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn link_fragment_overrides_redirect_fragment() {
        let dir = wiki();
        let result = check(dir.path(), "wiki/People/en.md", "[x](/wiki/ASC/images#loved)").unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn broken_redirect_keeps_original_tail() {
        let dir = wiki();
        let result = check(dir.path(), "wiki/People/en.md", "[x](/wiki/Old_Team)").unwrap();
        assert_eq!(
            result,
            Some(LinkError::BrokenRedirect {
                destination: "People/Former_team".to_string(),
                line: 3,
                redirect_source: "Old_Team".to_string(),
            })
        );
    }

    #[test]
    fn missing_identifier_in_canonical_article() {
        let dir = wiki();
        let result = check(dir.path(), "wiki/People/en.md", "[x](/wiki/Beatmaps/Category#graveyard)").unwrap();
        assert_eq!(
            result,
            Some(LinkError::MissingIdentifier {
                file: PathBuf::from("wiki/Beatmaps/Category/en.md"),
                fragment: "graveyard".to_string(),
                translation_available: false,
            })
        );
    }

    #[test]
    fn heading_identifier_is_found() {
        let dir = wiki();
        let result = check(dir.path(), "wiki/People/en.md", "[x](/wiki/Beatmaps/Category#ranked)").unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn translation_is_checked_when_available() {
        let dir = wiki();
        let found = check(dir.path(), "wiki/People/fr.md", "[x](/wiki/Beatmaps/Category#ranked)").unwrap();
        assert_eq!(found, None);

        let missing = check(dir.path(), "wiki/People/fr.md", "[x](/wiki/Beatmaps/Category#loved)").unwrap();
        assert_eq!(
            missing,
            Some(LinkError::MissingIdentifier {
                file: PathBuf::from("wiki/Beatmaps/Category/fr.md"),
                fragment: "loved".to_string(),
                translation_available: true,
            })
        );
    }

    #[test]
    fn falls_back_to_canonical_without_translation() {
        let dir = wiki();
        let result = check(dir.path(), "wiki/People/de.md", "[x](/wiki/Beatmaps/Category#loved)").unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn same_article_fragment() {
        let dir = wiki();
        let result = check(dir.path(), "wiki/Beatmaps/Category/en.md", "[x](#loved)").unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn fragment_into_directory_without_articles() {
        let dir = wiki();
        let result = check(dir.path(), "wiki/People/en.md", "[x](/wiki/Empty_dir#top)").unwrap();
        assert_eq!(
            result,
            Some(LinkError::MissingIdentifier {
                file: PathBuf::from("wiki/Empty_dir/en.md"),
                fragment: "top".to_string(),
                translation_available: false,
            })
        );
    }

    #[test]
    fn fragment_target_is_registered_lazily() {
        let dir = wiki();
        let article = Article::from_content(
            Path::new("wiki/People/en.md"),
            "[a](/wiki/Beatmaps/Category#ranked)\n[b](/wiki/Beatmaps/Category#loved)\n",
        );
        let redirects = Redirects::default();
        let mut registry = ArticleRegistry::new(dir.path());

        let errors = check_article(&article, &redirects, &mut registry).unwrap();
        assert!(errors.is_empty(), "both identifiers exist");
        assert_eq!(registry.paths(), vec![PathBuf::from("wiki/Beatmaps/Category/en.md")]);
    }

    #[test]
    fn check_article_groups_by_line() {
        let dir = wiki();
        let article = Article::from_content(
            Path::new("wiki/People/en.md"),
            "[ok](/wiki/People)\n\n[a](/wiki/Gone) and [b][none] and [c](/wiki/People)\n",
        );
        let redirects = Redirects::default();
        let mut registry = ArticleRegistry::new(dir.path());

        let errors = check_article(&article, &redirects, &mut registry).unwrap();
        assert_eq!(errors.keys().copied().collect::<Vec<_>>(), vec![3]);
        let line = &errors[&3];
        assert_eq!(line.len(), 2);
        assert_eq!(line[0].link.raw_location, "/wiki/Gone");
        assert_eq!(line[0].error, LinkError::LinkNotFound { target: "Gone".to_string() });
        assert_eq!(line[1].error, LinkError::MissingReference { label: "none".to_string() });
    }
}
