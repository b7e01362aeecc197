//! Run-scoped cache of parsed articles, keyed by normalized path.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::article::Article;
use crate::error::Error;

/// Every article parsed during one run. Grows lazily as fragment checks
/// discover new target articles; entries are never replaced.
///
/// Articles are handed out as `Arc` so a caller can hold one while the
/// registry grows. Iterate over [`ArticleRegistry::paths`], a snapshot, when
/// the loop body may insert.
#[derive(Debug)]
pub struct ArticleRegistry {
    /// Normalized path relative to `root` to parsed article.
    articles: BTreeMap<PathBuf, Arc<Article>>,
    /// Repository root that article paths are relative to.
    root: PathBuf,
}

impl ArticleRegistry {
    /// Whether a path (relative to the root) exists on disk.
    pub fn exists(&self, relative: &Path) -> bool {
        return self.root.join(relative).exists();
    }

    /// A cached article, if it was already parsed.
    pub fn get(&self, path: &Path) -> Option<Arc<Article>> {
        return self.articles.get(&normalize_path(path)).cloned();
    }

    /// Return the cached article, or parse and cache it. Parsing happens at
    /// most once per path.
    ///
    /// # Errors
    ///
    /// Returns errors from `Article::parse`.
    pub fn get_or_parse(&mut self, path: &Path) -> Result<Arc<Article>, Error> {
        let key = normalize_path(path);
        if let Some(article) = self.articles.get(&key) {
            return Ok(Arc::clone(article));
        }
        log::debug!("parsing {}", key.display());
        let article = Article::parse(&self.root, &key)?;
        return Ok(self.insert(article));
    }

    /// Cache an already parsed article. An existing entry for the same path wins.
    pub fn insert(&mut self, article: Article) -> Arc<Article> {
        let key = normalize_path(&article.path);
        return Arc::clone(self.articles.entry(key).or_insert_with(|| return Arc::new(article)));
    }

    /// Whether nothing has been parsed yet.
    pub fn is_empty(&self) -> bool {
        return self.articles.is_empty();
    }

    /// Number of cached articles.
    pub fn len(&self) -> usize {
        return self.articles.len();
    }

    /// Create an empty registry for a repository root.
    pub fn new(root: &Path) -> Self {
        return Self {
            articles: BTreeMap::new(),
            root: root.to_path_buf(),
        };
    }

    /// Snapshot of the cached paths, in sorted order.
    pub fn paths(&self) -> Vec<PathBuf> {
        return self.articles.keys().cloned().collect();
    }
}

/// Collapse `.` and `..` components in a path without touching the filesystem.
/// Preserves leading `..` when there is nothing left to pop.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        push_normalized_component(&mut components, component);
    }
    return components.iter().collect();
}

/// Handle a single path component during normalization.
/// Pops the last component for `..` when possible, preserves it otherwise.
fn push_normalized_component<'a>(components: &mut Vec<Component<'a>>, component: Component<'a>) {
    match component {
        Component::CurDir => {},
        Component::ParentDir => {
            let can_pop = matches!(
                components.last(),
                Some(c) if matches!(c, Component::Normal(_))
            );
            if can_pop {
                components.pop();
            } else {
                components.push(component);
            }
        },
        other => components.push(other),
    }
}
