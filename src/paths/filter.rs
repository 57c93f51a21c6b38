//! Include/exclude filtering of tree entries.

use super::{Consumer, ContentError, Manifest, OpenPathTree, PathTree, Visitor, normalize_relative};
use glob::{MatchOptions, Pattern};
use std::path::PathBuf;
use std::sync::Arc;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Glob-based visibility rules over relative paths.
///
/// An entry is visible when it matches no exclude pattern and either there are
/// no include patterns or it matches one of them. `*` stays within one path
/// segment; `**` spans segments.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    includes: Vec<Pattern>,
    excludes: Vec<Pattern>,
}

impl PathFilter {
    pub fn new<I, E, S, T>(includes: I, excludes: E) -> Result<Self, ContentError>
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Ok(Self {
            includes: compile(includes)?,
            excludes: compile(excludes)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    pub fn is_visible(&self, relative: &str) -> bool {
        if self.excludes.iter().any(|p| p.matches_with(relative, MATCH_OPTIONS)) {
            return false;
        }
        self.includes.is_empty() || self.includes.iter().any(|p| p.matches_with(relative, MATCH_OPTIONS))
    }
}

fn compile<I, S>(patterns: I) -> Result<Vec<Pattern>, ContentError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|p| {
            Pattern::new(p.as_ref()).map_err(|e| ContentError::InvalidPattern {
                pattern: p.as_ref().to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

fn filtered_walk(tree: &dyn PathTree, filter: &PathFilter, visitor: &mut Visitor<'_>) -> Result<(), ContentError> {
    tree.walk(&mut |visit| {
        if filter.is_visible(visit.relative_path()) {
            visitor(visit);
        }
    })
}

fn filtered_lookup(
    tree: &dyn PathTree,
    filter: &PathFilter,
    relative: &str,
    consumer: &mut Consumer<'_>,
) -> Result<(), ContentError> {
    match normalize_relative(relative) {
        Some(relative) if filter.is_visible(&relative) => tree.process_path(&relative, consumer),
        _ => {
            consumer(None);
            Ok(())
        }
    }
}

/// A view of another tree hiding entries rejected by a [`PathFilter`].
#[derive(Debug)]
pub struct FilteredTree {
    inner: Arc<dyn PathTree>,
    filter: PathFilter,
}

impl FilteredTree {
    pub fn new(inner: Arc<dyn PathTree>, filter: PathFilter) -> Self {
        Self { inner, filter }
    }

    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }
}

impl PathTree for FilteredTree {
    fn roots(&self) -> Vec<PathBuf> {
        self.inner.roots()
    }

    fn manifest(&self) -> Option<Arc<Manifest>> {
        self.inner.manifest()
    }

    fn walk(&self, visitor: &mut Visitor<'_>) -> Result<(), ContentError> {
        filtered_walk(self.inner.as_ref(), &self.filter, visitor)
    }

    fn process_path(&self, relative: &str, consumer: &mut Consumer<'_>) -> Result<(), ContentError> {
        filtered_lookup(self.inner.as_ref(), &self.filter, relative, consumer)
    }

    fn open(self: Arc<Self>) -> Result<Arc<dyn OpenPathTree>, ContentError> {
        let handle = self.inner.clone().open()?;
        Ok(Arc::new(OpenFilteredTree {
            original: self,
            handle,
        }))
    }
}

#[derive(Debug)]
struct OpenFilteredTree {
    original: Arc<FilteredTree>,
    handle: Arc<dyn OpenPathTree>,
}

impl PathTree for OpenFilteredTree {
    fn roots(&self) -> Vec<PathBuf> {
        self.handle.roots()
    }

    fn manifest(&self) -> Option<Arc<Manifest>> {
        self.handle.manifest()
    }

    fn walk(&self, visitor: &mut Visitor<'_>) -> Result<(), ContentError> {
        filtered_walk(self.handle.as_ref(), &self.original.filter, visitor)
    }

    fn process_path(&self, relative: &str, consumer: &mut Consumer<'_>) -> Result<(), ContentError> {
        filtered_lookup(self.handle.as_ref(), &self.original.filter, relative, consumer)
    }

    fn open(self: Arc<Self>) -> Result<Arc<dyn OpenPathTree>, ContentError> {
        self.original.clone().open()
    }
}

impl OpenPathTree for OpenFilteredTree {
    fn original_tree(&self) -> Arc<dyn PathTree> {
        self.original.clone()
    }

    fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    fn close(&self) -> Result<(), ContentError> {
        self.handle.close()
    }

    fn as_tree(self: Arc<Self>) -> Arc<dyn PathTree> {
        self
    }
}
