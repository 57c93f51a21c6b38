//! Virtual content trees over artifact content.
//!
//! Every artifact on a classpath is exposed through the [`PathTree`] contract,
//! whatever its physical shape:
//!
//! - [`DirectoryTree`] - a plain directory, typically build output
//! - [`ArchiveTree`] - a packed zip/jar archive
//! - [`MultiRootTree`] - several trees overlaid, first match wins
//! - [`FilteredTree`] - a view hiding entries rejected by a [`PathFilter`]
//! - [`CachingTree`] - replays a structural snapshot of another tree
//! - [`EmptyTree`] - an artifact without content
//!
//! Directory and archive trees parse `META-INF/MANIFEST.MF` lazily, once, and
//! apply the multi-release overlay when the manifest declares
//! `Multi-Release: true`: a relative path resolves to the highest
//! `META-INF/versions/<n>/` variant whose `n` does not exceed the running
//! release version.
//!
//! # Lifecycle
//!
//! A [`PathTree`] is a description; [`PathTree::open`] returns an
//! [`OpenPathTree`] that may hold resources (an open archive handle) until
//! [`OpenPathTree::close`]. Walking an unopened archive tree opens and closes
//! the archive around the walk on every exit path.
//!
//! ```rust,no_run
//! use appgraph_cli::paths::{self, PathTree};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), appgraph_cli::paths::ContentError> {
//! let tree = paths::of_directory_or_archive(Path::new("lib/app.jar"), 17);
//! tree.walk(&mut |visit| {
//!     println!("{}", visit.relative_path());
//! })?;
//! # Ok(())
//! # }
//! ```

mod archive;
mod caching;
mod directory;
mod error;
mod filter;
pub mod io;
mod manifest;
mod multi_root;

pub use archive::{ArchiveTree, OpenArchiveTree};
pub use caching::CachingTree;
pub use directory::DirectoryTree;
pub use error::ContentError;
pub use filter::{FilteredTree, PathFilter};
pub use manifest::{Manifest, ReleaseMapping};
pub use multi_root::MultiRootTree;

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Visitor callback used by [`PathTree::walk`].
pub type Visitor<'f> = dyn FnMut(&mut PathVisit<'_>) + 'f;

/// Consumer callback used by [`PathTree::process_path`].
pub type Consumer<'f> = dyn FnMut(Option<&PathVisit<'_>>) + 'f;

/// Uniform contract over artifact content.
pub trait PathTree: Send + Sync + fmt::Debug {
    /// Filesystem locations backing this tree.
    fn roots(&self) -> Vec<PathBuf>;

    /// Parsed manifest, computed once.
    fn manifest(&self) -> Option<Arc<Manifest>>;

    fn is_multi_release(&self) -> bool {
        self.manifest().is_some_and(|m| m.is_multi_release())
    }

    /// Visits every entry. The visitor may call [`PathVisit::stop_walking`].
    fn walk(&self, visitor: &mut Visitor<'_>) -> Result<(), ContentError>;

    /// Resolves a single relative path, passing `None` when it does not exist.
    fn process_path(&self, relative: &str, consumer: &mut Consumer<'_>)
    -> Result<(), ContentError>;

    /// Opens the tree for repeated access.
    fn open(self: Arc<Self>) -> Result<Arc<dyn OpenPathTree>, ContentError>;

    fn contains(&self, relative: &str) -> Result<bool, ContentError> {
        let mut found = false;
        self.process_path(relative, &mut |visit| found = visit.is_some())?;
        Ok(found)
    }

    /// Bytes of a file entry, `None` when absent.
    fn read_entry(&self, relative: &str) -> Result<Option<Vec<u8>>, ContentError> {
        let mut result = Ok(None);
        self.process_path(relative, &mut |visit| {
            if let Some(visit) = visit.filter(|v| !v.is_directory()) {
                result = visit.read_bytes().map(Some);
            }
        })?;
        result
    }
}

/// A tree that may hold resources until closed.
pub trait OpenPathTree: PathTree {
    /// The tree this handle was opened from.
    fn original_tree(&self) -> Arc<dyn PathTree>;

    fn is_open(&self) -> bool;

    fn close(&self) -> Result<(), ContentError>;

    fn as_tree(self: Arc<Self>) -> Arc<dyn PathTree>;
}

/// Physical location of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryPath {
    File(PathBuf),
    Archive { archive: PathBuf, name: String },
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Archive { archive, name } => write!(f, "{}!/{}", archive.display(), name),
        }
    }
}

/// Reads the bytes behind an [`EntryPath`].
pub trait EntryReader {
    fn read(&self, entry: &EntryPath) -> Result<Vec<u8>, ContentError>;
}

/// Reader that opens the backing file or archive for each read.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedReader;

impl EntryReader for DetachedReader {
    fn read(&self, entry: &EntryPath) -> Result<Vec<u8>, ContentError> {
        match entry {
            EntryPath::File(path) => {
                let file = File::open(path).map_err(|e| ContentError::io(path, e))?;
                io::read_fully(file).map_err(|e| ContentError::io(path, e))
            }
            EntryPath::Archive { archive, name } => {
                let file = File::open(archive).map_err(|e| ContentError::io(archive, e))?;
                let mut zip = zip::ZipArchive::new(file).map_err(|e| ContentError::Archive {
                    path: archive.clone(),
                    reason: e.to_string(),
                })?;
                let entry = zip.by_name(name).map_err(|e| ContentError::Archive {
                    path: archive.clone(),
                    reason: format!("{name}: {e}"),
                })?;
                io::read_fully(entry).map_err(|e| ContentError::io(archive, e))
            }
        }
    }
}

/// One entry presented to a visitor or consumer.
#[derive(Clone)]
pub struct PathVisit<'a> {
    root: &'a Path,
    entry: EntryPath,
    relative: String,
    directory: bool,
    stopped: bool,
    reader: &'a dyn EntryReader,
}

impl<'a> PathVisit<'a> {
    pub(crate) fn new(
        root: &'a Path,
        entry: EntryPath,
        relative: String,
        directory: bool,
        reader: &'a dyn EntryReader,
    ) -> Self {
        Self {
            root,
            entry,
            relative,
            directory,
            stopped: false,
            reader,
        }
    }

    pub fn root(&self) -> &Path {
        self.root
    }

    pub fn path(&self) -> &EntryPath {
        &self.entry
    }

    /// `/`-separated path relative to the tree root.
    pub fn relative_path(&self) -> &str {
        &self.relative
    }

    pub fn is_directory(&self) -> bool {
        self.directory
    }

    pub fn stop_walking(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>, ContentError> {
        self.reader.read(&self.entry)
    }

    pub(crate) fn with_relative(&self, relative: &str) -> Self {
        let mut visit = self.clone();
        visit.relative = relative.to_string();
        visit
    }
}

impl fmt::Debug for PathVisit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathVisit")
            .field("entry", &self.entry)
            .field("relative", &self.relative)
            .field("directory", &self.directory)
            .finish()
    }
}

/// Tree for a directory, or an archive for anything else.
pub fn of_directory_or_archive(path: &Path, release: u32) -> Arc<dyn PathTree> {
    if path.is_dir() {
        Arc::new(DirectoryTree::with_release(path, release))
    } else {
        Arc::new(ArchiveTree::with_release(path, release))
    }
}

/// Normalizes a caller-supplied relative path to `/`-separated form without
/// leading or trailing separators. Paths escaping the root yield `None`.
pub(crate) fn normalize_relative(relative: &str) -> Option<String> {
    let mut parts = Vec::new();
    for part in relative.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => return None,
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Tree without content.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyTree;

impl PathTree for EmptyTree {
    fn roots(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    fn manifest(&self) -> Option<Arc<Manifest>> {
        None
    }

    fn walk(&self, _visitor: &mut Visitor<'_>) -> Result<(), ContentError> {
        Ok(())
    }

    fn process_path(
        &self,
        _relative: &str,
        consumer: &mut Consumer<'_>,
    ) -> Result<(), ContentError> {
        consumer(None);
        Ok(())
    }

    fn open(self: Arc<Self>) -> Result<Arc<dyn OpenPathTree>, ContentError> {
        Ok(Arc::new(SharedOpenTree::new(self)))
    }
}

/// Open handle for trees that hold no resources of their own.
///
/// Closing only flips a flag; later operations fail with [`ContentError::Closed`].
#[derive(Debug)]
pub(crate) struct SharedOpenTree {
    tree: Arc<dyn PathTree>,
    closed: AtomicBool,
}

impl SharedOpenTree {
    pub(crate) fn new(tree: Arc<dyn PathTree>) -> Self {
        Self {
            tree,
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), ContentError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ContentError::Closed {
                path: self.tree.roots().into_iter().next().unwrap_or_default(),
            });
        }
        Ok(())
    }
}

impl PathTree for SharedOpenTree {
    fn roots(&self) -> Vec<PathBuf> {
        self.tree.roots()
    }

    fn manifest(&self) -> Option<Arc<Manifest>> {
        self.tree.manifest()
    }

    fn walk(&self, visitor: &mut Visitor<'_>) -> Result<(), ContentError> {
        self.ensure_open()?;
        self.tree.walk(visitor)
    }

    fn process_path(
        &self,
        relative: &str,
        consumer: &mut Consumer<'_>,
    ) -> Result<(), ContentError> {
        self.ensure_open()?;
        self.tree.process_path(relative, consumer)
    }

    fn open(self: Arc<Self>) -> Result<Arc<dyn OpenPathTree>, ContentError> {
        self.tree.clone().open()
    }
}

impl OpenPathTree for SharedOpenTree {
    fn original_tree(&self) -> Arc<dyn PathTree> {
        self.tree.clone()
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    fn close(&self) -> Result<(), ContentError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn as_tree(self: Arc<Self>) -> Arc<dyn PathTree> {
        self
    }
}
