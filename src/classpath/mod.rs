//! Classpath elements backed by content trees.
//!
//! A [`ClassPathElement`] keeps one [`OpenPathTree`] open for its lifetime and
//! guards it with a read/write lock:
//!
//! - lookups, listings and byte reads take the read lock
//! - [`ClassPathElement::close`] takes the write lock, so it waits for in-flight
//!   reads and no read ever observes a half-closed handle
//! - reads issued after close open a short-lived handle on the original tree
//!   for that single operation instead of failing
//!
//! Interrupted reads keep their bytes; see [`crate::paths::io::take_interrupted`].

use crate::models::ArtifactKey;
use crate::paths::{ContentError, EntryPath, Manifest, OpenPathTree, PathTree};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, warn};

/// A single resource found in an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPathResource {
    pub name: String,
    pub path: EntryPath,
    pub directory: bool,
}

/// One entry of a runtime or deployment classpath.
#[derive(Debug)]
pub struct ClassPathElement {
    dependency_key: Option<ArtifactKey>,
    runtime: bool,
    tree: Arc<dyn OpenPathTree>,
    lock: RwLock<()>,
    closed: AtomicBool,
    resources: Mutex<Option<Arc<BTreeSet<String>>>>,
}

impl ClassPathElement {
    /// Opens `tree` and keeps it open until [`close`](Self::close).
    pub fn new(
        tree: Arc<dyn PathTree>,
        dependency_key: Option<ArtifactKey>,
        runtime: bool,
    ) -> Result<Self, ContentError> {
        Ok(Self::from_open(tree.open()?, dependency_key, runtime))
    }

    pub fn from_open(
        tree: Arc<dyn OpenPathTree>,
        dependency_key: Option<ArtifactKey>,
        runtime: bool,
    ) -> Self {
        Self {
            dependency_key,
            runtime,
            tree,
            lock: RwLock::new(()),
            closed: AtomicBool::new(false),
            resources: Mutex::new(None),
        }
    }

    pub fn dependency_key(&self) -> Option<&ArtifactKey> {
        self.dependency_key.as_ref()
    }

    pub fn is_runtime(&self) -> bool {
        self.runtime
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        self.tree.roots()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Runs `f` against the long-lived tree, or against a fresh short-lived
    /// handle when the element has been closed.
    pub fn with_open_tree<T>(
        &self,
        f: impl FnOnce(&dyn PathTree) -> Result<T, ContentError>,
    ) -> Result<T, ContentError> {
        self.with_tree(|tree, _| f(tree))
    }

    /// Like [`with_open_tree`](Self::with_open_tree), also telling `f` whether
    /// the long-lived handle serves the call. `f` runs under the read lock.
    fn with_tree<T>(
        &self,
        f: impl FnOnce(&dyn PathTree, bool) -> Result<T, ContentError>,
    ) -> Result<T, ContentError> {
        let _read = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        if !self.is_closed() {
            return f(self.tree.as_ref(), true);
        }

        debug!("Element {:?} is closed, using a short-lived handle", self.tree.roots());
        let fresh = self.tree.original_tree().open()?;
        let result = f(fresh.as_ref(), false);
        if let Err(e) = fresh.close() {
            warn!("Failed to close short-lived handle of {:?}: {}", fresh.roots(), e);
        }
        result
    }

    pub fn get_resource(&self, name: &str) -> Result<Option<ClassPathResource>, ContentError> {
        self.with_open_tree(|tree| {
            let mut found = None;
            tree.process_path(name, &mut |visit| {
                found = visit.map(|v| ClassPathResource {
                    name: v.relative_path().to_string(),
                    path: v.path().clone(),
                    directory: v.is_directory(),
                });
            })?;
            Ok(found)
        })
    }

    /// Full content of a file resource.
    pub fn read_resource(&self, name: &str) -> Result<Option<Vec<u8>>, ContentError> {
        self.with_open_tree(|tree| tree.read_entry(name))
    }

    /// Names of all file resources, indexed once and dropped on close.
    pub fn provided_resources(&self) -> Result<Arc<BTreeSet<String>>, ContentError> {
        if let Some(index) = self.resources.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            return Ok(index.clone());
        }
        self.with_tree(|tree, long_lived| {
            let mut names = BTreeSet::new();
            tree.walk(&mut |visit| {
                if !visit.is_directory() {
                    names.insert(visit.relative_path().to_string());
                }
            })?;
            let index = Arc::new(names);
            // close() cannot run while the read lock is held
            if long_lived {
                *self.resources.lock().unwrap_or_else(PoisonError::into_inner) = Some(index.clone());
            }
            Ok(index)
        })
    }

    pub fn manifest(&self) -> Option<Arc<Manifest>> {
        self.with_open_tree(|tree| Ok(tree.manifest())).ok().flatten()
    }

    /// Closes the long-lived handle once every in-flight read has finished.
    pub fn close(&self) -> Result<(), ContentError> {
        let _write = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.resources.lock().unwrap_or_else(PoisonError::into_inner).take();
        self.tree.close()
    }
}

impl Drop for ClassPathElement {
    fn drop(&mut self) {
        if !self.is_closed() {
            let _ = self.close();
        }
    }
}
