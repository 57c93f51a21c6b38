//! Snapshot-replaying tree.

use super::{
    Consumer, ContentError, DetachedReader, EntryPath, Manifest, OpenPathTree, PathTree, PathVisit,
    Visitor, normalize_relative,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug)]
struct CachedEntry {
    root: PathBuf,
    entry: EntryPath,
    relative: String,
    directory: bool,
}

#[derive(Debug)]
struct Snapshot {
    manifest: Option<Arc<Manifest>>,
    entries: Vec<CachedEntry>,
    index: HashMap<String, usize>,
}

impl Snapshot {
    fn visit<'a>(&'a self, entry: &'a CachedEntry) -> PathVisit<'a> {
        PathVisit::new(&entry.root, entry.entry.clone(), entry.relative.clone(), entry.directory, &DetachedReader)
    }
}

/// Wraps a tree and serves walks and lookups from a snapshot taken on first use.
///
/// The snapshot records each entry's root, physical path and relative path in
/// walk order. Reads from a snapshot open the backing file or archive for that
/// one read, so a snapshot stays usable after the wrapped handle is closed.
/// [`close`](OpenPathTree::close) drops the snapshot and closes the wrapped
/// handle, if there is one.
#[derive(Debug)]
pub struct CachingTree {
    delegate: Arc<dyn PathTree>,
    handle: Option<Arc<dyn OpenPathTree>>,
    snapshot: Mutex<Option<Arc<Snapshot>>>,
}

impl CachingTree {
    pub fn new(delegate: Arc<dyn PathTree>) -> Self {
        Self {
            delegate,
            handle: None,
            snapshot: Mutex::new(None),
        }
    }

    /// Caches an already opened tree; closing this tree closes `handle`.
    pub fn from_open(handle: Arc<dyn OpenPathTree>) -> Self {
        Self {
            delegate: handle.clone().as_tree(),
            handle: Some(handle),
            snapshot: Mutex::new(None),
        }
    }

    pub fn is_cached(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<Snapshot>>> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Result<Arc<Snapshot>, ContentError> {
        let mut guard = self.lock();
        if let Some(snapshot) = guard.as_ref() {
            return Ok(snapshot.clone());
        }

        let mut entries = Vec::new();
        let mut index = HashMap::new();
        self.delegate.walk(&mut |visit| {
            if index.contains_key(visit.relative_path()) {
                return;
            }
            index.insert(visit.relative_path().to_string(), entries.len());
            entries.push(CachedEntry {
                root: visit.root().to_path_buf(),
                entry: visit.path().clone(),
                relative: visit.relative_path().to_string(),
                directory: visit.is_directory(),
            });
        })?;
        debug!("Cached {} entries of {:?}", entries.len(), self.delegate.roots());

        let snapshot = Arc::new(Snapshot {
            manifest: self.delegate.manifest(),
            entries,
            index,
        });
        *guard = Some(snapshot.clone());
        Ok(snapshot)
    }
}

impl PathTree for CachingTree {
    fn roots(&self) -> Vec<PathBuf> {
        self.delegate.roots()
    }

    fn manifest(&self) -> Option<Arc<Manifest>> {
        match self.lock().as_ref() {
            Some(snapshot) => snapshot.manifest.clone(),
            None => self.delegate.manifest(),
        }
    }

    fn walk(&self, visitor: &mut Visitor<'_>) -> Result<(), ContentError> {
        let snapshot = self.snapshot()?;
        for entry in &snapshot.entries {
            let mut visit = snapshot.visit(entry);
            visitor(&mut visit);
            if visit.is_stopped() {
                break;
            }
        }
        Ok(())
    }

    fn process_path(&self, relative: &str, consumer: &mut Consumer<'_>) -> Result<(), ContentError> {
        let snapshot = self.snapshot()?;
        let found = normalize_relative(relative)
            .and_then(|r| snapshot.index.get(&r).copied())
            .and_then(|i| snapshot.entries.get(i));
        match found {
            Some(entry) => consumer(Some(&snapshot.visit(entry))),
            None => consumer(None),
        }
        Ok(())
    }

    fn open(self: Arc<Self>) -> Result<Arc<dyn OpenPathTree>, ContentError> {
        self.snapshot()?;
        Ok(self)
    }
}

impl OpenPathTree for CachingTree {
    fn original_tree(&self) -> Arc<dyn PathTree> {
        match &self.handle {
            Some(handle) => handle.original_tree(),
            None => self.delegate.clone(),
        }
    }

    fn is_open(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_open())
    }

    fn close(&self) -> Result<(), ContentError> {
        self.lock().take();
        match &self.handle {
            Some(handle) => handle.close(),
            None => Ok(()),
        }
    }

    fn as_tree(self: Arc<Self>) -> Arc<dyn PathTree> {
        self
    }
}
