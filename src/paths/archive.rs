//! Archive-backed trees.
//!
//! [`ArchiveTree`] records the archive's size and modification time when it is
//! created. A later failure to open or read the archive while those values
//! differ (or the file is gone) is reported as
//! [`ContentError::MayHaveChanged`] rather than a plain I/O failure.

use super::manifest::{RawTree, TreeMetadata};
use super::{
    Consumer, ContentError, DetachedReader, EntryPath, EntryReader, Manifest, OpenPathTree, PathTree,
    PathVisit, Visitor, io, normalize_relative,
};
use crate::constants::DEFAULT_RELEASE_VERSION;
use std::cell::RefCell;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArchiveStamp {
    len: u64,
    modified: Option<SystemTime>,
}

fn stamp(path: &Path) -> Option<ArchiveStamp> {
    fs::metadata(path).ok().map(|m| ArchiveStamp {
        len: m.len(),
        modified: m.modified().ok(),
    })
}

/// Tree over a zip archive. Each walk opens the archive and closes it again.
#[derive(Debug)]
pub struct ArchiveTree {
    archive: PathBuf,
    stamp: Option<ArchiveStamp>,
    meta: TreeMetadata,
}

impl ArchiveTree {
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self::with_release(archive, DEFAULT_RELEASE_VERSION)
    }

    pub fn with_release(archive: impl Into<PathBuf>, release: u32) -> Self {
        let archive = archive.into();
        Self {
            stamp: stamp(&archive),
            archive,
            meta: TreeMetadata::new(release),
        }
    }

    pub fn archive(&self) -> &Path {
        &self.archive
    }

    pub fn release(&self) -> u32 {
        self.meta.release()
    }

    fn has_changed(&self) -> bool {
        stamp(&self.archive) != self.stamp
    }

    fn io_error(&self, source: std::io::Error) -> ContentError {
        if self.has_changed() {
            ContentError::MayHaveChanged {
                path: self.archive.clone(),
            }
        } else {
            ContentError::io(&self.archive, source)
        }
    }

    fn zip_error(&self, err: ZipError) -> ContentError {
        if self.has_changed() {
            return ContentError::MayHaveChanged {
                path: self.archive.clone(),
            };
        }
        match err {
            ZipError::Io(source) => ContentError::io(&self.archive, source),
            other => ContentError::Archive {
                path: self.archive.clone(),
                reason: other.to_string(),
            },
        }
    }

    fn open_archive(&self) -> Result<ZipArchive<File>, ContentError> {
        let file = File::open(&self.archive).map_err(|e| self.io_error(e))?;
        ZipArchive::new(file).map_err(|e| self.zip_error(e))
    }
}

/// Reads entries through an archive that is already open.
struct ZipEntryReader<'z> {
    tree: &'z ArchiveTree,
    zip: RefCell<&'z mut ZipArchive<File>>,
}

impl EntryReader for ZipEntryReader<'_> {
    fn read(&self, entry: &EntryPath) -> Result<Vec<u8>, ContentError> {
        match entry {
            EntryPath::Archive { archive, name } if archive == &self.tree.archive => {
                let mut zip = self.zip.borrow_mut();
                let file = zip.by_name(name).map_err(|e| self.tree.zip_error(e))?;
                io::read_fully(file).map_err(|e| self.tree.io_error(e))
            }
            other => DetachedReader.read(other),
        }
    }
}

fn walk_zip(
    tree: &ArchiveTree,
    zip: &mut ZipArchive<File>,
    visitor: &mut Visitor<'_>,
) -> Result<(), ContentError> {
    let names: Vec<String> = zip.file_names().map(str::to_string).collect();
    let reader = ZipEntryReader {
        tree,
        zip: RefCell::new(zip),
    };
    for name in names {
        let relative = name.trim_end_matches('/').to_string();
        if relative.is_empty() {
            continue;
        }
        let directory = name.ends_with('/');
        let entry = EntryPath::Archive {
            archive: tree.archive.clone(),
            name,
        };
        let mut visit = PathVisit::new(&tree.archive, entry, relative, directory, &reader);
        visitor(&mut visit);
        if visit.is_stopped() {
            break;
        }
    }
    Ok(())
}

fn lookup_zip(
    tree: &ArchiveTree,
    zip: &mut ZipArchive<File>,
    relative: &str,
    consumer: &mut Consumer<'_>,
) -> Result<(), ContentError> {
    let Some(relative) = normalize_relative(relative).filter(|r| !r.is_empty()) else {
        consumer(None);
        return Ok(());
    };
    let found = if zip.index_for_name(&relative).is_some() {
        Some((relative.clone(), false))
    } else {
        let dir_name = format!("{relative}/");
        zip.index_for_name(&dir_name).map(|_| (dir_name, true))
    };
    match found {
        Some((name, directory)) => {
            let reader = ZipEntryReader {
                tree,
                zip: RefCell::new(zip),
            };
            let entry = EntryPath::Archive {
                archive: tree.archive.clone(),
                name,
            };
            let visit = PathVisit::new(&tree.archive, entry, relative, directory, &reader);
            consumer(Some(&visit));
        }
        None => consumer(None),
    }
    Ok(())
}

impl RawTree for ArchiveTree {
    fn walk_raw(&self, visitor: &mut Visitor<'_>) -> Result<(), ContentError> {
        let mut zip = self.open_archive()?;
        debug!("Walking archive {}", self.archive.display());
        walk_zip(self, &mut zip, visitor)
    }

    fn lookup_raw(&self, relative: &str, consumer: &mut Consumer<'_>) -> Result<(), ContentError> {
        let mut zip = self.open_archive()?;
        lookup_zip(self, &mut zip, relative, consumer)
    }
}

impl PathTree for ArchiveTree {
    fn roots(&self) -> Vec<PathBuf> {
        vec![self.archive.clone()]
    }

    fn manifest(&self) -> Option<Arc<Manifest>> {
        self.meta.manifest(self)
    }

    fn walk(&self, visitor: &mut Visitor<'_>) -> Result<(), ContentError> {
        self.meta.walk(self, visitor)
    }

    fn process_path(&self, relative: &str, consumer: &mut Consumer<'_>) -> Result<(), ContentError> {
        match normalize_relative(relative) {
            Some(relative) => self.meta.process_path(self, &relative, consumer),
            None => {
                consumer(None);
                Ok(())
            }
        }
    }

    fn open(self: Arc<Self>) -> Result<Arc<dyn OpenPathTree>, ContentError> {
        let zip = self.open_archive()?;
        Ok(Arc::new(OpenArchiveTree {
            tree: self,
            zip: Mutex::new(Some(zip)),
        }))
    }
}

/// An [`ArchiveTree`] with its archive held open until [`close`](OpenPathTree::close).
///
/// Access is serialized on the archive handle. Visitors must not call back into
/// the same handle while a walk is in progress.
#[derive(Debug)]
pub struct OpenArchiveTree {
    tree: Arc<ArchiveTree>,
    zip: Mutex<Option<ZipArchive<File>>>,
}

impl OpenArchiveTree {
    fn lock(&self) -> MutexGuard<'_, Option<ZipArchive<File>>> {
        self.zip.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn closed(&self) -> ContentError {
        ContentError::Closed {
            path: self.tree.archive.clone(),
        }
    }
}

impl RawTree for OpenArchiveTree {
    fn walk_raw(&self, visitor: &mut Visitor<'_>) -> Result<(), ContentError> {
        let mut guard = self.lock();
        let zip = guard.as_mut().ok_or_else(|| self.closed())?;
        walk_zip(&self.tree, zip, visitor)
    }

    fn lookup_raw(&self, relative: &str, consumer: &mut Consumer<'_>) -> Result<(), ContentError> {
        let mut guard = self.lock();
        let zip = guard.as_mut().ok_or_else(|| self.closed())?;
        lookup_zip(&self.tree, zip, relative, consumer)
    }
}

impl PathTree for OpenArchiveTree {
    fn roots(&self) -> Vec<PathBuf> {
        self.tree.roots()
    }

    fn manifest(&self) -> Option<Arc<Manifest>> {
        self.tree.manifest()
    }

    fn walk(&self, visitor: &mut Visitor<'_>) -> Result<(), ContentError> {
        if self.lock().is_none() {
            return Err(self.closed());
        }
        let mapping = self.tree.meta.mapping(self.tree.as_ref())?;
        if mapping.is_empty() {
            return self.walk_raw(visitor);
        }
        self.tree.meta.walk(self, visitor)
    }

    fn process_path(&self, relative: &str, consumer: &mut Consumer<'_>) -> Result<(), ContentError> {
        if self.lock().is_none() {
            return Err(self.closed());
        }
        // mapping is computed through the original tree, never under our lock
        self.tree.meta.mapping(self.tree.as_ref())?;
        match normalize_relative(relative) {
            Some(relative) => self.tree.meta.process_path(self, &relative, consumer),
            None => {
                consumer(None);
                Ok(())
            }
        }
    }

    fn open(self: Arc<Self>) -> Result<Arc<dyn OpenPathTree>, ContentError> {
        self.tree.clone().open()
    }
}

impl OpenPathTree for OpenArchiveTree {
    fn original_tree(&self) -> Arc<dyn PathTree> {
        self.tree.clone()
    }

    fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    fn close(&self) -> Result<(), ContentError> {
        if self.lock().take().is_some() {
            debug!("Closed archive {}", self.tree.archive.display());
        }
        Ok(())
    }

    fn as_tree(self: Arc<Self>) -> Arc<dyn PathTree> {
        self
    }
}
