//! Directory-backed trees.

use super::manifest::{RawTree, TreeMetadata};
use super::{
    Consumer, ContentError, DetachedReader, EntryPath, Manifest, OpenPathTree, PathTree, PathVisit,
    SharedOpenTree, Visitor, normalize_relative,
};
use crate::constants::DEFAULT_RELEASE_VERSION;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Tree over a plain directory. A directory that does not exist is empty.
#[derive(Debug)]
pub struct DirectoryTree {
    dir: PathBuf,
    meta: TreeMetadata,
}

impl DirectoryTree {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_release(dir, DEFAULT_RELEASE_VERSION)
    }

    pub fn with_release(dir: impl Into<PathBuf>, release: u32) -> Self {
        Self {
            dir: dir.into(),
            meta: TreeMetadata::new(release),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn release(&self) -> u32 {
        self.meta.release()
    }

    fn relative_of(&self, path: &Path) -> String {
        path.strip_prefix(&self.dir)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl RawTree for DirectoryTree {
    fn walk_raw(&self, visitor: &mut Visitor<'_>) -> Result<(), ContentError> {
        if !self.dir.is_dir() {
            return Ok(());
        }
        for entry in WalkDir::new(&self.dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| ContentError::io(&self.dir, e.into()))?;
            let relative = self.relative_of(entry.path());
            let mut visit = PathVisit::new(
                &self.dir,
                EntryPath::File(entry.path().to_path_buf()),
                relative,
                entry.file_type().is_dir(),
                &DetachedReader,
            );
            visitor(&mut visit);
            if visit.is_stopped() {
                break;
            }
        }
        Ok(())
    }

    fn lookup_raw(&self, relative: &str, consumer: &mut Consumer<'_>) -> Result<(), ContentError> {
        let path = normalize_relative(relative)
            .filter(|r| !r.is_empty())
            .map(|r| (self.dir.join(&r), r));
        match path {
            Some((path, relative)) if path.exists() => {
                let directory = path.is_dir();
                let visit =
                    PathVisit::new(&self.dir, EntryPath::File(path), relative, directory, &DetachedReader);
                consumer(Some(&visit));
            }
            _ => consumer(None),
        }
        Ok(())
    }
}

impl PathTree for DirectoryTree {
    fn roots(&self) -> Vec<PathBuf> {
        vec![self.dir.clone()]
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
        Ok(Arc::new(SharedOpenTree::new(self)))
    }
}
