//! Several trees presented as one.

use super::{Consumer, ContentError, Manifest, OpenPathTree, PathTree, Visitor};
use std::path::PathBuf;
use std::sync::Arc;

/// Overlays trees in order. Lookups return the first tree that has the path;
/// walks visit every tree in turn.
#[derive(Debug)]
pub struct MultiRootTree {
    trees: Vec<Arc<dyn PathTree>>,
}

impl MultiRootTree {
    pub fn new(trees: Vec<Arc<dyn PathTree>>) -> Self {
        Self { trees }
    }

    pub fn trees(&self) -> &[Arc<dyn PathTree>] {
        &self.trees
    }
}

impl PathTree for MultiRootTree {
    fn roots(&self) -> Vec<PathBuf> {
        self.trees.iter().flat_map(|t| t.roots()).collect()
    }

    fn manifest(&self) -> Option<Arc<Manifest>> {
        self.trees.iter().find_map(|t| t.manifest())
    }

    fn walk(&self, visitor: &mut Visitor<'_>) -> Result<(), ContentError> {
        for tree in &self.trees {
            let mut stopped = false;
            tree.walk(&mut |visit| {
                visitor(visit);
                stopped = visit.is_stopped();
            })?;
            if stopped {
                break;
            }
        }
        Ok(())
    }

    fn process_path(&self, relative: &str, consumer: &mut Consumer<'_>) -> Result<(), ContentError> {
        for tree in &self.trees {
            let mut hit = false;
            tree.process_path(relative, &mut |visit| {
                if let Some(visit) = visit {
                    hit = true;
                    consumer(Some(visit));
                }
            })?;
            if hit {
                return Ok(());
            }
        }
        consumer(None);
        Ok(())
    }

    fn open(self: Arc<Self>) -> Result<Arc<dyn OpenPathTree>, ContentError> {
        let mut opened: Vec<Arc<dyn OpenPathTree>> = Vec::with_capacity(self.trees.len());
        for tree in &self.trees {
            match tree.clone().open() {
                Ok(handle) => opened.push(handle),
                Err(e) => {
                    for handle in &opened {
                        let _ = handle.close();
                    }
                    return Err(e);
                }
            }
        }
        let view = MultiRootTree::new(opened.iter().map(|h| h.clone().as_tree()).collect());
        Ok(Arc::new(OpenMultiRootTree {
            original: self,
            opened,
            view,
        }))
    }
}

#[derive(Debug)]
struct OpenMultiRootTree {
    original: Arc<MultiRootTree>,
    opened: Vec<Arc<dyn OpenPathTree>>,
    view: MultiRootTree,
}

impl PathTree for OpenMultiRootTree {
    fn roots(&self) -> Vec<PathBuf> {
        self.view.roots()
    }

    fn manifest(&self) -> Option<Arc<Manifest>> {
        self.view.manifest()
    }

    fn walk(&self, visitor: &mut Visitor<'_>) -> Result<(), ContentError> {
        self.view.walk(visitor)
    }

    fn process_path(&self, relative: &str, consumer: &mut Consumer<'_>) -> Result<(), ContentError> {
        self.view.process_path(relative, consumer)
    }

    fn open(self: Arc<Self>) -> Result<Arc<dyn OpenPathTree>, ContentError> {
        self.original.clone().open()
    }
}

impl OpenPathTree for OpenMultiRootTree {
    fn original_tree(&self) -> Arc<dyn PathTree> {
        self.original.clone()
    }

    fn is_open(&self) -> bool {
        self.opened.iter().all(|h| h.is_open())
    }

    fn close(&self) -> Result<(), ContentError> {
        let mut first_error = None;
        for handle in &self.opened {
            if let Err(e) = handle.close() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn as_tree(self: Arc<Self>) -> Arc<dyn PathTree> {
        self
    }
}
