//! Data model shared by the walker, the partitioner and their consumers.
//!
//! - [`ArtifactKey`] is the deduplication identity; [`ArtifactCoords`] adds a version
//! - [`ModuleId`] names a node of the raw dependency graph
//! - [`Dependency`] and [`ResolvedDependency`] carry [`DependencyFlags`]
//! - [`ApplicationModel`] is the immutable result of one resolution

mod app_model;
mod dependency;
mod flags;
mod key;

pub use app_model::{ApplicationModel, ExtensionCapabilities};
pub use dependency::{Dependency, DependencyBuilder, ResolvedDependency, WorkspaceModule};
pub use flags::DependencyFlags;
pub use key::{ArtifactCoords, ArtifactKey, ModuleId};
