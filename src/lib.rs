//! appgraph - build-time application dependency graph resolver
//!
//! Given the raw, possibly cyclic dependency graph produced by an artifact
//! resolution engine, appgraph:
//!
//! - deduplicates artifacts by [`ArtifactKey`](models::ArtifactKey)
//! - recognizes extension artifacts by the descriptor they carry
//! - activates conditional dependencies of extensions up to a fixpoint
//! - partitions the result into runtime and deployment classpaths
//! - checks that imported platform BOMs belong to one platform release
//! - exposes the content of every artifact through [`paths::PathTree`]
//!
//! # Modules
//!
//! - [`core`] - error types and user-facing error rendering
//! - [`constants`] - descriptor keys, property conventions, variant attributes
//! - [`models`] - keys, coordinates, flags, dependencies, the application model
//! - [`descriptor`] - extension descriptor parsing and the loader registry
//! - [`paths`] - content trees over directories and archives
//! - [`classpath`] - lock-guarded classpath elements
//! - [`graph`] - the input graph, its catalog format and the host contract
//! - [`resolver`] - walker, conditional fixpoint and deployment partitioning
//! - [`platform`] - platform release registry and alignment checks
//! - [`config`] - resolver configuration and launch modes
//! - [`cli`] - the `appgraph` command line
//!
//! # Example
//!
//! ```rust,no_run
//! use appgraph_cli::config::LaunchMode;
//! use appgraph_cli::graph::CatalogGraphHost;
//! use appgraph_cli::resolver::ApplicationModelResolver;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn example() -> anyhow::Result<()> {
//! let host = CatalogGraphHost::from_file(Path::new("build/catalog.json"))?;
//! let root = host.catalog().root.clone();
//! let model = ApplicationModelResolver::new(Arc::new(host)).resolve(&root, LaunchMode::Normal)?;
//! for dep in model.runtime_dependencies() {
//!     println!("{}", dep.coords());
//! }
//! # Ok(())
//! # }
//! ```

pub mod classpath;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod descriptor;
pub mod graph;
pub mod models;
pub mod paths;
pub mod platform;
pub mod resolver;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
