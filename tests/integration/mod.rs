//! Integration test suite
//!
//! End-to-end tests that build temporary artifact repositories with
//! [`appgraph_cli::test_utils::CatalogBuilder`] and resolve them through the
//! library or the `appgraph` binary.
//!
//! # Test Organization
//!
//! - `resolver` - classpath partitioning, flags, workspace modules, exclusions
//! - `conditional` - conditional dependency activation and chaining
//! - `platform` - platform release alignment during resolution
//! - `cli` - the `resolve`, `content` and `platform` commands
//! - `config` - configuration file loading and environment overrides
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test integration
//! RUST_LOG=appgraph_cli=debug cargo test --test integration conditional
//! ```

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod conditional;
mod resolver;
