//! Unit test suite
//!
//! Exercises library components through their public API with real archives
//! and directories on disk.
//!
//! # Test Organization
//!
//! - `content_trees` - archive, directory, multi-release and caching trees
//! - `classpath_elements` - element lifecycle, concurrent close and reads after close

#[path = "../common/mod.rs"]
mod common;

mod classpath_elements;
mod content_trees;
