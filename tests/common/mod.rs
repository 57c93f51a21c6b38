//! Shared helpers for the unit and integration suites.
#![allow(dead_code)]

use anyhow::Result;
use appgraph_cli::config::LaunchMode;
use appgraph_cli::models::{ApplicationModel, ArtifactKey, DependencyFlags};
use appgraph_cli::resolver::ApplicationModelResolver;
use appgraph_cli::test_utils::{CatalogBuilder, JarFixture};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const APP: &str = "org.acme:app:1.0";

/// Resolves `builder`'s root in `mode` with default settings.
pub fn resolve(builder: &CatalogBuilder, mode: LaunchMode) -> Result<ApplicationModel> {
    let resolver = ApplicationModelResolver::new(Arc::new(builder.host()?));
    Ok(resolver.resolve(builder.root(), mode)?)
}

pub fn key(value: &str) -> ArtifactKey {
    value.parse().expect("valid artifact key")
}

/// Sorted `g:a` keys of the runtime classpath.
pub fn runtime_keys(model: &ApplicationModel) -> Vec<String> {
    let mut keys: Vec<String> = model.runtime_dependencies().map(|d| d.key().to_string()).collect();
    keys.sort();
    keys
}

/// Sorted `g:a` keys of the deployment-only classpath.
pub fn deployment_keys(model: &ApplicationModel) -> Vec<String> {
    let mut keys: Vec<String> = model.deployment_dependencies().map(|d| d.key().to_string()).collect();
    keys.sort();
    keys
}

pub fn flags_of(model: &ApplicationModel, value: &str) -> DependencyFlags {
    model
        .dependency(&key(value))
        .unwrap_or_else(|| panic!("{value} is not part of the model"))
        .flags()
}

/// Writes a jar with the given entries into `dir`.
pub fn write_jar(dir: &Path, name: &str, entries: &[(&str, &str)]) -> Result<PathBuf> {
    let jar = entries
        .iter()
        .fold(JarFixture::new(), |jar, (name, content)| jar.entry(name, content));
    jar.write(&dir.join(name))
}

/// An application with one extension, its deployment companion and a
/// library the companion depends on.
pub fn single_extension_app() -> Result<CatalogBuilder> {
    CatalogBuilder::new(APP, &["org.acme:ext-a:1.0"])?
        .extension(
            "org.acme:ext-a:1.0",
            &["org.acme:lib-a:1.0"],
            "deployment-artifact=org.acme:ext-a-deployment:1.0\nprovides-capabilities=org.acme.a",
        )?
        .library("org.acme:lib-a:1.0", &[])?
        .library("org.acme:ext-a-deployment:1.0", &["org.acme:build-tool:1.0"])?
        .library("org.acme:build-tool:1.0", &[])
}
