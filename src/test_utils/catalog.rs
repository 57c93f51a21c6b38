//! Temporary artifact repositories described by an [`ArtifactCatalog`].

use super::JarFixture;
use crate::graph::catalog::{
    ArtifactCatalog, CatalogArtifact, CatalogEdge, CatalogModule, CatalogWorkspace, PlatformSection,
};
use crate::graph::CatalogGraphHost;
use crate::models::{ArtifactCoords, ArtifactKey, ModuleId};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builds a repository of jars in a temporary directory plus its catalog.
///
/// Modules are added with their outgoing edges; jars land in `repo/` and
/// workspace modules under `workspace/<artifactId>/`.
#[derive(Debug)]
pub struct CatalogBuilder {
    dir: TempDir,
    root: ModuleId,
    modules: Vec<CatalogModule>,
    workspace_modules: Vec<ArtifactKey>,
    platform: PlatformSection,
}

impl CatalogBuilder {
    pub fn new(root: &str, dependencies: &[&str]) -> Result<Self> {
        let root: ModuleId = root.parse()?;
        let dir = TempDir::new().context("Failed to create temp dir")?;
        let mut builder = Self {
            dir,
            root: root.clone(),
            modules: Vec::new(),
            workspace_modules: Vec::new(),
            platform: PlatformSection::default(),
        };
        builder.push(root, dependencies, Vec::new(), None)?;
        Ok(builder)
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn root(&self) -> &ModuleId {
        &self.root
    }

    /// Path at which the jar of `id` is written.
    pub fn jar_path(&self, id: &str) -> Result<PathBuf> {
        let id: ModuleId = id.parse()?;
        Ok(self.dir.path().join("repo").join(jar_name(&id)))
    }

    /// A module whose jar holds a single class file.
    pub fn library(self, id: &str, dependencies: &[&str]) -> Result<Self> {
        let name = format!("{}/Lib.class", id.replace([':', '.'], "/"));
        self.with_jar(id, dependencies, JarFixture::new().entry(&name, b"\xca\xfe\xba\xbe"))
    }

    /// A module whose jar carries an extension descriptor.
    pub fn extension(self, id: &str, dependencies: &[&str], descriptor: &str) -> Result<Self> {
        self.with_jar(id, dependencies, JarFixture::new().descriptor(descriptor))
    }

    /// A module whose jar is built from `jar`.
    pub fn with_jar(mut self, id: &str, dependencies: &[&str], jar: JarFixture) -> Result<Self> {
        let module: ModuleId = id.parse()?;
        let relative = PathBuf::from("repo").join(jar_name(&module));
        jar.write(&self.dir.path().join(&relative))?;
        let artifact = CatalogArtifact {
            classifier: String::new(),
            artifact_type: "jar".to_string(),
            path: Some(relative),
        };
        self.push(module, dependencies, vec![artifact], None)?;
        Ok(self)
    }

    /// A module known to the catalog but without any artifact.
    pub fn pom_only(mut self, id: &str, dependencies: &[&str]) -> Result<Self> {
        self.push(id.parse()?, dependencies, Vec::new(), None)?;
        Ok(self)
    }

    /// A workspace module with a `classes` output holding `files`.
    pub fn workspace_module(mut self, id: &str, dependencies: &[&str], files: &[(&str, &str)]) -> Result<Self> {
        let module: ModuleId = id.parse()?;
        let module_dir = PathBuf::from("workspace").join(module.artifact_id());
        let classes = self.dir.path().join(&module_dir).join("build").join("classes");
        fs::create_dir_all(&classes)?;
        for (name, content) in files {
            let path = classes.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
        }
        self.workspace_modules.push(module.ga_key());
        let workspace = CatalogWorkspace {
            module_dir,
            build_dir: None,
            outputs: vec![PathBuf::from("classes")],
        };
        self.push(module, dependencies, Vec::new(), Some(workspace))?;
        Ok(self)
    }

    /// Adds an edge with an explicit scope or optionality.
    pub fn edge(mut self, from: &str, to: &str, scope: Option<&str>, optional: bool) -> Result<Self> {
        let from: ModuleId = from.parse()?;
        let edge = CatalogEdge::Detailed {
            module: to.parse()?,
            scope: scope.map(str::to_string),
            optional,
        };
        let module = self
            .modules
            .iter_mut()
            .find(|m| m.id == from)
            .with_context(|| format!("Unknown module {from}"))?;
        module.dependencies.push(edge);
        Ok(self)
    }

    pub fn platform_import(mut self, coords: &str) -> Result<Self> {
        let coords: ArtifactCoords = coords.parse()?;
        self.platform.imports.push(coords);
        Ok(self)
    }

    pub fn platform_property(mut self, name: &str, value: &str) -> Self {
        self.platform.properties.insert(name.to_string(), value.to_string());
        self
    }

    pub fn catalog(&self) -> Result<ArtifactCatalog> {
        let catalog = ArtifactCatalog {
            root: self.root.clone(),
            workspace_modules: self.workspace_modules.clone(),
            platform: self.platform.clone(),
            modules: self.modules.clone(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Writes `catalog.json` into the temporary directory.
    pub fn write(&self) -> Result<PathBuf> {
        let path = self.dir.path().join("catalog.json");
        fs::write(&path, serde_json::to_string_pretty(&self.catalog()?)?)?;
        Ok(path)
    }

    pub fn host(&self) -> Result<CatalogGraphHost> {
        Ok(CatalogGraphHost::new(self.catalog()?, self.dir.path()))
    }

    fn push(
        &mut self,
        id: ModuleId,
        dependencies: &[&str],
        artifacts: Vec<CatalogArtifact>,
        workspace: Option<CatalogWorkspace>,
    ) -> Result<()> {
        let dependencies = dependencies
            .iter()
            .map(|d| d.parse().map(CatalogEdge::Plain))
            .collect::<Result<Vec<_>, _>>()?;
        self.modules.push(CatalogModule {
            id,
            dependencies,
            artifacts,
            workspace,
        });
        Ok(())
    }
}

fn jar_name(id: &ModuleId) -> String {
    format!("{}-{}.jar", id.artifact_id(), id.version())
}
