//! Archive fixtures.

use crate::constants::{EXTENSION_DESCRIPTOR_PATH, MANIFEST_PATH, MULTI_RELEASE_PREFIX};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// In-memory description of a jar, written with [`JarFixture::write`].
#[derive(Debug, Clone, Default)]
pub struct JarFixture {
    entries: Vec<(String, Option<Vec<u8>>)>,
}

impl JarFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file entry.
    pub fn entry(mut self, name: &str, content: impl AsRef<[u8]>) -> Self {
        self.entries.push((name.to_string(), Some(content.as_ref().to_vec())));
        self
    }

    /// Adds an explicit directory entry.
    pub fn directory(mut self, name: &str) -> Self {
        self.entries.push((name.trim_end_matches('/').to_string(), None));
        self
    }

    pub fn manifest(self, attributes: &[(&str, &str)]) -> Self {
        let mut text = String::from("Manifest-Version: 1.0\r\n");
        for (name, value) in attributes {
            text.push_str(&format!("{name}: {value}\r\n"));
        }
        self.entry(MANIFEST_PATH, text)
    }

    pub fn multi_release(self) -> Self {
        self.manifest(&[("Multi-Release", "true")])
    }

    /// Adds `name` under `META-INF/versions/<version>/`.
    pub fn versioned_entry(self, version: u32, name: &str, content: impl AsRef<[u8]>) -> Self {
        self.entry(&format!("{MULTI_RELEASE_PREFIX}{version}/{name}"), content)
    }

    /// Adds an extension descriptor at the default location.
    pub fn descriptor(self, properties: &str) -> Self {
        self.entry(EXTENSION_DESCRIPTOR_PATH, properties)
    }

    pub fn write(&self, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (name, content) in &self.entries {
            match content {
                Some(bytes) => {
                    writer.start_file(name.as_str(), options)?;
                    writer.write_all(bytes)?;
                }
                None => writer.add_directory(format!("{name}/"), options)?,
            }
        }
        writer.finish().with_context(|| format!("Failed to finish {}", path.display()))?;
        Ok(path.to_path_buf())
    }
}
