//! Manifest parsing and the multi-release overlay.

use super::{Consumer, ContentError, PathVisit, Visitor};
use crate::constants::{MANIFEST_PATH, MULTI_RELEASE_ATTRIBUTE, MULTI_RELEASE_PREFIX};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Canonical relative path to the version-specific relative path serving it.
pub type ReleaseMapping = BTreeMap<String, String>;

/// A parsed `META-INF/MANIFEST.MF`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    main: BTreeMap<String, String>,
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl Manifest {
    /// Parses manifest text. Lines starting with a single space continue the
    /// previous line; a blank line starts a new section named by `Name:`.
    pub fn parse(text: &str) -> Self {
        let mut logical: Vec<String> = Vec::new();
        for line in text.lines() {
            if let Some(rest) = line.strip_prefix(' ') {
                if let Some(last) = logical.last_mut() {
                    last.push_str(rest);
                    continue;
                }
            }
            logical.push(line.to_string());
        }

        let mut manifest = Self::default();
        let mut current: Option<String> = None;
        let mut in_main = true;
        for line in logical {
            if line.trim().is_empty() {
                in_main = false;
                current = None;
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let (name, value) = (name.trim().to_string(), value.trim().to_string());
            if in_main {
                manifest.main.insert(name, value);
            } else if current.is_none() && name.eq_ignore_ascii_case("Name") {
                manifest.sections.entry(value.clone()).or_default();
                current = Some(value);
            } else if let Some(section) = current.as_ref() {
                manifest.sections.entry(section.clone()).or_default().insert(name, value);
            }
        }
        manifest
    }

    /// Main attribute lookup, case-insensitive on the attribute name.
    pub fn main_attribute(&self, name: &str) -> Option<&str> {
        self.main
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn main_attributes(&self) -> &BTreeMap<String, String> {
        &self.main
    }

    pub fn section(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.sections.get(name)
    }

    pub fn is_multi_release(&self) -> bool {
        self.main_attribute(MULTI_RELEASE_ATTRIBUTE).is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}

/// Raw access to a directory or archive, before the overlay is applied.
pub(crate) trait RawTree {
    fn walk_raw(&self, visitor: &mut Visitor<'_>) -> Result<(), ContentError>;

    fn lookup_raw(&self, relative: &str, consumer: &mut Consumer<'_>) -> Result<(), ContentError>;
}

/// Lazily computed manifest and release mapping of one tree.
#[derive(Debug)]
pub(crate) struct TreeMetadata {
    release: u32,
    manifest: OnceLock<Option<Arc<Manifest>>>,
    mapping: OnceLock<Arc<ReleaseMapping>>,
}

impl TreeMetadata {
    pub(crate) fn new(release: u32) -> Self {
        Self {
            release,
            manifest: OnceLock::new(),
            mapping: OnceLock::new(),
        }
    }

    pub(crate) fn release(&self) -> u32 {
        self.release
    }

    pub(crate) fn manifest(&self, raw: &dyn RawTree) -> Option<Arc<Manifest>> {
        self.manifest.get_or_init(|| load_manifest(raw)).clone()
    }

    pub(crate) fn mapping(&self, raw: &dyn RawTree) -> Result<Arc<ReleaseMapping>, ContentError> {
        if let Some(mapping) = self.mapping.get() {
            return Ok(mapping.clone());
        }
        let multi_release = self.manifest(raw).is_some_and(|m| m.is_multi_release());
        let mapping = if multi_release {
            Arc::new(build_mapping(raw, self.release)?)
        } else {
            Arc::new(ReleaseMapping::new())
        };
        // a concurrent initializer computed the same value
        Ok(self.mapping.get_or_init(|| mapping).clone())
    }

    /// Walks with versioned entries standing in for their canonical paths.
    ///
    /// A single raw pass serves both: each versioned entry chosen by the
    /// mapping is visited once more under its canonical path.
    pub(crate) fn walk(&self, raw: &dyn RawTree, visitor: &mut Visitor<'_>) -> Result<(), ContentError> {
        let mapping = self.mapping(raw)?;
        if mapping.is_empty() {
            return raw.walk_raw(visitor);
        }
        let canonical_of: HashMap<&str, &str> =
            mapping.iter().map(|(canonical, versioned)| (versioned.as_str(), canonical.as_str())).collect();

        raw.walk_raw(&mut |visit| {
            if mapping.contains_key(visit.relative_path()) {
                return;
            }
            let canonical = canonical_of.get(visit.relative_path()).copied();
            visitor(visit);
            if visit.is_stopped() {
                return;
            }
            if let Some(canonical) = canonical {
                let mut overlay = visit.with_relative(canonical);
                visitor(&mut overlay);
                if overlay.is_stopped() {
                    visit.stop_walking();
                }
            }
        })
    }

    pub(crate) fn process_path(
        &self,
        raw: &dyn RawTree,
        relative: &str,
        consumer: &mut Consumer<'_>,
    ) -> Result<(), ContentError> {
        let mapping = self.mapping(raw)?;
        match mapping.get(relative) {
            Some(versioned) => raw.lookup_raw(versioned, &mut |found| match found {
                Some(found) => consumer(Some(&found.with_relative(relative))),
                None => consumer(None),
            }),
            None => raw.lookup_raw(relative, consumer),
        }
    }
}

fn load_manifest(raw: &dyn RawTree) -> Option<Arc<Manifest>> {
    let mut bytes = None;
    let lookup = raw.lookup_raw(MANIFEST_PATH, &mut |found| {
        if let Some(found) = found {
            bytes = Some(found.read_bytes());
        }
    });
    if let Err(e) = lookup {
        warn!("Failed to look up {}: {}", MANIFEST_PATH, e);
        return None;
    }
    match bytes? {
        Ok(bytes) => Some(Arc::new(Manifest::parse(&String::from_utf8_lossy(&bytes)))),
        Err(e) => {
            warn!("Failed to read {}: {}", MANIFEST_PATH, e);
            None
        }
    }
}

/// Maps each canonical path to its highest versioned variant not above `release`.
///
/// Versions are merged oldest to newest so newer variants override older ones.
/// Non-numeric version directories are skipped.
pub(crate) fn build_mapping(raw: &dyn RawTree, release: u32) -> Result<ReleaseMapping, ContentError> {
    let mut by_version: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    let mut unparsable = BTreeSet::new();
    let mut above_release = BTreeSet::new();

    raw.walk_raw(&mut |visit: &mut PathVisit<'_>| {
        if visit.is_directory() {
            return;
        }
        let Some(rest) = visit.relative_path().strip_prefix(MULTI_RELEASE_PREFIX) else {
            return;
        };
        let Some((version, path)) = rest.split_once('/') else {
            return;
        };
        if path.is_empty() {
            return;
        }
        match version.parse::<u32>() {
            Ok(v) if v <= release => by_version.entry(v).or_default().push(path.to_string()),
            Ok(v) => {
                above_release.insert(v);
            }
            Err(_) => {
                unparsable.insert(version.to_string());
            }
        }
    })?;

    for name in unparsable {
        debug!("Skipping multi-release directory {}{}: not a version number", MULTI_RELEASE_PREFIX, name);
    }
    for version in above_release {
        debug!("Ignoring multi-release version {} above running release {}", version, release);
    }

    let mut mapping = ReleaseMapping::new();
    for (version, paths) in by_version {
        for path in paths {
            let versioned = format!("{MULTI_RELEASE_PREFIX}{version}/{path}");
            mapping.insert(path, versioned);
        }
    }
    Ok(mapping)
}
