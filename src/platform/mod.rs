//! Platform BOM alignment.
//!
//! A platform publishes coordinated releases of its BOMs. Each release is
//! advertised by a property named
//! `platform.release-info@<platform-key>$<stream>#<version>` whose value lists
//! the BOM coordinates belonging to that release, comma separated. A project
//! importing several BOMs of one platform is aligned when a single release
//! contains all of them.
//!
//! Every imported platform properties artifact must be accompanied by the
//! matching platform descriptor artifact. A missing descriptor is always fatal;
//! misalignment is governed by [`MisalignmentPolicy`].

mod info;

pub use info::{PlatformInfo, PlatformReleaseInfo, PlatformStreamInfo};

use crate::constants::{
    PLATFORM_DESCRIPTOR_SUFFIX, PLATFORM_KEY_STREAM_SEPARATOR, PLATFORM_PROPERTIES_SUFFIX,
    PLATFORM_RELEASE_PREFIX, STREAM_VERSION_SEPARATOR, TYPE_POM,
};
use crate::core::AppGraphError;
use crate::models::{ArtifactCoords, ArtifactKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::{debug, warn};

/// What to do when imported platform BOMs are not aligned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MisalignmentPolicy {
    #[default]
    Error,
    Warn,
    Ignore,
}

/// Outcome of the alignment check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlignmentVerdict {
    #[default]
    Aligned,
    NotAligned {
        /// Suggested BOM combinations per platform key.
        alignments: BTreeMap<String, Vec<Vec<ArtifactCoords>>>,
    },
}

impl AlignmentVerdict {
    pub fn is_aligned(&self) -> bool {
        matches!(self, Self::Aligned)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PlatformImport {
    descriptor_found: bool,
}

/// Platform releases known to a resolution and the BOMs it imported.
#[derive(Debug, Clone, Default)]
pub struct PlatformReleases {
    platforms: BTreeMap<String, PlatformInfo>,
    /// Imported BOMs by platform key (the BOM group id).
    imported_boms: BTreeMap<String, Vec<ArtifactCoords>>,
    imports: BTreeMap<ArtifactCoords, PlatformImport>,
}

impl PlatformReleases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry from imported artifacts and release properties.
    ///
    /// Properties not following the release naming convention are ignored;
    /// imports that are neither descriptors nor properties are ignored too.
    pub fn from_imports<'a>(
        imports: impl IntoIterator<Item = &'a ArtifactCoords>,
        properties: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Result<Self, AppGraphError> {
        let mut releases = Self::new();
        for (name, value) in properties {
            if Self::is_platform_release_info(name) {
                releases.add_platform_release(name, value)?;
            }
        }
        for coords in imports {
            if !releases.add_import(coords) {
                debug!("Ignoring non-platform import {}", coords);
            }
        }
        Ok(releases)
    }

    pub fn is_platform_release_info(name: &str) -> bool {
        name.starts_with(PLATFORM_RELEASE_PREFIX)
    }

    /// Records a release from a `platform.release-info@key$stream#version`
    /// property. The first value recorded for a version wins.
    pub fn add_platform_release(&mut self, name: &str, value: &str) -> Result<(), AppGraphError> {
        let rest = name.strip_prefix(PLATFORM_RELEASE_PREFIX).ok_or_else(|| {
            AppGraphError::InvalidPlatformRelease {
                property: name.to_string(),
                reason: format!("expected prefix '{PLATFORM_RELEASE_PREFIX}'"),
            }
        })?;
        let (platform_key, rest) = split_required(name, rest, PLATFORM_KEY_STREAM_SEPARATOR)?;
        let (stream, version) = split_required(name, rest, STREAM_VERSION_SEPARATOR)?;

        let added = self
            .platforms
            .entry(platform_key.to_string())
            .or_insert_with(|| PlatformInfo::new(platform_key))
            .stream_mut(stream)
            .add_if_absent(PlatformReleaseInfo::new(platform_key, stream, version, value));
        if !added {
            debug!("Platform release {}${}#{} already recorded", platform_key, stream, version);
        }
        Ok(())
    }

    /// Dispatches an imported artifact by its artifactId suffix. Returns
    /// `false` for artifacts that are not platform imports.
    pub fn add_import(&mut self, coords: &ArtifactCoords) -> bool {
        if coords.artifact_id().ends_with(PLATFORM_DESCRIPTOR_SUFFIX) {
            self.add_platform_descriptor(coords);
            true
        } else if coords.artifact_id().ends_with(PLATFORM_PROPERTIES_SUFFIX) {
            self.add_platform_properties(coords);
            true
        } else {
            false
        }
    }

    pub fn add_platform_descriptor(&mut self, coords: &ArtifactCoords) {
        let bom = bom_coords(coords, PLATFORM_DESCRIPTOR_SUFFIX);
        self.imports.entry(bom).or_default().descriptor_found = true;
    }

    pub fn add_platform_properties(&mut self, coords: &ArtifactCoords) {
        let bom = bom_coords(coords, PLATFORM_PROPERTIES_SUFFIX);
        self.imports.entry(bom.clone()).or_default();
        let boms = self.imported_boms.entry(coords.group_id().to_string()).or_default();
        if !boms.contains(&bom) {
            boms.push(bom);
        }
    }

    pub fn platforms(&self) -> impl Iterator<Item = &PlatformInfo> {
        self.platforms.values()
    }

    pub fn platform(&self, key: &str) -> Option<&PlatformInfo> {
        self.platforms.get(key)
    }

    pub fn imported_boms(&self) -> &BTreeMap<String, Vec<ArtifactCoords>> {
        &self.imported_boms
    }

    pub fn is_aligned(&self) -> bool {
        self.imported_boms.iter().all(|(key, boms)| {
            self.platforms.get(key).is_none_or(|platform| platform.is_aligned(boms))
        })
    }

    /// Remediation options for every misaligned platform key.
    pub fn possible_alignments(&self) -> BTreeMap<String, Vec<Vec<ArtifactCoords>>> {
        self.imported_boms
            .iter()
            .filter_map(|(key, boms)| {
                let platform = self.platforms.get(key)?;
                (!platform.is_aligned(boms))
                    .then(|| (platform.key().to_string(), platform.possible_alignments(boms)))
            })
            .collect()
    }

    /// Fails when a platform properties import lacks its descriptor import.
    pub fn check_descriptors(&self) -> Result<(), AppGraphError> {
        let missing: Vec<String> = self
            .imports
            .iter()
            .filter(|(_, import)| !import.descriptor_found)
            .map(|(coords, _)| coords.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppGraphError::PlatformDescriptorMissing { imports: missing })
        }
    }

    /// Fails on missing descriptors or misaligned imports.
    pub fn assert_aligned(&self) -> Result<(), AppGraphError> {
        self.check_descriptors()?;
        if self.is_aligned() {
            return Ok(());
        }
        Err(AppGraphError::PlatformMisaligned {
            report: misalignment_report(&self.possible_alignments()),
        })
    }

    /// Runs both checks, applying `policy` to misalignment only.
    pub fn verify(&self, policy: MisalignmentPolicy) -> Result<AlignmentVerdict, AppGraphError> {
        self.check_descriptors()?;
        if self.is_aligned() {
            return Ok(AlignmentVerdict::Aligned);
        }
        let alignments = self.possible_alignments();
        match policy {
            MisalignmentPolicy::Error => Err(AppGraphError::PlatformMisaligned {
                report: misalignment_report(&alignments),
            }),
            MisalignmentPolicy::Warn => {
                warn!("{}", misalignment_report(&alignments));
                Ok(AlignmentVerdict::NotAligned { alignments })
            }
            MisalignmentPolicy::Ignore => {
                debug!("Ignoring misaligned platform imports for {} platform(s)", alignments.len());
                Ok(AlignmentVerdict::NotAligned { alignments })
            }
        }
    }
}

fn split_required<'a>(
    property: &str,
    s: &'a str,
    separator: char,
) -> Result<(&'a str, &'a str), AppGraphError> {
    s.split_once(separator).ok_or_else(|| AppGraphError::InvalidPlatformRelease {
        property: property.to_string(),
        reason: format!("Failed to locate '{separator}' in '{property}'"),
    })
}

fn bom_coords(coords: &ArtifactCoords, suffix: &str) -> ArtifactCoords {
    let artifact_id = coords.artifact_id().strip_suffix(suffix).unwrap_or(coords.artifact_id());
    ArtifactCoords::new(
        ArtifactKey::new(coords.group_id(), artifact_id, "", TYPE_POM),
        coords.version(),
    )
}

/// Renders the remediation report shown to users.
pub fn misalignment_report(alignments: &BTreeMap<String, Vec<Vec<ArtifactCoords>>>) -> String {
    let mut report = String::from(
        "Some of the imported platform BOMs belong to different platform releases. \
         To properly align the platform BOM imports, please, consider one of the following combinations:\n",
    );
    for (platform, combinations) in alignments {
        let _ = writeln!(report, "For platform {platform}:");
        for (i, boms) in combinations.iter().enumerate() {
            let _ = writeln!(report, "  {}) ", i + 1);
            for bom in boms {
                let _ = writeln!(report, " - {bom}");
            }
        }
    }
    report
}
