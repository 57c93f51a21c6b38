use crate::models::{ArtifactCoords, ArtifactKey};
use serde::Serialize;

/// Releases of one platform, grouped by stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformInfo {
    key: String,
    streams: Vec<PlatformStreamInfo>,
}

impl PlatformInfo {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            streams: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn streams(&self) -> &[PlatformStreamInfo] {
        &self.streams
    }

    pub fn stream(&self, id: &str) -> Option<&PlatformStreamInfo> {
        self.streams.iter().find(|s| s.id == id)
    }

    pub(crate) fn stream_mut(&mut self, id: &str) -> &mut PlatformStreamInfo {
        let index = match self.streams.iter().position(|s| s.id == id) {
            Some(index) => index,
            None => {
                self.streams.push(PlatformStreamInfo::new(id));
                self.streams.len() - 1
            }
        };
        &mut self.streams[index]
    }

    fn releases(&self) -> impl Iterator<Item = &PlatformReleaseInfo> {
        self.streams.iter().flat_map(|s| s.releases.iter())
    }

    /// A single import is always aligned; several must share one release.
    pub fn is_aligned(&self, boms: &[ArtifactCoords]) -> bool {
        boms.len() <= 1 || self.releases().any(|r| boms.iter().all(|bom| r.contains(bom)))
    }

    /// One combination per release covering every imported BOM.
    pub fn possible_alignments(&self, boms: &[ArtifactCoords]) -> Vec<Vec<ArtifactCoords>> {
        self.releases().filter_map(|r| r.align(boms)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformStreamInfo {
    id: String,
    releases: Vec<PlatformReleaseInfo>,
}

impl PlatformStreamInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            releases: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn releases(&self) -> &[PlatformReleaseInfo] {
        &self.releases
    }

    pub fn release(&self, version: &str) -> Option<&PlatformReleaseInfo> {
        self.releases.iter().find(|r| r.version == version)
    }

    /// Adds `release` unless its version is already known.
    pub(crate) fn add_if_absent(&mut self, release: PlatformReleaseInfo) -> bool {
        if self.release(&release.version).is_some() {
            return false;
        }
        self.releases.push(release);
        true
    }
}

/// One release of a platform stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformReleaseInfo {
    platform_key: String,
    stream: String,
    version: String,
    value: String,
    /// BOM coordinates listed in the value, empty when the value is opaque.
    boms: Vec<ArtifactCoords>,
}

impl PlatformReleaseInfo {
    pub fn new(platform_key: &str, stream: &str, version: &str, value: &str) -> Self {
        let boms = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse::<ArtifactCoords>().ok())
            .collect();
        Self {
            platform_key: platform_key.to_string(),
            stream: stream.to_string(),
            version: version.to_string(),
            value: value.to_string(),
            boms,
        }
    }

    pub fn platform_key(&self) -> &str {
        &self.platform_key
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn boms(&self) -> &[ArtifactCoords] {
        &self.boms
    }

    fn find(&self, bom: &ArtifactCoords) -> Option<&ArtifactCoords> {
        let key = ArtifactKey::ga(bom.group_id(), bom.artifact_id());
        self.boms.iter().find(|b| b.key().same_ga(&key))
    }

    /// Whether the imported `bom` is part of this release.
    pub fn contains(&self, bom: &ArtifactCoords) -> bool {
        if self.boms.is_empty() {
            return bom.version() == self.version;
        }
        self.find(bom).is_some_and(|b| b.version() == bom.version())
    }

    /// The imported BOMs at this release's versions, if it covers all of them.
    fn align(&self, boms: &[ArtifactCoords]) -> Option<Vec<ArtifactCoords>> {
        boms.iter()
            .map(|bom| {
                let version = if self.boms.is_empty() {
                    self.version.as_str()
                } else {
                    self.find(bom)?.version()
                };
                Some(ArtifactCoords::new(bom.key().clone(), version))
            })
            .collect()
    }
}
