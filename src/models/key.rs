//! Artifact identity.
//!
//! [`ArtifactKey`] is the deduplication identity used as a map key everywhere:
//! two artifacts with the same key are the same artifact regardless of version.
//! [`ArtifactCoords`] adds the version and is what users write on the command
//! line and in descriptors. [`ModuleId`] names a node of the dependency graph,
//! which may materialize several artifacts.

use crate::constants::TYPE_JAR;
use crate::core::AppGraphError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// `(groupId, artifactId, classifier, type)` identity of an artifact.
///
/// The string form is `group:artifact` when the classifier is empty and the
/// type is `jar`, `group:artifact:classifier:type` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey {
    group_id: String,
    artifact_id: String,
    classifier: String,
    artifact_type: String,
}

impl ArtifactKey {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        classifier: impl Into<String>,
        artifact_type: impl Into<String>,
    ) -> Self {
        let artifact_type = artifact_type.into();
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            classifier: classifier.into(),
            artifact_type: if artifact_type.is_empty() {
                TYPE_JAR.to_string()
            } else {
                artifact_type
            },
        }
    }

    /// Key with an empty classifier and the `jar` type.
    pub fn ga(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self::new(group_id, artifact_id, "", TYPE_JAR)
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn classifier(&self) -> &str {
        &self.classifier
    }

    pub fn artifact_type(&self) -> &str {
        &self.artifact_type
    }

    /// Whether `group:artifact` of both keys match.
    pub fn same_ga(&self, other: &ArtifactKey) -> bool {
        self.group_id == other.group_id && self.artifact_id == other.artifact_id
    }

    fn has_default_suffix(&self) -> bool {
        self.classifier.is_empty() && self.artifact_type == TYPE_JAR
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if !self.has_default_suffix() {
            write!(f, ":{}:{}", self.classifier, self.artifact_type)?;
        }
        Ok(())
    }
}

impl FromStr for ArtifactKey {
    type Err = AppGraphError;

    /// Parses `g:a`, `g:a:classifier` or `g:a:classifier:type`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_parts(s)?;
        match parts.as_slice() {
            [g, a] => Ok(Self::ga(*g, *a)),
            [g, a, c] => Ok(Self::new(*g, *a, *c, TYPE_JAR)),
            [g, a, c, t] => Ok(Self::new(*g, *a, *c, *t)),
            _ => Err(invalid(s, "expected group:artifact[:classifier[:type]]")),
        }
    }
}

/// An [`ArtifactKey`] plus a version.
///
/// Parsed from `group:artifact:version`, `group:artifact:version:type` or
/// `group:artifact:version:classifier:type`. [`Display`](fmt::Display) emits the
/// shortest of these forms that preserves the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactCoords {
    key: ArtifactKey,
    version: String,
}

impl ArtifactCoords {
    pub fn new(key: ArtifactKey, version: impl Into<String>) -> Self {
        Self {
            key,
            version: version.into(),
        }
    }

    /// Plain `jar` coordinates without a classifier.
    pub fn jar(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self::new(ArtifactKey::ga(group_id, artifact_id), version)
    }

    pub fn key(&self) -> &ArtifactKey {
        &self.key
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn group_id(&self) -> &str {
        self.key.group_id()
    }

    pub fn artifact_id(&self) -> &str {
        self.key.artifact_id()
    }

    pub fn classifier(&self) -> &str {
        self.key.classifier()
    }

    pub fn artifact_type(&self) -> &str {
        self.key.artifact_type()
    }

    /// The graph node this artifact belongs to.
    pub fn module_id(&self) -> ModuleId {
        ModuleId::new(self.group_id(), self.artifact_id(), &self.version)
    }
}

impl fmt::Display for ArtifactCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id(), self.artifact_id(), self.version)?;
        if !self.classifier().is_empty() {
            write!(f, ":{}:{}", self.classifier(), self.artifact_type())
        } else if self.artifact_type() != TYPE_JAR {
            write!(f, ":{}", self.artifact_type())
        } else {
            Ok(())
        }
    }
}

impl FromStr for ArtifactCoords {
    type Err = AppGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_parts(s)?;
        match parts.as_slice() {
            [g, a, v] => Ok(Self::new(ArtifactKey::ga(*g, *a), *v)),
            [g, a, v, t] => Ok(Self::new(ArtifactKey::new(*g, *a, "", *t), *v)),
            [g, a, v, c, t] => Ok(Self::new(ArtifactKey::new(*g, *a, *c, *t), *v)),
            _ => Err(invalid(s, "expected group:artifact:version[:classifier:type]")),
        }
    }
}

/// `group:artifact:version` of a graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId {
    group_id: String,
    artifact_id: String,
    version: String,
}

impl ModuleId {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The `group:artifact` key of the module's main artifact.
    pub fn ga_key(&self) -> ArtifactKey {
        ArtifactKey::ga(&self.group_id, &self.artifact_id)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

impl FromStr for ModuleId {
    type Err = AppGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_parts(s)?;
        match parts.as_slice() {
            [g, a, v] => Ok(Self::new(*g, *a, *v)),
            _ => Err(invalid(s, "expected group:artifact:version")),
        }
    }
}

fn split_parts(s: &str) -> Result<Vec<&str>, AppGraphError> {
    let parts: Vec<&str> = s.trim().split(':').map(str::trim).collect();
    if parts.len() < 2 {
        return Err(invalid(s, "too few segments"));
    }
    // group, artifact and version must never be blank; classifier may be
    if parts[0].is_empty() || parts[1].is_empty() {
        return Err(invalid(s, "empty group or artifact"));
    }
    Ok(parts)
}

fn invalid(value: &str, reason: &str) -> AppGraphError {
    AppGraphError::InvalidCoordinates {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(ArtifactKey);
string_serde!(ArtifactCoords);
string_serde!(ModuleId);
