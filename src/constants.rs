//! Well-known names shared across the resolver.
//!
//! Descriptor paths, descriptor property keys, platform property conventions and
//! the attribute names used to select component variants all live here so the
//! walker, the partitioner and the platform checker agree on a single spelling.

/// Default location of the extension descriptor inside an artifact.
pub const EXTENSION_DESCRIPTOR_PATH: &str = "META-INF/appgraph-extension.properties";

/// Location of the archive manifest.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Directory holding version-specific overlays in multi-release archives.
pub const MULTI_RELEASE_PREFIX: &str = "META-INF/versions/";

/// Manifest attribute that enables the multi-release overlay.
pub const MULTI_RELEASE_ATTRIBUTE: &str = "Multi-Release";

/// Running platform feature version used when none is configured.
pub const DEFAULT_RELEASE_VERSION: u32 = 17;

/// Descriptor key naming the build-time companion of a runtime extension.
pub const DEPLOYMENT_ARTIFACT: &str = "deployment-artifact";
/// Descriptor key listing conditional dependencies.
pub const CONDITIONAL_DEPENDENCIES: &str = "conditional-dependencies";
/// Descriptor key listing conditional dependencies active only in development mode.
pub const CONDITIONAL_DEV_DEPENDENCIES: &str = "conditional-dev-dependencies";
/// Descriptor key listing the artifacts that must be present for this artifact to activate.
pub const DEPENDENCY_CONDITION: &str = "dependency-condition";
/// Descriptor key listing capabilities provided by the extension.
pub const PROVIDES_CAPABILITIES: &str = "provides-capabilities";
/// Descriptor key listing artifacts loaded parent-first.
pub const PARENT_FIRST_ARTIFACTS: &str = "parent-first-artifacts";
/// Descriptor key listing artifacts loaded parent-first by the packaged runner.
pub const RUNNER_PARENT_FIRST_ARTIFACTS: &str = "runner-parent-first-artifacts";
/// Descriptor key listing artifacts removed from the application.
pub const EXCLUDED_ARTIFACTS: &str = "excluded-artifacts";
/// Descriptor key listing artifacts consulted last when loading classes.
pub const LESSER_PRIORITY_ARTIFACTS: &str = "lesser-priority-artifacts";

/// Prefix of platform release property names.
pub const PLATFORM_RELEASE_PREFIX: &str = "platform.release-info@";
/// Separator between the platform key and the stream id.
pub const PLATFORM_KEY_STREAM_SEPARATOR: char = '$';
/// Separator between the stream id and the release version.
pub const STREAM_VERSION_SEPARATOR: char = '#';
/// ArtifactId suffix of platform descriptor artifacts.
pub const PLATFORM_DESCRIPTOR_SUFFIX: &str = "-platform-descriptor";
/// ArtifactId suffix of platform properties artifacts.
pub const PLATFORM_PROPERTIES_SUFFIX: &str = "-platform-properties";

/// Variant attribute carrying activated conditional dependencies.
pub const CONDITIONAL_ATTRIBUTE: &str = "appgraph.conditional";
/// Variant attribute carrying deployment companions.
pub const DEPLOYMENT_ATTRIBUTE: &str = "appgraph.deployment";
/// Name prefix of conditional dependency variants.
pub const CONDITIONAL_VARIANT_PREFIX: &str = "appgraph.conditional-variant.";
/// Name prefix of deployment variants.
pub const DEPLOYMENT_VARIANT_PREFIX: &str = "appgraph.variant.";

/// Default dependency scope.
pub const SCOPE_COMPILE: &str = "compile";
/// Scope of test-only dependencies.
pub const SCOPE_TEST: &str = "test";
/// Default artifact type.
pub const TYPE_JAR: &str = "jar";
/// Artifact type of BOM imports.
pub const TYPE_POM: &str = "pom";

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "APPGRAPH_CONFIG_PATH";
