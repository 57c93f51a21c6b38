//! Error handling for appgraph
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** that library code can match on
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`AppGraphError`] - enumerated failure cases of dependency resolution
//! - [`ErrorContext`] - wrapper adding details and a suggestion for display
//!
//! Content tree failures have their own type, [`ContentError`], because callers
//! need to tell a concurrently modified archive apart from a genuine I/O failure.
//! [`user_friendly_error`] recognizes both, plus [`std::io::Error`] and
//! [`toml::de::Error`], and falls back to printing the full `anyhow` chain.
//!
//! # Examples
//!
//! ```rust,no_run
//! use appgraph_cli::core::{AppGraphError, user_friendly_error};
//!
//! let error = AppGraphError::ModuleNotFound {
//!     module: "org.acme:missing:1.0".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use crate::paths::ContentError;
use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for resolution operations
///
/// Each variant carries owned strings only so the error can be cloned into an
/// [`ErrorContext`] without losing information.
///
/// # Error Categories
///
/// ## Input
/// - [`InvalidCoordinates`] - a coordinate or key string could not be parsed
/// - [`CatalogError`] - the artifact catalog is unreadable or inconsistent
/// - [`ModuleNotFound`] - a dependency edge points at an unknown module
/// - [`ArtifactNotFound`] - detached resolution produced no artifact
///
/// ## Descriptors
/// - [`InvalidDescriptor`] - an extension descriptor is malformed
///
/// ## Platform
/// - [`PlatformDescriptorMissing`] - properties imported without their descriptor
/// - [`PlatformMisaligned`] - imported BOMs belong to different releases
/// - [`InvalidPlatformRelease`] - a release property name is malformed
///
/// [`InvalidCoordinates`]: AppGraphError::InvalidCoordinates
/// [`CatalogError`]: AppGraphError::CatalogError
/// [`ModuleNotFound`]: AppGraphError::ModuleNotFound
/// [`ArtifactNotFound`]: AppGraphError::ArtifactNotFound
/// [`InvalidDescriptor`]: AppGraphError::InvalidDescriptor
/// [`PlatformDescriptorMissing`]: AppGraphError::PlatformDescriptorMissing
/// [`PlatformMisaligned`]: AppGraphError::PlatformMisaligned
/// [`InvalidPlatformRelease`]: AppGraphError::InvalidPlatformRelease
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppGraphError {
    /// A `group:artifact[:...]` string could not be parsed
    #[error("Invalid artifact coordinates '{value}': {reason}")]
    InvalidCoordinates {
        /// The offending input
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// The artifact catalog could not be used
    #[error("Invalid artifact catalog {path}: {reason}")]
    CatalogError {
        /// Catalog file path
        path: String,
        /// Description of the problem
        reason: String,
    },

    /// A module referenced by the graph is not present in the catalog
    #[error("Module not found in catalog: {module}")]
    ModuleNotFound {
        /// The missing module id
        module: String,
    },

    /// Detached resolution of a single coordinate produced nothing
    ///
    /// Raised for conditional dependencies and deployment companions that the
    /// upstream engine cannot materialize.
    #[error("{coords} did not resolve to any artifacts")]
    ArtifactNotFound {
        /// The coordinates that failed to resolve
        coords: String,
    },

    /// An extension descriptor exists but cannot be interpreted
    ///
    /// The walker never surfaces this error: it logs it and treats the artifact
    /// as an ordinary library.
    #[error("Invalid extension descriptor in {artifact}: {reason}")]
    InvalidDescriptor {
        /// The artifact carrying the descriptor
        artifact: String,
        /// Description of the problem
        reason: String,
    },

    /// Platform properties were imported without their descriptor
    #[error(
        "The platform properties applied to the project are missing the corresponding platform BOM imports: {}",
        imports.join(", ")
    )]
    PlatformDescriptorMissing {
        /// BOM coordinates whose descriptor import is missing
        imports: Vec<String>,
    },

    /// Imported platform BOMs belong to different releases
    #[error("{report}")]
    PlatformMisaligned {
        /// Human readable report listing the possible alignments
        report: String,
    },

    /// A platform release property name does not follow the naming convention
    #[error("Invalid platform release property '{property}': {reason}")]
    InvalidPlatformRelease {
        /// The property name
        property: String,
        /// Description of the problem
        reason: String,
    },

    /// Configuration file problems
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Anything else
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// Error with additional context for display
///
/// Wraps an [`AppGraphError`] with optional details and an actionable
/// suggestion. The CLI prints it through [`ErrorContext::display`].
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: AppGraphError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without details or suggestion
    #[must_use]
    pub const fn new(error: AppGraphError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`]
///
/// Recognizes [`AppGraphError`], [`ContentError`], [`std::io::Error`] and
/// [`toml::de::Error`] anywhere in the chain. Other errors keep their full
/// `anyhow` chain in the message.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(graph_error) = cause.downcast_ref::<AppGraphError>() {
            return create_error_context(graph_error.clone());
        }
    }

    if let Some(content_error) = error.downcast_ref::<ContentError>() {
        let ctx = ErrorContext::new(AppGraphError::Other {
            message: content_error.to_string(),
        });
        return if content_error.is_retryable() {
            ctx.with_details("The archive was modified or removed while it was being read")
                .with_suggestion("Wait for the build that rewrites the archive to finish and retry")
        } else {
            ctx.with_suggestion("Check that the path exists and is a readable directory or archive")
        };
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(AppGraphError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check file ownership and permissions");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(AppGraphError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(AppGraphError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of the configuration file");
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(AppGraphError::Other {
        message,
    })
}

fn create_error_context(error: AppGraphError) -> ErrorContext {
    match &error {
        AppGraphError::InvalidCoordinates { .. } => ErrorContext::new(error)
            .with_suggestion("Use the form group:artifact:version[:classifier:type]"),
        AppGraphError::CatalogError { .. } => ErrorContext::new(error)
            .with_details("The catalog is the JSON graph exported by the artifact resolution engine")
            .with_suggestion("Regenerate the catalog and check that it is valid JSON"),
        AppGraphError::ModuleNotFound { .. } | AppGraphError::ArtifactNotFound { .. } => {
            ErrorContext::new(error)
                .with_suggestion("Make sure the catalog lists every module reachable from the root")
        }
        AppGraphError::InvalidDescriptor { .. } => ErrorContext::new(error)
            .with_suggestion("Fix the extension descriptor or rebuild the extension"),
        AppGraphError::PlatformDescriptorMissing { .. } => ErrorContext::new(error)
            .with_details("Every imported platform properties artifact needs the matching platform descriptor")
            .with_suggestion("Import the platform BOM itself instead of only its properties"),
        AppGraphError::PlatformMisaligned { .. } => ErrorContext::new(error).with_suggestion(
            "Align the BOM imports or set misaligned_platform_imports = \"warn\" in the configuration",
        ),
        AppGraphError::InvalidPlatformRelease { .. } => ErrorContext::new(error).with_details(
            "Platform release properties are named platform.release-info@<platform>$<stream>#<version>",
        ),
        AppGraphError::ConfigError { .. } => ErrorContext::new(error)
            .with_suggestion("Check the configuration file passed with --config or APPGRAPH_CONFIG_PATH"),
        AppGraphError::Other { .. } => ErrorContext::new(error),
    }
}
