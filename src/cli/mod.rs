//! Command-line interface for appgraph.
//!
//! # Commands
//!
//! - `resolve` - Resolve application models from an artifact catalog
//! - `content` - Inspect the content tree of a directory or archive
//! - `platform` - Report platform releases and check BOM alignment
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - Debug logging
//! - `--quiet` / `-q` - Errors only
//! - `--config` / `-c` - Configuration file (see [`crate::config`])
//!
//! # Examples
//!
//! ```bash
//! appgraph resolve build/catalog.json --mode normal --mode dev
//! appgraph resolve build/catalog.json --format json
//! appgraph content list lib/app.jar --release 21 --include 'META-INF/**'
//! appgraph content cat lib/app.jar META-INF/MANIFEST.MF
//! appgraph platform build/catalog.json
//! ```

mod content;
mod platform;
mod resolve;

use crate::config::ResolverConfig;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Settings derived from the global options.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Explicit log filter, `None` to defer to `RUST_LOG`.
    pub log_level: Option<String>,
    /// Configuration file given with `--config`.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load_resolver_config(&self) -> Result<ResolverConfig> {
        ResolverConfig::load_with_optional(self.config_path.clone()).await
    }
}

/// Installs the global tracing subscriber, writing to stderr.
pub fn init_logging(config: &CliConfig) {
    let filter = match &config.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "appgraph",
    about = "Build-time application dependency graph resolver",
    version,
    long_about = "appgraph resolves the runtime and deployment classpaths of an application from the \
                  dependency graph exported by an artifact resolution engine."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve application models for one or more launch modes
    Resolve(resolve::ResolveCommand),

    /// Inspect artifact content
    #[command(subcommand)]
    Content(content::ContentCommand),

    /// Report platform releases and check BOM alignment
    Platform(platform::PlatformCommand),
}

/// Output format shared by the reporting commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };
        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Resolve(cmd) => cmd.execute(&config).await,
            Commands::Content(cmd) => cmd.execute(&config).await,
            Commands::Platform(cmd) => cmd.execute(&config).await,
        }
    }
}
