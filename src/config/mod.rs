//! Resolver configuration.
//!
//! Settings live in a single TOML file. The location is, in order of
//! precedence:
//!
//! 1. the `--config <path>` command line option
//! 2. the `APPGRAPH_CONFIG_PATH` environment variable
//! 3. `~/.appgraph/config.toml` (`%LOCALAPPDATA%\appgraph\config.toml` on Windows)
//!
//! A missing file yields [`ResolverConfig::default`].
//!
//! ```toml
//! # error | warn | ignore
//! misaligned_platform_imports = "warn"
//! # running platform feature version for the multi-release overlay
//! release_version = 21
//! launch_modes = ["normal", "dev"]
//! descriptor_path = "META-INF/appgraph-extension.properties"
//! ```

mod launch_mode;
mod settings;

pub use launch_mode::LaunchMode;
pub use settings::ResolverConfig;
