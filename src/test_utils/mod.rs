//! Test utilities for appgraph
//!
//! Helpers shared by unit and integration tests:
//! - [`init_test_logging`] - one-time tracing setup honoring `RUST_LOG`
//! - [`JarFixture`] - builds zip/jar archives with descriptors, manifests and
//!   multi-release entries
//! - [`CatalogBuilder`] - lays out a temporary artifact repository and the
//!   catalog describing it
//!
//! # Example
//!
//! ```rust,no_run
//! use appgraph_cli::test_utils::CatalogBuilder;
//!
//! # fn example() -> anyhow::Result<()> {
//! let workspace = CatalogBuilder::new("org.acme:app:1.0", &["org.acme:ext-a:1.0"])?
//!     .extension("org.acme:ext-a:1.0", &[], "deployment-artifact=org.acme:ext-a-deployment:1.0")?
//!     .library("org.acme:ext-a-deployment:1.0", &[])?;
//! let host = workspace.host()?;
//! # Ok(())
//! # }
//! ```

mod catalog;
mod fixtures;

pub use catalog::CatalogBuilder;
pub use fixtures::JarFixture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, logging
/// stays off. Safe to call from every test.
///
/// ```bash
/// RUST_LOG=appgraph_cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
