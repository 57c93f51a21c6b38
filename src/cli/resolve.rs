use super::{CliConfig, OutputFormat};
use crate::config::LaunchMode;
use crate::graph::{CatalogGraphHost, GraphHost};
use crate::models::{ApplicationModel, ResolvedDependency};
use crate::platform::{AlignmentVerdict, PlatformReleases};
use crate::resolver::ApplicationModelResolver;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

/// Resolve application models from an artifact catalog.
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Artifact catalog exported by the resolution engine
    #[arg(value_name = "CATALOG")]
    catalog: PathBuf,

    /// Launch modes to resolve; defaults to the configured modes
    #[arg(long = "mode", value_enum)]
    modes: Vec<LaunchMode>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl ResolveCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let config = cli.load_resolver_config().await?;
        let host = CatalogGraphHost::from_file(&self.catalog)?;
        let catalog = host.catalog();
        let root = catalog.root.clone();
        let platform = PlatformReleases::from_imports(&catalog.platform.imports, &catalog.platform.properties)
            .context("Invalid platform release properties in catalog")?;

        let host: Arc<dyn GraphHost> = Arc::new(host);
        let resolver = ApplicationModelResolver::from_config(host, &config).with_platform(platform);
        let modes = if self.modes.is_empty() { config.launch_modes.clone() } else { self.modes };

        let models = resolver
            .resolve_modes(&root, &modes)
            .await
            .with_context(|| format!("Failed to resolve {root}"))?;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&models)?),
            OutputFormat::Text => {
                for model in &models {
                    print!("{}", render_text(model));
                }
            }
        }
        Ok(())
    }
}

fn render_dependency(out: &mut String, dep: &ResolvedDependency) {
    let flags = dep.flags().names().join(", ");
    let _ = write!(out, "  {}", dep.coords());
    let _ = writeln!(out, " {}", format!("[{flags}]").dimmed());
}

fn render_text(model: &ApplicationModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {} [{}]", "Application".bold(), model.app(), model.mode());

    let runtime: Vec<_> = model.runtime_dependencies().collect();
    let _ = writeln!(out, "{} ({}):", "Runtime classpath".green(), runtime.len());
    for dep in runtime {
        render_dependency(&mut out, dep);
    }

    let deployment: Vec<_> = model.deployment_dependencies().collect();
    let _ = writeln!(out, "{} ({}):", "Deployment classpath".cyan(), deployment.len());
    for dep in deployment {
        render_dependency(&mut out, dep);
    }

    if !model.inactive_conditional_dependencies().is_empty() {
        let _ = writeln!(out, "Inactive conditional dependencies:");
        for coords in model.inactive_conditional_dependencies() {
            let _ = writeln!(out, "  {coords}");
        }
    }
    if !model.extension_capabilities().is_empty() {
        let _ = writeln!(out, "Capabilities:");
        for caps in model.extension_capabilities() {
            let _ = writeln!(out, "  {}: {}", caps.extension, caps.provides.join(", "));
        }
    }
    match model.platform() {
        AlignmentVerdict::Aligned => {
            let _ = writeln!(out, "Platform: {}", "aligned".green());
        }
        AlignmentVerdict::NotAligned { alignments } => {
            let _ = writeln!(out, "Platform: {} ({} platform(s))", "not aligned".yellow(), alignments.len());
        }
    }
    out
}
