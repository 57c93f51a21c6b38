use super::{CliConfig, OutputFormat};
use crate::graph::ArtifactCatalog;
use crate::platform::{AlignmentVerdict, PlatformReleases, misalignment_report};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;

/// Report platform releases and check BOM alignment.
#[derive(Args, Debug)]
pub struct PlatformCommand {
    /// Artifact catalog exported by the resolution engine
    #[arg(value_name = "CATALOG")]
    catalog: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl PlatformCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let config = cli.load_resolver_config().await?;
        let catalog = ArtifactCatalog::from_file(&self.catalog)?;
        let releases = PlatformReleases::from_imports(&catalog.platform.imports, &catalog.platform.properties)
            .context("Invalid platform release properties in catalog")?;

        // a missing descriptor and, depending on policy, misalignment abort here
        let verdict = releases.verify(config.misaligned_platform_imports)?;

        match self.format {
            OutputFormat::Json => {
                let platforms: Vec<_> = releases.platforms().collect();
                let report = json!({
                    "platforms": platforms,
                    "imported_boms": releases.imported_boms(),
                    "verdict": verdict,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => {
                for platform in releases.platforms() {
                    println!("{} {}", "Platform".bold(), platform.key());
                    for stream in platform.streams() {
                        let versions: Vec<_> = stream.releases().iter().map(|r| r.version()).collect();
                        println!("  stream {}: {}", stream.id(), versions.join(", "));
                    }
                }
                for (key, boms) in releases.imported_boms() {
                    println!("Imported from {key}:");
                    for bom in boms {
                        println!("  {bom}");
                    }
                }
                match &verdict {
                    AlignmentVerdict::Aligned => println!("{} Platform imports are aligned", "✓".green()),
                    AlignmentVerdict::NotAligned { alignments } => {
                        println!("{} {}", "⚠".yellow(), misalignment_report(alignments));
                    }
                }
            }
        }
        Ok(())
    }
}
