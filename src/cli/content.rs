use super::CliConfig;
use crate::paths::{self, FilteredTree, PathFilter, PathTree};
use anyhow::{Context, Result, bail};
use clap::Subcommand;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Inspect a directory or archive through its content tree.
#[derive(Subcommand, Debug)]
pub enum ContentCommand {
    /// List entries, applying the multi-release overlay
    List {
        /// Directory or archive
        path: PathBuf,

        /// Running platform feature version; defaults to the configured one
        #[arg(long)]
        release: Option<u32>,

        /// Glob of entries to show (repeatable)
        #[arg(long)]
        include: Vec<String>,

        /// Glob of entries to hide (repeatable)
        #[arg(long)]
        exclude: Vec<String>,
    },

    /// Print the bytes of one entry
    Cat {
        /// Directory or archive
        path: PathBuf,

        /// Entry relative path
        entry: String,

        /// Running platform feature version; defaults to the configured one
        #[arg(long)]
        release: Option<u32>,
    },
}

impl ContentCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let config = cli.load_resolver_config().await?;
        match self {
            Self::List {
                path,
                release,
                include,
                exclude,
            } => {
                let tree = open_tree(&path, release.unwrap_or(config.release_version))?;
                let filter = PathFilter::new(&include, &exclude)?;
                let tree: Arc<dyn PathTree> =
                    if filter.is_empty() { tree } else { Arc::new(FilteredTree::new(tree, filter)) };
                let mut entries = Vec::new();
                tree.walk(&mut |visit| {
                    if !visit.is_directory() {
                        entries.push(visit.relative_path().to_string());
                    }
                })
                .with_context(|| format!("Failed to walk {}", path.display()))?;
                entries.sort();
                for entry in entries {
                    println!("{entry}");
                }
            }
            Self::Cat { path, entry, release } => {
                let tree = open_tree(&path, release.unwrap_or(config.release_version))?;
                let Some(bytes) = tree
                    .read_entry(&entry)
                    .with_context(|| format!("Failed to read {entry} from {}", path.display()))?
                else {
                    bail!("No entry {entry} in {}", path.display());
                };
                std::io::stdout().write_all(&bytes)?;
            }
        }
        Ok(())
    }
}

fn open_tree(path: &Path, release: u32) -> Result<Arc<dyn PathTree>> {
    if !path.exists() {
        bail!("{} does not exist", path.display());
    }
    Ok(paths::of_directory_or_archive(path, release))
}
