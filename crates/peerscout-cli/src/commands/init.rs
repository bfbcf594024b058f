//! `peerscout init` — Write a default configuration file.

use clap::Args;
use std::path::Path;

use crate::config::PeerscoutConfig;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitArgs, path: &Path) -> anyhow::Result<()> {
    if path.exists() && !args.force {
        anyhow::bail!("configuration file already exists at {}", path.display());
    }

    PeerscoutConfig::default().save(path)?;
    tracing::info!(path = %path.display(), "wrote default config");
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
