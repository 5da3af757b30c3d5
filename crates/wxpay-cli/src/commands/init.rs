//! `wxpay init`: Write a default configuration file.

use clap::Args;
use std::path::Path;
use wxpay_core::PayConfig;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitArgs, path: &Path) -> anyhow::Result<()> {
    if path.exists() && !args.force {
        anyhow::bail!("configuration file already exists at {}", path.display());
    }

    PayConfig::default().save(path)?;
    tracing::info!(path = %path.display(), "wrote default config");
    println!("Wrote {}", path.display());
    println!("Fill in [merchant] app_id, mch_id and api_key before making calls.");
    Ok(())
}
