use std::io;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use oxnfs_client::NfsShare;

use super::normalize_path;

#[derive(ClapArgs)]
pub struct Args {
    /// File path within the share (created or truncated)
    pub file: String,
}

#[instrument(level = "info", name = "cmd::write", skip_all, fields(file = %args.file))]
pub fn execute(share: &NfsShare, args: &Args) -> Result<()> {
    let path = normalize_path(&args.file);
    let written = share.save(&path, &mut io::stdin().lock())?;
    info!(bytes = written, "Wrote file");
    Ok(())
}
