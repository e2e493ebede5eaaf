use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use oxnfs_client::NfsShare;

use super::normalize_path;

#[derive(ClapArgs)]
pub struct Args {
    /// File path within the share
    pub file: String,
}

/// Create an empty file. Unlike `touch(1)`, existing content is truncated.
#[instrument(level = "info", name = "cmd::touch", skip_all, fields(file = %args.file))]
pub fn execute(share: &NfsShare, args: &Args) -> Result<()> {
    share.touch(&normalize_path(&args.file))?;
    Ok(())
}
