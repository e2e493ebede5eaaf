use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use oxnfs_client::NfsShare;

use super::normalize_path;

#[derive(ClapArgs)]
pub struct Args {
    /// Source path
    pub source: String,

    /// Destination path (replaced if it exists)
    pub dest: String,
}

#[instrument(level = "info", name = "cmd::mv", skip_all, fields(source = %args.source, dest = %args.dest))]
pub fn execute(share: &NfsShare, args: &Args) -> Result<()> {
    share.mv(&normalize_path(&args.source), &normalize_path(&args.dest))?;
    Ok(())
}
