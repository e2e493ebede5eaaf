use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use oxnfs_client::NfsShare;

use super::normalize_path;

#[derive(ClapArgs)]
pub struct Args {
    /// Path to remove
    pub path: String,

    /// Remove a directory and its contents recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Ignore nonexistent paths
    #[arg(short, long)]
    pub force: bool,
}

#[instrument(level = "info", name = "cmd::rm", skip_all, fields(path = %args.path, recursive = args.recursive))]
pub fn execute(share: &NfsShare, args: &Args) -> Result<()> {
    let mut path = normalize_path(&args.path);
    // The share removes a whole tree when the path ends in a slash.
    if args.recursive {
        path.push('/');
    }

    match share.rm(&path) {
        Err(e) if args.force && e.is_not_found() => Ok(()),
        result => Ok(result?),
    }
}
