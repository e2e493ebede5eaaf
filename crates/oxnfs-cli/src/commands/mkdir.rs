use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::{debug, instrument};

use oxnfs_client::{Nfs3Status, NfsError, NfsShare};

use super::normalize_path;

#[derive(ClapArgs)]
pub struct Args {
    /// Directory path to create
    pub path: String,

    /// Create parent directories as needed, and accept an existing directory
    #[arg(short, long)]
    pub parents: bool,
}

#[instrument(level = "info", name = "cmd::mkdir", skip_all, fields(path = %args.path))]
pub fn execute(share: &NfsShare, args: &Args) -> Result<()> {
    let path = normalize_path(&args.path);
    if !args.parents {
        share.mkdir(&path)?;
        return Ok(());
    }

    let mut current = String::new();
    for component in path.split('/').filter(|c| !c.is_empty()) {
        current.push('/');
        current.push_str(component);
        match share.mkdir(&current) {
            Ok(()) => {}
            Err(NfsError::Status(Nfs3Status::Exist)) => debug!(path = %current, "Already exists"),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
