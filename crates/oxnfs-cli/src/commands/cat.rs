//! Cat command - stream a remote file to stdout.
//!
//! Ctrl-C tears down the read session; the command then exits with the
//! "cancelled" status.

use std::io;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use oxnfs_client::{CancelToken, NfsError, NfsShare};

use super::normalize_path;

#[derive(ClapArgs)]
pub struct Args {
    /// File path within the share
    pub file: String,
}

#[instrument(level = "info", name = "cmd::cat", skip_all, fields(file = %args.file))]
pub fn execute(share: &NfsShare, args: &Args) -> Result<()> {
    let path = normalize_path(&args.file);

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("Failed to install Ctrl-C handler")?;

    let mut reader = share.cat(&path, Some(&cancel))?;
    let copied = io::copy(&mut reader, &mut io::stdout().lock());
    reader.close();

    match copied {
        Ok(_) => Ok(()),
        Err(_) if cancel.is_cancelled() => {
            Err(anyhow::Error::new(NfsError::SessionClosed).context("Read cancelled"))
        }
        Err(e) => {
            Err(anyhow::Error::new(NfsError::from_io(e)).context(format!("Failed to read {path}")))
        }
    }
}
