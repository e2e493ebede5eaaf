//! Meta command - show the capability overrides a host would apply to an
//! entry. Entries neither owned by nor grouped with the configured identity
//! are hidden.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use oxnfs_client::{Metadata, NfsShare};

use super::normalize_path;
use crate::output::create_table;

#[derive(ClapArgs)]
pub struct Args {
    /// Path within the share
    pub path: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[instrument(level = "info", name = "cmd::meta", skip_all, fields(path = %args.path))]
pub fn execute(share: &NfsShare, args: &Args) -> Result<()> {
    let meta = share.meta(&normalize_path(&args.path));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
        return Ok(());
    }

    if meta == Metadata::default() {
        println!("No overrides");
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["Capability", "Allowed"]);
    let rows = [
        ("see", meta.can_see),
        ("create file", meta.can_create_file),
        ("create directory", meta.can_create_directory),
        ("rename", meta.can_rename),
        ("move", meta.can_move),
        ("upload", meta.can_upload),
        ("delete", meta.can_delete),
        ("share", meta.can_share),
    ];
    for (name, value) in rows {
        if let Some(allowed) = value {
            let allowed = if allowed { "yes" } else { "no" };
            table.add_row(vec![name, allowed]);
        }
    }
    println!("{table}");
    Ok(())
}
