//! List command - list directory contents of a share.
//!
//! # Examples
//!
//! ```bash
//! # List the export root
//! oxnfs ls nas.local:/srv/share
//!
//! # List with details
//! oxnfs ls -l @home /documents
//!
//! # Output as JSON for scripting
//! oxnfs ls --json @home / | jq '.entries[].name'
//! ```

use anyhow::Result;
use clap::Args as ClapArgs;
use serde::Serialize;
use tracing::instrument;

use oxnfs_client::{Entry, NfsShare};

use super::normalize_path;
use crate::output::{create_table, format_entry_type, format_size, format_time};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Path within the share (default: root)
    #[arg(default_value = "/")]
    pub path: String,

    /// Show detailed information
    #[arg(short, long)]
    pub long: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// One entry per line (script-friendly)
    #[arg(short = '1')]
    pub one_per_line: bool,
}

/// JSON output format for ls command
#[derive(Serialize)]
struct LsOutput<'a> {
    path: &'a str,
    entries: &'a [Entry],
}

#[instrument(level = "info", name = "cmd::ls", skip_all, fields(path = %args.path))]
pub fn execute(share: &NfsShare, args: &Args) -> Result<()> {
    let path = normalize_path(&args.path);
    let entries = share.ls(&path)?;

    if args.json {
        let output = LsOutput {
            path: &path,
            entries: &entries,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if args.long {
        print_long_format(&entries);
    } else {
        print_short_format(&entries, args.one_per_line);
    }

    Ok(())
}

fn display_name(entry: &Entry) -> String {
    if entry.is_dir() {
        format!("{}/", entry.name)
    } else {
        entry.name.clone()
    }
}

fn print_long_format(entries: &[Entry]) {
    let mut table = create_table();
    table.set_header(vec!["Type", "Size", "Changed", "Name"]);
    for entry in entries {
        let size = if entry.is_dir() {
            "-".to_string()
        } else {
            format_size(entry.size)
        };
        table.add_row(vec![
            format_entry_type(entry.kind).to_string(),
            size,
            format_time(entry.time),
            display_name(entry),
        ]);
    }
    println!("{table}");
}

fn print_short_format(entries: &[Entry], one_per_line: bool) {
    if entries.is_empty() {
        return;
    }
    let names: Vec<_> = entries.iter().map(display_name).collect();
    if one_per_line {
        for name in names {
            println!("{name}");
        }
    } else {
        println!("{}", names.join("  "));
    }
}
