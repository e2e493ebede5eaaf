#![deny(unsafe_code)]

// Use mimalloc for reduced allocation latency (enabled by default).
// Disable with `--no-default-features` if debugging allocator issues.
#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod commands;
mod config;
mod exit_code;
mod output;

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use oxnfs_client::{CredentialCache, MountStatus, Nfs3Status, NfsError, NfsShare, ShareConfig};

use crate::commands::{cat, ls, meta, mkdir, mv, rm, touch, write};

/// Command-line client for NFSv3 exports
#[derive(Parser)]
#[command(name = "oxnfs")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # List an export
    oxnfs ls nas.local:/srv/share /

    # Read a file as uid 1001
    oxnfs --uid 1001 cat nas.local:/srv/share /notes.txt

    # Upload from stdin
    tar c photos | oxnfs write @home /backup/photos.tar

    # Remove a directory tree
    oxnfs rm -r @home /old-projects

    # Use share alias (from ~/.config/oxnfs/config.toml)
    oxnfs ls @home /
")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(flatten)]
    overrides: ShareOverrides,

    #[command(subcommand)]
    command: Commands,
}

/// Per-invocation settings layered over the share configuration
#[derive(ClapArgs, Clone, Default)]
struct ShareOverrides {
    /// Uid to present: a number or an account name
    #[arg(long, env = "OXNFS_UID", global = true)]
    uid: Option<String>,

    /// Gid to present: a number or an account name
    #[arg(long, env = "OXNFS_GID", global = true)]
    gid: Option<String>,

    /// Machine name in the AUTH_UNIX credential
    #[arg(long, env = "OXNFS_MACHINE_NAME", global = true)]
    machine_name: Option<String>,

    /// Sub-directory of the export to treat as root
    #[arg(long, env = "OXNFS_CHROOT", global = true)]
    chroot: Option<String>,

    /// Port of the server's portmapper
    #[arg(long, value_name = "PORT", env = "OXNFS_PORTMAP_PORT", global = true)]
    portmap_port: Option<u16>,

    /// Connect and per-call timeout in seconds
    #[arg(long, value_name = "SECS", env = "OXNFS_TIMEOUT", global = true)]
    timeout: Option<u64>,
}

impl ShareOverrides {
    fn apply(&self, share: &mut ShareConfig) {
        if let Some(uid) = &self.uid {
            uid.clone_into(&mut share.uid);
        }
        if let Some(gid) = &self.gid {
            gid.clone_into(&mut share.gid);
        }
        if let Some(name) = &self.machine_name {
            name.clone_into(&mut share.machine_name);
        }
        if let Some(chroot) = &self.chroot {
            share.chroot = Some(chroot.clone());
        }
        if let Some(port) = self.portmap_port {
            share.portmap_port = port;
        }
        if let Some(secs) = self.timeout {
            share.timeout = Duration::from_secs(secs);
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List directory contents
    Ls(ShareCommand<ls::Args>),

    /// Stream a file to stdout
    Cat(ShareCommand<cat::Args>),

    /// Write stdin to a file
    Write(ShareCommand<write::Args>),

    /// Create an empty file
    Touch(ShareCommand<touch::Args>),

    /// Create a directory
    Mkdir(ShareCommand<mkdir::Args>),

    /// Remove a file or directory
    Rm(ShareCommand<rm::Args>),

    /// Move or rename a file or directory
    Mv(ShareCommand<mv::Args>),

    /// Show capability overrides for an entry
    Meta(ShareCommand<meta::Args>),
}

/// Wrapper for commands that operate on a share
#[derive(Parser, Clone)]
pub struct ShareCommand<T: clap::Args> {
    /// Share as HOST:/EXPORT, or @alias from config
    #[arg(value_name = "SHARE")]
    pub share: String,

    #[command(flatten)]
    pub args: T,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            let code = categorize_error(&e);

            // Only print error if not quiet mode (quiet is parsed separately for this)
            let args: Vec<String> = std::env::args().collect();
            let is_quiet = args.iter().any(|a| a == "-q" || a == "--quiet");

            if !is_quiet {
                eprintln!("Error: {e:#}");
            }

            ExitCode::from(code)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if !cli.quiet {
        setup_tracing(cli.verbose);
    }

    let overrides = &cli.overrides;
    match &cli.command {
        Commands::Ls(cmd) => execute_share_command(cmd, overrides, ls::execute),
        Commands::Cat(cmd) => execute_share_command(cmd, overrides, cat::execute),
        Commands::Write(cmd) => execute_share_command(cmd, overrides, write::execute),
        Commands::Touch(cmd) => execute_share_command(cmd, overrides, touch::execute),
        Commands::Mkdir(cmd) => execute_share_command(cmd, overrides, mkdir::execute),
        Commands::Rm(cmd) => execute_share_command(cmd, overrides, rm::execute),
        Commands::Mv(cmd) => execute_share_command(cmd, overrides, mv::execute),
        Commands::Meta(cmd) => execute_share_command(cmd, overrides, meta::execute),
    }
}

/// Resolve the share, apply overrides, and run `f` against it
fn execute_share_command<T, F>(cmd: &ShareCommand<T>, overrides: &ShareOverrides, f: F) -> Result<()>
where
    T: clap::Args,
    F: FnOnce(&NfsShare, &T) -> Result<()>,
{
    let mut config = config::resolve_share(&cmd.share)?;
    overrides.apply(&mut config);

    let cache = CredentialCache::default();
    let share = NfsShare::new(config, &cache)
        .with_context(|| format!("Invalid share configuration for {}", cmd.share))?;
    f(&share, &cmd.args)
}

/// Set up tracing/logging based on verbosity level
fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

/// Exit code for a client error, if it has a specific one
fn categorize_nfs_error(err: &NfsError) -> Option<u8> {
    let code = match err {
        NfsError::SessionClosed => exit_code::CANCELLED,
        NfsError::NotFound(_) => exit_code::NOT_FOUND,
        NfsError::Config(_) | NfsError::InvalidPath(_) => exit_code::USAGE_ERROR,
        NfsError::Mount(MountStatus::Perm | MountStatus::Access) => exit_code::AUTH_FAILED,
        NfsError::Mount(MountStatus::NoEnt | MountStatus::NotDir) => exit_code::NOT_FOUND,
        NfsError::Mount(_) | NfsError::ServiceUnavailable { .. } => exit_code::MOUNT_FAILED,
        NfsError::Status(Nfs3Status::NoEnt | Nfs3Status::NotDir) => exit_code::NOT_FOUND,
        NfsError::Status(Nfs3Status::Perm | Nfs3Status::Access | Nfs3Status::RoFs) => {
            exit_code::PERMISSION_DENIED
        }
        NfsError::Io(io_err) => return categorize_io_error(io_err),
        _ => return None,
    };
    Some(code)
}

fn categorize_io_error(err: &io::Error) -> Option<u8> {
    if let Some(nfs_err) = err.get_ref().and_then(|inner| inner.downcast_ref::<NfsError>()) {
        return categorize_nfs_error(nfs_err);
    }
    match err.kind() {
        io::ErrorKind::PermissionDenied => Some(exit_code::PERMISSION_DENIED),
        io::ErrorKind::NotFound => Some(exit_code::NOT_FOUND),
        io::ErrorKind::Interrupted => Some(exit_code::CANCELLED),
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::HostUnreachable
        | io::ErrorKind::NetworkUnreachable
        | io::ErrorKind::TimedOut => Some(exit_code::MOUNT_FAILED),
        _ => None,
    }
}

/// Categorize an error into an exit code using typed error downcasting
///
/// This approach is more robust than string matching because it doesn't depend
/// on error message wording, which could change between versions.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(nfs_err) = cause.downcast_ref::<NfsError>()
            && let Some(code) = categorize_nfs_error(nfs_err)
        {
            return code;
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>()
            && let Some(code) = categorize_io_error(io_err)
        {
            return code;
        }
    }

    // Fallback to string matching for errors we don't have typed variants for
    let msg = format!("{e:#}").to_lowercase();
    if msg.contains("cancelled") || msg.contains("interrupted") {
        exit_code::CANCELLED
    } else {
        exit_code::GENERAL_ERROR
    }
}
