//! Configuration file support for the oxnfs CLI.
//!
//! Configuration is stored at `~/.config/oxnfs/config.toml` (XDG standard)
//! or `~/Library/Application Support/com.oxidized.oxnfs/config.toml` on macOS.
//! `OXNFS_CONFIG_DIR` overrides the directory.
//!
//! # Example configuration
//!
//! ```toml
//! [defaults]
//! uid = "alice"
//! gid = "staff"
//!
//! [shares.home]
//! hostname = "nas.local"
//! target = "/srv/home"
//! chroot = "/alice"
//!
//! [shares.media]
//! hostname = "10.0.0.5"
//! target = "/volume1/media"
//! timeout = "10s"
//! ```
//!
//! # Usage
//!
//! ```bash
//! oxnfs ls @home /
//! oxnfs cat @media /playlist.m3u
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use oxnfs_client::{NfsError, ShareConfig};

/// Environment variable that replaces the platform config directory.
pub const CONFIG_DIR_ENV: &str = "OXNFS_CONFIG_DIR";

/// Main configuration structure
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Default settings applied to all shares
    #[serde(default)]
    pub defaults: Defaults,

    /// Named share configurations (aliases)
    #[serde(default)]
    pub shares: HashMap<String, ShareConfig>,
}

/// Default settings
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Defaults {
    /// Uid hint used when a share sets none
    pub uid: Option<String>,

    /// Gid hint used when a share sets none
    pub gid: Option<String>,
}

impl Config {
    /// Load configuration from the default path, or return empty config if not found.
    pub fn load() -> Result<Self> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Get a share configuration by alias name.
    pub fn get_share(&self, alias: &str) -> Option<&ShareConfig> {
        self.shares.get(alias)
    }

    /// List all configured share aliases, sorted.
    pub fn list_share_aliases(&self) -> Vec<&String> {
        let mut aliases: Vec<_> = self.shares.keys().collect();
        aliases.sort();
        aliases
    }

    /// Fill uid/gid hints the share leaves empty.
    fn apply_defaults(&self, share: &mut ShareConfig) {
        if share.uid.is_empty()
            && let Some(uid) = &self.defaults.uid
        {
            uid.clone_into(&mut share.uid);
        }
        if share.gid.is_empty()
            && let Some(gid) = &self.defaults.gid
        {
            gid.clone_into(&mut share.gid);
        }
    }
}

/// Get the path to the configuration file.
///
/// Uses XDG config directory on Linux, Application Support on macOS.
pub fn config_path() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir).join("config.toml"));
    }

    let base_dirs = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;

    #[cfg(target_os = "macos")]
    {
        let config_dir = base_dirs
            .home_dir()
            .join("Library/Application Support/com.oxidized.oxnfs");
        Ok(config_dir.join("config.toml"))
    }

    #[cfg(not(target_os = "macos"))]
    {
        let config_dir = base_dirs.config_dir().join("oxnfs");
        Ok(config_dir.join("config.toml"))
    }
}

/// Parse `host:/export` into a share configuration.
pub fn parse_share_spec(spec: &str) -> Result<ShareConfig, NfsError> {
    match spec.split_once(':') {
        Some((host, export)) if !host.is_empty() && export.starts_with('/') => {
            Ok(ShareConfig::new(host, export))
        }
        _ => Err(NfsError::Config(format!(
            "share {spec:?} is not of the form HOST:/EXPORT or @alias"
        ))),
    }
}

/// Resolve a share argument, handling @alias syntax.
pub fn resolve_share(spec: &str) -> Result<ShareConfig> {
    let config = Config::load()?;
    resolve_share_with(&config, spec)
}

fn resolve_share_with(config: &Config, spec: &str) -> Result<ShareConfig> {
    let mut share = match spec.strip_prefix('@') {
        Some(alias) => config.get_share(alias).cloned().ok_or_else(|| {
            let available = config.list_share_aliases();
            let location = config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "~/.config/oxnfs/config.toml".to_string());
            if available.is_empty() {
                anyhow::anyhow!(
                    "Unknown share alias '@{alias}'.\n\
                     No share aliases are configured.\n\n\
                     Create a config file at {location} with:\n\n\
                     [shares.{alias}]\n\
                     hostname = \"nas.local\"\n\
                     target = \"/srv/share\""
                )
            } else {
                anyhow::anyhow!(
                    "Unknown share alias '@{alias}'.\n\n\
                     Available aliases: {}",
                    available
                        .iter()
                        .map(|a| format!("@{a}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        })?,
        None => parse_share_spec(spec)?,
    };
    config.apply_defaults(&mut share);
    Ok(share)
}
