//! Share configuration as supplied by the host.
//!
//! A [`ShareConfig`] can be deserialized (TOML, JSON, ...) or built from the
//! flat string map a host passes on connect via [`ShareConfig::from_params`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::credentials::PASSWD_PATH;
use crate::error::{NfsError, Result};
use crate::mount::ConnectOptions;
use crate::portmap;

/// Machine name sent in AUTH_UNIX credentials when none is configured.
pub const DEFAULT_MACHINE_NAME: &str = "oxnfs";
/// Connect and per-call I/O timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

fn default_machine_name() -> String {
    DEFAULT_MACHINE_NAME.to_string()
}

fn default_portmap_port() -> u16 {
    portmap::DEFAULT_PORT
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_passwd_path() -> PathBuf {
    PathBuf::from(PASSWD_PATH)
}

/// Everything needed to reach and authenticate against one export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ShareConfig {
    /// NFS server host name or address.
    #[serde(default)]
    pub hostname: String,

    /// Export path to mount, e.g. `/srv/share`.
    #[serde(default)]
    pub target: String,

    /// Machine name in the AUTH_UNIX credential.
    #[serde(default = "default_machine_name")]
    pub machine_name: String,

    /// Uid hint: empty, a number, or an account name.
    #[serde(default)]
    pub uid: String,

    /// Gid hint: empty, a number, or an account name.
    #[serde(default)]
    pub gid: String,

    /// Sub-directory of the export that all paths are relative to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chroot: Option<String>,

    #[serde(default = "default_portmap_port")]
    pub portmap_port: u16,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Account file for name hints.
    #[serde(default = "default_passwd_path")]
    pub passwd_path: PathBuf,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            target: String::new(),
            machine_name: default_machine_name(),
            uid: String::new(),
            gid: String::new(),
            chroot: None,
            portmap_port: default_portmap_port(),
            timeout: default_timeout(),
            passwd_path: default_passwd_path(),
        }
    }
}

impl ShareConfig {
    pub fn new(hostname: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            target: target.into(),
            ..Self::default()
        }
    }

    /// Build from host-supplied key/value parameters.
    ///
    /// Recognised keys: `hostname`, `target`, `machine_name`, `uid`, `gid`,
    /// `path` (the chroot), `portmap_port` and `timeout` (humantime, e.g.
    /// `"10s"`). Unknown keys are ignored; empty values mean unset.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| params.get(key).map(String::as_str).filter(|v| !v.is_empty());

        let mut config = Self::default();
        if let Some(v) = get("hostname") {
            v.clone_into(&mut config.hostname);
        }
        if let Some(v) = get("target") {
            v.clone_into(&mut config.target);
        }
        if let Some(v) = get("machine_name") {
            v.clone_into(&mut config.machine_name);
        }
        if let Some(v) = get("uid") {
            v.clone_into(&mut config.uid);
        }
        if let Some(v) = get("gid") {
            v.clone_into(&mut config.gid);
        }
        config.chroot = get("path").map(str::to_string);
        if let Some(v) = get("portmap_port") {
            config.portmap_port = v
                .parse()
                .map_err(|_| NfsError::Config(format!("portmap_port: {v:?} is not a port")))?;
        }
        if let Some(v) = get("timeout") {
            config.timeout = humantime_serde::re::humantime::parse_duration(v)
                .map_err(|e| NfsError::Config(format!("timeout: {e}")))?;
        }
        Ok(config)
    }

    /// Reject configurations that cannot possibly connect.
    pub fn validate(&self) -> Result<()> {
        if self.hostname.is_empty() {
            return Err(NfsError::NotFound("hostname".to_string()));
        }
        if self.target.is_empty() {
            return Err(NfsError::Config("target export path is empty".to_string()));
        }
        Ok(())
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            hostname: self.hostname.clone(),
            export: self.target.clone(),
            portmap_port: self.portmap_port,
            timeout: self.timeout,
        }
    }
}
