//! Resolve user and group hints to numeric ids.
//!
//! A hint is either empty (use the default id), a decimal integer, or an
//! account name looked up in a passwd-format file. Integers wrap modulo
//! 2^32, so `"-2"` is `4294967294` (the usual `nobody` id). Name lookups
//! go through a small bounded cache with a fixed time-to-live; only cache
//! misses touch the file.
//!
//! Both user and group names are matched against the *user name* column of
//! the passwd file, and the matching line's uid or gid column is returned.
//! The group database is never consulted.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::sync::Cache;
use tracing::{debug, trace, warn};

use crate::error::{NfsError, Result};

/// Uid used when no hint is given.
pub const DEFAULT_UID: u32 = 1000;
/// Gid used when no hint is given.
pub const DEFAULT_GID: u32 = 1000;
/// Account database consulted for name hints.
pub const PASSWD_PATH: &str = "/etc/passwd";

pub const DEFAULT_CACHE_CAPACITY: u64 = 120;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdKind {
    Uid,
    Gid,
}

impl IdKind {
    const fn default_id(self) -> u32 {
        match self {
            IdKind::Uid => DEFAULT_UID,
            IdKind::Gid => DEFAULT_GID,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            IdKind::Uid => "uid",
            IdKind::Gid => "gid",
        }
    }

    const fn pick(self, ids: (u32, u32)) -> u32 {
        match self {
            IdKind::Uid => ids.0,
            IdKind::Gid => ids.1,
        }
    }
}

/// Shared cache of account name to `(uid, gid)`.
///
/// Owned by the caller and lent to each resolver. Safe to share between
/// threads.
pub struct CredentialCache {
    entries: Cache<String, (u32, u32)>,
    scans: AtomicU64,
}

impl std::fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCache")
            .field("entries", &self.entries.entry_count())
            .field("scans", &self.scans())
            .finish()
    }
}

impl Default for CredentialCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }
}

impl CredentialCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            scans: AtomicU64::new(0),
        }
    }

    /// Number of times the account file has been read.
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// A resolver reading the system account database.
    pub fn resolver(&self) -> CredentialResolver<'_> {
        CredentialResolver::new(self, PASSWD_PATH)
    }
}

/// Resolves hints against one passwd-format file.
#[derive(Debug)]
pub struct CredentialResolver<'c> {
    cache: &'c CredentialCache,
    passwd_path: PathBuf,
}

impl<'c> CredentialResolver<'c> {
    pub fn new(cache: &'c CredentialCache, passwd_path: impl AsRef<Path>) -> Self {
        Self {
            cache,
            passwd_path: passwd_path.as_ref().to_path_buf(),
        }
    }

    /// Resolve a user hint.
    ///
    /// # Errors
    ///
    /// [`NfsError::NotFound`] when no account has that name, or
    /// [`NfsError::Io`] when the account file cannot be read.
    pub fn resolve_uid(&self, hint: &str) -> Result<u32> {
        self.resolve(IdKind::Uid, hint)
    }

    /// Resolve a group hint. Names are matched against user names.
    pub fn resolve_gid(&self, hint: &str) -> Result<u32> {
        self.resolve(IdKind::Gid, hint)
    }

    /// Resolve a user hint, falling back to [`DEFAULT_UID`] on failure.
    pub fn uid_or_default(&self, hint: &str) -> u32 {
        self.or_default(IdKind::Uid, hint)
    }

    /// Resolve a group hint, falling back to [`DEFAULT_GID`] on failure.
    pub fn gid_or_default(&self, hint: &str) -> u32 {
        self.or_default(IdKind::Gid, hint)
    }

    fn or_default(&self, kind: IdKind, hint: &str) -> u32 {
        self.resolve(kind, hint).unwrap_or_else(|e| {
            warn!(hint, kind = kind.label(), error = %e, "Falling back to default id");
            kind.default_id()
        })
    }

    fn resolve(&self, kind: IdKind, hint: &str) -> Result<u32> {
        if hint.is_empty() {
            return Ok(kind.default_id());
        }
        if let Ok(id) = hint.parse::<i64>() {
            return Ok(wrap_id(id));
        }

        if let Some(ids) = self.cache.entries.get(hint) {
            trace!(hint, kind = kind.label(), "Credential cache hit");
            return Ok(kind.pick(ids));
        }

        let ids = self.scan(hint)?;
        self.cache.entries.insert(hint.to_string(), ids);
        Ok(kind.pick(ids))
    }

    /// Read the account file until the first line naming `name`.
    fn scan(&self, name: &str) -> Result<(u32, u32)> {
        self.cache.scans.fetch_add(1, Ordering::Relaxed);
        let file = File::open(&self.passwd_path)?;
        let mut reader = BufReader::new(file);
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            let text = String::from_utf8_lossy(&line);
            if let Some((uid, gid)) = match_line(text.trim_end_matches(['\n', '\r']), name) {
                debug!(name, uid, gid, "Resolved account name");
                return Ok((uid, gid));
            }
        }

        Err(NfsError::NotFound(format!("account {name:?}")))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn wrap_id(id: i64) -> u32 {
    id as u32
}

/// Match one `name:password:uid:gid:gecos:home:shell` line.
///
/// Lines without exactly seven fields, or whose uid or gid is not numeric,
/// never match.
fn match_line(line: &str, name: &str) -> Option<(u32, u32)> {
    let fields: Vec<&str> = line.split(':').collect();
    if fields.len() != 7 || fields[0] != name {
        return None;
    }
    Some((fields[2].parse().ok()?, fields[3].parse().ok()?))
}
