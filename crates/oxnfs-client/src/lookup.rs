//! Path to handle resolution.
//!
//! The whole relative path is sent in a single LOOKUP against the export
//! root and resolved by the server; there is no per-segment walk.

use tracing::trace;

use crate::error::{NfsError, Result};
use crate::mount::MountSession;
use crate::nfs3::{self, Attr, DirOpArgs, FileHandle};

/// Strip leading and trailing separators. `"a/b/"`, `"/a/b"` and `"a/b"`
/// name the same object.
pub fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

/// Resolve `path` relative to the export root.
///
/// The root itself (empty path) resolves without a network call and has no
/// attributes.
pub fn lookup(session: &MountSession, path: &str) -> Result<(FileHandle, Option<Attr>)> {
    let path = normalize(path);
    if path.is_empty() {
        return Ok((session.root().clone(), None));
    }
    lookup_in(session, session.root(), path.as_bytes())
}

/// Resolve `name` within the directory `dir`.
pub fn lookup_in(
    session: &MountSession,
    dir: &FileHandle,
    name: &[u8],
) -> Result<(FileHandle, Option<Attr>)> {
    session.check_handle(dir)?;
    let args = nfs3::encode_lookup(DirOpArgs { dir, name });
    let (fh, attr) = nfs3::decode_lookup(session.call(nfs3::NFSPROC3_LOOKUP, &args)?)?;
    trace!(name = %String::from_utf8_lossy(name), "LOOKUP resolved");
    Ok((session.adopt(fh), attr))
}

/// Split a path into its parent directory and leaf name.
///
/// A trailing separator is ignored. The parent of a top-level name is `""`,
/// the export root.
pub fn split_path(path: &str) -> Result<(&str, &str)> {
    let trimmed = path.trim_end_matches('/');
    let (parent, leaf) = match trimmed.rfind('/') {
        Some(idx) => (&trimmed[..idx], &trimmed[idx + 1..]),
        None => ("", trimmed),
    };
    if leaf.is_empty() {
        return Err(NfsError::InvalidPath(path.to_string()));
    }
    Ok((parent, leaf))
}
