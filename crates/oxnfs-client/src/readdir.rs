//! Directory listing via READDIRPLUS.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::lookup::lookup;
use crate::mount::MountSession;
use crate::nfs3::{self, DirCursor, DirEntryPlus, FileHandle, FileKind};

/// Upper bound on directory-entry bytes per READDIRPLUS reply.
const DIRCOUNT: u32 = 8192;

/// The two kinds a listing exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One listed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    /// Size in bytes.
    pub size: u64,
    /// Status-change time (`ctime`), seconds since the epoch.
    pub time: i64,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Read every entry of `dir`, following cookies until the server reports
/// end of directory.
pub fn read_dir_plus(session: &MountSession, dir: &FileHandle) -> Result<Vec<DirEntryPlus>> {
    session.check_handle(dir)?;
    let mut cursor = DirCursor::default();
    let mut entries = Vec::new();

    loop {
        let args = nfs3::encode_readdirplus(dir, &cursor, DIRCOUNT, session.rtmax());
        let page = nfs3::decode_readdirplus(session.call(nfs3::NFSPROC3_READDIRPLUS, &args)?)?;
        debug!(entries = page.entries.len(), eof = page.eof, "READDIRPLUS page");

        let last_cookie = page.entries.last().map(|e| e.cookie);
        entries.extend(page.entries);
        if page.eof {
            break;
        }
        match last_cookie {
            Some(cookie) => {
                cursor = DirCursor {
                    cookie,
                    verifier: page.verifier,
                };
            }
            None => {
                warn!("READDIRPLUS returned an empty page before end of directory");
                break;
            }
        }
    }
    Ok(entries)
}

/// Keep only regular files and directories, dropping `.` and `..` and
/// entries the server sent without attributes. Order is preserved.
pub fn filter_entries(raw: Vec<DirEntryPlus>) -> Vec<Entry> {
    raw.into_iter()
        .filter(|e| !e.is_dot())
        .filter_map(|e| {
            let attr = e.attr?;
            let kind = match attr.kind {
                FileKind::Regular => EntryKind::File,
                FileKind::Directory => EntryKind::Directory,
                _ => return None,
            };
            Some(Entry {
                name: e.display_name(),
                kind,
                size: attr.size,
                time: i64::from(attr.ctime.seconds),
            })
        })
        .collect()
}

/// List the directory at `path`.
pub fn list(session: &MountSession, path: &str) -> Result<Vec<Entry>> {
    let (dir, _) = lookup(session, path)?;
    Ok(filter_entries(read_dir_plus(session, &dir)?))
}
