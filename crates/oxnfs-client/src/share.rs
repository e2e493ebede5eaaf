//! The capability surface a host drives: one configured export.
//!
//! Every operation mounts its own session and unmounts it before returning,
//! on success and on error alike. Reading is the exception: [`NfsShare::cat`]
//! hands the session to the returned [`FileReader`], which unmounts when it
//! is closed, dropped, or cancelled.

use std::io::{self, Read};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::cancel::CancelToken;
use crate::config::ShareConfig;
use crate::credentials::{CredentialCache, CredentialResolver};
use crate::error::Result;
use crate::lookup::{lookup, lookup_in, split_path};
use crate::metadata::Metadata;
use crate::mount::MountSession;
use crate::nfs3::{self, DirOpArgs, FileHandle, FileKind, SetAttr};
use crate::readdir::{self, Entry};
use crate::rename;
use crate::rpc::Credential;
use crate::stream::{self, DIR_MODE, FileReader};

/// A configured export with a resolved caller identity.
#[derive(Debug, Clone)]
pub struct NfsShare {
    config: ShareConfig,
    credential: Credential,
}

impl NfsShare {
    /// Validate `config` and resolve its uid/gid hints through `cache`.
    ///
    /// Hints that fail to resolve fall back to the default ids with a
    /// warning; only an unusable configuration is an error.
    pub fn new(config: ShareConfig, cache: &CredentialCache) -> Result<Self> {
        config.validate()?;
        let resolver = CredentialResolver::new(cache, &config.passwd_path);
        let uid = resolver.uid_or_default(&config.uid);
        let gid = resolver.gid_or_default(&config.gid);
        let credential = Credential::new(config.machine_name.clone(), uid, gid);
        debug!(host = %config.hostname, export = %config.target, uid, gid, "Share configured");
        Ok(Self { config, credential })
    }

    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    fn connect(&self) -> Result<MountSession> {
        MountSession::connect(&self.config.connect_options(), self.credential.clone())
    }

    /// Run `op` against a fresh session and always unmount afterwards.
    pub fn with_session<T>(&self, op: impl FnOnce(&MountSession) -> Result<T>) -> Result<T> {
        let session = self.connect()?;
        let result = op(&session);
        session.close();
        result
    }

    /// Map a caller path onto the export, under the chroot if one is set.
    pub fn export_path(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        match self.config.chroot.as_deref().map(|c| c.trim_matches('/')) {
            Some(root) if !root.is_empty() => {
                if path.is_empty() {
                    root.to_string()
                } else {
                    format!("{root}/{path}")
                }
            }
            _ => path.to_string(),
        }
    }

    /// List a directory.
    #[instrument(level = "info", name = "share::ls", skip(self))]
    pub fn ls(&self, path: &str) -> Result<Vec<Entry>> {
        let path = self.export_path(path);
        self.with_session(|s| readdir::list(s, &path))
    }

    /// Open a file for streaming reads.
    ///
    /// A missing file is created (mode 0777) rather than reported. When
    /// `cancel` fires the stream's session is torn down and further reads
    /// fail.
    #[instrument(level = "info", name = "share::cat", skip(self, cancel))]
    pub fn cat(&self, path: &str, cancel: Option<&CancelToken>) -> Result<FileReader> {
        let path = self.export_path(path);
        let session = Arc::new(self.connect()?);
        FileReader::open(session, &path, cancel)
    }

    /// Replace the content of `path` with everything read from `source`.
    #[instrument(level = "info", name = "share::save", skip(self, source))]
    pub fn save(&self, path: &str, source: &mut dyn Read) -> Result<u64> {
        let path = self.export_path(path);
        self.with_session(|s| stream::save(s, &path, source))
    }

    /// Create an empty file, truncating any existing one.
    #[instrument(level = "info", name = "share::touch", skip(self))]
    pub fn touch(&self, path: &str) -> Result<()> {
        self.save(path, &mut io::empty()).map(|_| ())
    }

    /// Create a directory with mode 0775.
    #[instrument(level = "info", name = "share::mkdir", skip(self))]
    pub fn mkdir(&self, path: &str) -> Result<()> {
        let path = self.export_path(path);
        self.with_session(|s| {
            let (parent, leaf) = split_path(&path)?;
            let (dir, _) = lookup(s, parent)?;
            let attr = SetAttr {
                mode: Some(DIR_MODE),
                size: None,
            };
            let args = nfs3::encode_mkdir(DirOpArgs { dir: &dir, name: leaf.as_bytes() }, attr);
            nfs3::decode_create(s.call(nfs3::NFSPROC3_MKDIR, &args)?)?;
            Ok(())
        })
    }

    /// Remove an entry.
    ///
    /// A trailing `/` means "directory": the whole subtree is removed.
    /// Without it exactly one non-directory entry is removed.
    #[instrument(level = "info", name = "share::rm", skip(self))]
    pub fn rm(&self, path: &str) -> Result<()> {
        let recursive = path.ends_with('/');
        let path = self.export_path(path);
        self.with_session(|s| {
            let (parent, leaf) = split_path(&path)?;
            let (dir, _) = lookup(s, parent)?;
            if recursive {
                remove_tree(s, &dir, leaf.as_bytes())
            } else {
                remove_entry(s, &dir, leaf.as_bytes(), nfs3::NFSPROC3_REMOVE)
            }
        })
    }

    /// Rename `from` to `to`.
    #[instrument(level = "info", name = "share::mv", skip(self))]
    pub fn mv(&self, from: &str, to: &str) -> Result<()> {
        let from = self.export_path(from);
        let to = self.export_path(to);
        self.with_session(|s| rename::rename(s, &from, &to))
    }

    /// Capability overrides for `path`.
    ///
    /// Never fails: any error while finding the entry yields no overrides.
    #[instrument(level = "debug", name = "share::meta", skip(self))]
    pub fn meta(&self, path: &str) -> Metadata {
        let path = self.export_path(path);
        let attr = self.with_session(|s| lookup(s, &path).map(|(_, attr)| attr));
        match attr {
            Ok(attr) => {
                Metadata::for_owner(attr.as_ref(), self.credential.uid(), self.credential.gid())
            }
            Err(e) => {
                debug!(error = %e, "Metadata lookup failed");
                Metadata::default()
            }
        }
    }
}

fn remove_entry(session: &MountSession, dir: &FileHandle, name: &[u8], procedure: u32) -> Result<()> {
    session.check_handle(dir)?;
    let args = nfs3::encode_remove(DirOpArgs { dir, name });
    nfs3::decode_remove(session.call(procedure, &args)?)
}

/// Depth-first removal of `name` inside `parent`.
///
/// Child names are passed back byte for byte as listed.
fn remove_tree(session: &MountSession, parent: &FileHandle, name: &[u8]) -> Result<()> {
    let (dir, _) = lookup_in(session, parent, name)?;
    for entry in readdir::read_dir_plus(session, &dir)? {
        if entry.is_dot() {
            continue;
        }
        match entry.attr.map(|a| a.kind) {
            Some(FileKind::Directory) => remove_tree(session, &dir, &entry.name)?,
            Some(_) => remove_entry(session, &dir, &entry.name, nfs3::NFSPROC3_REMOVE)?,
            None => {
                warn!(name = %entry.display_name(), "Entry without attributes, removing as a file");
                remove_entry(session, &dir, &entry.name, nfs3::NFSPROC3_REMOVE)?;
            }
        }
    }
    remove_entry(session, parent, name, nfs3::NFSPROC3_RMDIR)
}
