//! Blocking NFS version 3 client.
//!
//! The crate speaks the three ONC RPC programs needed to use an NFSv3 export
//! over TCP (port mapper, MOUNT and NFS) and layers a small filesystem
//! surface on top:
//!
//! - [`MountSession`]: the mount handshake and the session it produces.
//! - [`lookup`](lookup::lookup): path to [`FileHandle`] in one round trip.
//! - [`list`](readdir::list): directory listing via READDIRPLUS.
//! - [`FileReader`] / [`FileWriter`]: streaming I/O.
//! - [`rename`](rename::rename): RENAME issued through [`MountSession::call`].
//! - [`NfsShare`]: one configured export, one session per operation.
//!
//! # Example
//!
//! ```no_run
//! use std::io::Read;
//! use oxnfs_client::{CredentialCache, NfsShare, ShareConfig};
//!
//! # fn main() -> oxnfs_client::Result<()> {
//! let cache = CredentialCache::default();
//! let share = NfsShare::new(ShareConfig::new("nas.local", "/srv/share"), &cache)?;
//!
//! for entry in share.ls("/")? {
//!     println!("{} {}", entry.name, entry.size);
//! }
//!
//! let mut text = String::new();
//! share.cat("/notes.txt", None)?.read_to_string(&mut text)?;
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod config;
pub mod credentials;
pub mod error;
pub mod lookup;
pub mod metadata;
pub mod mount;
pub mod nfs3;
pub mod portmap;
pub mod readdir;
pub mod rename;
pub mod rpc;
pub mod share;
pub mod status;
pub mod stream;
pub mod xdr;

pub use cancel::{CancelToken, CloseLatch};
pub use config::ShareConfig;
pub use credentials::{CredentialCache, CredentialResolver};
pub use error::{NfsError, Result};
pub use metadata::Metadata;
pub use mount::{ConnectOptions, MountSession};
pub use nfs3::{Attr, FileHandle, FileKind};
pub use readdir::{Entry, EntryKind};
pub use rpc::Credential;
pub use share::NfsShare;
pub use status::{MountStatus, Nfs3Status};
pub use stream::{FileReader, FileWriter};
