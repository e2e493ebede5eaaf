//! Error type for NFS client operations.

use std::io;

use thiserror::Error;

use crate::rpc::RpcError;
use crate::status::{MountStatus, Nfs3Status};
use crate::xdr::XdrError;

/// Result alias used throughout the crate.
pub type Result<T, E = NfsError> = std::result::Result<T, E>;

/// Errors returned by the NFS client.
#[derive(Debug, Error)]
pub enum NfsError {
    /// Required configuration is missing, or an account lookup found no match.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration is present but unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A path could not be split into a parent and a leaf name.
    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    /// Transport or local file I/O error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// RPC layer rejected or failed the call.
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// The reply body could not be decoded.
    #[error("Malformed reply: {0}")]
    Xdr(#[from] XdrError),

    /// The mount daemon refused the export.
    #[error("Mount failed: {0}")]
    Mount(MountStatus),

    /// The NFS server returned a non-zero status.
    #[error("NFS error: {0}")]
    Status(Nfs3Status),

    /// The portmapper has no registration for a required service.
    #[error("{service} is not registered with the portmapper on {host}")]
    ServiceUnavailable {
        /// Service that could not be located.
        service: &'static str,
        /// Host that was queried.
        host: String,
    },

    /// A file handle was presented to a session that did not issue it.
    #[error("File handle belongs to another session")]
    ForeignHandle,

    /// The session was closed before the operation ran.
    #[error("Session is closed")]
    SessionClosed,
}

impl NfsError {
    /// The NFS status carried by this error, if any.
    pub fn status(&self) -> Option<Nfs3Status> {
        match self {
            NfsError::Status(status) => Some(*status),
            _ => None,
        }
    }

    /// True for errors meaning "the thing asked for does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            NfsError::NotFound(_)
                | NfsError::Status(Nfs3Status::NoEnt)
                | NfsError::Mount(MountStatus::NoEnt)
        )
    }

    /// Recover an `NfsError` that was carried through an `io::Error`.
    ///
    /// Errors raised inside the crate's `Read`/`Write` implementations are
    /// wrapped so they can pass through `std::io` APIs; this undoes that.
    pub fn from_io(err: io::Error) -> Self {
        if err.get_ref().is_some_and(|inner| inner.is::<NfsError>()) {
            let kind = err.kind();
            match err.into_inner().map(|inner| inner.downcast::<NfsError>()) {
                Some(Ok(nfs)) => *nfs,
                Some(Err(other)) => NfsError::Io(io::Error::new(kind, other)),
                None => NfsError::Io(io::Error::from(kind)),
            }
        } else {
            NfsError::Io(err)
        }
    }

    fn io_kind(&self) -> io::ErrorKind {
        match self {
            NfsError::NotFound(_) => io::ErrorKind::NotFound,
            NfsError::Config(_) | NfsError::InvalidPath(_) => io::ErrorKind::InvalidInput,
            NfsError::Io(e) => e.kind(),
            NfsError::Xdr(_) => io::ErrorKind::InvalidData,
            NfsError::Status(status) => status.io_kind(),
            NfsError::Mount(MountStatus::NoEnt) => io::ErrorKind::NotFound,
            NfsError::Mount(MountStatus::Access | MountStatus::Perm) => {
                io::ErrorKind::PermissionDenied
            }
            NfsError::SessionClosed => io::ErrorKind::ConnectionAborted,
            NfsError::ServiceUnavailable { .. } => io::ErrorKind::ConnectionRefused,
            NfsError::Rpc(_) | NfsError::Mount(_) | NfsError::ForeignHandle => {
                io::ErrorKind::Other
            }
        }
    }
}

impl From<NfsError> for io::Error {
    fn from(err: NfsError) -> Self {
        match err {
            NfsError::Io(e) => e,
            other => io::Error::new(other.io_kind(), other),
        }
    }
}

/// Turn a non-zero `nfsstat3` into an error.
pub(crate) fn check_status(code: u32) -> Result<()> {
    if code == 0 {
        Ok(())
    } else {
        Err(NfsError::Status(Nfs3Status::from(code)))
    }
}
