//! Protocol status enumerations.
//!
//! [`Nfs3Status`] mirrors `nfsstat3` (RFC 1813 §2.6) and [`MountStatus`]
//! mirrors `mountstat3` (RFC 1813 §5.1). Both keep unknown codes intact so a
//! caller always sees the number the server sent.

use std::fmt;
use std::io;

/// Non-zero `nfsstat3` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nfs3Status {
    /// Not owner.
    Perm,
    /// No such file or directory.
    NoEnt,
    /// Hard I/O error on the server.
    Io,
    /// No such device or address.
    NxIo,
    /// Permission denied.
    Access,
    /// File exists.
    Exist,
    /// Attempt to do a cross-device hard link or rename.
    XDev,
    /// No such device.
    NoDev,
    /// Not a directory.
    NotDir,
    /// Is a directory.
    IsDir,
    /// Invalid argument.
    Inval,
    /// File too large.
    FBig,
    /// No space left on device.
    NoSpc,
    /// Read-only file system.
    RoFs,
    /// Too many hard links.
    MLink,
    /// Filename too long.
    NameTooLong,
    /// Directory not empty.
    NotEmpty,
    /// Quota exceeded.
    DQuot,
    /// Stale file handle.
    Stale,
    /// Too many levels of remote in path.
    Remote,
    /// Illegal file handle.
    BadHandle,
    /// Update synchronization mismatch in SETATTR.
    NotSync,
    /// READDIR or READDIRPLUS cookie is stale.
    BadCookie,
    /// Operation not supported.
    NotSupp,
    /// Buffer or request too small.
    TooSmall,
    /// Server fault not covered by another code.
    ServerFault,
    /// Object type not supported by the server.
    BadType,
    /// Request initiated but not completed in time.
    Jukebox,
    /// A code not defined by RFC 1813.
    Unknown(u32),
}

impl Nfs3Status {
    /// The numeric value carried on the wire.
    pub const fn code(self) -> u32 {
        match self {
            Self::Perm => 1,
            Self::NoEnt => 2,
            Self::Io => 5,
            Self::NxIo => 6,
            Self::Access => 13,
            Self::Exist => 17,
            Self::XDev => 18,
            Self::NoDev => 19,
            Self::NotDir => 20,
            Self::IsDir => 21,
            Self::Inval => 22,
            Self::FBig => 27,
            Self::NoSpc => 28,
            Self::RoFs => 30,
            Self::MLink => 31,
            Self::NameTooLong => 63,
            Self::NotEmpty => 66,
            Self::DQuot => 69,
            Self::Stale => 70,
            Self::Remote => 71,
            Self::BadHandle => 10001,
            Self::NotSync => 10002,
            Self::BadCookie => 10003,
            Self::NotSupp => 10004,
            Self::TooSmall => 10005,
            Self::ServerFault => 10006,
            Self::BadType => 10007,
            Self::Jukebox => 10008,
            Self::Unknown(code) => code,
        }
    }

    /// The RFC 1813 symbolic name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Perm => "NFS3ERR_PERM",
            Self::NoEnt => "NFS3ERR_NOENT",
            Self::Io => "NFS3ERR_IO",
            Self::NxIo => "NFS3ERR_NXIO",
            Self::Access => "NFS3ERR_ACCES",
            Self::Exist => "NFS3ERR_EXIST",
            Self::XDev => "NFS3ERR_XDEV",
            Self::NoDev => "NFS3ERR_NODEV",
            Self::NotDir => "NFS3ERR_NOTDIR",
            Self::IsDir => "NFS3ERR_ISDIR",
            Self::Inval => "NFS3ERR_INVAL",
            Self::FBig => "NFS3ERR_FBIG",
            Self::NoSpc => "NFS3ERR_NOSPC",
            Self::RoFs => "NFS3ERR_ROFS",
            Self::MLink => "NFS3ERR_MLINK",
            Self::NameTooLong => "NFS3ERR_NAMETOOLONG",
            Self::NotEmpty => "NFS3ERR_NOTEMPTY",
            Self::DQuot => "NFS3ERR_DQUOT",
            Self::Stale => "NFS3ERR_STALE",
            Self::Remote => "NFS3ERR_REMOTE",
            Self::BadHandle => "NFS3ERR_BADHANDLE",
            Self::NotSync => "NFS3ERR_NOT_SYNC",
            Self::BadCookie => "NFS3ERR_BAD_COOKIE",
            Self::NotSupp => "NFS3ERR_NOTSUPP",
            Self::TooSmall => "NFS3ERR_TOOSMALL",
            Self::ServerFault => "NFS3ERR_SERVERFAULT",
            Self::BadType => "NFS3ERR_BADTYPE",
            Self::Jukebox => "NFS3ERR_JUKEBOX",
            Self::Unknown(_) => "NFS3ERR_UNKNOWN",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Perm => "not owner",
            Self::NoEnt => "no such file or directory",
            Self::Io => "I/O error",
            Self::NxIo => "no such device or address",
            Self::Access => "permission denied",
            Self::Exist => "file exists",
            Self::XDev => "cross-device operation",
            Self::NoDev => "no such device",
            Self::NotDir => "not a directory",
            Self::IsDir => "is a directory",
            Self::Inval => "invalid argument",
            Self::FBig => "file too large",
            Self::NoSpc => "no space left on device",
            Self::RoFs => "read-only file system",
            Self::MLink => "too many hard links",
            Self::NameTooLong => "filename too long",
            Self::NotEmpty => "directory not empty",
            Self::DQuot => "quota exceeded",
            Self::Stale => "stale file handle",
            Self::Remote => "too many levels of remote in path",
            Self::BadHandle => "illegal file handle",
            Self::NotSync => "update synchronization mismatch",
            Self::BadCookie => "stale directory cookie",
            Self::NotSupp => "operation not supported",
            Self::TooSmall => "buffer or request too small",
            Self::ServerFault => "server fault",
            Self::BadType => "object type not supported",
            Self::Jukebox => "request not completed in time",
            Self::Unknown(_) => "unknown status",
        }
    }

    /// Closest `std::io::ErrorKind`, used when a status crosses an
    /// `io::Read`/`io::Write` boundary.
    pub fn io_kind(self) -> io::ErrorKind {
        match self {
            Self::NoEnt | Self::Stale | Self::BadHandle => io::ErrorKind::NotFound,
            Self::Perm | Self::Access | Self::RoFs => io::ErrorKind::PermissionDenied,
            Self::Exist => io::ErrorKind::AlreadyExists,
            Self::NotDir => io::ErrorKind::NotADirectory,
            Self::IsDir => io::ErrorKind::IsADirectory,
            Self::NotEmpty => io::ErrorKind::DirectoryNotEmpty,
            Self::Inval | Self::NameTooLong | Self::BadType => io::ErrorKind::InvalidInput,
            Self::NoSpc | Self::DQuot => io::ErrorKind::StorageFull,
            Self::FBig => io::ErrorKind::FileTooLarge,
            Self::XDev => io::ErrorKind::CrossesDevices,
            Self::NotSupp => io::ErrorKind::Unsupported,
            Self::Jukebox => io::ErrorKind::TimedOut,
            _ => io::ErrorKind::Other,
        }
    }
}

impl From<u32> for Nfs3Status {
    fn from(code: u32) -> Self {
        match code {
            1 => Self::Perm,
            2 => Self::NoEnt,
            5 => Self::Io,
            6 => Self::NxIo,
            13 => Self::Access,
            17 => Self::Exist,
            18 => Self::XDev,
            19 => Self::NoDev,
            20 => Self::NotDir,
            21 => Self::IsDir,
            22 => Self::Inval,
            27 => Self::FBig,
            28 => Self::NoSpc,
            30 => Self::RoFs,
            31 => Self::MLink,
            63 => Self::NameTooLong,
            66 => Self::NotEmpty,
            69 => Self::DQuot,
            70 => Self::Stale,
            71 => Self::Remote,
            10001 => Self::BadHandle,
            10002 => Self::NotSync,
            10003 => Self::BadCookie,
            10004 => Self::NotSupp,
            10005 => Self::TooSmall,
            10006 => Self::ServerFault,
            10007 => Self::BadType,
            10008 => Self::Jukebox,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for Nfs3Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.description())
    }
}

/// Non-zero `mountstat3` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MountStatus {
    /// Not owner.
    Perm,
    /// No such file or directory.
    NoEnt,
    /// I/O error.
    Io,
    /// Permission denied.
    Access,
    /// Not a directory.
    NotDir,
    /// Invalid argument.
    Inval,
    /// Filename too long.
    NameTooLong,
    /// Operation not supported.
    NotSupp,
    /// A failure on the server.
    ServerFault,
    /// A code not defined by RFC 1813.
    Unknown(u32),
}

impl MountStatus {
    /// The numeric value carried on the wire.
    pub const fn code(self) -> u32 {
        match self {
            Self::Perm => 1,
            Self::NoEnt => 2,
            Self::Io => 5,
            Self::Access => 13,
            Self::NotDir => 20,
            Self::Inval => 22,
            Self::NameTooLong => 63,
            Self::NotSupp => 10004,
            Self::ServerFault => 10006,
            Self::Unknown(code) => code,
        }
    }
}

impl From<u32> for MountStatus {
    fn from(code: u32) -> Self {
        match code {
            1 => Self::Perm,
            2 => Self::NoEnt,
            5 => Self::Io,
            13 => Self::Access,
            20 => Self::NotDir,
            22 => Self::Inval,
            63 => Self::NameTooLong,
            10004 => Self::NotSupp,
            10006 => Self::ServerFault,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for MountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Perm => "MNT3ERR_PERM: not owner",
            Self::NoEnt => "MNT3ERR_NOENT: no such export",
            Self::Io => "MNT3ERR_IO: I/O error",
            Self::Access => "MNT3ERR_ACCES: permission denied",
            Self::NotDir => "MNT3ERR_NOTDIR: not a directory",
            Self::Inval => "MNT3ERR_INVAL: invalid argument",
            Self::NameTooLong => "MNT3ERR_NAMETOOLONG: export path too long",
            Self::NotSupp => "MNT3ERR_NOTSUPP: operation not supported",
            Self::ServerFault => "MNT3ERR_SERVERFAULT: server fault",
            Self::Unknown(code) => return write!(f, "unknown mount status {code}"),
        };
        f.write_str(text)
    }
}
