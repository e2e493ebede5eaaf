//! NFS version 3 wire types and per-procedure codecs (RFC 1813).
//!
//! Only the procedures this client issues are modelled. Each one gets an
//! `encode_*` function producing its argument bytes and a `decode_*`
//! function consuming the result body returned by
//! [`RpcClient::call`](crate::rpc::RpcClient::call).

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::{Bytes, BytesMut};

use crate::error::{Result, check_status};
use crate::xdr::{Decode, Encode, XdrError, decode_fixed, decode_opaque, decode_optional, skip};

/// NFS program number.
pub const PROGRAM: u32 = 100003;
/// NFS protocol version.
pub const VERSION: u32 = 3;

pub const NFSPROC3_LOOKUP: u32 = 3;
pub const NFSPROC3_READ: u32 = 6;
pub const NFSPROC3_WRITE: u32 = 7;
pub const NFSPROC3_CREATE: u32 = 8;
pub const NFSPROC3_MKDIR: u32 = 9;
pub const NFSPROC3_REMOVE: u32 = 12;
pub const NFSPROC3_RMDIR: u32 = 13;
pub const NFSPROC3_RENAME: u32 = 14;
pub const NFSPROC3_READDIRPLUS: u32 = 17;
pub const NFSPROC3_FSINFO: u32 = 19;

/// Maximum size in bytes of a file handle.
pub const NFS3_FHSIZE: usize = 64;
/// Size of the READDIR/READDIRPLUS cookie verifier.
pub const NFS3_COOKIEVERFSIZE: usize = 8;
/// Size of the WRITE verifier.
pub const NFS3_WRITEVERFSIZE: usize = 8;

/// `stable_how::FILE_SYNC`.
pub const FILE_SYNC: u32 = 2;

const CREATE_UNCHECKED: u32 = 0;
const TIME_DONT_CHANGE: u32 = 0;

// ============================================================================
// File handles
// ============================================================================

/// Identifies the session that issued a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// An opaque server-issued handle, tagged with the session it came from.
///
/// Handles are only meaningful to the session that obtained them; the
/// session refuses handles carrying another tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileHandle {
    session: SessionId,
    data: Bytes,
}

impl FileHandle {
    pub(crate) fn new(session: SessionId, data: Bytes) -> Self {
        Self { session, data }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Raw handle bytes as issued by the server.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Encode for FileHandle {
    fn encode(&self, buf: &mut BytesMut) {
        self.data.as_ref().encode(buf);
    }
}

/// Decode an `nfs_fh3` body (opaque<64>).
pub fn decode_fh(buf: &mut Bytes) -> Result<Bytes, XdrError> {
    decode_opaque(buf, NFS3_FHSIZE)
}

// ============================================================================
// Attributes
// ============================================================================

/// `ftype3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    Block,
    Character,
    Symlink,
    Socket,
    Fifo,
    /// A value outside the RFC 1813 range.
    Other(u32),
}

impl From<u32> for FileKind {
    fn from(value: u32) -> Self {
        match value {
            1 => Self::Regular,
            2 => Self::Directory,
            3 => Self::Block,
            4 => Self::Character,
            5 => Self::Symlink,
            6 => Self::Socket,
            7 => Self::Fifo,
            other => Self::Other(other),
        }
    }
}

/// `nfstime3`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct NfsTime {
    pub seconds: u32,
    pub nseconds: u32,
}

impl Decode for NfsTime {
    fn decode(buf: &mut Bytes) -> Result<Self, XdrError> {
        Ok(Self {
            seconds: u32::decode(buf)?,
            nseconds: u32::decode(buf)?,
        })
    }
}

/// `fattr3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr {
    pub kind: FileKind,
    pub mode: u32,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub used: u64,
    pub rdev: (u32, u32),
    pub fsid: u64,
    pub fileid: u64,
    pub atime: NfsTime,
    pub mtime: NfsTime,
    pub ctime: NfsTime,
}

impl Decode for Attr {
    fn decode(buf: &mut Bytes) -> Result<Self, XdrError> {
        Ok(Self {
            kind: FileKind::from(u32::decode(buf)?),
            mode: u32::decode(buf)?,
            nlink: u32::decode(buf)?,
            uid: u32::decode(buf)?,
            gid: u32::decode(buf)?,
            size: u64::decode(buf)?,
            used: u64::decode(buf)?,
            rdev: (u32::decode(buf)?, u32::decode(buf)?),
            fsid: u64::decode(buf)?,
            fileid: u64::decode(buf)?,
            atime: NfsTime::decode(buf)?,
            mtime: NfsTime::decode(buf)?,
            ctime: NfsTime::decode(buf)?,
        })
    }
}

/// `post_op_attr`.
fn decode_post_op_attr(buf: &mut Bytes) -> Result<Option<Attr>, XdrError> {
    decode_optional::<Attr>(buf)
}

/// `wcc_data`: optional pre-op size/mtime/ctime, then `post_op_attr`.
fn skip_wcc_data(buf: &mut Bytes) -> Result<(), XdrError> {
    if bool::decode(buf)? {
        // wcc_attr: size3 + 2 x nfstime3
        skip(buf, 8 + 8 + 8)?;
    }
    decode_post_op_attr(buf)?;
    Ok(())
}

/// Initial attributes for CREATE and MKDIR. Only the mode and size are ever set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetAttr {
    pub mode: Option<u32>,
    pub size: Option<u64>,
}

impl Encode for SetAttr {
    fn encode(&self, buf: &mut BytesMut) {
        match self.mode {
            Some(mode) => {
                true.encode(buf);
                mode.encode(buf);
            }
            None => false.encode(buf),
        }
        false.encode(buf); // uid
        false.encode(buf); // gid
        match self.size {
            Some(size) => {
                true.encode(buf);
                size.encode(buf);
            }
            None => false.encode(buf),
        }
        TIME_DONT_CHANGE.encode(buf); // atime
        TIME_DONT_CHANGE.encode(buf); // mtime
    }
}

/// `diropargs3`: a directory handle and a name within it.
///
/// Names are opaque bytes on the wire and are sent back exactly as given.
#[derive(Debug, Clone, Copy)]
pub struct DirOpArgs<'a> {
    pub dir: &'a FileHandle,
    pub name: &'a [u8],
}

impl Encode for DirOpArgs<'_> {
    fn encode(&self, buf: &mut BytesMut) {
        self.dir.encode(buf);
        self.name.encode(buf);
    }
}

// ============================================================================
// LOOKUP
// ============================================================================

pub fn encode_lookup(args: DirOpArgs<'_>) -> BytesMut {
    let mut buf = BytesMut::new();
    args.encode(&mut buf);
    buf
}

/// Returns the object's raw handle and attributes.
pub fn decode_lookup(mut body: Bytes) -> Result<(Bytes, Option<Attr>)> {
    check_status(u32::decode(&mut body)?)?;
    let fh = decode_fh(&mut body)?;
    let attr = decode_post_op_attr(&mut body)?;
    let _dir_attr = decode_post_op_attr(&mut body)?;
    Ok((fh, attr))
}

// ============================================================================
// READDIRPLUS
// ============================================================================

/// Position within a READDIRPLUS enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirCursor {
    pub cookie: u64,
    pub verifier: [u8; NFS3_COOKIEVERFSIZE],
}

/// One `entryplus3`.
#[derive(Debug, Clone)]
pub struct DirEntryPlus {
    pub fileid: u64,
    /// Name exactly as the server sent it. Need not be UTF-8.
    pub name: Bytes,
    pub cookie: u64,
    pub attr: Option<Attr>,
    pub handle: Option<Bytes>,
}

impl DirEntryPlus {
    /// Whether this is the `.` or `..` entry.
    pub fn is_dot(&self) -> bool {
        matches!(self.name.as_ref(), b"." | b"..")
    }

    /// The name as text, with invalid UTF-8 replaced.
    pub fn display_name(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}

/// One page of READDIRPLUS results.
#[derive(Debug, Clone)]
pub struct DirPage {
    pub entries: Vec<DirEntryPlus>,
    pub verifier: [u8; NFS3_COOKIEVERFSIZE],
    pub eof: bool,
}

pub fn encode_readdirplus(
    dir: &FileHandle,
    cursor: &DirCursor,
    dircount: u32,
    maxcount: u32,
) -> BytesMut {
    let mut buf = BytesMut::new();
    dir.encode(&mut buf);
    cursor.cookie.encode(&mut buf);
    crate::xdr::encode_fixed(&mut buf, &cursor.verifier);
    dircount.encode(&mut buf);
    maxcount.encode(&mut buf);
    buf
}

pub fn decode_readdirplus(mut body: Bytes) -> Result<DirPage> {
    check_status(u32::decode(&mut body)?)?;
    let _dir_attr = decode_post_op_attr(&mut body)?;
    let mut verifier = [0u8; NFS3_COOKIEVERFSIZE];
    verifier.copy_from_slice(&decode_fixed(&mut body, NFS3_COOKIEVERFSIZE)?);

    let mut entries = Vec::new();
    while bool::decode(&mut body)? {
        let fileid = u64::decode(&mut body)?;
        let name = Bytes::decode(&mut body)?;
        let cookie = u64::decode(&mut body)?;
        let attr = decode_post_op_attr(&mut body)?;
        let handle = if bool::decode(&mut body)? {
            Some(decode_fh(&mut body)?)
        } else {
            None
        };
        entries.push(DirEntryPlus {
            fileid,
            name,
            cookie,
            attr,
            handle,
        });
    }
    let eof = bool::decode(&mut body)?;
    Ok(DirPage {
        entries,
        verifier,
        eof,
    })
}

// ============================================================================
// READ / WRITE
// ============================================================================

pub fn encode_read(fh: &FileHandle, offset: u64, count: u32) -> BytesMut {
    let mut buf = BytesMut::new();
    fh.encode(&mut buf);
    offset.encode(&mut buf);
    count.encode(&mut buf);
    buf
}

/// Returns the data read and whether the end of file was reached.
pub fn decode_read(mut body: Bytes) -> Result<(Bytes, bool)> {
    check_status(u32::decode(&mut body)?)?;
    let _attr = decode_post_op_attr(&mut body)?;
    let _count = u32::decode(&mut body)?;
    let eof = bool::decode(&mut body)?;
    let data = Bytes::decode(&mut body)?;
    Ok((data, eof))
}

pub fn encode_write(fh: &FileHandle, offset: u64, data: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(data.len() + 96);
    fh.encode(&mut buf);
    offset.encode(&mut buf);
    (data.len() as u32).encode(&mut buf);
    FILE_SYNC.encode(&mut buf);
    data.encode(&mut buf);
    buf
}

/// Returns the number of bytes the server committed.
pub fn decode_write(mut body: Bytes) -> Result<u32> {
    check_status(u32::decode(&mut body)?)?;
    skip_wcc_data(&mut body)?;
    let count = u32::decode(&mut body)?;
    let _committed = u32::decode(&mut body)?;
    skip(&mut body, NFS3_WRITEVERFSIZE)?;
    Ok(count)
}

// ============================================================================
// CREATE / MKDIR
// ============================================================================

/// CREATE in UNCHECKED mode: creates the file, or applies `attr` to an
/// existing one.
pub fn encode_create(args: DirOpArgs<'_>, attr: SetAttr) -> BytesMut {
    let mut buf = BytesMut::new();
    args.encode(&mut buf);
    CREATE_UNCHECKED.encode(&mut buf);
    attr.encode(&mut buf);
    buf
}

pub fn encode_mkdir(args: DirOpArgs<'_>, attr: SetAttr) -> BytesMut {
    let mut buf = BytesMut::new();
    args.encode(&mut buf);
    attr.encode(&mut buf);
    buf
}

/// Shared result layout of CREATE and MKDIR. The handle is optional on the
/// wire; callers fall back to LOOKUP when it is absent.
pub fn decode_create(mut body: Bytes) -> Result<Option<Bytes>> {
    check_status(u32::decode(&mut body)?)?;
    let fh = if bool::decode(&mut body)? {
        Some(decode_fh(&mut body)?)
    } else {
        None
    };
    let _attr = decode_post_op_attr(&mut body)?;
    skip_wcc_data(&mut body)?;
    Ok(fh)
}

// ============================================================================
// REMOVE / RMDIR
// ============================================================================

pub fn encode_remove(args: DirOpArgs<'_>) -> BytesMut {
    encode_lookup(args)
}

/// Shared result layout of REMOVE and RMDIR: status then `wcc_data`.
pub fn decode_remove(mut body: Bytes) -> Result<()> {
    check_status(u32::decode(&mut body)?)
}

// ============================================================================
// FSINFO
// ============================================================================

/// The subset of `FSINFO3resok` the client uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsInfo {
    pub rtmax: u32,
    pub rtpref: u32,
    pub wtmax: u32,
    pub wtpref: u32,
    pub dtpref: u32,
    pub maxfilesize: u64,
}

pub fn encode_fsinfo(root: &FileHandle) -> BytesMut {
    let mut buf = BytesMut::new();
    root.encode(&mut buf);
    buf
}

pub fn decode_fsinfo(mut body: Bytes) -> Result<FsInfo> {
    check_status(u32::decode(&mut body)?)?;
    let _attr = decode_post_op_attr(&mut body)?;
    let rtmax = u32::decode(&mut body)?;
    let rtpref = u32::decode(&mut body)?;
    let _rtmult = u32::decode(&mut body)?;
    let wtmax = u32::decode(&mut body)?;
    let wtpref = u32::decode(&mut body)?;
    let _wtmult = u32::decode(&mut body)?;
    let dtpref = u32::decode(&mut body)?;
    let maxfilesize = u64::decode(&mut body)?;
    Ok(FsInfo {
        rtmax,
        rtpref,
        wtmax,
        wtpref,
        dtpref,
        maxfilesize,
    })
}
