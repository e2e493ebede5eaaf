//! Mount handshake and session lifetime.
//!
//! A [`MountSession`] is created by the two-phase handshake:
//!
//! 1. **Discovery**: ask the host's port mapper where MOUNT v3 listens.
//! 2. **Bind**: call `MNT` with the caller's credential and the export path,
//!    receiving the export's root file handle.
//!
//! The NFS service is then located the same way and `FSINFO` establishes
//! transfer sizes. Closing sends `UMNT` and drops both transports. Close is
//! latched: only the first call does any work.

use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cancel::CloseLatch;
use crate::error::{NfsError, Result};
use crate::nfs3::{self, FileHandle, FsInfo, SessionId, decode_fh};
use crate::portmap::{self, Portmapper};
use crate::rpc::{Credential, OpaqueAuth, RpcClient};
use crate::status::MountStatus;
use crate::xdr::{Decode, Encode};

/// MOUNT program number.
pub const PROGRAM: u32 = 100005;
/// MOUNT protocol version.
pub const VERSION: u32 = 3;

pub const MOUNTPROC3_MNT: u32 = 1;
pub const MOUNTPROC3_UMNT: u32 = 3;

/// Maximum length of an export path.
pub const MNTPATHLEN: usize = 1024;

/// Transfer size used when the server reports none.
pub const DEFAULT_TRANSFER_SIZE: u32 = 64 * 1024;
const MIN_TRANSFER_SIZE: u32 = 4 * 1024;
const MAX_TRANSFER_SIZE: u32 = 1024 * 1024;

/// Where to mount from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub hostname: String,
    pub export: String,
    pub portmap_port: u16,
    pub timeout: Duration,
}

impl ConnectOptions {
    pub fn new(hostname: impl Into<String>, export: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            export: export.into(),
            portmap_port: portmap::DEFAULT_PORT,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Encode `dirpath` arguments shared by MNT and UMNT.
fn encode_dirpath(export: &str) -> Result<BytesMut> {
    if export.len() > MNTPATHLEN {
        return Err(NfsError::InvalidPath(export.to_string()));
    }
    let mut buf = BytesMut::with_capacity(4 + export.len() + 3);
    export.encode(&mut buf);
    Ok(buf)
}

/// Decode `mountres3`, returning the root handle.
pub fn decode_mnt(mut body: Bytes) -> Result<Bytes> {
    let status = u32::decode(&mut body)?;
    if status != 0 {
        return Err(NfsError::Mount(MountStatus::from(status)));
    }
    let fh = decode_fh(&mut body)?;
    // auth_flavors<> follow; the client always offers AUTH_UNIX.
    Ok(fh)
}

fn clamp_transfer(size: u32) -> u32 {
    if size == 0 {
        DEFAULT_TRANSFER_SIZE
    } else {
        size.clamp(MIN_TRANSFER_SIZE, MAX_TRANSFER_SIZE)
    }
}

/// An export bound to a caller credential.
///
/// Owns two transports: one to the mount daemon (kept for `UMNT`) and one
/// to the NFS service. All NFS procedures go through [`MountSession::call`].
#[derive(Debug)]
pub struct MountSession {
    id: SessionId,
    hostname: String,
    export: String,
    credential: Credential,
    auth: OpaqueAuth,
    root: FileHandle,
    mount_rpc: Mutex<Option<RpcClient>>,
    nfs_rpc: Mutex<Option<RpcClient>>,
    /// Second handle on the NFS socket so `close` can unblock an in-flight call.
    nfs_socket: Option<TcpStream>,
    rtmax: u32,
    wtmax: u32,
    closed: CloseLatch,
}

impl MountSession {
    /// Perform the mount handshake.
    ///
    /// Fails with [`NfsError::NotFound`] before touching the network when the
    /// hostname is empty.
    pub fn connect(options: &ConnectOptions, credential: Credential) -> Result<Self> {
        if options.hostname.is_empty() {
            return Err(NfsError::NotFound("hostname".to_string()));
        }
        let host = options.hostname.as_str();
        let auth = credential.to_auth();

        let mut portmapper = Portmapper::connect(host, options.portmap_port, options.timeout)?;
        let mount_port = portmapper.getport("mountd", PROGRAM, VERSION)?;
        let mut mount_rpc = RpcClient::connect(host, mount_port, PROGRAM, VERSION, options.timeout)?;

        let args = encode_dirpath(&options.export)?;
        let root = decode_mnt(mount_rpc.call(MOUNTPROC3_MNT, &auth, &args)?)?;
        debug!(host, export = %options.export, "Export bound");

        let nfs_rpc = portmapper
            .getport("nfs", nfs3::PROGRAM, nfs3::VERSION)
            .and_then(|port| {
                RpcClient::connect(host, port, nfs3::PROGRAM, nfs3::VERSION, options.timeout)
            });
        let nfs_rpc = match nfs_rpc {
            Ok(rpc) => rpc,
            Err(e) => {
                release_export(&mut mount_rpc, &auth, &options.export);
                return Err(e);
            }
        };
        drop(portmapper);

        let nfs_socket = nfs_rpc.try_clone_stream().ok();
        let id = SessionId::next();
        let mut session = Self {
            id,
            hostname: options.hostname.clone(),
            export: options.export.clone(),
            credential,
            auth,
            root: FileHandle::new(id, root),
            mount_rpc: Mutex::new(Some(mount_rpc)),
            nfs_rpc: Mutex::new(Some(nfs_rpc)),
            nfs_socket,
            rtmax: DEFAULT_TRANSFER_SIZE,
            wtmax: DEFAULT_TRANSFER_SIZE,
            closed: CloseLatch::new(),
        };

        // Dropping the session on error releases the export.
        let info = session.fsinfo()?;
        session.rtmax = clamp_transfer(info.rtmax);
        session.wtmax = clamp_transfer(info.wtmax);

        info!(
            host,
            export = %session.export,
            uid = session.credential.uid(),
            gid = session.credential.gid(),
            rtmax = session.rtmax,
            wtmax = session.wtmax,
            "Mounted export"
        );
        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn export(&self) -> &str {
        &self.export
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Handle of the export root.
    pub fn root(&self) -> &FileHandle {
        &self.root
    }

    /// Maximum READ size negotiated with the server.
    pub fn rtmax(&self) -> u32 {
        self.rtmax
    }

    /// Maximum WRITE size negotiated with the server.
    pub fn wtmax(&self) -> u32 {
        self.wtmax
    }

    /// Tag raw handle bytes as belonging to this session.
    pub(crate) fn adopt(&self, data: Bytes) -> FileHandle {
        FileHandle::new(self.id, data)
    }

    /// Reject handles obtained from another session.
    pub fn check_handle(&self, handle: &FileHandle) -> Result<()> {
        if handle.session() == self.id {
            Ok(())
        } else {
            Err(NfsError::ForeignHandle)
        }
    }

    /// Issue an NFS procedure with the session credential and return the
    /// raw result body.
    pub fn call(&self, procedure: u32, args: &[u8]) -> Result<Bytes> {
        let mut guard = self.nfs_rpc.lock();
        let rpc = guard.as_mut().ok_or(NfsError::SessionClosed)?;
        rpc.call(procedure, &self.auth, args)
    }

    fn fsinfo(&self) -> Result<FsInfo> {
        let args = nfs3::encode_fsinfo(&self.root);
        nfs3::decode_fsinfo(self.call(nfs3::NFSPROC3_FSINFO, &args)?)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_fired()
    }

    /// Release the export binding, then the transports.
    ///
    /// Safe to call any number of times from any thread; only the first call
    /// has an effect. A failing `UMNT` is logged, not returned.
    pub fn close(&self) {
        if !self.closed.fire() {
            return;
        }

        if let Some(socket) = &self.nfs_socket {
            let _ = socket.shutdown(Shutdown::Both);
        }
        if let Some(mut mount_rpc) = self.mount_rpc.lock().take() {
            release_export(&mut mount_rpc, &self.auth, &self.export);
            mount_rpc.shutdown();
        }
        self.nfs_rpc.lock().take();

        info!(host = %self.hostname, export = %self.export, "Unmounted export");
    }
}

impl Drop for MountSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Best-effort `UMNT`.
fn release_export(mount_rpc: &mut RpcClient, auth: &OpaqueAuth, export: &str) {
    let result = encode_dirpath(export).and_then(|args| mount_rpc.call(MOUNTPROC3_UMNT, auth, &args));
    if let Err(e) = result {
        warn!(export, error = %e, "UMNT failed");
    }
}
