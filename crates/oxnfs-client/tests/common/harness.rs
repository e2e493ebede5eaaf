//! In-process NFSv3 server for integration tests.
//!
//! `FakeServer` listens on one loopback port and answers PORTMAP, MOUNT and
//! NFS calls on it, so the port mapper simply points the client back at the
//! same port. The exported tree lives in memory. Every call is counted per
//! (program, procedure), and individual NFS procedures can be made to fail
//! with a chosen status.

use std::collections::HashMap;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;

use oxnfs_client::rpc::OpaqueAuth;
use oxnfs_client::rpc::record::{read_record, write_record};
use oxnfs_client::xdr::{Decode, Encode, encode_fixed, skip};
use oxnfs_client::{CredentialCache, NfsShare, ShareConfig, mount, nfs3, portmap};

/// Export path the fake mount daemon accepts.
pub const EXPORT: &str = "/export";
/// Uid/gid the default test share authenticates as.
pub const TEST_UID: u32 = 1001;
pub const TEST_GID: u32 = 100;

const ROOT_ID: u64 = 1;
const WRITE_VERIFIER: [u8; 8] = *b"fakeverf";

// nfsstat3 values the server produces on its own.
const NFS3_OK: u32 = 0;
const NFS3ERR_NOENT: u32 = 2;
const NFS3ERR_EXIST: u32 = 17;
const NFS3ERR_NOTDIR: u32 = 20;
const NFS3ERR_ISDIR: u32 = 21;
const NFS3ERR_NOTEMPTY: u32 = 66;
const NFS3ERR_STALE: u32 = 70;

#[derive(Debug, Clone)]
enum NodeKind {
    Dir(Vec<(Vec<u8>, u64)>),
    File(Vec<u8>),
    Symlink,
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: u64,
    uid: u32,
    gid: u32,
    mode: u32,
    ctime: u32,
    mtime: u32,
}

impl Node {
    fn ftype(&self) -> u32 {
        match self.kind {
            NodeKind::File(_) => 1,
            NodeKind::Dir(_) => 2,
            NodeKind::Symlink => 5,
        }
    }

    fn size(&self) -> u64 {
        match &self.kind {
            NodeKind::File(data) => data.len() as u64,
            NodeKind::Dir(_) => 4096,
            NodeKind::Symlink => 8,
        }
    }
}

struct State {
    nodes: HashMap<u64, Node>,
    next_id: u64,
    clock: u32,
    mount_registered: bool,
    nfs_registered: bool,
    mnt_status: u32,
    forced: HashMap<u32, u32>,
    calls: HashMap<(u32, u32), usize>,
    page_size: usize,
    rtmax: u32,
    wtmax: u32,
    omit_create_handle: bool,
    read_delay: Option<Duration>,
    caller: (u32, u32),
    last_credential: Option<(String, u32, u32)>,
}

impl State {
    fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT_ID,
            Node {
                kind: NodeKind::Dir(Vec::new()),
                parent: ROOT_ID,
                uid: 0,
                gid: 0,
                mode: 0o755,
                ctime: 1_700_000_000,
                mtime: 1_700_000_000,
            },
        );
        Self {
            nodes,
            next_id: ROOT_ID + 1,
            clock: 1_700_000_000,
            mount_registered: true,
            nfs_registered: true,
            mnt_status: 0,
            forced: HashMap::new(),
            calls: HashMap::new(),
            page_size: 64,
            rtmax: 64 * 1024,
            wtmax: 64 * 1024,
            omit_create_handle: false,
            read_delay: None,
            caller: (0, 0),
            last_credential: None,
        }
    }

    fn tick(&mut self) -> u32 {
        self.clock += 1;
        self.clock
    }

    fn children(&self, dir: u64) -> Option<&Vec<(Vec<u8>, u64)>> {
        match &self.nodes.get(&dir)?.kind {
            NodeKind::Dir(children) => Some(children),
            _ => None,
        }
    }

    fn child(&self, dir: u64, name: &[u8]) -> Result<u64, u32> {
        let node = self.nodes.get(&dir).ok_or(NFS3ERR_STALE)?;
        match name {
            b"" | b"." => return Ok(dir),
            b".." => return Ok(node.parent),
            _ => {}
        }
        let children = self.children(dir).ok_or(NFS3ERR_NOTDIR)?;
        children
            .iter()
            .find(|(n, _)| n.as_slice() == name)
            .map(|(_, id)| *id)
            .ok_or(NFS3ERR_NOENT)
    }

    /// Resolve a possibly multi-segment name relative to `dir`.
    fn resolve(&self, dir: u64, path: &[u8]) -> Result<u64, u32> {
        path.split(|b| *b == b'/')
            .filter(|s| !s.is_empty())
            .try_fold(dir, |cur, seg| self.child(cur, seg))
    }

    fn insert(&mut self, dir: u64, name: &[u8], kind: NodeKind, uid: u32, gid: u32, mode: u32) -> Result<u64, u32> {
        if self.children(dir).is_none() {
            return Err(NFS3ERR_NOTDIR);
        }
        let id = self.next_id;
        self.next_id += 1;
        let now = self.tick();
        self.nodes.insert(
            id,
            Node {
                kind,
                parent: dir,
                uid,
                gid,
                mode,
                ctime: now,
                mtime: now,
            },
        );
        if let Some(NodeKind::Dir(children)) = self.nodes.get_mut(&dir).map(|n| &mut n.kind) {
            children.push((name.to_vec(), id));
        }
        Ok(id)
    }

    fn unlink(&mut self, dir: u64, name: &[u8]) {
        if let Some(NodeKind::Dir(children)) = self.nodes.get_mut(&dir).map(|n| &mut n.kind) {
            children.retain(|(n, _)| n.as_slice() != name);
        }
    }

    fn split_parent<'a>(&self, path: &'a str) -> (u64, &'a str) {
        let path = path.trim_matches('/');
        match path.rfind('/') {
            Some(idx) => (
                self.resolve(ROOT_ID, path[..idx].as_bytes()).expect("parent exists"),
                &path[idx + 1..],
            ),
            None => (ROOT_ID, path),
        }
    }
}

/// A running fake server. Accept threads stop with the process.
pub struct FakeServer {
    port: u16,
    state: Arc<Mutex<State>>,
}

impl FakeServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let port = listener.local_addr().expect("local addr").port();
        let state = Arc::new(Mutex::new(State::new()));

        let accept_state = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let state = Arc::clone(&accept_state);
                thread::spawn(move || serve_connection(stream, &state, port));
            }
        });

        Self { port, state }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Configuration pointing at this server as uid 1001 / gid 100.
    pub fn config(&self) -> ShareConfig {
        let mut config = ShareConfig::new("127.0.0.1", EXPORT);
        config.portmap_port = self.port;
        config.uid = TEST_UID.to_string();
        config.gid = TEST_GID.to_string();
        config.timeout = Duration::from_secs(5);
        config
    }

    pub fn share(&self) -> NfsShare {
        NfsShare::new(self.config(), &CredentialCache::default()).expect("valid config")
    }

    // ------------------------------------------------------------------
    // Call accounting and fault injection
    // ------------------------------------------------------------------

    pub fn calls(&self, program: u32, procedure: u32) -> usize {
        self.state.lock().calls.get(&(program, procedure)).copied().unwrap_or(0)
    }

    pub fn nfs_calls(&self, procedure: u32) -> usize {
        self.calls(nfs3::PROGRAM, procedure)
    }

    pub fn umnt_calls(&self) -> usize {
        self.calls(mount::PROGRAM, mount::MOUNTPROC3_UMNT)
    }

    pub fn reset_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Make every call of an NFS procedure fail with `status`.
    pub fn force_status(&self, procedure: u32, status: u32) {
        self.state.lock().forced.insert(procedure, status);
    }

    pub fn set_mnt_status(&self, status: u32) {
        self.state.lock().mnt_status = status;
    }

    pub fn unregister_nfs(&self) {
        self.state.lock().nfs_registered = false;
    }

    pub fn unregister_mount(&self) {
        self.state.lock().mount_registered = false;
    }

    /// Maximum entries per READDIRPLUS reply (including `.` and `..`).
    pub fn set_page_size(&self, entries: usize) {
        self.state.lock().page_size = entries.max(1);
    }

    pub fn set_transfer_sizes(&self, rtmax: u32, wtmax: u32) {
        let mut state = self.state.lock();
        state.rtmax = rtmax;
        state.wtmax = wtmax;
    }

    /// Have CREATE and MKDIR replies leave out the new handle.
    pub fn omit_create_handles(&self) {
        self.state.lock().omit_create_handle = true;
    }

    pub fn set_read_delay(&self, delay: Duration) {
        self.state.lock().read_delay = Some(delay);
    }

    /// Machine name, uid and gid of the most recent AUTH_UNIX call.
    pub fn last_credential(&self) -> Option<(String, u32, u32)> {
        self.state.lock().last_credential.clone()
    }

    // ------------------------------------------------------------------
    // Tree setup and inspection
    // ------------------------------------------------------------------

    pub fn add_dir(&self, path: &str, uid: u32, gid: u32) {
        let mut state = self.state.lock();
        let (dir, name) = state.split_parent(path);
        state
            .insert(dir, name.as_bytes(), NodeKind::Dir(Vec::new()), uid, gid, 0o755)
            .expect("insert dir");
    }

    pub fn add_file(&self, path: &str, content: &[u8], uid: u32, gid: u32) {
        let mut state = self.state.lock();
        let (dir, name) = state.split_parent(path);
        state
            .insert(dir, name.as_bytes(), NodeKind::File(content.to_vec()), uid, gid, 0o644)
            .expect("insert file");
    }

    pub fn add_symlink(&self, path: &str) {
        let mut state = self.state.lock();
        let (dir, name) = state.split_parent(path);
        state
            .insert(dir, name.as_bytes(), NodeKind::Symlink, 0, 0, 0o777)
            .expect("insert symlink");
    }

    /// Add a file whose name is arbitrary bytes to the directory at `dir`.
    pub fn add_file_named(&self, dir: &str, name: &[u8], content: &[u8]) {
        let mut state = self.state.lock();
        let dir = state.resolve(ROOT_ID, dir.as_bytes()).expect("dir exists");
        state
            .insert(dir, name, NodeKind::File(content.to_vec()), TEST_UID, TEST_GID, 0o644)
            .expect("insert file");
    }

    /// Whether the directory at `dir` has an entry with exactly these bytes.
    pub fn has_entry(&self, dir: &str, name: &[u8]) -> bool {
        let state = self.state.lock();
        state
            .resolve(ROOT_ID, dir.as_bytes())
            .and_then(|id| state.child(id, name))
            .is_ok()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.state.lock().resolve(ROOT_ID, path.as_bytes()).is_ok()
    }

    pub fn is_dir(&self, path: &str) -> bool {
        let state = self.state.lock();
        state
            .resolve(ROOT_ID, path.as_bytes())
            .ok()
            .and_then(|id| state.children(id))
            .is_some()
    }

    pub fn file_content(&self, path: &str) -> Option<Vec<u8>> {
        let state = self.state.lock();
        let id = state.resolve(ROOT_ID, path.as_bytes()).ok()?;
        match &state.nodes.get(&id)?.kind {
            NodeKind::File(data) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn mode(&self, path: &str) -> Option<u32> {
        let state = self.state.lock();
        let id = state.resolve(ROOT_ID, path.as_bytes()).ok()?;
        state.nodes.get(&id).map(|n| n.mode)
    }

    pub fn owner(&self, path: &str) -> Option<(u32, u32)> {
        let state = self.state.lock();
        let id = state.resolve(ROOT_ID, path.as_bytes()).ok()?;
        state.nodes.get(&id).map(|n| (n.uid, n.gid))
    }
}

// ============================================================================
// Wire handling
// ============================================================================

fn serve_connection(mut stream: TcpStream, state: &Mutex<State>, port: u16) {
    loop {
        let Ok(record) = read_record(&mut stream) else {
            return;
        };
        let Some(reply) = handle_message(record.freeze(), state, port) else {
            return;
        };
        if write_record(&mut stream, &reply).is_err() {
            return;
        }
    }
}

fn handle_message(mut msg: Bytes, state: &Mutex<State>, port: u16) -> Option<BytesMut> {
    let xid = u32::decode(&mut msg).ok()?;
    let _call = u32::decode(&mut msg).ok()?;
    let _rpcvers = u32::decode(&mut msg).ok()?;
    let program = u32::decode(&mut msg).ok()?;
    let _version = u32::decode(&mut msg).ok()?;
    let procedure = u32::decode(&mut msg).ok()?;
    let cred = OpaqueAuth::decode(&mut msg).ok()?;
    let _verf = OpaqueAuth::decode(&mut msg).ok()?;

    {
        let mut state = state.lock();
        *state.calls.entry((program, procedure)).or_default() += 1;
        if cred.flavor == oxnfs_client::rpc::AUTH_UNIX {
            let mut body = cred.body.clone();
            let _stamp = u32::decode(&mut body).ok()?;
            let machine = String::decode(&mut body).ok()?;
            let uid = u32::decode(&mut body).ok()?;
            let gid = u32::decode(&mut body).ok()?;
            state.caller = (uid, gid);
            state.last_credential = Some((machine, uid, gid));
        }
    }

    if program == nfs3::PROGRAM && procedure == nfs3::NFSPROC3_READ {
        let delay = state.lock().read_delay;
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
    }

    let body = match program {
        portmap::PROGRAM => handle_portmap(procedure, msg, &state.lock(), port),
        mount::PROGRAM => handle_mount(procedure, msg, &state.lock()),
        nfs3::PROGRAM => handle_nfs(procedure, msg, &mut state.lock()),
        _ => None,
    };

    let mut reply = BytesMut::new();
    xid.encode(&mut reply);
    1u32.encode(&mut reply); // REPLY
    0u32.encode(&mut reply); // MSG_ACCEPTED
    OpaqueAuth::null().encode(&mut reply);
    match body {
        Some(body) => {
            0u32.encode(&mut reply); // SUCCESS
            reply.extend_from_slice(&body);
        }
        None => 1u32.encode(&mut reply), // PROG_UNAVAIL
    }
    Some(reply)
}

fn handle_portmap(procedure: u32, mut args: Bytes, state: &State, port: u16) -> Option<BytesMut> {
    let mut out = BytesMut::new();
    if procedure == portmap::PMAPPROC_GETPORT {
        let program = u32::decode(&mut args).ok()?;
        let registered = match program {
            mount::PROGRAM => state.mount_registered,
            nfs3::PROGRAM => state.nfs_registered,
            _ => false,
        };
        let reply_port = if registered { u32::from(port) } else { 0 };
        reply_port.encode(&mut out);
    }
    Some(out)
}

fn handle_mount(procedure: u32, mut args: Bytes, state: &State) -> Option<BytesMut> {
    let mut out = BytesMut::new();
    match procedure {
        mount::MOUNTPROC3_MNT => {
            let path = String::decode(&mut args).ok()?;
            if state.mnt_status != 0 {
                state.mnt_status.encode(&mut out);
            } else if path != EXPORT {
                NFS3ERR_NOENT.encode(&mut out);
            } else {
                0u32.encode(&mut out);
                put_fh(&mut out, ROOT_ID);
                1u32.encode(&mut out);
                oxnfs_client::rpc::AUTH_UNIX.encode(&mut out);
            }
        }
        mount::MOUNTPROC3_UMNT | 0 => {}
        _ => return None,
    }
    Some(out)
}

fn put_fh(out: &mut BytesMut, id: u64) {
    id.to_be_bytes().as_slice().encode(out);
}

fn get_fh(args: &mut Bytes) -> Option<u64> {
    let raw = Bytes::decode(args).ok()?;
    let bytes: [u8; 8] = raw.as_ref().try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

fn put_attr(out: &mut BytesMut, id: u64, node: &Node) {
    node.ftype().encode(out);
    node.mode.encode(out);
    1u32.encode(out); // nlink
    node.uid.encode(out);
    node.gid.encode(out);
    node.size().encode(out);
    node.size().encode(out); // used
    0u32.encode(out); // rdev
    0u32.encode(out);
    1u64.encode(out); // fsid
    id.encode(out);
    node.mtime.encode(out); // atime
    0u32.encode(out);
    node.mtime.encode(out);
    0u32.encode(out);
    node.ctime.encode(out);
    0u32.encode(out);
}

fn put_post_op_attr(out: &mut BytesMut, state: &State, id: u64) {
    match state.nodes.get(&id) {
        Some(node) => {
            true.encode(out);
            put_attr(out, id, node);
        }
        None => false.encode(out),
    }
}

fn put_empty_wcc(out: &mut BytesMut) {
    false.encode(out);
    false.encode(out);
}

/// Initial mode and size from an `sattr3`.
fn get_sattr(args: &mut Bytes) -> Option<(Option<u32>, Option<u64>)> {
    let mode = if bool::decode(args).ok()? { Some(u32::decode(args).ok()?) } else { None };
    if bool::decode(args).ok()? {
        u32::decode(args).ok()?;
    }
    if bool::decode(args).ok()? {
        u32::decode(args).ok()?;
    }
    let size = if bool::decode(args).ok()? { Some(u64::decode(args).ok()?) } else { None };
    for _ in 0..2 {
        if u32::decode(args).ok()? == 2 {
            skip(args, 8).ok()?;
        }
    }
    Some((mode, size))
}

fn handle_nfs(procedure: u32, mut args: Bytes, state: &mut State) -> Option<BytesMut> {
    let mut out = BytesMut::new();
    if let Some(&status) = state.forced.get(&procedure) {
        status.encode(&mut out);
        for _ in 0..4 {
            0u32.encode(&mut out);
        }
        return Some(out);
    }

    match procedure {
        0 => {}
        nfs3::NFSPROC3_LOOKUP => {
            let dir = get_fh(&mut args)?;
            let name = Bytes::decode(&mut args).ok()?;
            match state.resolve(dir, &name) {
                Ok(id) => {
                    NFS3_OK.encode(&mut out);
                    put_fh(&mut out, id);
                    put_post_op_attr(&mut out, state, id);
                    false.encode(&mut out);
                }
                Err(status) => {
                    status.encode(&mut out);
                    false.encode(&mut out);
                }
            }
        }
        nfs3::NFSPROC3_READ => {
            let id = get_fh(&mut args)?;
            let offset = u64::decode(&mut args).ok()? as usize;
            let count = u32::decode(&mut args).ok()?.min(state.rtmax) as usize;
            match state.nodes.get(&id).map(|n| &n.kind) {
                Some(NodeKind::File(data)) => {
                    let start = offset.min(data.len());
                    let end = (start + count).min(data.len());
                    NFS3_OK.encode(&mut out);
                    false.encode(&mut out);
                    ((end - start) as u32).encode(&mut out);
                    (end == data.len()).encode(&mut out);
                    data[start..end].encode(&mut out);
                }
                Some(_) => {
                    NFS3ERR_ISDIR.encode(&mut out);
                    false.encode(&mut out);
                }
                None => {
                    NFS3ERR_STALE.encode(&mut out);
                    false.encode(&mut out);
                }
            }
        }
        nfs3::NFSPROC3_WRITE => {
            let id = get_fh(&mut args)?;
            let offset = u64::decode(&mut args).ok()? as usize;
            let _count = u32::decode(&mut args).ok()?;
            let _stable = u32::decode(&mut args).ok()?;
            let data = Bytes::decode(&mut args).ok()?;
            let accepted = data.len().min(state.wtmax as usize);
            let now = state.tick();
            match state.nodes.get_mut(&id) {
                Some(Node {
                    kind: NodeKind::File(content),
                    mtime,
                    ..
                }) => {
                    if content.len() < offset + accepted {
                        content.resize(offset + accepted, 0);
                    }
                    content[offset..offset + accepted].copy_from_slice(&data[..accepted]);
                    *mtime = now;
                    NFS3_OK.encode(&mut out);
                    put_empty_wcc(&mut out);
                    (accepted as u32).encode(&mut out);
                    nfs3::FILE_SYNC.encode(&mut out);
                    encode_fixed(&mut out, &WRITE_VERIFIER);
                }
                _ => {
                    NFS3ERR_STALE.encode(&mut out);
                    put_empty_wcc(&mut out);
                }
            }
        }
        nfs3::NFSPROC3_CREATE | nfs3::NFSPROC3_MKDIR => {
            let dir = get_fh(&mut args)?;
            let name = Bytes::decode(&mut args).ok()?;
            if procedure == nfs3::NFSPROC3_CREATE {
                let _how = u32::decode(&mut args).ok()?;
            }
            let (mode, size) = get_sattr(&mut args)?;
            let (uid, gid) = state.caller;
            let result = match (procedure, state.child(dir, &name)) {
                (nfs3::NFSPROC3_MKDIR, Ok(_)) => Err(NFS3ERR_EXIST),
                (nfs3::NFSPROC3_MKDIR, Err(NFS3ERR_NOENT)) => state.insert(
                    dir,
                    &name,
                    NodeKind::Dir(Vec::new()),
                    uid,
                    gid,
                    mode.unwrap_or(0o755),
                ),
                (_, Ok(id)) => {
                    if let Some(Node {
                        kind: NodeKind::File(content),
                        ..
                    }) = state.nodes.get_mut(&id)
                        && let Some(size) = size
                    {
                        content.resize(size as usize, 0);
                    }
                    Ok(id)
                }
                (_, Err(NFS3ERR_NOENT)) => state.insert(
                    dir,
                    &name,
                    NodeKind::File(Vec::new()),
                    uid,
                    gid,
                    mode.unwrap_or(0o644),
                ),
                (_, Err(status)) => Err(status),
            };
            match result {
                Ok(id) => {
                    NFS3_OK.encode(&mut out);
                    if state.omit_create_handle {
                        false.encode(&mut out);
                    } else {
                        true.encode(&mut out);
                        put_fh(&mut out, id);
                    }
                    put_post_op_attr(&mut out, state, id);
                    put_empty_wcc(&mut out);
                }
                Err(status) => {
                    status.encode(&mut out);
                    put_empty_wcc(&mut out);
                }
            }
        }
        nfs3::NFSPROC3_REMOVE | nfs3::NFSPROC3_RMDIR => {
            let dir = get_fh(&mut args)?;
            let name = Bytes::decode(&mut args).ok()?;
            let status = match state.child(dir, &name) {
                Ok(id) => {
                    // Some(is_empty) for directories
                    let dir_state = state.children(id).map(Vec::is_empty);
                    let status = match (dir_state, procedure) {
                        (Some(_), nfs3::NFSPROC3_REMOVE) => NFS3ERR_ISDIR,
                        (Some(false), _) => NFS3ERR_NOTEMPTY,
                        (None, nfs3::NFSPROC3_RMDIR) => NFS3ERR_NOTDIR,
                        _ => NFS3_OK,
                    };
                    if status == NFS3_OK {
                        state.unlink(dir, &name);
                        state.nodes.remove(&id);
                    }
                    status
                }
                Err(status) => status,
            };
            status.encode(&mut out);
            put_empty_wcc(&mut out);
        }
        nfs3::NFSPROC3_RENAME => {
            let from_dir = get_fh(&mut args)?;
            let from_name = Bytes::decode(&mut args).ok()?;
            let to_dir = get_fh(&mut args)?;
            let to_name = Bytes::decode(&mut args).ok()?;
            let status = match state.child(from_dir, &from_name) {
                Ok(id) if state.children(to_dir).is_some() => {
                    if let Ok(existing) = state.child(to_dir, &to_name) {
                        state.unlink(to_dir, &to_name);
                        state.nodes.remove(&existing);
                    }
                    state.unlink(from_dir, &from_name);
                    if let Some(NodeKind::Dir(children)) =
                        state.nodes.get_mut(&to_dir).map(|n| &mut n.kind)
                    {
                        children.push((to_name.to_vec(), id));
                    }
                    let now = state.tick();
                    if let Some(node) = state.nodes.get_mut(&id) {
                        node.parent = to_dir;
                        node.ctime = now;
                    }
                    NFS3_OK
                }
                Ok(_) => NFS3ERR_NOTDIR,
                Err(status) => status,
            };
            status.encode(&mut out);
            put_empty_wcc(&mut out);
            put_empty_wcc(&mut out);
        }
        nfs3::NFSPROC3_READDIRPLUS => {
            let dir = get_fh(&mut args)?;
            let cookie = u64::decode(&mut args).ok()? as usize;
            let Some(children) = state.children(dir) else {
                NFS3ERR_NOTDIR.encode(&mut out);
                false.encode(&mut out);
                return Some(out);
            };
            let parent = state.nodes[&dir].parent;
            let mut listing = vec![(b".".to_vec(), dir), (b"..".to_vec(), parent)];
            listing.extend(children.iter().cloned());

            let end = (cookie + state.page_size).min(listing.len());
            NFS3_OK.encode(&mut out);
            false.encode(&mut out);
            encode_fixed(&mut out, b"cookieve");
            for (idx, (name, id)) in listing.iter().enumerate().take(end).skip(cookie) {
                true.encode(&mut out);
                id.encode(&mut out);
                name.as_slice().encode(&mut out);
                ((idx + 1) as u64).encode(&mut out);
                put_post_op_attr(&mut out, state, *id);
                true.encode(&mut out);
                put_fh(&mut out, *id);
            }
            false.encode(&mut out);
            (end == listing.len()).encode(&mut out);
        }
        nfs3::NFSPROC3_FSINFO => {
            let _root = get_fh(&mut args)?;
            NFS3_OK.encode(&mut out);
            false.encode(&mut out);
            state.rtmax.encode(&mut out);
            state.rtmax.encode(&mut out);
            1u32.encode(&mut out);
            state.wtmax.encode(&mut out);
            state.wtmax.encode(&mut out);
            1u32.encode(&mut out);
            8192u32.encode(&mut out);
            u64::MAX.encode(&mut out);
            1u32.encode(&mut out);
            0u32.encode(&mut out);
            0x1bu32.encode(&mut out);
        }
        _ => return None,
    }
    Some(out)
}
