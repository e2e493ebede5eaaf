//! ONC RPC version 2 (RFC 5531) over TCP.
//!
//! [`RpcClient::call`] is the single entry point for issuing a procedure:
//! the caller supplies the procedure number, credential and already-encoded
//! arguments, and gets back the raw result body. Argument and result layouts
//! live with the protocol modules that own them (`portmap`, `mount`, `nfs3`,
//! `rename`).

mod auth;
pub mod record;

pub use auth::{AUTH_NULL, AUTH_UNIX, Credential, MAX_AUTH_BYTES, OpaqueAuth};

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tracing::{debug, trace};

use crate::error::{NfsError, Result};
use crate::xdr::{Decode, Encode};

/// RPC protocol version carried in every call.
pub const RPC_VERSION: u32 = 2;

const MSG_CALL: u32 = 0;
const MSG_REPLY: u32 = 1;

const MSG_ACCEPTED: u32 = 0;
const MSG_DENIED: u32 = 1;

const ACCEPT_SUCCESS: u32 = 0;
const ACCEPT_PROG_UNAVAIL: u32 = 1;
const ACCEPT_PROG_MISMATCH: u32 = 2;
const ACCEPT_PROC_UNAVAIL: u32 = 3;
const ACCEPT_GARBAGE_ARGS: u32 = 4;
const ACCEPT_SYSTEM_ERR: u32 = 5;

const REJECT_RPC_MISMATCH: u32 = 0;
const REJECT_AUTH_ERROR: u32 = 1;

/// Replies with a stale xid that are skipped before giving up.
const MAX_STALE_REPLIES: usize = 16;

/// Failures reported by the RPC layer itself, before any program-level
/// status is looked at.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("remote does not export program {program}")]
    ProgramUnavailable { program: u32 },

    #[error("program {program} supports versions {low}..={high}")]
    ProgramMismatch { program: u32, low: u32, high: u32 },

    #[error("procedure {procedure} unavailable")]
    ProcedureUnavailable { procedure: u32 },

    #[error("server could not decode arguments")]
    GarbageArgs,

    #[error("server system error")]
    SystemError,

    #[error("unknown accept status {0}")]
    UnknownAcceptStatus(u32),

    #[error("RPC version mismatch: server supports {low}..={high}")]
    RpcMismatch { low: u32, high: u32 },

    #[error("authentication rejected (auth_stat {0})")]
    AuthError(u32),

    #[error("unknown reply status {0}")]
    UnknownReplyStatus(u32),

    #[error("expected a reply message, got type {0}")]
    NotAReply(u32),

    #[error("no reply matching xid {0:#010x}")]
    XidMismatch(u32),
}

/// Identity of a call: which program, version and procedure it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallHeader {
    pub xid: u32,
    pub program: u32,
    pub version: u32,
    pub procedure: u32,
}

/// Encode a complete `rpc_msg` CALL: header, credential, AUTH_NULL
/// verifier, then the procedure arguments.
pub fn encode_call(header: &CallHeader, credential: &OpaqueAuth, args: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(40 + credential.body.len() + args.len());
    header.xid.encode(&mut buf);
    MSG_CALL.encode(&mut buf);
    RPC_VERSION.encode(&mut buf);
    header.program.encode(&mut buf);
    header.version.encode(&mut buf);
    header.procedure.encode(&mut buf);
    credential.encode(&mut buf);
    OpaqueAuth::null().encode(&mut buf);
    buf.extend_from_slice(args);
    buf
}

/// Decode a reply message, returning its xid and the result body when the
/// call was accepted and executed.
pub fn decode_reply(mut reply: Bytes, header: &CallHeader) -> Result<(u32, Bytes)> {
    let xid = u32::decode(&mut reply)?;
    let msg_type = u32::decode(&mut reply)?;
    if msg_type != MSG_REPLY {
        return Err(RpcError::NotAReply(msg_type).into());
    }

    match u32::decode(&mut reply)? {
        MSG_ACCEPTED => {
            let _verifier = OpaqueAuth::decode(&mut reply)?;
            match u32::decode(&mut reply)? {
                ACCEPT_SUCCESS => Ok((xid, reply)),
                ACCEPT_PROG_UNAVAIL => Err(RpcError::ProgramUnavailable {
                    program: header.program,
                }
                .into()),
                ACCEPT_PROG_MISMATCH => {
                    let low = u32::decode(&mut reply)?;
                    let high = u32::decode(&mut reply)?;
                    Err(RpcError::ProgramMismatch {
                        program: header.program,
                        low,
                        high,
                    }
                    .into())
                }
                ACCEPT_PROC_UNAVAIL => Err(RpcError::ProcedureUnavailable {
                    procedure: header.procedure,
                }
                .into()),
                ACCEPT_GARBAGE_ARGS => Err(RpcError::GarbageArgs.into()),
                ACCEPT_SYSTEM_ERR => Err(RpcError::SystemError.into()),
                other => Err(RpcError::UnknownAcceptStatus(other).into()),
            }
        }
        MSG_DENIED => match u32::decode(&mut reply)? {
            REJECT_RPC_MISMATCH => {
                let low = u32::decode(&mut reply)?;
                let high = u32::decode(&mut reply)?;
                Err(RpcError::RpcMismatch { low, high }.into())
            }
            REJECT_AUTH_ERROR => Err(RpcError::AuthError(u32::decode(&mut reply)?).into()),
            other => Err(RpcError::UnknownReplyStatus(other).into()),
        },
        other => Err(RpcError::UnknownReplyStatus(other).into()),
    }
}

/// Peek at the xid of a raw reply without consuming it.
fn reply_xid(reply: &[u8]) -> Option<u32> {
    reply
        .get(..4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// A connection to one RPC program on one server.
///
/// Calls are strictly sequential: one request is written, then replies are
/// read until the matching xid arrives.
#[derive(Debug)]
pub struct RpcClient<S = TcpStream> {
    stream: S,
    program: u32,
    version: u32,
    next_xid: u32,
}

impl RpcClient<TcpStream> {
    /// Open a TCP connection to `host:port` for `program`/`version`.
    ///
    /// `timeout` bounds connection setup and every subsequent read/write.
    pub fn connect(
        host: &str,
        port: u16,
        program: u32,
        version: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let mut last_err = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    stream.set_nodelay(true)?;
                    debug!(%addr, program, version, "RPC connection established");
                    return Ok(Self::new(stream, program, version));
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(NfsError::Io(last_err.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no addresses resolved for {host}"),
            )
        })))
    }

    /// A second handle to the socket, used to interrupt a blocked call from
    /// another thread.
    pub fn try_clone_stream(&self) -> std::io::Result<TcpStream> {
        self.stream.try_clone()
    }

    /// Shut down both halves of the connection.
    pub fn shutdown(&self) {
        if let Err(e) = self.stream.shutdown(std::net::Shutdown::Both) {
            trace!(error = %e, "RPC shutdown on already-closed stream");
        }
    }
}

impl<S: Read + Write> RpcClient<S> {
    /// Wrap an established stream. The initial xid is random.
    pub fn new(stream: S, program: u32, version: u32) -> Self {
        Self {
            stream,
            program,
            version,
            next_xid: rand::random(),
        }
    }

    pub fn program(&self) -> u32 {
        self.program
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Issue `procedure` with pre-encoded `args` and return the raw result
    /// body of an accepted, successful reply.
    pub fn call(&mut self, procedure: u32, credential: &OpaqueAuth, args: &[u8]) -> Result<Bytes> {
        let header = CallHeader {
            xid: self.next_xid,
            program: self.program,
            version: self.version,
            procedure,
        };
        self.next_xid = self.next_xid.wrapping_add(1);

        let message = encode_call(&header, credential, args);
        debug!(
            xid = header.xid,
            program = header.program,
            procedure,
            bytes = message.len(),
            "RPC call"
        );
        record::write_record(&mut self.stream, &message)?;

        for _ in 0..MAX_STALE_REPLIES {
            let reply = record::read_record(&mut self.stream)?.freeze();
            match reply_xid(&reply) {
                Some(xid) if xid == header.xid => {
                    let (_, body) = decode_reply(reply, &header)?;
                    trace!(xid = header.xid, bytes = body.len(), "RPC reply");
                    return Ok(body);
                }
                other => {
                    debug!(expected = header.xid, got = ?other, "Discarding stale RPC reply");
                }
            }
        }
        Err(RpcError::XidMismatch(header.xid).into())
    }
}
