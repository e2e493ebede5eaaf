//! Port mapper client (RFC 1833, version 2): service discovery.

use std::time::Duration;

use bytes::BytesMut;
use tracing::debug;

use crate::error::{NfsError, Result};
use crate::rpc::{OpaqueAuth, RpcClient};
use crate::xdr::{Decode, Encode, XdrError};

/// Port mapper program number.
pub const PROGRAM: u32 = 100000;
/// Port mapper protocol version.
pub const VERSION: u32 = 2;
/// Well-known port mapper port.
pub const DEFAULT_PORT: u16 = 111;

pub const PMAPPROC_GETPORT: u32 = 3;

const IPPROTO_TCP: u32 = 6;

/// Encode a `mapping` for GETPORT. The port field is ignored by the server.
pub fn encode_getport(program: u32, version: u32) -> BytesMut {
    let mut buf = BytesMut::with_capacity(16);
    program.encode(&mut buf);
    version.encode(&mut buf);
    IPPROTO_TCP.encode(&mut buf);
    0u32.encode(&mut buf);
    buf
}

/// A connection to a host's port mapper.
pub struct Portmapper {
    host: String,
    rpc: RpcClient,
}

impl Portmapper {
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let rpc = RpcClient::connect(host, port, PROGRAM, VERSION, timeout)?;
        Ok(Self {
            host: host.to_string(),
            rpc,
        })
    }

    /// Look up the TCP port of `program`/`version`.
    ///
    /// A zero reply means the service is not registered.
    pub fn getport(&mut self, service: &'static str, program: u32, version: u32) -> Result<u16> {
        let args = encode_getport(program, version);
        let mut body = self.rpc.call(PMAPPROC_GETPORT, &OpaqueAuth::null(), &args)?;
        let port = u32::decode(&mut body)?;
        if port == 0 {
            return Err(NfsError::ServiceUnavailable {
                service,
                host: self.host.clone(),
            });
        }
        let port = u16::try_from(port).map_err(|_| XdrError::InvalidDiscriminant {
            what: "port",
            value: port,
        })?;
        debug!(service, program, version, port, "Located RPC service");
        Ok(port)
    }
}
