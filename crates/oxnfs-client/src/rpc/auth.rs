//! RPC authentication: AUTH_NULL and AUTH_UNIX (RFC 5531 §8, appendix A).

use bytes::{Bytes, BytesMut};

use crate::xdr::{Decode, Encode, XdrError, decode_opaque};

/// `AUTH_NONE` flavor.
pub const AUTH_NULL: u32 = 0;
/// `AUTH_SYS` / `AUTH_UNIX` flavor.
pub const AUTH_UNIX: u32 = 1;

/// Maximum body size of an `opaque_auth`.
pub const MAX_AUTH_BYTES: usize = 400;

/// Maximum length of the AUTH_UNIX machine name.
const MAX_MACHINE_NAME: usize = 255;

/// An RPC `opaque_auth`: a flavor plus its flavor-specific body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueAuth {
    /// Authentication flavor.
    pub flavor: u32,
    /// Encoded flavor body.
    pub body: Bytes,
}

impl OpaqueAuth {
    /// The empty AUTH_NULL credential/verifier.
    pub const fn null() -> Self {
        Self {
            flavor: AUTH_NULL,
            body: Bytes::new(),
        }
    }
}

impl Encode for OpaqueAuth {
    fn encode(&self, buf: &mut BytesMut) {
        self.flavor.encode(buf);
        self.body.as_ref().encode(buf);
    }
}

impl Decode for OpaqueAuth {
    fn decode(buf: &mut Bytes) -> Result<Self, XdrError> {
        let flavor = u32::decode(buf)?;
        let body = decode_opaque(buf, MAX_AUTH_BYTES)?;
        Ok(Self { flavor, body })
    }
}

/// The caller's identity as presented to the server.
///
/// Built once per session from resolved ids; the stamp is picked at random
/// when the credential is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    machine_name: String,
    uid: u32,
    gid: u32,
    stamp: u32,
}

impl Credential {
    /// Create an AUTH_UNIX credential.
    ///
    /// Machine names longer than 255 bytes are truncated on a character
    /// boundary.
    pub fn new(machine_name: impl Into<String>, uid: u32, gid: u32) -> Self {
        Self::with_stamp(machine_name, uid, gid, rand::random())
    }

    /// Create a credential with an explicit stamp (deterministic encodings).
    pub fn with_stamp(machine_name: impl Into<String>, uid: u32, gid: u32, stamp: u32) -> Self {
        let mut machine_name = machine_name.into();
        if machine_name.len() > MAX_MACHINE_NAME {
            let mut cut = MAX_MACHINE_NAME;
            while !machine_name.is_char_boundary(cut) {
                cut -= 1;
            }
            machine_name.truncate(cut);
        }
        Self {
            machine_name,
            uid,
            gid,
            stamp,
        }
    }

    pub fn machine_name(&self) -> &str {
        &self.machine_name
    }

    pub fn uid(&self) -> u32 {
        self.uid
    }

    pub fn gid(&self) -> u32 {
        self.gid
    }

    /// Encode as an `authsys_parms` body wrapped in an `opaque_auth`.
    ///
    /// The supplementary group list is sent empty.
    pub fn to_auth(&self) -> OpaqueAuth {
        let mut body = BytesMut::with_capacity(20 + self.machine_name.len());
        self.stamp.encode(&mut body);
        self.machine_name.as_str().encode(&mut body);
        self.uid.encode(&mut body);
        self.gid.encode(&mut body);
        0u32.encode(&mut body);
        OpaqueAuth {
            flavor: AUTH_UNIX,
            body: body.freeze(),
        }
    }
}
