//! XDR (RFC 4506) encoding primitives.
//!
//! Every item on the wire is a multiple of four bytes, big-endian. Variable
//! length opaque data and strings carry a u32 length prefix and are padded
//! with zero bytes up to the next four-byte boundary.
//!
//! Encoding appends to a [`BytesMut`]; decoding consumes from the front of a
//! [`Bytes`] so a reply body can be walked field by field without copying.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Errors raised while decoding XDR data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum XdrError {
    /// The buffer ended before the item was complete.
    #[error("truncated XDR data: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes required to decode the item.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// A variable-length item exceeded its declared maximum.
    #[error("XDR item of {len} bytes exceeds maximum of {max}")]
    TooLong {
        /// Length announced on the wire.
        len: usize,
        /// Protocol maximum for the item.
        max: usize,
    },

    /// A boolean was neither 0 nor 1.
    #[error("invalid XDR boolean: {0}")]
    InvalidBool(u32),

    /// An enum or union discriminant had no defined arm.
    #[error("invalid discriminant {value} for {what}")]
    InvalidDiscriminant {
        /// Name of the type being decoded.
        what: &'static str,
        /// Value seen on the wire.
        value: u32,
    },
}

/// Number of zero bytes needed to pad `len` to a four-byte boundary.
#[inline]
pub const fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Types that can be written in XDR form.
pub trait Encode {
    /// Append the XDR representation of `self` to `buf`.
    fn encode(&self, buf: &mut BytesMut);
}

/// Types that can be read from XDR form.
pub trait Decode: Sized {
    /// Consume the XDR representation of `Self` from the front of `buf`.
    fn decode(buf: &mut Bytes) -> Result<Self, XdrError>;
}

impl Encode for u32 {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(*self);
    }
}

impl Encode for u64 {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u64(*self);
    }
}

impl Encode for bool {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(u32::from(*self));
    }
}

/// Variable-length opaque data.
impl Encode for [u8] {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.len() as u32);
        encode_fixed(buf, self);
    }
}

impl Encode for str {
    fn encode(&self, buf: &mut BytesMut) {
        self.as_bytes().encode(buf);
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, buf: &mut BytesMut) {
        (**self).encode(buf);
    }
}

impl Decode for u32 {
    fn decode(buf: &mut Bytes) -> Result<Self, XdrError> {
        ensure(buf, 4)?;
        Ok(buf.get_u32())
    }
}

impl Decode for u64 {
    fn decode(buf: &mut Bytes) -> Result<Self, XdrError> {
        ensure(buf, 8)?;
        Ok(buf.get_u64())
    }
}

impl Decode for bool {
    fn decode(buf: &mut Bytes) -> Result<Self, XdrError> {
        match u32::decode(buf)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(XdrError::InvalidBool(other)),
        }
    }
}

/// Variable-length opaque data without an explicit bound.
impl Decode for Bytes {
    fn decode(buf: &mut Bytes) -> Result<Self, XdrError> {
        decode_opaque(buf, usize::MAX)
    }
}

/// Strings are decoded lossily: servers are free to hand out names that are
/// not valid UTF-8.
impl Decode for String {
    fn decode(buf: &mut Bytes) -> Result<Self, XdrError> {
        let raw = decode_opaque(buf, usize::MAX)?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

/// Write fixed-length opaque data followed by its padding.
pub fn encode_fixed(buf: &mut BytesMut, data: &[u8]) {
    buf.put_slice(data);
    buf.put_bytes(0, padding(data.len()));
}

/// Read `len` bytes of fixed-length opaque data and skip its padding.
pub fn decode_fixed(buf: &mut Bytes, len: usize) -> Result<Bytes, XdrError> {
    let padded = len + padding(len);
    ensure(buf, padded)?;
    let data = buf.split_to(len);
    buf.advance(padding(len));
    Ok(data)
}

/// Read variable-length opaque data of at most `max` bytes.
pub fn decode_opaque(buf: &mut Bytes, max: usize) -> Result<Bytes, XdrError> {
    let len = u32::decode(buf)? as usize;
    if len > max {
        return Err(XdrError::TooLong { len, max });
    }
    decode_fixed(buf, len)
}

/// Read an XDR `optional` (`*T`): a boolean followed by the value when true.
pub fn decode_optional<T: Decode>(buf: &mut Bytes) -> Result<Option<T>, XdrError> {
    if bool::decode(buf)? {
        T::decode(buf).map(Some)
    } else {
        Ok(None)
    }
}

/// Skip `len` raw bytes.
pub fn skip(buf: &mut Bytes, len: usize) -> Result<(), XdrError> {
    ensure(buf, len)?;
    buf.advance(len);
    Ok(())
}

fn ensure(buf: &Bytes, needed: usize) -> Result<(), XdrError> {
    if buf.remaining() < needed {
        return Err(XdrError::Truncated {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}
