//! TCP record marking (RFC 5531 §11).
//!
//! A record is sent as one or more fragments. Each fragment starts with a
//! four-byte header: the high bit marks the last fragment, the low 31 bits
//! give the fragment length.

use std::io::{self, Read, Write};

use bytes::{BufMut, BytesMut};

const LAST_FRAGMENT: u32 = 0x8000_0000;
const LENGTH_MASK: u32 = 0x7fff_ffff;

/// Upper bound on a reassembled record. Large enough for a 1 MiB READ reply
/// plus headers; anything bigger is treated as a corrupt stream.
pub const MAX_RECORD_SIZE: usize = 4 * 1024 * 1024;

/// Write `payload` as a single-fragment record.
pub fn write_record<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    if payload.len() > LENGTH_MASK as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "RPC record exceeds fragment size limit",
        ));
    }
    let mut frame = BytesMut::with_capacity(4 + payload.len());
    frame.put_u32(LAST_FRAGMENT | payload.len() as u32);
    frame.put_slice(payload);
    writer.write_all(&frame)?;
    writer.flush()
}

/// Read one complete record, reassembling fragments.
///
/// Returns `UnexpectedEof` if the peer closes the stream before the first
/// header byte arrives.
pub fn read_record<R: Read>(reader: &mut R) -> io::Result<BytesMut> {
    let mut record = BytesMut::new();
    loop {
        let mut header = [0u8; 4];
        reader.read_exact(&mut header)?;
        let header = u32::from_be_bytes(header);
        let len = (header & LENGTH_MASK) as usize;

        if record.len() + len > MAX_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "RPC record of {} bytes exceeds {MAX_RECORD_SIZE}",
                    record.len() + len
                ),
            ));
        }

        let start = record.len();
        record.resize(start + len, 0);
        reader.read_exact(&mut record[start..])?;

        if header & LAST_FRAGMENT != 0 {
            return Ok(record);
        }
    }
}
