//! NFSPROC3_RENAME (RFC 1813 §3.3.14).

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::error::{Result, check_status};
use crate::lookup::{lookup, split_path};
use crate::mount::MountSession;
use crate::nfs3::{DirOpArgs, NFSPROC3_RENAME};
use crate::xdr::{Decode, Encode};

/// `RENAME3args`: source and destination as (directory, name) pairs.
#[derive(Debug, Clone, Copy)]
pub struct RenameArgs<'a> {
    pub from: DirOpArgs<'a>,
    pub to: DirOpArgs<'a>,
}

impl Encode for RenameArgs<'_> {
    fn encode(&self, buf: &mut BytesMut) {
        self.from.encode(buf);
        self.to.encode(buf);
    }
}

impl RenameArgs<'_> {
    pub fn to_bytes(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf
    }
}

/// Read the leading `nfsstat3` of a RENAME reply. The trailing `wcc_data`
/// for both directories is ignored.
pub fn decode_rename_status(mut body: Bytes) -> Result<()> {
    check_status(u32::decode(&mut body)?)
}

/// Rename `from` to `to`. Both paths are relative to the export root.
pub fn rename(session: &MountSession, from: &str, to: &str) -> Result<()> {
    let (from_parent, from_name) = split_path(from)?;
    let (to_parent, to_name) = split_path(to)?;
    let (from_dir, _) = lookup(session, from_parent)?;
    let (to_dir, _) = lookup(session, to_parent)?;
    session.check_handle(&from_dir)?;
    session.check_handle(&to_dir)?;

    let args = RenameArgs {
        from: DirOpArgs {
            dir: &from_dir,
            name: from_name.as_bytes(),
        },
        to: DirOpArgs {
            dir: &to_dir,
            name: to_name.as_bytes(),
        },
    };
    decode_rename_status(session.call(NFSPROC3_RENAME, &args.to_bytes())?)?;
    debug!(from, to, "Renamed");
    Ok(())
}
