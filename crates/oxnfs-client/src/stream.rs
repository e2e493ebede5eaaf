//! Streaming file I/O bound to a resolved path.
//!
//! [`FileReader`] owns its session for as long as the stream is open and
//! tears it down when the consumer closes it or an attached [`CancelToken`]
//! fires, whichever happens first. [`FileWriter`] borrows a session owned by
//! the caller.

use std::io::{self, Read, Write};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::cancel::{CancelRegistration, CancelToken};
use crate::error::{NfsError, Result};
use crate::lookup::{lookup, lookup_in, split_path};
use crate::mount::MountSession;
use crate::nfs3::{self, DirOpArgs, FileHandle, SetAttr};
use crate::status::Nfs3Status;

/// Mode given to a file created by opening it for read.
pub const READ_MODE: u32 = 0o777;
/// Mode given to a file created for writing.
pub const WRITE_MODE: u32 = 0o644;
/// Mode given to new directories.
pub const DIR_MODE: u32 = 0o775;

/// CREATE UNCHECKED `leaf` under `parent`, falling back to LOOKUP when the
/// server omits the new handle.
pub(crate) fn create(session: &MountSession, path: &str, attr: SetAttr) -> Result<FileHandle> {
    let (parent, leaf) = split_path(path)?;
    let (dir, _) = lookup(session, parent)?;
    let args = nfs3::encode_create(DirOpArgs { dir: &dir, name: leaf.as_bytes() }, attr);
    match nfs3::decode_create(session.call(nfs3::NFSPROC3_CREATE, &args)?)? {
        Some(fh) => Ok(session.adopt(fh)),
        None => lookup_in(session, &dir, leaf.as_bytes()).map(|(fh, _)| fh),
    }
}

/// Resolve `path`, creating it with `mode` if it does not exist.
fn open_or_create(session: &MountSession, path: &str, mode: u32) -> Result<FileHandle> {
    match lookup(session, path) {
        Ok((fh, _)) => Ok(fh),
        Err(NfsError::Status(Nfs3Status::NoEnt)) => {
            debug!(path, mode = format_args!("{mode:o}"), "Creating file on open");
            create(
                session,
                path,
                SetAttr {
                    mode: Some(mode),
                    size: None,
                },
            )
        }
        Err(e) => Err(e),
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::ConnectionAborted, NfsError::SessionClosed)
}

/// A sequential reader over one remote file.
pub struct FileReader {
    session: Arc<MountSession>,
    handle: FileHandle,
    offset: u64,
    eof: bool,
    _registration: Option<CancelRegistration>,
}

impl std::fmt::Debug for FileReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileReader")
            .field("export", &self.session.export())
            .field("offset", &self.offset)
            .field("eof", &self.eof)
            .finish_non_exhaustive()
    }
}

impl FileReader {
    /// Open `path` for reading, creating it with [`READ_MODE`] if missing.
    ///
    /// The reader takes over the session: it is closed when the reader is
    /// closed or dropped, when `cancel` fires, or when opening fails.
    pub fn open(
        session: Arc<MountSession>,
        path: &str,
        cancel: Option<&CancelToken>,
    ) -> Result<Self> {
        let registration = cancel.map(|token| {
            let session = Arc::clone(&session);
            token.on_cancel(move || {
                debug!("Read stream cancelled");
                session.close();
            })
        });

        let handle = match open_or_create(&session, path, READ_MODE) {
            Ok(handle) => handle,
            Err(e) => {
                session.close();
                return Err(e);
            }
        };

        Ok(Self {
            session,
            handle,
            offset: 0,
            eof: false,
            _registration: registration,
        })
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Close the stream and its session.
    pub fn close(self) {
        self.session.close();
    }
}

impl Read for FileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.session.is_closed() {
            return Err(closed_error());
        }
        if self.eof || buf.is_empty() {
            return Ok(0);
        }

        let count = u32::try_from(buf.len()).unwrap_or(u32::MAX).min(self.session.rtmax());
        let args = nfs3::encode_read(&self.handle, self.offset, count);
        let reply = self
            .session
            .call(nfs3::NFSPROC3_READ, &args)
            .and_then(nfs3::decode_read);
        let (data, eof) = match reply {
            Ok(reply) => reply,
            Err(_) if self.session.is_closed() => return Err(closed_error()),
            Err(e) => return Err(e.into()),
        };

        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        self.offset += n as u64;
        // An empty non-final reply would otherwise spin.
        self.eof = (eof && n == data.len()) || n == 0;
        trace!(offset = self.offset, n, eof = self.eof, "READ");
        Ok(n)
    }
}

impl Drop for FileReader {
    fn drop(&mut self) {
        self.session.close();
    }
}

/// A sequential writer over one remote file, created or truncated on open.
#[derive(Debug)]
pub struct FileWriter<'s> {
    session: &'s MountSession,
    handle: FileHandle,
    offset: u64,
}

impl<'s> FileWriter<'s> {
    /// Create `path` with [`WRITE_MODE`], truncating any existing content.
    pub fn open(session: &'s MountSession, path: &str) -> Result<Self> {
        let handle = create(
            session,
            path,
            SetAttr {
                mode: Some(WRITE_MODE),
                size: Some(0),
            },
        )?;
        Ok(Self {
            session,
            handle,
            offset: 0,
        })
    }

    /// Send at most one WRITE; returns the number of bytes the server
    /// committed.
    fn send(&mut self, data: &[u8]) -> Result<usize> {
        let len = data.len().min(self.session.wtmax() as usize);
        let args = nfs3::encode_write(&self.handle, self.offset, &data[..len]);
        let count = nfs3::decode_write(self.session.call(nfs3::NFSPROC3_WRITE, &args)?)?;
        let count = (count as usize).min(len);
        self.offset += count as u64;
        Ok(count)
    }

    /// Write all of `data`, continuing after short writes.
    pub fn write_all_remote(&mut self, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            match self.send(data)? {
                0 => {
                    return Err(NfsError::Io(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "server accepted zero bytes",
                    )));
                }
                n => data = &data[n..],
            }
        }
        Ok(())
    }

    /// Bytes written so far.
    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Finish writing. Every WRITE is FILE_SYNC, so there is nothing left to
    /// commit; returns the file length.
    pub fn close(self) -> u64 {
        self.offset
    }
}

impl Write for FileWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        Ok(self.send(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Copy everything from `source` into `path`, replacing its content.
///
/// The writer is closed whether or not the copy succeeds. Returns the number
/// of bytes written.
pub fn save<R: Read + ?Sized>(session: &MountSession, path: &str, source: &mut R) -> Result<u64> {
    let mut writer = FileWriter::open(session, path)?;
    let mut buf = vec![0u8; session.wtmax() as usize];
    let result = loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => break Err(NfsError::from_io(e)),
        };
        if let Err(e) = writer.write_all_remote(&buf[..n]) {
            break Err(e);
        }
    };
    let written = writer.close();
    result.map(|()| written)
}
