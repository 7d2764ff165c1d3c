//! Raw I/O endpoints.
//!
//! [`RawStream`] is the opaque handle the capability layer wraps: a closed
//! enum over the endpoint kinds the library knows how to open. It performs
//! no capability checking of its own; the [`StreamHandle`] above it is
//! responsible for gating every operation.
//!
//! [`StreamHandle`]: crate::handle::StreamHandle

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

use tempfile::SpooledTempFile;

/// An opaque, exclusively-owned I/O endpoint.
pub enum RawStream {
    /// A filesystem-backed file, including anonymous temp files.
    File(File),
    /// An in-memory buffer that spills to temporary backing storage once it
    /// grows past its threshold.
    Spooled(SpooledTempFile),
    /// The process standard input channel.
    Stdin(io::Stdin),
    /// The process standard output channel.
    Stdout(io::Stdout),
    /// The process standard error channel.
    Stderr(io::Stderr),
}

impl RawStream {
    /// Short name of the endpoint kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            RawStream::File(_) => "file",
            RawStream::Spooled(_) => "memory",
            RawStream::Stdin(_) => "stdin",
            RawStream::Stdout(_) => "stdout",
            RawStream::Stderr(_) => "stderr",
        }
    }

    /// Whether the endpoint is addressable on the local filesystem.
    pub fn is_local(&self) -> bool {
        matches!(self, RawStream::File(_) | RawStream::Spooled(_))
    }

    /// Whether the endpoint is owned by the process rather than by its
    /// wrapper. Process channels stay open when the wrapper goes away.
    pub fn is_persistent(&self) -> bool {
        matches!(
            self,
            RawStream::Stdin(_) | RawStream::Stdout(_) | RawStream::Stderr(_)
        )
    }

    /// Probe whether the endpoint supports cursor positioning.
    pub fn probe_seekable(&mut self) -> bool {
        match self {
            // Querying the position is a no-op probe; it fails on pipes and
            // character devices handed in as files.
            RawStream::File(f) => f.stream_position().is_ok(),
            RawStream::Spooled(_) => true,
            RawStream::Stdin(_) | RawStream::Stdout(_) | RawStream::Stderr(_) => false,
        }
    }

    /// Resize the underlying medium. The cursor position is not adjusted.
    pub fn set_len(&mut self, size: u64) -> io::Result<()> {
        match self {
            RawStream::File(f) => f.set_len(size),
            RawStream::Spooled(s) => s.set_len(size),
            _ => Err(unsupported("truncate")),
        }
    }

    /// The OS file descriptor backing the endpoint, when there is one.
    #[cfg(unix)]
    pub fn descriptor(&self) -> Option<std::os::unix::io::RawFd> {
        use std::os::unix::io::AsRawFd;

        match self {
            RawStream::File(f) => Some(f.as_raw_fd()),
            // The spooled buffer may still be in memory; no stable fd.
            RawStream::Spooled(_) => None,
            RawStream::Stdin(s) => Some(s.as_raw_fd()),
            RawStream::Stdout(s) => Some(s.as_raw_fd()),
            RawStream::Stderr(s) => Some(s.as_raw_fd()),
        }
    }
}

impl Read for RawStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            RawStream::File(f) => f.read(buf),
            RawStream::Spooled(s) => s.read(buf),
            RawStream::Stdin(s) => s.read(buf),
            RawStream::Stdout(_) | RawStream::Stderr(_) => Err(unsupported("read")),
        }
    }
}

impl Write for RawStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            RawStream::File(f) => f.write(buf),
            RawStream::Spooled(s) => s.write(buf),
            RawStream::Stdout(s) => s.write(buf),
            RawStream::Stderr(s) => s.write(buf),
            RawStream::Stdin(_) => Err(unsupported("write")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            RawStream::File(f) => f.flush(),
            RawStream::Spooled(s) => s.flush(),
            RawStream::Stdout(s) => s.flush(),
            RawStream::Stderr(s) => s.flush(),
            RawStream::Stdin(_) => Ok(()),
        }
    }
}

impl Seek for RawStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            RawStream::File(f) => f.seek(pos),
            RawStream::Spooled(s) => s.seek(pos),
            _ => Err(unsupported("seek")),
        }
    }
}

impl std::fmt::Debug for RawStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawStream")
            .field("kind", &self.kind())
            .finish()
    }
}

fn unsupported(op: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{op} is not supported by this handle"),
    )
}

/// Toggle the `O_NONBLOCK` flag on a descriptor.
#[cfg(unix)]
pub(crate) fn set_descriptor_blocking(
    fd: std::os::unix::io::RawFd,
    blocking: bool,
) -> io::Result<()> {
    // SAFETY: fcntl on a descriptor we own; F_GETFL/F_SETFL do not touch
    // memory.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    let flags = if blocking {
        flags & !libc::O_NONBLOCK
    } else {
        flags | libc::O_NONBLOCK
    };
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spooled_round_trip() {
        let mut raw = RawStream::Spooled(SpooledTempFile::new(64));
        raw.write_all(b"hello").unwrap();
        raw.seek(SeekFrom::Start(0)).unwrap();
        let mut buf = String::new();
        raw.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "hello");
    }

    #[test]
    fn test_spooled_spills_past_threshold() {
        let mut raw = RawStream::Spooled(SpooledTempFile::new(4));
        raw.write_all(b"0123456789").unwrap();
        raw.seek(SeekFrom::Start(0)).unwrap();
        let mut buf = Vec::new();
        raw.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"0123456789");
    }

    #[test]
    fn test_kind_and_flags() {
        let mut mem = RawStream::Spooled(SpooledTempFile::new(16));
        assert_eq!(mem.kind(), "memory");
        assert!(mem.is_local());
        assert!(!mem.is_persistent());
        assert!(mem.probe_seekable());

        let mut input = RawStream::Stdin(io::stdin());
        assert_eq!(input.kind(), "stdin");
        assert!(!input.is_local());
        assert!(input.is_persistent());
        assert!(!input.probe_seekable());
    }

    #[test]
    fn test_stdout_rejects_read() {
        let mut out = RawStream::Stdout(io::stdout());
        let mut buf = [0u8; 4];
        let err = out.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }

    #[test]
    fn test_set_len() {
        let mut raw = RawStream::Spooled(SpooledTempFile::new(64));
        raw.write_all(b"0123456789").unwrap();
        raw.set_len(4).unwrap();
        raw.seek(SeekFrom::Start(0)).unwrap();
        let mut buf = Vec::new();
        raw.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"0123");
    }
}
