//! Capability-gated behavior bundles.
//!
//! Three independent traits cover the read, write and seek surfaces. Each
//! operation enforces its own capability precondition and fails before any
//! raw I/O when the flag is absent, so the bundles compose freely: a typed
//! variant implements exactly the bundles its capability subset allows.

use std::io::SeekFrom;

use crate::error::StreamResult;
use crate::handle::StreamHandle;

/// Read operations, legal on handles carrying the Readable flag.
pub trait ReadStream {
    /// Read up to `max` bytes; shorter results only at end-of-stream or on
    /// short reads of the medium.
    fn read(&mut self, max: usize) -> StreamResult<Vec<u8>>;

    /// Read one line, up to and including `eol` (the handle's configured
    /// marker when `None`).
    fn read_line(&mut self, eol: Option<&str>) -> StreamResult<String>;

    /// Read everything from the current position to end-of-stream.
    fn read_all(&mut self) -> StreamResult<Vec<u8>>;

    /// Whether the last read hit end-of-stream or the handle is inert.
    fn eof(&self) -> bool;

    /// Whether the Readable flag is present.
    fn is_readable(&self) -> bool;
}

/// Write operations, legal on handles carrying the Writable flag.
pub trait WriteStream {
    /// Write all of `data`, failing on a short write.
    fn write(&mut self, data: &[u8]) -> StreamResult<usize>;

    /// Write a line, appending the terminator unless already present.
    fn write_line(&mut self, line: &str, eol: Option<&str>) -> StreamResult<usize>;

    /// Copy from `source` until its end-of-stream or `max_len` bytes.
    fn write_from(
        &mut self,
        source: &mut dyn ReadStream,
        max_len: Option<u64>,
    ) -> StreamResult<u64>;

    /// Whether the Writable flag is present.
    fn is_writable(&self) -> bool;
}

/// Cursor operations, legal on handles carrying the Seekable flag.
pub trait SeekStream {
    /// Move the cursor, returning the new absolute position.
    fn seek(&mut self, pos: SeekFrom) -> StreamResult<u64>;

    /// Move the cursor to the start.
    fn rewind(&mut self) -> StreamResult<u64> {
        self.seek(SeekFrom::Start(0))
    }

    /// The current cursor position.
    fn tell(&mut self) -> StreamResult<u64>;

    /// Resize the medium; the cursor is not adjusted.
    fn truncate(&mut self, size: u64) -> StreamResult<()>;

    /// Total byte length, via save-seek-restore.
    fn len(&mut self) -> StreamResult<u64>;

    /// Whether the Seekable flag is present.
    fn is_seekable(&self) -> bool;
}

impl ReadStream for StreamHandle {
    fn read(&mut self, max: usize) -> StreamResult<Vec<u8>> {
        StreamHandle::read(self, max)
    }

    fn read_line(&mut self, eol: Option<&str>) -> StreamResult<String> {
        StreamHandle::read_line(self, eol)
    }

    fn read_all(&mut self) -> StreamResult<Vec<u8>> {
        StreamHandle::read_all(self)
    }

    fn eof(&self) -> bool {
        StreamHandle::eof(self)
    }

    fn is_readable(&self) -> bool {
        StreamHandle::is_readable(self)
    }
}

impl WriteStream for StreamHandle {
    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        StreamHandle::write(self, data)
    }

    fn write_line(&mut self, line: &str, eol: Option<&str>) -> StreamResult<usize> {
        StreamHandle::write_line(self, line, eol)
    }

    fn write_from(
        &mut self,
        source: &mut dyn ReadStream,
        max_len: Option<u64>,
    ) -> StreamResult<u64> {
        StreamHandle::write_from(self, source, max_len)
    }

    fn is_writable(&self) -> bool {
        StreamHandle::is_writable(self)
    }
}

impl SeekStream for StreamHandle {
    fn seek(&mut self, pos: SeekFrom) -> StreamResult<u64> {
        StreamHandle::seek(self, pos)
    }

    fn tell(&mut self) -> StreamResult<u64> {
        StreamHandle::tell(self)
    }

    fn truncate(&mut self, size: u64) -> StreamResult<()> {
        StreamHandle::truncate(self, size)
    }

    fn len(&mut self) -> StreamResult<u64> {
        StreamHandle::len(self)
    }

    fn is_seekable(&self) -> bool {
        StreamHandle::is_seekable(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_read(stream: &mut dyn ReadStream) -> StreamResult<Vec<u8>> {
        stream.read_all()
    }

    #[test]
    fn test_handle_as_trait_object() {
        let mut mem = StreamHandle::memory(b"trait object", None).unwrap();
        SeekStream::rewind(&mut mem).unwrap();
        assert_eq!(as_read(&mut mem).unwrap(), b"trait object");
    }

    #[test]
    fn test_default_rewind_goes_to_start() {
        let mut mem = StreamHandle::memory(b"abcdef", None).unwrap();
        assert_eq!(SeekStream::rewind(&mut mem).unwrap(), 0);
        assert_eq!(SeekStream::tell(&mut mem).unwrap(), 0);
    }
}
