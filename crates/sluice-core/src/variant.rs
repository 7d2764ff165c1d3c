//! Typed stream variants and the capability factory.
//!
//! A variant is a capability-narrowed view over a [`StreamHandle`]: its
//! constructor checks that the handle actually carries the flags the variant
//! claims, and the type then exposes exactly the trait bundles of that
//! subset.
//!
//! [`Stream::from_handle`] is the composition entry point: it inspects the
//! handle's flags and picks the most capable matching variant. Seekable wins
//! over everything else; the design treats seek support as a superset
//! capability rather than a peer of read/write, so a seekable write-only
//! handle becomes a [`Seekable`] whose read operations still fail with the
//! read precondition.

use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use sluice_capability::{Capability, CapabilityError, CapabilitySet};
use sluice_observe::EventSubscriber;

use crate::error::StreamResult;
use crate::handle::StreamHandle;
use crate::iter::LineIterator;
use crate::traits::{ReadStream, SeekStream, WriteStream};

fn validate(handle: &StreamHandle, required: CapabilitySet) -> StreamResult<()> {
    let actual = handle.capabilities();
    if actual.is_superset(required) {
        Ok(())
    } else {
        Err(CapabilityError::Mismatch { required, actual }.into())
    }
}

macro_rules! variant_common {
    ($name:ident) => {
        impl $name {
            /// The underlying handle.
            pub fn handle(&self) -> &StreamHandle {
                &self.handle
            }

            /// The underlying handle, mutably.
            pub fn handle_mut(&mut self) -> &mut StreamHandle {
                &mut self.handle
            }

            /// Unwrap back into the untyped handle.
            pub fn into_handle(self) -> StreamHandle {
                self.handle
            }

            /// Register an event subscriber on the underlying handle.
            pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) {
                self.handle.subscribe(subscriber);
            }
        }
    };
}

/// A stream exposing only the read surface.
#[derive(Debug)]
pub struct ReadOnly {
    handle: StreamHandle,
}

impl ReadOnly {
    /// Wrap `handle`, failing unless it is readable.
    pub fn new(handle: StreamHandle) -> StreamResult<Self> {
        validate(&handle, Capability::Readable.into())?;
        Ok(Self { handle })
    }

    /// Iterate over the stream's lines.
    pub fn lines(&mut self) -> StreamResult<LineIterator<'_>> {
        self.handle.lines()
    }
}

variant_common!(ReadOnly);

impl ReadStream for ReadOnly {
    fn read(&mut self, max: usize) -> StreamResult<Vec<u8>> {
        self.handle.read(max)
    }

    fn read_line(&mut self, eol: Option<&str>) -> StreamResult<String> {
        self.handle.read_line(eol)
    }

    fn read_all(&mut self) -> StreamResult<Vec<u8>> {
        self.handle.read_all()
    }

    fn eof(&self) -> bool {
        self.handle.eof()
    }

    fn is_readable(&self) -> bool {
        self.handle.is_readable()
    }
}

/// A stream exposing only the write surface.
#[derive(Debug)]
pub struct WriteOnly {
    handle: StreamHandle,
}

impl WriteOnly {
    /// Wrap `handle`, failing unless it is writable.
    pub fn new(handle: StreamHandle) -> StreamResult<Self> {
        validate(&handle, Capability::Writable.into())?;
        Ok(Self { handle })
    }
}

variant_common!(WriteOnly);

impl WriteStream for WriteOnly {
    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        self.handle.write(data)
    }

    fn write_line(&mut self, line: &str, eol: Option<&str>) -> StreamResult<usize> {
        self.handle.write_line(line, eol)
    }

    fn write_from(
        &mut self,
        source: &mut dyn ReadStream,
        max_len: Option<u64>,
    ) -> StreamResult<u64> {
        self.handle.write_from(source, max_len)
    }

    fn is_writable(&self) -> bool {
        self.handle.is_writable()
    }
}

/// A read-write stream without cursor positioning.
#[derive(Debug)]
pub struct ReadWrite {
    handle: StreamHandle,
}

impl ReadWrite {
    /// Wrap `handle`, failing unless it is both readable and writable.
    pub fn new(handle: StreamHandle) -> StreamResult<Self> {
        validate(
            &handle,
            CapabilitySet::from(Capability::Readable).with(Capability::Writable),
        )?;
        Ok(Self { handle })
    }

    /// Iterate over the stream's lines.
    pub fn lines(&mut self) -> StreamResult<LineIterator<'_>> {
        self.handle.lines()
    }
}

variant_common!(ReadWrite);

impl ReadStream for ReadWrite {
    fn read(&mut self, max: usize) -> StreamResult<Vec<u8>> {
        self.handle.read(max)
    }

    fn read_line(&mut self, eol: Option<&str>) -> StreamResult<String> {
        self.handle.read_line(eol)
    }

    fn read_all(&mut self) -> StreamResult<Vec<u8>> {
        self.handle.read_all()
    }

    fn eof(&self) -> bool {
        self.handle.eof()
    }

    fn is_readable(&self) -> bool {
        self.handle.is_readable()
    }
}

impl WriteStream for ReadWrite {
    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        self.handle.write(data)
    }

    fn write_line(&mut self, line: &str, eol: Option<&str>) -> StreamResult<usize> {
        self.handle.write_line(line, eol)
    }

    fn write_from(
        &mut self,
        source: &mut dyn ReadStream,
        max_len: Option<u64>,
    ) -> StreamResult<u64> {
        self.handle.write_from(source, max_len)
    }

    fn is_writable(&self) -> bool {
        self.handle.is_writable()
    }
}

/// A seekable stream. Exposes all three surfaces; read and write calls are
/// still gated by the handle's own flags, so a seekable write-only handle
/// fails its reads with the read precondition rather than at the type level.
#[derive(Debug)]
pub struct Seekable {
    handle: StreamHandle,
}

impl Seekable {
    /// Wrap `handle`, failing unless it is seekable.
    pub fn new(handle: StreamHandle) -> StreamResult<Self> {
        validate(&handle, Capability::Seekable.into())?;
        Ok(Self { handle })
    }

    /// Iterate over the stream's lines.
    pub fn lines(&mut self) -> StreamResult<LineIterator<'_>> {
        self.handle.lines()
    }
}

variant_common!(Seekable);

impl ReadStream for Seekable {
    fn read(&mut self, max: usize) -> StreamResult<Vec<u8>> {
        self.handle.read(max)
    }

    fn read_line(&mut self, eol: Option<&str>) -> StreamResult<String> {
        self.handle.read_line(eol)
    }

    fn read_all(&mut self) -> StreamResult<Vec<u8>> {
        self.handle.read_all()
    }

    fn eof(&self) -> bool {
        self.handle.eof()
    }

    fn is_readable(&self) -> bool {
        self.handle.is_readable()
    }
}

impl WriteStream for Seekable {
    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        self.handle.write(data)
    }

    fn write_line(&mut self, line: &str, eol: Option<&str>) -> StreamResult<usize> {
        self.handle.write_line(line, eol)
    }

    fn write_from(
        &mut self,
        source: &mut dyn ReadStream,
        max_len: Option<u64>,
    ) -> StreamResult<u64> {
        self.handle.write_from(source, max_len)
    }

    fn is_writable(&self) -> bool {
        self.handle.is_writable()
    }
}

impl SeekStream for Seekable {
    fn seek(&mut self, pos: SeekFrom) -> StreamResult<u64> {
        self.handle.seek(pos)
    }

    fn tell(&mut self) -> StreamResult<u64> {
        self.handle.tell()
    }

    fn truncate(&mut self, size: u64) -> StreamResult<()> {
        self.handle.truncate(size)
    }

    fn len(&mut self) -> StreamResult<u64> {
        self.handle.len()
    }

    fn is_seekable(&self) -> bool {
        self.handle.is_seekable()
    }
}

/// Discriminant of a [`Stream`] variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Read surface only.
    ReadOnly,
    /// Write surface only.
    WriteOnly,
    /// Read and write, no cursor.
    ReadWrite,
    /// Full surface with cursor positioning.
    Seekable,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StreamKind::ReadOnly => "read-only",
            StreamKind::WriteOnly => "write-only",
            StreamKind::ReadWrite => "read-write",
            StreamKind::Seekable => "seekable",
        };
        f.write_str(s)
    }
}

/// The closed set of typed stream variants.
///
/// # Example
///
/// ```
/// use sluice_core::{Stream, StreamKind};
///
/// let stream = Stream::memory(b"hello", None).unwrap();
/// assert_eq!(stream.kind(), StreamKind::Seekable);
/// ```
#[derive(Debug)]
pub enum Stream {
    /// Read surface only.
    ReadOnly(ReadOnly),
    /// Write surface only.
    WriteOnly(WriteOnly),
    /// Read and write, no cursor.
    ReadWrite(ReadWrite),
    /// Full surface with cursor positioning.
    Seekable(Seekable),
}

impl Stream {
    /// The factory: inspect `handle`'s flags and wrap it in the most capable
    /// matching variant. First match wins: seekable, then read-write, then
    /// read-only, then write-only.
    pub fn from_handle(handle: StreamHandle) -> StreamResult<Stream> {
        if handle.is_seekable() {
            Ok(Stream::Seekable(Seekable::new(handle)?))
        } else if handle.is_readable() && handle.is_writable() {
            Ok(Stream::ReadWrite(ReadWrite::new(handle)?))
        } else if handle.is_readable() {
            Ok(Stream::ReadOnly(ReadOnly::new(handle)?))
        } else {
            Ok(Stream::WriteOnly(WriteOnly::new(handle)?))
        }
    }

    /// Open the resource at `path` with `mode` and wrap it.
    pub fn open(path: impl AsRef<Path>, mode: &str) -> StreamResult<Stream> {
        Stream::from_handle(StreamHandle::open(path, mode)?)
    }

    /// An in-memory stream with an optional spill threshold.
    pub fn memory(initial: &[u8], spill_threshold: Option<usize>) -> StreamResult<Stream> {
        Stream::from_handle(StreamHandle::memory(initial, spill_threshold)?)
    }

    /// An anonymous temporary-file stream.
    pub fn temp(initial: &[u8]) -> StreamResult<Stream> {
        Stream::from_handle(StreamHandle::temp(initial)?)
    }

    /// The process standard input channel.
    pub fn stdin() -> StreamResult<Stream> {
        Stream::from_handle(StreamHandle::stdin())
    }

    /// The process standard output channel.
    pub fn stdout() -> StreamResult<Stream> {
        Stream::from_handle(StreamHandle::stdout())
    }

    /// The process standard error channel.
    pub fn stderr() -> StreamResult<Stream> {
        Stream::from_handle(StreamHandle::stderr())
    }

    /// Which variant this stream is.
    pub fn kind(&self) -> StreamKind {
        match self {
            Stream::ReadOnly(_) => StreamKind::ReadOnly,
            Stream::WriteOnly(_) => StreamKind::WriteOnly,
            Stream::ReadWrite(_) => StreamKind::ReadWrite,
            Stream::Seekable(_) => StreamKind::Seekable,
        }
    }

    /// The underlying handle.
    pub fn handle(&self) -> &StreamHandle {
        match self {
            Stream::ReadOnly(s) => s.handle(),
            Stream::WriteOnly(s) => s.handle(),
            Stream::ReadWrite(s) => s.handle(),
            Stream::Seekable(s) => s.handle(),
        }
    }

    /// The underlying handle, mutably.
    pub fn handle_mut(&mut self) -> &mut StreamHandle {
        match self {
            Stream::ReadOnly(s) => s.handle_mut(),
            Stream::WriteOnly(s) => s.handle_mut(),
            Stream::ReadWrite(s) => s.handle_mut(),
            Stream::Seekable(s) => s.handle_mut(),
        }
    }

    /// Unwrap back into the untyped handle.
    pub fn into_handle(self) -> StreamHandle {
        match self {
            Stream::ReadOnly(s) => s.into_handle(),
            Stream::WriteOnly(s) => s.into_handle(),
            Stream::ReadWrite(s) => s.into_handle(),
            Stream::Seekable(s) => s.into_handle(),
        }
    }

    /// Iterate over the stream's lines; fails on unreadable variants.
    pub fn lines(&mut self) -> StreamResult<LineIterator<'_>> {
        self.handle_mut().lines()
    }
}

// The enum passes every operation through to the handle, whose own gating
// yields the right precondition error on variants lacking the capability.

impl ReadStream for Stream {
    fn read(&mut self, max: usize) -> StreamResult<Vec<u8>> {
        self.handle_mut().read(max)
    }

    fn read_line(&mut self, eol: Option<&str>) -> StreamResult<String> {
        self.handle_mut().read_line(eol)
    }

    fn read_all(&mut self) -> StreamResult<Vec<u8>> {
        self.handle_mut().read_all()
    }

    fn eof(&self) -> bool {
        self.handle().eof()
    }

    fn is_readable(&self) -> bool {
        self.handle().is_readable()
    }
}

impl WriteStream for Stream {
    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        self.handle_mut().write(data)
    }

    fn write_line(&mut self, line: &str, eol: Option<&str>) -> StreamResult<usize> {
        self.handle_mut().write_line(line, eol)
    }

    fn write_from(
        &mut self,
        source: &mut dyn ReadStream,
        max_len: Option<u64>,
    ) -> StreamResult<u64> {
        self.handle_mut().write_from(source, max_len)
    }

    fn is_writable(&self) -> bool {
        self.handle().is_writable()
    }
}

impl SeekStream for Stream {
    fn seek(&mut self, pos: SeekFrom) -> StreamResult<u64> {
        self.handle_mut().seek(pos)
    }

    fn tell(&mut self) -> StreamResult<u64> {
        self.handle_mut().tell()
    }

    fn truncate(&mut self, size: u64) -> StreamResult<()> {
        self.handle_mut().truncate(size)
    }

    fn len(&mut self) -> StreamResult<u64> {
        self.handle_mut().len()
    }

    fn is_seekable(&self) -> bool {
        self.handle().is_seekable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;

    #[test]
    fn test_factory_memory_is_seekable() {
        let stream = Stream::memory(b"", None).unwrap();
        assert_eq!(stream.kind(), StreamKind::Seekable);
    }

    #[test]
    fn test_factory_stdin_is_read_only() {
        let stream = Stream::stdin().unwrap();
        assert_eq!(stream.kind(), StreamKind::ReadOnly);
    }

    #[test]
    fn test_factory_stdout_is_write_only() {
        let stream = Stream::stdout().unwrap();
        assert_eq!(stream.kind(), StreamKind::WriteOnly);
    }

    #[test]
    fn test_factory_file_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"content").unwrap();

        // A plain file is seekable, so seek wins regardless of mode.
        let stream = Stream::open(&path, "r").unwrap();
        assert_eq!(stream.kind(), StreamKind::Seekable);

        let stream = Stream::open(&path, "w+").unwrap();
        assert_eq!(stream.kind(), StreamKind::Seekable);
    }

    #[test]
    fn test_read_only_rejects_unreadable_handle() {
        let handle = StreamHandle::stdout();
        let err = ReadOnly::new(handle).unwrap_err();
        assert!(matches!(
            err,
            StreamError::Capability(CapabilityError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_read_write_rejects_partial_capability() {
        let handle = StreamHandle::stdin();
        assert!(ReadWrite::new(handle).is_err());
    }

    #[test]
    fn test_seekable_rejects_non_seekable_handle() {
        let handle = StreamHandle::stdin();
        assert!(Seekable::new(handle).is_err());
    }

    #[test]
    fn test_detached_handle_rejected_by_variants() {
        let mut handle = StreamHandle::memory(b"", None).unwrap();
        handle.detach();
        assert!(Seekable::new(handle).is_err());
    }

    #[test]
    fn test_seekable_write_only_gates_reads() {
        // A seekable handle opened write-only: wrapped as Seekable, writes
        // and seeks work, reads fail with the read precondition.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        let mut stream = Stream::open(&path, "w").unwrap();
        assert_eq!(stream.kind(), StreamKind::Seekable);
        stream.write(b"data").unwrap();
        stream.rewind().unwrap();
        let err = stream.read(4).unwrap_err();
        assert!(err.is_not_readable());
    }

    #[test]
    fn test_exclusive_mode_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("once.bin");

        Stream::open(&path, "x").unwrap();
        assert!(matches!(
            Stream::open(&path, "x"),
            Err(StreamError::Open { .. })
        ));
    }

    #[test]
    fn test_append_mode_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, b"first|").unwrap();

        let mut stream = Stream::open(&path, "a").unwrap();
        stream.write(b"second").unwrap();
        drop(stream);
        assert_eq!(std::fs::read(&path).unwrap(), b"first|second");
    }

    #[test]
    fn test_enum_passthrough_round_trip() {
        let mut stream = Stream::memory(b"", None).unwrap();
        stream.write(b"payload").unwrap();
        stream.rewind().unwrap();
        assert_eq!(stream.read_all().unwrap(), b"payload");
        assert_eq!(stream.len().unwrap(), 7);
    }

    #[test]
    fn test_into_handle_round_trip() {
        let stream = Stream::memory(b"x", None).unwrap();
        let handle = stream.into_handle();
        let stream = Stream::from_handle(handle).unwrap();
        assert_eq!(stream.kind(), StreamKind::Seekable);
    }

    #[cfg(unix)]
    #[test]
    fn test_factory_pipe_writer_is_write_only() {
        use std::fs::File;
        use std::os::unix::io::FromRawFd;

        use crate::raw::RawStream;
        use sluice_capability::OpenMode;

        let mut fds = [0i32; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        // SAFETY: fds freshly created by pipe(2), owned here.
        let _reader = unsafe { File::from_raw_fd(fds[0]) };
        let writer = unsafe { File::from_raw_fd(fds[1]) };

        // Append semantics on a non-seekable medium: write-only variant.
        let handle = StreamHandle::from_raw(RawStream::File(writer), OpenMode::WRITE);
        assert!(!handle.is_seekable());
        let stream = Stream::from_handle(handle).unwrap();
        assert_eq!(stream.kind(), StreamKind::WriteOnly);
    }
}
