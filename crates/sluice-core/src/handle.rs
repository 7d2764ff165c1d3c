//! Stream handle: raw endpoint + capability flags + lifecycle.
//!
//! [`StreamHandle`] owns exactly one [`RawStream`] together with the
//! capability flags resolved at construction, the configured end-of-line
//! marker, and the per-handle event dispatcher. All capability-gated
//! operations live here as the shared concrete logic; the typed variants in
//! [`crate::variant`] delegate to it.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use serde::ser::{Error as _, Serialize, Serializer};
use tempfile::SpooledTempFile;
use tracing::{debug, warn};
use uuid::Uuid;

use sluice_capability::{Capability, CapabilitySet, OpenMode};
use sluice_observe::{EventDispatcher, EventSubscriber, StreamEvent};

use crate::error::{StreamError, StreamResult};
use crate::iter::LineIterator;
use crate::raw::RawStream;
use crate::traits::ReadStream;

/// Chunk size used by stream-to-stream copies.
pub const COPY_CHUNK: usize = 8192;

/// The platform line terminator, used as the default eol marker.
#[cfg(windows)]
pub const DEFAULT_EOL: &str = "\r\n";
/// The platform line terminator, used as the default eol marker.
#[cfg(not(windows))]
pub const DEFAULT_EOL: &str = "\n";

/// Unique identifier for a stream handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(Uuid);

impl HandleId {
    /// Create a new random handle ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serializable snapshot of a handle's metadata.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HandleInfo {
    /// Normalized open mode, binary qualifier included.
    pub mode: String,
    /// Endpoint kind (`file`, `memory`, `stdin`, ...), or `detached`.
    pub kind: String,
    /// Names of the capabilities present.
    pub capabilities: Vec<String>,
    /// Whether the last read reached end-of-stream.
    pub eof: bool,
    /// Whether the handle is in blocking mode.
    pub blocked: bool,
    /// Whether the handle has been closed or detached.
    pub detached: bool,
    /// The configured end-of-line marker.
    pub eol: String,
}

/// One open I/O endpoint with capability-gated operations.
///
/// Capability flags are computed once at construction and never recomputed;
/// [`close`](StreamHandle::close) and [`detach`](StreamHandle::detach) clear
/// them to empty. Every operation checks its capability precondition before
/// touching the raw endpoint, so a failed precondition has no side effects.
///
/// A handle is single-owner and single-threaded: multi-step operations such
/// as [`len`](StreamHandle::len) are not atomic with respect to a second
/// owner of the same descriptor.
///
/// # Example
///
/// ```
/// use sluice_core::StreamHandle;
///
/// let mut mem = StreamHandle::memory(b"a\nb\n", None).unwrap();
/// mem.rewind().unwrap();
/// assert_eq!(mem.read_line(None).unwrap(), "a\n");
/// ```
pub struct StreamHandle {
    id: HandleId,
    raw: Option<RawStream>,
    caps: CapabilitySet,
    mode: OpenMode,
    eol: String,
    blocking: bool,
    reached_eof: bool,
    events: EventDispatcher,
}

impl StreamHandle {
    /// Open the OS resource at `path` with the capability semantics of
    /// `mode`. A binary qualifier is implied unless the mode asks for a text
    /// transform, guaranteeing byte-exact semantics across platforms.
    pub fn open(path: impl AsRef<Path>, mode: &str) -> StreamResult<Self> {
        let path = path.as_ref();
        let mode: OpenMode = mode.parse()?;
        let file = mode.open_options().open(path).map_err(|source| {
            warn!(path = %path.display(), mode = %mode, "Failed to open stream");
            StreamError::Open {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let handle = Self::from_raw(RawStream::File(file), mode);
        debug!(handle_id = %handle.id, path = %path.display(), mode = %mode, "Opened stream");
        Ok(handle)
    }

    /// Wrap an already-open endpoint. Flags are derived from `mode` (read/
    /// write), from a seek probe, and from the endpoint category (local,
    /// persistent).
    pub fn from_raw(mut raw: RawStream, mode: OpenMode) -> Self {
        let mut caps = mode.capabilities();
        if raw.probe_seekable() {
            caps.insert(Capability::Seekable);
        }
        if raw.is_local() {
            caps.insert(Capability::Local);
        }
        if raw.is_persistent() {
            caps.insert(Capability::Persistent);
        }

        let handle = Self {
            id: HandleId::new(),
            raw: Some(raw),
            caps,
            mode,
            eol: DEFAULT_EOL.to_string(),
            blocking: true,
            reached_eof: false,
            events: EventDispatcher::new(),
        };
        debug!(handle_id = %handle.id, caps = %handle.caps, kind = handle.kind(), "Wrapped stream");
        handle
    }

    /// An in-memory stream, spilling to temporary backing storage once it
    /// grows past `spill_threshold` bytes (never, when `None`). Initial data
    /// is written and the cursor left at its end.
    pub fn memory(initial: &[u8], spill_threshold: Option<usize>) -> StreamResult<Self> {
        let spooled = SpooledTempFile::new(spill_threshold.unwrap_or(usize::MAX));
        let mut handle = Self::from_raw(RawStream::Spooled(spooled), OpenMode::WRITE_READ);
        if !initial.is_empty() {
            handle.write(initial)?;
        }
        Ok(handle)
    }

    /// An anonymous temporary-file stream. Initial data is written and the
    /// cursor left at its end.
    pub fn temp(initial: &[u8]) -> StreamResult<Self> {
        let file = tempfile::tempfile().map_err(StreamError::Io)?;
        let mut handle = Self::from_raw(RawStream::File(file), OpenMode::READ_WRITE);
        if !initial.is_empty() {
            handle.write(initial)?;
        }
        Ok(handle)
    }

    /// The process standard input channel. Persistent: never closed when the
    /// wrapper is dropped.
    pub fn stdin() -> Self {
        Self::from_raw(RawStream::Stdin(io::stdin()), OpenMode::READ)
    }

    /// The process standard output channel. Persistent.
    pub fn stdout() -> Self {
        Self::from_raw(RawStream::Stdout(io::stdout()), OpenMode::WRITE)
    }

    /// The process standard error channel. Persistent.
    pub fn stderr() -> Self {
        Self::from_raw(RawStream::Stderr(io::stderr()), OpenMode::WRITE)
    }

    // Capability probes. All side-effect free.

    /// The handle's unique identifier.
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// The handle's capability flags.
    pub fn capabilities(&self) -> CapabilitySet {
        self.caps
    }

    /// Whether read operations are legal.
    pub fn is_readable(&self) -> bool {
        self.caps.contains(Capability::Readable)
    }

    /// Whether write operations are legal.
    pub fn is_writable(&self) -> bool {
        self.caps.contains(Capability::Writable)
    }

    /// Whether cursor positioning is legal.
    pub fn is_seekable(&self) -> bool {
        self.caps.contains(Capability::Seekable)
    }

    /// Whether the endpoint outlives this wrapper.
    pub fn is_persistent(&self) -> bool {
        self.caps.contains(Capability::Persistent)
    }

    /// Whether the endpoint is addressable on the local filesystem.
    pub fn is_local(&self) -> bool {
        self.caps.contains(Capability::Local)
    }

    /// Whether the raw endpoint has been closed or detached.
    pub fn is_detached(&self) -> bool {
        self.raw.is_none()
    }

    /// Whether the handle is in blocking mode.
    pub fn is_blocked(&self) -> bool {
        self.blocking
    }

    /// True once a read has hit end-of-stream, or when the handle is closed
    /// or detached. Tracked state: a would-block empty read on a
    /// non-blocking handle is transient and does not set it.
    pub fn eof(&self) -> bool {
        self.raw.is_none() || self.reached_eof
    }

    /// The configured end-of-line marker.
    pub fn eol(&self) -> &str {
        &self.eol
    }

    /// Replace the end-of-line marker, returning the previous one. Pure
    /// accessor, no I/O.
    pub fn set_eol(&mut self, eol: impl Into<String>) -> String {
        std::mem::replace(&mut self.eol, eol.into())
    }

    /// Metadata snapshot.
    pub fn info(&self) -> HandleInfo {
        HandleInfo {
            mode: self.mode.normalized(),
            kind: self.kind().to_string(),
            capabilities: self.caps.iter().map(|c| c.as_str().to_string()).collect(),
            eof: self.eof(),
            blocked: self.blocking,
            detached: self.is_detached(),
            eol: self.eol.clone(),
        }
    }

    fn kind(&self) -> &'static str {
        self.raw.as_ref().map_or("detached", RawStream::kind)
    }

    // Observation.

    /// Register an event subscriber on this handle.
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) {
        self.events.subscribe(subscriber);
    }

    /// The handle's event dispatcher.
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    // Lifecycle.

    /// Close the handle: flush if writable, release the raw endpoint, clear
    /// the flags. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut raw) = self.raw.take() {
            if self.caps.contains(Capability::Writable) {
                if let Err(e) = raw.flush() {
                    warn!(handle_id = %self.id, error = %e, "Flush on close failed");
                }
            }
            debug!(handle_id = %self.id, "Closed stream");
        }
        self.caps.clear();
    }

    /// Transfer ownership of the raw endpoint to the caller. The wrapper
    /// becomes inert: flags cleared, all further I/O fails
    /// [`StreamError::ClosedOrDetached`]. Never fails; returns `None` when
    /// already detached.
    pub fn detach(&mut self) -> Option<RawStream> {
        self.caps.clear();
        let raw = self.raw.take();
        if raw.is_some() {
            debug!(handle_id = %self.id, "Detached stream");
        }
        raw
    }

    /// Toggle blocking I/O mode on the raw endpoint. Fails with
    /// [`StreamError::Unsupported`] when the endpoint has no descriptor to
    /// configure.
    pub fn set_blocking(&mut self, blocking: bool) -> StreamResult<()> {
        let raw = self.raw.as_ref().ok_or(StreamError::ClosedOrDetached)?;

        #[cfg(unix)]
        {
            let fd = raw.descriptor().ok_or(StreamError::Unsupported(
                "blocking mode requires a descriptor-backed handle",
            ))?;
            crate::raw::set_descriptor_blocking(fd, blocking)?;
            self.blocking = blocking;
            self.events.emit(StreamEvent::Block { blocking });
            debug!(handle_id = %self.id, blocking, "Toggled blocking mode");
            Ok(())
        }
        #[cfg(not(unix))]
        {
            let _ = raw;
            Err(StreamError::Unsupported(
                "blocking mode is only configurable on unix",
            ))
        }
    }

    /// Flip the current blocking mode.
    pub fn toggle_blocking(&mut self) -> StreamResult<()> {
        self.set_blocking(!self.blocking)
    }

    // Readable operations.

    fn require(&self, cap: Capability) -> StreamResult<()> {
        if self.raw.is_none() {
            return Err(StreamError::ClosedOrDetached);
        }
        self.caps.require(cap.into())?;
        Ok(())
    }

    /// Read up to `max` bytes. Returns fewer only at end-of-stream or on a
    /// short read of the underlying medium; never pads. A would-block
    /// condition on a non-blocking handle yields an empty transient read
    /// without marking end-of-stream.
    pub fn read(&mut self, max: usize) -> StreamResult<Vec<u8>> {
        self.require(Capability::Readable)?;
        let raw = self.raw.as_mut().ok_or(StreamError::ClosedOrDetached)?;

        let mut buf = vec![0u8; max];
        let mut would_block = false;
        let n = loop {
            match raw.read(&mut buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    would_block = true;
                    break 0;
                }
                Err(e) => return Err(e.into()),
            }
        };
        buf.truncate(n);
        // Ok(0) from the primitive is end-of-stream in any blocking mode;
        // a would-block zero is transient and leaves the flag untouched.
        if n > 0 {
            self.reached_eof = false;
        } else if max > 0 && !would_block {
            self.reached_eof = true;
        }
        self.events.emit(StreamEvent::Read {
            data: Bytes::copy_from_slice(&buf),
        });
        Ok(buf)
    }

    /// Read up to and including the next occurrence of `eol` (the handle's
    /// configured marker when `None`). The returned string keeps the
    /// terminator when one was found; at end-of-stream the remainder comes
    /// back without it, and an empty string signals exhaustion. Terminators
    /// of any length are matched by exact suffix.
    pub fn read_line(&mut self, eol: Option<&str>) -> StreamResult<String> {
        self.require(Capability::Readable)?;
        let eol = eol.unwrap_or(&self.eol).as_bytes().to_vec();
        let raw = self.raw.as_mut().ok_or(StreamError::ClosedOrDetached)?;

        let mut line: Vec<u8> = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            let mut would_block = false;
            let n = loop {
                match raw.read(&mut byte) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                        would_block = true;
                        break 0;
                    }
                    Err(e) => return Err(e.into()),
                }
            };
            if n == 0 {
                if !would_block {
                    self.reached_eof = true;
                }
                break;
            }
            line.push(byte[0]);
            if !eol.is_empty() && line.ends_with(&eol) {
                break;
            }
        }

        self.events.emit(StreamEvent::Read {
            data: Bytes::copy_from_slice(&line),
        });
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Read from the current position to end-of-stream in one call. Memory
    /// use is unbounded; callers needing bounds must loop over
    /// [`read`](StreamHandle::read).
    pub fn read_all(&mut self) -> StreamResult<Vec<u8>> {
        self.require(Capability::Readable)?;
        let raw = self.raw.as_mut().ok_or(StreamError::ClosedOrDetached)?;

        let mut buf = Vec::new();
        raw.read_to_end(&mut buf)?;
        self.reached_eof = true;
        self.events.emit(StreamEvent::Read {
            data: Bytes::copy_from_slice(&buf),
        });
        Ok(buf)
    }

    // Writable operations.

    /// Write `data`, returning the byte count on full acceptance. A write
    /// the primitive reports as shorter than `data` fails with
    /// [`StreamError::ShortWrite`].
    pub fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        self.require(Capability::Writable)?;
        let raw = self.raw.as_mut().ok_or(StreamError::ClosedOrDetached)?;

        let n = loop {
            match raw.write(data) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        if n < data.len() {
            return Err(StreamError::ShortWrite {
                expected: data.len(),
                written: n,
            });
        }
        self.events.emit(StreamEvent::Write {
            data: Bytes::copy_from_slice(data),
        });
        Ok(n)
    }

    /// Write `line`, appending `eol` (the handle's marker when `None`) only
    /// when the line does not already end with it. Exact suffix match, so
    /// pre-terminated input is passed through untouched.
    pub fn write_line(&mut self, line: &str, eol: Option<&str>) -> StreamResult<usize> {
        let eol = eol.unwrap_or(&self.eol);
        if line.ends_with(eol) {
            self.write(line.as_bytes())
        } else {
            let mut terminated = String::with_capacity(line.len() + eol.len());
            terminated.push_str(line);
            terminated.push_str(eol);
            self.write(terminated.as_bytes())
        }
    }

    /// Copy bytes from `source` until it reaches end-of-stream or `max_len`
    /// bytes have been copied. Returns 0 immediately when either endpoint
    /// lacks its capability; stops early without error when the sink accepts
    /// zero bytes, so a stalled sink cannot spin forever.
    pub fn write_from(
        &mut self,
        source: &mut dyn ReadStream,
        max_len: Option<u64>,
    ) -> StreamResult<u64> {
        if !self.is_writable() || !source.is_readable() {
            return Ok(0);
        }

        let mut total: u64 = 0;
        let mut remaining = max_len;
        while !source.eof() {
            let chunk = match remaining {
                None => COPY_CHUNK,
                Some(0) => break,
                Some(r) => r.min(COPY_CHUNK as u64) as usize,
            };
            let data = source.read(chunk)?;
            if data.is_empty() {
                break;
            }
            if let Some(r) = remaining.as_mut() {
                *r -= data.len() as u64;
            }
            match self.write(&data) {
                Ok(n) => total += n as u64,
                Err(StreamError::ShortWrite { written: 0, .. }) => break,
                Err(StreamError::ShortWrite { written, .. }) => {
                    total += written as u64;
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }

    // Seekable operations.

    /// Move the cursor, returning the new absolute position.
    pub fn seek(&mut self, pos: SeekFrom) -> StreamResult<u64> {
        self.require(Capability::Seekable)?;
        let raw = self.raw.as_mut().ok_or(StreamError::ClosedOrDetached)?;

        let new_pos = raw.seek(pos)?;
        self.reached_eof = false;
        self.events.emit(StreamEvent::Seek { pos });
        Ok(new_pos)
    }

    /// Move the cursor to the start of the stream.
    pub fn rewind(&mut self) -> StreamResult<u64> {
        self.seek(SeekFrom::Start(0))
    }

    /// The current cursor position.
    pub fn tell(&mut self) -> StreamResult<u64> {
        self.require(Capability::Seekable)?;
        let raw = self.raw.as_mut().ok_or(StreamError::ClosedOrDetached)?;
        Ok(raw.stream_position()?)
    }

    /// Resize the underlying medium. The cursor position is not adjusted.
    pub fn truncate(&mut self, size: u64) -> StreamResult<()> {
        self.require(Capability::Seekable)?;
        let raw = self.raw.as_mut().ok_or(StreamError::ClosedOrDetached)?;
        raw.set_len(size)?;
        Ok(())
    }

    /// Total byte length, computed by saving the position, seeking to the
    /// end and restoring. The three steps are not atomic; behavior under
    /// concurrent mutation by a second owner of the same descriptor is
    /// undefined (single-owner model).
    pub fn len(&mut self) -> StreamResult<u64> {
        let pos = self.tell()?;
        let end = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(pos))?;
        Ok(end)
    }

    // Line iteration.

    /// Iterate over the stream's lines from the current position.
    pub fn lines(&mut self) -> StreamResult<LineIterator<'_>> {
        LineIterator::new(self)
    }

    /// Best-effort string conversion for display purposes. Never fails:
    /// an unreadable stream or any internal failure yields an empty string.
    /// Seekable streams report their full contents and the cursor is
    /// restored; non-seekable streams report only the unread remainder,
    /// pulled with blocking disabled and the prior mode restored.
    pub fn display_contents(&mut self) -> String {
        if !self.is_readable() {
            return String::new();
        }
        if self.is_seekable() {
            self.display_seekable().unwrap_or_default()
        } else {
            let was_blocking = self.blocking;
            let _ = self.set_blocking(false);
            let contents = self
                .read_all()
                .map(|data| String::from_utf8_lossy(&data).into_owned())
                .unwrap_or_default();
            let _ = self.set_blocking(was_blocking);
            contents
        }
    }

    fn display_seekable(&mut self) -> StreamResult<String> {
        let pos = self.tell()?;
        self.rewind()?;
        let data = self.read_all()?;
        self.seek(SeekFrom::Start(pos))?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        // Persistent endpoints belong to the process, not to this wrapper.
        if !self.is_persistent() {
            self.close();
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("caps", &self.caps)
            .field("mode", &self.mode.normalized())
            .finish()
    }
}

/// Live handles have no portable persisted representation; serialization is
/// always rejected.
impl Serialize for StreamHandle {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(S::Error::custom(StreamError::NotSerializable.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_observe::CollectingSubscriber;

    #[test]
    fn test_memory_round_trip() {
        let mut mem = StreamHandle::memory(b"hello", None).unwrap();
        assert!(mem.is_readable());
        assert!(mem.is_writable());
        assert!(mem.is_seekable());
        assert!(mem.is_local());
        assert!(!mem.is_persistent());

        mem.rewind().unwrap();
        assert_eq!(mem.read(5).unwrap(), b"hello");
    }

    #[test]
    fn test_read_requires_capability() {
        let mut out = StreamHandle::stdout();
        let err = out.read(16).unwrap_err();
        assert!(err.is_not_readable());
    }

    #[test]
    fn test_write_requires_capability() {
        let mut input = StreamHandle::stdin();
        let err = input.write(b"x").unwrap_err();
        assert!(err.is_not_writable());
    }

    #[test]
    fn test_seek_requires_capability() {
        let mut input = StreamHandle::stdin();
        let err = input.tell().unwrap_err();
        assert!(err.is_not_seekable());
    }

    #[test]
    fn test_detach_makes_handle_inert() {
        let mut mem = StreamHandle::memory(b"data", None).unwrap();
        let raw = mem.detach();
        assert!(raw.is_some());
        assert!(mem.is_detached());
        assert!(mem.capabilities().is_empty());
        assert!(mem.eof());

        assert!(matches!(
            mem.read(4),
            Err(StreamError::ClosedOrDetached)
        ));
        assert!(matches!(
            mem.write(b"x"),
            Err(StreamError::ClosedOrDetached)
        ));
        // Detaching again is a no-op.
        assert!(mem.detach().is_none());
    }

    #[test]
    fn test_detached_raw_remains_usable() {
        let mut mem = StreamHandle::memory(b"payload", None).unwrap();
        let mut raw = mem.detach().unwrap();
        raw.seek(SeekFrom::Start(0)).unwrap();
        let mut buf = Vec::new();
        raw.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"payload");
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut mem = StreamHandle::memory(b"", None).unwrap();
        mem.close();
        mem.close();
        assert!(mem.is_detached());
        assert!(matches!(mem.read(1), Err(StreamError::ClosedOrDetached)));
    }

    #[test]
    fn test_tell_after_write_at_end() {
        let mut mem = StreamHandle::memory(b"", None).unwrap();
        let before = mem.tell().unwrap();
        mem.write(b"12345").unwrap();
        assert_eq!(mem.tell().unwrap(), before + 5);
    }

    #[test]
    fn test_round_trip_with_embedded_terminators() {
        let payload = b"line one\nline two\r\n\x00binary\xff";
        let mut mem = StreamHandle::memory(b"", None).unwrap();
        mem.write(payload).unwrap();
        mem.rewind().unwrap();
        assert_eq!(mem.read(payload.len()).unwrap(), payload);
    }

    #[test]
    fn test_empty_round_trip() {
        let mut mem = StreamHandle::memory(b"", None).unwrap();
        mem.write(b"").unwrap();
        mem.rewind().unwrap();
        assert_eq!(mem.read(8).unwrap(), b"");
        assert!(mem.eof());
    }

    #[test]
    fn test_read_line_with_multibyte_terminator() {
        let mut mem = StreamHandle::memory(b"one<|>two<|>three", None).unwrap();
        mem.rewind().unwrap();
        assert_eq!(mem.read_line(Some("<|>")).unwrap(), "one<|>");
        assert_eq!(mem.read_line(Some("<|>")).unwrap(), "two<|>");
        assert_eq!(mem.read_line(Some("<|>")).unwrap(), "three");
        assert_eq!(mem.read_line(Some("<|>")).unwrap(), "");
        assert!(mem.eof());
    }

    #[test]
    fn test_read_line_uses_configured_eol() {
        let mut mem = StreamHandle::memory(b"a;b;c", None).unwrap();
        mem.set_eol(";");
        mem.rewind().unwrap();
        assert_eq!(mem.read_line(None).unwrap(), "a;");
        assert_eq!(mem.read_line(None).unwrap(), "b;");
        assert_eq!(mem.read_line(None).unwrap(), "c");
    }

    #[test]
    fn test_write_line_idempotent_terminator() {
        let mut mem = StreamHandle::memory(b"", None).unwrap();
        mem.write_line("abc", Some("\n")).unwrap();
        mem.write_line("abc\n", Some("\n")).unwrap();
        mem.rewind().unwrap();
        assert_eq!(mem.read_all().unwrap(), b"abc\nabc\n");
    }

    #[test]
    fn test_write_from_copies_everything() {
        let mut src = StreamHandle::memory(b"0123456789", None).unwrap();
        src.rewind().unwrap();
        let mut dst = StreamHandle::memory(b"", None).unwrap();

        let copied = dst.write_from(&mut src, None).unwrap();
        assert_eq!(copied, 10);
        assert!(src.eof());

        // A second copy finds the source exhausted.
        let copied = dst.write_from(&mut src, None).unwrap();
        assert_eq!(copied, 0);

        dst.rewind().unwrap();
        assert_eq!(dst.read_all().unwrap(), b"0123456789");
    }

    #[test]
    fn test_write_from_respects_max_len() {
        let mut src = StreamHandle::memory(b"0123456789", None).unwrap();
        src.rewind().unwrap();
        let mut dst = StreamHandle::memory(b"", None).unwrap();

        let copied = dst.write_from(&mut src, Some(4)).unwrap();
        assert_eq!(copied, 4);
        dst.rewind().unwrap();
        assert_eq!(dst.read_all().unwrap(), b"0123");
    }

    #[test]
    fn test_write_from_unreadable_source_returns_zero() {
        let mut src = StreamHandle::stdout();
        let mut dst = StreamHandle::memory(b"", None).unwrap();
        assert_eq!(dst.write_from(&mut src, None).unwrap(), 0);
    }

    #[test]
    fn test_write_from_unwritable_sink_returns_zero() {
        let mut src = StreamHandle::memory(b"abc", None).unwrap();
        src.rewind().unwrap();
        let mut dst = StreamHandle::stdin();
        assert_eq!(dst.write_from(&mut src, None).unwrap(), 0);
        // No partial attempt: the source cursor has not moved.
        assert_eq!(src.tell().unwrap(), 0);
    }

    #[test]
    fn test_len_preserves_position() {
        let mut mem = StreamHandle::memory(b"0123456789", None).unwrap();
        mem.seek(SeekFrom::Start(3)).unwrap();
        assert_eq!(mem.len().unwrap(), 10);
        assert_eq!(mem.tell().unwrap(), 3);
    }

    #[test]
    fn test_truncate_keeps_position() {
        let mut mem = StreamHandle::memory(b"0123456789", None).unwrap();
        mem.seek(SeekFrom::Start(8)).unwrap();
        mem.truncate(4).unwrap();
        assert_eq!(mem.tell().unwrap(), 8);
        assert_eq!(mem.len().unwrap(), 4);
    }

    #[test]
    fn test_eof_cleared_by_seek() {
        let mut mem = StreamHandle::memory(b"ab", None).unwrap();
        mem.rewind().unwrap();
        mem.read_all().unwrap();
        assert!(mem.eof());
        mem.rewind().unwrap();
        assert!(!mem.eof());
        assert_eq!(mem.read(2).unwrap(), b"ab");
    }

    #[test]
    fn test_events_emitted() {
        let mut mem = StreamHandle::memory(b"", None).unwrap();
        let collector = Arc::new(CollectingSubscriber::new(16));
        mem.subscribe(collector.clone());

        mem.write(b"xy").unwrap();
        mem.rewind().unwrap();
        mem.read(2).unwrap();

        let types: Vec<&str> = collector
            .events()
            .iter()
            .map(|(_, e)| e.event_type())
            .collect();
        assert_eq!(types, vec!["write", "seek", "read"]);
    }

    #[test]
    fn test_empty_read_is_reported() {
        let mut mem = StreamHandle::memory(b"", None).unwrap();
        let collector = Arc::new(CollectingSubscriber::new(4));
        mem.subscribe(collector.clone());
        mem.rewind().unwrap();
        mem.read(8).unwrap();
        assert!(collector
            .events()
            .iter()
            .any(|(_, e)| matches!(e, StreamEvent::Read { data } if data.is_empty())));
    }

    #[test]
    fn test_serialization_rejected() {
        let mem = StreamHandle::memory(b"", None).unwrap();
        let err = serde_json::to_string(&mem).unwrap_err();
        assert!(err.to_string().contains("cannot be serialized"));
    }

    #[test]
    fn test_info_snapshot() {
        let mem = StreamHandle::memory(b"", None).unwrap();
        let info = mem.info();
        assert_eq!(info.mode, "w+b");
        assert_eq!(info.kind, "memory");
        assert!(info.capabilities.contains(&"read".to_string()));
        assert!(!info.detached);
    }

    #[test]
    fn test_display_contents_restores_position() {
        let mut mem = StreamHandle::memory(b"full contents", None).unwrap();
        mem.seek(SeekFrom::Start(5)).unwrap();
        assert_eq!(mem.display_contents(), "full contents");
        assert_eq!(mem.tell().unwrap(), 5);
    }

    #[test]
    fn test_display_contents_unreadable_is_empty() {
        let mut out = StreamHandle::stdout();
        assert_eq!(out.display_contents(), "");
    }

    #[test]
    fn test_set_eol_returns_previous() {
        let mut mem = StreamHandle::memory(b"", None).unwrap();
        let previous = mem.set_eol("\r\n");
        assert_eq!(previous, DEFAULT_EOL);
        assert_eq!(mem.eol(), "\r\n");
    }

    #[test]
    fn test_open_missing_file_fails() {
        let err = StreamHandle::open("/definitely/not/a/real/path", "r").unwrap_err();
        assert!(matches!(err, StreamError::Open { .. }));
    }

    #[test]
    fn test_invalid_mode_fails() {
        let err = StreamHandle::open("/tmp/whatever", "rw").unwrap_err();
        assert!(matches!(
            err,
            StreamError::Capability(sluice_capability::CapabilityError::InvalidMode(_))
        ));
    }

    #[test]
    fn test_spill_threshold_transparent() {
        let mut mem = StreamHandle::memory(b"0123456789abcdef", Some(4)).unwrap();
        mem.rewind().unwrap();
        assert_eq!(mem.read_all().unwrap(), b"0123456789abcdef");
    }

    /// A readable pipe handle pre-filled with `content`. The returned writer
    /// keeps the write side open; drop it to let the reader reach
    /// end-of-stream.
    #[cfg(unix)]
    fn pipe_reader(content: &[u8]) -> (StreamHandle, std::fs::File) {
        use std::fs::File;
        use std::io::Write as _;
        use std::os::unix::io::FromRawFd;

        let mut fds = [0i32; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        // SAFETY: the fds come straight from pipe(2) and are owned here.
        let mut writer = unsafe { File::from_raw_fd(fds[1]) };
        writer.write_all(content).unwrap();
        let reader = unsafe { File::from_raw_fd(fds[0]) };
        (
            StreamHandle::from_raw(RawStream::File(reader), OpenMode::READ),
            writer,
        )
    }

    #[test]
    #[cfg(unix)]
    fn test_non_blocking_eof_tracked() {
        let (mut stream, writer) = pipe_reader(b"hi");
        drop(writer);
        stream.set_blocking(false).unwrap();

        assert_eq!(stream.read(2).unwrap(), b"hi");
        // The write side is closed: a zero-byte read is real end-of-stream
        // even with blocking disabled.
        assert_eq!(stream.read(16).unwrap(), b"");
        assert!(stream.eof());
    }

    #[test]
    #[cfg(unix)]
    fn test_non_blocking_empty_read_is_transient() {
        let (mut stream, writer) = pipe_reader(b"hi");
        stream.set_blocking(false).unwrap();

        assert_eq!(stream.read(2).unwrap(), b"hi");
        // The write side is still open: nothing available would block, so
        // the empty read does not mark end-of-stream.
        assert_eq!(stream.read(16).unwrap(), b"");
        assert!(!stream.eof());
        drop(writer);
    }

    #[test]
    #[cfg(unix)]
    fn test_non_blocking_read_line_eof() {
        let (mut stream, writer) = pipe_reader(b"a\nb");
        drop(writer);
        stream.set_blocking(false).unwrap();

        assert_eq!(stream.read_line(None).unwrap(), "a\n");
        assert_eq!(stream.read_line(None).unwrap(), "b");
        assert!(stream.eof());
    }
}
