//! Line iteration over readable streams.

use crate::error::{StreamError, StreamResult};
use crate::handle::StreamHandle;

use sluice_capability::{Capability, CapabilityError};

/// Forward-only iterator over the lines of a readable stream.
///
/// The iterator borrows the stream; the underlying read cursor is the only
/// real position state, the iterator just counts lines. Construction fails
/// on a stream without the Readable flag.
///
/// [`rewind`](LineIterator::rewind) restarts iteration from the top when the
/// stream is seekable. On a non-seekable stream it only resets the line
/// index without un-reading consumed bytes, so a second pass yields the
/// remaining unread tail rather than the full content.
///
/// # Example
///
/// ```
/// use sluice_core::StreamHandle;
///
/// let mut mem = StreamHandle::memory(b"a\nb\nc", None).unwrap();
/// mem.rewind().unwrap();
/// let lines: Vec<String> = mem.lines().unwrap().map(|l| l.unwrap()).collect();
/// assert_eq!(lines, vec!["a\n", "b\n", "c"]);
/// ```
#[derive(Debug)]
pub struct LineIterator<'a> {
    stream: &'a mut StreamHandle,
    index: i64,
}

impl<'a> LineIterator<'a> {
    /// Create an iterator over `stream`'s lines, starting at the current
    /// read position.
    pub fn new(stream: &'a mut StreamHandle) -> StreamResult<Self> {
        if stream.is_detached() {
            return Err(StreamError::ClosedOrDetached);
        }
        if !stream.is_readable() {
            return Err(CapabilityError::Missing(Capability::Readable).into());
        }
        Ok(Self { stream, index: -1 })
    }

    /// Index of the most recently yielded line; `-1` before the first.
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Restart iteration. Seeks the stream back to the start when it is
    /// seekable; otherwise only the line index is reset and iteration
    /// continues over the unread tail.
    pub fn rewind(&mut self) -> StreamResult<()> {
        if self.stream.is_seekable() {
            self.stream.rewind()?;
        }
        self.index = -1;
        Ok(())
    }
}

impl Iterator for LineIterator<'_> {
    type Item = StreamResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stream.eof() {
            return None;
        }
        match self.stream.read_line(None) {
            Ok(line) => {
                if line.is_empty() && self.stream.eof() {
                    return None;
                }
                self.index += 1;
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_lines(content: &[u8]) -> StreamHandle {
        let mut mem = StreamHandle::memory(content, None).unwrap();
        mem.rewind().unwrap();
        mem
    }

    #[test]
    fn test_yields_lines_with_terminators() {
        let mut mem = memory_lines(b"a\nb\nc");
        let lines: Vec<String> = mem.lines().unwrap().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["a\n", "b\n", "c"]);
    }

    #[test]
    fn test_terminates_after_exhaustion() {
        let mut mem = memory_lines(b"only\n");
        let mut iter = mem.lines().unwrap();
        assert_eq!(iter.next().unwrap().unwrap(), "only\n");
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_index_pre_increment() {
        let mut mem = memory_lines(b"x\ny\n");
        let mut iter = mem.lines().unwrap();
        assert_eq!(iter.index(), -1);
        iter.next();
        assert_eq!(iter.index(), 0);
        iter.next();
        assert_eq!(iter.index(), 1);
    }

    #[test]
    fn test_empty_stream_yields_nothing() {
        let mut mem = memory_lines(b"");
        assert!(mem.lines().unwrap().next().is_none());
    }

    #[test]
    fn test_rewind_on_seekable_restarts() {
        let mut mem = memory_lines(b"1\n2\n");
        let mut iter = mem.lines().unwrap();
        iter.next();
        iter.next();
        iter.rewind().unwrap();
        assert_eq!(iter.index(), -1);
        assert_eq!(iter.next().unwrap().unwrap(), "1\n");
    }

    #[test]
    fn test_unreadable_stream_rejected() {
        let mut out = StreamHandle::stdout();
        let err = out.lines().unwrap_err();
        assert!(err.is_not_readable());
    }

    #[test]
    fn test_detached_stream_rejected() {
        let mut mem = memory_lines(b"a\n");
        mem.detach();
        assert!(matches!(mem.lines(), Err(StreamError::ClosedOrDetached)));
    }

    #[test]
    fn test_custom_eol_from_handle() {
        let mut mem = memory_lines(b"a|b|c");
        mem.set_eol("|");
        let lines: Vec<String> = mem.lines().unwrap().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["a|", "b|", "c"]);
    }

    /// A non-seekable readable handle backed by a real pipe, pre-filled with
    /// `content` and closed on the write side.
    #[cfg(unix)]
    fn pipe_reader(content: &[u8]) -> StreamHandle {
        use std::fs::File;
        use std::io::Write as _;
        use std::os::unix::io::FromRawFd;

        use crate::raw::RawStream;
        use sluice_capability::OpenMode;

        let mut fds = [0i32; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        // SAFETY: the fds come straight from pipe(2) and are owned here.
        let mut writer = unsafe { File::from_raw_fd(fds[1]) };
        writer.write_all(content).unwrap();
        drop(writer);
        let reader = unsafe { File::from_raw_fd(fds[0]) };
        StreamHandle::from_raw(RawStream::File(reader), OpenMode::READ)
    }

    #[test]
    #[cfg(unix)]
    fn test_non_seekable_iteration() {
        let mut stream = pipe_reader(b"a\nb\nc");
        assert!(!stream.is_seekable());
        let lines: Vec<String> = stream.lines().unwrap().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["a\n", "b\n", "c"]);
    }

    #[test]
    #[cfg(unix)]
    fn test_non_blocking_iteration_terminates_at_eof() {
        let mut stream = pipe_reader(b"a\nb");
        stream.set_blocking(false).unwrap();

        // End-of-stream must terminate the iterator even with blocking
        // disabled; it must not degenerate into an endless run of empty
        // lines.
        let lines: Vec<String> = stream.lines().unwrap().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["a\n", "b"]);
        assert!(stream.eof());
    }

    #[test]
    #[cfg(unix)]
    fn test_non_seekable_rewind_yields_tail_only() {
        let mut stream = pipe_reader(b"a\nb\nc\n");
        let mut iter = stream.lines().unwrap();
        assert_eq!(iter.next().unwrap().unwrap(), "a\n");

        // The index resets but consumed bytes are not un-read: the second
        // pass covers only the remaining tail.
        iter.rewind().unwrap();
        assert_eq!(iter.index(), -1);
        let tail: Vec<String> = iter.map(Result::unwrap).collect();
        assert_eq!(tail, vec!["b\n", "c\n"]);
    }
}
