//! Error types for stream operations.
//!
//! Capability and state preconditions are checked locally and fail before
//! any raw I/O is attempted; raw failures are wrapped and surfaced, never
//! swallowed. Nothing is retried: every failure is terminal for the call.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use sluice_capability::{Capability, CapabilityError};

/// Errors from stream handle operations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The resource could not be opened.
    #[error("unable to open stream {path:?}: {source}")]
    Open {
        /// The path that failed to open.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A capability precondition was violated, or a variant claimed
    /// capabilities the handle does not carry.
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// Operation attempted on a closed or detached handle.
    #[error("stream is closed or detached")]
    ClosedOrDetached,

    /// The raw primitive reported a failure during read/write/seek/truncate.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The primitive wrote fewer bytes than handed to it. The underlying
    /// medium offers no partial-write recovery protocol, so a short write is
    /// a failure rather than a partial success.
    #[error("short write: expected {expected} bytes, wrote {written}")]
    ShortWrite {
        /// Bytes the caller asked to write.
        expected: usize,
        /// Bytes actually accepted.
        written: usize,
    },

    /// The handle type does not support the operation.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Attempted serialization of a live handle.
    #[error("a live stream handle cannot be serialized")]
    NotSerializable,
}

impl StreamError {
    /// Whether this is a missing-capability failure for `cap`.
    pub fn is_missing(&self, cap: Capability) -> bool {
        matches!(self, StreamError::Capability(CapabilityError::Missing(c)) if *c == cap)
    }

    /// Whether this is a `NotReadable` precondition failure.
    pub fn is_not_readable(&self) -> bool {
        self.is_missing(Capability::Readable)
    }

    /// Whether this is a `NotWritable` precondition failure.
    pub fn is_not_writable(&self) -> bool {
        self.is_missing(Capability::Writable)
    }

    /// Whether this is a `NotSeekable` precondition failure.
    pub fn is_not_seekable(&self) -> bool {
        self.is_missing(Capability::Seekable)
    }
}

/// Result type for stream operations.
pub type StreamResult<T> = std::result::Result<T, StreamError>;
