//! Sluice Core - Capability-Typed Streams
//!
//! This crate provides the core stream machinery for Sluice. It includes:
//!
//! - [`StreamHandle`]: The capability-checked wrapper around a raw endpoint
//! - [`RawStream`]: The closed set of raw I/O endpoints
//! - [`Stream`]: The typed variants and the factory that picks among them
//! - [`ReadStream`], [`WriteStream`], [`SeekStream`]: The behavior bundles
//! - [`LineIterator`]: Forward-only line iteration over readable streams
//!
//! # Quick Start
//!
//! ```
//! use sluice_core::prelude::*;
//!
//! # fn main() -> sluice_core::StreamResult<()> {
//! let mut stream = Stream::memory(b"", None)?;
//! stream.write_line("hello", None)?;
//! stream.rewind()?;
//! assert_eq!(stream.read_line(None)?, "hello\n");
//! # Ok(())
//! # }
//! ```
//!
//! # Capability Model
//!
//! Every handle computes its capability flags once at construction, from the
//! open mode and from probing the raw endpoint. Every operation checks its
//! required flag before touching the endpoint, so a misuse fails fast with a
//! precise error instead of surfacing as an obscure I/O failure. Closing or
//! detaching a handle clears the flags rather than recomputing them; the
//! inert handle then refuses everything.

pub mod error;
pub mod handle;
pub mod iter;
pub mod raw;
pub mod traits;
pub mod variant;

// Re-export main types at crate root
pub use error::{StreamError, StreamResult};
pub use handle::{HandleId, HandleInfo, StreamHandle, COPY_CHUNK, DEFAULT_EOL};
pub use iter::LineIterator;
pub use raw::RawStream;
pub use traits::{ReadStream, SeekStream, WriteStream};
pub use variant::{ReadOnly, ReadWrite, Seekable, Stream, StreamKind, WriteOnly};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use sluice_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{StreamError, StreamResult};
    pub use crate::handle::{HandleId, HandleInfo, StreamHandle};
    pub use crate::iter::LineIterator;
    pub use crate::raw::RawStream;
    pub use crate::traits::{ReadStream, SeekStream, WriteStream};
    pub use crate::variant::{Stream, StreamKind};
    pub use sluice_capability::{Capability, CapabilitySet, OpenMode};
}
