//! # Sluice - Capability-Typed Streams
//!
//! Sluice wraps files, in-memory buffers and the process standard channels in
//! a uniform stream abstraction whose type tells you what you may do with it.
//!
//! ## Features
//!
//! - **Capability Typing**: A stream's read/write/seek surface is decided at
//!   construction and enforced before any raw I/O
//! - **Uniform Endpoints**: Files, spill-to-disk memory buffers, anonymous
//!   temp files and the standard channels behave the same
//! - **Observability**: Per-handle event subscription for reads, writes,
//!   seeks and blocking-mode changes
//! - **Embeddable**: Library-first design; the CLI is a thin consumer
//!
//! ## Quick Start
//!
//! ```
//! use sluice::prelude::*;
//!
//! # fn main() -> Result<(), SluiceError> {
//! let runtime = Sluice::builder()
//!     .with_eol("\n")
//!     .with_spill_threshold(1024 * 1024)
//!     .build();
//!
//! let mut stream = runtime.memory(b"")?;
//! stream.write_line("hello", None)?;
//! stream.rewind()?;
//! assert_eq!(stream.read_line(None)?, "hello\n");
//! # Ok(())
//! # }
//! ```
//!
//! ## Capability Model
//!
//! Every handle computes its capability flags once, from the open mode plus a
//! probe of the endpoint. The factory then picks the most capable typed
//! variant: seekable wins over read-write, which wins over the single-surface
//! variants. Operations outside a stream's subset fail fast with a precise
//! error rather than an obscure I/O failure.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use sluice_capability::CapabilityError;
use sluice_core::{Stream, StreamError, StreamHandle};
use sluice_observe::EventSubscriber;

// Re-export from sub-crates
pub use sluice_capability;
pub use sluice_core;
pub use sluice_observe;

/// Main entry point for Sluice.
pub struct Sluice;

impl Sluice {
    /// Create a new runtime builder.
    pub fn builder() -> SluiceBuilder {
        SluiceBuilder::new()
    }

    /// Create a runtime with default configuration.
    pub fn with_defaults() -> SluiceRuntime {
        SluiceBuilder::new().build()
    }
}

/// Builder for configuring the Sluice runtime.
pub struct SluiceBuilder {
    eol: Option<String>,
    spill_threshold: Option<usize>,
    host_mode: HostMode,
    event_subscribers: Vec<Arc<dyn EventSubscriber>>,
}

impl SluiceBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            eol: None,
            spill_threshold: None,
            host_mode: HostMode::Cli,
            event_subscribers: Vec::new(),
        }
    }

    /// Set the end-of-line marker applied to every stream the runtime opens.
    /// Streams fall back to the platform marker when unset.
    pub fn with_eol(mut self, eol: impl Into<String>) -> Self {
        self.eol = Some(eol.into());
        self
    }

    /// Set the byte threshold past which memory streams spill to temporary
    /// backing storage. Unset means memory streams never spill.
    pub fn with_spill_threshold(mut self, bytes: usize) -> Self {
        self.spill_threshold = Some(bytes);
        self
    }

    /// Set how the standard channels are mapped.
    pub fn with_host_mode(mut self, mode: HostMode) -> Self {
        self.host_mode = mode;
        self
    }

    /// Add an event subscriber attached to every stream the runtime opens.
    pub fn with_event_subscriber(mut self, subscriber: Arc<dyn EventSubscriber>) -> Self {
        self.event_subscribers.push(subscriber);
        self
    }

    /// Build the runtime.
    pub fn build(self) -> SluiceRuntime {
        debug!(
            host_mode = ?self.host_mode,
            subscribers = self.event_subscribers.len(),
            "building sluice runtime"
        );
        SluiceRuntime {
            eol: self.eol,
            spill_threshold: self.spill_threshold,
            host_mode: self.host_mode,
            event_subscribers: self.event_subscribers,
        }
    }
}

impl Default for SluiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured Sluice runtime.
///
/// The runtime carries the defaults applied to every stream it opens: the
/// end-of-line marker, the memory spill threshold, the standard-channel
/// mapping and the subscriber list. Streams stay independent once created;
/// the runtime holds no reference to them.
pub struct SluiceRuntime {
    eol: Option<String>,
    spill_threshold: Option<usize>,
    host_mode: HostMode,
    event_subscribers: Vec<Arc<dyn EventSubscriber>>,
}

impl SluiceRuntime {
    fn configure(&self, mut handle: StreamHandle) -> Result<Stream, SluiceError> {
        if let Some(eol) = &self.eol {
            handle.set_eol(eol);
        }
        for subscriber in &self.event_subscribers {
            handle.subscribe(Arc::clone(subscriber));
        }
        Ok(Stream::from_handle(handle)?)
    }

    /// The configured end-of-line marker, when one was set.
    pub fn eol(&self) -> Option<&str> {
        self.eol.as_deref()
    }

    /// The configured standard-channel mapping.
    pub fn host_mode(&self) -> HostMode {
        self.host_mode
    }

    /// Open the resource at `path` with `mode` and wrap it in the typed
    /// variant its capabilities call for.
    pub fn open(&self, path: impl AsRef<Path>, mode: &str) -> Result<Stream, SluiceError> {
        let path = path.as_ref();
        debug!(path = %path.display(), mode, "opening stream");
        self.configure(StreamHandle::open(path, mode)?)
    }

    /// An in-memory stream seeded with `initial`, spilling to temporary
    /// backing storage past the configured threshold.
    pub fn memory(&self, initial: &[u8]) -> Result<Stream, SluiceError> {
        self.configure(StreamHandle::memory(initial, self.spill_threshold)?)
    }

    /// An anonymous temporary-file stream seeded with `initial`.
    pub fn temp(&self, initial: &[u8]) -> Result<Stream, SluiceError> {
        self.configure(StreamHandle::temp(initial)?)
    }

    /// Build the process standard-channel context under this runtime's
    /// configuration. Meant to be constructed once at startup and passed by
    /// reference to consumers.
    pub fn std_streams(&self) -> Result<StdStreams, SluiceError> {
        let error = match self.host_mode {
            HostMode::Cli => self.configure(StreamHandle::stderr())?,
            HostMode::Hosted => self.configure(StreamHandle::stdout())?,
        };
        Ok(StdStreams {
            input: self.configure(StreamHandle::stdin())?,
            output: self.configure(StreamHandle::stdout())?,
            error,
        })
    }
}

impl std::fmt::Debug for SluiceRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SluiceRuntime")
            .field("eol", &self.eol)
            .field("spill_threshold", &self.spill_threshold)
            .field("host_mode", &self.host_mode)
            .finish()
    }
}

/// How the process standard channels are mapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostMode {
    /// Direct mapping: input, output and error each reach their own channel.
    Cli,
    /// Hosted environments often capture only the output channel; the error
    /// stream is aliased onto output so diagnostics are not lost.
    Hosted,
}

/// The process standard-channel context.
///
/// Built once by [`SluiceRuntime::std_streams`] and passed by reference to
/// consumers; there is no hidden global accessor. The wrapped channels are
/// persistent, so dropping the context never closes them.
pub struct StdStreams {
    input: Stream,
    output: Stream,
    error: Stream,
}

impl StdStreams {
    /// The process input channel, as a read-only stream.
    pub fn input(&mut self) -> &mut Stream {
        &mut self.input
    }

    /// The process output channel, as a write-only stream.
    pub fn output(&mut self) -> &mut Stream {
        &mut self.output
    }

    /// The diagnostic channel: standard error under [`HostMode::Cli`], the
    /// output channel under [`HostMode::Hosted`].
    pub fn error(&mut self) -> &mut Stream {
        &mut self.error
    }

    /// Borrow all three channels at once, for callers that pump one into
    /// another.
    pub fn split(&mut self) -> (&mut Stream, &mut Stream, &mut Stream) {
        (&mut self.input, &mut self.output, &mut self.error)
    }
}

/// Errors from the Sluice runtime.
#[derive(Debug, thiserror::Error)]
pub enum SluiceError {
    /// Stream error.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// Capability error.
    #[error("capability error: {0}")]
    Capability(#[from] CapabilityError),
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Main types
    pub use crate::{HostMode, Sluice, SluiceBuilder, SluiceError, SluiceRuntime, StdStreams};

    // Core types
    pub use sluice_core::{
        LineIterator, ReadStream, SeekStream, Stream, StreamError, StreamHandle, StreamKind,
        WriteStream,
    };

    // Capability types
    pub use sluice_capability::{Capability, CapabilitySet, OpenMode};

    // Observability
    pub use sluice_observe::{CollectingSubscriber, EventSubscriber, LoggingSubscriber, StreamEvent};
}
