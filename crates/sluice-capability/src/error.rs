//! Error types for the capability system.

use thiserror::Error;

use crate::capability::{Capability, CapabilitySet};

/// Errors related to capability resolution and enforcement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// A required capability is absent from the handle's flag set. Raised
    /// before any raw I/O is attempted.
    #[error("stream is not {}", .0.adjective())]
    Missing(Capability),

    /// The claimed capability set is not a subset of the handle's actual
    /// flags.
    #[error("invalid capability claim: requires {required}, handle has {actual}")]
    Mismatch {
        /// Capabilities the caller claimed.
        required: CapabilitySet,
        /// Capabilities the handle actually carries.
        actual: CapabilitySet,
    },

    /// The open-mode string could not be parsed.
    #[error("invalid open mode: {0:?}")]
    InvalidMode(String),

    /// An unknown capability name was supplied.
    #[error("unknown capability: {0:?}")]
    UnknownCapability(String),
}

/// Result type for capability operations.
pub type CapabilityResult<T> = std::result::Result<T, CapabilityError>;
