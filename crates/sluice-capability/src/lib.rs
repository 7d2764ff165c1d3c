//! Sluice Capability System
//!
//! This crate provides the capability model for sluice streams. A stream
//! handle's legal operations are determined by a small set of flags resolved
//! once at construction time:
//!
//! - [`Capability::Readable`] / [`Capability::Writable`] follow from the
//!   open mode (`r` reads; `w`, `a` and `x` write; a `+` suffix grants both)
//! - [`Capability::Seekable`] and [`Capability::Local`] follow from handle
//!   metadata
//! - [`Capability::Persistent`] marks process-owned handles that survive
//!   their wrapper
//!
//! # Usage
//!
//! ```
//! use sluice_capability::{Capability, CapabilitySet, OpenMode};
//!
//! let mode: OpenMode = "a".parse().unwrap();
//! let caps = mode.capabilities().with(Capability::Local);
//!
//! assert!(caps.contains(Capability::Writable));
//! assert!(caps.require(Capability::Readable.into()).is_err());
//! ```

pub mod capability;
pub mod error;
pub mod mode;

// Re-export main types
pub use capability::{Capability, CapabilitySet};
pub use error::{CapabilityError, CapabilityResult};
pub use mode::{ModeBase, OpenMode};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::capability::{Capability, CapabilitySet};
    pub use crate::error::{CapabilityError, CapabilityResult};
    pub use crate::mode::{ModeBase, OpenMode};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_to_capabilities() {
        let caps = "r".parse::<OpenMode>().unwrap().capabilities();
        assert!(caps.contains(Capability::Readable));
        assert!(!caps.contains(Capability::Writable));

        let caps = "w+".parse::<OpenMode>().unwrap().capabilities();
        assert!(caps.is_superset(CapabilitySet::from_iter([
            Capability::Readable,
            Capability::Writable,
        ])));
    }

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let _ = CapabilitySet::empty();
        let _: OpenMode = "r+".parse().unwrap();
    }
}
