//! Capability flags and flag sets.
//!
//! Every stream handle carries a [`CapabilitySet`] computed once when the
//! handle is constructed. Operations consult the set before touching the
//! underlying I/O primitive; absence of a flag guarantees the operation
//! fails without side effects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;

/// A single capability of a stream handle.
///
/// # Example
///
/// ```
/// use sluice_capability::{Capability, CapabilitySet};
///
/// let caps = CapabilitySet::from_iter([Capability::Readable, Capability::Seekable]);
/// assert!(caps.contains(Capability::Readable));
/// assert!(!caps.contains(Capability::Writable));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// The handle can be read from.
    Readable,
    /// The handle can be written to.
    Writable,
    /// The handle supports cursor positioning.
    Seekable,
    /// The handle is owned by the process, not by its wrapper; it is never
    /// closed merely because the wrapper is dropped.
    Persistent,
    /// The handle is backed by a resource on the local filesystem.
    Local,
}

impl Capability {
    /// All capabilities, in bit order.
    pub const ALL: [Capability; 5] = [
        Capability::Readable,
        Capability::Writable,
        Capability::Seekable,
        Capability::Persistent,
        Capability::Local,
    ];

    pub(crate) fn bit(self) -> u8 {
        match self {
            Capability::Readable => 1 << 0,
            Capability::Writable => 1 << 1,
            Capability::Seekable => 1 << 2,
            Capability::Persistent => 1 << 3,
            Capability::Local => 1 << 4,
        }
    }

    /// Adjective form, used in error messages.
    pub fn adjective(self) -> &'static str {
        match self {
            Capability::Readable => "readable",
            Capability::Writable => "writable",
            Capability::Seekable => "seekable",
            Capability::Persistent => "persistent",
            Capability::Local => "local",
        }
    }

    /// Short lowercase name, as used in display output and filters.
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Readable => "read",
            Capability::Writable => "write",
            Capability::Seekable => "seek",
            Capability::Persistent => "persistent",
            Capability::Local => "local",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" | "readable" => Ok(Capability::Readable),
            "write" | "writable" => Ok(Capability::Writable),
            "seek" | "seekable" => Ok(Capability::Seekable),
            "persistent" => Ok(Capability::Persistent),
            "local" => Ok(Capability::Local),
            other => Err(CapabilityError::UnknownCapability(other.to_string())),
        }
    }
}

/// An immutable-by-convention set of [`Capability`] flags.
///
/// The set is a plain bitmask; it is computed once from a handle's open mode
/// and metadata, and cleared (not recomputed) when the handle is closed or
/// detached.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// Read + write + seek, the full I/O surface of an ordinary file.
    pub const READ_WRITE_SEEK: CapabilitySet = CapabilitySet(1 | 2 | 4);

    /// The empty set.
    pub const fn empty() -> Self {
        CapabilitySet(0)
    }

    /// Whether no capability is present.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether `cap` is present.
    pub fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    /// Add a capability, returning the new set.
    #[must_use]
    pub fn with(self, cap: Capability) -> Self {
        CapabilitySet(self.0 | cap.bit())
    }

    /// Remove a capability, returning the new set.
    #[must_use]
    pub fn without(self, cap: Capability) -> Self {
        CapabilitySet(self.0 & !cap.bit())
    }

    /// Add a capability in place.
    pub fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    /// Remove a capability in place.
    pub fn remove(&mut self, cap: Capability) {
        self.0 &= !cap.bit();
    }

    /// Clear all capabilities.
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Union of two sets.
    #[must_use]
    pub fn union(self, other: CapabilitySet) -> Self {
        CapabilitySet(self.0 | other.0)
    }

    /// Whether every capability in `other` is also in `self`.
    pub fn is_superset(self, other: CapabilitySet) -> bool {
        self.0 & other.0 == other.0
    }

    /// Iterate over the capabilities present in the set.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |cap| self.contains(*cap))
    }

    /// Number of capabilities present.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Check that `self` covers `required`, failing with the first missing
    /// capability otherwise.
    pub fn require(self, required: CapabilitySet) -> Result<(), CapabilityError> {
        match required.iter().find(|cap| !self.contains(*cap)) {
            None => Ok(()),
            Some(missing) => Err(CapabilityError::Missing(missing)),
        }
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter()
            .fold(CapabilitySet::empty(), CapabilitySet::with)
    }
}

impl From<Capability> for CapabilitySet {
    fn from(cap: Capability) -> Self {
        CapabilitySet::empty().with(cap)
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for cap in self.iter() {
            if !first {
                f.write_str("+")?;
            }
            f.write_str(cap.as_str())?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CapabilitySet({})", self)
    }
}
