//! Open-mode strings and their capability semantics.
//!
//! Modes follow the classic `fopen` grammar: a base of `r`, `w`, `a` or `x`,
//! an optional `+` extending the mode to read-write, and an optional `b` or
//! `t` translation qualifier. When no qualifier is given the binary
//! qualifier is implied, so byte-exact semantics hold on every platform.

use std::fmt;
use std::fs::OpenOptions;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::capability::{Capability, CapabilitySet};
use crate::error::CapabilityError;

/// The base of an open mode, before any `+` or translation qualifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeBase {
    /// `r` - open existing for reading.
    Read,
    /// `w` - create or truncate for writing.
    Write,
    /// `a` - create or open for appending.
    Append,
    /// `x` - create new for writing, failing if the path exists.
    Exclusive,
}

impl ModeBase {
    fn as_char(self) -> char {
        match self {
            ModeBase::Read => 'r',
            ModeBase::Write => 'w',
            ModeBase::Append => 'a',
            ModeBase::Exclusive => 'x',
        }
    }
}

/// A parsed open mode.
///
/// # Example
///
/// ```
/// use sluice_capability::{Capability, OpenMode};
///
/// let mode: OpenMode = "w+".parse().unwrap();
/// assert!(mode.capabilities().contains(Capability::Readable));
/// assert!(mode.capabilities().contains(Capability::Writable));
/// assert_eq!(mode.normalized(), "w+b");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenMode {
    base: ModeBase,
    /// `+` present: both read and write.
    extended: bool,
    /// Explicit `t` qualifier; everything else is treated as binary.
    text: bool,
}

impl OpenMode {
    /// Plain read mode (`r`).
    pub const READ: OpenMode = OpenMode {
        base: ModeBase::Read,
        extended: false,
        text: false,
    };

    /// Plain write mode (`w`).
    pub const WRITE: OpenMode = OpenMode {
        base: ModeBase::Write,
        extended: false,
        text: false,
    };

    /// Read-write mode over existing content (`r+`).
    pub const READ_WRITE: OpenMode = OpenMode {
        base: ModeBase::Read,
        extended: true,
        text: false,
    };

    /// Truncating read-write mode (`w+`).
    pub const WRITE_READ: OpenMode = OpenMode {
        base: ModeBase::Write,
        extended: true,
        text: false,
    };

    /// Parse a mode string.
    pub fn parse(mode: &str) -> Result<Self, CapabilityError> {
        let invalid = || CapabilityError::InvalidMode(mode.to_string());

        let mut chars = mode.chars();
        let base = match chars.next().ok_or_else(invalid)? {
            'r' => ModeBase::Read,
            'w' => ModeBase::Write,
            'a' => ModeBase::Append,
            'x' => ModeBase::Exclusive,
            _ => return Err(invalid()),
        };

        // `+` and the translation qualifier may come in either order
        // (`r+b` and `rb+` are both accepted, as in fopen), each at most
        // once.
        let mut extended = false;
        let mut translation: Option<bool> = None;
        for c in chars {
            match c {
                '+' if !extended => extended = true,
                'b' if translation.is_none() => translation = Some(false),
                't' if translation.is_none() => translation = Some(true),
                _ => return Err(invalid()),
            }
        }

        Ok(OpenMode {
            base,
            extended,
            text: translation.unwrap_or(false),
        })
    }

    /// The mode base.
    pub fn base(self) -> ModeBase {
        self.base
    }

    /// Whether the `+` extension is present.
    pub fn is_extended(self) -> bool {
        self.extended
    }

    /// The capabilities implied by the mode: `r` grants read, `w`/`a`/`x`
    /// grant write, `+` grants both.
    pub fn capabilities(self) -> CapabilitySet {
        if self.extended {
            CapabilitySet::from(Capability::Readable).with(Capability::Writable)
        } else if self.base == ModeBase::Read {
            Capability::Readable.into()
        } else {
            Capability::Writable.into()
        }
    }

    /// The mode string with the translation qualifier made explicit. Binary
    /// is appended whenever text was not requested.
    pub fn normalized(self) -> String {
        let mut s = String::with_capacity(3);
        s.push(self.base.as_char());
        if self.extended {
            s.push('+');
        }
        s.push(if self.text { 't' } else { 'b' });
        s
    }

    /// Map the mode onto [`OpenOptions`].
    pub fn open_options(self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        match self.base {
            ModeBase::Read => {
                opts.read(true).write(self.extended);
            }
            ModeBase::Write => {
                opts.write(true)
                    .create(true)
                    .truncate(true)
                    .read(self.extended);
            }
            ModeBase::Append => {
                opts.append(true).create(true).read(self.extended);
            }
            ModeBase::Exclusive => {
                opts.write(true).create_new(true).read(self.extended);
            }
        }
        opts
    }
}

impl FromStr for OpenMode {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OpenMode::parse(s)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}
