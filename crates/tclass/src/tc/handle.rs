//! TC handle parsing and formatting utilities.
//!
//! TC handles are 32-bit values split into major:minor parts (16 bits each).
//! They identify qdiscs and classes in the traffic control hierarchy.

use std::fmt;
use std::str::FromStr;

use crate::util::parse::ParseError;

/// Root qdisc handle.
pub const ROOT: u32 = 0xFFFF_FFFF;
/// Ingress qdisc handle.
pub const INGRESS: u32 = 0xFFFF_FFF1;
/// Clsact qdisc handle.
pub const CLSACT: u32 = 0xFFFF_FFF2;
/// Unspecified handle.
pub const UNSPEC: u32 = 0;

/// A parsed TC handle with major:minor components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Handle {
    /// Major number (upper 16 bits).
    pub major: u16,
    /// Minor number (lower 16 bits).
    pub minor: u16,
}

impl Handle {
    /// Create a new handle from major:minor components.
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Create a handle from a raw 32-bit value.
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            major: major(raw),
            minor: minor(raw),
        }
    }

    /// Convert to a raw 32-bit value.
    pub const fn to_raw(self) -> u32 {
        make(self.major, self.minor)
    }
}

impl From<u32> for Handle {
    fn from(raw: u32) -> Self {
        Self::from_raw(raw)
    }
}

impl From<Handle> for u32 {
    fn from(handle: Handle) -> Self {
        handle.to_raw()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(self.to_raw()))
    }
}

impl FromStr for Handle {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
            .map(Self::from_raw)
            .ok_or_else(|| ParseError::InvalidHandle(s.to_string()))
    }
}

/// Make a handle from major:minor components.
pub const fn make(major: u16, minor: u16) -> u32 {
    ((major as u32) << 16) | (minor as u32)
}

/// Get the major number from a handle.
pub const fn major(handle: u32) -> u16 {
    (handle >> 16) as u16
}

/// Get the minor number from a handle.
pub const fn minor(handle: u32) -> u16 {
    (handle & 0xFFFF) as u16
}

/// Format a handle as a string (e.g., "1:", "1:10", "root").
pub fn format(handle: u32) -> String {
    match handle {
        ROOT => "root".to_string(),
        INGRESS => "ingress".to_string(),
        CLSACT => "clsact".to_string(),
        UNSPEC => "none".to_string(),
        _ => {
            let maj = major(handle);
            let min = minor(handle);
            if min == 0 {
                format!("{:x}:", maj)
            } else {
                format!("{:x}:{:x}", maj, min)
            }
        }
    }
}

/// Parse a handle from a string (e.g., "1:0", "1:", "root").
///
/// Both halves are hexadecimal. Returns `None` if the string is not a
/// valid handle.
pub fn parse(s: &str) -> Option<u32> {
    match s {
        "root" => Some(ROOT),
        "ingress" => Some(INGRESS),
        "clsact" => Some(CLSACT),
        "none" => Some(UNSPEC),
        _ => {
            let (maj, min) = s.split_once(':')?;
            let major = u16::from_str_radix(maj, 16).ok()?;
            let minor = if min.is_empty() {
                0
            } else {
                u16::from_str_radix(min, 16).ok()?
            };
            Some(make(major, minor))
        }
    }
}
