//! Interface reference type used when listing classes.
//!
//! [`InterfaceRef`] holds either an interface name or a kernel index. Names
//! are resolved through sysfs at the moment a request is built, so a caller
//! that already knows the index can skip the lookup entirely.

use std::fmt;

use super::error::{Error, Result};
use crate::util::ifname::{self, IfError};

/// A reference to a network interface, either by name or by index.
///
/// ```
/// use tclass::netlink::InterfaceRef;
///
/// let by_name: InterfaceRef = "eth0".into();
/// let by_index: InterfaceRef = 2u32.into();
/// assert_eq!(by_index.resolve().unwrap(), 2);
/// assert_eq!(by_name.to_string(), "eth0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InterfaceRef {
    /// Interface specified by name.
    Name(String),
    /// Interface specified by index.
    Index(u32),
}

impl InterfaceRef {
    /// Create an interface reference from a name.
    #[inline]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Create an interface reference from an index.
    #[inline]
    pub fn index(index: u32) -> Self {
        Self::Index(index)
    }

    /// Resolve to a kernel interface index.
    pub fn resolve(&self) -> Result<u32> {
        match self {
            Self::Index(idx) => Ok(*idx),
            Self::Name(name) => ifname::name_to_index(name).map_err(|e| match e {
                IfError::Io(io) => Error::Io(io),
                IfError::NotFound(_) | IfError::InvalidName(_) => Error::InterfaceNotFound {
                    name: name.clone(),
                },
            }),
        }
    }
}

impl fmt::Display for InterfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{}", name),
            Self::Index(idx) => write!(f, "ifindex:{}", idx),
        }
    }
}

impl From<&str> for InterfaceRef {
    #[inline]
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for InterfaceRef {
    #[inline]
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<u32> for InterfaceRef {
    #[inline]
    fn from(index: u32) -> Self {
        Self::Index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_index() {
        assert_eq!(InterfaceRef::index(7).resolve().unwrap(), 7);
    }

    #[test]
    fn test_resolve_missing_name() {
        let err = InterfaceRef::name("tclass-nope0").resolve().unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "interface not found: tclass-nope0");
    }

    #[test]
    fn test_resolve_invalid_name() {
        let err = InterfaceRef::name("bad/name").resolve().unwrap_err();
        assert!(matches!(err, Error::InterfaceNotFound { .. }));
    }

    #[test]
    fn test_display() {
        assert_eq!(InterfaceRef::name("eth0").to_string(), "eth0");
        assert_eq!(InterfaceRef::index(42).to_string(), "ifindex:42");
    }
}
