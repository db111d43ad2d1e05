//! Error types for netlink class operations.

use std::io;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while encoding, decoding or exchanging class messages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Kernel returned an error code.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Message was truncated.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected message length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Invalid message framing on the transport.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Malformed or unexpected-length payload in a class dump.
    ///
    /// `dump` holds a hex dump of the offending bytes.
    #[error("parse error: {context}\n{dump}")]
    Parse {
        /// What was being decoded.
        context: String,
        /// Hex dump of the bytes that failed to decode.
        dump: String,
    },

    /// The rate table calculator rejected a rate/MTU/link-layer combination.
    #[error("rate table: {0}")]
    RateTable(String),

    /// A class variant whose kind string does not match its concrete type.
    #[error("unsupported class variant: generic class cannot carry kind {kind:?}")]
    UnsupportedVariant {
        /// The offending kind string.
        kind: String,
    },

    /// Interface not found.
    #[error("interface not found: {name}")]
    InterfaceNotFound {
        /// The interface name that was not found.
        name: String,
    },
}

impl Error {
    /// Create a kernel error from an errno value.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::Kernel {
            errno: -errno,
            message,
        }
    }

    /// Build a parse error carrying a hex dump of `data`.
    pub fn parse(context: impl Into<String>, data: &[u8]) -> Self {
        Self::Parse {
            context: context.into(),
            dump: crate::util::hexdump::dump(data),
        }
    }

    /// Check if this error came from the transport rather than the class codec.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Kernel { .. } | Self::Truncated { .. } | Self::InvalidMessage(_)
        )
    }

    /// Check if this is a decode failure.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::InvalidAttribute(_))
    }

    /// Check if this is a "not found" error (ENOENT, ENODEV, etc.).
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } => matches!(*errno, libc::ENOENT | libc::ENODEV),
            Self::InterfaceNotFound { .. } => true,
            _ => false,
        }
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Kernel { errno, .. } if matches!(*errno, libc::EPERM | libc::EACCES))
    }

    /// Check if this is a "already exists" error (EEXIST).
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::Kernel { errno, .. } if *errno == libc::EEXIST)
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}
