//! Interface name and index lookups through sysfs.

use std::path::Path;

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = 16;

const SYSFS_NET: &str = "/sys/class/net";

/// Error type for interface operations.
#[derive(Debug, thiserror::Error)]
pub enum IfError {
    #[error("interface not found: {0}")]
    NotFound(String),

    #[error("invalid interface name: {0}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IfError>;

/// Validate an interface name.
pub fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(IfError::InvalidName("empty name".to_string()));
    }

    if name.len() >= IFNAMSIZ {
        return Err(IfError::InvalidName(format!(
            "name too long (max {} chars)",
            IFNAMSIZ - 1
        )));
    }

    if name.contains('/') || name.contains('\0') || name.chars().any(char::is_whitespace) {
        return Err(IfError::InvalidName(format!("{:?}", name)));
    }

    Ok(())
}

/// Convert an interface name to index.
pub fn name_to_index(name: &str) -> Result<u32> {
    validate(name)?;

    let path = Path::new(SYSFS_NET).join(name).join("ifindex");
    let content =
        std::fs::read_to_string(&path).map_err(|_| IfError::NotFound(name.to_string()))?;

    content
        .trim()
        .parse()
        .map_err(|_| IfError::NotFound(name.to_string()))
}

/// Convert an interface index to name.
pub fn index_to_name(index: u32) -> Result<String> {
    if index == 0 {
        return Err(IfError::NotFound("index 0".to_string()));
    }

    for entry in std::fs::read_dir(SYSFS_NET)?.flatten() {
        let path = entry.path().join("ifindex");
        if let Ok(content) = std::fs::read_to_string(&path)
            && content.trim().parse::<u32>().ok() == Some(index)
        {
            return Ok(entry.file_name().to_string_lossy().into_owned());
        }
    }

    Err(IfError::NotFound(format!("index {}", index)))
}

/// Name for display purposes, falling back to `if<index>`.
pub fn display_name(index: u32) -> String {
    index_to_name(index).unwrap_or_else(|_| format!("if{}", index))
}
