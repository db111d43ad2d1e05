//! Argument parsing for rates, sizes and times in `tc` notation.

use std::time::Duration;

/// Error type for parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("number out of range: {0}")]
    OutOfRange(String),

    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    #[error("invalid handle: {0}")]
    InvalidHandle(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Parse a u32, accepting a `0x` prefix for hex.
pub fn get_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    let val = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    }
    .map_err(|e| ParseError::InvalidNumber(format!("{}: {}", s, e)))?;

    u32::try_from(val).map_err(|_| ParseError::OutOfRange(s.to_string()))
}

/// Parse a rate in bits per second.
///
/// Supports suffixes: bit, kbit, mbit, gbit, tbit, their IEC forms
/// (kibit, ...), and bps/kbps/mbps/gbps which mean *bytes* per second as
/// in `tc`.
pub fn get_rate(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();
    let (num, unit) = split_number_unit(&s)?;

    let multiplier: f64 = match unit {
        "" | "bit" => 1.0,
        "kbit" | "k" => 1e3,
        "mbit" | "m" => 1e6,
        "gbit" | "g" => 1e9,
        "tbit" | "t" => 1e12,
        "kibit" => 1024.0,
        "mibit" => 1024.0 * 1024.0,
        "gibit" => 1024.0 * 1024.0 * 1024.0,
        "bps" => 8.0,
        "kbps" => 8e3,
        "mbps" => 8e6,
        "gbps" => 8e9,
        _ => return Err(ParseError::UnknownUnit(unit.to_string())),
    };

    to_u64(num * multiplier, &s)
}

/// Parse a size in bytes.
///
/// Supports suffixes: b, k/kb, m/mb, g/gb (binary multiples) and
/// kbit/mbit/gbit.
pub fn get_size(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();
    let (num, unit) = split_number_unit(&s)?;

    let multiplier: f64 = match unit {
        "" | "b" => 1.0,
        "k" | "kb" => 1024.0,
        "m" | "mb" => 1024.0 * 1024.0,
        "g" | "gb" => 1024.0 * 1024.0 * 1024.0,
        "kbit" => 1e3 / 8.0,
        "mbit" => 1e6 / 8.0,
        "gbit" => 1e9 / 8.0,
        _ => return Err(ParseError::UnknownUnit(unit.to_string())),
    };

    to_u64(num * multiplier, &s)
}

/// Parse a time duration.
///
/// A bare number is microseconds, matching the kernel's time unit.
pub fn get_time(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    let (num, unit) = split_number_unit(&s)?;

    let secs = match unit {
        "s" | "sec" | "secs" => num,
        "ms" | "msec" | "msecs" => num / 1e3,
        "" | "us" | "usec" | "usecs" => num / 1e6,
        _ => return Err(ParseError::UnknownUnit(unit.to_string())),
    };

    Duration::try_from_secs_f64(secs).map_err(|_| ParseError::OutOfRange(s.to_string()))
}

fn split_number_unit(s: &str) -> Result<(f64, &str)> {
    let idx = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(idx);
    let num = num
        .parse()
        .map_err(|_| ParseError::InvalidNumber(s.to_string()))?;
    Ok((num, unit))
}

fn to_u64(value: f64, original: &str) -> Result<u64> {
    if !value.is_finite() || value < 0.0 || value > u64::MAX as f64 {
        return Err(ParseError::OutOfRange(original.to_string()));
    }
    Ok(value as u64)
}
