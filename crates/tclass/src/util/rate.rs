//! Rate conversion and formatting.
//!
//! Class rates travel in two units: callers and HFSC curves speak bits per
//! second, while HTB rates on the wire are bytes per second.
//!
//! ```
//! use tclass::util::rate;
//!
//! assert_eq!(rate::bits_to_bytes(8_000_000), 1_000_000);
//! assert_eq!(rate::format_bits(8_000_000), "8Mbit");
//! ```

/// Convert bits per second to bytes per second.
#[inline]
pub const fn bits_to_bytes(bps: u64) -> u64 {
    bps / 8
}

/// Convert bytes per second to bits per second, saturating.
#[inline]
pub const fn bytes_to_bits(bps: u64) -> u64 {
    bps.saturating_mul(8)
}

/// Format a rate in bits per second the way `tc` prints it.
pub fn format_bits(bits: u64) -> String {
    const UNITS: [(u64, &str); 3] = [
        (1_000_000_000, "Gbit"),
        (1_000_000, "Mbit"),
        (1_000, "Kbit"),
    ];

    for (scale, unit) in UNITS {
        if bits >= scale {
            if bits % scale == 0 {
                return format!("{}{}", bits / scale, unit);
            }
            return format!("{:.1}{}", bits as f64 / scale as f64, unit);
        }
    }
    format!("{}bit", bits)
}

/// Format a rate given in bytes per second.
pub fn format_bytes(bytes: u64) -> String {
    format_bits(bytes_to_bits(bytes))
}
