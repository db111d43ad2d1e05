//! Canonical hex dump formatting for diagnostics.
//!
//! Produces the classic `hexdump -C` layout: an offset column, sixteen
//! space-separated bytes split into two groups of eight, and a printable
//! ASCII column.

use std::fmt::Write;

const BYTES_PER_LINE: usize = 16;

/// Format `data` as a canonical hex dump.
///
/// # Example
///
/// ```
/// use tclass::util::hexdump;
///
/// let out = hexdump::dump(b"htb\0");
/// assert_eq!(
///     out,
///     "00000000  68 74 62 00                                       |htb.|\n"
/// );
/// ```
pub fn dump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(BYTES_PER_LINE) * 80);

    for (line, chunk) in data.chunks(BYTES_PER_LINE).enumerate() {
        let _ = write!(out, "{:08x}  ", line * BYTES_PER_LINE);

        for i in 0..BYTES_PER_LINE {
            match chunk.get(i) {
                Some(b) => {
                    let _ = write!(out, "{:02x} ", b);
                }
                None => out.push_str("   "),
            }
            if i == 7 {
                out.push(' ');
            }
        }

        out.push(' ');
        out.push('|');
        for &b in chunk {
            out.push(if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            });
        }
        out.push_str("|\n");
    }

    out
}
