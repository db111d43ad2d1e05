//! Shared utilities.

pub mod hexdump;
pub mod ifname;
pub mod parse;
pub mod rate;

pub use parse::{get_rate, get_size, get_time, get_u32};
