//! Packet scheduler clock and rate table calculation.
//!
//! The kernel expresses HTB buffers and rate tables in scheduler ticks. The
//! tick length is published in `/proc/net/psched` as four hex words:
//! `t2us us2t clock_res hz`. [`PschedClock`] captures the derived factors so
//! conversions are pure functions of an explicit value rather than of
//! process-wide state.

use std::path::Path;

use zerocopy::IntoBytes;

use crate::netlink::{Error, Result};
use crate::netlink::types::tc::TcRateSpec;
use crate::netlink::types::tc::linklayer::LINKLAYER_ATM;

/// Location of the kernel scheduler clock parameters.
pub const PSCHED_PATH: &str = "/proc/net/psched";

/// Time units per second used by the traffic control ABI.
pub const TIME_UNITS_PER_SEC: f64 = 1_000_000.0;

/// Number of entries in a rate table.
pub const RTAB_SIZE: usize = 256;

/// MTU assumed when the caller passes zero.
const DEFAULT_RTAB_MTU: u32 = 2047;

/// Largest cell log for which `256 << cell_log` still fits in 32 bits.
const MAX_CELL_LOG: u8 = 23;

const ATM_CELL_PAYLOAD: u32 = 48;
const ATM_CELL_SIZE: u32 = 53;

/// Kernel packet scheduler clock parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PschedClock {
    tick_in_usec: f64,
    clock_factor: f64,
    hz: f64,
}

impl Default for PschedClock {
    /// Values reported by every kernel since high-resolution timers
    /// (`000003e8 00000040 000f4240 3b9aca00`).
    fn default() -> Self {
        Self::new(0x3e8, 0x40, 0x000f_4240, 0x3b9a_ca00)
    }
}

impl PschedClock {
    /// Build a clock from the four raw `/proc/net/psched` words.
    pub fn new(t2us: u64, us2t: u64, clock_res: u64, hz: u64) -> Self {
        let mut t2us = t2us;
        if clock_res == 1_000_000_000 {
            t2us = us2t;
        }

        let clock_factor = clock_res as f64 / TIME_UNITS_PER_SEC;
        let tick_in_usec = t2us as f64 / us2t as f64 * clock_factor;
        let hz = if clock_res == 1_000_000 {
            hz as f64
        } else {
            100.0
        };

        Self {
            tick_in_usec,
            clock_factor,
            hz,
        }
    }

    /// Parse the contents of `/proc/net/psched`.
    pub fn parse(contents: &str) -> Option<Self> {
        let words: Vec<u64> = contents
            .split_whitespace()
            .take(4)
            .map(|w| u64::from_str_radix(w, 16).ok())
            .collect::<Option<_>>()?;

        match words.as_slice() {
            &[t2us, us2t, clock_res, hz] if us2t != 0 => Some(Self::new(t2us, us2t, clock_res, hz)),
            _ => None,
        }
    }

    /// Read the clock from a psched file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents).ok_or_else(|| {
            Error::parse(
                format!("scheduler clock parameters in {}", path.display()),
                contents.as_bytes(),
            )
        })
    }

    /// Read the running kernel's clock, falling back to [`Default`].
    pub fn from_system() -> Self {
        match Self::from_file(PSCHED_PATH) {
            Ok(clock) => clock,
            Err(e) => {
                tracing::warn!(error = %e, "cannot read {}, using default clock", PSCHED_PATH);
                Self::default()
            }
        }
    }

    /// Scheduler ticks per microsecond.
    pub fn tick_in_usec(&self) -> f64 {
        self.tick_in_usec
    }

    /// Ratio of the clock resolution to the ABI time unit.
    pub fn clock_factor(&self) -> f64 {
        self.clock_factor
    }

    /// Kernel timer frequency used to size default buffers.
    pub fn hz(&self) -> f64 {
        self.hz
    }

    /// Convert microseconds to scheduler ticks.
    pub fn time_to_tick(&self, time: u32) -> u32 {
        (time as f64 * self.tick_in_usec) as u32
    }

    /// Ticks needed to transmit `size` bytes at `rate` bytes per second.
    ///
    /// A zero rate saturates to `u32::MAX`.
    pub fn xmit_time(&self, rate: u64, size: u32) -> u32 {
        let time = TIME_UNITS_PER_SEC * (size as f64 / rate as f64);
        self.time_to_tick(time as u32)
    }

    /// Fill a 256-entry transmission time table for `rate` bytes/sec.
    ///
    /// `cell_log` of `None` picks the smallest cell size for which 256 cells
    /// cover `mtu`. The chosen cell log, link layer and a cell alignment of
    /// -1 are written back into `spec`; `spec.mpu` is honored.
    pub fn calc_rtable(
        &self,
        spec: &mut TcRateSpec,
        rate: u64,
        cell_log: Option<u8>,
        mtu: u32,
        linklayer: u8,
    ) -> Result<[u32; RTAB_SIZE]> {
        if rate == 0 {
            return Err(Error::RateTable("zero rate".into()));
        }

        let mtu = if mtu == 0 { DEFAULT_RTAB_MTU } else { mtu };
        let cell_log = match cell_log {
            Some(log) if log > MAX_CELL_LOG => {
                return Err(Error::RateTable(format!(
                    "cell log {} exceeds {}",
                    log, MAX_CELL_LOG
                )));
            }
            Some(log) => log,
            None => {
                let mut log = 0u8;
                while (mtu >> log) > 255 {
                    log += 1;
                }
                log
            }
        };

        let mut table = [0u32; RTAB_SIZE];
        for (i, slot) in table.iter_mut().enumerate() {
            let size = adjust_size(((i as u32) + 1) << cell_log, spec.mpu as u32, linklayer);
            *slot = self.xmit_time(rate, size);
        }

        spec.cell_align = -1;
        spec.cell_log = cell_log;
        spec.linklayer = linklayer;

        Ok(table)
    }
}

/// Apply the minimum packet unit and link layer framing to a size.
pub fn adjust_size(size: u32, mpu: u32, linklayer: u8) -> u32 {
    let size = size.max(mpu);
    match linklayer {
        LINKLAYER_ATM => size.div_ceil(ATM_CELL_PAYLOAD) * ATM_CELL_SIZE,
        _ => size,
    }
}

/// Serialize a rate table in native byte order.
pub fn rtab_bytes(table: &[u32; RTAB_SIZE]) -> &[u8] {
    table.as_bytes()
}
