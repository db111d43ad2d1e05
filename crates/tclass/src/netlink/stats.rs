//! Class statistics and the two kernel encodings that carry them.
//!
//! Kernels report class counters either as a single legacy `TCA_STATS`
//! record (`struct tc_stats`) or as a nested `TCA_STATS2` list of
//! `gnet_stats_*` records. Both decode into [`ClassStatistics`]. When a
//! message carries both, the nested form wins regardless of attribute
//! order; [`StatsState`] tracks that precedence.

use zerocopy::FromBytes;

use super::error::{Error, Result};
use super::parse::parse_attrs;
use super::types::tc::{
    GnetStatsBasic, GnetStatsQueue, GnetStatsRateEst, TcStats, tca_stats,
};

/// Byte and packet counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicStats {
    /// Bytes transmitted.
    pub bytes: u64,
    /// Packets transmitted.
    pub packets: u32,
}

impl BasicStats {
    /// Counter increase since a previous sample.
    ///
    /// Uses saturating subtraction so a counter reset yields zero rather
    /// than a wrapped value.
    pub fn delta(&self, previous: &Self) -> Self {
        Self {
            bytes: self.bytes.saturating_sub(previous.bytes),
            packets: self.packets.saturating_sub(previous.packets),
        }
    }
}

/// Queue counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Current queue length in packets.
    pub qlen: u32,
    /// Backlog in bytes.
    pub backlog: u32,
    /// Total drops.
    pub drops: u32,
    /// Requeue count.
    pub requeues: u32,
    /// Overlimit count.
    pub overlimits: u32,
}

impl QueueStats {
    /// Counter increase since a previous sample.
    ///
    /// `qlen` and `backlog` are gauges and are taken from `self`.
    pub fn delta(&self, previous: &Self) -> Self {
        Self {
            qlen: self.qlen,
            backlog: self.backlog,
            drops: self.drops.saturating_sub(previous.drops),
            requeues: self.requeues.saturating_sub(previous.requeues),
            overlimits: self.overlimits.saturating_sub(previous.overlimits),
        }
    }
}

/// Rate estimator output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateEstStats {
    /// Bytes per second.
    pub bps: u32,
    /// Packets per second.
    pub pps: u32,
}

/// Counters reported for a class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassStatistics {
    pub basic: BasicStats,
    pub queue: QueueStats,
    pub rate_est: RateEstStats,
    /// Counters for traffic handled by hardware offload, when reported.
    pub basic_hw: Option<BasicStats>,
}

fn read_record<T: FromBytes>(data: &[u8], group: &str) -> Result<T> {
    T::read_from_prefix(data).map(|(record, _)| record).map_err(|_| {
        Error::parse(
            format!(
                "{}: expected {} bytes, got {}",
                group,
                std::mem::size_of::<T>(),
                data.len()
            ),
            data,
        )
    })
}

impl ClassStatistics {
    /// Decode a legacy `TCA_STATS` payload.
    pub fn from_legacy(data: &[u8]) -> Result<Self> {
        let raw: TcStats = read_record(data, "legacy class statistics")?;

        Ok(Self {
            basic: BasicStats {
                bytes: raw.bytes,
                packets: raw.packets,
            },
            queue: QueueStats {
                qlen: raw.qlen,
                backlog: raw.backlog,
                drops: raw.drops,
                requeues: 0,
                overlimits: raw.overlimits,
            },
            rate_est: RateEstStats {
                bps: raw.bps,
                pps: raw.pps,
            },
            basic_hw: None,
        })
    }

    /// Decode a nested `TCA_STATS2` payload.
    ///
    /// Groups the payload does not contain stay zero. Unknown groups are
    /// skipped.
    pub fn from_stats2(data: &[u8]) -> Result<Self> {
        let mut stats = Self::default();

        for (kind, payload) in parse_attrs(data)? {
            match kind {
                tca_stats::TCA_STATS_BASIC => {
                    stats.basic = basic_from(read_record(payload, "ClassStatistics.Basic")?);
                }
                tca_stats::TCA_STATS_QUEUE => {
                    let raw: GnetStatsQueue = read_record(payload, "ClassStatistics.Queue")?;
                    stats.queue = QueueStats {
                        qlen: raw.qlen,
                        backlog: raw.backlog,
                        drops: raw.drops,
                        requeues: raw.requeues,
                        overlimits: raw.overlimits,
                    };
                }
                tca_stats::TCA_STATS_RATE_EST => {
                    let raw: GnetStatsRateEst = read_record(payload, "ClassStatistics.RateEst")?;
                    stats.rate_est = RateEstStats {
                        bps: raw.bps,
                        pps: raw.pps,
                    };
                }
                tca_stats::TCA_STATS_BASIC_HW => {
                    stats.basic_hw =
                        Some(basic_from(read_record(payload, "ClassStatistics.BasicHw")?));
                }
                _ => {}
            }
        }

        Ok(stats)
    }
}

fn basic_from(raw: GnetStatsBasic) -> BasicStats {
    BasicStats {
        bytes: raw.bytes,
        packets: raw.packets,
    }
}

/// Which statistics encoding has been seen so far for one message.
///
/// Transitions only move forward: a legacy record never replaces a modern
/// one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatsState {
    #[default]
    Unset,
    Legacy(ClassStatistics),
    Modern(ClassStatistics),
}

impl StatsState {
    /// Record a decoded legacy block.
    pub fn legacy(&mut self, stats: ClassStatistics) {
        if !matches!(self, Self::Modern(_)) {
            *self = Self::Legacy(stats);
        }
    }

    /// Record a decoded modern block.
    pub fn modern(&mut self, stats: ClassStatistics) {
        *self = Self::Modern(stats);
    }

    /// The winning statistics, if any block was seen.
    pub fn into_statistics(self) -> Option<ClassStatistics> {
        match self {
            Self::Unset => None,
            Self::Legacy(stats) | Self::Modern(stats) => Some(stats),
        }
    }
}
