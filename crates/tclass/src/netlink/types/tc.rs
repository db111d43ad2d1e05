//! Traffic control wire structures and attribute ids.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::netlink::error::{Error, Result};

/// Traffic control message (struct tcmsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct TcMsg {
    /// Address family.
    pub tcm_family: u8,
    /// Padding.
    pub tcm_pad1: u8,
    /// Padding.
    pub tcm_pad2: u16,
    /// Interface index.
    pub tcm_ifindex: i32,
    /// Object handle.
    pub tcm_handle: u32,
    /// Parent handle.
    pub tcm_parent: u32,
    /// Info (depends on message type).
    pub tcm_info: u32,
}

impl TcMsg {
    /// Size of this structure.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Create a new TC message with family AF_UNSPEC.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interface index.
    pub fn with_ifindex(mut self, ifindex: i32) -> Self {
        self.tcm_ifindex = ifindex;
        self
    }

    /// Set the handle.
    pub fn with_handle(mut self, handle: u32) -> Self {
        self.tcm_handle = handle;
        self
    }

    /// Set the parent.
    pub fn with_parent(mut self, parent: u32) -> Self {
        self.tcm_parent = parent;
        self
    }

    /// Parse from the start of a message body.
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::parse("tcmsg header", data))
    }
}

/// Top-level TC attributes (TCA_*).
pub mod tca {
    pub const TCA_UNSPEC: u16 = 0;
    pub const TCA_KIND: u16 = 1;
    pub const TCA_OPTIONS: u16 = 2;
    pub const TCA_STATS: u16 = 3;
    pub const TCA_XSTATS: u16 = 4;
    pub const TCA_RATE: u16 = 5;
    pub const TCA_FCNT: u16 = 6;
    pub const TCA_STATS2: u16 = 7;
}

/// TCA_STATS2 nested attributes.
pub mod tca_stats {
    pub const TCA_STATS_UNSPEC: u16 = 0;
    pub const TCA_STATS_BASIC: u16 = 1;
    pub const TCA_STATS_RATE_EST: u16 = 2;
    pub const TCA_STATS_QUEUE: u16 = 3;
    pub const TCA_STATS_APP: u16 = 4;
    pub const TCA_STATS_RATE_EST64: u16 = 5;
    pub const TCA_STATS_PAD: u16 = 6;
    pub const TCA_STATS_BASIC_HW: u16 = 7;
}

/// HTB class options.
pub mod htb {
    pub const TCA_HTB_UNSPEC: u16 = 0;
    pub const TCA_HTB_PARMS: u16 = 1;
    pub const TCA_HTB_INIT: u16 = 2;
    pub const TCA_HTB_CTAB: u16 = 3;
    pub const TCA_HTB_RTAB: u16 = 4;
    pub const TCA_HTB_DIRECT_QLEN: u16 = 5;
    pub const TCA_HTB_RATE64: u16 = 6;
    pub const TCA_HTB_CEIL64: u16 = 7;
}

/// HFSC class options.
pub mod hfsc {
    pub const TCA_HFSC_UNSPEC: u16 = 0;
    pub const TCA_HFSC_RSC: u16 = 1;
    pub const TCA_HFSC_FSC: u16 = 2;
    pub const TCA_HFSC_USC: u16 = 3;
}

/// Link layer types used by the rate table calculator.
pub mod linklayer {
    pub const LINKLAYER_UNAWARE: u8 = 0;
    pub const LINKLAYER_ETHERNET: u8 = 1;
    pub const LINKLAYER_ATM: u8 = 2;
}

/// Rate specification (struct tc_ratespec).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct TcRateSpec {
    pub cell_log: u8,
    pub linklayer: u8,
    pub overhead: u16,
    pub cell_align: i16,
    pub mpu: u16,
    /// Rate in bytes per second, low 32 bits.
    pub rate: u32,
}

impl TcRateSpec {
    /// Create a rate spec carrying only a rate.
    pub fn new(rate: u32) -> Self {
        Self {
            rate,
            ..Default::default()
        }
    }
}

/// HTB class parameters (struct tc_htb_opt).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct TcHtbOpt {
    pub rate: TcRateSpec,
    pub ceil: TcRateSpec,
    pub buffer: u32,
    pub cbuffer: u32,
    pub quantum: u32,
    pub level: u32,
    pub prio: u32,
}

impl TcHtbOpt {
    /// Size of this structure.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// HFSC service curve (struct tc_service_curve).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct TcServiceCurve {
    /// Slope of the first segment in bytes/sec.
    pub m1: u32,
    /// X-projection of the first segment.
    pub d: u32,
    /// Slope of the second segment in bytes/sec.
    pub m2: u32,
}

impl TcServiceCurve {
    /// Size of this structure.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Legacy TC statistics (struct tc_stats), read without trailing padding.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct TcStats {
    pub bytes: u64,
    pub packets: u32,
    pub drops: u32,
    pub overlimits: u32,
    pub bps: u32,
    pub pps: u32,
    pub qlen: u32,
    pub backlog: u32,
}

impl TcStats {
    /// Minimum payload length.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Basic counters (struct gnet_stats_basic), read without trailing padding.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct GnetStatsBasic {
    pub bytes: u64,
    pub packets: u32,
}

impl GnetStatsBasic {
    /// Minimum payload length.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Queue counters (struct gnet_stats_queue).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct GnetStatsQueue {
    pub qlen: u32,
    pub backlog: u32,
    pub drops: u32,
    pub requeues: u32,
    pub overlimits: u32,
}

impl GnetStatsQueue {
    /// Minimum payload length.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Rate estimator (struct gnet_stats_rate_est).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct GnetStatsRateEst {
    pub bps: u32,
    pub pps: u32,
}

impl GnetStatsRateEst {
    /// Minimum payload length.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}
