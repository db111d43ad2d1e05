//! Traffic control classes.
//!
//! A [`Class`] is one node of a classful qdisc hierarchy. HTB and HFSC
//! classes carry typed parameters; every other kind is kept as a
//! [`GenericClass`] holding only its kind string.
//!
//! # Units
//!
//! [`HtbClass`] stores rates in **bytes** per second, the unit the kernel
//! uses. Callers configure it through [`HtbClassConfig`] in **bits** per
//! second and the constructor converts. [`ServiceCurve`] slopes stay in bits
//! per second; the codec converts to bytes on the way out and back on the
//! way in.
//!
//! # Example
//!
//! ```ignore
//! use tclass::netlink::Connection;
//! use tclass::netlink::class::{Class, ClassAttrs, HtbClass, HtbClassConfig};
//! use tclass::tc::handle;
//!
//! let conn = Connection::new()?;
//! let attrs = ClassAttrs::new(2, handle::make(1, 0x10), handle::make(1, 0));
//! let cfg = HtbClassConfig::new().rate(8_000_000).ceil(16_000_000).build();
//! conn.classes().add(&HtbClass::new(attrs, &cfg).into()).await?;
//! ```

mod decode;
mod encode;
mod ops;

use std::fmt;

pub use decode::{decode_class, decode_dump};
pub use encode::{ClassCommand, encode_class, encode_list_request};
pub use ops::Classes;

use super::stats::ClassStatistics;
use crate::tc::PschedClock;
use crate::tc::handle;
use crate::util::rate;

/// MTU used to size default HTB buffers and rate tables.
pub const HTB_DEFAULT_MTU: u32 = 1600;

/// Attributes shared by every class kind.
///
/// `handle` and `parent` identify the class in the kernel and must not be
/// altered between an add and a later change or replace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassAttrs {
    pub link_index: i32,
    pub handle: u32,
    pub parent: u32,
    /// Counters, only present on classes read back from the kernel.
    pub statistics: Option<ClassStatistics>,
}

impl ClassAttrs {
    pub fn new(link_index: i32, handle: u32, parent: u32) -> Self {
        Self {
            link_index,
            handle,
            parent,
            statistics: None,
        }
    }
}

impl fmt::Display for ClassAttrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{LinkIndex: {}, Handle: {}, Parent: {}}}",
            self.link_index,
            handle::format(self.handle),
            handle::format(self.parent)
        )
    }
}

/// Caller-facing HTB parameters.
///
/// Rates are in bits per second; `buffer` and `cbuffer` are byte budgets
/// and default to `rate / HZ + MTU` when left at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtbClassConfig {
    pub rate: u64,
    pub ceil: u64,
    pub buffer: u32,
    pub cbuffer: u32,
    pub quantum: u32,
    pub prio: u32,
}

impl HtbClassConfig {
    /// Create an empty configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the guaranteed rate in bits per second.
    pub fn rate(mut self, bits: u64) -> Self {
        self.rate = bits;
        self
    }

    /// Set the ceiling rate in bits per second.
    pub fn ceil(mut self, bits: u64) -> Self {
        self.ceil = bits;
        self
    }

    /// Set the burst budget at `rate`, in bytes.
    pub fn buffer(mut self, bytes: u32) -> Self {
        self.buffer = bytes;
        self
    }

    /// Set the burst budget at `ceil`, in bytes.
    pub fn cbuffer(mut self, bytes: u32) -> Self {
        self.cbuffer = bytes;
        self
    }

    /// Set the quantum in bytes.
    pub fn quantum(mut self, bytes: u32) -> Self {
        self.quantum = bytes;
        self
    }

    /// Set the priority.
    pub fn prio(mut self, prio: u32) -> Self {
        self.prio = prio;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Self {
        self
    }
}

/// An HTB class in kernel units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtbClass {
    pub attrs: ClassAttrs,
    /// Guaranteed rate, bytes per second.
    pub rate: u64,
    /// Ceiling rate, bytes per second.
    pub ceil: u64,
    /// Burst at `rate`, in scheduler ticks.
    pub buffer: u32,
    /// Burst at `ceil`, in scheduler ticks.
    pub cbuffer: u32,
    pub quantum: u32,
    pub level: u32,
    pub prio: u32,
}

impl HtbClass {
    /// Build an HTB class using the running kernel's scheduler clock.
    pub fn new(attrs: ClassAttrs, cfg: &HtbClassConfig) -> Self {
        Self::with_clock(attrs, cfg, &PschedClock::from_system())
    }

    /// Build an HTB class against an explicit scheduler clock.
    pub fn with_clock(attrs: ClassAttrs, cfg: &HtbClassConfig, clock: &PschedClock) -> Self {
        let rate = rate::bits_to_bytes(cfg.rate);
        let ceil = match rate::bits_to_bytes(cfg.ceil) {
            0 => rate,
            ceil => ceil,
        };

        let default_budget = |r: u64| (r as f64 / clock.hz() + HTB_DEFAULT_MTU as f64) as u32;
        let buffer = match cfg.buffer {
            0 => default_budget(rate),
            b => b,
        };
        let cbuffer = match cfg.cbuffer {
            0 => default_budget(ceil),
            b => b,
        };

        Self {
            attrs,
            rate,
            ceil,
            buffer: clock.xmit_time(rate, buffer),
            cbuffer: clock.xmit_time(ceil, cbuffer),
            quantum: cfg.quantum,
            level: 0,
            prio: cfg.prio,
        }
    }
}

/// Two-piece linear HFSC service curve.
///
/// `m1` and `m2` are slopes in bits per second; `d` is the length of the
/// first segment in microseconds. The kernel stores slopes in bytes per
/// second, so decoded slopes above `u32::MAX` bits (about 4.29 Gbit/s)
/// are clamped to `u32::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceCurve {
    pub m1: u32,
    pub d: u32,
    pub m2: u32,
}

impl ServiceCurve {
    pub fn new(m1: u32, d: u32, m2: u32) -> Self {
        Self { m1, d, m2 }
    }

    /// The curve as `(m1, d, m2)`.
    pub fn attrs(&self) -> (u32, u32, u32) {
        (self.m1, self.d, self.m2)
    }

    /// True when all three parameters are zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for ServiceCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m1 {} d {}us m2 {}",
            rate::format_bits(self.m1 as u64),
            self.d,
            rate::format_bits(self.m2 as u64)
        )
    }
}

/// An HFSC class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HfscClass {
    pub attrs: ClassAttrs,
    /// Real-time curve.
    pub rsc: ServiceCurve,
    /// Link-sharing curve.
    pub fsc: ServiceCurve,
    /// Upper-limit curve.
    pub usc: ServiceCurve,
}

impl HfscClass {
    /// Create an HFSC class with all curves zero.
    pub fn new(attrs: ClassAttrs) -> Self {
        Self {
            attrs,
            ..Default::default()
        }
    }

    pub fn set_rsc(&mut self, m1: u32, d: u32, m2: u32) -> &mut Self {
        self.rsc = ServiceCurve::new(m1, d, m2);
        self
    }

    pub fn set_fsc(&mut self, m1: u32, d: u32, m2: u32) -> &mut Self {
        self.fsc = ServiceCurve::new(m1, d, m2);
        self
    }

    pub fn set_usc(&mut self, m1: u32, d: u32, m2: u32) -> &mut Self {
        self.usc = ServiceCurve::new(m1, d, m2);
        self
    }

    /// Set both the real-time and link-sharing curves (`tc ... sc`).
    pub fn set_sc(&mut self, m1: u32, d: u32, m2: u32) -> &mut Self {
        self.set_rsc(m1, d, m2).set_fsc(m1, d, m2)
    }

    /// Set the link-sharing curve (`tc ... ls`).
    pub fn set_ls(&mut self, m1: u32, d: u32, m2: u32) -> &mut Self {
        self.set_fsc(m1, d, m2)
    }

    /// Set the upper-limit curve (`tc ... ul`).
    pub fn set_ul(&mut self, m1: u32, d: u32, m2: u32) -> &mut Self {
        self.set_usc(m1, d, m2)
    }
}

/// A class of a kind without typed parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericClass {
    pub attrs: ClassAttrs,
    pub kind: String,
}

impl GenericClass {
    pub fn new(attrs: ClassAttrs, kind: impl Into<String>) -> Self {
        Self {
            attrs,
            kind: kind.into(),
        }
    }
}

/// A traffic control class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Class {
    Htb(HtbClass),
    Hfsc(HfscClass),
    Generic(GenericClass),
}

impl Class {
    pub fn attrs(&self) -> &ClassAttrs {
        match self {
            Self::Htb(c) => &c.attrs,
            Self::Hfsc(c) => &c.attrs,
            Self::Generic(c) => &c.attrs,
        }
    }

    pub fn attrs_mut(&mut self) -> &mut ClassAttrs {
        match self {
            Self::Htb(c) => &mut c.attrs,
            Self::Hfsc(c) => &mut c.attrs,
            Self::Generic(c) => &mut c.attrs,
        }
    }

    /// Kernel kind string ("htb", "hfsc", ...).
    pub fn kind(&self) -> &str {
        match self {
            Self::Htb(_) => "htb",
            Self::Hfsc(_) => "hfsc",
            Self::Generic(c) => &c.kind,
        }
    }

    /// Counters, when this class was read back from the kernel.
    pub fn statistics(&self) -> Option<&ClassStatistics> {
        self.attrs().statistics.as_ref()
    }

    pub fn as_htb(&self) -> Option<&HtbClass> {
        match self {
            Self::Htb(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_hfsc(&self) -> Option<&HfscClass> {
        match self {
            Self::Hfsc(c) => Some(c),
            _ => None,
        }
    }
}

impl From<HtbClass> for Class {
    fn from(class: HtbClass) -> Self {
        Self::Htb(class)
    }
}

impl From<HfscClass> for Class {
    fn from(class: HfscClass) -> Self {
        Self::Hfsc(class)
    }
}

impl From<GenericClass> for Class {
    fn from(class: GenericClass) -> Self {
        Self::Generic(class)
    }
}

impl fmt::Display for Class {
    /// One line in `tc class show` style.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attrs = self.attrs();
        write!(
            f,
            "class {} {} parent {}",
            self.kind(),
            handle::format(attrs.handle),
            handle::format(attrs.parent)
        )?;

        match self {
            Self::Htb(htb) => write!(
                f,
                " prio {} rate {} ceil {} burst {} cburst {}",
                htb.prio,
                rate::format_bytes(htb.rate),
                rate::format_bytes(htb.ceil),
                htb.buffer,
                htb.cbuffer
            ),
            Self::Hfsc(hfsc) => {
                for (name, curve) in [("rt", &hfsc.rsc), ("ls", &hfsc.fsc), ("ul", &hfsc.usc)] {
                    if !curve.is_zero() {
                        write!(f, " {} {}", name, curve)?;
                    }
                }
                Ok(())
            }
            Self::Generic(_) => Ok(()),
        }
    }
}
