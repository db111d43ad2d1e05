//! rtnetlink plumbing for traffic control classes.
//!
//! # Quick Start
//!
//! ```ignore
//! use tclass::netlink::{Connection, InterfaceRef};
//! use tclass::netlink::class::{ClassAttrs, HtbClass, HtbClassConfig};
//! use tclass::tc::handle;
//!
//! let conn = Connection::new()?;
//! let classes = conn.classes();
//!
//! let attrs = ClassAttrs::new(2, handle::make(1, 0x10), handle::make(1, 0));
//! let cfg = HtbClassConfig::new().rate(8_000_000).build();
//! classes.add(&HtbClass::new(attrs, &cfg).into()).await?;
//!
//! for class in classes.list(Some(&InterfaceRef::index(2)), 0).await? {
//!     println!("{}", class);
//! }
//! ```
//!
//! The codec half ([`class::encode_class`], [`class::decode_dump`]) is
//! usable without a socket; [`Transport`] is the seam between the two.

pub mod attr;
mod builder;
pub mod class;
pub mod connection;
mod error;
#[cfg(test)]
mod fixtures;
pub mod interface_ref;
pub mod message;
pub mod parse;
pub mod socket;
pub mod stats;
pub mod transport;
pub mod types;

pub use builder::{MessageBuilder, NestToken};
pub use class::{Class, ClassAttrs, Classes, GenericClass, HfscClass, HtbClass, ServiceCurve};
pub use connection::Connection;
pub use error::{Error, Result};
pub use interface_ref::InterfaceRef;
pub use stats::ClassStatistics;
pub use transport::Transport;
