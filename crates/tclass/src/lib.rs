//! Traffic control classes over rtnetlink.
//!
//! This crate adds, changes, replaces, deletes and lists Linux traffic
//! control classes. HTB and HFSC classes are modeled with typed parameters;
//! any other kind is carried as a generic class holding its kind string.
//! Class counters are decoded from both the legacy and the nested kernel
//! statistics formats.
//!
//! # Example
//!
//! ```ignore
//! use tclass::netlink::Connection;
//! use tclass::netlink::class::{ClassAttrs, HfscClass};
//! use tclass::tc::handle;
//!
//! #[tokio::main]
//! async fn main() -> tclass::Result<()> {
//!     let conn = Connection::new()?;
//!
//!     let mut hfsc = HfscClass::new(ClassAttrs::new(2, handle::make(1, 1), handle::make(1, 0)));
//!     hfsc.set_sc(800_000, 10, 400_000);
//!     conn.classes().add(&hfsc.into()).await?;
//!
//!     for class in conn.classes().list(None, 0).await? {
//!         println!("{}", class);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod netlink;
pub mod tc;
pub mod util;

pub use netlink::{Class, Connection, Error, Result};
