//! Traffic control helpers shared by the class codec and the CLI.

pub mod core;
pub mod handle;

pub use self::core::PschedClock;
pub use handle::Handle;
