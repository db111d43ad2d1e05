//! Command implementations.

pub mod class;
