//! Kernel wire structures.

pub mod tc;
