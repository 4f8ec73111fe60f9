//! Adapter implementations for access ports.

pub mod memory;
