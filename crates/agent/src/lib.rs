//! `soundwatch-agent` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod artifacts;
pub mod chart;
pub mod cli;
pub mod monitor;
pub mod power;
pub mod source;
