//! `anchorwatch-agent` library crate.
//!
//! The engine that turns Signal K telemetry into push alerts, plus the
//! lifecycle wrapper and configuration used by the binary in `main.rs`.

pub mod config;
pub mod detector;
pub mod engine;
pub mod monitor;
pub mod status;
pub mod store;
pub mod timers;
