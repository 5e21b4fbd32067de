//! YantraIO - interactive exerciser for multi-port controller boards
//!
//! This library drives a sensor/actuator controller board through its
//! driver contract: pick a port (or all ports), repeatedly sample or
//! actuate it, print formatted status, and restore the board to a
//! neutral state on Ctrl+C.
//!
//! ## Features
//!
//! The `mock` device type provides a scriptable controller simulation
//! for hardware-free operation and unit testing.

pub mod config;
pub mod controller;
pub mod devices;
pub mod error;
pub mod harness;
pub mod ports;

// Re-export commonly used types
pub use config::AppConfig;
pub use controller::Controller;
pub use error::{Error, Result};
