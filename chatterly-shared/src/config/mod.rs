//! # Configuration
//!
//! Client configuration: endpoints, local storage location, live channel
//! timings, and logging.

pub mod client;

pub use client::{ClientConfig, ConfigError, LogFormat, LoggingConfig};
