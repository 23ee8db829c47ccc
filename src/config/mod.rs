//! Configuration module for stream settings and YAML loading
//!
//! This module provides:
//! - Configuration types (`AppConfig`, `StreamConfig`, `MonitorConfig`)
//! - YAML loading functionality (`load_config`)
//! - Logging initialization
//! - Application constants with environment variable overrides

pub mod constants;
mod loader;
pub mod logging;
mod types;

// Re-export types
pub use types::{AppConfig, MonitorConfig, StreamConfig};

// Re-export loader functions
pub use loader::{load_config, load_config_from_str};
