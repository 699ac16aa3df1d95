//! Configuration Module
//!
//! Handles loading cache capacity settings from environment variables.

use std::env;

use crate::cache::DEFAULT_CACHE_CAPACITY;

/// Cache capacity configuration for the detection client.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Capacity of the header-fingerprint cache
    pub header_cache_size: usize,
    /// Capacity of the device-identifier cache
    pub device_cache_size: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CAPSULE_HEADER_CACHE_SIZE` - Header cache capacity (default: 20000)
    /// - `CAPSULE_DEVICE_CACHE_SIZE` - Device-id cache capacity (default: 20000)
    pub fn from_env() -> Self {
        Self {
            header_cache_size: env::var("CAPSULE_HEADER_CACHE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CACHE_CAPACITY),
            device_cache_size: env::var("CAPSULE_DEVICE_CACHE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CACHE_CAPACITY),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            header_cache_size: DEFAULT_CACHE_CAPACITY,
            device_cache_size: DEFAULT_CACHE_CAPACITY,
        }
    }
}
