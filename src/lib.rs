//! Capsule Client - device-capability detection with local LRU caching
//!
//! Looks up device-capability data from a remote detection service and
//! caches results locally, so repeated inputs (the same user-agent string,
//! header set, or device identifier) never cost a second network round-trip.
//!
//! The transport lives behind the [`DetectionService`] trait; everything in
//! this crate is the caching subsystem and the orchestration policy on top
//! of it.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod service;

pub use cache::{CacheStats, LruCache, DEFAULT_CACHE_CAPACITY};
pub use client::{DetectionClient, HeaderFingerprint};
pub use config::Config;
pub use error::{ClientError, Result};
pub use models::{DetectionRequest, DeviceData, MakeModel, ModelMarketingName, OsVersion, ServiceInfo};
pub use service::DetectionService;
