//! Request DTOs for the detection service
//!
//! Defines the lookup payload sent to the remote detection service.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One detection lookup as sent to the service.
///
/// Exactly one of `lookup_headers` or `device_id` drives the lookup: a
/// header-based request carries the filtered header map and an empty
/// `device_id`, an identifier-based request carries the id and no headers.
/// The optional capability filters narrow the fields the service returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRequest {
    /// Header names and values relevant to detection
    pub lookup_headers: HashMap<String, String>,
    /// Requested static capability names, None = all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_caps: Option<Vec<String>>,
    /// Requested virtual capability names, None = all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_vcaps: Option<Vec<String>>,
    /// Device identifier, empty for header-based lookups
    pub device_id: String,
}

impl DetectionRequest {
    /// Creates a header-based lookup request.
    pub fn from_headers(
        lookup_headers: HashMap<String, String>,
        requested_caps: Option<Vec<String>>,
        requested_vcaps: Option<Vec<String>>,
    ) -> Self {
        Self {
            lookup_headers,
            requested_caps,
            requested_vcaps,
            device_id: String::new(),
        }
    }

    /// Creates an identifier-based lookup request.
    pub fn from_device_id(
        device_id: impl Into<String>,
        requested_caps: Option<Vec<String>>,
        requested_vcaps: Option<Vec<String>>,
    ) -> Self {
        Self {
            lookup_headers: HashMap::new(),
            requested_caps,
            requested_vcaps,
            device_id: device_id.into(),
        }
    }
}
