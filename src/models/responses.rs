//! Response DTOs for the detection service
//!
//! Defines the payloads returned by the remote detection service.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The detected capability data for one lookup.
///
/// Opaque to the caching subsystem: the cache stores and returns it by key
/// without interpreting the capability map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceData {
    /// Capability name to string value
    pub capabilities: HashMap<String, String>,
    /// Applicative error message, empty on success
    #[serde(default)]
    pub error: String,
    /// Modification counter of the server dataset
    #[serde(default)]
    pub mtime: i64,
    /// Generation marker: when the server dataset was last loaded.
    /// A change in this value invalidates all previously cached results.
    #[serde(default)]
    pub ltime: String,
}

impl DeviceData {
    /// Returns true if the service reported an applicative error.
    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Static service metadata fetched once at client construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Detection API version exposed by the server
    pub api_version: String,
    /// Server software version
    pub server_version: String,
    /// Description of the loaded capability dataset
    pub data_info: String,
    /// Header names relevant to detection, in canonical fingerprint order
    #[serde(default)]
    pub important_headers: Vec<String>,
    /// All static capability names the server can return
    #[serde(default)]
    pub static_caps: Vec<String>,
    /// All virtual capability names the server can return
    #[serde(default)]
    pub virtual_caps: Vec<String>,
    /// Generation marker at the time of the info call
    #[serde(default)]
    pub ltime: String,
}

/// One (device OS, version) pair from the OS enumeration endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsVersion {
    /// Device OS name
    pub device_os: String,
    /// One version of that OS, possibly empty
    #[serde(default)]
    pub device_os_version: String,
}

/// One device model from the make/model enumeration endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeModel {
    /// Device maker brand name
    pub brand_name: String,
    /// Model name within the brand
    pub model_name: String,
    /// Marketing name, empty when the maker has none
    #[serde(default)]
    pub marketing_name: String,
}

/// Model and marketing name of one device, as listed per maker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMarketingName {
    /// Model name within the brand
    pub model_name: String,
    /// Marketing name, empty when the maker has none
    #[serde(default)]
    pub marketing_name: String,
}

impl ServiceInfo {
    /// Returns true if the payload looks like real service info.
    ///
    /// Empty version or description fields mean the server answered with an
    /// error document or an unexpected format, as does a server exposing no
    /// capabilities at all.
    pub fn is_complete(&self) -> bool {
        !self.api_version.is_empty()
            && !self.server_version.is_empty()
            && !self.data_info.is_empty()
            && (!self.static_caps.is_empty() || !self.virtual_caps.is_empty())
    }
}
