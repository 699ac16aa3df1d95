//! Detection Service Boundary
//!
//! Trait abstracting the remote detection service. The concrete transport
//! (HTTP engine, timeouts, retries) lives behind this trait and is not a
//! concern of the caching subsystem: the client treats detection as an
//! opaque, possibly-failing remote call.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DetectionRequest, DeviceData, MakeModel, OsVersion, ServiceInfo};

// == Detection Service Trait ==
/// Remote detection service collaborator.
///
/// Implementations map transport-level failures to
/// [`ClientError::Transport`](crate::error::ClientError::Transport); an
/// applicative failure travels inside [`DeviceData::error`] and is handled
/// by the client.
#[async_trait]
pub trait DetectionService: Send + Sync {
    /// Fetches static service metadata: versions, important headers, and
    /// the capability catalogs.
    async fn info(&self) -> Result<ServiceInfo>;

    /// Performs one device detection for the given request.
    async fn detect(&self, request: &DetectionRequest) -> Result<DeviceData>;

    /// Lists every (device OS, version) pair the service knows.
    async fn all_device_os_versions(&self) -> Result<Vec<OsVersion>>;

    /// Lists every device model together with its brand and marketing
    /// names.
    async fn all_make_models(&self) -> Result<Vec<MakeModel>>;
}
