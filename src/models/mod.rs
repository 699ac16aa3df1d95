//! Models Module
//!
//! Boundary types exchanged with the detection service.

mod requests;
mod responses;

pub use requests::DetectionRequest;
pub use responses::{DeviceData, MakeModel, ModelMarketingName, OsVersion, ServiceInfo};
