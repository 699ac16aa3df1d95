//! Error types for the detection client
//!
//! Provides unified error handling using thiserror.
//!
//! The caching subsystem itself is infallible: cache operations never return
//! errors and never perform I/O. Every variant here originates at the
//! detection service boundary.

use thiserror::Error;

// == Client Error Enum ==
/// Unified error type for the detection client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The detection service answered but reported an applicative error.
    /// Results carrying an error are surfaced as failures and never cached.
    #[error("Detection service reported an error: {0}")]
    Detection(String),

    /// The call to the detection service failed at the transport level.
    /// A transport failure leaves all cache state unchanged.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The service info payload fetched at client construction was empty
    /// or malformed.
    #[error("Invalid service info: {0}")]
    InvalidInfo(String),

    /// An enumeration query named a device OS or maker the service does
    /// not know.
    #[error("Unknown name: {0}")]
    NotFound(String),
}

// == Result Type Alias ==
/// Convenience Result type for the detection client.
pub type Result<T> = std::result::Result<T, ClientError>;

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::Detection("no match".to_string());
        assert!(err.to_string().contains("no match"));

        let err = ClientError::Transport("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));

        let err = ClientError::InvalidInfo("empty payload".to_string());
        assert!(err.to_string().contains("empty payload"));
    }
}
