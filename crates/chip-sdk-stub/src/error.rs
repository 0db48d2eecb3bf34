//! Error types for the SDK stub

use chip_sdk::SdkError;
use thiserror::Error;

/// Errors raised while building a fake device from a topology.
#[derive(Error, Debug)]
pub enum StubError {
    /// Topology file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Topology file is not valid JSON for a device
    #[error("Topology parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The topology was rejected by the device
    #[error("SDK error: {0}")]
    Sdk(#[from] SdkError),
}

/// Result type for stub operations
pub type Result<T> = std::result::Result<T, StubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StubError::from(SdkError::not_found("chip 7"));
        assert_eq!(err.to_string(), "SDK error: Item not found: chip 7");
    }

    #[test]
    fn test_error_parse() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = StubError::from(json_err);
        assert!(err.to_string().starts_with("Topology parse error:"));
    }
}
