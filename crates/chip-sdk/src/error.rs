//! SDK status codes and error handling.
//!
//! Every C entry point of the SDK returns a [`SdkStatus`]. This module
//! converts those codes into Rust's `Result` type and back.

use std::fmt;
use thiserror::Error;

/// Status codes matching `ChipSdkError` in the SDK header.
///
/// The C enum is a plain `int`, so values coming from C must go through
/// [`SdkStatus::from_raw`] rather than a transmute.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdkStatus {
    Success = 0,
    Error = 1,
    InvalidParam = 2,
    NoMemory = 3,
    NoResource = 4,
    NotFound = 5,
    NotSupported = 6,
    Busy = 7,
    Timeout = 8,
    NoChange = 9,
    Duplicate = 10,
    BufferTooSmall = 11,
    NotSet = 12,
}

impl SdkStatus {
    /// Creates a status from a raw C value.
    ///
    /// Unknown values map to [`SdkStatus::Error`].
    pub fn from_raw(status: i32) -> Self {
        match status {
            0 => SdkStatus::Success,
            1 => SdkStatus::Error,
            2 => SdkStatus::InvalidParam,
            3 => SdkStatus::NoMemory,
            4 => SdkStatus::NoResource,
            5 => SdkStatus::NotFound,
            6 => SdkStatus::NotSupported,
            7 => SdkStatus::Busy,
            8 => SdkStatus::Timeout,
            9 => SdkStatus::NoChange,
            10 => SdkStatus::Duplicate,
            11 => SdkStatus::BufferTooSmall,
            12 => SdkStatus::NotSet,
            _ => SdkStatus::Error,
        }
    }

    /// Returns true if the status indicates success.
    pub fn is_success(&self) -> bool {
        *self == SdkStatus::Success
    }

    /// Converts to a Result, returning Ok(()) for success.
    pub fn into_result(self) -> SdkResult<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(SdkError::from_status(self))
        }
    }
}

impl fmt::Display for SdkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SdkStatus::Success => "CHIP_SDK_SUCCESS",
            SdkStatus::Error => "CHIP_SDK_ERROR",
            SdkStatus::InvalidParam => "CHIP_SDK_INVALID_PARAM",
            SdkStatus::NoMemory => "CHIP_SDK_NO_MEMORY",
            SdkStatus::NoResource => "CHIP_SDK_NO_RESOURCE",
            SdkStatus::NotFound => "CHIP_SDK_NOT_FOUND",
            SdkStatus::NotSupported => "CHIP_SDK_NOT_SUPPORTED",
            SdkStatus::Busy => "CHIP_SDK_BUSY",
            SdkStatus::Timeout => "CHIP_SDK_TIMEOUT",
            SdkStatus::NoChange => "CHIP_SDK_NO_CHANGE",
            SdkStatus::Duplicate => "CHIP_SDK_DUPLICATE",
            SdkStatus::BufferTooSmall => "CHIP_SDK_BUFFER_TOO_SMALL",
            SdkStatus::NotSet => "CHIP_SDK_NOT_SET",
        };
        write!(f, "{}", s)
    }
}

/// Error type for SDK operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
    /// The SDK returned a status with no more specific mapping.
    #[error("chip SDK operation failed: {status}")]
    Status { status: SdkStatus },

    /// Absent or malformed input.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// The referenced chip or port does not exist.
    #[error("Item not found: {item}")]
    NotFound { item: String },

    /// The item is already registered.
    #[error("Item already exists: {item}")]
    AlreadyExists { item: String },

    /// A bulk export buffer cannot hold every record.
    #[error("Buffer too small: {required} entries required, capacity {capacity}")]
    BufferTooSmall { required: usize, capacity: usize },

    /// A fixed-size table has no free slot.
    #[error("No resource: {resource}")]
    NoResource { resource: String },

    /// The item exists but the requested value was never set.
    #[error("Value not set: {item}")]
    NotSet { item: String },

    /// Internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SdkError {
    /// Creates an error from an SDK status code.
    pub fn from_status(status: SdkStatus) -> Self {
        match status {
            SdkStatus::Success => SdkError::Internal {
                message: "from_status called with success status".to_string(),
            },
            SdkStatus::InvalidParam => SdkError::InvalidParameter {
                message: format!("SDK returned {}", status),
            },
            SdkStatus::NotFound => SdkError::NotFound {
                item: "unknown".to_string(),
            },
            SdkStatus::Duplicate => SdkError::AlreadyExists {
                item: "unknown".to_string(),
            },
            SdkStatus::NoResource => SdkError::NoResource {
                resource: "unknown".to_string(),
            },
            SdkStatus::NotSet => SdkError::NotSet {
                item: "unknown".to_string(),
            },
            SdkStatus::BufferTooSmall => SdkError::BufferTooSmall {
                required: 0,
                capacity: 0,
            },
            _ => SdkError::Status { status },
        }
    }

    /// Creates an invalid parameter error with a message.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        SdkError::InvalidParameter {
            message: message.into(),
        }
    }

    /// Creates a not found error with an item description.
    pub fn not_found(item: impl Into<String>) -> Self {
        SdkError::NotFound { item: item.into() }
    }

    /// Creates an already exists error.
    pub fn already_exists(item: impl Into<String>) -> Self {
        SdkError::AlreadyExists { item: item.into() }
    }

    /// Creates a buffer too small error.
    pub fn buffer_too_small(required: usize, capacity: usize) -> Self {
        SdkError::BufferTooSmall { required, capacity }
    }

    /// Creates a no resource error.
    pub fn no_resource(resource: impl Into<String>) -> Self {
        SdkError::NoResource {
            resource: resource.into(),
        }
    }

    /// Returns the status code reported for this error at the C boundary.
    pub fn status(&self) -> SdkStatus {
        match self {
            SdkError::Status { status } => *status,
            SdkError::InvalidParameter { .. } => SdkStatus::InvalidParam,
            SdkError::NotFound { .. } => SdkStatus::NotFound,
            SdkError::AlreadyExists { .. } => SdkStatus::Duplicate,
            SdkError::BufferTooSmall { .. } => SdkStatus::BufferTooSmall,
            SdkError::NoResource { .. } => SdkStatus::NoResource,
            SdkError::NotSet { .. } => SdkStatus::NotSet,
            SdkError::Internal { .. } => SdkStatus::Error,
        }
    }

    /// Returns the required entry count of a buffer-too-small error.
    pub fn required_capacity(&self) -> Option<usize> {
        match self {
            SdkError::BufferTooSmall { required, .. } => Some(*required),
            _ => None,
        }
    }
}

/// Result type for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;

/// Extension trait for converting raw SDK status codes.
pub trait SdkStatusExt {
    /// Converts a raw status code to a Result.
    fn to_result(self) -> SdkResult<()>;
}

impl SdkStatusExt for i32 {
    fn to_result(self) -> SdkResult<()> {
        SdkStatus::from_raw(self).into_result()
    }
}

impl SdkStatusExt for SdkStatus {
    fn to_result(self) -> SdkResult<()> {
        self.into_result()
    }
}

impl From<SdkResult<()>> for SdkStatus {
    fn from(result: SdkResult<()>) -> Self {
        match result {
            Ok(()) => SdkStatus::Success,
            Err(e) => e.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_success() {
        assert!(SdkStatus::Success.is_success());
        assert!(SdkStatus::Success.into_result().is_ok());
    }

    #[test]
    fn test_status_failure() {
        assert!(!SdkStatus::Error.is_success());
        assert!(SdkStatus::Error.into_result().is_err());
    }

    #[test]
    fn test_status_from_raw() {
        assert_eq!(SdkStatus::from_raw(0), SdkStatus::Success);
        assert_eq!(SdkStatus::from_raw(5), SdkStatus::NotFound);
        assert_eq!(SdkStatus::from_raw(12), SdkStatus::NotSet);
        assert_eq!(SdkStatus::from_raw(-1), SdkStatus::Error);
        assert_eq!(SdkStatus::from_raw(999), SdkStatus::Error);
        assert_eq!(SdkStatus::BufferTooSmall as i32, 11);
    }

    #[test]
    fn test_error_from_status() {
        let err = SdkError::from_status(SdkStatus::NotFound);
        assert!(matches!(err, SdkError::NotFound { .. }));

        let err = SdkError::from_status(SdkStatus::Duplicate);
        assert!(matches!(err, SdkError::AlreadyExists { .. }));

        let err = SdkError::from_status(SdkStatus::Timeout);
        assert_eq!(err.status(), SdkStatus::Timeout);
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            SdkError::invalid_parameter("null chip").status(),
            SdkStatus::InvalidParam
        );
        assert_eq!(SdkError::already_exists("chip 1").status(), SdkStatus::Duplicate);
        assert_eq!(
            SdkError::from_status(SdkStatus::NotSet).status(),
            SdkStatus::NotSet
        );
        assert_eq!(
            SdkError::from_status(SdkStatus::Success).status(),
            SdkStatus::Error
        );
    }

    #[test]
    fn test_buffer_too_small_reports_required() {
        let err = SdkError::buffer_too_small(3, 1);
        assert_eq!(err.required_capacity(), Some(3));
        assert_eq!(
            err.to_string(),
            "Buffer too small: 3 entries required, capacity 1"
        );
        assert_eq!(SdkError::not_found("chip 2").required_capacity(), None);
    }

    #[test]
    fn test_raw_status_to_result() {
        assert!(0_i32.to_result().is_ok());
        assert!(5_i32.to_result().is_err());
        assert!(SdkStatus::NoChange.to_result().is_err());
    }

    #[test]
    fn test_result_into_status() {
        assert_eq!(SdkStatus::from(SdkResult::Ok(())), SdkStatus::Success);
        assert_eq!(
            SdkStatus::from(SdkResult::Err(SdkError::not_found("port 0/9"))),
            SdkStatus::NotFound
        );
    }
}
