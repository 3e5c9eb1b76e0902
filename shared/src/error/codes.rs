//! Unified error codes for the QuickRun services
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Pricing errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order status transition not allowed
    InvalidOrderStatus = 4002,

    // ==================== 5xxx: Pricing ====================
    /// Pricing task not found
    TaskNotFound = 5001,
    /// Pricing lookup collaborator unreachable
    PricingUnavailable = 5002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Downstream service unavailable
    ServiceUnavailable = 9003,
    /// Event publish failed
    PublishFailed = 9004,
}

impl ErrorCode {
    /// Get the default human-readable message for this error code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",

            Self::OrderNotFound => "Order not found",
            Self::InvalidOrderStatus => "Order status transition not allowed",

            Self::TaskNotFound => "Pricing task not found",
            Self::PricingUnavailable => "Pricing service unavailable",

            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::ServiceUnavailable => "Service unavailable",
            Self::PublishFailed => "Event publish failed",
        }
    }

    /// Numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

/// Error returned when converting an unknown u16 into [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::AlreadyExists,
            5 => Self::InvalidRequest,
            4001 => Self::OrderNotFound,
            4002 => Self::InvalidOrderStatus,
            5001 => Self::TaskNotFound,
            5002 => Self::PricingUnavailable,
            9001 => Self::InternalError,
            9002 => Self::DatabaseError,
            9003 => Self::ServiceUnavailable,
            9004 => Self::PublishFailed,
            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}
