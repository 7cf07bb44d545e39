//! Centralized Error Handling Module
//!
//! Every failure path gets a unique error code so production logs can be
//! grepped by code instead of by message text.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - FEED_xxx: intel feed errors
//! - PERSIST_xxx: snapshot persistence errors
//! - API_xxx: API errors
//! - CFG_xxx: configuration errors

use std::fmt;

/// Application-wide error type.
/// All errors outside the binaries flow through this type.
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Feed Errors
    // ============================================
    /// Feed download failed (network / HTTP status)
    FeedFetchFailed,
    /// Feed download exceeded its timeout budget
    FeedTimeout,
    /// Feed body did not match its declared format
    FeedParseFailed,

    // ============================================
    // Persistence Errors
    // ============================================
    /// Could not read a persisted snapshot
    PersistReadFailed,
    /// Could not write a snapshot to storage
    PersistWriteFailed,

    // ============================================
    // Request Errors
    // ============================================
    /// Inbound wallet request could not be parsed
    RequestInvalid,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Resource not found
    ApiNotFound,
    /// Internal server error
    ApiInternalError,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Generic Errors
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            // Feed Errors
            Self::FeedFetchFailed => "FEED_FETCH_FAILED",
            Self::FeedTimeout => "FEED_TIMEOUT",
            Self::FeedParseFailed => "FEED_PARSE_FAILED",

            // Persistence Errors
            Self::PersistReadFailed => "PERSIST_READ_FAILED",
            Self::PersistWriteFailed => "PERSIST_WRITE_FAILED",

            // Request Errors
            Self::RequestInvalid => "REQUEST_INVALID",

            // API Errors
            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiNotFound => "API_NOT_FOUND",
            Self::ApiInternalError => "API_INTERNAL_ERROR",

            // Configuration Errors
            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            // Generic
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest | Self::RequestInvalid | Self::ConfigInvalidValue => 400,
            Self::ApiNotFound => 404,
            _ => 500,
        }
    }

    /// Check if error is retryable on the next scheduled tick
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::FeedFetchFailed | Self::FeedTimeout)
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Feed download failed
    pub fn feed_fetch_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::FeedFetchFailed, msg)
    }

    /// Feed timed out
    pub fn feed_timeout(source_id: &str) -> Self {
        Self::new(ErrorCode::FeedTimeout, format!("Feed timed out: {}", source_id))
    }

    /// Feed body unparseable
    pub fn feed_parse_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::FeedParseFailed, msg)
    }

    /// Snapshot read failed
    pub fn persist_read(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::PersistReadFailed, msg)
    }

    /// Snapshot write failed
    pub fn persist_write(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::PersistWriteFailed, msg)
    }

    /// Inbound request invalid
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RequestInvalid, msg)
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// API internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::FeedTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::FeedFetchFailed, "Connection failed")
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::FeedParseFailed, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::feed_timeout("scam-db");
        assert_eq!(err.code, ErrorCode::FeedTimeout);
        assert_eq!(err.code_str(), "FEED_TIMEOUT");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::FeedFetchFailed.is_retryable());
        assert!(ErrorCode::FeedTimeout.is_retryable());
        assert!(!ErrorCode::FeedParseFailed.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::ApiBadRequest.http_status(), 400);
        assert_eq!(ErrorCode::RequestInvalid.http_status(), 400);
        assert_eq!(ErrorCode::PersistWriteFailed.http_status(), 500);
    }
}
