//! Error types for zman visibility operations
//!
//! The taxonomy follows the way the engine is expected to fail:
//! - Configuration errors are fatal and surface before any date is processed
//! - Collaborator errors (calendar, store) are recoverable; calendar failures
//!   are normally absorbed by the Active-Tag-Set builder as degraded fetches
//! - "No match" is never an error
//!
//! # Error Codes
//!
//! Each variant has a stable error code (e.g., `INVALID_CONFIGURATION`) usable
//! for client handling and for aggregating errors in logs.
//!
//! # Example
//!
//! ```rust
//! use zman_core::error::{ZmanError, ErrorCategory};
//!
//! fn handle_error(err: ZmanError) {
//!     match err.category() {
//!         ErrorCategory::Configuration => println!("Refusing to serve: {}", err),
//!         ErrorCategory::External | ErrorCategory::Timeout => println!("Collaborator down"),
//!     }
//!
//!     if err.is_recoverable() {
//!         println!("Retry may succeed");
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for zman operations
pub type Result<T> = std::result::Result<T, ZmanError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Tag or mapping data is structurally invalid
    Configuration,
    /// A collaborator (calendar provider, configuration store) failed
    External,
    /// A collaborator did not answer in time
    Timeout,
}

/// Errors that can occur while resolving tags and filtering items
#[derive(Error, Debug)]
pub enum ZmanError {
    // ═══════════════════════════════════════════════════════════════════════
    // Configuration errors (tag catalog and event mappings)
    // ═══════════════════════════════════════════════════════════════════════

    /// Tag/mapping configuration failed validation
    #[error("Invalid tag configuration: {reason}. Fix the tag catalog or event mappings before serving.")]
    InvalidConfiguration { reason: String },

    /// Two tags share the same key
    #[error("Duplicate tag key: '{tag_key}'. Tag keys must be unique.")]
    DuplicateTag { tag_key: String },

    /// A mapping references a tag that is not in the catalog
    #[error("Event mapping '{pattern}' references unknown tag '{tag_key}'")]
    UnknownTagReference { tag_key: String, pattern: String },

    /// A mapping pattern could not be compiled
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A configuration document is not well-formed JSON, or does not have
    /// the document shape
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════════
    // Collaborator errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Failed to read a configuration document
    #[error("Failed to load tag configuration from '{path}': {reason}")]
    ConfigLoadError { path: String, reason: String },

    /// The calendar provider failed for a date
    #[error("Calendar unavailable for {date}: {reason}")]
    CalendarUnavailable { date: String, reason: String },

    /// The calendar provider did not answer within the fetch timeout
    #[error("Calendar fetch for {date} timed out after {timeout_ms}ms")]
    CalendarTimeout { date: String, timeout_ms: u64 },

    /// The configuration store failed
    #[error("Configuration store unavailable: {reason}")]
    StoreUnavailable { reason: String },
}

impl ZmanError {
    /// Returns true if this error might succeed on retry
    ///
    /// Collaborator outages are recoverable. Broken configuration is not:
    /// retrying against the same data fails the same way.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ZmanError::CalendarUnavailable { .. }
                | ZmanError::CalendarTimeout { .. }
                | ZmanError::StoreUnavailable { .. }
        )
    }

    /// Returns true if this error means the configuration itself is broken
    pub fn is_configuration_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            ZmanError::InvalidConfiguration { .. }
            | ZmanError::DuplicateTag { .. }
            | ZmanError::UnknownTagReference { .. }
            | ZmanError::InvalidPattern { .. }
            | ZmanError::JsonError(_) => ErrorCategory::Configuration,

            ZmanError::ConfigLoadError { .. }
            | ZmanError::CalendarUnavailable { .. }
            | ZmanError::StoreUnavailable { .. } => ErrorCategory::External,

            ZmanError::CalendarTimeout { .. } => ErrorCategory::Timeout,
        }
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ZmanError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            ZmanError::DuplicateTag { .. } => "DUPLICATE_TAG",
            ZmanError::UnknownTagReference { .. } => "UNKNOWN_TAG_REFERENCE",
            ZmanError::InvalidPattern { .. } => "INVALID_PATTERN",
            ZmanError::JsonError(_) => "JSON_ERROR",
            ZmanError::ConfigLoadError { .. } => "CONFIG_LOAD_ERROR",
            ZmanError::CalendarUnavailable { .. } => "CALENDAR_UNAVAILABLE",
            ZmanError::CalendarTimeout { .. } => "CALENDAR_TIMEOUT",
            ZmanError::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
        }
    }

    /// Returns the HTTP status code for this error
    ///
    /// Broken configuration is a server-side fault (500).
    pub fn http_status_code(&self) -> u16 {
        match self {
            ZmanError::InvalidConfiguration { .. }
            | ZmanError::DuplicateTag { .. }
            | ZmanError::UnknownTagReference { .. }
            | ZmanError::InvalidPattern { .. }
            | ZmanError::JsonError(_) => 500,

            ZmanError::ConfigLoadError { .. }
            | ZmanError::CalendarUnavailable { .. }
            | ZmanError::StoreUnavailable { .. } => 502,

            ZmanError::CalendarTimeout { .. } => 504,
        }
    }

    /// Converts this error to a JSON-serializable response object
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
                recoverable: self.is_recoverable(),
            },
        }
    }
}

/// JSON-serializable error response for APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail for JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error code (e.g., "INVALID_CONFIGURATION")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Error category
    pub category: ErrorCategory,
    /// Whether retry might succeed
    pub recoverable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_recoverable() {
        assert!(ZmanError::CalendarUnavailable {
            date: "2025-10-02".to_string(),
            reason: "connection refused".to_string()
        }
        .is_recoverable());
        assert!(ZmanError::CalendarTimeout {
            date: "2025-10-02".to_string(),
            timeout_ms: 5000
        }
        .is_recoverable());
        assert!(!ZmanError::InvalidConfiguration {
            reason: "empty pattern".to_string()
        }
        .is_recoverable());
        assert!(!ZmanError::DuplicateTag {
            tag_key: "shabbos".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ZmanError::UnknownTagReference {
                tag_key: "missing".to_string(),
                pattern: "Purim".to_string()
            }
            .error_code(),
            "UNKNOWN_TAG_REFERENCE"
        );
        assert_eq!(
            ZmanError::CalendarTimeout {
                date: "2025-10-02".to_string(),
                timeout_ms: 10
            }
            .error_code(),
            "CALENDAR_TIMEOUT"
        );
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            ZmanError::InvalidPattern {
                pattern: "(".to_string(),
                reason: "unclosed group".to_string()
            }
            .category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            ZmanError::StoreUnavailable {
                reason: "db down".to_string()
            }
            .category(),
            ErrorCategory::External
        );
        assert!(ZmanError::DuplicateTag {
            tag_key: "yom_tov".to_string()
        }
        .is_configuration_error());
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            ZmanError::InvalidConfiguration {
                reason: "x".to_string()
            }
            .http_status_code(),
            500
        );
        assert_eq!(
            ZmanError::CalendarTimeout {
                date: "2025-10-02".to_string(),
                timeout_ms: 10
            }
            .http_status_code(),
            504
        );
    }

    #[test]
    fn test_error_response_serialization() {
        let err = ZmanError::UnknownTagReference {
            tag_key: "chanukah".to_string(),
            pattern: "Chanukah%".to_string(),
        };
        let response = err.to_error_response();

        let json = serde_json::to_string_pretty(&response).unwrap();
        assert!(json.contains("UNKNOWN_TAG_REFERENCE"));
        assert!(json.contains("chanukah"));
        assert!(json.contains("configuration"));

        let parsed: ErrorResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.error.code, "UNKNOWN_TAG_REFERENCE");
        assert!(!parsed.error.recoverable);
    }

    #[test]
    fn test_json_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{ \"tags\": [").unwrap_err();
        let err: ZmanError = parse.into();

        assert_eq!(err.error_code(), "JSON_ERROR");
        assert!(err.is_configuration_error());
        assert!(!err.is_recoverable());
        assert_eq!(err.http_status_code(), 500);
    }
}
