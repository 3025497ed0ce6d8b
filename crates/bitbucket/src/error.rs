//! Error types for Bitbucket operations.
//!
//! Every error aborts the reconciliation pass it occurs in. Categories exist
//! for user feedback and to tell transient transport failures apart from
//! answers the API actually gave.

use serde_json::{Map, Value};
use std::fmt;

/// Result type alias for Bitbucket operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of Bitbucket errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// No response received (connection refused, DNS, timeout).
    Network,
    /// The API answered with a status the client does not map.
    Upstream,
    /// Credentials lack the rights for the operation.
    Permission,
    /// The API rejected the payload.
    Validation,
    /// The resource already exists under the same key.
    Conflict,
    /// Repository or resource missing.
    NotFound,
    /// Malformed response or URL.
    Format,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Upstream => "Unexpected API response",
            Self::Permission => "Insufficient permissions",
            Self::Validation => "Rejected by API validation",
            Self::Conflict => "Resource already exists",
            Self::NotFound => "Not found",
            Self::Format => "Invalid response format",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your connection and the API URL, then run again",
            Self::Upstream => "Inspect the status and body above; the pass stopped at this call",
            Self::Permission => "Check the username and app password scopes",
            Self::Validation => "Check names and values in the configuration file",
            Self::Conflict => "Another run or a manual change created it; run again to reconcile",
            Self::NotFound => "Verify the workspace and repository names",
            Self::Format => "Check the API URL points at a Bitbucket 2.0 API",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to Bitbucket.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No response after exhausting the retry budget.
    #[error("no response from {url} after {attempts} attempt(s): {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Attempts made.
        attempts: u32,
        /// Last low-level error.
        message: String,
    },

    /// Status code the caller does not map to an outcome.
    #[error("unknown error (HTTP {status}): {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Decoded response body, serialized.
        body: String,
    },

    /// Insufficient permissions for the operation.
    #[error("{message}")]
    Permission {
        /// Kind-specific message.
        message: String,
    },

    /// The API rejected the request payload.
    #[error("{message}")]
    Validation {
        /// Kind-specific message.
        message: String,
    },

    /// Duplicate key (HTTP 409).
    #[error("{message}")]
    Conflict {
        /// Kind-specific message.
        message: String,
    },

    /// Repository or resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Response could not be decoded into the expected shape.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// URL could not be built or parsed.
    #[error("invalid URL {url}: {message}")]
    InvalidUrl {
        /// Offending URL.
        url: String,
        /// Parser message.
        message: String,
    },
}

impl Error {
    /// Create an upstream error from a status and decoded body.
    pub fn upstream(status: u16, body: &Map<String, Value>) -> Self {
        Self::Upstream {
            status,
            body: Value::Object(body.clone()).to_string(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Transport { .. } => ErrorCategory::Network,
            Error::Upstream { .. } => ErrorCategory::Upstream,
            Error::Permission { .. } => ErrorCategory::Permission,
            Error::Validation { .. } => ErrorCategory::Validation,
            Error::Conflict { .. } => ErrorCategory::Conflict,
            Error::NotFound(_) => ErrorCategory::NotFound,
            Error::InvalidResponse(_) | Error::InvalidUrl { .. } => ErrorCategory::Format,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// HTTP status carried by the error, if the API answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(!ErrorCategory::Upstream.is_retryable());
        assert!(!ErrorCategory::Permission.is_retryable());
        assert!(!ErrorCategory::Validation.is_retryable());
        assert!(!ErrorCategory::Conflict.is_retryable());
        assert!(!ErrorCategory::NotFound.is_retryable());
        assert!(!ErrorCategory::Format.is_retryable());
    }

    #[test]
    fn test_error_category_advice() {
        assert!(!ErrorCategory::Network.advice().is_empty());
        assert!(!ErrorCategory::Conflict.advice().is_empty());
        assert!(format!("{}", ErrorCategory::Network).contains("Network"));
    }

    #[test]
    fn test_transport_error_is_retryable() {
        let err = Error::Transport {
            url: "https://api.bitbucket.org/2.0".to_string(),
            attempts: 3,
            message: "connection refused".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("3 attempt(s)"));
    }

    #[test]
    fn test_upstream_error_carries_status_and_body() {
        let body = json!({"error": {"message": "Bad request"}});
        let err = Error::upstream(418, body.as_object().unwrap());
        assert_eq!(err.status(), Some(418));
        assert_eq!(err.category(), ErrorCategory::Upstream);
        let display = err.to_string();
        assert!(display.contains("418"));
        assert!(display.contains("Bad request"));
    }

    #[test]
    fn test_conflict_error_category() {
        let err = Error::Conflict {
            message: "variable `DB` already exists".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert_eq!(err.status(), None);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_from_serde_json() {
        let parse: std::result::Result<Value, _> = serde_json::from_str("{not json");
        let err: Error = parse.unwrap_err().into();
        assert_eq!(err.category(), ErrorCategory::Format);
    }
}
