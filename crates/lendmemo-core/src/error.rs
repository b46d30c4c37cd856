//! Error types for lendmemo operations.
//!
//! Every failure carries a structured [`ErrorCode`] so the HTTP layer and the
//! client can map errors without string matching.

use thiserror::Error;

/// Result type alias for lendmemo operations.
pub type LendResult<T> = Result<T, LendError>;

/// Main error type for all lendmemo operations.
#[derive(Error, Debug)]
pub enum LendError {
    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        field: Option<String>,
    },

    /// Memo not found.
    #[error("Memo not found: {message}")]
    NotFound {
        message: String,
        code: ErrorCode,
        memo_id: Option<String>,
    },

    /// The stored memo moved on since the caller last read it.
    #[error("Version conflict: {message}")]
    Conflict {
        message: String,
        code: ErrorCode,
        expected: Option<i64>,
        actual: Option<i64>,
    },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network error (client side).
    #[error("Network error: {message}")]
    Network {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValInvalidInput,
    ValMissingField,
    ValInvalidFormat,

    // Memo (MEMO_xxx)
    MemoNotFound,
    MemoVersionConflict,

    // Database (DB_xxx)
    DbConnectionFailed,
    DbOperationFailed,
    DbCorruptRow,

    // Network (NET_xxx)
    NetConnectionFailed,
    NetInvalidResponse,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValMissingField => "VAL_002",
            ErrorCode::ValInvalidFormat => "VAL_003",
            ErrorCode::MemoNotFound => "MEMO_001",
            ErrorCode::MemoVersionConflict => "MEMO_002",
            ErrorCode::DbConnectionFailed => "DB_001",
            ErrorCode::DbOperationFailed => "DB_002",
            ErrorCode::DbCorruptRow => "DB_003",
            ErrorCode::NetConnectionFailed => "NET_001",
            ErrorCode::NetInvalidResponse => "NET_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl LendError {
    /// Create a validation error for a required field that is absent or blank.
    pub fn missing_field(field: &str) -> Self {
        Self::Validation {
            message: format!("Missing required field: {}", field),
            code: ErrorCode::ValMissingField,
            field: Some(field.to_string()),
        }
    }

    /// Create a validation error for a field with an unparseable value.
    pub fn invalid_format(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            message: format!("Invalid value for {}: {}", field, message.into()),
            code: ErrorCode::ValInvalidFormat,
            field: Some(field.to_string()),
        }
    }

    /// Create a not found error.
    pub fn not_found(memo_id: impl Into<String>) -> Self {
        let id = memo_id.into();
        Self::NotFound {
            message: format!("Memo with id '{}' not found", id),
            code: ErrorCode::MemoNotFound,
            memo_id: Some(id),
        }
    }

    /// Create a version conflict error.
    pub fn conflict(expected: i64, actual: Option<i64>) -> Self {
        let message = match actual {
            Some(actual) => format!(
                "Memo was modified concurrently (expected version {}, found {})",
                expected, actual
            ),
            None => format!(
                "Memo was modified concurrently (expected version {})",
                expected
            ),
        };
        Self::Conflict {
            message,
            code: ErrorCode::MemoVersionConflict,
            expected: Some(expected),
            actual,
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Create a database error for a row that cannot be decoded.
    pub fn corrupt_row(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbCorruptRow,
            source: None,
        }
    }

    /// Create an API (network) error.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            code: ErrorCode::NetConnectionFailed,
            source: None,
        }
    }

    /// Server answered, but the body was not what the client expected.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            code: ErrorCode::NetInvalidResponse,
            source: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::Conflict { code, .. } => *code,
            Self::Database { code, .. } => *code,
            Self::Network { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::NotFound { .. } => Some("Please check the memo link and ensure it exists"),
            Self::Conflict { .. } => Some("Reload the memo and apply your changes again"),
            Self::Validation { .. } => Some("Please check the request fields"),
            _ => None,
        }
    }

    /// Whether this error was caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::NotFound { .. } | Self::Conflict { .. }
        )
    }

    /// Convert from an HTTP status code (for client errors).
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            400 | 422 => Self::Validation {
                message: body.to_string(),
                code: ErrorCode::ValInvalidInput,
                field: None,
            },
            404 => Self::NotFound {
                message: body.to_string(),
                code: ErrorCode::MemoNotFound,
                memo_id: None,
            },
            409 => Self::Conflict {
                message: body.to_string(),
                code: ErrorCode::MemoVersionConflict,
                expected: None,
                actual: None,
            },
            _ => Self::Internal(format!("HTTP {}: {}", status, body)),
        }
    }
}

impl From<rusqlite::Error> for LendError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            code: ErrorCode::DbOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}
