// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the system.
//! The policy throughout is containment: a failure never propagates past
//! the single item or single batch that caused it, so most variants are
//! logged at the boundary where they occur and converted into "no result".

use std::fmt;
use thiserror::Error;

/// Feishu application-level error codes as a typed vocabulary.
///
/// Every destination response carries a numeric `code` distinct from the
/// HTTP status; `0` is success. Instead of comparing magic integers at
/// call sites, the codes this client cares about are named here and
/// everything else stays observable through `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeishuErrorCode {
    /// The tenant access token is invalid or has expired.
    AccessTokenInvalid,
    /// The app credentials were rejected outright.
    AppCredentialsInvalid,
    /// The app lacks permission for the requested resource.
    PermissionDenied,
    /// Too many requests; back off.
    RateLimited,
    /// HTTP status fallback when the error body is unparseable.
    HttpStatus(u16),
    /// A code this client doesn't recognize.
    Unknown(i64),
}

impl FeishuErrorCode {
    /// Maps a raw application code into the typed vocabulary.
    pub fn from_code(code: i64) -> Self {
        match code {
            99991663 | 99991664 | 99991668 => Self::AccessTokenInvalid,
            99991661 | 10012 => Self::AppCredentialsInvalid,
            99991672 | 1254302 => Self::PermissionDenied,
            99991400 | 1254290 => Self::RateLimited,
            other => Self::Unknown(other),
        }
    }

    /// Create from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        Self::HttpStatus(status)
    }

    /// Whether this failure means the credential itself is bad, in which
    /// case the whole sync phase should stop rather than retry per item.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AccessTokenInvalid | Self::AppCredentialsInvalid)
    }
}

impl fmt::Display for FeishuErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessTokenInvalid => write!(f, "access_token_invalid"),
            Self::AppCredentialsInvalid => write!(f, "app_credentials_invalid"),
            Self::PermissionDenied => write!(f, "permission_denied"),
            Self::RateLimited => write!(f, "rate_limited"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "code_{}", code),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Invalid note or user reference: {0}")]
    InvalidInput(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Source platform returned HTTP {status} for {url}")]
    UpstreamStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Feishu API returned an error ({code}): {message}")]
    FeishuService {
        code: FeishuErrorCode,
        message: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot parse error for {}: {source}", .path.display())]
    SnapshotParseError {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AppError {
    /// Whether this error is a credential failure that should abort the
    /// destination-sync phase (extraction results are still kept).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, AppError::FeishuService { code, .. } if code.is_auth_failure())
    }
}

// Allow converting from anyhow::Error, preserving the message
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError {
            message: err.to_string(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;
