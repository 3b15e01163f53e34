//! Error types and handling for the Garmin Connect session

use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// Non-2xx response; status and body are kept intact for the caller
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("CSRF extraction failed")]
    CsrfExtraction,

    #[error("Missing {0} in response")]
    MissingArtifact(String),

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("MFA code required but no prompt is available")]
    MfaRequired,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Max retries exceeded")]
    MaxRetriesExceeded,
}

/// Coarse classification of failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Consumer fetch, ticket/token exchanges, local configuration and storage
    Setup,
    /// The service answered, but not with the artifact we expected
    Protocol,
    /// Credentials or tokens were rejected
    Authorization,
    /// Rate limiting, server errors and timeouts
    Transient,
    /// Contract violations inside this crate
    Internal,
}

impl AppError {
    pub fn http(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        AppError::Http {
            status: status.as_u16(),
            body: body.into(),
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Http { status, .. } => match *status {
                401 | 403 => ErrorKind::Authorization,
                429 | 500..=599 => ErrorKind::Transient,
                _ => ErrorKind::Setup,
            },
            AppError::Timeout(_) => ErrorKind::Transient,
            AppError::LoginFailed(_) | AppError::MfaRequired => ErrorKind::Authorization,
            AppError::CsrfExtraction | AppError::MissingArtifact(_) | AppError::Parse(_) => {
                ErrorKind::Protocol
            }
            AppError::MaxRetriesExceeded => ErrorKind::Internal,
            AppError::InvalidInput(_)
            | AppError::Network(_)
            | AppError::Storage(_)
            | AppError::Config(_) => ErrorKind::Setup,
        }
    }

    /// Whether repeating the same call later can reasonably succeed
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// Get the error code for CLI output
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Network(_) => "network_error",
            AppError::Timeout(_) => "timeout",
            AppError::Http { .. } => "http_error",
            AppError::Parse(_) => "parse_error",
            AppError::CsrfExtraction => "csrf_extraction_failed",
            AppError::MissingArtifact(_) => "missing_artifact",
            AppError::LoginFailed(_) => "login_failed",
            AppError::MfaRequired => "mfa_required",
            AppError::Storage(_) => "storage_error",
            AppError::Config(_) => "config_error",
            AppError::MaxRetriesExceeded => "max_retries_exceeded",
        }
    }
}

/// Convert reqwest::Error to AppError
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if err.is_decode() {
            AppError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            AppError::http(status, err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

/// Convert serde_json::Error to AppError
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

/// Convert std::io::Error to AppError
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("Invalid URL: {}", err))
    }
}
