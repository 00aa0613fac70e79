//! Error types for the calendar gateway.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving a calendar request.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or unusable configuration (e.g. service-account credentials)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request body failed boundary validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request body was missing or not parseable JSON for the route
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// The calendar provider answered with an error
    #[error("Provider error: {message}")]
    Provider {
        /// HTTP status reported by the provider, if any
        status: Option<u16>,
        message: String,
    },

    /// Could not build a service-account assertion
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Transport-level failure talking to the provider
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build a provider error from a status code and response text.
    pub fn provider(status: u16, message: impl Into<String>) -> Self {
        Error::Provider {
            status: Some(status),
            message: message.into(),
        }
    }

    /// HTTP status embedded by the provider, if this error came from one.
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            Error::Provider { status, .. } => *status,
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Validation(_) | Error::InvalidBody(_) => "validation",
            Error::Provider { .. } => "provider",
            Error::Auth(_) => "auth",
            Error::Http(_) => "http",
            Error::Serialization(_) => "serialization",
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Error::Validation(errors.to_string())
    }
}
