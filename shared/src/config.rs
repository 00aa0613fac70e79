//! Configuration management for the calendar gateway.

use std::env;

use crate::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_TIME_ZONE: &str = "America/New_York";
pub const DEFAULT_NAME_PREFIX: &str = "Youredu Schedule";

/// Service-account credentials for the calendar provider.
#[derive(Clone)]
pub struct ServiceCredentials {
    pub client_email: String,
    /// PEM-encoded RSA private key with real newlines
    pub private_key: String,
}

impl ServiceCredentials {
    /// Build credentials, turning literal `\n` sequences in the key into newlines.
    pub fn new(client_email: impl Into<String>, private_key: &str) -> Self {
        Self {
            client_email: client_email.into(),
            private_key: private_key.replace("\\n", "\n"),
        }
    }
}

impl std::fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Gateway configuration, loaded once at cold start.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Service-account credentials; `None` when either env var is missing
    pub credentials: Option<ServiceCredentials>,
    /// Timezone assigned to newly created calendars
    pub time_zone: String,
    /// Summary prefix for newly created calendars
    pub calendar_name_prefix: String,
    /// Calendar API base URL
    pub api_url: String,
    /// OAuth token endpoint
    pub token_url: String,
    /// Value of the Access-Control-Allow-Origin header
    pub cors_allow_origin: String,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let credentials = match (
            non_empty("GOOGLE_CLIENT_EMAIL"),
            non_empty("GOOGLE_PRIVATE_KEY"),
        ) {
            (Some(email), Some(key)) => Some(ServiceCredentials::new(email, &key)),
            _ => None,
        };

        Self {
            credentials,
            time_zone: non_empty("CALENDAR_TIME_ZONE")
                .unwrap_or_else(|| DEFAULT_TIME_ZONE.to_string()),
            calendar_name_prefix: non_empty("CALENDAR_NAME_PREFIX")
                .unwrap_or_else(|| DEFAULT_NAME_PREFIX.to_string()),
            api_url: non_empty("GOOGLE_CALENDAR_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            token_url: non_empty("GOOGLE_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            cors_allow_origin: non_empty("CORS_ALLOW_ORIGIN").unwrap_or_else(|| "*".to_string()),
        }
    }

    /// Configuration with explicit credentials and default everything else.
    pub fn with_credentials(credentials: ServiceCredentials) -> Self {
        Self {
            credentials: Some(credentials),
            ..Self::from_lookup(|_| None)
        }
    }

    /// Credentials, or a config error naming what is missing.
    pub fn require_credentials(&self) -> Result<&ServiceCredentials> {
        self.credentials.as_ref().ok_or_else(|| {
            Error::Config(
                "Missing Google service account credentials (GOOGLE_CLIENT_EMAIL, GOOGLE_PRIVATE_KEY)"
                    .to_string(),
            )
        })
    }

    /// Summary for a user's calendar.
    pub fn calendar_summary(&self, user_email: &str) -> String {
        format!("{} - {}", self.calendar_name_prefix, user_email)
    }
}
