//! Service-account authentication against the Google OAuth token endpoint.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::config::ServiceCredentials;
use crate::{Error, Result};

/// OAuth scope granting read/write access to calendars.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Claims of the signed assertion exchanged for an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Service-account email
    pub iss: String,
    pub scope: String,
    /// Token endpoint
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Access token returned by the token endpoint.
#[derive(Debug, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Sign an RS256 assertion for the given credentials.
pub fn build_assertion(
    credentials: &ServiceCredentials,
    token_url: &str,
    now: DateTime<Utc>,
) -> Result<String> {
    let key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
        .map_err(|e| Error::Auth(format!("Invalid service account private key: {}", e)))?;

    let claims = AssertionClaims {
        iss: credentials.client_email.clone(),
        scope: CALENDAR_SCOPE.to_string(),
        aud: token_url.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
    };

    encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map_err(|e| Error::Auth(format!("Failed to sign assertion: {}", e)))
}

/// Exchange a freshly signed assertion for an access token.
pub async fn fetch_access_token(
    http: &reqwest::Client,
    credentials: &ServiceCredentials,
    token_url: &str,
) -> Result<AccessToken> {
    let assertion = build_assertion(credentials, token_url, Utc::now())?;

    let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

    let response = http.post(token_url).form(&params).send().await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        error!("Token exchange failed ({}): {}", status, error_text);
        return Err(Error::provider(
            status.as_u16(),
            format!("Token exchange failed: {}", error_text),
        ));
    }

    Ok(response.json().await?)
}
