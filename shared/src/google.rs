//! Google Calendar v3 adapter for the provider port.

use async_trait::async_trait;
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::auth::fetch_access_token;
use crate::config::{GatewayConfig, ServiceCredentials};
use crate::models::EventPayload;
use crate::provider::{
    AclRule, Calendar, CalendarProvider, ColorPalette, CreatedEvent, EventPage, NewCalendar,
    ProviderConnector,
};
use crate::{Error, Result};

const MAX_RESULTS: u32 = 250;

/// Error body returned by Google APIs.
#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

/// Mints an access token per request and hands out a client bound to it.
#[derive(Debug, Clone)]
pub struct GoogleConnector {
    http_client: reqwest::Client,
    api_url: String,
    token_url: String,
}

impl GoogleConnector {
    pub fn new(http_client: reqwest::Client, api_url: String, token_url: String) -> Self {
        Self {
            http_client,
            api_url,
            token_url,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            reqwest::Client::new(),
            config.api_url.clone(),
            config.token_url.clone(),
        )
    }
}

#[async_trait]
impl ProviderConnector for GoogleConnector {
    type Provider = GoogleCalendarClient;

    async fn connect(&self, credentials: &ServiceCredentials) -> Result<GoogleCalendarClient> {
        let token = fetch_access_token(&self.http_client, credentials, &self.token_url).await?;
        debug!("Obtained access token for {}", credentials.client_email);

        Ok(GoogleCalendarClient::new(
            self.http_client.clone(),
            self.api_url.clone(),
            token.access_token,
        ))
    }
}

/// Calendar API client holding a bearer token.
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GoogleCalendarClient {
    pub fn new(http_client: reqwest::Client, base_url: String, access_token: String) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    fn calendar_url(&self, calendar_id: &str) -> String {
        format!("{}/calendars/{}", self.base_url, urlencoding::encode(calendar_id))
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!("{}/events", self.calendar_url(calendar_id))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.bearer_auth(&self.access_token)
    }
}

/// Turn a non-success response into a provider error carrying its status.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GoogleErrorBody>(&text)
        .map(|body| body.error.message)
        .unwrap_or_else(|_| {
            if text.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                text
            }
        });

    Err(Error::provider(status.as_u16(), message))
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
    Ok(check_status(response).await?.json().await?)
}

#[async_trait]
impl CalendarProvider for GoogleCalendarClient {
    async fn insert_calendar(&self, calendar: &NewCalendar) -> Result<Calendar> {
        let url = format!("{}/calendars", self.base_url);
        let response = self
            .authorized(self.http_client.post(&url))
            .json(calendar)
            .send()
            .await?;
        parse(response).await
    }

    async fn insert_acl(&self, calendar_id: &str, rule: &AclRule) -> Result<AclRule> {
        let url = format!("{}/acl", self.calendar_url(calendar_id));
        let response = self
            .authorized(self.http_client.post(&url))
            .json(rule)
            .send()
            .await?;
        parse(response).await
    }

    async fn get_colors(&self) -> Result<ColorPalette> {
        let url = format!("{}/colors", self.base_url);
        let response = self.authorized(self.http_client.get(&url)).send().await?;
        parse(response).await
    }

    async fn insert_event(&self, calendar_id: &str, event: &EventPayload) -> Result<CreatedEvent> {
        let response = self
            .authorized(self.http_client.post(self.events_url(calendar_id)))
            .json(event)
            .send()
            .await?;
        parse(response).await
    }

    async fn list_events(&self, calendar_id: &str, page_token: Option<&str>) -> Result<EventPage> {
        let mut url = format!("{}?maxResults={}", self.events_url(calendar_id), MAX_RESULTS);
        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }

        let response = self.authorized(self.http_client.get(&url)).send().await?;
        parse(response).await
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()> {
        let url = format!(
            "{}/{}",
            self.events_url(calendar_id),
            urlencoding::encode(event_id)
        );
        let response = self.authorized(self.http_client.delete(&url)).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn get_calendar(&self, calendar_id: &str) -> Result<Calendar> {
        let response = self
            .authorized(self.http_client.get(self.calendar_url(calendar_id)))
            .send()
            .await?;
        parse(response).await
    }
}
