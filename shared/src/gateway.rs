//! Calendar gateway: routes the calendar endpoints onto the provider port.
//!
//! Endpoints (all POST, JSON bodies):
//! - /calendar - Create a calendar for a user and make it publicly readable
//! - /calendar/events - Insert an event
//! - /calendar/clear - Delete every event on a calendar
//! - /calendar/check - Check whether a calendar exists

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error as ThisError;
use tracing::{error, info, warn};
use validator::Validate;

use crate::config::GatewayConfig;
use crate::http::{parse_json_body, GatewayResponse};
use crate::models::{
    CalendarRequest, CheckCalendarResponse, CheckRequest, ClearEventsResponse, ClearRequest,
    ColorInfo, CreateCalendarResponse, CreateEventResponse, EventRequest,
};
use crate::pager::EventPager;
use crate::provider::{AclRule, CalendarProvider, NewCalendar, ProviderConnector};
use crate::{Error, Result};

pub const CALENDAR_CREATED_MESSAGE: &str = "Calendar created and made public successfully";
const INIT_FAILED_MESSAGE: &str = "Failed to initialize calendar client";
const INVALID_BODY_MESSAGE: &str = "Invalid request body";

/// A failed operation plus whatever progress it made before failing.
#[derive(Debug, ThisError)]
#[error("{source}")]
pub struct GatewayError {
    #[source]
    pub source: Error,
    pub details: Map<String, Value>,
}

impl GatewayError {
    fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// 400 envelope `{error, details}` returned to callers.
    fn into_response(self) -> GatewayResponse {
        let mut details = self.details;
        let message = describe(&self.source, &mut details);
        GatewayResponse::json(400, json!({ "error": message, "details": details }))
    }
}

/// Caller-facing message for `error`; fills in the matching detail entries.
fn describe(error: &Error, details: &mut Map<String, Value>) -> String {
    details.insert("kind".to_string(), error.kind().into());
    if let Some(status) = error.provider_status() {
        details.insert("providerStatus".to_string(), status.into());
    }

    match error {
        Error::Config(msg) => {
            details.insert("message".to_string(), msg.clone().into());
            INIT_FAILED_MESSAGE.to_string()
        }
        Error::InvalidBody(msg) => {
            details.insert("message".to_string(), msg.clone().into());
            INVALID_BODY_MESSAGE.to_string()
        }
        other => other.to_string(),
    }
}

impl From<Error> for GatewayError {
    fn from(source: Error) -> Self {
        Self {
            source,
            details: Map::new(),
        }
    }
}

/// Known endpoints, matched on the path suffix starting at `/calendar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    CreateCalendar,
    CreateEvent,
    ClearEvents,
    CheckCalendar,
}

impl Route {
    fn resolve(method: &str, path: &str) -> Option<Self> {
        if !method.eq_ignore_ascii_case("POST") {
            return None;
        }

        match calendar_suffix(path)? {
            "/calendar" => Some(Route::CreateCalendar),
            "/calendar/events" => Some(Route::CreateEvent),
            "/calendar/clear" => Some(Route::ClearEvents),
            "/calendar/check" => Some(Route::CheckCalendar),
            _ => None,
        }
    }
}

/// Strip any stage or function prefix so `/prod/calendar/events` routes like
/// `/calendar/events`.
fn calendar_suffix(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    trimmed
        .match_indices("/calendar")
        .map(|(idx, _)| idx)
        .find(|&idx| {
            let rest = &trimmed[idx + "/calendar".len()..];
            rest.is_empty() || rest.starts_with('/')
        })
        .map(|idx| &trimmed[idx..])
}

/// Last path segment, echoed back in 404 responses.
fn endpoint_of(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

fn parse_request<T: DeserializeOwned + Validate>(body: &[u8]) -> Result<T> {
    let request: T = parse_json_body(body)?;
    request.validate()?;
    Ok(request)
}

/// Stateless gateway; one instance serves every invocation.
pub struct CalendarGateway<C> {
    config: GatewayConfig,
    connector: C,
}

impl<C: ProviderConnector> CalendarGateway<C> {
    pub fn new(config: GatewayConfig, connector: C) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Fresh provider session for the current request.
    async fn session(&self) -> Result<C::Provider> {
        let credentials = self.config.require_credentials()?;
        self.connector.connect(credentials).await
    }

    /// Create a calendar for the user, then grant public read access.
    ///
    /// The two provider calls are not atomic: if the ACL insert fails the
    /// calendar still exists and its id is reported in the error details.
    pub async fn create_calendar(
        &self,
        request: &CalendarRequest,
    ) -> std::result::Result<CreateCalendarResponse, GatewayError> {
        let provider = self.session().await?;

        info!("Creating calendar for user {}", request.user_id);

        let calendar = provider
            .insert_calendar(&NewCalendar {
                summary: self.config.calendar_summary(&request.user_email),
                time_zone: self.config.time_zone.clone(),
            })
            .await?;

        if let Err(e) = provider
            .insert_acl(&calendar.id, &AclRule::public_reader())
            .await
        {
            error!(
                "Calendar {} created for user {} but making it public failed: {}",
                calendar.id, request.user_id, e
            );
            return Err(GatewayError::from(e)
                .with("calendarId", calendar.id)
                .with("calendarCreated", true));
        }

        info!("Created public calendar {} for user {}", calendar.id, request.user_id);

        Ok(CreateCalendarResponse {
            calendar_id: calendar.id,
            message: CALENDAR_CREATED_MESSAGE.to_string(),
        })
    }

    /// Insert an event, reporting the requested and provider-assigned colors.
    pub async fn create_event(
        &self,
        request: &EventRequest,
    ) -> std::result::Result<CreateEventResponse, GatewayError> {
        let provider = self.session().await?;
        let requested_color = request.event.color_id.clone();

        match provider.get_colors().await {
            Ok(palette) => info!(
                "Provider offers {} event colors; requested color {:?} known: {}",
                palette.event.len(),
                requested_color,
                requested_color
                    .as_deref()
                    .is_some_and(|id| palette.event.contains_key(id))
            ),
            Err(e) => warn!("Failed to fetch color palette: {}", e),
        }

        let created = provider
            .insert_event(&request.calendar_id, &request.event)
            .await?;

        if created.color_id != requested_color {
            warn!(
                "Provider changed color of event {} from {:?} to {:?}",
                created.id, requested_color, created.color_id
            );
        }

        info!("Created event {} on calendar {}", created.id, request.calendar_id);

        Ok(CreateEventResponse {
            event_id: created.id,
            html_link: created.html_link,
            success: true,
            color_info: ColorInfo {
                requested_color,
                final_color: created.color_id,
            },
        })
    }

    /// Delete every event on the calendar, one at a time.
    ///
    /// On failure the details carry the number deleted so far and the page
    /// token to resume from.
    pub async fn clear_events(
        &self,
        request: &ClearRequest,
    ) -> std::result::Result<ClearEventsResponse, GatewayError> {
        let provider = self.session().await?;
        let mut pager = EventPager::new(
            &provider,
            &request.calendar_id,
            request.page_token.clone(),
        );
        let mut deleted = 0usize;

        info!("Clearing events on calendar {}", request.calendar_id);

        loop {
            let page = match pager.next_page().await {
                Ok(Some(page)) => page,
                Ok(None) => break,
                Err(e) => return Err(clear_failure(e, deleted, pager.resume_token())),
            };

            for event in page {
                if let Err(e) = provider.delete_event(&request.calendar_id, &event.id).await {
                    error!(
                        "Failed to delete event {} on calendar {}: {}",
                        event.id, request.calendar_id, e
                    );
                    return Err(clear_failure(e, deleted, pager.resume_token()));
                }
                deleted += 1;
            }
        }

        info!("Deleted {} events on calendar {}", deleted, request.calendar_id);

        Ok(ClearEventsResponse {
            success: true,
            message: format!("Deleted {} events", deleted),
            deleted,
        })
    }

    /// `Ok(false)` when the provider reports the calendar as missing.
    pub async fn check_calendar(&self, request: &CheckRequest) -> Result<bool> {
        let provider = self.session().await?;

        match provider.get_calendar(&request.calendar_id).await {
            Ok(_) => Ok(true),
            Err(e) if e.provider_status() == Some(404) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Dispatch a raw request.
    pub async fn handle(&self, method: &str, path: &str, body: &[u8]) -> GatewayResponse {
        if method.eq_ignore_ascii_case("OPTIONS") {
            return GatewayResponse::empty(200);
        }

        let Some(route) = Route::resolve(method, path) else {
            warn!("No route for {} {}", method, path);
            return GatewayResponse::json(
                404,
                json!({
                    "error": "Not found",
                    "path": path,
                    "endpoint": endpoint_of(path),
                    "method": method,
                }),
            );
        };

        let result = match route {
            Route::CheckCalendar => return self.handle_check(body).await,
            Route::CreateCalendar => match parse_request(body) {
                Ok(request) => self.create_calendar(&request).await.and_then(to_value),
                Err(e) => Err(e.into()),
            },
            Route::CreateEvent => match parse_request(body) {
                Ok(request) => self.create_event(&request).await.and_then(to_value),
                Err(e) => Err(e.into()),
            },
            Route::ClearEvents => match parse_request(body) {
                Ok(request) => self.clear_events(&request).await.and_then(to_value),
                Err(e) => Err(e.into()),
            },
        };

        match result {
            Ok(value) => GatewayResponse::json(200, value),
            Err(e) => {
                error!("Request failed: {}", e);
                e.into_response()
            }
        }
    }

    async fn handle_check(&self, body: &[u8]) -> GatewayResponse {
        let result = match parse_request::<CheckRequest>(body) {
            Ok(request) => self.check_calendar(&request).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(true) => check_response(200, true, None, None, None),
            Ok(false) => check_response(200, false, None, Some("Calendar not found"), None),
            Err(e) => {
                error!("Calendar check failed: {}", e);
                let mut details = Map::new();
                let message = describe(&e, &mut details);
                let (status, reason) = match &e {
                    Error::Config(_) => (400, "Configuration error"),
                    Error::Validation(_) | Error::InvalidBody(_) => (400, "Invalid request"),
                    _ => match e.provider_status() {
                        Some(status @ (401 | 403)) => (status, "Authentication error"),
                        _ => (500, "Unknown error"),
                    },
                };
                check_response(
                    status,
                    false,
                    Some(message),
                    Some(reason),
                    Some(Value::Object(details)),
                )
            }
        }
    }
}

fn clear_failure(source: Error, deleted: usize, resume_token: Option<&str>) -> GatewayError {
    GatewayError::from(source)
        .with("deleted", deleted)
        .with("resumePageToken", resume_token.map(str::to_string))
}

fn to_value<T: Serialize>(body: T) -> std::result::Result<Value, GatewayError> {
    serde_json::to_value(body).map_err(|e| Error::Serialization(e).into())
}

fn check_response(
    status: u16,
    exists: bool,
    error: Option<String>,
    reason: Option<&str>,
    details: Option<Value>,
) -> GatewayResponse {
    let body = CheckCalendarResponse {
        exists,
        error,
        reason: reason.map(str::to_string),
        details,
    };
    match serde_json::to_value(&body) {
        Ok(value) => GatewayResponse::json(status, value),
        Err(e) => GatewayResponse::json(500, json!({ "exists": false, "error": e.to_string() })),
    }
}
