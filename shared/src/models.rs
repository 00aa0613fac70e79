//! Request and response payloads of the calendar endpoints.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

/// Create calendar request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRequest {
    #[validate(length(min = 1, message = "userId must not be empty"))]
    pub user_id: String,
    #[validate(email(message = "userEmail must be an email address"))]
    pub user_email: String,
}

/// Create event request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    #[validate(length(min = 1, message = "calendarId must not be empty"))]
    pub calendar_id: String,
    #[validate(nested)]
    pub event: EventPayload,
}

/// Clear events request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClearRequest {
    #[validate(length(min = 1, message = "calendarId must not be empty"))]
    pub calendar_id: String,
    /// Resume cursor returned by an interrupted clear
    #[serde(default)]
    pub page_token: Option<String>,
}

/// Calendar existence check payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    #[validate(length(min = 1, message = "calendarId must not be empty"))]
    pub calendar_id: String,
}

/// Event forwarded to the provider.
///
/// `summary`, `start` and `end` are checked here; every other field the
/// caller sends (description, location, recurrence, ...) passes through
/// untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[validate(length(min = 1, message = "summary must not be empty"))]
    pub summary: String,
    #[validate(custom(function = "validate_event_time"))]
    pub start: EventTime,
    #[validate(custom(function = "validate_event_time"))]
    pub end: EventTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Start or end of an event: a timestamp or an all-day date.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

fn validate_event_time(time: &EventTime) -> Result<(), ValidationError> {
    match (&time.date_time, &time.date) {
        (Some(date_time), None) => DateTime::parse_from_rfc3339(date_time)
            .map(|_| ())
            .map_err(|_| invalid_time("dateTime must be an RFC 3339 timestamp")),
        (None, Some(date)) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(|_| ())
            .map_err(|_| invalid_time("date must be formatted YYYY-MM-DD")),
        (Some(_), Some(_)) => Err(invalid_time("set either dateTime or date, not both")),
        (None, None) => Err(invalid_time("dateTime or date is required")),
    }
}

fn invalid_time(message: &'static str) -> ValidationError {
    let mut err = ValidationError::new("event_time");
    err.message = Some(message.into());
    err
}

/// Create calendar response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCalendarResponse {
    pub calendar_id: String,
    pub message: String,
}

/// Create event response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventResponse {
    pub event_id: String,
    pub html_link: Option<String>,
    pub success: bool,
    pub color_info: ColorInfo,
}

/// Requested versus provider-assigned event color.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColorInfo {
    pub requested_color: Option<String>,
    pub final_color: Option<String>,
}

/// Clear events response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearEventsResponse {
    pub success: bool,
    pub message: String,
    pub deleted: usize,
}

/// Calendar existence check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckCalendarResponse {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}
