//! Calendar provider port.
//!
//! The gateway only talks to the provider through these traits, so the Google
//! adapter can be swapped for an in-memory stub in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::ServiceCredentials;
use crate::models::EventPayload;
use crate::Result;

/// Calendar to be created.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCalendar {
    pub summary: String,
    pub time_zone: String,
}

/// Calendar metadata as returned by the provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    pub id: String,
    pub summary: Option<String>,
    pub time_zone: Option<String>,
}

/// Access control rule on a calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AclRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: String,
    pub scope: AclScope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AclScope {
    #[serde(rename = "type")]
    pub scope_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl AclRule {
    /// Read access for anyone (`scope.type = "default"`).
    pub fn public_reader() -> Self {
        Self {
            id: None,
            role: "reader".to_string(),
            scope: AclScope {
                scope_type: "default".to_string(),
                value: None,
            },
        }
    }
}

/// Color palette offered by the provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColorPalette {
    #[serde(default)]
    pub event: HashMap<String, ColorDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColorDefinition {
    pub background: String,
    pub foreground: String,
}

/// Event as stored by the provider after insertion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: Option<String>,
    pub color_id: Option<String>,
}

/// One page of an event listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    #[serde(default)]
    pub items: Vec<EventRef>,
    pub next_page_token: Option<String>,
}

/// Minimal event reference used for listing.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRef {
    pub id: String,
}

/// Operations the gateway needs from a calendar provider.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn insert_calendar(&self, calendar: &NewCalendar) -> Result<Calendar>;

    async fn insert_acl(&self, calendar_id: &str, rule: &AclRule) -> Result<AclRule>;

    async fn get_colors(&self) -> Result<ColorPalette>;

    async fn insert_event(&self, calendar_id: &str, event: &EventPayload) -> Result<CreatedEvent>;

    async fn list_events(&self, calendar_id: &str, page_token: Option<&str>) -> Result<EventPage>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()>;

    async fn get_calendar(&self, calendar_id: &str) -> Result<Calendar>;
}

/// Builds an authenticated provider session from service-account credentials.
///
/// Called once per request; implementations must not cache sessions.
#[async_trait]
pub trait ProviderConnector: Send + Sync {
    type Provider: CalendarProvider;

    async fn connect(&self, credentials: &ServiceCredentials) -> Result<Self::Provider>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_public_reader_rule_shape() {
        let value = serde_json::to_value(AclRule::public_reader()).unwrap();
        assert_eq!(value, json!({"role": "reader", "scope": {"type": "default"}}));
    }

    #[test]
    fn test_parse_color_palette() {
        let palette: ColorPalette = serde_json::from_value(json!({
            "kind": "calendar#colors",
            "calendar": {"1": {"background": "#ac725e", "foreground": "#1d1d1d"}},
            "event": {
                "1": {"background": "#a4bdfc", "foreground": "#1d1d1d"},
                "5": {"background": "#fbd75b", "foreground": "#1d1d1d"}
            }
        }))
        .unwrap();
        assert_eq!(palette.event.len(), 2);
        assert_eq!(palette.event["5"].background, "#fbd75b");
    }

    #[test]
    fn test_empty_event_page() {
        let page: EventPage = serde_json::from_value(json!({"kind": "calendar#events"})).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
