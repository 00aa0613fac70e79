//! In-memory provider used by unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::ServiceCredentials;
use crate::models::EventPayload;
use crate::provider::{
    AclRule, Calendar, CalendarProvider, ColorDefinition, ColorPalette, CreatedEvent, EventPage,
    EventRef, NewCalendar, ProviderConnector,
};
use crate::{Error, Result};

#[derive(Default)]
struct StubState {
    fixed_calendar_id: Option<String>,
    created_calendars: Vec<NewCalendar>,
    acl_inserts: Vec<(String, AclRule)>,
    acl_error: Option<u16>,
    color_remap: Option<String>,
    colors_error: bool,
    inserted_events: Vec<(String, EventPayload)>,
    /// Page N is listed with token `None` (N = 0) or `page-N`
    pages: Vec<Vec<String>>,
    fail_listing_at: Option<String>,
    fail_delete_of: Option<String>,
    get_calendar_error: Option<u16>,
    calls: Vec<String>,
    list_tokens: Vec<Option<String>>,
}

/// Stub calendar provider; clones share state.
#[derive(Clone, Default)]
pub struct StubProvider {
    state: Arc<Mutex<StubState>>,
    connects: Arc<AtomicUsize>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event_pages(pages: Vec<Vec<&str>>) -> Self {
        let stub = Self::new();
        stub.state().pages = pages
            .into_iter()
            .map(|page| page.into_iter().map(str::to_string).collect())
            .collect();
        stub
    }

    fn state(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap()
    }

    pub fn with_calendar_id(self, id: &str) -> Self {
        self.state().fixed_calendar_id = Some(id.to_string());
        self
    }

    pub fn fail_acl_with(&self, status: u16) {
        self.state().acl_error = Some(status);
    }

    pub fn remap_color_to(&self, color_id: &str) {
        self.state().color_remap = Some(color_id.to_string());
    }

    pub fn fail_colors(&self) {
        self.state().colors_error = true;
    }

    pub fn fail_listing_at(&self, token: &str) {
        self.state().fail_listing_at = Some(token.to_string());
    }

    pub fn fail_delete_of(&self, event_id: &str) {
        self.state().fail_delete_of = Some(event_id.to_string());
    }

    pub fn clear_delete_failure(&self) {
        self.state().fail_delete_of = None;
    }

    pub fn fail_get_calendar_with(&self, status: u16) {
        self.state().get_calendar_error = Some(status);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn list_calls(&self) -> Vec<Option<String>> {
        self.state().list_tokens.clone()
    }

    pub fn acl_inserts(&self) -> Vec<(String, AclRule)> {
        self.state().acl_inserts.clone()
    }

    pub fn created_calendars(&self) -> Vec<NewCalendar> {
        self.state().created_calendars.clone()
    }

    pub fn inserted_events(&self) -> Vec<(String, EventPayload)> {
        self.state().inserted_events.clone()
    }

    pub fn remaining_events(&self) -> usize {
        self.state().pages.iter().map(Vec::len).sum()
    }
}

fn page_index(token: Option<&str>) -> Result<usize> {
    match token {
        None => Ok(0),
        Some(token) => token
            .strip_prefix("page-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| Error::provider(400, format!("Invalid page token {}", token))),
    }
}

#[async_trait]
impl CalendarProvider for StubProvider {
    async fn insert_calendar(&self, calendar: &NewCalendar) -> Result<Calendar> {
        let mut state = self.state();
        state.calls.push(format!("insert_calendar:{}", calendar.summary));
        state.created_calendars.push(calendar.clone());
        let id = state
            .fixed_calendar_id
            .clone()
            .unwrap_or_else(|| format!("{}@group.calendar.google.com", uuid::Uuid::new_v4()));
        Ok(Calendar {
            id,
            summary: Some(calendar.summary.clone()),
            time_zone: Some(calendar.time_zone.clone()),
        })
    }

    async fn insert_acl(&self, calendar_id: &str, rule: &AclRule) -> Result<AclRule> {
        let mut state = self.state();
        state.calls.push(format!("insert_acl:{}", calendar_id));
        state.acl_inserts.push((calendar_id.to_string(), rule.clone()));
        if let Some(status) = state.acl_error {
            return Err(Error::provider(status, "Insufficient Permission"));
        }
        Ok(AclRule {
            id: Some("default".to_string()),
            ..rule.clone()
        })
    }

    async fn get_colors(&self) -> Result<ColorPalette> {
        let mut state = self.state();
        state.calls.push("get_colors".to_string());
        if state.colors_error {
            return Err(Error::provider(503, "Backend Error"));
        }
        let mut palette = ColorPalette::default();
        for id in ["1", "3", "5"] {
            palette.event.insert(
                id.to_string(),
                ColorDefinition {
                    background: "#a4bdfc".to_string(),
                    foreground: "#1d1d1d".to_string(),
                },
            );
        }
        Ok(palette)
    }

    async fn insert_event(&self, calendar_id: &str, event: &EventPayload) -> Result<CreatedEvent> {
        let mut state = self.state();
        state.calls.push(format!("insert_event:{}", calendar_id));
        state
            .inserted_events
            .push((calendar_id.to_string(), event.clone()));
        let id = format!("evt{}", state.inserted_events.len());
        Ok(CreatedEvent {
            html_link: Some(format!("https://calendar.google.com/event?eid={}", id)),
            color_id: state.color_remap.clone().or_else(|| event.color_id.clone()),
            id,
        })
    }

    async fn list_events(&self, _calendar_id: &str, page_token: Option<&str>) -> Result<EventPage> {
        let mut state = self.state();
        state.calls.push(format!("list_events:{}", page_token.unwrap_or("-")));
        state.list_tokens.push(page_token.map(str::to_string));

        if page_token.is_some() && state.fail_listing_at.as_deref() == page_token {
            return Err(Error::provider(500, "Backend Error"));
        }
        if state.pages.is_empty() {
            return Ok(EventPage::default());
        }

        let index = page_index(page_token)?;
        let items = state
            .pages
            .get(index)
            .ok_or_else(|| Error::provider(400, "Page token out of range"))?
            .iter()
            .map(|id| EventRef { id: id.clone() })
            .collect();
        let next_page_token = (index + 1 < state.pages.len()).then(|| format!("page-{}", index + 1));

        Ok(EventPage {
            items,
            next_page_token,
        })
    }

    async fn delete_event(&self, _calendar_id: &str, event_id: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(format!("delete_event:{}", event_id));
        if state.fail_delete_of.as_deref() == Some(event_id) {
            return Err(Error::provider(500, "Backend Error"));
        }
        for page in state.pages.iter_mut() {
            page.retain(|id| id != event_id);
        }
        Ok(())
    }

    async fn get_calendar(&self, calendar_id: &str) -> Result<Calendar> {
        let mut state = self.state();
        state.calls.push(format!("get_calendar:{}", calendar_id));
        match state.get_calendar_error {
            Some(status) => Err(Error::provider(status, "Request failed")),
            None => Ok(Calendar {
                id: calendar_id.to_string(),
                summary: None,
                time_zone: None,
            }),
        }
    }
}

#[async_trait]
impl ProviderConnector for StubProvider {
    type Provider = StubProvider;

    async fn connect(&self, _credentials: &ServiceCredentials) -> Result<StubProvider> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.clone())
    }
}
