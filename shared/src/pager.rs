//! Lazy, restartable walk over a calendar's event pages.

use crate::provider::{CalendarProvider, EventRef};
use crate::Result;

/// Fetches event pages one at a time, following the provider's page token.
///
/// `resume_token` is the cursor of the page currently being processed, so a
/// caller that fails halfway through a page can start a new pager from it.
pub struct EventPager<'a, P: ?Sized> {
    provider: &'a P,
    calendar_id: &'a str,
    current: Option<String>,
    next: Option<String>,
    started: bool,
    exhausted: bool,
}

impl<'a, P: CalendarProvider + ?Sized> EventPager<'a, P> {
    /// Start at `start_token`, or at the first page when `None`.
    pub fn new(provider: &'a P, calendar_id: &'a str, start_token: Option<String>) -> Self {
        Self {
            provider,
            calendar_id,
            current: None,
            next: start_token,
            started: false,
            exhausted: false,
        }
    }

    /// Next page of events, or `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<EventRef>>> {
        if self.exhausted {
            return Ok(None);
        }

        let token = self.next.take();
        self.current = token.clone();
        self.started = true;

        let page = match self
            .provider
            .list_events(self.calendar_id, token.as_deref())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                self.next = token;
                return Err(e);
            }
        };

        self.next = page.next_page_token;
        self.exhausted = self.next.is_none();

        Ok(Some(page.items))
    }

    /// Cursor from which a retry should resume after a failure.
    pub fn resume_token(&self) -> Option<&str> {
        if self.started {
            self.current.as_deref()
        } else {
            self.next.as_deref()
        }
    }
}
