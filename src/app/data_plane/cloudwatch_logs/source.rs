//! Page source seams between the exporter and CloudWatch Logs.
//!
//! Both listings are token-paginated: a page carries `next_token` until the
//! source is exhausted. The exporter drives the loop; a source only answers
//! one request at a time.

#![warn(clippy::all, rust_2018_idioms)]

use std::collections::VecDeque;

use crate::app::error::ExportResult;

use super::types::{EventPage, EventQuery, LogGroupDescriptor, LogGroupPage, RawLogEvent};

/// Lists every log group visible to the active credentials
pub trait LogGroupLister {
    fn list_page(&mut self, next_token: Option<&str>) -> ExportResult<LogGroupPage>;
}

/// Runs a filtered event query, one page per call
pub trait EventPageSource {
    fn fetch_page(&mut self, query: &EventQuery, next_token: Option<&str>)
        -> ExportResult<EventPage>;
}

/// Serves pre-built pages in order, chaining them with synthetic tokens.
///
/// The token passed back in is not inspected, so a caller that replays a
/// token still advances through the pages.
#[derive(Debug, Clone)]
pub struct InMemoryPages<T> {
    pages: VecDeque<Vec<T>>,
    served: usize,
    /// Queries seen by an event source, in call order
    pub queries: Vec<EventQuery>,
}

impl<T> Default for InMemoryPages<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> InMemoryPages<T> {
    pub fn new(pages: Vec<Vec<T>>) -> Self {
        Self {
            pages: pages.into(),
            served: 0,
            queries: Vec::new(),
        }
    }

    pub fn requests_served(&self) -> usize {
        self.served
    }

    fn next(&mut self) -> (Vec<T>, Option<String>) {
        self.served += 1;
        let page = self.pages.pop_front().unwrap_or_default();
        let next_token = if self.pages.is_empty() {
            None
        } else {
            Some(format!("page-{}", self.served + 1))
        };
        (page, next_token)
    }
}

impl LogGroupLister for InMemoryPages<LogGroupDescriptor> {
    fn list_page(&mut self, _next_token: Option<&str>) -> ExportResult<LogGroupPage> {
        let (log_groups, next_token) = self.next();
        Ok(LogGroupPage {
            log_groups,
            next_token,
        })
    }
}

impl EventPageSource for InMemoryPages<RawLogEvent> {
    fn fetch_page(
        &mut self,
        query: &EventQuery,
        _next_token: Option<&str>,
    ) -> ExportResult<EventPage> {
        self.queries.push(query.clone());
        let (events, next_token) = self.next();
        Ok(EventPage { events, next_token })
    }
}

/// Log group listing and event pages served from memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryLogs {
    pub log_groups: InMemoryPages<LogGroupDescriptor>,
    pub events: InMemoryPages<RawLogEvent>,
}

impl InMemoryLogs {
    pub fn new(log_groups: Vec<Vec<LogGroupDescriptor>>, events: Vec<Vec<RawLogEvent>>) -> Self {
        Self {
            log_groups: InMemoryPages::new(log_groups),
            events: InMemoryPages::new(events),
        }
    }
}

impl LogGroupLister for InMemoryLogs {
    fn list_page(&mut self, next_token: Option<&str>) -> ExportResult<LogGroupPage> {
        self.log_groups.list_page(next_token)
    }
}

impl EventPageSource for InMemoryLogs {
    fn fetch_page(
        &mut self,
        query: &EventQuery,
        next_token: Option<&str>,
    ) -> ExportResult<EventPage> {
        self.events.fetch_page(query, next_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_pages_chain_tokens() {
        let mut source = InMemoryPages::new(vec![
            vec![LogGroupDescriptor::new("a")],
            vec![LogGroupDescriptor::new("b")],
        ]);
        let first = source.list_page(None).unwrap();
        assert_eq!(first.next_token.as_deref(), Some("page-2"));
        let second = source.list_page(first.next_token.as_deref()).unwrap();
        assert!(second.next_token.is_none());
        assert_eq!(second.log_groups[0].name, "b");
        assert_eq!(source.requests_served(), 2);
    }

    #[test]
    fn test_empty_source_yields_one_empty_page() {
        let mut source: InMemoryPages<RawLogEvent> = InMemoryPages::new(Vec::new());
        let page = source
            .fetch_page(&EventQuery::new("g", 0, 1), None)
            .unwrap();
        assert!(page.events.is_empty());
        assert!(page.next_token.is_none());
        assert_eq!(source.queries.len(), 1);
    }

    #[test]
    fn test_default_logs_serve_empty_listing() {
        let mut logs = InMemoryLogs::default();
        let page = logs.list_page(None).unwrap();
        assert!(page.log_groups.is_empty());
        assert!(page.next_token.is_none());
        assert_eq!(logs.log_groups.requests_served(), 1);
        assert_eq!(logs.events.requests_served(), 0);
    }
}
