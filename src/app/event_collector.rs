//! Event collection.
//!
//! Paginates the filtered event query over the window, drops re-delivered
//! events by identifier, normalizes missing fields and groups everything by
//! log stream. Accumulation is a fold over pages so a single step can be
//! tested without a source.

#![warn(clippy::all, rust_2018_idioms)]

use std::collections::{BTreeMap, HashSet};

use crate::app::data_plane::cloudwatch_logs::{
    EventPageSource, EventQuery, LogEvent, MessageBody, RawLogEvent,
};
use crate::app::error::ExportResult;
use crate::app::local_zone::LocalZone;
use crate::app::log_group_resolver::ResolvedLogGroup;
use crate::app::time_window::TimeWindow;

/// Stream name used when an event carries none
pub const UNKNOWN_STREAM: &str = "unknown_stream";

/// Events grouped by log stream name, in arrival order within each stream
pub type StreamBuckets = BTreeMap<String, Vec<LogEvent>>;

/// Make a message safe to write as exactly one output line.
///
/// Byte payloads are decoded lossily; CR and LF become the literal
/// two-character escapes `\r` and `\n`.
pub fn sanitize_message(message: Option<&MessageBody>) -> String {
    let text = match message {
        None => return String::new(),
        Some(MessageBody::Text(text)) => std::borrow::Cow::Borrowed(text.as_str()),
        Some(MessageBody::Bytes(bytes)) => String::from_utf8_lossy(bytes),
    };
    text.replace('\r', "\\r").replace('\n', "\\n")
}

/// Normalize a raw event: zero for missing times, placeholder stream name,
/// empty identifier, sanitized message.
pub fn normalize_event(raw: &RawLogEvent) -> LogEvent {
    let log_stream_name = match raw.log_stream_name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => UNKNOWN_STREAM.to_string(),
    };
    LogEvent {
        timestamp: raw.timestamp.unwrap_or(0),
        ingestion_time: raw.ingestion_time.unwrap_or(0),
        event_id: raw.event_id.clone().unwrap_or_default(),
        log_stream_name,
        message: sanitize_message(raw.message.as_ref()),
    }
}

/// Counters reported after a collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    pub pages: usize,
    pub events_received: usize,
    pub duplicates_dropped: usize,
}

/// Accumulated state of one collection run
#[derive(Debug, Clone, Default)]
pub struct CollectorState {
    seen_event_ids: HashSet<String>,
    buckets: StreamBuckets,
    summary: CollectionSummary,
}

impl CollectorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one page of events into the state.
    ///
    /// The first sighting of an identifier wins; events without one are
    /// always kept.
    pub fn absorb(mut self, events: &[RawLogEvent]) -> Self {
        self.summary.pages += 1;
        for raw in events {
            self.summary.events_received += 1;
            if let Some(event_id) = raw.event_id.as_deref().filter(|id| !id.is_empty()) {
                if !self.seen_event_ids.insert(event_id.to_string()) {
                    self.summary.duplicates_dropped += 1;
                    continue;
                }
            }
            let event = normalize_event(raw);
            self.buckets
                .entry(event.log_stream_name.clone())
                .or_default()
                .push(event);
        }
        self
    }

    pub fn summary(&self) -> CollectionSummary {
        self.summary
    }

    pub fn buckets(&self) -> &StreamBuckets {
        &self.buckets
    }

    pub fn into_buckets(self) -> StreamBuckets {
        self.buckets
    }
}

/// Collect every event of `log_group` within `window`.
///
/// Any source failure aborts the collection; nothing gathered so far is
/// returned.
pub fn collect_events<S>(
    log_group: &ResolvedLogGroup,
    window: &TimeWindow,
    zone: &LocalZone,
    source: &mut S,
) -> ExportResult<StreamBuckets>
where
    S: EventPageSource + ?Sized,
{
    let query = EventQuery::new(
        log_group.name(),
        window.start_ms(zone)?,
        window.end_ms(zone)?,
    );
    tracing::debug!(
        "Querying {} from {} to {} (ms)",
        query.log_group_name,
        query.start_ms,
        query.end_ms
    );

    let mut state = CollectorState::new();
    let mut next_token: Option<String> = None;
    loop {
        let page = source.fetch_page(&query, next_token.as_deref())?;
        state = state.absorb(&page.events);
        tracing::debug!(
            "Page {}: {} event(s)",
            state.summary().pages,
            page.events.len()
        );
        match page.next_token {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }

    let summary = state.summary();
    tracing::info!(
        "Collected {} event(s) over {} page(s), {} duplicate(s) dropped, {} stream(s)",
        summary.events_received - summary.duplicates_dropped,
        summary.pages,
        summary.duplicates_dropped,
        state.buckets().len()
    );
    Ok(state.into_buckets())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::data_plane::cloudwatch_logs::{EventPage, InMemoryPages, LogGroupDescriptor};
    use crate::app::error::ExportError;
    use crate::app::log_group_resolver::SuffixMatches;
    use chrono::NaiveDateTime;

    fn resolved() -> ResolvedLogGroup {
        SuffixMatches::new("sit")
            .absorb(&[LogGroupDescriptor::new("/x-sit")])
            .into_resolved()
            .unwrap()
    }

    fn window() -> TimeWindow {
        let at = |raw: &str| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").unwrap();
        TimeWindow::new(at("2024-01-01T00:00:00"), at("2024-01-01T00:00:10")).unwrap()
    }

    #[test]
    fn test_sanitize_escapes_line_breaks() {
        let body = MessageBody::from("line one\r\nline two\n");
        assert_eq!(
            sanitize_message(Some(&body)),
            "line one\\r\\nline two\\n"
        );
    }

    #[test]
    fn test_sanitize_replaces_invalid_bytes() {
        let body = MessageBody::from(vec![b'o', b'k', 0xff, b'\n']);
        assert_eq!(sanitize_message(Some(&body)), "ok\u{fffd}\\n");
        assert_eq!(sanitize_message(None), "");
    }

    #[test]
    fn test_normalize_fills_missing_fields() {
        let event = normalize_event(&RawLogEvent::default());
        assert_eq!(event.timestamp, 0);
        assert_eq!(event.ingestion_time, 0);
        assert_eq!(event.event_id, "");
        assert_eq!(event.log_stream_name, UNKNOWN_STREAM);
        assert_eq!(event.message, "");

        let empty_stream = RawLogEvent {
            log_stream_name: Some(String::new()),
            ..RawLogEvent::default()
        };
        assert_eq!(normalize_event(&empty_stream).log_stream_name, UNKNOWN_STREAM);
    }

    #[test]
    fn test_absorb_drops_repeated_ids_across_pages() {
        let state = CollectorState::new()
            .absorb(&[RawLogEvent::new("e1", "s", 1, "first")])
            .absorb(&[
                RawLogEvent::new("e1", "s", 1, "first again"),
                RawLogEvent::new("e2", "s", 2, "second"),
            ]);
        let events = &state.buckets()["s"];
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "first");
        assert_eq!(
            state.summary(),
            CollectionSummary {
                pages: 2,
                events_received: 3,
                duplicates_dropped: 1,
            }
        );
    }

    #[test]
    fn test_absorb_keeps_events_without_ids() {
        let anonymous = RawLogEvent {
            event_id: None,
            ..RawLogEvent::new("", "s", 1, "x")
        };
        let empty_id = RawLogEvent::new("", "s", 1, "x");
        let state = CollectorState::new().absorb(&[
            anonymous.clone(),
            anonymous,
            empty_id.clone(),
            empty_id,
        ]);
        assert_eq!(state.buckets()["s"].len(), 4);
        assert_eq!(state.summary().duplicates_dropped, 0);
    }

    #[test]
    fn test_absorb_groups_by_stream() {
        let state = CollectorState::new().absorb(&[
            RawLogEvent::new("1", "b", 1, "x"),
            RawLogEvent::new("2", "a", 2, "y"),
            RawLogEvent::new("3", "b", 3, "z"),
        ]);
        let streams: Vec<&str> = state.buckets().keys().map(String::as_str).collect();
        assert_eq!(streams, ["a", "b"]);
        assert_eq!(state.buckets()["b"].len(), 2);
    }

    #[test]
    fn test_collect_queries_inclusive_window() {
        let mut source = InMemoryPages::new(vec![
            vec![RawLogEvent::new("e1", "s", 1_704_067_200_000, "a")],
            vec![RawLogEvent::new("e1", "s", 1_704_067_200_000, "a")],
        ]);
        let group = resolved();
        let buckets = collect_events(&group, &window(), &LocalZone::utc(), &mut source).unwrap();

        assert_eq!(buckets["s"].len(), 1);
        assert_eq!(source.queries.len(), 2);
        assert_eq!(
            source.queries[0],
            EventQuery::new("/x-sit", 1_704_067_200_000, 1_704_067_210_999)
        );
    }

    struct FailingSource {
        calls: usize,
    }

    impl EventPageSource for FailingSource {
        fn fetch_page(
            &mut self,
            _query: &EventQuery,
            _next_token: Option<&str>,
        ) -> ExportResult<EventPage> {
            self.calls += 1;
            if self.calls == 1 {
                Ok(EventPage {
                    events: vec![RawLogEvent::new("e1", "s", 1, "a")],
                    next_token: Some("t2".to_string()),
                })
            } else {
                Err(ExportError::validation("boom"))
            }
        }
    }

    #[test]
    fn test_collect_discards_partial_results_on_failure() {
        let group = resolved();
        let mut source = FailingSource { calls: 0 };
        let result = collect_events(&group, &window(), &LocalZone::utc(), &mut source);
        assert!(result.is_err());
        assert_eq!(source.calls, 2);
    }
}
