//! CloudWatch Logs Data Types
//!
//! Wire-level records as delivered by the page sources, and the normalized
//! event the exporter works with.

#![warn(clippy::all, rust_2018_idioms)]

/// A log group as listed by `DescribeLogGroups`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogGroupDescriptor {
    pub name: String,
}

impl LogGroupDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One page of the log group listing
#[derive(Debug, Clone, Default)]
pub struct LogGroupPage {
    pub log_groups: Vec<LogGroupDescriptor>,
    /// Token for the next page, `None` when the listing is exhausted
    pub next_token: Option<String>,
}

/// Message payload as received from a source.
///
/// The SDK hands out text; other sources may only have bytes of unknown
/// encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text(String),
    Bytes(Vec<u8>),
}

impl From<String> for MessageBody {
    fn from(text: String) -> Self {
        MessageBody::Text(text)
    }
}

impl From<&str> for MessageBody {
    fn from(text: &str) -> Self {
        MessageBody::Text(text.to_string())
    }
}

impl From<Vec<u8>> for MessageBody {
    fn from(bytes: Vec<u8>) -> Self {
        MessageBody::Bytes(bytes)
    }
}

/// A filtered log event exactly as the source delivered it; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLogEvent {
    pub timestamp: Option<i64>,
    pub ingestion_time: Option<i64>,
    pub event_id: Option<String>,
    pub log_stream_name: Option<String>,
    pub message: Option<MessageBody>,
}

impl RawLogEvent {
    pub fn new(
        event_id: impl Into<String>,
        log_stream_name: impl Into<String>,
        timestamp: i64,
        message: impl Into<MessageBody>,
    ) -> Self {
        Self {
            timestamp: Some(timestamp),
            ingestion_time: Some(timestamp),
            event_id: Some(event_id.into()),
            log_stream_name: Some(log_stream_name.into()),
            message: Some(message.into()),
        }
    }

    pub fn with_ingestion_time(mut self, ingestion_time: i64) -> Self {
        self.ingestion_time = Some(ingestion_time);
        self
    }
}

/// One page of `FilterLogEvents` results
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub events: Vec<RawLogEvent>,
    pub next_token: Option<String>,
}

/// Parameters of the event query, fixed for the whole pagination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub log_group_name: String,
    /// Start time (Unix timestamp in milliseconds, inclusive)
    pub start_ms: i64,
    /// End time (Unix timestamp in milliseconds, inclusive)
    pub end_ms: i64,
    /// Ask for events interleaved across all streams
    pub interleaved: bool,
}

impl EventQuery {
    pub fn new(log_group_name: impl Into<String>, start_ms: i64, end_ms: i64) -> Self {
        Self {
            log_group_name: log_group_name.into(),
            start_ms,
            end_ms,
            interleaved: true,
        }
    }
}

/// A retained, normalized log event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Event timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Time when the event was ingested (Unix milliseconds)
    pub ingestion_time: i64,
    /// Empty when the source gave no identifier
    pub event_id: String,
    pub log_stream_name: String,
    /// Single-line message text
    pub message: String,
}

impl LogEvent {
    /// Ordering key used in output files
    pub fn sort_key(&self) -> (i64, i64, &str) {
        (self.timestamp, self.ingestion_time, self.event_id.as_str())
    }
}
