//! Per-stream output files.
//!
//! One text file per log stream, named
//! `{log_group}_{start}-{end}_{stream}[_N].txt` with both names reduced to a
//! filesystem-safe form. Files are produced in stream-name order and events
//! inside a file in `(timestamp, ingestion_time, event_id)` order, so the
//! same input always yields the same bytes on disk.

#![warn(clippy::all, rust_2018_idioms)]

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::app::data_plane::cloudwatch_logs::LogEvent;
use crate::app::error::{ExportError, ExportResult};
use crate::app::event_collector::StreamBuckets;
use crate::app::local_zone::LocalZone;
use crate::app::time_window::{TimeWindow, OUTPUT_TIMESTAMP_FORMAT};

static SEPARATOR_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[/\\:\s]+").expect("separator pattern is valid"));
static DISALLOWED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("allow-list pattern is valid"));
static UNDERSCORE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_+").expect("underscore pattern is valid"));

/// Fallback for a name with nothing usable left after sanitizing
pub const EMPTY_COMPONENT: &str = "item";

/// Reduce `value` to `[A-Za-z0-9._-]`, separators and whitespace becoming `_`.
pub fn sanitize_filename_component(value: &str) -> String {
    let sanitized = SEPARATOR_RUNS.replace_all(value, "_");
    let sanitized = DISALLOWED_CHARS.replace_all(&sanitized, "");
    let sanitized = UNDERSCORE_RUNS.replace_all(&sanitized, "_");
    let sanitized = sanitized.trim_matches('_');
    if sanitized.is_empty() {
        EMPTY_COMPONENT.to_string()
    } else {
        sanitized.to_string()
    }
}

/// Hands out file stems unique within one run.
///
/// Only stems handed out earlier count as taken; files already on disk are
/// overwritten.
#[derive(Debug, Default)]
pub struct StemAllocator {
    used: HashSet<String>,
}

impl StemAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `stem`, or `stem_2`, `stem_3`, ... for the first one not yet used.
    pub fn allocate(&mut self, stem: &str) -> String {
        let mut candidate = stem.to_string();
        let mut index = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{}_{}", stem, index);
            index += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

/// Render events as output lines, sorted by their ordering key.
pub fn render_stream(events: &mut [LogEvent], zone: &LocalZone) -> String {
    events.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    let mut content = String::new();
    for event in events.iter() {
        let _ = writeln!(
            content,
            "{} : {}",
            zone.from_epoch_ms(event.timestamp)
                .format(OUTPUT_TIMESTAMP_FORMAT),
            event.message
        );
    }
    content
}

/// Writes the collected buckets for one log group and window
#[derive(Debug, Clone)]
pub struct StreamFileWriter {
    out_dir: PathBuf,
    zone: LocalZone,
}

impl StreamFileWriter {
    pub fn new(out_dir: impl Into<PathBuf>, zone: LocalZone) -> Self {
        Self {
            out_dir: out_dir.into(),
            zone,
        }
    }

    /// Write one file per stream and return the written paths in order.
    ///
    /// Stops at the first failure; files written before it stay on disk.
    pub fn write(
        &self,
        log_group_name: &str,
        window: &TimeWindow,
        buckets: StreamBuckets,
    ) -> ExportResult<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.out_dir)
            .map_err(|e| ExportError::io(&self.out_dir, e))?;

        let safe_group = sanitize_filename_component(log_group_name);
        let window_part = format!("{}-{}", window.compact_start(), window.compact_end());
        let mut stems = StemAllocator::new();
        let mut written = Vec::with_capacity(buckets.len());

        // BTreeMap iteration is ordered by the original stream name
        for (stream_name, mut events) in buckets {
            let stem = format!(
                "{}_{}_{}",
                safe_group,
                window_part,
                sanitize_filename_component(&stream_name)
            );
            let path = self
                .out_dir
                .join(format!("{}.txt", stems.allocate(&stem)));
            let content = render_stream(&mut events, &self.zone);
            std::fs::write(&path, content.as_bytes()).map_err(|e| ExportError::io(&path, e))?;
            tracing::debug!(
                "Wrote {} event(s) for stream '{}' to {:?}",
                events.len(),
                stream_name,
                path
            );
            written.push(path);
        }

        tracing::info!("Wrote {} file(s) to {:?}", written.len(), self.out_dir);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(timestamp: i64, ingestion_time: i64, event_id: &str, message: &str) -> LogEvent {
        LogEvent {
            timestamp,
            ingestion_time,
            event_id: event_id.to_string(),
            log_stream_name: "s".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_filename_component("a/b c:d"), "a_b_c_d");
        assert_eq!(
            sanitize_filename_component("/aws/lambda/orders-sit"),
            "aws_lambda_orders-sit"
        );
        assert_eq!(
            sanitize_filename_component("2024/01/02/[$LATEST]abc123"),
            "2024_01_02_LATESTabc123"
        );
        assert_eq!(sanitize_filename_component("a__b\\\\c"), "a_b_c");
    }

    #[test]
    fn test_sanitize_all_invalid_becomes_item() {
        assert_eq!(sanitize_filename_component("$$$"), "item");
        assert_eq!(sanitize_filename_component("///"), "item");
        assert_eq!(sanitize_filename_component(""), "item");
    }

    #[test]
    fn test_stem_allocator_appends_counters() {
        let mut stems = StemAllocator::new();
        assert_eq!(stems.allocate("x"), "x");
        assert_eq!(stems.allocate("x"), "x_2");
        assert_eq!(stems.allocate("x"), "x_3");
        assert_eq!(stems.allocate("x_2"), "x_2_2");
    }

    #[test]
    fn test_render_orders_by_ingestion_then_id() {
        let mut events = vec![
            event(5_000, 2, "b", "second"),
            event(5_000, 1, "a", "first"),
            event(5_000, 2, "a", "tie on ingestion"),
            event(1_000, 9, "z", "earliest"),
        ];
        let content = render_stream(&mut events, &LocalZone::utc());
        assert_eq!(
            content,
            "1970-01-01T00:00:01 : earliest\n\
             1970-01-01T00:00:05 : first\n\
             1970-01-01T00:00:05 : tie on ingestion\n\
             1970-01-01T00:00:05 : second\n"
        );
    }
}
