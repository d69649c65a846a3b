//! Time window resolution.
//!
//! Turns the optional `--from` / `--to` inputs into a concrete, validated
//! `[start, end]` window of local wall-clock times.

#![warn(clippy::all, rust_2018_idioms)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app::error::{ExportError, ExportResult};
use crate::app::local_zone::LocalZone;

pub const INPUT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const INPUT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Separator-free rendering used in output file names
pub const OUTPUT_WINDOW_FORMAT: &str = "%Y%m%dT%H%M%S";
pub const DEFAULT_WINDOW_HOURS: i64 = 12;

static INPUT_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}(T[0-9]{2}:[0-9]{2}:[0-9]{2})?$")
        .expect("input shape pattern is valid")
});

/// Inclusive window of local wall-clock times, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> ExportResult<Self> {
        if start > end {
            return Err(ExportError::validation(
                "--from must be earlier than or equal to --to",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Query lower bound in epoch milliseconds.
    pub fn start_ms(&self, zone: &LocalZone) -> ExportResult<i64> {
        zone.to_epoch_ms(self.start)
    }

    /// Query upper bound in epoch milliseconds, covering the whole end second.
    pub fn end_ms(&self, zone: &LocalZone) -> ExportResult<i64> {
        Ok(zone.to_epoch_ms(self.end)? + 999)
    }

    pub fn compact_start(&self) -> String {
        self.start.format(OUTPUT_WINDOW_FORMAT).to_string()
    }

    pub fn compact_end(&self) -> String {
        self.end.format(OUTPUT_WINDOW_FORMAT).to_string()
    }

    /// `start -> end` in the output timestamp format, for diagnostics
    pub fn display(&self) -> String {
        format!(
            "{} -> {}",
            self.start.format(OUTPUT_TIMESTAMP_FORMAT),
            self.end.format(OUTPUT_TIMESTAMP_FORMAT)
        )
    }
}

/// Parse `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD` (midnight) as local wall-clock time.
pub fn parse_local_datetime(raw_value: &str) -> ExportResult<NaiveDateTime> {
    let value = raw_value.trim();
    if value.is_empty() {
        return Err(ExportError::validation("Datetime value cannot be empty"));
    }

    let invalid = || {
        ExportError::validation(format!(
            "Invalid datetime: {:?}. Use YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS",
            raw_value
        ))
    };
    if !INPUT_SHAPE.is_match(value) {
        return Err(invalid());
    }

    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, INPUT_DATETIME_FORMAT) {
        return Ok(parsed);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, INPUT_DATE_FORMAT) {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight);
        }
    }

    Err(invalid())
}

/// Resolves window bounds against a [`LocalZone`] clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeWindowResolver {
    zone: LocalZone,
}

impl TimeWindowResolver {
    pub fn new(zone: LocalZone) -> Self {
        Self { zone }
    }

    /// Resolve against the zone's current time, read once.
    pub fn resolve(&self, from: Option<&str>, to: Option<&str>) -> ExportResult<TimeWindow> {
        self.resolve_at(from, to, self.zone.now())
    }

    /// Resolve with an explicit "now".
    ///
    /// Absent or empty inputs default as follows: neither given gives the
    /// trailing 12 hours; only `from` ends at `now`; only `to` starts 12 hours
    /// before it.
    pub fn resolve_at(
        &self,
        from: Option<&str>,
        to: Option<&str>,
        now: NaiveDateTime,
    ) -> ExportResult<TimeWindow> {
        let from = from
            .filter(|raw| !raw.is_empty())
            .map(parse_local_datetime)
            .transpose()?;
        let to = to
            .filter(|raw| !raw.is_empty())
            .map(parse_local_datetime)
            .transpose()?;
        let span_before = |end: NaiveDateTime| {
            end.checked_sub_signed(Duration::hours(DEFAULT_WINDOW_HOURS))
                .ok_or_else(|| {
                    ExportError::validation(format!(
                        "Cannot start a window {} hours before {}",
                        DEFAULT_WINDOW_HOURS, end
                    ))
                })
        };

        let (start, end) = match (from, to) {
            (None, None) => (span_before(now)?, now),
            (Some(start), None) => (start, now),
            (None, Some(end)) => (span_before(end)?, end),
            (Some(start), Some(end)) => (start, end),
        };

        let window = TimeWindow::new(start, end)?;
        tracing::debug!("Resolved time window {}", window.display());
        Ok(window)
    }
}
