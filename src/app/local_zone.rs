//! Local wall-clock time zone used for window bounds, file names and event
//! timestamps.
//!
//! Inputs never carry an offset, so every conversion between a wall-clock
//! `NaiveDateTime` and epoch milliseconds goes through a [`LocalZone`]. The
//! default is the host zone; a fixed offset can be configured so runs are
//! reproducible regardless of where the tool executes.

#![warn(clippy::all, rust_2018_idioms)]

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Duration, FixedOffset, Local, LocalResult, NaiveDateTime, Offset, TimeZone,
    Timelike, Utc,
};

use crate::app::error::{ExportError, ExportResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalZone {
    /// Whatever zone the executing host is configured with
    #[default]
    Host,
    Fixed(FixedOffset),
}

impl LocalZone {
    pub fn utc() -> Self {
        LocalZone::Fixed(Utc.fix())
    }

    /// Epoch milliseconds of a wall-clock time in this zone.
    ///
    /// A wall-clock time that occurs twice (DST fold) maps to the earlier
    /// instant. One that never occurs (DST gap) is read with the offset in
    /// effect before the gap, which moves it forward by the size of the gap.
    pub fn to_epoch_ms(&self, local: NaiveDateTime) -> ExportResult<i64> {
        let instant = match self {
            LocalZone::Host => resolve_local(&Local, local)?,
            LocalZone::Fixed(offset) => resolve_local(offset, local)?,
        };
        Ok(instant.timestamp_millis())
    }

    /// Wall-clock time of an epoch millisecond value, truncated to seconds.
    pub fn from_epoch_ms(&self, epoch_ms: i64) -> NaiveDateTime {
        let seconds = epoch_ms.div_euclid(1000);
        let utc = DateTime::<Utc>::from_timestamp(seconds, 0).unwrap_or_default();
        match self {
            LocalZone::Host => utc.with_timezone(&Local).naive_local(),
            LocalZone::Fixed(offset) => utc.with_timezone(offset).naive_local(),
        }
    }

    /// Current wall-clock time, whole seconds only.
    pub fn now(&self) -> NaiveDateTime {
        let now = match self {
            LocalZone::Host => Local::now().naive_local(),
            LocalZone::Fixed(offset) => Utc::now().with_timezone(offset).naive_local(),
        };
        now.with_nanosecond(0).unwrap_or(now)
    }
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> ExportResult<DateTime<Utc>> {
    let result = tz.from_local_datetime(&local);
    let offset_before_gap = match result {
        LocalResult::None => offset_before(tz, local),
        _ => None,
    };
    pick_instant(result, offset_before_gap, local)
}

/// Offset in effect one day before `local`.
fn offset_before<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Option<FixedOffset> {
    let earlier = local.checked_sub_signed(Duration::days(1))?;
    tz.from_local_datetime(&earlier)
        .earliest()
        .map(|instant| instant.offset().fix())
}

fn pick_instant<Tz: TimeZone>(
    result: LocalResult<DateTime<Tz>>,
    offset_before_gap: Option<FixedOffset>,
    local: NaiveDateTime,
) -> ExportResult<DateTime<Utc>> {
    match result {
        LocalResult::Single(instant) => Ok(instant.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => offset_before_gap
            .and_then(|offset| offset.from_local_datetime(&local).single())
            .map(|instant| instant.with_timezone(&Utc))
            .ok_or_else(|| {
                ExportError::validation(format!(
                    "Local time {} does not exist in the configured time zone",
                    local.format("%Y-%m-%dT%H:%M:%S")
                ))
            }),
    }
}

impl fmt::Display for LocalZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalZone::Host => f.write_str("local"),
            LocalZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

impl FromStr for LocalZone {
    type Err = ExportError;

    /// Accepts `local`, `utc`/`z`, or an offset such as `+02:00`, `-0530`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim();
        match value.to_ascii_lowercase().as_str() {
            "" | "local" | "host" => return Ok(LocalZone::Host),
            "utc" | "z" => return Ok(LocalZone::utc()),
            _ => {}
        }

        let invalid = || {
            ExportError::validation(format!(
                "Invalid time zone: {:?}. Use 'local', 'utc' or an offset like +02:00",
                raw
            ))
        };

        let (sign, digits) = match value.as_bytes().first() {
            Some(b'+') => (1, &value[1..]),
            Some(b'-') => (-1, &value[1..]),
            _ => return Err(invalid()),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit() || b == b':') {
            return Err(invalid());
        }
        let (hours, minutes) = match digits.split_once(':') {
            Some((h, m)) => (h, m),
            None if digits.len() == 4 => digits.split_at(2),
            None => (digits, "0"),
        };
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
            return Err(invalid());
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(LocalZone::Fixed)
            .ok_or_else(invalid)
    }
}
