//! End-to-end export run.
//!
//! [`prepare_export`] validates everything that needs no network access
//! (identifiers, time window, output directory). [`run_export`] then resolves
//! the log group, collects the events and writes the stream files, printing
//! the run diagnostics to the given sink.

#![warn(clippy::all, rust_2018_idioms)]

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app::data_plane::cloudwatch_logs::{EventPageSource, LogGroupLister};
use crate::app::error::{ExportError, ExportResult};
use crate::app::event_collector::collect_events;
use crate::app::local_zone::LocalZone;
use crate::app::log_group_resolver::resolve_log_group;
use crate::app::stream_writer::StreamFileWriter;
use crate::app::time_window::{TimeWindow, TimeWindowResolver};

/// User input for one export run
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub base_name: String,
    pub env: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub out_dir: PathBuf,
}

/// A validated request, ready to talk to AWS
#[derive(Debug, Clone)]
pub struct ExportPlan {
    pub base_name: String,
    pub env: String,
    pub window: TimeWindow,
    pub zone: LocalZone,
    /// Absolute output directory
    pub out_dir: PathBuf,
}

/// What a finished run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub log_group: String,
    pub window: TimeWindow,
    pub stream_count: usize,
    pub out_dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Expand a leading `~` and anchor relative paths at the current directory.
pub fn absolute_out_dir(raw: &Path) -> ExportResult<PathBuf> {
    let expanded = match raw.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => raw.to_path_buf(),
        },
        Err(_) => raw.to_path_buf(),
    };
    if expanded.is_absolute() {
        return Ok(expanded);
    }
    let cwd = std::env::current_dir().map_err(|e| ExportError::io(".", e))?;
    Ok(cwd.join(expanded))
}

/// Validate a request without touching the network.
pub fn prepare_export(request: &ExportRequest, zone: LocalZone) -> ExportResult<ExportPlan> {
    let base_name = request.base_name.trim();
    if base_name.is_empty() {
        return Err(ExportError::validation("Base log group name cannot be empty"));
    }
    let env = request.env.trim();
    if env.is_empty() {
        return Err(ExportError::validation("--env is required and cannot be empty"));
    }

    let window =
        TimeWindowResolver::new(zone).resolve(request.from.as_deref(), request.to.as_deref())?;
    let out_dir = absolute_out_dir(&request.out_dir)?;

    Ok(ExportPlan {
        base_name: base_name.to_string(),
        env: env.to_string(),
        window,
        zone,
        out_dir,
    })
}

/// Resolve, collect and write.
///
/// Diagnostic lines go to `diagnostics` once the events are collected and
/// before any file is written.
pub fn run_export<R, W>(
    plan: &ExportPlan,
    remote: &mut R,
    diagnostics: &mut W,
) -> ExportResult<ExportReport>
where
    R: LogGroupLister + EventPageSource + ?Sized,
    W: Write + ?Sized,
{
    let log_group = resolve_log_group(&plan.base_name, &plan.env, remote)?;
    let buckets = collect_events(&log_group, &plan.window, &plan.zone, remote)?;
    let stream_count = buckets.len();

    let _ = writeln!(diagnostics, "resolved log group: {}", log_group);
    let _ = writeln!(diagnostics, "time window: {}", plan.window.display());
    let _ = writeln!(diagnostics, "number of streams: {}", stream_count);
    let _ = writeln!(diagnostics, "output directory: {}", plan.out_dir.display());

    let writer = StreamFileWriter::new(&plan.out_dir, plan.zone);
    let files = writer.write(log_group.name(), &plan.window, buckets)?;

    Ok(ExportReport {
        log_group: log_group.into_name(),
        window: plan.window,
        stream_count,
        out_dir: plan.out_dir.clone(),
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(base_name: &str, env: &str) -> ExportRequest {
        ExportRequest {
            base_name: base_name.to_string(),
            env: env.to_string(),
            from: Some("2024-01-01".to_string()),
            to: Some("2024-01-02".to_string()),
            out_dir: PathBuf::from("out"),
        }
    }

    #[test]
    fn test_prepare_trims_and_anchors() {
        let plan = prepare_export(&request("  orders-api ", " sit "), LocalZone::utc()).unwrap();
        assert_eq!(plan.base_name, "orders-api");
        assert_eq!(plan.env, "sit");
        assert!(plan.out_dir.is_absolute());
        assert!(plan.out_dir.ends_with("out"));
    }

    #[test]
    fn test_prepare_rejects_blank_identifiers() {
        assert!(matches!(
            prepare_export(&request("  ", "sit"), LocalZone::utc()),
            Err(ExportError::Validation(_))
        ));
        let err = prepare_export(&request("orders-api", ""), LocalZone::utc()).unwrap_err();
        assert_eq!(err.to_string(), "--env is required and cannot be empty");
    }

    #[test]
    fn test_prepare_rejects_bad_window() {
        let mut bad = request("orders-api", "sit");
        bad.from = Some("2024-02-01".to_string());
        assert!(matches!(
            prepare_export(&bad, LocalZone::utc()),
            Err(ExportError::Validation(_))
        ));
    }

    #[test]
    fn test_absolute_out_dir_expands_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(absolute_out_dir(Path::new("~/logs")).unwrap(), home.join("logs"));
        }
        assert_eq!(
            absolute_out_dir(Path::new("/var/tmp")).unwrap(),
            PathBuf::from("/var/tmp")
        );
    }
}
