//! Core application modules for cloudwatch-get.
//!
//! # Module Organization
//!
//! ## Export pipeline
//! - [`time_window`] - turns `--from` / `--to` into a validated window
//! - [`log_group_resolver`] - suffix-matches the base name to one log group
//! - [`event_collector`] - paginates, deduplicates and groups events by stream
//! - [`stream_writer`] - writes one deterministic text file per stream
//! - [`export`] - runs the stages above in order
//!
//! ## AWS Integration
//! - [`data_plane`] - CloudWatch Logs page sources and SDK error handling
//! - [`config`] - YAML config, profile and region selection
//!
//! ## Shared
//! - [`error`] - error taxonomy and exit codes
//! - [`local_zone`] - wall-clock time zone used for every conversion

pub mod config;
pub mod data_plane;
pub mod error;
pub mod event_collector;
pub mod export;
pub mod local_zone;
pub mod log_group_resolver;
pub mod stream_writer;
pub mod time_window;

pub use error::{ExportError, ExportResult};
pub use export::{prepare_export, run_export, ExportPlan, ExportReport, ExportRequest};
