//! cloudwatch-get - export CloudWatch Logs events to per-stream text files
//!
//! Given a base log group name and an environment tag, the tool finds the one
//! log group whose name ends with `{base}-{env}`, pulls every event in a time
//! window and writes them as sorted, deduplicated text files, one per log
//! stream.
//!
//! # Architecture Overview
//!
//! The run is a straight synchronous pipeline:
//!
//! - **Time window** ([`app::time_window`]): default and validate the bounds
//! - **Log group resolution** ([`app::log_group_resolver`]): exactly one match or an error
//! - **Event collection** ([`app::event_collector`]): a fold over result pages
//! - **Stream files** ([`app::stream_writer`]): collision-free names, stable line order
//!
//! AWS access sits behind the page-source traits in
//! [`app::data_plane::cloudwatch_logs`], so the whole pipeline runs against
//! in-memory pages in tests.

#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
