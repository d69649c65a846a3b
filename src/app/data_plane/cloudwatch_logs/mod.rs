//! CloudWatch Logs Integration Module
//!
//! Everything the exporter needs from AWS CloudWatch Logs, behind two
//! page-source traits so the pipeline can run against in-memory pages.
//!
//! ## Features
//!
//! - Paginated log group listing (`DescribeLogGroups`)
//! - Paginated, interleaved event query over a time window (`FilterLogEvents`)
//! - Categorized SDK failures for user-facing diagnostics
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cloudwatch_get::app::config::AwsTarget;
//! use cloudwatch_get::app::data_plane::cloudwatch_logs::{
//!     CloudWatchLogsClient, EventPageSource, EventQuery,
//! };
//!
//! # fn example() -> cloudwatch_get::app::error::ExportResult<()> {
//! let target = AwsTarget {
//!     profile: "apis-nonprod".to_string(),
//!     region: "eu-west-1".to_string(),
//! };
//! let mut client = CloudWatchLogsClient::connect(&target)?;
//!
//! let query = EventQuery::new("/aws/lambda/orders-api-sit", 1_704_067_200_000, 1_704_110_399_999);
//! let page = client.fetch_page(&query, None)?;
//! for event in page.events {
//!     println!("{:?}: {:?}", event.timestamp, event.message);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, rust_2018_idioms)]

pub mod client;
pub mod sdk_errors;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use client::CloudWatchLogsClient;
pub use sdk_errors::FailureCategory;
pub use source::{EventPageSource, InMemoryLogs, InMemoryPages, LogGroupLister};
pub use types::{
    EventPage, EventQuery, LogEvent, LogGroupDescriptor, LogGroupPage, MessageBody, RawLogEvent,
};
