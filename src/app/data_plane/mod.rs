//! Data Plane Services Module
//!
//! AWS data plane integrations: services that read data held inside AWS
//! resources, as opposed to discovering or managing the resources.
//!
//! ## Available Services
//!
//! - **CloudWatch Logs**: list log groups and page through filtered log events

pub mod cloudwatch_logs;

pub use cloudwatch_logs::{CloudWatchLogsClient, EventPageSource, LogGroupLister};
