//! CloudWatch Logs Client Wrapper
//!
//! Implements the page-source traits on top of `aws-sdk-cloudwatchlogs`. The
//! SDK is async; every call blocks on a private current-thread runtime so the
//! export pipeline stays synchronous.

#![warn(clippy::all, rust_2018_idioms)]

use aws_config::BehaviorVersion;
use aws_sdk_cloudwatchlogs as cloudwatchlogs;
use aws_types::region::Region;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::app::config::AwsTarget;
use crate::app::error::{ExportError, ExportResult};

use super::sdk_errors::{auth_error, FailureCategory};
use super::source::{EventPageSource, LogGroupLister};
use super::types::{EventPage, EventQuery, LogGroupDescriptor, LogGroupPage, RawLogEvent};

/// Create AWS SDK config for a named profile and region
async fn load_sdk_config(target: &AwsTarget) -> aws_config::SdkConfig {
    debug!(
        "Loading AWS config for profile {} in region {}",
        target.profile, target.region
    );
    aws_config::defaults(BehaviorVersion::latest())
        .profile_name(&target.profile)
        .region(Region::new(target.region.clone()))
        .load()
        .await
}

/// Blocking CloudWatch Logs client bound to one profile and region
pub struct CloudWatchLogsClient {
    runtime: Runtime,
    client: cloudwatchlogs::Client,
    profile: String,
}

impl CloudWatchLogsClient {
    /// Build a client for `target`.
    ///
    /// Credentials are only resolved on the first request, so a bad profile
    /// surfaces as an `Auth` error from the first page fetch.
    pub fn connect(target: &AwsTarget) -> ExportResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ExportError::Auth {
                profile: target.profile.clone(),
                category: FailureCategory::Other,
                message: format!("Failed to start async runtime: {}", e),
            })?;
        let sdk_config = runtime.block_on(load_sdk_config(target));
        let client = cloudwatchlogs::Client::new(&sdk_config);

        Ok(Self {
            runtime,
            client,
            profile: target.profile.clone(),
        })
    }

    /// A page that hands back the token it was asked for would loop forever.
    fn check_progress(
        &self,
        operation: &str,
        requested: Option<&str>,
        next_token: &Option<String>,
    ) -> ExportResult<()> {
        match (requested, next_token.as_deref()) {
            (Some(requested), Some(next)) if requested == next => Err(ExportError::Auth {
                profile: self.profile.clone(),
                category: FailureCategory::Other,
                message: format!("{}: the same next token was received twice", operation),
            }),
            _ => Ok(()),
        }
    }
}

impl LogGroupLister for CloudWatchLogsClient {
    fn list_page(&mut self, next_token: Option<&str>) -> ExportResult<LogGroupPage> {
        let request = self
            .client
            .describe_log_groups()
            .set_next_token(next_token.map(str::to_string));

        let response = self
            .runtime
            .block_on(request.send())
            .map_err(|e| auth_error(&self.profile, "DescribeLogGroups", e))?;

        let mut log_groups = Vec::new();
        if let Some(groups) = response.log_groups {
            for group in groups {
                if let Some(name) = group.log_group_name {
                    log_groups.push(LogGroupDescriptor { name });
                }
            }
        }

        self.check_progress("DescribeLogGroups", next_token, &response.next_token)?;
        Ok(LogGroupPage {
            log_groups,
            next_token: response.next_token,
        })
    }
}

impl EventPageSource for CloudWatchLogsClient {
    fn fetch_page(
        &mut self,
        query: &EventQuery,
        next_token: Option<&str>,
    ) -> ExportResult<EventPage> {
        #[allow(deprecated)]
        let request = self
            .client
            .filter_log_events()
            .log_group_name(&query.log_group_name)
            .start_time(query.start_ms)
            .end_time(query.end_ms)
            .interleaved(query.interleaved)
            .set_next_token(next_token.map(str::to_string));

        let response = self
            .runtime
            .block_on(request.send())
            .map_err(|e| auth_error(&self.profile, "FilterLogEvents", e))?;

        let events: Vec<RawLogEvent> = response
            .events
            .unwrap_or_default()
            .into_iter()
            .map(|event| RawLogEvent {
                timestamp: event.timestamp,
                ingestion_time: event.ingestion_time,
                event_id: event.event_id,
                log_stream_name: event.log_stream_name,
                message: event.message.map(Into::into),
            })
            .collect();

        self.check_progress("FilterLogEvents", next_token, &response.next_token)?;
        Ok(EventPage {
            events,
            next_token: response.next_token,
        })
    }
}
