//! AWS SDK error categorization for user-facing diagnostics.
//!
//! The SDK already retries transient failures internally. Whatever reaches
//! this module is terminal for the run; the category only decides how the
//! failure is described to the user.

#![warn(clippy::all, rust_2018_idioms)]

use std::fmt;

use aws_smithy_types::error::display::DisplayErrorContext;

use crate::app::error::ExportError;

/// Coarse classification of a failed AWS call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// Missing, expired or unloadable credentials / profile
    Credentials,
    /// Credentials were accepted but lack permission
    AccessDenied,
    /// Request was throttled after the SDK's own retries
    Throttled,
    Timeout,
    /// DNS, connection or dispatch failures
    Network,
    /// AWS-side 5xx
    ServiceUnavailable,
    Other,
}

impl FailureCategory {
    pub fn label(&self) -> &'static str {
        match self {
            FailureCategory::Credentials => "credentials",
            FailureCategory::AccessDenied => "access denied",
            FailureCategory::Throttled => "throttled",
            FailureCategory::Timeout => "timeout",
            FailureCategory::Network => "network",
            FailureCategory::ServiceUnavailable => "service unavailable",
            FailureCategory::Other => "error",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Categorize an error based on its rendered text.
///
/// Credential problems are checked first: an expired SSO token also tends to
/// mention "connection" or "dispatch" further down the error chain.
pub fn categorize_error_string(error_str: &str) -> FailureCategory {
    if error_str.contains("NoCredentialsError")
        || error_str.contains("no credentials")
        || error_str.contains("failed to load credentials")
        || error_str.contains("CredentialsNotLoaded")
        || error_str.contains("ExpiredToken")
        || error_str.contains("the SSO session")
        || error_str.contains("ProfileFile")
        || (error_str.contains("profile")
            && (error_str.contains("not found") || error_str.contains("could not")))
    {
        return FailureCategory::Credentials;
    }

    if error_str.contains("AccessDenied")
        || error_str.contains("UnauthorizedOperation")
        || error_str.contains("UnrecognizedClientException")
        || error_str.contains("InvalidClientTokenId")
        || error_str.contains("SignatureDoesNotMatch")
    {
        return FailureCategory::AccessDenied;
    }

    if error_str.contains("ThrottlingException")
        || error_str.contains("TooManyRequestsException")
        || error_str.contains("RequestLimitExceeded")
        || error_str.contains("LimitExceededException")
        || error_str.contains("Rate exceeded")
    {
        return FailureCategory::Throttled;
    }

    if error_str.contains("TimeoutError")
        || error_str.contains("timed out")
        || error_str.contains("deadline exceeded")
    {
        return FailureCategory::Timeout;
    }

    if error_str.contains("DispatchFailure")
        || error_str.contains("dispatch failure")
        || error_str.contains("connection")
        || error_str.contains("dns error")
        || error_str.contains("DNS")
    {
        return FailureCategory::Network;
    }

    if error_str.contains("ServiceUnavailable")
        || error_str.contains("ServiceUnavailableException")
        || error_str.contains("InternalServerError")
        || error_str.contains("InternalError")
    {
        return FailureCategory::ServiceUnavailable;
    }

    FailureCategory::Other
}

/// Turn a failed SDK call into the terminal `Auth` error for `profile`.
pub fn auth_error<E>(profile: &str, operation: &str, error: E) -> ExportError
where
    E: std::error::Error,
{
    let detail = format!("{}", DisplayErrorContext(&error));
    let category = categorize_error_string(&detail);
    tracing::debug!("{} failed ({}): {}", operation, category, detail);
    ExportError::Auth {
        profile: profile.to_string(),
        category,
        message: format!("{}: {}", operation, truncate_message(&detail, 300)),
    }
}

fn truncate_message(msg: &str, max_len: usize) -> String {
    if msg.chars().count() <= max_len {
        msg.to_string()
    } else {
        let truncated: String = msg.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
