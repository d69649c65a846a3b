//! Error taxonomy for a single export run.
//!
//! Every stage returns `Result<_, ExportError>`; nothing is retried, so any
//! error ends the run at the stage that produced it.

#![warn(clippy::all, rust_2018_idioms)]

use std::path::PathBuf;

use crate::app::data_plane::cloudwatch_logs::sdk_errors::FailureCategory;

/// Process exit code for a successful run.
pub const EXIT_OK: u8 = 0;
/// Process exit code for usage, configuration, validation and local I/O failures.
pub const EXIT_USAGE: u8 = 2;
/// Process exit code for authentication and transport failures.
pub const EXIT_AUTH: u8 = 3;

/// Why a log group could not be resolved to exactly one name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("No log groups found ending with '{suffix}'. Hint: check the base name and --env.")]
    NotFound { suffix: String },

    #[error(
        "Multiple log groups match suffix '{suffix}'. Please narrow the base name.\n{}",
        format_candidates(.candidates)
    )]
    Ambiguous {
        suffix: String,
        /// Matching names, sorted ascending.
        candidates: Vec<String>,
    },
}

fn format_candidates(candidates: &[String]) -> String {
    candidates
        .iter()
        .map(|name| format!("- {}", name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors that can end an export run
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Malformed or contradictory input: time bounds, empty identifiers, config.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Credential, profile or transport failure while talking to AWS.
    #[error(
        "AWS authentication failed for profile '{profile}'. Run: aws sso login --profile {profile}\n({category}) {message}"
    )]
    Auth {
        profile: String,
        category: FailureCategory,
        message: String,
    },

    #[error("Failed writing output files: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub fn validation(message: impl Into<String>) -> Self {
        ExportError::Validation(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }

    /// Exit code the CLI reports for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            ExportError::Auth { .. } => EXIT_AUTH,
            ExportError::Validation(_) | ExportError::Resolution(_) | ExportError::Io { .. } => {
                EXIT_USAGE
            }
        }
    }
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;
