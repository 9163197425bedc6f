use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Coarse failure class of a Terraform run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The `terraform` binary is missing or could not be started.
    Environment,
    /// The environment directory is missing or holds invalid configuration.
    Configuration,
    /// Terraform ran but failed, timed out, or produced no usable plan.
    Execution,
}

/// Errors raised while driving the `terraform` CLI.
///
/// Stderr from the child is carried verbatim so the caller sees the exact
/// diagnostic Terraform printed.
#[derive(Debug, Error)]
pub enum TerraformError {
    #[error("terraform binary '{binary}' could not be started: {source}")]
    Environment {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid terraform configuration in '{}': {message}", .dir.display())]
    Configuration { dir: PathBuf, message: String },

    #[error("terraform {step} failed ({}): {stderr}", .exit_code.map_or_else(|| "killed by signal".to_string(), |c| format!("exit code {c}")))]
    Execution {
        step: &'static str,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("terraform {step} timed out after {}s", .timeout.as_secs())]
    Timeout { step: &'static str, timeout: Duration },

    #[error("terraform produced an unusable plan: {message}")]
    InvalidPlan { message: String },

    #[error("terraform version output unreadable: {message}")]
    Version { message: String },

    #[error("resource '{address}' not found in {section}")]
    MissingResource {
        address: String,
        section: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TerraformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Environment { .. } => ErrorKind::Environment,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Execution { .. }
            | Self::Timeout { .. }
            | Self::InvalidPlan { .. }
            | Self::Version { .. }
            | Self::MissingResource { .. }
            | Self::Io(_) => ErrorKind::Execution,
        }
    }
}
