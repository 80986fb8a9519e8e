//! CLI error types with exit code handling

use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that maps errors to exit codes
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Bad arguments, filters, or context names
    #[error("{message}")]
    #[diagnostic(code(hcom::cli::invocation))]
    Invocation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The cluster rejected us or could not be reached
    #[error("{message}")]
    #[diagnostic(code(hcom::cli::cluster))]
    Cluster { message: String },

    /// Anything else that stops the command
    #[error("{message}")]
    #[diagnostic(code(hcom::cli::error))]
    Failure { message: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Invocation { .. } => exit_codes::INVOCATION_ERROR,
            CliError::Cluster { .. } => exit_codes::ACCESS_DENIED,
            CliError::Failure { .. } => exit_codes::PARTIAL,
        }
    }

    pub fn invocation(message: impl Into<String>) -> Self {
        Self::Invocation {
            message: message.into(),
            help: None,
        }
    }

    pub fn invocation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Invocation {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }
}

impl From<hcom_kube::KubeError> for CliError {
    fn from(e: hcom_kube::KubeError) -> Self {
        if e.is_fatal() {
            CliError::Cluster {
                message: e.to_string(),
            }
        } else {
            CliError::Failure {
                message: e.to_string(),
            }
        }
    }
}

impl From<hcom_repo::RepoError> for CliError {
    fn from(e: hcom_repo::RepoError) -> Self {
        CliError::Failure {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Failure {
            message: e.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(e: serde_yaml::Error) -> Self {
        CliError::Failure {
            message: e.to_string(),
        }
    }
}

/// Result type for CLI operations; Ok carries the exit code
pub type Result<T> = std::result::Result<T, CliError>;
