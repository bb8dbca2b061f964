//! CLI-level errors (wraps infrastructure errors)

use std::io;

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::api::ApiError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    /// Flags that cannot be used together or are missing.
    #[error("{message}")]
    Usage {
        message: String,
        remediation: Option<String>,
    },
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        CliError::Usage {
            message: message.into(),
            remediation: None,
        }
    }

    pub fn usage_with(message: impl Into<String>, remediation: impl Into<String>) -> Self {
        CliError::Usage {
            message: message.into(),
            remediation: Some(remediation.into()),
        }
    }

    /// Help text shown below the error message.
    pub fn remediation(&self) -> Option<String> {
        match self {
            CliError::Usage { remediation, .. } => remediation.clone(),
            CliError::Infra(e) => e.remediation(),
        }
    }

    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage { .. } => exitcode::USAGE,
            CliError::Infra(InfraError::Io { .. }) => exitcode::IOERR,
            CliError::Infra(InfraError::Application(e)) => match e {
                ApplicationError::NoServiceId
                | ApplicationError::ConflictingServiceFlags
                | ApplicationError::Domain(DomainError::InvalidVersionSelector(_))
                | ApplicationError::Domain(DomainError::InvalidThresholds(_)) => exitcode::USAGE,
                ApplicationError::NoToken | ApplicationError::EmptyToken => exitcode::NOPERM,
                ApplicationError::Api(api) => match api.status_code() {
                    Some(401) | Some(403) => exitcode::NOPERM,
                    Some(_) => exitcode::FAILURE,
                    None => exitcode::UNAVAILABLE,
                },
                ApplicationError::Release(_) => exitcode::UNAVAILABLE,
                ApplicationError::Config { .. } => exitcode::CONFIG,
                ApplicationError::ProfileNotFound(_) | ApplicationError::ProfileExists(_) => {
                    exitcode::DATAERR
                }
                ApplicationError::Domain(_) => exitcode::DATAERR,
                ApplicationError::OperationFailed { .. } => exitcode::SOFTWARE,
            },
        }
    }
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<ApiError> for CliError {
    fn from(e: ApiError) -> Self {
        ApplicationError::from(e).into()
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        ApplicationError::from(e).into()
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Infra(InfraError::io("write output", e))
    }
}
