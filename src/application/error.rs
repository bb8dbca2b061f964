//! Application-level errors (wraps domain and boundary errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::api::ApiError;
use crate::infrastructure::github::ReleaseError;

/// Remediation for commands that need a service but none was given.
pub const SERVICE_ID_REMEDIATION: &str = "Please provide one via the --service-id or --service-name flag, the FASTLY_SERVICE_ID environment variable, or a fastly.toml manifest";

/// Remediation for commands run without credentials.
pub const TOKEN_REMEDIATION: &str =
    "Run `fastly profile create`, or pass a token via --token or FASTLY_API_TOKEN";

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Release(#[from] ReleaseError),

    #[error("error reading service: no service ID found")]
    NoServiceId,

    #[error("cannot specify both service-id and service-name")]
    ConflictingServiceFlags,

    #[error("no token provided")]
    NoToken,

    #[error("profile '{0}' already exists")]
    ProfileExists(String),

    #[error("profile '{0}' does not exist")]
    ProfileNotFound(String),

    #[error("token cannot be empty")]
    EmptyToken,

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// Help text shown below the error message.
    pub fn remediation(&self) -> Option<String> {
        match self {
            ApplicationError::Domain(e) => e.remediation(),
            ApplicationError::Api(e) => e.remediation(),
            ApplicationError::NoServiceId => Some(SERVICE_ID_REMEDIATION.to_string()),
            ApplicationError::ConflictingServiceFlags => {
                Some("Provide only one of --service-id or --service-name".to_string())
            }
            ApplicationError::NoToken | ApplicationError::EmptyToken => {
                Some(TOKEN_REMEDIATION.to_string())
            }
            ApplicationError::ProfileNotFound(_) => {
                Some("Run `fastly profile list` to see the available profiles".to_string())
            }
            ApplicationError::ProfileExists(_) => Some(
                "Use `fastly profile update` to modify it, or choose a different name".to_string(),
            ),
            ApplicationError::Release(_) => Some(
                "Download the latest release manually from https://github.com/fastly/cli/releases"
                    .to_string(),
            ),
            _ => None,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
