//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Remediation shown when a command would mutate a version that cannot be edited.
pub const AUTO_CLONE_REMEDIATION: &str = "Repeat the command with the --autoclone flag to allow the version to be cloned";

/// Domain errors represent business rule violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("no service versions found")]
    NoVersions,

    #[error("no active service version found")]
    NoActiveVersion,

    #[error("specified service version not found: {0}")]
    VersionNotFound(i64),

    #[error("invalid service version '{0}': expected a number, 'latest' or 'active'")]
    InvalidVersionSelector(String),

    #[error("service version {0} is not editable")]
    VersionNotEditable(i64),

    #[error("error matching service name with available services")]
    ServiceNameNotFound(String),

    #[error("wrong number of inputs for Attack Signal Thresholds")]
    InvalidThresholds(String),

    #[error("invalid semantic version '{0}'")]
    InvalidSemver(String),
}

impl DomainError {
    /// Help text shown below the error message.
    pub fn remediation(&self) -> Option<String> {
        match self {
            DomainError::VersionNotEditable(_) => Some(AUTO_CLONE_REMEDIATION.to_string()),
            DomainError::ServiceNameNotFound(name) => Some(format!(
                "Check the service name '{name}' with `fastly service list`"
            )),
            DomainError::VersionNotFound(_) | DomainError::NoActiveVersion => Some(
                "Check the available versions with `fastly service-version list`".to_string(),
            ),
            DomainError::InvalidThresholds(_) => Some(
                "Provide thresholds as a colon separated string: Immediate:OneMinute:TenMinutes:OneHour"
                    .to_string(),
            ),
            _ => None,
        }
    }
}
