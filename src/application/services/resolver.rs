//! Service and version resolution
//!
//! Turns `--service-id`/`--service-name`/`--version`/`--autoclone` into the
//! concrete service id and version number a command operates on.

use std::sync::Arc;

use tracing::{debug, info};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::{Settings, Source};
use crate::domain::{plan_edit, select_version, DomainError, EditPlan, Version, VersionSelector};
use crate::infrastructure::api::FastlyApi;

/// A service id plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedService {
    pub id: String,
    pub source: Source,
}

/// Version a mutating command may modify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableVersion {
    pub version: Version,
    /// Number of the locked/active version that was cloned, if any.
    pub cloned_from: Option<i64>,
}

impl EditableVersion {
    pub fn number(&self) -> i64 {
        self.version.number
    }
}

/// Resolves services and versions against the API.
pub struct ServiceResolver {
    api: Arc<dyn FastlyApi>,
}

impl ServiceResolver {
    pub fn new(api: Arc<dyn FastlyApi>) -> Self {
        Self { api }
    }

    /// Resolve the target service from flags, environment or manifest.
    pub fn service(
        &self,
        settings: &Settings,
        service_id: Option<&str>,
        service_name: Option<&str>,
    ) -> ApplicationResult<ResolvedService> {
        if let Some(name) = service_name {
            if service_id.is_some() {
                return Err(ApplicationError::ConflictingServiceFlags);
            }
            let id = self.service_id_by_name(name)?;
            return Ok(ResolvedService {
                id,
                source: Source::Flag("--service-name"),
            });
        }
        match settings.resolve_service_id(service_id) {
            (Some(id), source) => {
                debug!("service: id={} source={}", id, source);
                Ok(ResolvedService { id, source })
            }
            (None, _) => Err(ApplicationError::NoServiceId),
        }
    }

    fn service_id_by_name(&self, name: &str) -> ApplicationResult<String> {
        let services = self.api.list_services()?;
        services
            .into_iter()
            .find(|s| s.name == name)
            .map(|s| s.id)
            .ok_or_else(|| DomainError::ServiceNameNotFound(name.to_string()).into())
    }

    /// Look up the version matching `selector`.
    pub fn version(
        &self,
        service_id: &str,
        selector: VersionSelector,
    ) -> ApplicationResult<Version> {
        let versions = self.api.list_versions(service_id)?;
        Ok(select_version(&versions, selector)?)
    }

    /// Look up a version a command may mutate, cloning it if permitted.
    pub fn editable_version(
        &self,
        service_id: &str,
        selector: VersionSelector,
        autoclone: bool,
    ) -> ApplicationResult<EditableVersion> {
        let version = self.version(service_id, selector)?;
        match plan_edit(&version, autoclone)? {
            EditPlan::InPlace => Ok(EditableVersion {
                version,
                cloned_from: None,
            }),
            EditPlan::Clone => {
                let cloned = self.api.clone_version(service_id, version.number)?;
                info!(
                    service_id,
                    from = version.number,
                    to = cloned.number,
                    "autocloned service version"
                );
                Ok(EditableVersion {
                    version: cloned,
                    cloned_from: Some(version.number),
                })
            }
        }
    }
}
