//! Fastly API boundary
//!
//! `FastlyApi` is the only way commands talk to the platform. The HTTP
//! implementation lives in `client`; tests use `util::testing::FakeApi`.

mod client;
mod error;
mod inputs;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use client::{HttpFastlyClient, DEFAULT_ENDPOINT};
pub use error::{ApiError, ApiResult};
pub use inputs::{
    BackendFields, DictionaryFields, DomainFields, DomainV1Fields, DomainV1Query, Form,
    HealthCheckFields, ListFields, LoggingFields, ServiceFields, ToForm, WorkspaceFields,
};

use crate::domain::{
    Backend, Dictionary, DictionaryItem, DictionaryItemBatch, Domain, DomainV1, DomainValidation,
    HealthCheck, LoggingEndpoint, LoggingKind, NgwafList, Page, PurgeResult, Service, TokenInfo,
    User, Verify, Version, Workspace,
};

/// Builds an API client for a token and endpoint.
pub type ApiFactory = Arc<dyn Fn(&str, &str) -> ApiResult<Arc<dyn FastlyApi>> + Send + Sync>;

/// Typed access to the Fastly platform API.
pub trait FastlyApi: Send + Sync {
    // Services
    fn list_services(&self) -> ApiResult<Vec<Service>>;
    fn get_service(&self, service_id: &str) -> ApiResult<Service>;
    fn search_service(&self, name: &str) -> ApiResult<Service>;
    fn create_service(&self, fields: &ServiceFields) -> ApiResult<Service>;
    fn update_service(&self, service_id: &str, fields: &ServiceFields) -> ApiResult<Service>;
    fn delete_service(&self, service_id: &str) -> ApiResult<()>;

    // Versions
    fn list_versions(&self, service_id: &str) -> ApiResult<Vec<Version>>;
    fn clone_version(&self, service_id: &str, version: i64) -> ApiResult<Version>;
    fn update_version(
        &self,
        service_id: &str,
        version: i64,
        comment: Option<&str>,
    ) -> ApiResult<Version>;
    fn activate_version(&self, service_id: &str, version: i64) -> ApiResult<Version>;
    fn deactivate_version(&self, service_id: &str, version: i64) -> ApiResult<Version>;
    fn lock_version(&self, service_id: &str, version: i64) -> ApiResult<Version>;

    // Domains
    fn list_domains(&self, service_id: &str, version: i64) -> ApiResult<Vec<Domain>>;
    fn get_domain(&self, service_id: &str, version: i64, name: &str) -> ApiResult<Domain>;
    fn create_domain(
        &self,
        service_id: &str,
        version: i64,
        fields: &DomainFields,
    ) -> ApiResult<Domain>;
    fn update_domain(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
        fields: &DomainFields,
    ) -> ApiResult<Domain>;
    fn delete_domain(&self, service_id: &str, version: i64, name: &str) -> ApiResult<()>;
    fn validate_domain(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
    ) -> ApiResult<DomainValidation>;
    fn validate_all_domains(
        &self,
        service_id: &str,
        version: i64,
    ) -> ApiResult<Vec<DomainValidation>>;

    // Versionless domains
    fn list_domains_v1(&self, query: &DomainV1Query) -> ApiResult<Page<DomainV1>>;
    fn get_domain_v1(&self, domain_id: &str) -> ApiResult<DomainV1>;
    fn create_domain_v1(&self, fields: &DomainV1Fields) -> ApiResult<DomainV1>;
    fn update_domain_v1(&self, domain_id: &str, fields: &DomainV1Fields) -> ApiResult<DomainV1>;
    fn delete_domain_v1(&self, domain_id: &str) -> ApiResult<()>;

    // Backends
    fn list_backends(&self, service_id: &str, version: i64) -> ApiResult<Vec<Backend>>;
    fn get_backend(&self, service_id: &str, version: i64, name: &str) -> ApiResult<Backend>;
    fn create_backend(
        &self,
        service_id: &str,
        version: i64,
        fields: &BackendFields,
    ) -> ApiResult<Backend>;
    fn update_backend(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
        fields: &BackendFields,
    ) -> ApiResult<Backend>;
    fn delete_backend(&self, service_id: &str, version: i64, name: &str) -> ApiResult<()>;

    // Health checks
    fn list_healthchecks(&self, service_id: &str, version: i64) -> ApiResult<Vec<HealthCheck>>;
    fn get_healthcheck(&self, service_id: &str, version: i64, name: &str)
        -> ApiResult<HealthCheck>;
    fn create_healthcheck(
        &self,
        service_id: &str,
        version: i64,
        fields: &HealthCheckFields,
    ) -> ApiResult<HealthCheck>;
    fn update_healthcheck(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
        fields: &HealthCheckFields,
    ) -> ApiResult<HealthCheck>;
    fn delete_healthcheck(&self, service_id: &str, version: i64, name: &str) -> ApiResult<()>;

    // Dictionaries
    fn list_dictionaries(&self, service_id: &str, version: i64) -> ApiResult<Vec<Dictionary>>;
    fn get_dictionary(&self, service_id: &str, version: i64, name: &str) -> ApiResult<Dictionary>;
    fn create_dictionary(
        &self,
        service_id: &str,
        version: i64,
        fields: &DictionaryFields,
    ) -> ApiResult<Dictionary>;
    fn update_dictionary(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
        fields: &DictionaryFields,
    ) -> ApiResult<Dictionary>;
    fn delete_dictionary(&self, service_id: &str, version: i64, name: &str) -> ApiResult<()>;

    // Dictionary items
    fn list_dictionary_items(
        &self,
        service_id: &str,
        dictionary_id: &str,
    ) -> ApiResult<Vec<DictionaryItem>>;
    fn get_dictionary_item(
        &self,
        service_id: &str,
        dictionary_id: &str,
        key: &str,
    ) -> ApiResult<DictionaryItem>;
    fn create_dictionary_item(
        &self,
        service_id: &str,
        dictionary_id: &str,
        key: &str,
        value: &str,
    ) -> ApiResult<DictionaryItem>;
    fn update_dictionary_item(
        &self,
        service_id: &str,
        dictionary_id: &str,
        key: &str,
        value: &str,
    ) -> ApiResult<DictionaryItem>;
    fn delete_dictionary_item(
        &self,
        service_id: &str,
        dictionary_id: &str,
        key: &str,
    ) -> ApiResult<()>;
    fn batch_dictionary_items(
        &self,
        service_id: &str,
        dictionary_id: &str,
        items: &[DictionaryItemBatch],
    ) -> ApiResult<()>;

    // Logging
    fn list_logging(
        &self,
        kind: LoggingKind,
        service_id: &str,
        version: i64,
    ) -> ApiResult<Vec<LoggingEndpoint>>;
    fn get_logging(
        &self,
        kind: LoggingKind,
        service_id: &str,
        version: i64,
        name: &str,
    ) -> ApiResult<LoggingEndpoint>;
    fn create_logging(
        &self,
        kind: LoggingKind,
        service_id: &str,
        version: i64,
        fields: &LoggingFields,
    ) -> ApiResult<LoggingEndpoint>;
    fn update_logging(
        &self,
        kind: LoggingKind,
        service_id: &str,
        version: i64,
        name: &str,
        fields: &LoggingFields,
    ) -> ApiResult<LoggingEndpoint>;
    fn delete_logging(
        &self,
        kind: LoggingKind,
        service_id: &str,
        version: i64,
        name: &str,
    ) -> ApiResult<()>;

    // Purging
    fn purge_all(&self, service_id: &str) -> ApiResult<PurgeResult>;
    fn purge_key(&self, service_id: &str, key: &str, soft: bool) -> ApiResult<PurgeResult>;
    /// Returns a map of surrogate key to purge id.
    fn purge_keys(
        &self,
        service_id: &str,
        keys: &[String],
        soft: bool,
    ) -> ApiResult<BTreeMap<String, String>>;
    fn purge_url(&self, url: &str, soft: bool) -> ApiResult<PurgeResult>;

    // Identity
    fn verify(&self) -> ApiResult<Verify>;
    fn token_self(&self) -> ApiResult<TokenInfo>;
    fn current_user(&self) -> ApiResult<User>;

    // Next-Gen WAF
    fn list_workspaces(&self, limit: Option<i64>) -> ApiResult<Page<Workspace>>;
    fn get_workspace(&self, workspace_id: &str) -> ApiResult<Workspace>;
    fn create_workspace(&self, fields: &WorkspaceFields) -> ApiResult<Workspace>;
    fn update_workspace(&self, workspace_id: &str, fields: &WorkspaceFields)
        -> ApiResult<Workspace>;
    fn delete_workspace(&self, workspace_id: &str) -> ApiResult<()>;
    fn list_workspace_lists(&self, workspace_id: &str) -> ApiResult<Page<NgwafList>>;
    fn get_workspace_list(&self, workspace_id: &str, list_id: &str) -> ApiResult<NgwafList>;
    fn create_workspace_list(
        &self,
        workspace_id: &str,
        fields: &ListFields,
    ) -> ApiResult<NgwafList>;
    fn update_workspace_list(
        &self,
        workspace_id: &str,
        list_id: &str,
        fields: &ListFields,
    ) -> ApiResult<NgwafList>;
    fn delete_workspace_list(&self, workspace_id: &str, list_id: &str) -> ApiResult<()>;
}
