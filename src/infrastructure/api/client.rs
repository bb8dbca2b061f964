//! Blocking HTTP implementation of `FastlyApi`

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::ACCEPT;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::{
    ApiError, ApiFactory, ApiResult, BackendFields, DictionaryFields, DomainFields, DomainV1Fields,
    DomainV1Query, FastlyApi, Form, HealthCheckFields, ListFields, LoggingFields, ServiceFields,
    ToForm, WorkspaceFields,
};
use crate::domain::{
    Backend, Dictionary, DictionaryItem, DictionaryItemBatch, Domain, DomainV1, DomainValidation,
    HealthCheck, LoggingEndpoint, LoggingKind, NgwafList, Page, PurgeResult, Service, TokenInfo,
    User, Verify, Version, Workspace,
};

/// Default Fastly API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.fastly.com";

const SERVICES_PER_PAGE: usize = 100;

/// `FastlyApi` over HTTPS, authenticated with the `Fastly-Key` header.
pub struct HttpFastlyClient {
    http: Client,
    endpoint: Url,
    token: String,
}

impl HttpFastlyClient {
    pub fn new(endpoint: &str, token: &str) -> ApiResult<Self> {
        let http = Client::builder()
            .user_agent(format!("FastlyCLI/v{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(ApiError::Client)?;
        let endpoint = Url::parse(endpoint.trim_end_matches('/'))
            .map_err(|_| ApiError::Endpoint(endpoint.to_string()))?;
        if endpoint.cannot_be_a_base() {
            return Err(ApiError::Endpoint(endpoint.to_string()));
        }
        Ok(Self {
            http,
            endpoint,
            token: token.to_string(),
        })
    }

    /// Factory producing HTTP clients, used by the service container.
    pub fn factory() -> ApiFactory {
        Arc::new(|token: &str, endpoint: &str| {
            let client: Arc<dyn FastlyApi> = Arc::new(HttpFastlyClient::new(endpoint, token)?);
            Ok(client)
        })
    }

    /// Endpoint joined with percent-encoded path segments.
    fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Endpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn version_url(
        &self,
        service_id: &str,
        version: i64,
        resource: &[&str],
    ) -> ApiResult<Url> {
        let version = version.to_string();
        let mut segments = vec!["service", service_id, "version", version.as_str()];
        segments.extend_from_slice(resource);
        self.url(&segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("Fastly-Key", &self.token)
            .header(ACCEPT, "application/json")
    }

    fn execute(&self, builder: RequestBuilder, url: &Url) -> ApiResult<String> {
        debug!(url = %url, "api request");
        let response = builder.send().map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        let body = response.text().map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        if !status.is_success() {
            let err = ApiError::from_response(status.as_u16(), status.canonical_reason(), &body);
            warn!(url = %url, status = status.as_u16(), error = %err, "api request failed");
            return Err(err);
        }
        Ok(body)
    }

    fn decode<T: DeserializeOwned>(url: &Url, body: &str) -> ApiResult<T> {
        serde_json::from_str(body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    fn get<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        let body = self.execute(self.request(Method::GET, url.clone()), &url)?;
        Self::decode(&url, &body)
    }

    fn send_form<T: DeserializeOwned>(&self, method: Method, url: Url, form: &Form) -> ApiResult<T> {
        let builder = self.request(method, url.clone()).form(form.pairs());
        let body = self.execute(builder, &url)?;
        Self::decode(&url, &body)
    }

    fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: Url,
        payload: &B,
    ) -> ApiResult<T> {
        let builder = self.request(method, url.clone()).json(payload);
        let body = self.execute(builder, &url)?;
        Self::decode(&url, &body)
    }

    fn delete(&self, url: Url) -> ApiResult<()> {
        self.execute(self.request(Method::DELETE, url.clone()), &url)
            .map(|_| ())
    }

    fn put_empty<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        self.send_form(Method::PUT, url, &Form::new())
    }
}

/// Wire shape of a domain check: `[domain, cname, ok]`.
type DomainCheck = (Domain, String, bool);

fn into_validation((domain, cname, valid): DomainCheck) -> DomainValidation {
    DomainValidation {
        domain,
        cname,
        valid,
    }
}

impl FastlyApi for HttpFastlyClient {
    fn list_services(&self) -> ApiResult<Vec<Service>> {
        let mut services = Vec::new();
        for page in 1.. {
            let mut url = self.url(&["service"])?;
            url.query_pairs_mut()
                .append_pair("page", &page.to_string())
                .append_pair("per_page", &SERVICES_PER_PAGE.to_string());
            let batch: Vec<Service> = self.get(url)?;
            let done = batch.len() < SERVICES_PER_PAGE;
            services.extend(batch);
            if done {
                break;
            }
        }
        Ok(services)
    }

    fn get_service(&self, service_id: &str) -> ApiResult<Service> {
        self.get(self.url(&["service", service_id])?)
    }

    fn search_service(&self, name: &str) -> ApiResult<Service> {
        let mut url = self.url(&["service", "search"])?;
        url.query_pairs_mut().append_pair("name", name);
        self.get(url)
    }

    fn create_service(&self, fields: &ServiceFields) -> ApiResult<Service> {
        self.send_form(Method::POST, self.url(&["service"])?, &fields.to_form())
    }

    fn update_service(&self, service_id: &str, fields: &ServiceFields) -> ApiResult<Service> {
        self.send_form(
            Method::PUT,
            self.url(&["service", service_id])?,
            &fields.to_form(),
        )
    }

    fn delete_service(&self, service_id: &str) -> ApiResult<()> {
        self.delete(self.url(&["service", service_id])?)
    }

    fn list_versions(&self, service_id: &str) -> ApiResult<Vec<Version>> {
        self.get(self.url(&["service", service_id, "version"])?)
    }

    fn clone_version(&self, service_id: &str, version: i64) -> ApiResult<Version> {
        self.put_empty(self.version_url(service_id, version, &["clone"])?)
    }

    fn update_version(
        &self,
        service_id: &str,
        version: i64,
        comment: Option<&str>,
    ) -> ApiResult<Version> {
        let form = Form::new().optional("comment", &comment);
        self.send_form(Method::PUT, self.version_url(service_id, version, &[])?, &form)
    }

    fn activate_version(&self, service_id: &str, version: i64) -> ApiResult<Version> {
        self.put_empty(self.version_url(service_id, version, &["activate"])?)
    }

    fn deactivate_version(&self, service_id: &str, version: i64) -> ApiResult<Version> {
        self.put_empty(self.version_url(service_id, version, &["deactivate"])?)
    }

    fn lock_version(&self, service_id: &str, version: i64) -> ApiResult<Version> {
        self.put_empty(self.version_url(service_id, version, &["lock"])?)
    }

    fn list_domains(&self, service_id: &str, version: i64) -> ApiResult<Vec<Domain>> {
        self.get(self.version_url(service_id, version, &["domain"])?)
    }

    fn get_domain(&self, service_id: &str, version: i64, name: &str) -> ApiResult<Domain> {
        self.get(self.version_url(service_id, version, &["domain", name])?)
    }

    fn create_domain(
        &self,
        service_id: &str,
        version: i64,
        fields: &DomainFields,
    ) -> ApiResult<Domain> {
        let url = self.version_url(service_id, version, &["domain"])?;
        self.send_form(Method::POST, url, &fields.to_form())
    }

    fn update_domain(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
        fields: &DomainFields,
    ) -> ApiResult<Domain> {
        let url = self.version_url(service_id, version, &["domain", name])?;
        self.send_form(Method::PUT, url, &fields.to_form())
    }

    fn delete_domain(&self, service_id: &str, version: i64, name: &str) -> ApiResult<()> {
        self.delete(self.version_url(service_id, version, &["domain", name])?)
    }

    fn validate_domain(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
    ) -> ApiResult<DomainValidation> {
        let check: DomainCheck =
            self.get(self.version_url(service_id, version, &["domain", name, "check"])?)?;
        Ok(into_validation(check))
    }

    fn validate_all_domains(
        &self,
        service_id: &str,
        version: i64,
    ) -> ApiResult<Vec<DomainValidation>> {
        let checks: Vec<DomainCheck> =
            self.get(self.version_url(service_id, version, &["domain", "check_all"])?)?;
        Ok(checks.into_iter().map(into_validation).collect())
    }

    fn list_domains_v1(&self, query: &DomainV1Query) -> ApiResult<Page<DomainV1>> {
        let mut url = self.url(&["domains", "v1"])?;
        for (key, value) in query.query_pairs() {
            url.query_pairs_mut().append_pair(key, &value);
        }
        self.get(url)
    }

    fn get_domain_v1(&self, domain_id: &str) -> ApiResult<DomainV1> {
        self.get(self.url(&["domains", "v1", domain_id])?)
    }

    fn create_domain_v1(&self, fields: &DomainV1Fields) -> ApiResult<DomainV1> {
        self.send_json(Method::POST, self.url(&["domains", "v1"])?, fields)
    }

    fn update_domain_v1(&self, domain_id: &str, fields: &DomainV1Fields) -> ApiResult<DomainV1> {
        self.send_json(
            Method::PATCH,
            self.url(&["domains", "v1", domain_id])?,
            fields,
        )
    }

    fn delete_domain_v1(&self, domain_id: &str) -> ApiResult<()> {
        self.delete(self.url(&["domains", "v1", domain_id])?)
    }

    fn list_backends(&self, service_id: &str, version: i64) -> ApiResult<Vec<Backend>> {
        self.get(self.version_url(service_id, version, &["backend"])?)
    }

    fn get_backend(&self, service_id: &str, version: i64, name: &str) -> ApiResult<Backend> {
        self.get(self.version_url(service_id, version, &["backend", name])?)
    }

    fn create_backend(
        &self,
        service_id: &str,
        version: i64,
        fields: &BackendFields,
    ) -> ApiResult<Backend> {
        let url = self.version_url(service_id, version, &["backend"])?;
        self.send_form(Method::POST, url, &fields.to_form())
    }

    fn update_backend(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
        fields: &BackendFields,
    ) -> ApiResult<Backend> {
        let url = self.version_url(service_id, version, &["backend", name])?;
        self.send_form(Method::PUT, url, &fields.to_form())
    }

    fn delete_backend(&self, service_id: &str, version: i64, name: &str) -> ApiResult<()> {
        self.delete(self.version_url(service_id, version, &["backend", name])?)
    }

    fn list_healthchecks(&self, service_id: &str, version: i64) -> ApiResult<Vec<HealthCheck>> {
        self.get(self.version_url(service_id, version, &["healthcheck"])?)
    }

    fn get_healthcheck(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
    ) -> ApiResult<HealthCheck> {
        self.get(self.version_url(service_id, version, &["healthcheck", name])?)
    }

    fn create_healthcheck(
        &self,
        service_id: &str,
        version: i64,
        fields: &HealthCheckFields,
    ) -> ApiResult<HealthCheck> {
        let url = self.version_url(service_id, version, &["healthcheck"])?;
        self.send_form(Method::POST, url, &fields.to_form())
    }

    fn update_healthcheck(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
        fields: &HealthCheckFields,
    ) -> ApiResult<HealthCheck> {
        let url = self.version_url(service_id, version, &["healthcheck", name])?;
        self.send_form(Method::PUT, url, &fields.to_form())
    }

    fn delete_healthcheck(&self, service_id: &str, version: i64, name: &str) -> ApiResult<()> {
        self.delete(self.version_url(service_id, version, &["healthcheck", name])?)
    }

    fn list_dictionaries(&self, service_id: &str, version: i64) -> ApiResult<Vec<Dictionary>> {
        self.get(self.version_url(service_id, version, &["dictionary"])?)
    }

    fn get_dictionary(&self, service_id: &str, version: i64, name: &str) -> ApiResult<Dictionary> {
        self.get(self.version_url(service_id, version, &["dictionary", name])?)
    }

    fn create_dictionary(
        &self,
        service_id: &str,
        version: i64,
        fields: &DictionaryFields,
    ) -> ApiResult<Dictionary> {
        let url = self.version_url(service_id, version, &["dictionary"])?;
        self.send_form(Method::POST, url, &fields.to_form())
    }

    fn update_dictionary(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
        fields: &DictionaryFields,
    ) -> ApiResult<Dictionary> {
        let url = self.version_url(service_id, version, &["dictionary", name])?;
        self.send_form(Method::PUT, url, &fields.to_form())
    }

    fn delete_dictionary(&self, service_id: &str, version: i64, name: &str) -> ApiResult<()> {
        self.delete(self.version_url(service_id, version, &["dictionary", name])?)
    }

    fn list_dictionary_items(
        &self,
        service_id: &str,
        dictionary_id: &str,
    ) -> ApiResult<Vec<DictionaryItem>> {
        self.get(self.url(&["service", service_id, "dictionary", dictionary_id, "items"])?)
    }

    fn get_dictionary_item(
        &self,
        service_id: &str,
        dictionary_id: &str,
        key: &str,
    ) -> ApiResult<DictionaryItem> {
        self.get(self.url(&["service", service_id, "dictionary", dictionary_id, "item", key])?)
    }

    fn create_dictionary_item(
        &self,
        service_id: &str,
        dictionary_id: &str,
        key: &str,
        value: &str,
    ) -> ApiResult<DictionaryItem> {
        let url = self.url(&["service", service_id, "dictionary", dictionary_id, "item"])?;
        let form = Form::new()
            .field("item_key", key)
            .field("item_value", value);
        self.send_form(Method::POST, url, &form)
    }

    fn update_dictionary_item(
        &self,
        service_id: &str,
        dictionary_id: &str,
        key: &str,
        value: &str,
    ) -> ApiResult<DictionaryItem> {
        let url = self.url(&["service", service_id, "dictionary", dictionary_id, "item", key])?;
        self.send_form(Method::PUT, url, &Form::new().field("item_value", value))
    }

    fn delete_dictionary_item(
        &self,
        service_id: &str,
        dictionary_id: &str,
        key: &str,
    ) -> ApiResult<()> {
        self.delete(self.url(&["service", service_id, "dictionary", dictionary_id, "item", key])?)
    }

    fn batch_dictionary_items(
        &self,
        service_id: &str,
        dictionary_id: &str,
        items: &[DictionaryItemBatch],
    ) -> ApiResult<()> {
        let url = self.url(&["service", service_id, "dictionary", dictionary_id, "items"])?;
        let payload = serde_json::json!({ "items": items });
        let _: serde_json::Value = self.send_json(Method::PATCH, url, &payload)?;
        Ok(())
    }

    fn list_logging(
        &self,
        kind: LoggingKind,
        service_id: &str,
        version: i64,
    ) -> ApiResult<Vec<LoggingEndpoint>> {
        self.get(self.version_url(service_id, version, &["logging", kind.api_path()])?)
    }

    fn get_logging(
        &self,
        kind: LoggingKind,
        service_id: &str,
        version: i64,
        name: &str,
    ) -> ApiResult<LoggingEndpoint> {
        self.get(self.version_url(service_id, version, &["logging", kind.api_path(), name])?)
    }

    fn create_logging(
        &self,
        kind: LoggingKind,
        service_id: &str,
        version: i64,
        fields: &LoggingFields,
    ) -> ApiResult<LoggingEndpoint> {
        let url = self.version_url(service_id, version, &["logging", kind.api_path()])?;
        self.send_form(Method::POST, url, &fields.to_form())
    }

    fn update_logging(
        &self,
        kind: LoggingKind,
        service_id: &str,
        version: i64,
        name: &str,
        fields: &LoggingFields,
    ) -> ApiResult<LoggingEndpoint> {
        let url = self.version_url(service_id, version, &["logging", kind.api_path(), name])?;
        self.send_form(Method::PUT, url, &fields.to_form())
    }

    fn delete_logging(
        &self,
        kind: LoggingKind,
        service_id: &str,
        version: i64,
        name: &str,
    ) -> ApiResult<()> {
        self.delete(self.version_url(service_id, version, &["logging", kind.api_path(), name])?)
    }

    fn purge_all(&self, service_id: &str) -> ApiResult<PurgeResult> {
        let url = self.url(&["service", service_id, "purge_all"])?;
        self.send_form(Method::POST, url, &Form::new())
    }

    fn purge_key(&self, service_id: &str, key: &str, soft: bool) -> ApiResult<PurgeResult> {
        let url = self.url(&["service", service_id, "purge", key])?;
        let mut builder = self.request(Method::POST, url.clone());
        if soft {
            builder = builder.header("Fastly-Soft-Purge", "1");
        }
        let body = self.execute(builder, &url)?;
        Self::decode(&url, &body)
    }

    fn purge_keys(
        &self,
        service_id: &str,
        keys: &[String],
        soft: bool,
    ) -> ApiResult<BTreeMap<String, String>> {
        let url = self.url(&["service", service_id, "purge"])?;
        let mut builder = self
            .request(Method::POST, url.clone())
            .header("Surrogate-Key", keys.join(" "));
        if soft {
            builder = builder.header("Fastly-Soft-Purge", "1");
        }
        let body = self.execute(builder, &url)?;
        Self::decode(&url, &body)
    }

    fn purge_url(&self, target: &str, soft: bool) -> ApiResult<PurgeResult> {
        // The target URL is appended verbatim, scheme and slashes included
        let raw = format!(
            "{}/purge/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            target
        );
        let url = Url::parse(&raw).map_err(|_| ApiError::Endpoint(raw.clone()))?;
        let mut builder = self.request(Method::POST, url.clone());
        if soft {
            builder = builder.header("Fastly-Soft-Purge", "1");
        }
        let body = self.execute(builder, &url)?;
        Self::decode(&url, &body)
    }

    fn verify(&self) -> ApiResult<Verify> {
        self.get(self.url(&["verify"])?)
    }

    fn token_self(&self) -> ApiResult<TokenInfo> {
        self.get(self.url(&["tokens", "self"])?)
    }

    fn current_user(&self) -> ApiResult<User> {
        self.get(self.url(&["current_user"])?)
    }

    fn list_workspaces(&self, limit: Option<i64>) -> ApiResult<Page<Workspace>> {
        let mut url = self.url(&["ngwaf", "v1", "workspaces"])?;
        if let Some(limit) = limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }
        self.get(url)
    }

    fn get_workspace(&self, workspace_id: &str) -> ApiResult<Workspace> {
        self.get(self.url(&["ngwaf", "v1", "workspaces", workspace_id])?)
    }

    fn create_workspace(&self, fields: &WorkspaceFields) -> ApiResult<Workspace> {
        self.send_json(
            Method::POST,
            self.url(&["ngwaf", "v1", "workspaces"])?,
            fields,
        )
    }

    fn update_workspace(
        &self,
        workspace_id: &str,
        fields: &WorkspaceFields,
    ) -> ApiResult<Workspace> {
        self.send_json(
            Method::PATCH,
            self.url(&["ngwaf", "v1", "workspaces", workspace_id])?,
            fields,
        )
    }

    fn delete_workspace(&self, workspace_id: &str) -> ApiResult<()> {
        self.delete(self.url(&["ngwaf", "v1", "workspaces", workspace_id])?)
    }

    fn list_workspace_lists(&self, workspace_id: &str) -> ApiResult<Page<NgwafList>> {
        self.get(self.url(&["ngwaf", "v1", "workspaces", workspace_id, "lists"])?)
    }

    fn get_workspace_list(&self, workspace_id: &str, list_id: &str) -> ApiResult<NgwafList> {
        self.get(self.url(&["ngwaf", "v1", "workspaces", workspace_id, "lists", list_id])?)
    }

    fn create_workspace_list(
        &self,
        workspace_id: &str,
        fields: &ListFields,
    ) -> ApiResult<NgwafList> {
        let url = self.url(&["ngwaf", "v1", "workspaces", workspace_id, "lists"])?;
        self.send_json(Method::POST, url, fields)
    }

    fn update_workspace_list(
        &self,
        workspace_id: &str,
        list_id: &str,
        fields: &ListFields,
    ) -> ApiResult<NgwafList> {
        let url = self.url(&["ngwaf", "v1", "workspaces", workspace_id, "lists", list_id])?;
        self.send_json(Method::PATCH, url, fields)
    }

    fn delete_workspace_list(&self, workspace_id: &str, list_id: &str) -> ApiResult<()> {
        self.delete(self.url(&["ngwaf", "v1", "workspaces", workspace_id, "lists", list_id])?)
    }
}
