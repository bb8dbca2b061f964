//! Test support: logging setup and in-memory fakes for the I/O boundaries

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, Once};
use std::time::Duration;

use semver::Version as SemVer;
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{
    Backend, BatchOperation, Dictionary, DictionaryItem, DictionaryItemBatch, Domain, DomainV1,
    DomainValidation, HealthCheck, LoggingEndpoint, LoggingKind, NgwafList, Page, PageMeta,
    PurgeResult, Service, TokenInfo, User, Verify, VerifyCustomer, VerifyUser, Version, Workspace,
};
use crate::infrastructure::api::{
    ApiError, ApiFactory, ApiResult, BackendFields, DictionaryFields, DomainFields,
    DomainV1Fields, DomainV1Query, FastlyApi, Form, HealthCheckFields, ListFields, LoggingFields,
    ServiceFields, ToForm, WorkspaceFields,
};
use crate::infrastructure::github::{ReleaseError, Versioner};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "debug");
        }
        setup_test_logging();
        // assertions compare plain text
        colored::control::set_override(false);
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    // reqwest/rustls are chatty at debug level
    let noisy_modules = ["hyper", "reqwest", "rustls"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::status(404, format!("Record not found: {what}"))
}

/// Everything the fake platform knows about.
#[derive(Debug, Default)]
pub struct FakeState {
    pub services: Vec<Service>,
    pub versions: BTreeMap<String, Vec<Version>>,
    pub domains: Vec<Domain>,
    pub domains_v1: Vec<DomainV1>,
    pub backends: Vec<Backend>,
    pub healthchecks: Vec<HealthCheck>,
    pub dictionaries: Vec<Dictionary>,
    pub dictionary_items: Vec<DictionaryItem>,
    pub logging: Vec<(LoggingKind, LoggingEndpoint)>,
    pub workspaces: Vec<Workspace>,
    pub lists: BTreeMap<String, Vec<NgwafList>>,
    pub user: User,
    pub customer: VerifyCustomer,
    /// One line per call, e.g. `create_backend 123 2`.
    pub requests: Vec<String>,
    /// Form body of the most recent form-encoded write.
    pub last_form: Option<Form>,
    /// When set, every call fails with this status and message.
    pub failure: Option<(u16, String)>,
    next_id: u64,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

/// In-memory `FastlyApi` recording every request.
#[derive(Debug, Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        let api = Self::default();
        {
            let mut state = api.state();
            state.user = User {
                id: "u1".into(),
                login: "test@example.com".into(),
                name: "Test User".into(),
                ..Default::default()
            };
            state.customer = VerifyCustomer {
                id: "c1".into(),
                name: "Example Co".into(),
            };
        }
        api
    }

    /// Add a service whose versions are given as `(number, active, locked)`.
    pub fn with_service(self, id: &str, name: &str, versions: &[(i64, bool, bool)]) -> Self {
        {
            let mut state = self.state();
            let versions: Vec<Version> = versions
                .iter()
                .map(|&(number, active, locked)| Version {
                    number,
                    service_id: id.to_string(),
                    active,
                    locked,
                    ..Default::default()
                })
                .collect();
            state.services.push(Service {
                id: id.to_string(),
                name: name.to_string(),
                service_type: "vcl".to_string(),
                version: versions.iter().find(|v| v.active).map(|v| v.number),
                versions: versions.clone(),
                ..Default::default()
            });
            state.versions.insert(id.to_string(), versions);
        }
        self
    }

    pub fn with_backend(self, backend: Backend) -> Self {
        self.state().backends.push(backend);
        self
    }

    pub fn with_logging(self, kind: LoggingKind, endpoint: LoggingEndpoint) -> Self {
        self.state().logging.push((kind, endpoint));
        self
    }

    pub fn with_domain_v1(self, domain: DomainV1) -> Self {
        self.state().domains_v1.push(domain);
        self
    }

    pub fn with_workspace(self, workspace: Workspace) -> Self {
        self.state().workspaces.push(workspace);
        self
    }

    /// Make every subsequent call fail with `status`.
    pub fn fail_with(self, status: u16, message: &str) -> Self {
        self.state().failure = Some((status, message.to_string()));
        self
    }

    pub fn into_arc(self) -> Arc<dyn FastlyApi> {
        Arc::new(self)
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn requests(&self) -> Vec<String> {
        self.state().requests.clone()
    }

    /// Record the call and return the state, or the injected failure.
    fn call(&self, request: String) -> ApiResult<MutexGuard<'_, FakeState>> {
        let mut state = self.state();
        state.requests.push(request);
        if let Some((status, message)) = state.failure.clone() {
            return Err(ApiError::status(status, message));
        }
        Ok(state)
    }

    fn call_with_form(&self, request: String, form: Form) -> ApiResult<MutexGuard<'_, FakeState>> {
        let mut state = self.call(request)?;
        state.last_form = Some(form);
        Ok(state)
    }
}

/// Factory handing out the same fake regardless of token and endpoint.
pub fn fake_factory(api: Arc<FakeApi>) -> ApiFactory {
    Arc::new(move |_token: &str, _endpoint: &str| {
        let api: Arc<dyn FastlyApi> = api.clone();
        Ok(api)
    })
}

/// Apply an optional update to a field.
fn patch<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

fn patch_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        *target = value.clone();
    }
}

fn apply_backend(backend: &mut Backend, f: &BackendFields) {
    patch(&mut backend.name, &f.name);
    patch_opt(&mut backend.address, &f.address);
    patch_opt(&mut backend.port, &f.port);
    patch_opt(&mut backend.use_ssl, &f.use_ssl);
    patch_opt(&mut backend.override_host, &f.override_host);
    patch_opt(&mut backend.comment, &f.comment);
    patch_opt(&mut backend.connect_timeout, &f.connect_timeout);
    patch_opt(&mut backend.first_byte_timeout, &f.first_byte_timeout);
    patch_opt(&mut backend.between_bytes_timeout, &f.between_bytes_timeout);
    patch_opt(&mut backend.max_conn, &f.max_conn);
    patch_opt(&mut backend.weight, &f.weight);
    patch_opt(&mut backend.auto_loadbalance, &f.auto_loadbalance);
    patch_opt(&mut backend.healthcheck, &f.healthcheck);
    patch_opt(&mut backend.shield, &f.shield);
    patch_opt(&mut backend.request_condition, &f.request_condition);
    patch_opt(&mut backend.ssl_cert_hostname, &f.ssl_cert_hostname);
    patch_opt(&mut backend.ssl_sni_hostname, &f.ssl_sni_hostname);
    patch_opt(&mut backend.ssl_check_cert, &f.ssl_check_cert);
    patch_opt(&mut backend.min_tls_version, &f.min_tls_version);
    patch_opt(&mut backend.max_tls_version, &f.max_tls_version);
}

fn apply_healthcheck(hc: &mut HealthCheck, f: &HealthCheckFields) {
    patch(&mut hc.name, &f.name);
    patch_opt(&mut hc.comment, &f.comment);
    patch_opt(&mut hc.method, &f.method);
    patch_opt(&mut hc.host, &f.host);
    patch_opt(&mut hc.path, &f.path);
    patch_opt(&mut hc.http_version, &f.http_version);
    patch_opt(&mut hc.timeout, &f.timeout);
    patch_opt(&mut hc.check_interval, &f.check_interval);
    patch_opt(&mut hc.expected_response, &f.expected_response);
    patch_opt(&mut hc.window, &f.window);
    patch_opt(&mut hc.threshold, &f.threshold);
    patch_opt(&mut hc.initial, &f.initial);
}

fn apply_logging(endpoint: &mut LoggingEndpoint, f: &LoggingFields) {
    patch(&mut endpoint.name, &f.name);
    patch_opt(&mut endpoint.format, &f.format);
    patch_opt(&mut endpoint.format_version, &f.format_version);
    patch_opt(&mut endpoint.placement, &f.placement);
    patch_opt(&mut endpoint.response_condition, &f.response_condition);
    for (k, v) in &f.settings {
        endpoint
            .settings
            .insert(k.clone(), serde_json::Value::String(v.clone()));
    }
}

fn apply_workspace(ws: &mut Workspace, f: &WorkspaceFields) {
    patch(&mut ws.name, &f.name);
    patch(&mut ws.description, &f.description);
    patch(&mut ws.mode, &f.mode);
    patch(&mut ws.attack_signal_thresholds, &f.attack_signal_thresholds);
    patch(&mut ws.client_ip_headers, &f.client_ip_headers);
    patch_opt(
        &mut ws.default_blocking_response_code,
        &f.default_blocking_response_code,
    );
    patch_opt(&mut ws.default_redirect_url, &f.default_redirect_url);
    patch_opt(&mut ws.ip_anonymization, &f.ip_anonymization);
}

fn apply_list(list: &mut NgwafList, f: &ListFields) {
    patch(&mut list.name, &f.name);
    patch_opt(&mut list.description, &f.description);
    patch(&mut list.list_type, &f.list_type);
    patch(&mut list.entries, &f.entries);
    patch(&mut list.scope, &f.scope);
}

impl FastlyApi for FakeApi {
    fn list_services(&self) -> ApiResult<Vec<Service>> {
        let state = self.call("list_services".into())?;
        Ok(state.services.clone())
    }

    fn get_service(&self, service_id: &str) -> ApiResult<Service> {
        let state = self.call(format!("get_service {service_id}"))?;
        state
            .services
            .iter()
            .find(|s| s.id == service_id)
            .cloned()
            .ok_or_else(|| not_found(service_id))
    }

    fn search_service(&self, name: &str) -> ApiResult<Service> {
        let state = self.call(format!("search_service {name}"))?;
        state
            .services
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    fn create_service(&self, fields: &ServiceFields) -> ApiResult<Service> {
        let mut state = self.call_with_form("create_service".into(), fields.to_form())?;
        let id = state.next_id("svc");
        let service = Service {
            id: id.clone(),
            name: fields.name.clone().unwrap_or_default(),
            service_type: fields.service_type.clone().unwrap_or_else(|| "vcl".into()),
            comment: fields.comment.clone(),
            versions: vec![Version {
                number: 1,
                service_id: id.clone(),
                ..Default::default()
            }],
            ..Default::default()
        };
        state.versions.insert(id, service.versions.clone());
        state.services.push(service.clone());
        Ok(service)
    }

    fn update_service(&self, service_id: &str, fields: &ServiceFields) -> ApiResult<Service> {
        let mut state =
            self.call_with_form(format!("update_service {service_id}"), fields.to_form())?;
        let service = state
            .services
            .iter_mut()
            .find(|s| s.id == service_id)
            .ok_or_else(|| not_found(service_id))?;
        patch(&mut service.name, &fields.name);
        patch_opt(&mut service.comment, &fields.comment);
        Ok(service.clone())
    }

    fn delete_service(&self, service_id: &str) -> ApiResult<()> {
        let mut state = self.call(format!("delete_service {service_id}"))?;
        let before = state.services.len();
        state.services.retain(|s| s.id != service_id);
        if state.services.len() == before {
            return Err(not_found(service_id));
        }
        Ok(())
    }

    fn list_versions(&self, service_id: &str) -> ApiResult<Vec<Version>> {
        let state = self.call(format!("list_versions {service_id}"))?;
        state
            .versions
            .get(service_id)
            .cloned()
            .ok_or_else(|| not_found(service_id))
    }

    fn clone_version(&self, service_id: &str, version: i64) -> ApiResult<Version> {
        let mut state = self.call(format!("clone_version {service_id} {version}"))?;
        let versions = state
            .versions
            .get_mut(service_id)
            .ok_or_else(|| not_found(service_id))?;
        let source = versions
            .iter()
            .find(|v| v.number == version)
            .cloned()
            .ok_or_else(|| not_found(&version.to_string()))?;
        let number = versions.iter().map(|v| v.number).max().unwrap_or(0) + 1;
        let cloned = Version {
            number,
            service_id: service_id.to_string(),
            comment: source.comment,
            ..Default::default()
        };
        versions.push(cloned.clone());
        Ok(cloned)
    }

    fn update_version(
        &self,
        service_id: &str,
        version: i64,
        comment: Option<&str>,
    ) -> ApiResult<Version> {
        let mut state = self.call(format!("update_version {service_id} {version}"))?;
        let v = find_version(&mut state, service_id, version)?;
        if let Some(comment) = comment {
            v.comment = Some(comment.to_string());
        }
        Ok(v.clone())
    }

    fn activate_version(&self, service_id: &str, version: i64) -> ApiResult<Version> {
        let mut state = self.call(format!("activate_version {service_id} {version}"))?;
        if let Some(versions) = state.versions.get_mut(service_id) {
            for v in versions.iter_mut() {
                v.active = false;
            }
        }
        let v = find_version(&mut state, service_id, version)?;
        v.active = true;
        v.locked = true;
        Ok(v.clone())
    }

    fn deactivate_version(&self, service_id: &str, version: i64) -> ApiResult<Version> {
        let mut state = self.call(format!("deactivate_version {service_id} {version}"))?;
        let v = find_version(&mut state, service_id, version)?;
        v.active = false;
        Ok(v.clone())
    }

    fn lock_version(&self, service_id: &str, version: i64) -> ApiResult<Version> {
        let mut state = self.call(format!("lock_version {service_id} {version}"))?;
        let v = find_version(&mut state, service_id, version)?;
        v.locked = true;
        Ok(v.clone())
    }

    fn list_domains(&self, service_id: &str, version: i64) -> ApiResult<Vec<Domain>> {
        let state = self.call(format!("list_domains {service_id} {version}"))?;
        Ok(state
            .domains
            .iter()
            .filter(|d| d.service_id == service_id && d.version == version)
            .cloned()
            .collect())
    }

    fn get_domain(&self, service_id: &str, version: i64, name: &str) -> ApiResult<Domain> {
        let state = self.call(format!("get_domain {service_id} {version} {name}"))?;
        state
            .domains
            .iter()
            .find(|d| d.service_id == service_id && d.version == version && d.name == name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    fn create_domain(
        &self,
        service_id: &str,
        version: i64,
        fields: &DomainFields,
    ) -> ApiResult<Domain> {
        let mut state = self.call_with_form(
            format!("create_domain {service_id} {version}"),
            fields.to_form(),
        )?;
        let domain = Domain {
            name: fields.name.clone().unwrap_or_default(),
            comment: fields.comment.clone(),
            service_id: service_id.to_string(),
            version,
        };
        state.domains.push(domain.clone());
        Ok(domain)
    }

    fn update_domain(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
        fields: &DomainFields,
    ) -> ApiResult<Domain> {
        let mut state = self.call_with_form(
            format!("update_domain {service_id} {version} {name}"),
            fields.to_form(),
        )?;
        let domain = state
            .domains
            .iter_mut()
            .find(|d| d.service_id == service_id && d.version == version && d.name == name)
            .ok_or_else(|| not_found(name))?;
        patch(&mut domain.name, &fields.name);
        patch_opt(&mut domain.comment, &fields.comment);
        Ok(domain.clone())
    }

    fn delete_domain(&self, service_id: &str, version: i64, name: &str) -> ApiResult<()> {
        let mut state = self.call(format!("delete_domain {service_id} {version} {name}"))?;
        let before = state.domains.len();
        state
            .domains
            .retain(|d| !(d.service_id == service_id && d.version == version && d.name == name));
        if state.domains.len() == before {
            return Err(not_found(name));
        }
        Ok(())
    }

    fn validate_domain(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
    ) -> ApiResult<DomainValidation> {
        let state = self.call(format!("validate_domain {service_id} {version} {name}"))?;
        let domain = state
            .domains
            .iter()
            .find(|d| d.service_id == service_id && d.version == version && d.name == name)
            .cloned()
            .ok_or_else(|| not_found(name))?;
        Ok(DomainValidation {
            domain,
            cname: "global.prod.fastly.net".into(),
            valid: true,
        })
    }

    fn validate_all_domains(
        &self,
        service_id: &str,
        version: i64,
    ) -> ApiResult<Vec<DomainValidation>> {
        let state = self.call(format!("validate_all_domains {service_id} {version}"))?;
        Ok(state
            .domains
            .iter()
            .filter(|d| d.service_id == service_id && d.version == version)
            .map(|d| DomainValidation {
                domain: d.clone(),
                cname: "global.prod.fastly.net".into(),
                valid: true,
            })
            .collect())
    }

    fn list_domains_v1(&self, query: &DomainV1Query) -> ApiResult<Page<DomainV1>> {
        let state = self.call("list_domains_v1".into())?;
        let data: Vec<DomainV1> = state
            .domains_v1
            .iter()
            .filter(|d| query.fqdn.as_ref().map_or(true, |f| &d.fqdn == f))
            .filter(|d| {
                query
                    .service_id
                    .as_ref()
                    .map_or(true, |s| d.service_id.as_ref() == Some(s))
            })
            .cloned()
            .collect();
        Ok(Page {
            meta: PageMeta {
                total: Some(data.len() as i64),
                limit: query.limit,
                next_cursor: None,
            },
            data,
        })
    }

    fn get_domain_v1(&self, domain_id: &str) -> ApiResult<DomainV1> {
        let state = self.call(format!("get_domain_v1 {domain_id}"))?;
        state
            .domains_v1
            .iter()
            .find(|d| d.id == domain_id)
            .cloned()
            .ok_or_else(|| not_found(domain_id))
    }

    fn create_domain_v1(&self, fields: &DomainV1Fields) -> ApiResult<DomainV1> {
        let mut state = self.call("create_domain_v1".into())?;
        let id = state.next_id("dom");
        let domain = DomainV1 {
            id,
            fqdn: fields.fqdn.clone().unwrap_or_default(),
            service_id: fields.service_id.clone(),
            ..Default::default()
        };
        state.domains_v1.push(domain.clone());
        Ok(domain)
    }

    fn update_domain_v1(&self, domain_id: &str, fields: &DomainV1Fields) -> ApiResult<DomainV1> {
        let mut state = self.call(format!("update_domain_v1 {domain_id}"))?;
        let domain = state
            .domains_v1
            .iter_mut()
            .find(|d| d.id == domain_id)
            .ok_or_else(|| not_found(domain_id))?;
        patch_opt(&mut domain.service_id, &fields.service_id);
        Ok(domain.clone())
    }

    fn delete_domain_v1(&self, domain_id: &str) -> ApiResult<()> {
        let mut state = self.call(format!("delete_domain_v1 {domain_id}"))?;
        let before = state.domains_v1.len();
        state.domains_v1.retain(|d| d.id != domain_id);
        if state.domains_v1.len() == before {
            return Err(not_found(domain_id));
        }
        Ok(())
    }

    fn list_backends(&self, service_id: &str, version: i64) -> ApiResult<Vec<Backend>> {
        let state = self.call(format!("list_backends {service_id} {version}"))?;
        Ok(state
            .backends
            .iter()
            .filter(|b| b.service_id == service_id && b.version == version)
            .cloned()
            .collect())
    }

    fn get_backend(&self, service_id: &str, version: i64, name: &str) -> ApiResult<Backend> {
        let state = self.call(format!("get_backend {service_id} {version} {name}"))?;
        state
            .backends
            .iter()
            .find(|b| b.service_id == service_id && b.version == version && b.name == name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    fn create_backend(
        &self,
        service_id: &str,
        version: i64,
        fields: &BackendFields,
    ) -> ApiResult<Backend> {
        let mut state = self.call_with_form(
            format!("create_backend {service_id} {version}"),
            fields.to_form(),
        )?;
        let mut backend = Backend {
            service_id: service_id.to_string(),
            version,
            ..Default::default()
        };
        apply_backend(&mut backend, fields);
        state.backends.push(backend.clone());
        Ok(backend)
    }

    fn update_backend(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
        fields: &BackendFields,
    ) -> ApiResult<Backend> {
        let mut state = self.call_with_form(
            format!("update_backend {service_id} {version} {name}"),
            fields.to_form(),
        )?;
        let backend = state
            .backends
            .iter_mut()
            .find(|b| b.service_id == service_id && b.version == version && b.name == name)
            .ok_or_else(|| not_found(name))?;
        apply_backend(backend, fields);
        Ok(backend.clone())
    }

    fn delete_backend(&self, service_id: &str, version: i64, name: &str) -> ApiResult<()> {
        let mut state = self.call(format!("delete_backend {service_id} {version} {name}"))?;
        let before = state.backends.len();
        state
            .backends
            .retain(|b| !(b.service_id == service_id && b.version == version && b.name == name));
        if state.backends.len() == before {
            return Err(not_found(name));
        }
        Ok(())
    }

    fn list_healthchecks(&self, service_id: &str, version: i64) -> ApiResult<Vec<HealthCheck>> {
        let state = self.call(format!("list_healthchecks {service_id} {version}"))?;
        Ok(state
            .healthchecks
            .iter()
            .filter(|h| h.service_id == service_id && h.version == version)
            .cloned()
            .collect())
    }

    fn get_healthcheck(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
    ) -> ApiResult<HealthCheck> {
        let state = self.call(format!("get_healthcheck {service_id} {version} {name}"))?;
        state
            .healthchecks
            .iter()
            .find(|h| h.service_id == service_id && h.version == version && h.name == name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    fn create_healthcheck(
        &self,
        service_id: &str,
        version: i64,
        fields: &HealthCheckFields,
    ) -> ApiResult<HealthCheck> {
        let mut state = self.call_with_form(
            format!("create_healthcheck {service_id} {version}"),
            fields.to_form(),
        )?;
        let mut hc = HealthCheck {
            service_id: service_id.to_string(),
            version,
            ..Default::default()
        };
        apply_healthcheck(&mut hc, fields);
        state.healthchecks.push(hc.clone());
        Ok(hc)
    }

    fn update_healthcheck(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
        fields: &HealthCheckFields,
    ) -> ApiResult<HealthCheck> {
        let mut state = self.call_with_form(
            format!("update_healthcheck {service_id} {version} {name}"),
            fields.to_form(),
        )?;
        let hc = state
            .healthchecks
            .iter_mut()
            .find(|h| h.service_id == service_id && h.version == version && h.name == name)
            .ok_or_else(|| not_found(name))?;
        apply_healthcheck(hc, fields);
        Ok(hc.clone())
    }

    fn delete_healthcheck(&self, service_id: &str, version: i64, name: &str) -> ApiResult<()> {
        let mut state = self.call(format!("delete_healthcheck {service_id} {version} {name}"))?;
        let before = state.healthchecks.len();
        state
            .healthchecks
            .retain(|h| !(h.service_id == service_id && h.version == version && h.name == name));
        if state.healthchecks.len() == before {
            return Err(not_found(name));
        }
        Ok(())
    }

    fn list_dictionaries(&self, service_id: &str, version: i64) -> ApiResult<Vec<Dictionary>> {
        let state = self.call(format!("list_dictionaries {service_id} {version}"))?;
        Ok(state
            .dictionaries
            .iter()
            .filter(|d| d.service_id == service_id && d.version == version)
            .cloned()
            .collect())
    }

    fn get_dictionary(&self, service_id: &str, version: i64, name: &str) -> ApiResult<Dictionary> {
        let state = self.call(format!("get_dictionary {service_id} {version} {name}"))?;
        state
            .dictionaries
            .iter()
            .find(|d| d.service_id == service_id && d.version == version && d.name == name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    fn create_dictionary(
        &self,
        service_id: &str,
        version: i64,
        fields: &DictionaryFields,
    ) -> ApiResult<Dictionary> {
        let mut state = self.call_with_form(
            format!("create_dictionary {service_id} {version}"),
            fields.to_form(),
        )?;
        let id = state.next_id("dict");
        let dictionary = Dictionary {
            id,
            name: fields.name.clone().unwrap_or_default(),
            service_id: service_id.to_string(),
            version,
            write_only: fields.write_only.unwrap_or(false),
            ..Default::default()
        };
        state.dictionaries.push(dictionary.clone());
        Ok(dictionary)
    }

    fn update_dictionary(
        &self,
        service_id: &str,
        version: i64,
        name: &str,
        fields: &DictionaryFields,
    ) -> ApiResult<Dictionary> {
        let mut state = self.call_with_form(
            format!("update_dictionary {service_id} {version} {name}"),
            fields.to_form(),
        )?;
        let dictionary = state
            .dictionaries
            .iter_mut()
            .find(|d| d.service_id == service_id && d.version == version && d.name == name)
            .ok_or_else(|| not_found(name))?;
        patch(&mut dictionary.name, &fields.name);
        patch(&mut dictionary.write_only, &fields.write_only);
        Ok(dictionary.clone())
    }

    fn delete_dictionary(&self, service_id: &str, version: i64, name: &str) -> ApiResult<()> {
        let mut state = self.call(format!("delete_dictionary {service_id} {version} {name}"))?;
        let before = state.dictionaries.len();
        state
            .dictionaries
            .retain(|d| !(d.service_id == service_id && d.version == version && d.name == name));
        if state.dictionaries.len() == before {
            return Err(not_found(name));
        }
        Ok(())
    }

    fn list_dictionary_items(
        &self,
        service_id: &str,
        dictionary_id: &str,
    ) -> ApiResult<Vec<DictionaryItem>> {
        let state = self.call(format!("list_dictionary_items {service_id} {dictionary_id}"))?;
        Ok(state
            .dictionary_items
            .iter()
            .filter(|i| i.service_id == service_id && i.dictionary_id == dictionary_id)
            .cloned()
            .collect())
    }

    fn get_dictionary_item(
        &self,
        service_id: &str,
        dictionary_id: &str,
        key: &str,
    ) -> ApiResult<DictionaryItem> {
        let state = self.call(format!(
            "get_dictionary_item {service_id} {dictionary_id} {key}"
        ))?;
        state
            .dictionary_items
            .iter()
            .find(|i| {
                i.service_id == service_id && i.dictionary_id == dictionary_id && i.item_key == key
            })
            .cloned()
            .ok_or_else(|| not_found(key))
    }

    fn create_dictionary_item(
        &self,
        service_id: &str,
        dictionary_id: &str,
        key: &str,
        value: &str,
    ) -> ApiResult<DictionaryItem> {
        let mut state = self.call(format!(
            "create_dictionary_item {service_id} {dictionary_id} {key}"
        ))?;
        let item = DictionaryItem {
            dictionary_id: dictionary_id.to_string(),
            service_id: service_id.to_string(),
            item_key: key.to_string(),
            item_value: value.to_string(),
            ..Default::default()
        };
        state.dictionary_items.push(item.clone());
        Ok(item)
    }

    fn update_dictionary_item(
        &self,
        service_id: &str,
        dictionary_id: &str,
        key: &str,
        value: &str,
    ) -> ApiResult<DictionaryItem> {
        let mut state = self.call(format!(
            "update_dictionary_item {service_id} {dictionary_id} {key}"
        ))?;
        let item = state
            .dictionary_items
            .iter_mut()
            .find(|i| {
                i.service_id == service_id && i.dictionary_id == dictionary_id && i.item_key == key
            })
            .ok_or_else(|| not_found(key))?;
        item.item_value = value.to_string();
        Ok(item.clone())
    }

    fn delete_dictionary_item(
        &self,
        service_id: &str,
        dictionary_id: &str,
        key: &str,
    ) -> ApiResult<()> {
        let mut state = self.call(format!(
            "delete_dictionary_item {service_id} {dictionary_id} {key}"
        ))?;
        let before = state.dictionary_items.len();
        state.dictionary_items.retain(|i| {
            !(i.service_id == service_id && i.dictionary_id == dictionary_id && i.item_key == key)
        });
        if state.dictionary_items.len() == before {
            return Err(not_found(key));
        }
        Ok(())
    }

    fn batch_dictionary_items(
        &self,
        service_id: &str,
        dictionary_id: &str,
        items: &[DictionaryItemBatch],
    ) -> ApiResult<()> {
        let mut state = self.call(format!(
            "batch_dictionary_items {service_id} {dictionary_id} {}",
            items.len()
        ))?;
        for batch in items {
            let matches = |i: &DictionaryItem| {
                i.service_id == service_id
                    && i.dictionary_id == dictionary_id
                    && i.item_key == batch.item_key
            };
            state.dictionary_items.retain(|i| !matches(i));
            if batch.op != BatchOperation::Delete {
                state.dictionary_items.push(DictionaryItem {
                    dictionary_id: dictionary_id.to_string(),
                    service_id: service_id.to_string(),
                    item_key: batch.item_key.clone(),
                    item_value: batch.item_value.clone().unwrap_or_default(),
                    ..Default::default()
                });
            }
        }
        Ok(())
    }

    fn list_logging(
        &self,
        kind: LoggingKind,
        service_id: &str,
        version: i64,
    ) -> ApiResult<Vec<LoggingEndpoint>> {
        let state = self.call(format!(
            "list_logging {} {service_id} {version}",
            kind.api_path()
        ))?;
        Ok(state
            .logging
            .iter()
            .filter(|(k, e)| *k == kind && e.service_id == service_id && e.version == version)
            .map(|(_, e)| e.clone())
            .collect())
    }

    fn get_logging(
        &self,
        kind: LoggingKind,
        service_id: &str,
        version: i64,
        name: &str,
    ) -> ApiResult<LoggingEndpoint> {
        let state = self.call(format!(
            "get_logging {} {service_id} {version} {name}",
            kind.api_path()
        ))?;
        state
            .logging
            .iter()
            .find(|(k, e)| {
                *k == kind && e.service_id == service_id && e.version == version && e.name == name
            })
            .map(|(_, e)| e.clone())
            .ok_or_else(|| not_found(name))
    }

    fn create_logging(
        &self,
        kind: LoggingKind,
        service_id: &str,
        version: i64,
        fields: &LoggingFields,
    ) -> ApiResult<LoggingEndpoint> {
        let mut state = self.call_with_form(
            format!("create_logging {} {service_id} {version}", kind.api_path()),
            fields.to_form(),
        )?;
        let mut endpoint = LoggingEndpoint {
            service_id: service_id.to_string(),
            version,
            ..Default::default()
        };
        apply_logging(&mut endpoint, fields);
        state.logging.push((kind, endpoint.clone()));
        Ok(endpoint)
    }

    fn update_logging(
        &self,
        kind: LoggingKind,
        service_id: &str,
        version: i64,
        name: &str,
        fields: &LoggingFields,
    ) -> ApiResult<LoggingEndpoint> {
        let mut state = self.call_with_form(
            format!(
                "update_logging {} {service_id} {version} {name}",
                kind.api_path()
            ),
            fields.to_form(),
        )?;
        let (_, endpoint) = state
            .logging
            .iter_mut()
            .find(|(k, e)| {
                *k == kind && e.service_id == service_id && e.version == version && e.name == name
            })
            .ok_or_else(|| not_found(name))?;
        apply_logging(endpoint, fields);
        Ok(endpoint.clone())
    }

    fn delete_logging(
        &self,
        kind: LoggingKind,
        service_id: &str,
        version: i64,
        name: &str,
    ) -> ApiResult<()> {
        let mut state = self.call(format!(
            "delete_logging {} {service_id} {version} {name}",
            kind.api_path()
        ))?;
        let before = state.logging.len();
        state.logging.retain(|(k, e)| {
            !(*k == kind && e.service_id == service_id && e.version == version && e.name == name)
        });
        if state.logging.len() == before {
            return Err(not_found(name));
        }
        Ok(())
    }

    fn purge_all(&self, service_id: &str) -> ApiResult<PurgeResult> {
        self.call(format!("purge_all {service_id}"))?;
        Ok(PurgeResult {
            status: "ok".into(),
            id: None,
        })
    }

    fn purge_key(&self, service_id: &str, key: &str, soft: bool) -> ApiResult<PurgeResult> {
        let mut state = self.call(format!("purge_key {service_id} {key} soft={soft}"))?;
        let id = state.next_id("purge");
        Ok(PurgeResult {
            status: "ok".into(),
            id: Some(id),
        })
    }

    fn purge_keys(
        &self,
        service_id: &str,
        keys: &[String],
        soft: bool,
    ) -> ApiResult<BTreeMap<String, String>> {
        let mut state = self.call(format!(
            "purge_keys {service_id} {} soft={soft}",
            keys.join(",")
        ))?;
        let mut result = BTreeMap::new();
        for key in keys {
            let id = state.next_id("purge");
            result.insert(key.clone(), id);
        }
        Ok(result)
    }

    fn purge_url(&self, url: &str, soft: bool) -> ApiResult<PurgeResult> {
        let mut state = self.call(format!("purge_url {url} soft={soft}"))?;
        let id = state.next_id("purge");
        Ok(PurgeResult {
            status: "ok".into(),
            id: Some(id),
        })
    }

    fn verify(&self) -> ApiResult<Verify> {
        let state = self.call("verify".into())?;
        Ok(Verify {
            customer: state.customer.clone(),
            user: VerifyUser {
                id: state.user.id.clone(),
                name: state.user.name.clone(),
                login: state.user.login.clone(),
            },
            services: state
                .services
                .iter()
                .map(|s| (s.id.clone(), s.name.clone()))
                .collect(),
        })
    }

    fn token_self(&self) -> ApiResult<TokenInfo> {
        let state = self.call("token_self".into())?;
        Ok(TokenInfo {
            id: "t1".into(),
            user_id: state.user.id.clone(),
            scope: Some("global".into()),
            ..Default::default()
        })
    }

    fn current_user(&self) -> ApiResult<User> {
        let state = self.call("current_user".into())?;
        Ok(state.user.clone())
    }

    fn list_workspaces(&self, limit: Option<i64>) -> ApiResult<Page<Workspace>> {
        let state = self.call("list_workspaces".into())?;
        let take = limit.map(|l| l as usize).unwrap_or(usize::MAX);
        let data: Vec<Workspace> = state.workspaces.iter().take(take).cloned().collect();
        Ok(Page {
            meta: PageMeta {
                total: Some(state.workspaces.len() as i64),
                limit,
                next_cursor: None,
            },
            data,
        })
    }

    fn get_workspace(&self, workspace_id: &str) -> ApiResult<Workspace> {
        let state = self.call(format!("get_workspace {workspace_id}"))?;
        state
            .workspaces
            .iter()
            .find(|w| w.id == workspace_id)
            .cloned()
            .ok_or_else(|| not_found(workspace_id))
    }

    fn create_workspace(&self, fields: &WorkspaceFields) -> ApiResult<Workspace> {
        let mut state = self.call("create_workspace".into())?;
        let mut workspace = Workspace {
            id: state.next_id("ws"),
            ..Default::default()
        };
        apply_workspace(&mut workspace, fields);
        state.workspaces.push(workspace.clone());
        Ok(workspace)
    }

    fn update_workspace(
        &self,
        workspace_id: &str,
        fields: &WorkspaceFields,
    ) -> ApiResult<Workspace> {
        let mut state = self.call(format!("update_workspace {workspace_id}"))?;
        let workspace = state
            .workspaces
            .iter_mut()
            .find(|w| w.id == workspace_id)
            .ok_or_else(|| not_found(workspace_id))?;
        apply_workspace(workspace, fields);
        Ok(workspace.clone())
    }

    fn delete_workspace(&self, workspace_id: &str) -> ApiResult<()> {
        let mut state = self.call(format!("delete_workspace {workspace_id}"))?;
        let before = state.workspaces.len();
        state.workspaces.retain(|w| w.id != workspace_id);
        if state.workspaces.len() == before {
            return Err(not_found(workspace_id));
        }
        Ok(())
    }

    fn list_workspace_lists(&self, workspace_id: &str) -> ApiResult<Page<NgwafList>> {
        let state = self.call(format!("list_workspace_lists {workspace_id}"))?;
        let data = state.lists.get(workspace_id).cloned().unwrap_or_default();
        Ok(Page {
            meta: PageMeta {
                total: Some(data.len() as i64),
                ..Default::default()
            },
            data,
        })
    }

    fn get_workspace_list(&self, workspace_id: &str, list_id: &str) -> ApiResult<NgwafList> {
        let state = self.call(format!("get_workspace_list {workspace_id} {list_id}"))?;
        state
            .lists
            .get(workspace_id)
            .and_then(|lists| lists.iter().find(|l| l.id == list_id))
            .cloned()
            .ok_or_else(|| not_found(list_id))
    }

    fn create_workspace_list(
        &self,
        workspace_id: &str,
        fields: &ListFields,
    ) -> ApiResult<NgwafList> {
        let mut state = self.call(format!("create_workspace_list {workspace_id}"))?;
        let mut list = NgwafList {
            id: state.next_id("list"),
            ..Default::default()
        };
        apply_list(&mut list, fields);
        state
            .lists
            .entry(workspace_id.to_string())
            .or_default()
            .push(list.clone());
        Ok(list)
    }

    fn update_workspace_list(
        &self,
        workspace_id: &str,
        list_id: &str,
        fields: &ListFields,
    ) -> ApiResult<NgwafList> {
        let mut state = self.call(format!("update_workspace_list {workspace_id} {list_id}"))?;
        let list = state
            .lists
            .get_mut(workspace_id)
            .and_then(|lists| lists.iter_mut().find(|l| l.id == list_id))
            .ok_or_else(|| not_found(list_id))?;
        apply_list(list, fields);
        Ok(list.clone())
    }

    fn delete_workspace_list(&self, workspace_id: &str, list_id: &str) -> ApiResult<()> {
        let mut state = self.call(format!("delete_workspace_list {workspace_id} {list_id}"))?;
        let lists = state
            .lists
            .get_mut(workspace_id)
            .ok_or_else(|| not_found(workspace_id))?;
        let before = lists.len();
        lists.retain(|l| l.id != list_id);
        if lists.len() == before {
            return Err(not_found(list_id));
        }
        Ok(())
    }
}

fn find_version<'a>(
    state: &'a mut FakeState,
    service_id: &str,
    version: i64,
) -> ApiResult<&'a mut Version> {
    state
        .versions
        .get_mut(service_id)
        .and_then(|versions| versions.iter_mut().find(|v| v.number == version))
        .ok_or_else(|| not_found(&format!("{service_id} version {version}")))
}

/// `Versioner` serving a fixed latest version and a prepared binary.
#[derive(Debug)]
pub struct FakeVersioner {
    latest: SemVer,
    binary: PathBuf,
    delay: Duration,
}

impl FakeVersioner {
    /// `binary` is what `download` returns; it must exist on disk.
    pub fn new(latest: SemVer, binary: &Path) -> Self {
        Self {
            latest,
            binary: binary.to_path_buf(),
            delay: Duration::ZERO,
        }
    }

    /// Make `latest_version` take `delay`, like a slow network.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Versioner for FakeVersioner {
    fn binary_name(&self) -> &str {
        "fastly"
    }

    fn latest_version(&self) -> Result<SemVer, ReleaseError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(self.latest.clone())
    }

    fn download(&self, version: &SemVer) -> Result<PathBuf, ReleaseError> {
        if *version != self.latest {
            return Err(ReleaseError::NoMatchingRelease(version.clone()));
        }
        Ok(self.binary.clone())
    }
}
