//! Typed request inputs
//!
//! Every optional field stays `None` unless the user passed the matching flag,
//! so only explicitly provided values are sent to the API.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{AttackSignalThresholds, ListScope};

/// Ordered `application/x-www-form-urlencoded` body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form(Vec<(String, String)>);

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: &str, value: impl ToString) -> Self {
        self.0.push((key.to_string(), value.to_string()));
        self
    }

    pub fn optional<T: ToString>(self, key: &str, value: &Option<T>) -> Self {
        match value {
            Some(v) => self.field(key, v.to_string()),
            None => self,
        }
    }

    /// Booleans are encoded as `1`/`0`, which every form endpoint accepts.
    pub fn optional_bool(self, key: &str, value: Option<bool>) -> Self {
        match value {
            Some(v) => self.field(key, if v { "1" } else { "0" }),
            None => self,
        }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Types that encode into a form body.
pub trait ToForm {
    fn to_form(&self) -> Form;
}

/// Fields accepted when creating or updating a service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceFields {
    pub name: Option<String>,
    pub service_type: Option<String>,
    pub comment: Option<String>,
}

impl ToForm for ServiceFields {
    fn to_form(&self) -> Form {
        Form::new()
            .optional("name", &self.name)
            .optional("type", &self.service_type)
            .optional("comment", &self.comment)
    }
}

/// Fields accepted when creating or updating a domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainFields {
    pub name: Option<String>,
    pub comment: Option<String>,
}

impl ToForm for DomainFields {
    fn to_form(&self) -> Form {
        Form::new()
            .optional("name", &self.name)
            .optional("comment", &self.comment)
    }
}

/// Fields accepted when creating or updating a backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendFields {
    pub name: Option<String>,
    pub address: Option<String>,
    pub port: Option<u16>,
    pub use_ssl: Option<bool>,
    pub override_host: Option<String>,
    pub comment: Option<String>,
    pub connect_timeout: Option<i64>,
    pub first_byte_timeout: Option<i64>,
    pub between_bytes_timeout: Option<i64>,
    pub max_conn: Option<i64>,
    pub weight: Option<i64>,
    pub auto_loadbalance: Option<bool>,
    pub healthcheck: Option<String>,
    pub shield: Option<String>,
    pub request_condition: Option<String>,
    pub ssl_cert_hostname: Option<String>,
    pub ssl_sni_hostname: Option<String>,
    pub ssl_check_cert: Option<bool>,
    pub min_tls_version: Option<String>,
    pub max_tls_version: Option<String>,
}

impl ToForm for BackendFields {
    fn to_form(&self) -> Form {
        Form::new()
            .optional("name", &self.name)
            .optional("address", &self.address)
            .optional("port", &self.port)
            .optional_bool("use_ssl", self.use_ssl)
            .optional("override_host", &self.override_host)
            .optional("comment", &self.comment)
            .optional("connect_timeout", &self.connect_timeout)
            .optional("first_byte_timeout", &self.first_byte_timeout)
            .optional("between_bytes_timeout", &self.between_bytes_timeout)
            .optional("max_conn", &self.max_conn)
            .optional("weight", &self.weight)
            .optional_bool("auto_loadbalance", self.auto_loadbalance)
            .optional("healthcheck", &self.healthcheck)
            .optional("shield", &self.shield)
            .optional("request_condition", &self.request_condition)
            .optional("ssl_cert_hostname", &self.ssl_cert_hostname)
            .optional("ssl_sni_hostname", &self.ssl_sni_hostname)
            .optional_bool("ssl_check_cert", self.ssl_check_cert)
            .optional("min_tls_version", &self.min_tls_version)
            .optional("max_tls_version", &self.max_tls_version)
    }
}

/// Fields accepted when creating or updating a health check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthCheckFields {
    pub name: Option<String>,
    pub comment: Option<String>,
    pub method: Option<String>,
    pub host: Option<String>,
    pub path: Option<String>,
    pub http_version: Option<String>,
    pub timeout: Option<i64>,
    pub check_interval: Option<i64>,
    pub expected_response: Option<i64>,
    pub window: Option<i64>,
    pub threshold: Option<i64>,
    pub initial: Option<i64>,
}

impl ToForm for HealthCheckFields {
    fn to_form(&self) -> Form {
        Form::new()
            .optional("name", &self.name)
            .optional("comment", &self.comment)
            .optional("method", &self.method)
            .optional("host", &self.host)
            .optional("path", &self.path)
            .optional("http_version", &self.http_version)
            .optional("timeout", &self.timeout)
            .optional("check_interval", &self.check_interval)
            .optional("expected_response", &self.expected_response)
            .optional("window", &self.window)
            .optional("threshold", &self.threshold)
            .optional("initial", &self.initial)
    }
}

/// Fields accepted when creating or updating a dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryFields {
    pub name: Option<String>,
    pub write_only: Option<bool>,
}

impl ToForm for DictionaryFields {
    fn to_form(&self) -> Form {
        Form::new()
            .optional("name", &self.name)
            .optional_bool("write_only", self.write_only)
    }
}

/// Fields accepted when creating or updating a logging endpoint.
///
/// Vendor specific settings are keyed by their API field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingFields {
    pub name: Option<String>,
    pub format: Option<String>,
    pub format_version: Option<i64>,
    pub placement: Option<String>,
    pub response_condition: Option<String>,
    pub settings: BTreeMap<String, String>,
}

impl LoggingFields {
    /// Record a vendor setting when the flag was provided.
    pub fn set<T: ToString>(&mut self, key: &str, value: &Option<T>) {
        if let Some(v) = value {
            self.settings.insert(key.to_string(), v.to_string());
        }
    }
}

impl ToForm for LoggingFields {
    fn to_form(&self) -> Form {
        let form = Form::new()
            .optional("name", &self.name)
            .optional("format", &self.format)
            .optional("format_version", &self.format_version)
            .optional("placement", &self.placement)
            .optional("response_condition", &self.response_condition);
        self.settings
            .iter()
            .fold(form, |form, (k, v)| form.field(k, v))
    }
}

/// Filters for listing versionless domains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainV1Query {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    pub fqdn: Option<String>,
    pub service_id: Option<String>,
    pub sort: Option<String>,
}

impl DomainV1Query {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(c) = &self.cursor {
            pairs.push(("cursor", c.clone()));
        }
        if let Some(l) = self.limit {
            pairs.push(("limit", l.to_string()));
        }
        if let Some(f) = &self.fqdn {
            pairs.push(("fqdn", f.clone()));
        }
        if let Some(s) = &self.service_id {
            pairs.push(("service_id", s.clone()));
        }
        if let Some(s) = &self.sort {
            pairs.push(("sort", s.clone()));
        }
        pairs
    }
}

/// JSON body for creating or updating a versionless domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainV1Fields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
}

/// JSON body for creating or updating a Next-Gen WAF workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkspaceFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_signal_thresholds: Option<AttackSignalThresholds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip_headers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_blocking_response_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_anonymization: Option<String>,
}

/// JSON body for creating or updating a Next-Gen WAF list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub list_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<ListScope>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_only_some_fields_when_encoding_then_unset_fields_are_omitted() {
        let fields = BackendFields {
            address: Some("www.test.com".into()),
            use_ssl: Some(true),
            port: Some(443),
            ..Default::default()
        };

        let form = fields.to_form();

        assert_eq!(
            form.pairs(),
            &[
                ("address".to_string(), "www.test.com".to_string()),
                ("port".to_string(), "443".to_string()),
                ("use_ssl".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn given_vendor_settings_when_encoding_then_appended_after_common_fields() {
        let mut fields = LoggingFields {
            name: Some("logs".into()),
            ..Default::default()
        };
        fields.set("bucket_name", &Some("my-bucket"));
        fields.set::<String>("path", &None);

        let form = fields.to_form();

        assert_eq!(form.get("name"), Some("logs"));
        assert_eq!(form.get("bucket_name"), Some("my-bucket"));
        assert_eq!(form.get("path"), None);
    }

    #[test]
    fn given_empty_workspace_update_when_serializing_then_body_is_empty_object() {
        let body = serde_json::to_string(&WorkspaceFields::default()).unwrap();
        assert_eq!(body, "{}");
    }
}
