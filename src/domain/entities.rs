//! Domain entities: mirrors of the Fastly API resource schemas

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A Fastly service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub comment: Option<String>,
    pub customer_id: Option<String>,
    /// Active version number, as reported by the list endpoint.
    pub version: Option<i64>,
    pub versions: Vec<Version>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub deleted_at: Option<String>,
}

/// A service configuration version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Version {
    pub number: i64,
    pub service_id: String,
    pub active: bool,
    pub locked: bool,
    pub deployed: bool,
    pub staging: bool,
    pub testing: bool,
    pub comment: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Version {
    /// Active and locked versions are immutable.
    pub fn is_editable(&self) -> bool {
        !self.active && !self.locked
    }
}

/// A domain attached to a service version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Domain {
    pub name: String,
    pub comment: Option<String>,
    pub service_id: String,
    pub version: i64,
}

/// Result of checking a domain's DNS configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainValidation {
    pub domain: Domain,
    pub cname: String,
    pub valid: bool,
}

/// A versionless domain (`/domains/v1`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainV1 {
    pub id: String,
    pub fqdn: String,
    pub service_id: Option<String>,
    pub activated: Option<bool>,
    pub verified: Option<bool>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Cursor metadata returned by paginated v1 endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    pub next_cursor: Option<String>,
    pub limit: Option<i64>,
    pub total: Option<i64>,
}

/// A page of items from a cursor-paginated endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// A backend (origin server).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Backend {
    pub name: String,
    pub service_id: String,
    pub version: i64,
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

/// A health check probing backends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheck {
    pub name: String,
    pub service_id: String,
    pub version: i64,
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

/// An edge dictionary container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dictionary {
    pub id: String,
    pub name: String,
    pub service_id: String,
    pub version: i64,
    pub write_only: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// A key/value pair stored in an edge dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryItem {
    pub dictionary_id: String,
    pub service_id: String,
    pub item_key: String,
    pub item_value: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Operation applied to one entry of a batch dictionary update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchOperation {
    Create,
    Update,
    Upsert,
    Delete,
}

/// One entry of a batch dictionary update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryItemBatch {
    pub op: BatchOperation,
    pub item_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_value: Option<String>,
}

/// Logging vendors supported by the `logging` command group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoggingKind {
    Gcs,
    S3,
    Syslog,
    Https,
    Datadog,
    Splunk,
}

impl LoggingKind {
    /// Path segment used by the API (`/logging/<segment>`).
    pub fn api_path(&self) -> &'static str {
        match self {
            LoggingKind::Gcs => "gcs",
            LoggingKind::S3 => "s3",
            LoggingKind::Syslog => "syslog",
            LoggingKind::Https => "https",
            LoggingKind::Datadog => "datadog",
            LoggingKind::Splunk => "splunk",
        }
    }

    /// Human readable vendor name used in command output.
    pub fn display_name(&self) -> &'static str {
        match self {
            LoggingKind::Gcs => "GCS",
            LoggingKind::S3 => "S3",
            LoggingKind::Syslog => "Syslog",
            LoggingKind::Https => "HTTPS",
            LoggingKind::Datadog => "Datadog",
            LoggingKind::Splunk => "Splunk",
        }
    }
}

/// A logging endpoint of any vendor.
///
/// Common fields are typed; vendor specific settings are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEndpoint {
    pub name: String,
    pub service_id: String,
    pub version: i64,
    pub format: Option<String>,
    pub format_version: Option<i64>,
    pub placement: Option<String>,
    pub response_condition: Option<String>,
    #[serde(flatten)]
    pub settings: BTreeMap<String, serde_json::Value>,
}

/// Response of a purge request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurgeResult {
    pub status: String,
    pub id: Option<String>,
}

/// Customer reference inside a `/verify` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyCustomer {
    pub id: String,
    pub name: String,
}

/// User reference inside a `/verify` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyUser {
    pub id: String,
    pub name: String,
    pub login: String,
}

/// Token identity as reported by `/verify`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Verify {
    pub customer: VerifyCustomer,
    pub user: VerifyUser,
    pub services: BTreeMap<String, String>,
}

/// The token used for the current request (`/tokens/self`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenInfo {
    pub id: String,
    pub name: Option<String>,
    pub user_id: String,
    pub scope: Option<String>,
    pub expires_at: Option<String>,
    pub created_at: Option<String>,
}

/// A Fastly user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub login: String,
    pub name: String,
    pub customer_id: Option<String>,
    pub role: Option<String>,
}

/// Attack signal thresholds of a Next-Gen WAF workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackSignalThresholds {
    pub immediate: bool,
    pub one_minute: i64,
    pub ten_minutes: i64,
    pub one_hour: i64,
}

impl std::str::FromStr for AttackSignalThresholds {
    type Err = crate::domain::DomainError;

    /// Parse `Immediate:OneMinute:TenMinutes:OneHour`, e.g. `true:1000:2000:3000`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || crate::domain::DomainError::InvalidThresholds(s.to_string());
        let parts: Vec<&str> = s.split(':').collect();
        let [immediate, one_minute, ten_minutes, one_hour] = parts.as_slice() else {
            return Err(invalid());
        };
        Ok(Self {
            immediate: parse_flag(immediate).ok_or_else(invalid)?,
            one_minute: one_minute.parse().map_err(|_| invalid())?,
            ten_minutes: ten_minutes.parse().map_err(|_| invalid())?,
            one_hour: one_hour.parse().map_err(|_| invalid())?,
        })
    }
}

/// Accepts the spellings `1`, `t`, `true` and `0`, `f`, `false` in any of
/// lower, upper or title case.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// A Next-Gen WAF workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub description: String,
    pub mode: String,
    pub attack_signal_thresholds: AttackSignalThresholds,
    pub ip_anonymization: Option<String>,
    pub client_ip_headers: Vec<String>,
    pub default_blocking_response_code: Option<i64>,
    pub default_redirect_url: Option<String>,
    pub created_at: Option<String>,
}

/// Scope of a Next-Gen WAF list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListScope {
    #[serde(rename = "type")]
    pub scope_type: String,
    pub applies_to: Vec<String>,
}

/// A Next-Gen WAF list (IP, string, country...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NgwafList {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub list_type: String,
    pub entries: Vec<String>,
    pub scope: ListScope,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn given_valid_thresholds_when_parsing_then_fields_are_set() {
        let t: AttackSignalThresholds = "true:1000:2000:3000".parse().unwrap();
        assert!(t.immediate);
        assert_eq!(t.one_minute, 1000);
        assert_eq!(t.ten_minutes, 2000);
        assert_eq!(t.one_hour, 3000);
    }

    #[rstest]
    #[case("1", true)]
    #[case("T", true)]
    #[case("True", true)]
    #[case("TRUE", true)]
    #[case("0", false)]
    #[case("f", false)]
    #[case("False", false)]
    fn given_alternate_immediate_spelling_when_parsing_then_accepted(
        #[case] immediate: &str,
        #[case] expected: bool,
    ) {
        let t: AttackSignalThresholds = format!("{immediate}:1:2:3").parse().unwrap();
        assert_eq!(t.immediate, expected);
    }

    #[rstest]
    #[case("yes:1:2:3")]
    #[case("tRuE:1:2:3")]
    fn given_unknown_immediate_spelling_when_parsing_then_error(#[case] raw: &str) {
        assert!(raw.parse::<AttackSignalThresholds>().is_err());
    }

    #[test]
    fn given_three_thresholds_when_parsing_then_error() {
        let result = "true:1000:2000".parse::<AttackSignalThresholds>();
        assert!(result.is_err());
    }

    #[test]
    fn given_logging_json_when_deserializing_then_vendor_fields_are_kept() {
        let json = r#"{"name":"logs","service_id":"123","version":2,"bucket_name":"b","period":3600}"#;
        let endpoint: LoggingEndpoint = serde_json::from_str(json).unwrap();
        assert_eq!(endpoint.name, "logs");
        assert_eq!(endpoint.settings.get("bucket_name"), Some(&serde_json::json!("b")));
        assert_eq!(endpoint.settings.get("period"), Some(&serde_json::json!(3600)));
    }
}
