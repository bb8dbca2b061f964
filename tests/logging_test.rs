//! Logging endpoint commands across vendors

mod common;

use std::collections::BTreeMap;

use common::TestEnv;
use fastly_cli::domain::{LoggingEndpoint, LoggingKind};
use fastly_cli::exitcode;
use fastly_cli::util::testing::FakeApi;
use rstest::rstest;

fn service() -> FakeApi {
    FakeApi::new().with_service("123", "example", &[(1, true, true), (2, false, false)])
}

fn endpoint(name: &str, version: i64) -> LoggingEndpoint {
    let mut settings = BTreeMap::new();
    settings.insert("bucket_name".to_string(), serde_json::json!("my-logs"));
    LoggingEndpoint {
        name: name.into(),
        service_id: "123".into(),
        version,
        format: Some("%h %l %u".into()),
        settings,
        ..Default::default()
    }
}

#[test]
fn given_gcs_flags_when_creating_then_vendor_fields_are_sent() {
    // Arrange
    let env = TestEnv::new(service());

    // Act
    let (result, out) = env.run(&[
        "logging", "gcs", "create", "-s", "123", "--version", "2", "--name", "logs",
        "--bucket", "my-logs", "--user", "svc@example.iam", "--secret-key", "s3cr3t",
        "--period", "3600",
    ]);

    // Assert
    result.unwrap();
    assert_eq!(out, "SUCCESS: Created GCS logging endpoint logs (service 123 version 2)\n");
    let state = env.api.state();
    assert_eq!(state.requests.last().unwrap(), "create_logging gcs 123 2");
    let form = state.last_form.as_ref().unwrap();
    assert_eq!(form.get("name"), Some("logs"));
    assert_eq!(form.get("bucket_name"), Some("my-logs"));
    assert_eq!(form.get("user"), Some("svc@example.iam"));
    assert_eq!(form.get("period"), Some("3600"));
    assert_eq!(form.get("gzip_level"), None);
}

#[test]
fn given_gzip_level_and_codec_when_creating_then_rejected_before_any_request() {
    // Arrange
    let env = TestEnv::new(service());

    // Act
    let (result, _) = env.run(&[
        "logging", "s3", "create", "-s", "123", "--version", "2", "--name", "logs",
        "--gzip-level", "9", "--compression-codec", "zstd",
    ]);

    // Assert
    let err = result.unwrap_err();
    assert_eq!(err.exit_code(), exitcode::USAGE);
    assert!(env.api.requests().is_empty());
}

#[test]
fn given_iam_role_and_access_key_when_creating_s3_then_mutually_exclusive_error() {
    let env = TestEnv::new(service());

    let (result, _) = env.run(&[
        "logging", "s3", "create", "-s", "123", "--version", "2", "--name", "logs",
        "--iam-role", "arn:aws:iam::123:role/logs", "--access-key", "AKIA",
    ]);

    assert_eq!(
        result.unwrap_err().to_string(),
        "the --access-key and --secret-key flags are mutually exclusive with the --iam-role flag"
    );
}

#[rstest]
#[case::gcs(&["logging", "gcs"], LoggingKind::Gcs, "GCS")]
#[case::datadog(&["logging", "datadog"], LoggingKind::Datadog, "Datadog")]
#[case::splunk(&["logging", "splunk"], LoggingKind::Splunk, "Splunk")]
fn given_vendor_endpoint_when_deleting_then_vendor_named_in_message(
    #[case] prefix: &[&str],
    #[case] kind: LoggingKind,
    #[case] vendor: &str,
) {
    // Arrange
    let env = TestEnv::new(service().with_logging(kind, endpoint("logs", 2)));
    let mut args = prefix.to_vec();
    args.extend(["delete", "-s", "123", "--version", "2", "--name", "logs"]);

    // Act
    let (result, out) = env.run(&args);

    // Assert
    result.unwrap();
    assert_eq!(
        out,
        format!("SUCCESS: Deleted {vendor} logging endpoint logs (service 123 version 2)\n")
    );
    assert!(env.api.state().logging.is_empty());
}

#[test]
fn given_endpoint_of_other_vendor_when_deleting_then_not_found() {
    let env = TestEnv::new(service().with_logging(LoggingKind::S3, endpoint("logs", 2)));

    let (result, _) = env.run(&["logging", "gcs", "delete", "-s", "123", "--version", "2", "--name", "logs"]);

    assert!(result.unwrap_err().to_string().contains("Record not found: logs"));
    assert_eq!(env.api.state().logging.len(), 1);
}

#[test]
fn given_endpoint_when_describing_then_settings_are_listed() {
    // Arrange
    let env = TestEnv::new(service().with_logging(LoggingKind::Gcs, endpoint("logs", 1)));

    // Act
    let (result, out) = env.run(&["logging", "gcs", "describe", "-s", "123", "--version", "1", "--name", "logs"]);

    // Assert
    result.unwrap();
    assert!(out.starts_with("Service ID: 123\nVersion: 1\nName: logs\n"));
    assert!(out.contains("Format: %h %l %u\n"));
    assert!(out.contains("bucket_name: my-logs\n"));
}

#[test]
fn given_endpoint_when_updating_with_new_name_then_renamed() {
    // Arrange
    let env = TestEnv::new(service().with_logging(LoggingKind::Datadog, endpoint("logs", 2)));

    // Act
    let (result, out) = env.run(&[
        "logging", "datadog", "update", "-s", "123", "--version", "2", "--name", "logs",
        "--new-name", "dd", "--region", "EU",
    ]);

    // Assert
    result.unwrap();
    assert_eq!(out, "SUCCESS: Updated Datadog logging endpoint dd (service 123 version 2)\n");
    let state = env.api.state();
    assert_eq!(state.logging[0].1.name, "dd");
    assert_eq!(state.last_form.as_ref().unwrap().get("region"), Some("EU"));
}
