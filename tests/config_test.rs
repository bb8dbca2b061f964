//! Configuration precedence as seen by commands

mod common;

use std::fs;

use common::TestEnv;
use fastly_cli::config::{EnvOverrides, Manifest, Settings};
use fastly_cli::exitcode;
use fastly_cli::util::testing::FakeApi;

fn service() -> FakeApi {
    FakeApi::new()
        .with_service("from-manifest", "a", &[(1, true, true)])
        .with_service("from-env", "b", &[(1, true, true)])
}

#[test]
fn given_manifest_service_id_when_running_then_manifest_is_reported_as_source() {
    // Arrange
    let mut env = TestEnv::new(service());
    env.manifest = Manifest {
        service_id: Some("from-manifest".into()),
        ..Default::default()
    };

    // Act
    let (result, out) = env.run(&["-v", "service-version", "list"]);

    // Assert
    result.unwrap();
    assert!(out.starts_with(
        "INFO: Fastly API token provided via FASTLY_API_TOKEN\n\
         INFO: Fastly API endpoint: https://api.fastly.com\n\
         INFO: Service ID (via fastly.toml): from-manifest\n"
    ));
}

#[test]
fn given_env_and_manifest_service_id_when_running_then_env_wins() {
    // Arrange
    let mut env = TestEnv::new(service());
    env.manifest.service_id = Some("from-manifest".into());
    env.env.service_id = Some("from-env".into());

    // Act
    let (result, out) = env.run(&["-v", "service-version", "list"]);

    // Assert
    result.unwrap();
    assert!(out.contains("INFO: Service ID (via FASTLY_SERVICE_ID): from-env\n"));
    assert_eq!(env.api.requests(), vec!["list_versions from-env"]);
}

#[test]
fn given_flag_and_env_service_id_when_running_then_flag_wins() {
    let mut env = TestEnv::new(service());
    env.env.service_id = Some("from-env".into());

    let (result, _) = env.run(&["service-version", "list", "-s", "from-manifest"]);

    result.unwrap();
    assert_eq!(env.api.requests(), vec!["list_versions from-manifest"]);
}

#[test]
fn given_token_and_endpoint_flags_when_verbose_then_both_sources_reported() {
    // Arrange
    let env = TestEnv::without_token(service());

    // Act
    let (result, out) = env.run(&[
        "--verbose", "--token", "abc", "--endpoint", "http://127.0.0.1:8080", "service-version",
        "list", "-s", "from-env",
    ]);

    // Assert
    result.unwrap();
    assert!(out.starts_with(
        "INFO: Fastly API token provided via --token\n\
         INFO: Fastly API endpoint (via --endpoint): http://127.0.0.1:8080\n"
    ));
}

#[test]
fn given_no_token_when_verbose_then_missing_token_reported_before_failing() {
    let env = TestEnv::without_token(service());

    let (result, out) = env.run(&["-v", "service-version", "list", "-s", "from-env"]);

    assert_eq!(result.unwrap_err().exit_code(), exitcode::NOPERM);
    assert!(out.starts_with("INFO: Fastly API token not provided\n"));
}

#[test]
fn given_verbose_when_printing_version_then_no_credential_lines() {
    let env = TestEnv::new(service());

    let (result, out) = env.run(&["-v", "version"]);

    result.unwrap();
    assert!(!out.contains("Fastly API token"));
}

#[test]
fn given_malformed_config_file_when_loading_then_config_error() {
    // Arrange
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(&path, "[fastly\napi_endpoint = ").unwrap();

    // Act
    let result = Settings::load_from(&path, EnvOverrides::default(), Manifest::default());

    // Assert
    let err = fastly_cli::cli::CliError::from(result.unwrap_err());
    assert_eq!(err.exit_code(), exitcode::CONFIG);
}

#[test]
fn given_missing_config_file_when_loading_then_defaults_and_nothing_written() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("fastly").join("config.toml");

    let settings = Settings::load_from(&path, EnvOverrides::default(), Manifest::default()).unwrap();

    assert!(settings.file.profile.is_empty());
    assert_eq!(settings.config_dir(), temp.path().join("fastly"));
    assert!(!path.exists());
}

#[test]
fn given_saved_last_checked_when_reloading_then_timestamp_survives() {
    // Arrange
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    let mut settings = Settings::load_from(&path, EnvOverrides::default(), Manifest::default()).unwrap();
    let now = chrono::Utc::now();
    settings.file.cli.last_checked = Some(now);

    // Act
    settings.save().unwrap();
    let reloaded = Settings::load_from(&path, EnvOverrides::default(), Manifest::default()).unwrap();

    // Assert
    assert_eq!(
        reloaded.file.cli.last_checked.map(|t| t.timestamp()),
        Some(now.timestamp())
    );
}
