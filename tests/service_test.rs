//! Service and service-version commands

mod common;

use common::TestEnv;
use fastly_cli::exitcode;
use fastly_cli::util::testing::FakeApi;

fn service() -> FakeApi {
    FakeApi::new().with_service("123", "example", &[(1, false, true), (2, true, true), (3, false, false)])
}

// ============================================================
// service
// ============================================================

#[test]
fn given_name_when_creating_service_then_id_is_printed() {
    let env = TestEnv::new(FakeApi::new());

    let (result, out) = env.run(&["service", "create", "--name", "new-service"]);

    result.unwrap();
    assert_eq!(out, "SUCCESS: Created service svc1\n");
    assert_eq!(env.api.state().services[0].name, "new-service");
}

#[test]
fn given_service_name_when_describing_then_resolved_by_name() {
    // Arrange
    let env = TestEnv::new(service());

    // Act
    let (result, out) = env.run(&["-v", "service", "describe", "--service-name", "example"]);

    // Assert
    result.unwrap();
    assert!(out.contains("INFO: Service ID (via --service-name): 123\n"));
    assert!(out.contains("ID: 123\nName: example\n"));
    assert!(out.contains("Version 3/3"));
}

#[test]
fn given_id_and_name_when_describing_then_conflicting_flags() {
    let env = TestEnv::new(service());

    let (result, _) = env.run(&["service", "describe", "-s", "123", "--service-name", "example"]);

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "cannot specify both service-id and service-name");
    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_nothing_to_change_when_updating_service_then_usage_error() {
    let env = TestEnv::new(service());

    let (result, _) = env.run(&["service", "update", "-s", "123"]);

    assert_eq!(result.unwrap_err().exit_code(), exitcode::USAGE);
    assert!(env.api.requests().is_empty());
}

#[test]
fn given_force_when_deleting_service_then_active_version_deactivated_first() {
    // Arrange
    let env = TestEnv::new(service());

    // Act
    let (result, out) = env.run(&["service", "delete", "-s", "123", "--force"]);

    // Assert
    result.unwrap();
    assert_eq!(out, "SUCCESS: Deleted service ID 123\n");
    assert_eq!(
        env.api.requests(),
        vec!["list_versions 123", "deactivate_version 123 2", "delete_service 123"]
    );
}

#[test]
fn given_no_force_when_deleting_service_then_no_deactivation() {
    let env = TestEnv::new(service());

    let (result, _) = env.run(&["service", "delete", "-s", "123"]);

    result.unwrap();
    assert_eq!(env.api.requests(), vec!["delete_service 123"]);
}

// ============================================================
// service-version
// ============================================================

#[test]
fn given_no_version_flag_when_cloning_then_active_version_is_cloned() {
    // Arrange
    let env = TestEnv::new(service());

    // Act
    let (result, out) = env.run(&["service-version", "clone", "-s", "123"]);

    // Assert
    result.unwrap();
    assert_eq!(out, "SUCCESS: Cloned service 123 version 2 to version 4\n");
}

#[test]
fn given_latest_when_activating_then_draft_is_activated() {
    let env = TestEnv::new(service());

    let (result, out) = env.run(&["service-version", "activate", "-s", "123", "--version", "latest"]);

    result.unwrap();
    assert_eq!(out, "SUCCESS: Activated service 123 version 3\n");
    let state = env.api.state();
    let versions = &state.versions["123"];
    assert!(versions.iter().find(|v| v.number == 3).unwrap().active);
    assert!(!versions.iter().find(|v| v.number == 2).unwrap().active);
}

#[test]
fn given_locked_version_when_activating_without_autoclone_then_activated_in_place() {
    let env = TestEnv::new(service());

    let (result, out) = env.run(&["service-version", "activate", "-s", "123", "--version", "1"]);

    result.unwrap();
    assert_eq!(out, "SUCCESS: Activated service 123 version 1\n");
    assert!(!env.api.requests().iter().any(|r| r.starts_with("clone_version")));
}

#[test]
fn given_locked_version_when_updating_comment_with_autoclone_then_clone_is_updated() {
    // Arrange
    let env = TestEnv::new(service());

    // Act
    let (result, out) = env.run(&[
        "service-version", "update", "-s", "123", "--version", "2", "--autoclone",
        "--comment", "new config",
    ]);

    // Assert
    result.unwrap();
    assert_eq!(out, "SUCCESS: Updated service 123 version 4\n");
    let state = env.api.state();
    let clone = state.versions["123"].iter().find(|v| v.number == 4).unwrap();
    assert_eq!(clone.comment.as_deref(), Some("new config"));
}

#[test]
fn given_unknown_version_when_locking_then_not_found() {
    let env = TestEnv::new(service());

    let (result, _) = env.run(&["service-version", "lock", "-s", "123", "--version", "9"]);

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "specified service version not found: 9");
    assert_eq!(err.exit_code(), exitcode::DATAERR);
}

#[test]
fn given_invalid_version_selector_when_parsing_then_rejected() {
    let result = <fastly_cli::cli::Cli as clap::Parser>::try_parse_from([
        "fastly", "service-version", "lock", "-s", "123", "--version", "newest",
    ]);

    assert!(result.is_err());
}

#[test]
fn given_versions_when_listing_then_sorted_table() {
    // Arrange
    let env = TestEnv::new(service());

    // Act
    let (result, out) = env.run(&["service-version", "list", "-s", "123"]);

    // Assert
    result.unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "NUMBER  ACTIVE  LAST EDITED (UTC)");
    assert!(lines[1].starts_with("1       false"));
    assert!(lines[2].starts_with("2       true"));
    assert!(lines[3].starts_with("3       false"));
}
