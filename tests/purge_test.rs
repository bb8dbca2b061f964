//! Purge command

mod common;

use std::io::Write;

use common::TestEnv;
use fastly_cli::exitcode;
use fastly_cli::util::testing::FakeApi;

fn service() -> FakeApi {
    FakeApi::new().with_service("123", "example", &[(1, true, true)])
}

#[test]
fn given_all_and_soft_when_purging_then_usage_error_with_remediation() {
    // Arrange
    let env = TestEnv::new(service());

    // Act
    let (result, _) = env.run(&["purge", "-s", "123", "--all", "--soft"]);

    // Assert
    let err = result.unwrap_err();
    assert_eq!(err.exit_code(), exitcode::USAGE);
    assert_eq!(
        err.remediation().as_deref(),
        Some("The --soft flag should not be used with --all so retry command without it.")
    );
    assert!(env.api.requests().is_empty());
}

#[test]
fn given_all_when_purging_then_status_is_printed() {
    let env = TestEnv::new(service());

    let (result, out) = env.run(&["purge", "-s", "123", "--all"]);

    result.unwrap();
    assert_eq!(out, "SUCCESS: Purge all status: ok\n");
    assert_eq!(env.api.requests(), vec!["purge_all 123"]);
}

#[test]
fn given_soft_key_when_purging_then_soft_flag_is_forwarded() {
    // Arrange
    let env = TestEnv::new(service());

    // Act
    let (result, out) = env.run(&["purge", "-s", "123", "--key", "foo", "--soft"]);

    // Assert
    result.unwrap();
    assert_eq!(out, "SUCCESS: Purged key: foo (soft: true). Status: ok, ID: purge1\n");
    assert_eq!(env.api.requests(), vec!["purge_key 123 foo soft=true"]);
}

#[test]
fn given_url_when_purging_then_no_service_is_required() {
    let env = TestEnv::new(FakeApi::new());

    let (result, out) = env.run(&["purge", "--url", "https://example.com/a.css"]);

    result.unwrap();
    assert_eq!(
        out,
        "SUCCESS: Purged URL: https://example.com/a.css (soft: false). Status: ok, ID: purge1\n"
    );
}

#[test]
fn given_keys_file_when_purging_then_table_of_ids_is_printed() {
    // Arrange
    let env = TestEnv::new(service());
    let path = env.temp.path().join("keys.txt");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "foo\nbar\n\nbaz").unwrap();

    // Act
    let (result, out) = env.run(&["purge", "-s", "123", "--file", path.to_str().unwrap()]);

    // Assert
    result.unwrap();
    assert_eq!(env.api.requests(), vec!["purge_keys 123 foo,bar,baz soft=false"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("KEY"));
    // sorted by key
    assert!(lines[1].starts_with("bar"));
    assert!(lines[2].starts_with("baz"));
    assert!(lines[3].starts_with("foo"));
}

#[test]
fn given_no_purge_target_when_purging_then_usage_error() {
    let env = TestEnv::new(service());

    let (result, _) = env.run(&["purge", "-s", "123"]);

    assert_eq!(result.unwrap_err().exit_code(), exitcode::USAGE);
}
