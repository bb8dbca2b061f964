//! Next-Gen WAF workspace and IP list commands

mod common;

use common::TestEnv;
use fastly_cli::domain::{ListScope, NgwafList, Workspace};
use fastly_cli::util::testing::FakeApi;

fn workspace() -> Workspace {
    Workspace {
        id: "ws-1".into(),
        name: "prod".into(),
        description: "production".into(),
        mode: "log".into(),
        ..Default::default()
    }
}

#[test]
fn given_thresholds_and_headers_when_creating_workspace_then_parsed_into_request() {
    // Arrange
    let env = TestEnv::new(FakeApi::new());

    // Act
    let (result, out) = env.run(&[
        "ngwaf", "workspace", "create", "--name", "prod", "--description", "production",
        "--blocking-mode", "block", "--attack-thresholds", "true:10:20:30",
        "--client-ip-headers", "X-Forwarded-For:X-Real-IP",
    ]);

    // Assert
    result.unwrap();
    assert_eq!(out, "SUCCESS: Created workspace 'prod' (workspace-id: ws1)\n");
    let state = env.api.state();
    let ws = &state.workspaces[0];
    assert_eq!(ws.mode, "block");
    assert!(ws.attack_signal_thresholds.immediate);
    assert_eq!(ws.attack_signal_thresholds.one_minute, 10);
    assert_eq!(ws.attack_signal_thresholds.one_hour, 30);
    assert_eq!(ws.client_ip_headers, vec!["X-Forwarded-For", "X-Real-IP"]);
}

#[test]
fn given_malformed_thresholds_when_parsing_then_rejected() {
    let result = <fastly_cli::cli::Cli as clap::Parser>::try_parse_from([
        "fastly", "ngwaf", "workspace", "create", "--name", "prod", "--description", "d",
        "--blocking-mode", "block", "--attack-thresholds", "true:10",
    ]);

    assert!(result.is_err());
}

#[test]
fn given_workspaces_when_listing_with_limit_then_truncated() {
    // Arrange
    let second = Workspace {
        id: "ws-2".into(),
        name: "staging".into(),
        ..workspace()
    };
    let env = TestEnv::new(FakeApi::new().with_workspace(workspace()).with_workspace(second));

    // Act
    let (result, out) = env.run(&["ngwaf", "workspace", "list", "--limit", "1"]);

    // Assert
    result.unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("ID"));
    assert!(lines[1].starts_with("ws-1"));
}

#[test]
fn given_workspace_when_updating_mode_then_other_fields_unchanged() {
    let env = TestEnv::new(FakeApi::new().with_workspace(workspace()));

    let (result, out) = env.run(&[
        "ngwaf", "workspace", "update", "--workspace-id", "ws-1", "--blocking-mode", "block",
    ]);

    result.unwrap();
    assert_eq!(out, "SUCCESS: Updated workspace 'prod' (workspace-id: ws-1)\n");
    let state = env.api.state();
    assert_eq!(state.workspaces[0].mode, "block");
    assert_eq!(state.workspaces[0].description, "production");
}

#[test]
fn given_workspace_when_deleting_then_id_is_printed() {
    let env = TestEnv::new(FakeApi::new().with_workspace(workspace()));

    let (result, out) = env.run(&["ngwaf", "workspace", "delete", "--workspace-id", "ws-1"]);

    result.unwrap();
    assert_eq!(out, "SUCCESS: Deleted workspace (id: ws-1)\n");
    assert!(env.api.state().workspaces.is_empty());
}

#[test]
fn given_entries_when_creating_ip_list_then_scoped_to_workspace() {
    // Arrange
    let env = TestEnv::new(FakeApi::new().with_workspace(workspace()));

    // Act
    let (result, out) = env.run(&[
        "ngwaf", "iplist", "create", "--workspace-id", "ws-1", "--name", "blocked",
        "--entries", "10.0.0.1, 10.0.0.2",
    ]);

    // Assert
    result.unwrap();
    assert_eq!(out, "SUCCESS: Created Workspace IP List 'blocked' (list id: list1)\n");
    let state = env.api.state();
    let list = &state.lists["ws-1"][0];
    assert_eq!(list.list_type, "ip");
    assert_eq!(list.entries, vec!["10.0.0.1", "10.0.0.2"]);
    assert_eq!(list.scope.scope_type, "workspace");
    assert_eq!(list.scope.applies_to, vec!["ws-1"]);
}

#[test]
fn given_mixed_list_types_when_listing_ip_lists_then_only_ip_lists_shown() {
    // Arrange
    let env = TestEnv::new(FakeApi::new().with_workspace(workspace()));
    {
        let mut state = env.api.state();
        let scope = ListScope {
            scope_type: "workspace".into(),
            applies_to: vec!["ws-1".into()],
        };
        state.lists.insert(
            "ws-1".into(),
            vec![
                NgwafList {
                    id: "l1".into(),
                    name: "ips".into(),
                    list_type: "ip".into(),
                    entries: vec!["10.0.0.1".into()],
                    scope: scope.clone(),
                    ..Default::default()
                },
                NgwafList {
                    id: "l2".into(),
                    name: "countries".into(),
                    list_type: "country".into(),
                    entries: vec!["DE".into()],
                    scope,
                    ..Default::default()
                },
            ],
        );
    }

    // Act
    let (result, out) = env.run(&["ngwaf", "iplist", "list", "--workspace-id", "ws-1", "--json"]);

    // Assert
    result.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    let items = parsed.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "l1");
}

#[test]
fn given_ip_list_when_deleting_with_json_then_deleted_marker() {
    // Arrange
    let env = TestEnv::new(FakeApi::new().with_workspace(workspace()));
    env.run(&[
        "ngwaf", "iplist", "create", "--workspace-id", "ws-1", "--name", "blocked",
        "--entries", "10.0.0.1",
    ])
    .0
    .unwrap();

    // Act
    let (result, out) = env.run(&[
        "ngwaf", "iplist", "delete", "--workspace-id", "ws-1", "--list-id", "list1", "--json",
    ]);

    // Assert
    result.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed, serde_json::json!({ "id": "list1", "deleted": true }));
}
