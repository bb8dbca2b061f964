//! Versionless domain commands

mod common;

use common::TestEnv;
use fastly_cli::domain::DomainV1;
use fastly_cli::util::testing::FakeApi;

fn domain(id: &str, fqdn: &str, service_id: Option<&str>) -> DomainV1 {
    DomainV1 {
        id: id.into(),
        fqdn: fqdn.into(),
        service_id: service_id.map(String::from),
        ..Default::default()
    }
}

#[test]
fn given_fqdn_and_service_when_creating_then_both_ids_are_printed() {
    let env = TestEnv::new(FakeApi::new());

    let (result, out) = env.run(&["domain-v1", "create", "--fqdn", "www.example.com", "-s", "123"]);

    result.unwrap();
    assert_eq!(
        out,
        "SUCCESS: Created domain 'www.example.com' (domain-id: dom1, service-id: 123)\n"
    );
}

#[test]
fn given_fqdn_only_when_creating_then_service_id_is_omitted() {
    let env = TestEnv::new(FakeApi::new());

    let (result, out) = env.run(&["domain-v1", "create", "--fqdn", "www.example.com"]);

    result.unwrap();
    assert_eq!(out, "SUCCESS: Created domain 'www.example.com' (domain-id: dom1)\n");
}

#[test]
fn given_domains_when_listing_with_fqdn_filter_then_only_match_is_shown() {
    // Arrange
    let api = FakeApi::new()
        .with_domain_v1(domain("d1", "a.example.com", Some("123")))
        .with_domain_v1(domain("d2", "b.example.com", None));
    let env = TestEnv::new(api);

    // Act
    let (result, out) = env.run(&["domain-v1", "list", "--fqdn", "b.example.com", "--json"]);

    // Assert
    result.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    let items = parsed.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "d2");
}

#[test]
fn given_domain_when_updating_service_then_new_service_is_printed() {
    let env = TestEnv::new(FakeApi::new().with_domain_v1(domain("d1", "a.example.com", None)));

    let (result, out) = env.run(&["domain-v1", "update", "--domain-id", "d1", "-s", "456"]);

    result.unwrap();
    assert_eq!(
        out,
        "SUCCESS: Updated domain 'a.example.com' (domain-id: d1, service-id: 456)\n"
    );
}

#[test]
fn given_json_when_deleting_then_deleted_marker_is_printed() {
    // Arrange
    let env = TestEnv::new(FakeApi::new().with_domain_v1(domain("d1", "a.example.com", None)));

    // Act
    let (result, out) = env.run(&["domain-v1", "delete", "--domain-id", "d1", "--json"]);

    // Assert
    result.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed, serde_json::json!({ "id": "d1", "deleted": true }));
    assert!(env.api.state().domains_v1.is_empty());
}

#[test]
fn given_domain_when_deleting_then_id_is_printed() {
    let env = TestEnv::new(FakeApi::new().with_domain_v1(domain("d1", "a.example.com", None)));

    let (result, out) = env.run(&["domain-v1", "delete", "--domain-id", "d1"]);

    result.unwrap();
    assert_eq!(out, "SUCCESS: Deleted domain (domain-id: d1)\n");
}
