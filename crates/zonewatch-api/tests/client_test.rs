#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zonewatch_api::types::{AnalyticsData, FirewallEventGroup, ZoneResponse};
use zonewatch_api::{ApiClient, CredentialResolver, Error};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient, Arc<CredentialResolver>) {
    let server = MockServer::start().await;
    let credentials = Arc::new(CredentialResolver::override_only());
    credentials.set_override("test-token", None);
    let client = ApiClient::with_client(
        reqwest::Client::new(),
        &format!("{}/client/v4", server.uri()),
        Arc::clone(&credentials),
    )
    .unwrap();
    (server, client, credentials)
}

fn zones_page(ids: &[&str]) -> serde_json::Value {
    let result: Vec<_> = ids
        .iter()
        .map(|id| json!({ "id": id, "name": format!("{id}.example"), "status": "active" }))
        .collect();
    json!({
        "success": true,
        "errors": [],
        "result": result,
        "result_info": { "page": 1, "per_page": 2, "count": ids.len() }
    })
}

fn zones_mock(page: &str, ids: &[&str]) -> Mock {
    Mock::given(method("GET"))
        .and(path("/client/v4/zones"))
        .and(query_param("page", page))
        .and(query_param("per_page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zones_page(ids)))
}

// ── Pagination ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_pagination_walks_until_short_page() {
    let (server, client, _) = setup().await;

    zones_mock("1", &["a", "b"]).expect(1).mount(&server).await;
    zones_mock("2", &["c", "d"]).expect(1).mount(&server).await;
    zones_mock("3", &["e"]).expect(1).mount(&server).await;

    let zones: Vec<ZoneResponse> = client.list_all("zones", 2).await.unwrap();

    let ids: Vec<_> = zones.iter().map(|z| z.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
}

#[tokio::test]
async fn test_full_page_is_always_polled_again() {
    let (server, client, _) = setup().await;

    zones_mock("1", &["a", "b"]).expect(1).mount(&server).await;
    zones_mock("2", &[]).expect(1).mount(&server).await;

    let zones: Vec<ZoneResponse> = client.list_all("zones", 2).await.unwrap();
    assert_eq!(zones.len(), 2);
}

#[tokio::test]
async fn test_list_zones_sends_bearer_token() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/client/v4/zones"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("per_page", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": [{
                "id": "z1",
                "name": "example.com",
                "status": "active",
                "plan": { "name": "Pro Plan" }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let zones = client.list_zones().await.unwrap();
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0].name, "example.com");
    assert_eq!(
        zones[0].plan.as_ref().and_then(|p| p.name.as_deref()),
        Some("Pro Plan")
    );
}

#[tokio::test]
async fn test_override_applies_to_next_call() {
    let (server, client, credentials) = setup().await;

    Mock::given(method("GET"))
        .and(path("/client/v4/zones"))
        .and(header("authorization", "Bearer rotated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zones_page(&[])))
        .expect(1)
        .mount(&server)
        .await;

    credentials.set_override("rotated", None);
    client.list_zones().await.unwrap();
}

// ── Error mapping ───────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_token_fails_before_network() {
    let (server, client, credentials) = setup().await;
    credentials.clear_override();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(matches!(
        client.list_zones().await,
        Err(Error::NotAuthenticated)
    ));
    assert!(matches!(
        client.graphql::<serde_json::Value>("{ viewer { zones { groups } } }", &json!({})).await,
        Err(Error::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_structured_error_surfaces_first_message() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/client/v4/zones"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "success": false,
            "errors": [
                { "code": 9109, "message": "Invalid access token" },
                { "code": 1000, "message": "second" }
            ]
        })))
        .mount(&server)
        .await;

    let err = client.list_zones().await.unwrap_err();
    match err {
        Error::Api { message, status } => {
            assert_eq!(message, "Invalid access token");
            assert_eq!(status, Some(403));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unstructured_error_is_http_status() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/client/v4/zones"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    assert!(matches!(
        client.list_zones().await,
        Err(Error::Http { status: 502 })
    ));
}

#[tokio::test]
async fn test_unsuccessful_envelope_with_200_is_api_error() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/client/v4/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errors": [{ "code": 6003, "message": "Invalid request headers" }],
            "result": null
        })))
        .mount(&server)
        .await;

    let result = client.list_zones().await;
    assert!(
        matches!(
            result,
            Err(Error::Api { ref message, .. }) if message == "Invalid request headers"
        ),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn test_malformed_success_body_is_decode_error() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/client/v4/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    assert!(matches!(
        client.list_zones().await,
        Err(Error::Decode { .. })
    ));
}

#[tokio::test]
async fn test_unreachable_host_is_invalid_response() {
    let credentials = Arc::new(CredentialResolver::override_only());
    credentials.set_override("tok", None);
    let client =
        ApiClient::with_client(reqwest::Client::new(), "http://127.0.0.1:9/", credentials).unwrap();

    assert!(matches!(
        client.list_zones().await,
        Err(Error::InvalidResponse(_))
    ));
}

// ── GraphQL ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_graphql_posts_query_and_variables() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/client/v4/graphql"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "variables": { "zoneTag": "z1", "limit": 20 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "viewer": { "zones": [{ "groups": [
                { "count": 9, "dimensions": { "clientIP": "198.51.100.1" } }
            ]}]}},
            "errors": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data: AnalyticsData<FirewallEventGroup> = client
        .graphql("query { viewer { zones { groups } } }", &json!({ "zoneTag": "z1", "limit": 20 }))
        .await
        .unwrap();

    let groups = data.zone_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].count, 9);
}

#[tokio::test]
async fn test_graphql_partial_data_is_not_an_error() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/client/v4/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "viewer": { "zones": [{ "groups": [{ "count": 3 }] }] } },
            "errors": [{ "message": "quota exceeded for one field" }]
        })))
        .mount(&server)
        .await;

    let data: AnalyticsData<FirewallEventGroup> =
        client.graphql("query {}", &json!({})).await.unwrap();
    assert_eq!(data.zone_groups().len(), 1);
}

#[tokio::test]
async fn test_graphql_errors_without_data_fail() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/client/v4/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "zone not authorized" }]
        })))
        .mount(&server)
        .await;

    let result = client
        .graphql::<AnalyticsData<FirewallEventGroup>>("query {}", &json!({}))
        .await;
    assert!(
        matches!(result, Err(Error::Api { ref message, .. }) if message == "zone not authorized"),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn test_graphql_null_zones_wrapper_is_empty() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/client/v4/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "viewer": { "zones": null } }
        })))
        .mount(&server)
        .await;

    let data: AnalyticsData<FirewallEventGroup> =
        client.graphql("query {}", &json!({})).await.unwrap();
    assert!(data.zone_groups().is_empty());
}

#[tokio::test]
async fn test_graphql_error_status_with_error_array() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/client/v4/graphql"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "cannot parse query" }]
        })))
        .mount(&server)
        .await;

    let result = client
        .graphql::<AnalyticsData<FirewallEventGroup>>("query {", &json!({}))
        .await;
    assert!(matches!(
        result,
        Err(Error::Api {
            status: Some(400),
            ..
        })
    ));
}
