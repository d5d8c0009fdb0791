//! End-to-end tests against a running server.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use multiroute::config::load_config_str;
use multiroute::HttpServer;

mod common;

const SITE: &str = r#"
[listener]
bind_address = "127.0.0.1:0"
debug_not_found = true

[[routes]]
kind = "route"
name = "health"
path = "health"
responder = { type = "text", body = "ok" }

[[routes]]
kind = "multi"
namespace = "site"

[[routes.routes]]
kind = "include"
regex = '^find/'

[[routes.routes.routes]]
kind = "route"
name = "thing"
regex = '^(\w+)/$'
responder = { type = "template", body = "Found: {0|title}" }

[[routes.routes]]
kind = "route"
name = "person"
regex = '^(\w+)/$'
responder = { type = "lookup", param = "0", body = "Person: {value}", entries = { john = "John Smith", jane = "Jane Doe" } }

[[routes.routes]]
kind = "route"
name = "place"
regex = '^(\w+)/$'
responder = { type = "lookup", param = "0", body = "Place: {value}", entries = { sf = "San Francisco", nyc = "New York City" } }

[[routes.routes]]
kind = "route"
name = "members"
path = "vip/{name}/"
responder = { type = "reject", kind = "permission_denied", message = "members only" }
"#;

#[tokio::test]
async fn test_fallthrough_over_http() {
    let server = common::start_server(SITE).await;
    let client = common::client();

    let cases = [
        ("/jane/", 200, "Person: Jane Doe"),
        ("/nyc/", 200, "Place: New York City"),
        ("/find/bacon/", 200, "Found: Bacon"),
        ("/health", 200, "ok"),
    ];
    for (path, status, body) in cases {
        let res = client.get(server.url(path)).send().await.expect("server unreachable");
        assert_eq!(res.status(), status, "status for {path}");
        assert_eq!(res.text().await.unwrap(), body, "body for {path}");
    }
}

#[tokio::test]
async fn test_all_declined_is_404_with_trail() {
    let server = common::start_server(SITE).await;
    let client = common::client();

    let res = client.get(server.url("/bacon/")).send().await.unwrap();
    assert_eq!(res.status(), 404);
    let body = res.text().await.unwrap();
    assert!(body.starts_with("Not Found: /bacon/"), "{body}");
    assert!(body.contains("[name='person']"), "{body}");
    assert!(body.contains("[name='place']"), "{body}");
}

#[tokio::test]
async fn test_unmatched_path_is_404() {
    let server = common::start_server(SITE).await;
    let res = common::client().get(server.url("/eggs/and/bacon/")).send().await.unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_uncaught_error_is_500() {
    let server = common::start_server(SITE).await;
    let res = common::client().get(server.url("/vip/joe/")).send().await.unwrap();
    assert_eq!(res.status(), 500);
    assert!(!res.text().await.unwrap().contains("members only"));
}

#[tokio::test]
async fn test_request_id_is_generated_and_propagated() {
    let server = common::start_server(SITE).await;
    let client = common::client();

    let res = client.get(server.url("/health")).send().await.unwrap();
    let generated = res.headers()["x-request-id"].to_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&generated).is_ok());

    let res = client
        .get(server.url("/health"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn test_config_update_swaps_route_table() {
    let server = common::start_server(SITE).await;
    let client = common::client();

    let res = client.get(server.url("/bacon/")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    let with_catchall = format!(
        "{}\n{}",
        SITE,
        r#"
[[routes.routes]]
kind = "route"
name = "thing"
regex = '^(\w+)/$'
responder = { type = "template", body = "Thing: {0|title}" }
"#
    );
    server
        .config_updates
        .send(load_config_str(&with_catchall).unwrap())
        .unwrap();

    let mut body = String::new();
    for _ in 0..50 {
        let res = client.get(server.url("/bacon/")).send().await.unwrap();
        if res.status() == StatusCode::OK {
            body = res.text().await.unwrap();
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(body, "Thing: Bacon");
}

#[tokio::test]
async fn test_app_without_listener() {
    let config = load_config_str(SITE).unwrap();
    let server = HttpServer::new(config).unwrap();

    let response = server
        .app()
        .oneshot(Request::builder().uri("/sf/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"Place: San Francisco");
}

#[tokio::test]
async fn test_shutdown_stops_server() {
    let server = common::start_server(SITE).await;
    let url = server.url("/health");
    assert_eq!(common::client().get(&url).send().await.unwrap().status(), 200);

    drop(server);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(common::client().get(&url).send().await.is_err());
}
