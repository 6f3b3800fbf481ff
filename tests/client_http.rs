use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use profile_links::client::{
    DEFAULT_TIMEOUT, GatewayError, HttpLinkGateway, LinkForm, LinkGateway, SubmitError,
    build_request,
};
use profile_links::domain::entities::{LinkEntry, Platform};

#[tokio::test]
async fn test_fetch_links_decodes_canonical_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/links/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "_id": "a1", "platform": "github", "link": "https://github.com/u1" },
            { "_id": "a2", "platform": "stackOverflow", "link": "https://stackoverflow.com/u/1" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpLinkGateway::new(&server.uri(), DEFAULT_TIMEOUT).unwrap();

    let links = gateway.fetch_links("u1").await.unwrap();

    assert_eq!(
        links,
        vec![
            LinkEntry {
                id: Some("a1".to_string()),
                platform: Some(Platform::Github),
                url: "https://github.com/u1".to_string(),
            },
            LinkEntry {
                id: Some("a2".to_string()),
                platform: Some(Platform::StackOverflow),
                url: "https://stackoverflow.com/u/1".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn test_apply_posts_wire_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/links/new"))
        .and(body_json(json!({
            "userID": "u1",
            "links": [{ "platform": "youtube", "link": "https://youtube.com/@u1" }],
            "linksToRemove": ["r1"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "_id": "b1", "platform": "youtube", "link": "https://youtube.com/@u1" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpLinkGateway::new(&server.uri(), DEFAULT_TIMEOUT).unwrap();
    let request = build_request(
        "u1",
        &[LinkEntry::new(Platform::Youtube, "https://youtube.com/@u1")],
        &["r1".to_string()],
    )
    .unwrap();

    let links = gateway.apply(&request).await.unwrap();

    assert_eq!(links.len(), 1);
    assert_eq!(links[0].id.as_deref(), Some("b1"));
}

#[tokio::test]
async fn test_bad_request_is_rejected_with_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/links/new"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Invalid URL: x" })),
        )
        .mount(&server)
        .await;

    let gateway = HttpLinkGateway::new(&server.uri(), DEFAULT_TIMEOUT).unwrap();
    let request = build_request("u1", &[], &[]).unwrap();

    let err = gateway.apply(&request).await.unwrap_err();

    assert_eq!(
        err,
        GatewayError::Rejected {
            status: 400,
            message: "Invalid URL: x".to_string()
        }
    );
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/links/new"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "message": "Internal Server Error" })),
        )
        .mount(&server)
        .await;

    let gateway = HttpLinkGateway::new(&server.uri(), DEFAULT_TIMEOUT).unwrap();
    let request = build_request("u1", &[], &[]).unwrap();

    let err = gateway.apply(&request).await.unwrap_err();

    assert_eq!(
        err,
        GatewayError::Server {
            status: 500,
            message: "Internal Server Error".to_string()
        }
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_timeout_is_retryable_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/links/new"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let gateway = HttpLinkGateway::new(&server.uri(), Duration::from_millis(200)).unwrap();
    let request = build_request("u1", &[], &[]).unwrap();

    let err = gateway.apply(&request).await.unwrap_err();

    assert!(matches!(err, GatewayError::Network { retryable: true, .. }));
}

#[tokio::test]
async fn test_undecodable_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/links/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let gateway = HttpLinkGateway::new(&server.uri(), DEFAULT_TIMEOUT).unwrap();

    let err = gateway.fetch_links("u1").await.unwrap_err();

    assert!(matches!(err, GatewayError::Decode(_)));
}

#[tokio::test]
async fn test_form_keeps_edits_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/links/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "_id": "a1", "platform": "github", "link": "https://github.com/u1" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/links/new"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "message": "busy" })))
        .mount(&server)
        .await;

    let gateway = HttpLinkGateway::new(&server.uri(), DEFAULT_TIMEOUT).unwrap();
    let mut form = LinkForm::new("u1");
    form.refresh(&gateway).await.unwrap();
    form.remove_at(0).unwrap();

    let err = form.submit(&gateway).await.unwrap_err();

    assert!(matches!(err, SubmitError::Gateway(GatewayError::Server { status: 503, .. })));
    assert_eq!(form.pending_removals(), &["a1".to_string()]);
    assert!(!form.is_saving());
}
