//! Integration tests for the HTTP surface.
//!
//! Each test runs the real router and serial worker in-process against a
//! scripted transport, so the bytes that would reach the device can be
//! checked exactly.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rfplayer_bridge::{router, spawn_serial_worker, MockTransport, SerialWorker};
use tower::ServiceExt;

/// Helper to start a router backed by a scripted transport.
fn test_app() -> (Router, MockTransport) {
    let transport = MockTransport::new();
    let (serial, _thread) =
        spawn_serial_worker(SerialWorker::new(transport.clone())).expect("spawn worker");
    (router(serial), transport)
}

fn request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

// ============================================================================
// /v1/command
// ============================================================================

#[tokio::test]
async fn test_command_basic_order() {
    let (app, transport) = test_app();
    transport.set_responder(|_| Some(b"ZIA--OK".to_vec()));

    let (status, _, body) = send(
        app,
        request(
            Method::POST,
            "/v1/command",
            r#"{"Order":"ON","Address":"12345","Protocol":"X10"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
    assert_eq!(transport.writes(), vec![b"ZIA++ON 12345 X10\r".to_vec()]);
}

#[tokio::test]
async fn test_command_with_percent() {
    let (app, transport) = test_app();

    let (status, _, _) = send(
        app,
        request(
            Method::POST,
            "/v1/command",
            r#"{"Order":"DIM","Address":"12345","Protocol":"X10","Percent":"50"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(transport.writes(), vec![b"ZIA++DIM 12345 X10 %50\r".to_vec()]);
}

#[tokio::test]
async fn test_command_with_burst_and_qualifier() {
    let (app, transport) = test_app();

    let (status, _, _) = send(
        app,
        request(
            Method::POST,
            "/v1/command",
            r#"{"Order":"ON","Address":"12345","Protocol":"X10","Burst":"3","Qualifier":"REPEAT"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        transport.writes(),
        vec![b"ZIA++ON 12345 X10 BURST 3 QUALIFIER REPEAT\r".to_vec()]
    );
}

#[tokio::test]
async fn test_command_missing_order_is_not_acceptable() {
    let (app, transport) = test_app();

    let (status, _, body) = send(
        app,
        request(
            Method::POST,
            "/v1/command",
            r#"{"Address":"1","Protocol":"X10"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body, b"Missing JSON field order, address or protocol");
    assert!(transport.writes().is_empty());
}

#[tokio::test]
async fn test_command_field_names_ignore_case() {
    let (app, transport) = test_app();

    let (status, _, _) = send(
        app,
        request(
            Method::POST,
            "/v1/command",
            r#"{"ORDER":"ON","ADDRESS":"12345","PROTOCOL":"X10"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(transport.writes(), vec![b"ZIA++ON 12345 X10\r".to_vec()]);
}

#[tokio::test]
async fn test_command_null_order_is_not_acceptable() {
    let (app, transport) = test_app();

    let (status, _, body) = send(
        app,
        request(
            Method::POST,
            "/v1/command",
            r#"{"Order":null,"Address":"1","Protocol":"X10"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body, b"Missing JSON field order, address or protocol");
    assert!(transport.writes().is_empty());
}

#[tokio::test]
async fn test_command_injection_is_not_acceptable() {
    let (app, transport) = test_app();

    let (status, _, _) = send(
        app,
        request(
            Method::POST,
            "/v1/command",
            r#"{"Order":"ON","Address":"1\rZIA++FORMAT OFF","Protocol":"X10"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert!(transport.writes().is_empty());
}

#[tokio::test]
async fn test_command_malformed_json_is_bad_request() {
    let (app, transport) = test_app();

    let (status, _, _) = send(app, request(Method::POST, "/v1/command", "{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(transport.writes().is_empty());
}

#[tokio::test]
async fn test_command_get_is_method_not_allowed() {
    let (app, transport) = test_app();

    let (status, headers, _) = send(app, request(Method::GET, "/v1/command", "")).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers.get(header::ALLOW).unwrap(), "POST");
    assert!(transport.writes().is_empty());
}

// ============================================================================
// /v1/ping, /v1/status, /v1/read
// ============================================================================

#[tokio::test]
async fn test_ping() {
    let (app, transport) = test_app();
    transport.set_responder(|data| (data == b"ZIA++PING\r").then(|| b"ZIA--PONG\r\n".to_vec()));

    let (status, headers, body) = send(app, request(Method::GET, "/v1/ping", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"PONG\r\n");
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "text/plain; charset=utf-8"
    );
}

#[tokio::test]
async fn test_status_any_method() {
    let (app, transport) = test_app();
    transport.set_responder(|_| Some(br#"ZIA--{"systemStatus":{"info":[]}}"#.to_vec()));

    let (status, _, body) = send(app, request(Method::POST, "/v1/status", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, br#"{"systemStatus":{"info":[]}}"#);
    assert_eq!(transport.writes(), vec![b"ZIA++STATUS SYSTEM JSON\r".to_vec()]);
}

#[tokio::test]
async fn test_read_drains_without_writing() {
    let (app, transport) = test_app();
    transport.queue_read(b"ZIA--{\"frame\":".to_vec());
    transport.queue_read(b"{\"header\":{}}}".to_vec());

    let (status, _, body) = send(app, request(Method::GET, "/v1/read", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"{\"frame\":{\"header\":{}}}");
    assert!(transport.writes().is_empty());
}

#[tokio::test]
async fn test_read_nothing_buffered() {
    let (app, _transport) = test_app();

    let (status, _, body) = send(app, request(Method::GET, "/v1/read", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_binary_reply_passes_through() {
    let (app, transport) = test_app();
    transport.queue_read(vec![0xff, 0x00, 0xfe]);

    let (status, headers, body) = send(app, request(Method::GET, "/v1/read", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, vec![0xff, 0x00, 0xfe]);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/octet-stream"
    );
}

#[tokio::test]
async fn test_unknown_path_not_found() {
    let (app, transport) = test_app();

    let (status, _, _) = send(app, request(Method::GET, "/v2/ping", "")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(transport.writes().is_empty());
}

// ============================================================================
// Link failure
// ============================================================================

#[tokio::test]
async fn test_transport_failure_is_service_unavailable() {
    let (app, transport) = test_app();
    transport.fail_writes(std::io::ErrorKind::BrokenPipe);

    let (status, _, _) = send(app.clone(), request(Method::GET, "/v1/ping", "")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    // The worker has stopped; later requests are refused too.
    let (status, _, body) = send(app, request(Method::GET, "/v1/read", "")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, b"serial link is down");
}
