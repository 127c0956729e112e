//! HttpTransport against a local mock backend

use arl_transport::prelude::*;
use mockito::Matcher;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

#[derive(Default)]
struct Recorder {
    notices: Mutex<Vec<Notice>>,
}

impl Notifier for Recorder {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

fn transport(base: String, token: Option<&str>) -> (HttpTransport, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let mut config = ApiConfig::new(base);
    if let Some(token) = token {
        config = config.with_token(token);
    }
    let ctx = ApiContext::with_notifier(config, recorder.clone());
    (HttpTransport::new(ctx), recorder)
}

#[tokio::test]
async fn get_sends_query_and_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/domain/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "1".into()),
            Matcher::UrlEncoded("order".into(), "-_id".into()),
        ]))
        .match_header("Token", "abc")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"items":[{"domain":"a.example.com"}],"total":1}"#)
        .create_async()
        .await;

    let (transport, recorder) = transport(format!("{}/api/", server.url()), Some("abc"));
    let params = QueryParams::new()
        .with("page", 1)
        .with("size", "")
        .with("order", "-_id");
    let body = transport.get("/domain/", &params).await.unwrap();

    mock.assert_async().await;
    assert_eq!(body, json!({"items": [{"domain": "a.example.com"}], "total": 1}));
    assert!(recorder.notices.lock().is_empty());
}

#[tokio::test]
async fn no_token_header_without_credential() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/task/")
        .match_header("Token", Matcher::Missing)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let (transport, _) = transport(format!("{}/api", server.url()), None);
    let body = transport.get("task/", &QueryParams::new()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn non_json_body_is_returned_as_text() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/console/info")
        .with_status(200)
        .with_body("maintenance window")
        .create_async()
        .await;

    let (transport, _) = transport(format!("{}/api", server.url()), None);
    let body = transport.get("console/info", &QueryParams::new()).await.unwrap();
    assert_eq!(body, json!("maintenance window"));
}

#[tokio::test]
async fn error_status_is_transport_error_with_backend_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/task/")
        .with_status(403)
        .with_body(r#"{"message":"permission denied"}"#)
        .create_async()
        .await;

    let (transport, recorder) = transport(format!("{}/api", server.url()), None);
    let err = transport.get("task/", &QueryParams::new()).await.unwrap_err();

    assert_eq!(err.status_code(), Some(403));
    assert_eq!(err.operator_message(), "permission denied");
    assert_eq!(*recorder.notices.lock(), vec![Notice::error("permission denied")]);
}

#[tokio::test]
async fn silent_error_status_raises_no_notice() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/task/")
        .with_status(500)
        .with_body("")
        .create_async()
        .await;

    let (transport, recorder) = transport(format!("{}/api", server.url()), None);
    let err = transport
        .get_with("task/", &QueryParams::new(), RequestOptions::silent())
        .await
        .unwrap_err();

    assert_eq!(err.operator_message(), "request failed");
    assert!(recorder.notices.lock().is_empty());
}

#[tokio::test]
async fn soft_error_is_reported_but_body_returned() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/task/")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"name": "recon", "target": "example.com"})))
        .with_status(200)
        .with_body(r#"{"code":301,"message":"target invalid","data":{}}"#)
        .create_async()
        .await;

    let (transport, recorder) = transport(format!("{}/api", server.url()), None);
    let body = transport
        .post("task/", &json!({"name": "recon", "target": "example.com"}))
        .await
        .unwrap();

    assert_eq!(body["code"], json!(301));
    assert_eq!(*recorder.notices.lock(), vec![Notice::error("target invalid")]);
}

#[tokio::test]
async fn silent_soft_error_raises_no_notice() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/task/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"code":401,"message":"token expired"}"#)
        .create_async()
        .await;

    let (transport, recorder) = transport(format!("{}/api", server.url()), None);
    let body = transport
        .get_with("task/", &QueryParams::new().with("_id", "t1"), RequestOptions::silent())
        .await
        .unwrap();

    assert_eq!(body["message"], json!("token expired"));
    assert!(recorder.notices.lock().is_empty());
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let (transport, _) = transport("http://127.0.0.1:1/api".to_string(), None);
    let err = transport.get("task/", &QueryParams::new()).await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
    assert!(err.is_retryable());
}
