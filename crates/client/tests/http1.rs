//! End-to-end exchanges over HTTP/1.x against a local canned-response
//! server.

mod common;

use common::{header_value, request_line, sized_response, spawn_server};
use micro_client::{Body, Credentials, HttpVersion, RequestOptions, ResponseType, send};
use serde_json::json;

#[tokio::test]
async fn get_resolves_with_status_and_text() {
    let (base_url, _) = spawn_server(|_, _| {
        sized_response("HTTP/1.1 200 OK", &[("content-type", "text/plain")], b"hello world")
    })
    .await;

    let response = send(RequestOptions::new(format!("{base_url}/greeting"))).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.status_text, "OK");
    assert_eq!(response.headers.get("content-type").unwrap(), "text/plain");
    assert_eq!(response.data.as_text(), Some("hello world"));
    assert!(response.redirects.is_empty());
}

#[tokio::test]
async fn request_echo_comes_back_as_json() {
    let (base_url, _) = spawn_server(|_, request| {
        let line = request_line(&request).to_owned();
        let mut parts = line.split(' ');
        let body = json!({
            "method": parts.next().unwrap_or(""),
            "url": parts.next().unwrap_or(""),
            "host": header_value(&request, "host").unwrap_or(""),
        });
        sized_response("HTTP/1.1 200 OK", &[("content-type", "application/json")], body.to_string().as_bytes())
    })
    .await;

    let opts = RequestOptions {
        response_type: Some(ResponseType::Json),
        ..RequestOptions::new(format!("{base_url}/users/1"))
    };
    let response = send(opts).await.unwrap();

    assert_eq!(response.status, 200);
    let data = response.data.as_json().unwrap();
    assert_eq!(data["method"], "GET");
    assert_eq!(data["url"], "/users/1");
    assert_eq!(data["host"], base_url.trim_start_matches("http://"));
}

#[tokio::test]
async fn post_sends_json_body_with_length_and_type() {
    let (base_url, _) = spawn_server(|_, request| sized_response("HTTP/1.1 200 OK", &[], request.as_bytes())).await;

    let payload = json!({"name": "micro", "id": 7});
    let response = micro_client::post(
        format!("{base_url}/things"),
        Body::Json(payload.clone()),
        RequestOptions::default(),
    )
    .await
    .unwrap();

    let echoed = response.data.as_text().unwrap();
    assert!(echoed.starts_with("POST /things HTTP/1.1\r\n"));

    let body = echoed.split("\r\n\r\n").nth(1).unwrap();
    assert_eq!(header_value(echoed, "content-length").unwrap(), body.len().to_string());
    assert_eq!(header_value(echoed, "content-type").unwrap(), "application/json;charset=utf-8");
    assert_eq!(serde_json::from_str::<serde_json::Value>(body).unwrap(), payload);
}

#[tokio::test]
async fn caller_header_names_are_lowercased_on_the_wire() {
    let (base_url, _) = spawn_server(|_, request| sized_response("HTTP/1.1 200 OK", &[], request.as_bytes())).await;

    let opts = RequestOptions {
        headers: vec![("X-Custom-Header".to_owned(), "yes".to_owned())],
        ..RequestOptions::new(format!("{base_url}/"))
    };
    let response = send(opts).await.unwrap();

    let echoed = response.data.as_text().unwrap();
    assert!(echoed.contains("x-custom-header: yes\r\n"));
}

#[tokio::test]
async fn params_are_appended_to_the_query() {
    let (base_url, _) = spawn_server(|_, request| sized_response("HTTP/1.1 200 OK", &[], request.as_bytes())).await;

    let opts = RequestOptions {
        params: vec![("page".to_owned(), "2".to_owned()), ("sort".to_owned(), "desc".to_owned())],
        ..RequestOptions::new(format!("{base_url}/list?filter=on"))
    };
    let response = send(opts).await.unwrap();

    let echoed = response.data.as_text().unwrap();
    assert!(request_line(echoed).contains("/list?filter=on&page=2&sort=desc"));
}

#[tokio::test]
async fn explicit_auth_becomes_basic_authorization() {
    let (base_url, _) = spawn_server(|_, request| sized_response("HTTP/1.1 200 OK", &[], request.as_bytes())).await;

    let opts = RequestOptions {
        auth: Some(Credentials { username: "user".to_owned(), password: "passwd".to_owned() }),
        // replaced by the transport auth string
        headers: vec![("authorization".to_owned(), "Bearer stale".to_owned())],
        ..RequestOptions::new(format!("{base_url}/private"))
    };
    let response = send(opts).await.unwrap();

    let echoed = response.data.as_text().unwrap();
    assert_eq!(header_value(echoed, "authorization").unwrap(), "Basic dXNlcjpwYXNzd2Q=");
}

#[tokio::test]
async fn url_userinfo_is_used_when_no_explicit_auth() {
    let (base_url, _) = spawn_server(|_, request| sized_response("HTTP/1.1 200 OK", &[], request.as_bytes())).await;

    let authority = base_url.trim_start_matches("http://");
    let response = send(RequestOptions::new(format!("http://embedded:secret@{authority}/"))).await.unwrap();

    let echoed = response.data.as_text().unwrap();
    // base64 of "embedded:secret"
    assert_eq!(header_value(echoed, "authorization").unwrap(), "Basic ZW1iZWRkZWQ6c2VjcmV0");
}

#[tokio::test]
async fn relative_url_resolves_against_base_url() {
    let (base_url, _) = spawn_server(|_, request| sized_response("HTTP/1.1 200 OK", &[], request.as_bytes())).await;

    let opts = RequestOptions {
        base_url: Some(format!("{base_url}/api/")),
        ..RequestOptions::new("users/1".to_owned())
    };
    let response = send(opts).await.unwrap();

    assert!(request_line(response.data.as_text().unwrap()).contains("/api/users/1"));
}

#[tokio::test]
async fn http10_close_delimited_body() {
    let (base_url, _) = spawn_server(|_, _| b"HTTP/1.0 200 OK\r\n\r\nun-sized body".to_vec()).await;

    let opts = RequestOptions {
        http_version: Some(HttpVersion::Http10),
        ..RequestOptions::new(format!("{base_url}/"))
    };
    let response = send(opts).await.unwrap();

    assert_eq!(response.data.as_text(), Some("un-sized body"));
}

#[tokio::test]
async fn head_request_has_no_body() {
    let (base_url, _) = spawn_server(|_, _| {
        // head responses advertise a body that is never sent
        b"HTTP/1.1 200 OK\r\ncontent-length: 512\r\n\r\n".to_vec()
    })
    .await;

    let response = micro_client::head(format!("{base_url}/"), RequestOptions::default()).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.data.as_text(), Some(""));
}

#[tokio::test]
async fn invalid_url_fails_before_any_io() {
    let result = send(RequestOptions::new("not a url at all")).await;

    assert!(matches!(result, Err(micro_client::ClientError::InvalidUrl { .. })));
}

#[tokio::test]
async fn connection_refused_is_a_transport_error() {
    // nothing listens on this port
    let result = send(RequestOptions::new("http://127.0.0.1:9/")).await;

    assert!(matches!(result, Err(micro_client::ClientError::Transport { .. })));
}

#[tokio::test]
async fn response_reports_request_headers_as_sent() {
    let (base_url, _) = spawn_server(|_, _| sized_response("HTTP/1.1 200 OK", &[], b"ok")).await;

    let response = send(RequestOptions::new(format!("{base_url}/"))).await.unwrap();

    // the host header is synthesized by the executor and reported back
    assert!(response.request_headers.contains_key("host"));
}
