//! Timeouts, response size caps, decompression and streaming bodies,
//! exercised end to end.

mod common;

use std::io::Write;
use std::time::Duration;

use common::{read_request, sized_response, spawn_server};
use flate2::Compression;
use flate2::write::GzEncoder;
use futures::StreamExt;
use micro_client::{ClientError, RequestOptions, ResponseType, send};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

/// Server that waits `delay` after reading the request before answering.
async fn spawn_slow_server(delay: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else { break };
            let _ = read_request(&mut stream).await;
            tokio::time::sleep(delay).await;
            let _ = stream.write_all(&sized_response("HTTP/1.1 200 OK", &[], b"slow but fine")).await;
            let _ = stream.shutdown().await;
        }
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn slow_response_trips_the_timeout() {
    let base_url = spawn_slow_server(Duration::from_millis(100)).await;

    let opts = RequestOptions {
        timeout: Some(Duration::from_millis(50)),
        ..RequestOptions::new(format!("{base_url}/slow"))
    };
    let result = send(opts).await;

    assert!(matches!(result, Err(ClientError::Timeout { ms: 50 })));
}

#[tokio::test]
async fn fast_response_beats_the_timeout() {
    let base_url = spawn_slow_server(Duration::from_millis(20)).await;

    let opts = RequestOptions {
        timeout: Some(Duration::from_millis(500)),
        ..RequestOptions::new(format!("{base_url}/slow"))
    };
    let response = send(opts).await.unwrap();

    assert_eq!(response.data.as_text(), Some("slow but fine"));
}

#[tokio::test]
async fn zero_timeout_means_disabled() {
    let base_url = spawn_slow_server(Duration::from_millis(30)).await;

    let opts = RequestOptions {
        timeout: Some(Duration::ZERO),
        ..RequestOptions::new(format!("{base_url}/slow"))
    };
    let response = send(opts).await.unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn body_over_the_cap_fails() {
    let (base_url, _) = spawn_server(|_, _| sized_response("HTTP/1.1 200 OK", &[], &[b'x'; 130])).await;

    let opts = RequestOptions {
        max_content_length: Some(120),
        ..RequestOptions::new(format!("{base_url}/big"))
    };
    let result = send(opts).await;

    assert!(matches!(result, Err(ClientError::MaxContentLength { limit: 120 })));
}

#[tokio::test]
async fn body_under_the_cap_resolves() {
    let (base_url, _) = spawn_server(|_, _| sized_response("HTTP/1.1 200 OK", &[], &[b'x'; 100])).await;

    let opts = RequestOptions {
        max_content_length: Some(120),
        ..RequestOptions::new(format!("{base_url}/ok"))
    };
    let response = send(opts).await.unwrap();

    assert_eq!(response.data.as_text().map(str::len), Some(100));
}

#[tokio::test]
async fn negative_cap_disables_enforcement() {
    let (base_url, _) = spawn_server(|_, _| sized_response("HTTP/1.1 200 OK", &[], &vec![b'x'; 50_000])).await;

    let opts = RequestOptions {
        max_content_length: Some(-1),
        ..RequestOptions::new(format!("{base_url}/huge"))
    };
    let response = send(opts).await.unwrap();

    assert_eq!(response.data.as_text().map(str::len), Some(50_000));
}

#[tokio::test]
async fn gzip_response_is_transparently_inflated() {
    let (base_url, _) = spawn_server(|_, _| {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"hello from the compressed side").unwrap();
        let compressed = encoder.finish().unwrap();
        sized_response("HTTP/1.1 200 OK", &[("content-encoding", "gzip")], &compressed)
    })
    .await;

    let response = send(RequestOptions::new(format!("{base_url}/zipped"))).await.unwrap();

    assert_eq!(response.data.as_text(), Some("hello from the compressed side"));
    // the caller sees decoded content, the tag is gone
    assert!(!response.headers.contains_key("content-encoding"));
}

#[tokio::test]
async fn chunked_response_streams_to_the_caller() {
    let (base_url, _) = spawn_server(|_, _| {
        b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n6\r\nfirst \r\n6\r\nsecond\r\n0\r\n\r\n".to_vec()
    })
    .await;

    let opts = RequestOptions {
        response_type: Some(ResponseType::Stream),
        // the cap does not apply to streamed bodies
        max_content_length: Some(1),
        ..RequestOptions::new(format!("{base_url}/stream"))
    };
    let response = send(opts).await.unwrap();

    let mut stream = response.data.into_stream().unwrap();
    let mut collected = Vec::new();
    while let Some(chunk) = stream.next().await {
        collected.extend_from_slice(&chunk.unwrap());
    }

    assert_eq!(&collected[..], b"first second");
}

#[tokio::test]
async fn streamed_request_body_is_chunked() {
    let (base_url, _) = spawn_server(|_, request| sized_response("HTTP/1.1 200 OK", &[], request.as_bytes())).await;

    let chunks = vec![Ok(bytes::Bytes::from_static(b"part one, ")), Ok(bytes::Bytes::from_static(b"part two"))];
    let body = micro_client::Body::Stream(futures::stream::iter(chunks).boxed());

    let response = micro_client::post(format!("{base_url}/upload"), body, RequestOptions::default()).await.unwrap();

    let echoed = response.data.as_text().unwrap();
    assert!(echoed.contains("transfer-encoding: chunked\r\n"));
    assert!(!echoed.to_ascii_lowercase().contains("content-length"));
    // the body arrives in chunked framing
    assert!(echoed.contains("part one, "));
    assert!(echoed.contains("part two"));
}
