//! Shared helpers for the end-to-end tests: a canned-response TCP server
//! plus a tiny request reader so assertions can look at what actually went
//! over the wire.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Reads one full request (head plus any content-length delimited body)
/// and returns it as text.
pub async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return String::from_utf8_lossy(&buf).into_owned();
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_head_end(&buf) {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    if head.to_ascii_lowercase().contains("transfer-encoding: chunked") {
        while !buf.ends_with(b"0\r\n\r\n") {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    } else {
        let expected_body = content_length_of(&head);
        while buf.len() - head_end < expected_body {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n").map(|pos| pos + 4)
}

fn content_length_of(head: &str) -> usize {
    head.lines()
        .find_map(|line| line.to_ascii_lowercase().strip_prefix("content-length:").map(str::trim).map(str::to_owned))
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

/// Spawns a server that answers each connection with whatever `responder`
/// returns for it. The responder sees the connection index and the full
/// request text; the returned counter tracks how many requests were served.
pub async fn spawn_server<F>(mut responder: F) -> (String, Arc<AtomicUsize>)
where
    F: FnMut(usize, String) -> Vec<u8> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    let served = Arc::clone(&counter);
    tokio::spawn(async move {
        let mut index = 0;
        loop {
            let Ok((mut stream, _)) = listener.accept().await else { break };
            let request = read_request(&mut stream).await;
            let response = responder(index, request);
            index += 1;
            served.fetch_add(1, Ordering::SeqCst);
            let _ = stream.write_all(&response).await;
            let _ = stream.shutdown().await;
        }
    });

    (format!("http://{addr}"), counter)
}

/// Builds a plain response with a sized body.
pub fn sized_response(status_line: &str, extra_headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut response = format!("{status_line}\r\ncontent-length: {}\r\n", body.len());
    for (name, value) in extra_headers {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    response.push_str("\r\n");
    let mut bytes = response.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

/// Builds a redirect response pointing at `location`.
pub fn redirect_response(status_line: &str, location: &str) -> Vec<u8> {
    format!("{status_line}\r\nlocation: {location}\r\ncontent-length: 0\r\n\r\n").into_bytes()
}

/// First line of a request, e.g. `GET /users/1 HTTP/1.1`.
pub fn request_line(request: &str) -> &str {
    request.lines().next().unwrap_or("")
}

/// Lowercased header names present in the request head.
pub fn header_names(request: &str) -> Vec<String> {
    request
        .split("\r\n\r\n")
        .next()
        .unwrap_or("")
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':').map(|(name, _)| name.trim().to_ascii_lowercase()))
        .collect()
}

/// Value of a request header, when present.
pub fn header_value<'a>(request: &'a str, name: &str) -> Option<&'a str> {
    request
        .split("\r\n\r\n")
        .next()
        .unwrap_or("")
        .lines()
        .skip(1)
        .find_map(|line| {
            let (header_name, value) = line.split_once(':')?;
            header_name.trim().eq_ignore_ascii_case(name).then(|| value.trim())
        })
}
