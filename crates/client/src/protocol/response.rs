//! HTTP response types.
//!
//! [`ResponseHead`] is the decoded status line plus header section of one
//! exchange, before the body is processed. It wraps `http::Response<()>`
//! because the standard type has no room for the reason phrase, which
//! HTTP/1.x peers send and HTTP/2 peers do not.
//!
//! [`Response`] is the caller-facing result: status, headers, the decoded
//! body and the redirect trail accumulated while following `Location`
//! responses.

use std::fmt;

use bytes::Bytes;
use futures::stream::BoxStream;
use http::response::Parts;
use http::{HeaderMap, StatusCode, Version};
use serde_json::Value;

use crate::protocol::ClientError;

/// Status line and headers of a response, before the body is processed.
#[derive(Debug)]
pub struct ResponseHead {
    inner: http::Response<()>,
    reason: String,
}

impl ResponseHead {
    pub fn new(inner: http::Response<()>, reason: String) -> Self {
        Self { inner, reason }
    }

    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    /// Reason phrase as sent by the peer; empty for protocols without one.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn into_parts(self) -> (Parts, String) {
        let (parts, ()) = self.inner.into_parts();
        (parts, self.reason)
    }
}

/// Builds a head from response parts that carry no reason phrase (HTTP/2).
impl From<Parts> for ResponseHead {
    fn from(parts: Parts) -> Self {
        Self { inner: http::Response::from_parts(parts, ()), reason: String::new() }
    }
}

/// Live response body handed to the caller when streaming is requested.
pub type BodyStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// One followed redirect: the hop's url and the response that redirected it.
#[derive(Debug, Clone)]
pub struct RedirectHop {
    pub url: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// Response body in the shape the caller asked for.
pub enum ResponseData {
    Text(String),
    Json(Value),
    Bytes(Bytes),
    Stream(BodyStream),
}

impl ResponseData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseData::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn into_stream(self) -> Option<BodyStream> {
        match self {
            ResponseData::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}

impl fmt::Debug for ResponseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseData::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ResponseData::Json(value) => f.debug_tuple("Json").field(value).finish(),
            ResponseData::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            ResponseData::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Final result of a `send` call.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    /// Reason phrase; empty for HTTP/2 responses.
    pub status_text: String,
    pub headers: HeaderMap,
    /// Headers of the request as they were actually sent on the last hop.
    pub request_headers: HeaderMap,
    pub data: ResponseData,
    /// Trail of followed redirects, oldest first. Empty when none were
    /// followed.
    pub redirects: Vec<RedirectHop>,
}
