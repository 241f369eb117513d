//! Caller-facing request options.
//!
//! A request is described by a plain [`RequestOptions`] value: every field
//! that is left unset keeps its default, and the defaults live in explicit
//! constants rather than any process-wide state. The payload is a closed
//! [`Body`] union decided once at the API boundary; there is no dynamic
//! dispatch on what the caller happened to pass in.

use std::fmt;
use std::io;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::BoxStream;
use serde::Serialize;
use serde_json::Value;

use crate::protocol::ClientError;

/// HTTP protocol version a request is performed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpVersion {
    Http10,
    #[default]
    Http11,
    H2,
}

/// Shape the response body is coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    /// Parse the body as JSON; malformed JSON falls back to the raw text
    Json,
    /// Decode the body as text with the configured response encoding
    #[default]
    Text,
    /// Hand the live body stream to the caller, without buffering
    Stream,
    /// Return the raw body bytes
    ArrayBuffer,
}

/// Credentials sent as transport-level basic auth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Request payload.
///
/// The variant is fixed when the options are built; everything downstream
/// matches on it instead of inspecting the payload.
#[derive(Default)]
pub enum Body {
    #[default]
    Empty,
    /// Raw bytes, sent as-is
    Bytes(Bytes),
    /// Text, sent UTF-8 encoded
    Text(String),
    /// A JSON document, serialized before sending
    Json(Value),
    /// A live byte stream, piped to the transport without buffering
    Stream(BoxStream<'static, io::Result<Bytes>>),
}

impl Body {
    /// Serializes `value` into a JSON payload.
    ///
    /// Values with no JSON representation (maps with non-string keys and the
    /// like) are rejected as an unsupported payload, before any header is
    /// touched.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ClientError> {
        serde_json::to_value(value).map(Body::Json).map_err(|_| ClientError::UnsupportedDataType)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_owned())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(bytes))
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Body::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Body::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Body::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Default cap on buffered response bodies, in bytes.
pub const DEFAULT_MAX_CONTENT_LENGTH: i64 = 10_000;

/// By default redirects are not followed at all.
pub const DEFAULT_MAX_REDIRECTS: u32 = 0;

/// Default charset label for decoding text responses.
pub const DEFAULT_RESPONSE_ENCODING: &str = "utf8";

/// Methods preserved across redirects without downgrading to GET.
pub const SAFE_METHODS: [&str; 4] = ["get", "head", "options", "trace"];

/// Options for one `send` call.
///
/// `Option` fields left as `None` (and empty collections) keep their
/// defaults when the call merges them; set fields always win.
#[derive(Debug, Default)]
pub struct RequestOptions {
    /// Protocol version, HTTP/1.1 when unset
    pub http_version: Option<HttpVersion>,
    /// Request method, matched case-insensitively; GET when unset
    pub method: Option<String>,
    /// Base for resolving a relative `url`
    pub base_url: Option<String>,
    /// Absolute url, or relative to `base_url`
    pub url: String,
    /// Query parameters, appended to the url query in insertion order
    pub params: Vec<(String, String)>,
    /// Basic auth credentials; win over userinfo embedded in the url
    pub auth: Option<Credentials>,
    /// Request headers; names are matched case-insensitively
    pub headers: Vec<(String, String)>,
    /// Request payload
    pub data: Body,
    /// Overall deadline for each hop; unset or zero disables it
    pub timeout: Option<Duration>,
    /// Cap on the buffered response body; negative disables enforcement
    pub max_content_length: Option<i64>,
    /// How many redirects to follow; 0 returns the first response as-is
    pub max_redirects: Option<u32>,
    /// Shape of the response body
    pub response_type: Option<ResponseType>,
    /// Charset for decoding text responses
    pub response_encoding: Option<String>,
}

impl RequestOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Default::default() }
    }
}
