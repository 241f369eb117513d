//! Core orchestrator.
//!
//! `send` merges the caller options over the defaults, normalizes them,
//! and runs the per-hop pipeline (build the transport request, connect,
//! exchange, process) inside an explicit redirect loop bounded by
//! `max_redirects`. Hops are strictly sequential: a call has at most one
//! in-flight exchange at any instant.
//!
//! The per-hop timeout wraps the whole pipeline future, so cancellation and
//! cleanup are structural: when the timer fires the exchange is dropped,
//! which closes the transport handle, and a late error from the aborted
//! exchange has nowhere to go. Completion disarms the timer the same way.

use std::mem;
use std::time::Duration;

use http::StatusCode;
use http::header::LOCATION;
use tracing::debug;

use crate::builder::{RequestFragment, TransportRequest};
use crate::executor;
use crate::options::{
    Body, Credentials, DEFAULT_MAX_CONTENT_LENGTH, DEFAULT_MAX_REDIRECTS, DEFAULT_RESPONSE_ENCODING, HttpVersion,
    RequestOptions, ResponseType, SAFE_METHODS,
};
use crate::processor::{self, ProcessOptions};
use crate::protocol::{ClientError, RedirectHop, Response};
use crate::transform;
use crate::transport::{TcpTransport, Transport};

/// Sends a request described by `opts` over the default TCP transport.
///
/// Resolves with the final [`Response`] or rejects with the first
/// [`ClientError`] the call runs into; nothing is retried.
pub async fn send(opts: RequestOptions) -> Result<Response, ClientError> {
    send_via(&TcpTransport::new(), opts).await
}

/// Sends a request over a caller-provided transport.
///
/// This is the seam for TLS transports, test doubles, or anything else that
/// can produce a duplex byte stream per hop.
pub async fn send_via<T: Transport>(transport: &T, opts: RequestOptions) -> Result<Response, ClientError> {
    let mut call = CallState::merge(opts);
    let mut redirects: Vec<RedirectHop> = Vec::new();
    let mut redirect_count: u32 = 0;

    loop {
        let mut response = perform_hop(transport, &mut call).await?;

        // max_redirects = 0 disables following entirely: even a 3xx
        // response is handed back as-is
        if call.max_redirects == 0 {
            return Ok(response);
        }

        let location = response
            .headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .filter(|_| response.status.is_redirection())
            .map(str::to_owned);
        let Some(location) = location else {
            response.redirects = redirects;
            return Ok(response);
        };

        redirect_count += 1;
        if redirect_count > call.max_redirects {
            return Err(ClientError::MaxRedirects);
        }

        debug!(status = %response.status, location = %location, "following redirect");
        redirects.push(RedirectHop {
            url: call.url.clone(),
            status: response.status,
            headers: response.headers.clone(),
        });

        // anything but 307 downgrades non-safe methods to GET, and the
        // body-describing headers go with the body
        if response.status != StatusCode::TEMPORARY_REDIRECT && !SAFE_METHODS.contains(&call.method.as_str()) {
            call.method = "get".to_owned();
            call.headers.retain(|(name, _)| !name.starts_with("content-"));
        }
        call.url = location;
        call.base_url = None;
        call.data = Body::Empty;
    }
}

/// One full request/response exchange.
async fn perform_hop<T: Transport>(transport: &T, call: &mut CallState) -> Result<Response, ClientError> {
    // url resolution failures surface here, before any i/o
    let mut request = TransportRequest::build(RequestFragment {
        method: &call.method,
        base_url: call.base_url.as_deref(),
        url: &call.url,
        params: &call.params,
        auth: call.auth.as_ref(),
        headers: &call.headers,
    })?;

    // the payload belongs to the first hop only; redirect hops are bodyless
    let data = mem::take(&mut call.data);
    let wire_body = transform::encode_request_body(data, &mut request.headers)?;

    let process_opts = ProcessOptions {
        max_content_length: call.max_content_length,
        response_type: call.response_type,
        response_encoding: call.response_encoding.clone(),
    };

    let version = call.http_version;
    let exchange = async {
        let io = transport.connect(&request).await.map_err(ClientError::transport)?;
        let raw = executor::perform(version, io, request, wire_body).await?;
        processor::process(raw, &process_opts).await
    };

    match call.timeout {
        Some(timeout) if !timeout.is_zero() => {
            // a fired timer drops the exchange, aborting whatever transport
            // operation was in flight
            tokio::time::timeout(timeout, exchange)
                .await
                .map_err(|_| ClientError::timeout(timeout.as_millis() as u64))?
        }
        _ => exchange.await,
    }
}

/// Merged per-call state: caller options over defaults, plus the fields the
/// redirect loop rewrites between hops.
struct CallState {
    http_version: HttpVersion,
    /// lowercase; uppercased again when put on the wire
    method: String,
    base_url: Option<String>,
    url: String,
    params: Vec<(String, String)>,
    auth: Option<Credentials>,
    /// names folded to lowercase
    headers: Vec<(String, String)>,
    data: Body,
    timeout: Option<Duration>,
    max_content_length: i64,
    max_redirects: u32,
    response_type: ResponseType,
    response_encoding: String,
}

impl CallState {
    fn merge(opts: RequestOptions) -> Self {
        Self {
            http_version: opts.http_version.unwrap_or_default(),
            method: opts.method.as_deref().unwrap_or("get").to_ascii_lowercase(),
            base_url: opts.base_url,
            url: opts.url,
            params: opts.params,
            auth: opts.auth,
            headers: opts.headers.into_iter().map(|(name, value)| (name.to_ascii_lowercase(), value)).collect(),
            data: opts.data,
            timeout: opts.timeout,
            max_content_length: opts.max_content_length.unwrap_or(DEFAULT_MAX_CONTENT_LENGTH),
            max_redirects: opts.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS),
            response_type: opts.response_type.unwrap_or_default(),
            response_encoding: opts.response_encoding.unwrap_or_else(|| DEFAULT_RESPONSE_ENCODING.to_owned()),
        }
    }
}

/// `get(url, opts)`: sugar over [`send`] with the method and url filled in.
pub async fn get(url: impl Into<String>, mut opts: RequestOptions) -> Result<Response, ClientError> {
    opts.method = Some("get".to_owned());
    opts.url = url.into();
    send(opts).await
}

/// `head(url, opts)`: sugar over [`send`].
pub async fn head(url: impl Into<String>, mut opts: RequestOptions) -> Result<Response, ClientError> {
    opts.method = Some("head".to_owned());
    opts.url = url.into();
    send(opts).await
}

/// `options(url, opts)`: sugar over [`send`].
pub async fn options(url: impl Into<String>, mut opts: RequestOptions) -> Result<Response, ClientError> {
    opts.method = Some("options".to_owned());
    opts.url = url.into();
    send(opts).await
}

/// `delete(url, opts)`: sugar over [`send`].
pub async fn delete(url: impl Into<String>, mut opts: RequestOptions) -> Result<Response, ClientError> {
    opts.method = Some("delete".to_owned());
    opts.url = url.into();
    send(opts).await
}

/// `post(url, data, opts)`: sugar over [`send`] with the payload attached.
pub async fn post(url: impl Into<String>, data: Body, mut opts: RequestOptions) -> Result<Response, ClientError> {
    opts.method = Some("post".to_owned());
    opts.url = url.into();
    opts.data = data;
    send(opts).await
}

/// `put(url, data, opts)`: sugar over [`send`] with the payload attached.
pub async fn put(url: impl Into<String>, data: Body, mut opts: RequestOptions) -> Result<Response, ClientError> {
    opts.method = Some("put".to_owned());
    opts.url = url.into();
    opts.data = data;
    send(opts).await
}

/// `patch(url, data, opts)`: sugar over [`send`] with the payload attached.
pub async fn patch(url: impl Into<String>, data: Body, mut opts: RequestOptions) -> Result<Response, ClientError> {
    opts.method = Some("patch".to_owned());
    opts.url = url.into();
    opts.data = data;
    send(opts).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_applies_defaults() {
        let call = CallState::merge(RequestOptions::new("http://example.com/"));

        assert_eq!(call.http_version, HttpVersion::Http11);
        assert_eq!(call.method, "get");
        assert_eq!(call.max_content_length, 10_000);
        assert_eq!(call.max_redirects, 0);
        assert_eq!(call.response_type, ResponseType::Text);
        assert_eq!(call.response_encoding, "utf8");
        assert!(call.timeout.is_none());
    }

    #[test]
    fn merge_prefers_caller_values() {
        let opts = RequestOptions {
            method: Some("POST".to_owned()),
            max_content_length: Some(-1),
            max_redirects: Some(5),
            response_type: Some(ResponseType::Json),
            ..RequestOptions::new("http://example.com/")
        };

        let call = CallState::merge(opts);

        assert_eq!(call.method, "post");
        assert_eq!(call.max_content_length, -1);
        assert_eq!(call.max_redirects, 5);
        assert_eq!(call.response_type, ResponseType::Json);
    }

    #[test]
    fn merge_folds_header_names() {
        let opts = RequestOptions {
            headers: vec![("X-Request-Id".to_owned(), "42".to_owned())],
            ..RequestOptions::new("http://example.com/")
        };

        let call = CallState::merge(opts);
        assert_eq!(call.headers, vec![("x-request-id".to_owned(), "42".to_owned())]);
    }
}
