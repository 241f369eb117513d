//! Per-protocol request executors.
//!
//! An executor performs exactly one request/response exchange over a
//! transport stream the orchestrator already opened: it writes the head and
//! payload, waits for the response head, and hands back the head together
//! with the still-live body stream. Interpreting status codes, following
//! redirects and enforcing body limits all happen elsewhere.
//!
//! There is one implementation per protocol version behind the
//! [`ProtocolExecutor`] trait ([`Http1Executor`] for HTTP/1.0 and 1.1,
//! [`Http2Executor`] for HTTP/2), selected once per hop by [`perform`].
//!
//! Cancellation is structural: the orchestrator wraps the whole hop future
//! in a timer, and dropping it closes the connection (or HTTP/2 session)
//! mid-flight. An executor aborted that way can never surface a late
//! transport error, so a fired timer is the only error the caller sees.

mod http1;
mod http2;

pub(crate) use http1::Http1Executor;
pub(crate) use http2::Http2Executor;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use http::{HeaderMap, HeaderValue};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::builder::TransportRequest;
use crate::options::HttpVersion;
use crate::protocol::{BodyStream, ClientError, ResponseHead};
use crate::transform::WireBody;

/// Raw exchange result handed to the response processor.
pub(crate) struct RawResponse {
    pub head: ResponseHead,
    /// Live body stream; still tied to the connection it arrived on
    pub body: BodyStream,
    /// Request headers as they were actually sent
    pub request_headers: HeaderMap,
}

/// One request/response exchange over an established transport stream.
#[async_trait]
pub(crate) trait ProtocolExecutor {
    async fn perform<IO>(&self, io: IO, request: TransportRequest, body: WireBody) -> Result<RawResponse, ClientError>
    where
        IO: AsyncRead + AsyncWrite + Send + Unpin + 'static;
}

/// Runs one exchange with the executor matching the protocol version.
pub(crate) async fn perform<IO>(
    version: HttpVersion,
    io: IO,
    request: TransportRequest,
    body: WireBody,
) -> Result<RawResponse, ClientError>
where
    IO: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    match version {
        HttpVersion::Http10 | HttpVersion::Http11 => Http1Executor::new(version).perform(io, request, body).await,
        HttpVersion::H2 => Http2Executor.perform(io, request, body).await,
    }
}

/// Encodes a `username:password` transport auth string as a basic auth
/// header value.
fn basic_auth_value(auth: &str) -> HeaderValue {
    let mut value = String::from("Basic ");
    value.push_str(&BASE64.encode(auth));
    // base64 output is always visible ascii
    HeaderValue::from_str(&value).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_is_base64_of_the_pair() {
        let value = basic_auth_value("user:passwd");
        assert_eq!(value, HeaderValue::from_static("Basic dXNlcjpwYXNzd2Q="));
    }
}
