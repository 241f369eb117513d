//! HTTP/2 request executor, built on `h2`.
//!
//! The shape differs from HTTP/1.x in two ways that matter here. Pseudo
//! header fields (`:method`, `:path`, `:scheme`, `:authority`) are
//! synthesized by `h2` from the full request URI, and `:status` comes back
//! as the typed status code, so the headers the caller sees never contain
//! pseudo fields, and there is no reason phrase at all. Cancellation needs
//! no abort/destroy distinction either: dropping the session closes it.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use h2::client;
use http::header::{AUTHORIZATION, HOST};
use http::{Request, Uri, Version};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace};

use crate::builder::TransportRequest;
use crate::executor::{ProtocolExecutor, RawResponse, basic_auth_value};
use crate::protocol::{BodyStream, ClientError, RequestHead, ResponseHead, SendError};
use crate::transform::WireBody;

pub(crate) struct Http2Executor;

#[async_trait]
impl ProtocolExecutor for Http2Executor {
    async fn perform<IO>(&self, io: IO, request: TransportRequest, body: WireBody) -> Result<RawResponse, ClientError>
    where
        IO: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (send_request, connection) = client::handshake(io).await.map_err(ClientError::transport)?;

        // the connection task drives the session and ends when it closes
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!(cause = %e, "http/2 connection terminated");
            }
        });

        let mut send_request = send_request.ready().await.map_err(ClientError::transport)?;

        let head = build_head(&request)?;
        let request_headers = head.headers().clone();

        debug!(method = %request.method, path = %request.path, "sending http/2 request");
        let end_of_stream = matches!(body, WireBody::Empty);
        let (response, mut send_stream) =
            send_request.send_request(head, end_of_stream).map_err(ClientError::transport)?;

        match body {
            WireBody::Empty => {}
            WireBody::Buffered(bytes) => {
                send_stream.send_data(bytes, true).map_err(ClientError::transport)?;
            }
            WireBody::Stream(mut stream) => {
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(SendError::io)?;
                    send_stream.send_data(chunk, false).map_err(ClientError::transport)?;
                }
                send_stream.send_data(Bytes::new(), true).map_err(ClientError::transport)?;
            }
        }

        let response = response.await.map_err(ClientError::transport)?;
        let (parts, recv_stream) = response.into_parts();
        trace!(status = %parts.status, "received http/2 response");

        // `parts` already carries `:status` as the typed status code and no
        // other pseudo header; the reason phrase does not exist in http/2
        let head = ResponseHead::from(parts);

        Ok(RawResponse { head, body: into_body_stream(recv_stream), request_headers })
    }
}

/// Builds the request with a full URI so `h2` can derive the pseudo header
/// fields from it.
fn build_head(request: &TransportRequest) -> Result<RequestHead, ClientError> {
    let uri = format!("{}://{}:{}{}", request.scheme, request.host, request.port, request.path);
    let uri = uri.parse::<Uri>().map_err(|_| SendError::invalid_request(format!("invalid request uri {uri}")))?;

    let mut head = Request::new(());
    *head.method_mut() = request.method.clone();
    *head.uri_mut() = uri;
    *head.version_mut() = Version::HTTP_2;
    *head.headers_mut() = request.headers.clone();

    // `:authority` carries the target; a host header would be redundant
    head.headers_mut().remove(HOST);

    if let Some(auth) = &request.auth {
        head.headers_mut().insert(AUTHORIZATION, basic_auth_value(auth));
    }

    Ok(head)
}

/// Adapts the `h2` receive stream into the response body stream, releasing
/// flow-control credit as chunks are consumed.
fn into_body_stream(recv_stream: h2::RecvStream) -> BodyStream {
    futures::stream::unfold(Some(recv_stream), |state| async move {
        let mut recv_stream = state?;
        match recv_stream.data().await {
            Some(Ok(bytes)) => {
                let _ = recv_stream.flow_control().release_capacity(bytes.len());
                Some((Ok(bytes), Some(recv_stream)))
            }
            Some(Err(e)) => Some((Err(ClientError::transport(e)), None)),
            None => None,
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RequestFragment;
    use http::Method;

    #[test]
    fn head_uses_full_uri_and_no_host_header() {
        let request = TransportRequest::build(RequestFragment {
            method: "post",
            base_url: None,
            url: "http://example.com:8080/things?q=1",
            params: &[],
            auth: None,
            headers: &[("host".to_owned(), "ignored".to_owned())],
        })
        .unwrap();

        let head = build_head(&request).unwrap();

        assert_eq!(head.method(), &Method::POST);
        assert_eq!(head.uri().scheme_str(), Some("http"));
        assert_eq!(head.uri().host(), Some("example.com"));
        assert_eq!(head.uri().port_u16(), Some(8080));
        assert_eq!(head.uri().path_and_query().unwrap().as_str(), "/things?q=1");
        assert!(!head.headers().contains_key(HOST));
    }
}
