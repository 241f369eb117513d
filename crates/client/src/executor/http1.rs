//! HTTP/1.x request executor.
//!
//! Drives the wire codec over a framed split of the transport stream: the
//! request head goes out first, then the payload (a single sized write, or
//! chunked when the length is unknown), then the executor waits for the
//! response head and hands the remaining frames back as the body stream.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::header::{AUTHORIZATION, HOST};
use http::{HeaderValue, Request, Uri, Version};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, trace};

use crate::builder::TransportRequest;
use crate::codec::{RequestEncoder, ResponseDecoder};
use crate::executor::{ProtocolExecutor, RawResponse, basic_auth_value};
use crate::options::HttpVersion;
use crate::protocol::{BodyStream, ClientError, Message, ParseError, PayloadItem, PayloadSize, RequestHead, SendError};
use crate::transform::WireBody;

/// Read buffer size for the response side
const READ_BUFFER_SIZE: usize = 8 * 1024;

pub(crate) struct Http1Executor {
    version: Version,
}

impl Http1Executor {
    pub(crate) fn new(version: HttpVersion) -> Self {
        let version = match version {
            HttpVersion::Http10 => Version::HTTP_10,
            _ => Version::HTTP_11,
        };
        Self { version }
    }

    /// Builds the wire-level request head: request target, version, and the
    /// headers the builder produced plus the ones only the transport knows
    /// (`host`, basic auth).
    fn build_head(&self, request: &TransportRequest) -> Result<RequestHead, ClientError> {
        let uri = request
            .path
            .parse::<Uri>()
            .map_err(|_| SendError::invalid_request(format!("invalid request target {}", request.path)))?;

        let mut head = Request::new(());
        *head.method_mut() = request.method.clone();
        *head.uri_mut() = uri;
        *head.version_mut() = self.version;
        *head.headers_mut() = request.headers.clone();

        if !head.headers().contains_key(HOST) {
            let host = if is_default_port(&request.scheme, request.port) {
                request.host.clone()
            } else {
                format!("{}:{}", request.host, request.port)
            };
            let host = HeaderValue::from_str(&host)
                .map_err(|_| SendError::invalid_request(format!("invalid host {host}")))?;
            head.headers_mut().insert(HOST, host);
        }

        if let Some(auth) = &request.auth {
            head.headers_mut().insert(AUTHORIZATION, basic_auth_value(auth));
        }

        Ok(head)
    }
}

#[async_trait]
impl ProtocolExecutor for Http1Executor {
    async fn perform<IO>(&self, io: IO, request: TransportRequest, body: WireBody) -> Result<RawResponse, ClientError>
    where
        IO: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let head = self.build_head(&request)?;
        let request_headers = head.headers().clone();

        let payload_size = match &body {
            WireBody::Empty => PayloadSize::Empty,
            WireBody::Buffered(bytes) => PayloadSize::Length(bytes.len() as u64),
            // a live stream has no known length up front
            WireBody::Stream(_) => PayloadSize::Chunked,
        };

        let (reader, writer) = tokio::io::split(io);
        let mut framed_write = FramedWrite::new(writer, RequestEncoder::new());
        let mut framed_read = FramedRead::with_capacity(reader, ResponseDecoder::for_method(&request.method), READ_BUFFER_SIZE);

        debug!(method = %request.method, path = %request.path, "sending request head");
        framed_write.send(Message::<_, Bytes>::Header((head, payload_size))).await?;

        match body {
            WireBody::Empty => {}
            WireBody::Buffered(bytes) => {
                framed_write.send(Message::Payload(PayloadItem::Chunk(bytes))).await?;
                framed_write.send(Message::Payload(PayloadItem::<Bytes>::Eof)).await?;
            }
            WireBody::Stream(mut stream) => {
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(SendError::io)?;
                    framed_write.send(Message::Payload(PayloadItem::Chunk(chunk))).await?;
                }
                framed_write.send(Message::Payload(PayloadItem::<Bytes>::Eof)).await?;
            }
        }

        let head = loop {
            match framed_read.next().await {
                Some(Ok(Message::Header((head, payload_size)))) => {
                    trace!(status = %head.status(), payload = ?payload_size, "received response head");
                    break head;
                }
                Some(Ok(Message::Payload(_))) => {
                    return Err(ParseError::invalid_body("received payload before response head").into());
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Err(ParseError::invalid_body("connection closed before response head").into()),
            }
        };

        Ok(RawResponse { head, body: into_body_stream(framed_read), request_headers })
    }
}

fn is_default_port(scheme: &str, port: u16) -> bool {
    matches!((scheme, port), ("http", 80) | ("https", 443))
}

/// Adapts the remaining framed messages into the response body stream.
///
/// The stream owns the read half of the connection and ends at the
/// end-of-payload marker (or connection close, for close-delimited bodies).
fn into_body_stream<R>(framed_read: FramedRead<R, ResponseDecoder>) -> BodyStream
where
    R: AsyncRead + Send + Unpin + 'static,
{
    futures::stream::unfold(Some(framed_read), |state| async move {
        let mut framed_read = state?;
        match framed_read.next().await {
            Some(Ok(Message::Payload(PayloadItem::Chunk(bytes)))) => Some((Ok(bytes), Some(framed_read))),
            Some(Ok(Message::Payload(PayloadItem::Eof))) => None,
            Some(Ok(Message::Header(_))) => {
                Some((Err(ParseError::invalid_body("unexpected head inside response body").into()), None))
            }
            Some(Err(e)) => Some((Err(e.into()), None)),
            None => None,
        }
    })
    .boxed()
}
