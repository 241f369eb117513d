//! Response processor.
//!
//! Takes the raw exchange result from an executor and produces the
//! caller-facing [`Response`]: transparent decompression first, then either
//! an immediate resolve with the live stream (when streaming was requested)
//! or bounded buffering followed by response-type coercion. Size
//! enforcement only exists on the buffering path; a streamed body is the
//! caller's to read at whatever size it likes.

use bytes::BytesMut;
use futures::StreamExt;
use http::StatusCode;
use http::header::CONTENT_ENCODING;
use tracing::debug;

use crate::decompress::{DecodedStream, Decoder};
use crate::executor::RawResponse;
use crate::options::ResponseType;
use crate::protocol::{ClientError, Response, ResponseData};
use crate::transform;

/// Response-side slice of the merged options.
pub(crate) struct ProcessOptions {
    pub max_content_length: i64,
    pub response_type: ResponseType,
    pub response_encoding: String,
}

pub(crate) async fn process(raw: RawResponse, opts: &ProcessOptions) -> Result<Response, ClientError> {
    let RawResponse { head, body, request_headers } = raw;
    let (parts, reason) = head.into_parts();
    let status = parts.status;
    let mut headers = parts.headers;

    // transparent decompression; a 204 has nothing to inflate
    let decoder = headers
        .get(CONTENT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .filter(|_| status != StatusCode::NO_CONTENT)
        .and_then(Decoder::select);

    let body = match decoder {
        Some(decoder) => {
            // the caller sees decoded content, so the tag must not survive
            headers.remove(CONTENT_ENCODING);
            DecodedStream::new(body, decoder).boxed()
        }
        None => body,
    };

    if opts.response_type == ResponseType::Stream {
        return Ok(Response {
            status,
            status_text: reason,
            headers,
            request_headers,
            data: ResponseData::Stream(body),
            redirects: Vec::new(),
        });
    }

    let mut body = body;
    let mut buffered = BytesMut::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        buffered.extend_from_slice(&chunk);
        if opts.max_content_length >= 0 && buffered.len() as i64 > opts.max_content_length {
            debug!(limit = opts.max_content_length, buffered = buffered.len(), "response body over limit");
            return Err(ClientError::max_content_length(opts.max_content_length));
        }
    }

    let data = transform::decode_response_body(buffered.freeze(), opts.response_type, &opts.response_encoding);
    Ok(Response { status, status_text: reason, headers, request_headers, data, redirects: Vec::new() })
}
