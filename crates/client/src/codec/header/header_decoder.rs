//! Decoder for the status line and header section of an HTTP/1.x response.
//!
//! Parsing is done with `httparse` and stays zero-copy: header name and
//! value byte ranges are recorded while `httparse` borrows the buffer, and
//! the typed header map is built from shared slices of the frozen head
//! afterwards.
//!
//! The decoder also derives how the body that follows is delimited
//! ([`PayloadSize`]), which needs one piece of request context: responses to
//! HEAD requests never carry a body, whatever their headers claim.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum header section size: 8KB
//! - HTTP/1.0 and HTTP/1.1 only (HTTP/2 never reaches this decoder)

use bytes::BytesMut;
use http::{HeaderName, HeaderValue, Response, StatusCode, Version};
use httparse::Status;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{ParseError, PayloadSize, ResponseHead};

/// Maximum number of headers allowed in a response
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire header section
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decoder producing a [`ResponseHead`] and the [`PayloadSize`] of the body
/// that follows it.
pub struct HeaderDecoder {
    /// whether the request this response answers was a HEAD request
    pub(crate) head_request: bool,
}

impl Decoder for HeaderDecoder {
    type Item = (ResponseHead, PayloadSize);
    type Error = ParseError;

    /// Attempts to decode a complete response head from `src`.
    ///
    /// Returns `Ok(None)` while the head is still incomplete, and fails when
    /// the head exceeds the size limits or is not valid HTTP/1.x.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // shortest complete head: "HTTP/1.1 200 \r\n\r\n"
        if src.len() < 16 {
            return Ok(None);
        }

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut response = httparse::Response::new(&mut headers);

        let parsed_result = response.parse(src).map_err(|e| match e {
            httparse::Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            e => ParseError::invalid_header(e.to_string()),
        });

        match parsed_result? {
            Status::Complete(head_end) => {
                trace!(head_size = head_end, "parsed response head");
                ensure!(head_end <= MAX_HEADER_BYTES, ParseError::too_large_header(head_end, MAX_HEADER_BYTES));

                let header_count = response.headers.len();
                ensure!(header_count <= MAX_HEADER_NUM, ParseError::too_many_headers(header_count));

                let version = match response.version {
                    Some(0) => Version::HTTP_10,
                    Some(1) => Version::HTTP_11,
                    v => return Err(ParseError::InvalidVersion(v)),
                };

                let code = response.code.ok_or(ParseError::InvalidStatus(None))?;
                let status = StatusCode::from_u16(code).map_err(|_| ParseError::InvalidStatus(Some(code)))?;
                let reason = response.reason.unwrap_or("").to_owned();

                // record byte ranges so the borrow of `src` ends before the split below
                let mut header_index: [HeaderIndex; MAX_HEADER_NUM] = [HeaderIndex::EMPTY; MAX_HEADER_NUM];
                HeaderIndex::record(src, response.headers, &mut header_index);

                let mut head_builder = Response::builder().status(status).version(version);

                let headers = head_builder.headers_mut().unwrap();
                headers.reserve(header_count);

                let head_bytes = src.split_to(head_end).freeze();
                for index in &header_index[..header_count] {
                    // httparse verified the name is valid ASCII
                    let name = HeaderName::from_bytes(&head_bytes[index.name.0..index.name.1]).unwrap();
                    let value = HeaderValue::from_maybe_shared(head_bytes.slice(index.value.0..index.value.1))
                        .map_err(|e| ParseError::invalid_header(e.to_string()))?;
                    headers.append(name, value);
                }

                let head = ResponseHead::new(head_builder.body(()).unwrap(), reason);
                let payload_size = parse_payload(&head, self.head_request)?;

                Ok(Some((head, payload_size)))
            }
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                Ok(None)
            }
        }
    }
}

/// Byte ranges of one header's name and value within the head buffer.
#[derive(Clone, Copy)]
struct HeaderIndex {
    name: (usize, usize),
    value: (usize, usize),
}

impl HeaderIndex {
    const EMPTY: HeaderIndex = HeaderIndex { name: (0, 0), value: (0, 0) };

    fn record(bytes: &[u8], headers: &[httparse::Header<'_>], indices: &mut [HeaderIndex]) {
        let bytes_ptr = bytes.as_ptr() as usize;
        for (header, index) in headers.iter().zip(indices.iter_mut()) {
            let name_start = header.name.as_ptr() as usize - bytes_ptr;
            index.name = (name_start, name_start + header.name.len());
            let value_start = header.value.as_ptr() as usize - bytes_ptr;
            index.value = (value_start, value_start + header.value.len());
        }
    }
}

/// Derives how the response body is delimited, per RFC 9112 section 6.3.
///
/// HEAD responses and the 1xx/204/304 statuses never carry a body. After
/// that, Transfer-Encoding wins over Content-Length, and a response with
/// neither is delimited by connection close.
fn parse_payload(head: &ResponseHead, head_request: bool) -> Result<PayloadSize, ParseError> {
    let status = head.status();
    if head_request
        || status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
    {
        return Ok(PayloadSize::Empty);
    }

    let te_header = head.headers().get(http::header::TRANSFER_ENCODING);
    let cl_header = head.headers().get(http::header::CONTENT_LENGTH);

    match (te_header, cl_header) {
        (te_value @ Some(_), _) => {
            if is_chunked(te_value) {
                Ok(PayloadSize::Chunked)
            } else {
                Ok(PayloadSize::Unbounded)
            }
        }

        (None, Some(cl_value)) => {
            let cl_str = cl_value.to_str().map_err(|_| ParseError::invalid_content_length("value can't to_str"))?;

            let length = cl_str
                .trim()
                .parse::<u64>()
                .map_err(|_| ParseError::invalid_content_length(format!("value {cl_str} is not u64")))?;

            if length == 0 { Ok(PayloadSize::Empty) } else { Ok(PayloadSize::Length(length)) }
        }

        (None, None) => Ok(PayloadSize::Unbounded),
    }
}

/// Chunked must be the final encoding in the Transfer-Encoding header.
fn is_chunked(header_value: Option<&HeaderValue>) -> bool {
    const CHUNKED: &[u8] = b"chunked";
    if let Some(value) = header_value {
        if let Some(bytes) = value.as_bytes().rsplit(|b| *b == b',').next() {
            return bytes.trim_ascii() == CHUNKED;
        }
    }
    false
}
