//! Payload transformation at the two edges of an exchange.
//!
//! On the way out, the caller's [`Body`] becomes a transport-ready
//! [`WireBody`], recording `content-length` (and `content-type` for JSON)
//! on the outgoing headers as a side effect. Live streams pass through
//! untouched: the transport chunks them and no length is recorded.
//!
//! On the way back, the fully buffered response bytes are coerced into the
//! requested [`ResponseData`] shape. Malformed JSON never fails: the raw
//! decoded text is returned instead.

use bytes::Bytes;
use futures::stream::BoxStream;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::io;

use crate::options::{Body, ResponseType};
use crate::protocol::{ClientError, ResponseData, SendError};

/// Request payload in wire form.
pub(crate) enum WireBody {
    Empty,
    Buffered(Bytes),
    Stream(BoxStream<'static, io::Result<Bytes>>),
}

/// Converts the caller payload into wire form.
pub(crate) fn encode_request_body(data: Body, headers: &mut HeaderMap) -> Result<WireBody, ClientError> {
    let bytes = match data {
        Body::Empty => return Ok(WireBody::Empty),
        Body::Stream(stream) => return Ok(WireBody::Stream(stream)),
        Body::Bytes(bytes) => bytes,
        Body::Text(text) => Bytes::from(text),
        Body::Json(value) => {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json;charset=utf-8"));
            }
            let text = serde_json::to_string(&value).map_err(|e| SendError::invalid_body(e.to_string()))?;
            Bytes::from(text)
        }
    };

    headers.insert(CONTENT_LENGTH, HeaderValue::from(bytes.len() as u64));
    Ok(WireBody::Buffered(bytes))
}

/// Decodes a fully buffered response body into the requested shape.
pub(crate) fn decode_response_body(bytes: Bytes, response_type: ResponseType, encoding: &str) -> ResponseData {
    match response_type {
        ResponseType::ArrayBuffer => ResponseData::Bytes(bytes),
        ResponseType::Json => {
            let text = decode_text(&bytes, encoding);
            // malformed json falls back to the raw text
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => ResponseData::Json(value),
                Err(_) => ResponseData::Text(text),
            }
        }
        ResponseType::Text | ResponseType::Stream => ResponseData::Text(decode_text(&bytes, encoding)),
    }
}

fn decode_text(bytes: &Bytes, encoding: &str) -> String {
    match encoding {
        "latin1" | "iso-8859-1" | "binary" => bytes.iter().map(|b| char::from(*b)).collect(),
        // utf8, and lossy utf-8 for anything unrecognized
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}
