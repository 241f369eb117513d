//! Streaming decoder for HTTP/1.x responses.
//!
//! Works in two phases, tracked by the `payload_decoder` field:
//! head parsing first (via [`HeaderDecoder`]), then payload decoding (via
//! [`PayloadDecoder`]) until the end-of-payload marker.
//!
//! Close-delimited responses have no in-band end marker, so the decoder also
//! participates in the framed reader's EOF path: when the connection closes,
//! `decode_eof` turns the close into the payload's `Eof` item. For sized and
//! chunked bodies a close before the body completes is an error instead.

use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, ResponseHead};
use bytes::BytesMut;
use http::Method;
use tokio_util::codec::Decoder;

pub struct ResponseDecoder {
    header_decoder: HeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
}

impl ResponseDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a decoder aware of the request method the response answers.
    ///
    /// Responses to HEAD requests carry headers describing a body that is
    /// never sent; the decoder has to know not to wait for it.
    pub fn for_method(method: &Method) -> Self {
        Self { header_decoder: HeaderDecoder { head_request: method == Method::HEAD }, payload_decoder: None }
    }
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self { header_decoder: HeaderDecoder { head_request: false }, payload_decoder: None }
    }
}

impl Decoder for ResponseDecoder {
    type Item = Message<(ResponseHead, PayloadSize)>;
    type Error = ParseError;

    /// Attempts to decode the next frame of the response.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Message::Header(_)))`: the decoded response head
    /// - `Ok(Some(Message::Payload(_)))`: a payload chunk or end-of-payload
    /// - `Ok(None)`: need more data
    /// - `Err(_)`: the peer sent something that is not valid HTTP
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // payload phase
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let message = match payload_decoder.decode(src)? {
                Some(item @ PayloadItem::Chunk(_)) => Some(Message::Payload(item)),
                Some(item @ PayloadItem::Eof) => {
                    // this response's payload is complete
                    self.payload_decoder.take();
                    Some(Message::Payload(item))
                }
                None => None,
            };

            return Ok(message);
        }

        // head phase
        let message = match self.header_decoder.decode(src)? {
            Some((head, payload_size)) => {
                self.payload_decoder = Some(payload_size.into());
                Some(Message::Header((head, payload_size)))
            }
            None => None,
        };

        Ok(message)
    }

    /// Handles the connection closing.
    ///
    /// A close ends a close-delimited body normally, and is an error in any
    /// other phase that is still incomplete.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }

        match &self.payload_decoder {
            Some(payload_decoder) if payload_decoder.is_close_delimited() => {
                self.payload_decoder.take();
                Ok(Some(Message::Payload(PayloadItem::Eof)))
            }
            Some(_) => Err(ParseError::invalid_body("connection closed before response body completed")),
            None if src.is_empty() => Ok(None),
            None => Err(ParseError::invalid_body("connection closed while reading response head")),
        }
    }
}
