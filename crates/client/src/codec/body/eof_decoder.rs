//! Decoder for close-delimited response bodies.
//!
//! Responses without a Content-Length or Transfer-Encoding header (HTTP/1.0
//! style) are delimited by connection close: everything the peer sends until
//! the connection ends is payload. The end-of-payload marker is produced by
//! the response decoder's `decode_eof` path, not here.

use crate::protocol::{ParseError, PayloadItem};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EofDecoder;

impl Decoder for EofDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        Ok(Some(PayloadItem::Chunk(src.split().freeze())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_everything() {
        let mut buffer = BytesMut::from(&b"anything goes"[..]);
        let mut decoder = EofDecoder;

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(item.as_bytes().unwrap(), &"anything goes");

        assert!(buffer.is_empty());
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
    }
}
