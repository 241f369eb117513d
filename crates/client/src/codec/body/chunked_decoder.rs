//! Decoder for chunked transfer encoded response bodies, as specified in
//! [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1).
//!
//! Each chunk carries its own hex-encoded size, so the decoder walks a byte
//! oriented state machine: size line (with optional extensions), chunk data,
//! terminating CRLF, and finally the zero chunk with optional trailer fields.

use std::cmp;

use crate::protocol::{ParseError, PayloadItem};
use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

/// State machine for chunked transfer decoding.
///
/// Chunk data is handed out as soon as it arrives; a chunk split across
/// reads produces several `Chunk` items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    remaining: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Hex digits of the chunk size
    Size,
    /// Whitespace between the size and the line end
    SizeWs,
    /// Chunk extensions, skipped up to the line end
    Extension,
    /// LF closing the size line
    SizeLf,
    /// Chunk data bytes
    Body,
    /// CR after the chunk data
    BodyCr,
    /// LF after the chunk data
    BodyLf,
    /// Trailer field bytes, skipped up to the line end
    Trailer,
    /// LF closing a trailer line
    TrailerLf,
    /// CR of the final empty line
    EndCr,
    /// LF of the final empty line
    EndLf,
    /// Message complete
    End,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: ChunkedState::Size, remaining: 0 }
    }

    fn push_size_digit(&mut self, digit: u64) -> Result<(), ParseError> {
        self.remaining = self
            .remaining
            .checked_mul(16)
            .and_then(|size| size.checked_add(digit))
            .ok_or_else(|| ParseError::invalid_body("chunk size overflow"))?;
        Ok(())
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    /// Yields `Chunk` items for decoded data, `Eof` once the zero chunk and
    /// its trailers are consumed, and `None` while more input is needed.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        use ChunkedState::*;

        loop {
            if self.state == End {
                trace!("finished reading chunked data");
                return Ok(Some(PayloadItem::Eof));
            }

            if self.state == Body {
                if self.remaining == 0 {
                    self.state = BodyCr;
                    continue;
                }
                if src.is_empty() {
                    return Ok(None);
                }
                let len = cmp::min(self.remaining, src.len() as u64);
                let bytes = src.split_to(len as usize).freeze();
                self.remaining -= bytes.len() as u64;
                if self.remaining == 0 {
                    self.state = BodyCr;
                }
                trace!(len = bytes.len(), "read chunked bytes");
                return Ok(Some(PayloadItem::Chunk(bytes)));
            }

            if src.is_empty() {
                return Ok(None);
            }
            let byte = src.get_u8();

            self.state = match (self.state, byte) {
                (Size, b @ b'0'..=b'9') => {
                    self.push_size_digit(u64::from(b - b'0'))?;
                    Size
                }
                (Size, b @ b'a'..=b'f') => {
                    self.push_size_digit(u64::from(b - b'a' + 10))?;
                    Size
                }
                (Size, b @ b'A'..=b'F') => {
                    self.push_size_digit(u64::from(b - b'A' + 10))?;
                    Size
                }
                // whitespace may follow the size, but no further digits
                (Size | SizeWs, b' ' | b'\t') => SizeWs,
                (Size | SizeWs | Extension, b';') => Extension,
                (Size | SizeWs | Extension, b'\r') => SizeLf,
                // lenient peers may miss the CR; a bare LF inside an
                // extension is rejected outright
                (Extension, b'\n') => {
                    return Err(ParseError::invalid_body("chunk extension contains bare LF"));
                }
                (Extension, _) => Extension,
                (SizeLf, b'\n') => {
                    if self.remaining == 0 {
                        EndCr
                    } else {
                        Body
                    }
                }
                (BodyCr, b'\r') => BodyLf,
                (BodyLf, b'\n') => Size,
                (Trailer, b'\r') => TrailerLf,
                (Trailer, _) => Trailer,
                (TrailerLf, b'\n') => EndCr,
                (EndCr, b'\r') => EndLf,
                // anything but the final CR opens a trailer field
                (EndCr, _) => Trailer,
                (EndLf, b'\n') => End,
                (state, byte) => {
                    return Err(ParseError::invalid_body(format!(
                        "unexpected byte {byte:#04x} in chunked {state:?} state"
                    )));
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chunk() {
        let mut buffer = BytesMut::from(&b"b\r\nhello world\r\n0\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(item.as_bytes().unwrap(), &"hello world");

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(item.is_eof());
    }

    #[test]
    fn multiple_chunks() {
        let mut buffer = BytesMut::from(&b"5\r\nhello\r\n7\r\n, world\r\n0\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &"hello");

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &", world");

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }

    #[test]
    fn uppercase_size_and_extension() {
        let mut buffer = BytesMut::from(&b"B;name=value\r\nhello world\r\n0\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &"hello world");

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }

    #[test]
    fn trailers_are_skipped() {
        let mut buffer = BytesMut::from(&b"5\r\nhello\r\n0\r\nExpires: never\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &"hello");

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }

    #[test]
    fn chunk_split_across_reads() {
        let mut buffer = BytesMut::from(&b"5\r\nhel"[..]);
        let mut decoder = ChunkedDecoder::new();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &"hel");

        assert!(decoder.decode(&mut buffer).unwrap().is_none());

        buffer.extend_from_slice(b"lo\r\n0\r\n\r\n");

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &"lo");

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }

    #[test]
    fn invalid_size_is_rejected() {
        let mut buffer = BytesMut::from(&b"xyz\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert!(decoder.decode(&mut buffer).is_err());
    }

    #[test]
    fn missing_chunk_crlf_is_rejected() {
        let mut buffer = BytesMut::from(&b"5\r\nhelloXX"[..]);
        let mut decoder = ChunkedDecoder::new();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &"hello");

        assert!(decoder.decode(&mut buffer).is_err());
    }

    #[test]
    fn size_overflow_is_rejected() {
        let mut buffer = BytesMut::from(&b"fffffffffffffffff\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert!(decoder.decode(&mut buffer).is_err());
    }

    #[test]
    fn zero_chunk_only() {
        let mut buffer = BytesMut::from(&b"0\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }
}
