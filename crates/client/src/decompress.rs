//! Transparent decompression of response bodies.
//!
//! The decoders are write-based: compressed chunks are written in as they
//! arrive and whatever inflated output is ready gets taken back out, so a
//! body can be inflated without ever holding the whole of it. `compress`
//! tagged bodies go through the gzip decoder, the closest match flate2
//! offers for the legacy tag, and `deflate` through zlib.

use std::io::{self, Write};
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Bytes, BytesMut};
use flate2::write::{GzDecoder, ZlibDecoder};
use futures::Stream;
use pin_project_lite::pin_project;
use tracing::trace;

use crate::protocol::ClientError;

pub(crate) struct Writer {
    buf: BytesMut,
}

impl Writer {
    fn new() -> Writer {
        Writer { buf: BytesMut::new() }
    }

    fn take(&mut self) -> Bytes {
        self.buf.split().freeze()
    }
}

impl io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Content decoder selected from the `content-encoding` response header.
pub(crate) enum Decoder {
    Gzip(GzDecoder<Writer>),
    Deflate(ZlibDecoder<Writer>),
}

impl Decoder {
    /// Picks a decoder for the encoding tag, when it is one we decode.
    pub(crate) fn select(encoding: &str) -> Option<Self> {
        match encoding {
            "gzip" | "compress" => Some(Self::Gzip(GzDecoder::new(Writer::new()))),
            "deflate" => Some(Self::Deflate(ZlibDecoder::new(Writer::new()))),
            _ => None,
        }
    }

    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Self::Gzip(decoder) => match decoder.write_all(data) {
                Ok(()) => Ok(()),
                Err(err) => {
                    trace!("error decoding gzip body: {}", err);
                    Err(err)
                }
            },

            Self::Deflate(decoder) => match decoder.write_all(data) {
                Ok(()) => Ok(()),
                Err(err) => {
                    trace!("error decoding deflate body: {}", err);
                    Err(err)
                }
            },
        }
    }

    fn take(&mut self) -> Bytes {
        match self {
            Self::Gzip(decoder) => decoder.get_mut().take(),
            Self::Deflate(decoder) => decoder.get_mut().take(),
        }
    }

    fn finish(self) -> io::Result<Bytes> {
        match self {
            Self::Gzip(decoder) => decoder.finish().map(|writer| writer.buf.freeze()),
            Self::Deflate(decoder) => decoder.finish().map(|writer| writer.buf.freeze()),
        }
    }
}

pin_project! {
    /// Response body stream that inflates chunks as they arrive.
    pub(crate) struct DecodedStream<S> {
        #[pin]
        inner: S,
        decoder: Option<Decoder>,
    }
}

impl<S> DecodedStream<S> {
    pub(crate) fn new(inner: S, decoder: Decoder) -> Self {
        Self { inner, decoder: Some(decoder) }
    }
}

impl<S> Stream for DecodedStream<S>
where
    S: Stream<Item = Result<Bytes, ClientError>>,
{
    type Item = Result<Bytes, ClientError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if this.decoder.is_none() {
            return Poll::Ready(None);
        }

        loop {
            return match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(bytes)) => {
                    // unwrap is safe: the decoder is only taken on the None arm
                    if let Err(e) = this.decoder.as_mut().unwrap().write(&bytes) {
                        return Poll::Ready(Some(Err(ClientError::transport(e))));
                    }
                    let decoded = this.decoder.as_mut().unwrap().take();
                    if decoded.is_empty() {
                        continue;
                    }
                    Poll::Ready(Some(Ok(decoded)))
                }
                Some(Err(e)) => Poll::Ready(Some(Err(e))),
                None => {
                    // the body ended: flush whatever the decoder still holds
                    match this.decoder.take().unwrap().finish() {
                        Ok(decoded) if decoded.is_empty() => Poll::Ready(None),
                        Ok(decoded) => Poll::Ready(Some(Ok(decoded))),
                        Err(e) => Poll::Ready(Some(Err(ClientError::transport(e)))),
                    }
                }
            };
        }
    }
}
