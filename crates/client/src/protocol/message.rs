use bytes::{Buf, Bytes};

/// A frame travelling through the wire codecs: either a message head or a
/// piece of payload.
///
/// The generic parameter `T` is the head type (request head on the encode
/// side, response head on the decode side), while `Data` is the payload chunk
/// type (defaults to `Bytes`).
pub enum Message<T, Data: Buf = Bytes> {
    /// The head (start line plus header section) of a message
    Header(T),
    /// A chunk of payload data or the end-of-payload marker
    Payload(PayloadItem<Data>),
}

/// One item of a message payload stream: a data chunk or end of payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    Chunk(Data),
    Eof,
}

/// How a message body is delimited on the wire.
///
/// Responses may also be delimited by connection close ([`Unbounded`]),
/// which has no counterpart on the request side.
///
/// [`Unbounded`]: PayloadSize::Unbounded
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Body with a known length in bytes (`content-length`)
    Length(u64),
    /// Body using chunked transfer encoding
    Chunked,
    /// Body runs until the peer closes the connection
    Unbounded,
    /// No body at all
    Empty,
}

impl PayloadSize {
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, PayloadSize::Chunked)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }

    #[inline]
    pub fn is_unbounded(&self) -> bool {
        matches!(self, PayloadSize::Unbounded)
    }
}

impl<T> Message<T> {
    #[inline]
    pub fn is_payload(&self) -> bool {
        matches!(self, Message::Payload(_))
    }

    #[inline]
    pub fn is_header(&self) -> bool {
        matches!(self, Message::Header(_))
    }

    /// Converts the message into its payload item, if it is one.
    pub fn into_payload_item(self) -> Option<PayloadItem> {
        match self {
            Message::Header(_) => None,
            Message::Payload(payload_item) => Some(payload_item),
        }
    }
}

impl<D: Buf> PayloadItem<D> {
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }
}

impl PayloadItem {
    /// Returns the contained bytes when this is a chunk.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }

    /// Consumes the item and returns the contained bytes when this is a chunk.
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}
