use std::io;
use thiserror::Error;

/// Failure surface of a `send` call.
///
/// Every error a request can end with lands here: validation failures that
/// surface before any I/O (`InvalidUrl`, `UnsupportedDataType`), failures of
/// the exchange itself (`Timeout`, `Transport`, the wire errors), and the
/// limits the caller configured (`MaxContentLength`, `MaxRedirects`).
/// Nothing is retried and nothing is swallowed: the first failure of a call
/// is the one the caller observes.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Data must be Stream, Buffer, Object or String")]
    UnsupportedDataType,

    #[error("invalid url: {reason}")]
    InvalidUrl { reason: String },

    #[error("Timeout of {ms}ms exceeded")]
    Timeout { ms: u64 },

    #[error("MaxContentLength size of {limit} exceeded")]
    MaxContentLength { limit: i64 },

    #[error("Max redirects exceeded")]
    MaxRedirects,

    #[error("transport error: {source}")]
    Transport {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("request error: {source}")]
    Send {
        #[from]
        source: SendError,
    },

    #[error("response error: {source}")]
    Receive {
        #[from]
        source: ParseError,
    },
}

impl ClientError {
    pub fn invalid_url<S: ToString>(reason: S) -> Self {
        Self::InvalidUrl { reason: reason.to_string() }
    }

    pub fn timeout(ms: u64) -> Self {
        Self::Timeout { ms }
    }

    pub fn max_content_length(limit: i64) -> Self {
        Self::MaxContentLength { limit }
    }

    pub fn transport<E: Into<Box<dyn std::error::Error + Send + Sync>>>(e: E) -> Self {
        Self::Transport { source: e.into() }
    }
}

/// Errors while decoding a response from the wire.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header section too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid status code: {0:?}")]
    InvalidStatus(Option<u16>),

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Errors while building or encoding a request onto the wire.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_request<S: ToString>(str: S) -> Self {
        Self::InvalidRequest { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
