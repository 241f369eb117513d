//! Body handling for request and response payloads.
//!
//! Requests are written with either a fixed Content-Length or chunked
//! transfer encoding; responses additionally support close-delimited bodies
//! (no framing at all, HTTP/1.0 style).
//!
//! - Decoders: chunked, fixed-length and close-delimited strategies,
//!   coordinated by [`PayloadDecoder`]
//! - Encoders: chunked and fixed-length strategies, coordinated by
//!   [`PayloadEncoder`]

mod chunked_decoder;
mod chunked_encoder;
mod eof_decoder;
mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
