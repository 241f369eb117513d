//! Wire codec for HTTP/1.x exchanges, seen from the client side.
//!
//! Built on `tokio_util`'s [`Encoder`]/[`Decoder`] traits so the executor
//! can drive it through `FramedWrite`/`FramedRead`:
//!
//! - Outgoing: [`RequestEncoder`] serializes the request head and payload,
//!   with header encoding in the `header` module and payload strategies
//!   (content-length, chunked) in the `body` module.
//! - Incoming: [`ResponseDecoder`] parses the status line, headers and
//!   payload, including close-delimited bodies that only end with the
//!   connection.
//!
//! Both sides are state machines: a head frame first, payload frames until
//! the end-of-payload marker after it.
//!
//! [`Encoder`]: tokio_util::codec::Encoder
//! [`Decoder`]: tokio_util::codec::Decoder

mod body;
mod header;
mod request_encoder;
mod response_decoder;

pub use request_encoder::RequestEncoder;
pub use response_decoder::ResponseDecoder;
