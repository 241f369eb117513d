//! Core HTTP protocol abstractions for the client.
//!
//! This module holds the building blocks the rest of the crate is assembled
//! from:
//!
//! - **Message handling** ([`message`]): wire-level frames shared by the
//!   codecs: [`Message`], [`PayloadItem`] and [`PayloadSize`].
//!
//! - **Request side** ([`request`]): [`RequestHead`], the outgoing start
//!   line and headers.
//!
//! - **Response side** ([`response`]): [`ResponseHead`] for the decoded
//!   status line and headers, and the caller-facing [`Response`],
//!   [`ResponseData`] and [`RedirectHop`] types.
//!
//! - **Error handling** ([`error`]): [`ClientError`] as the failure surface
//!   of a call, with [`ParseError`] and [`SendError`] for the two wire
//!   directions.

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::RequestHead;

mod response;
pub use response::BodyStream;
pub use response::RedirectHop;
pub use response::Response;
pub use response::ResponseData;
pub use response::ResponseHead;

mod error;
pub use error::ClientError;
pub use error::ParseError;
pub use error::SendError;
