//! HTTP request head type.
//!
//! The outgoing side needs no extra functionality on top of the standard
//! `http::Request` type, so the head is a plain alias with an empty body
//! placeholder. The wire codec attaches the payload separately.

use http::Request;

/// Start line and headers of an outgoing request, before the payload.
pub type RequestHead = Request<()>;
