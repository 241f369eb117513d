//! An asynchronous micro HTTP client implementation
//!
//! This crate provides a lightweight, modular HTTP client built on top of
//! tokio. A single [`send`] entry point (plus verb-specific sugar like
//! [`get`] and [`post`]) produces a normalized [`Response`] regardless of
//! the protocol version the exchange ran over.
//!
//! # Features
//!
//! - HTTP/1.0, HTTP/1.1 and HTTP/2 behind one call surface
//! - Asynchronous I/O using tokio
//! - Redirect following with method downgrade and a recorded trail
//! - Per-hop timeouts with guaranteed resource cleanup
//! - Transparent gzip/deflate response decompression
//! - Response body size caps for buffered bodies
//! - Streaming request and response bodies
//! - Pluggable transport (plain TCP by default)
//!
//! # Example
//!
//! ```no_run
//! use micro_client::{RequestOptions, ResponseType, send};
//! use tracing::{Level, info};
//! use tracing_subscriber::FmtSubscriber;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Initialize logging
//!     let subscriber = FmtSubscriber::builder()
//!         .with_max_level(Level::INFO)
//!         .finish();
//!     tracing::subscriber::set_global_default(subscriber)
//!         .expect("setting default subscriber failed");
//!
//!     let opts = RequestOptions {
//!         response_type: Some(ResponseType::Json),
//!         max_redirects: Some(5),
//!         ..RequestOptions::new("http://127.0.0.1:8080/users/1")
//!     };
//!
//!     match send(opts).await {
//!         Ok(response) => {
//!             info!(status = %response.status, "request finished");
//!             info!("body: {:?}", response.data);
//!         }
//!         Err(e) => {
//!             info!("request failed: {e}");
//!         }
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`options`]: the caller-facing request description
//! - [`authority`] and [`builder`]: url resolution and the transport
//!   request descriptor
//! - [`codec`]: HTTP/1.x wire encoding/decoding
//! - [`transport`]: the connection capability (plain TCP by default)
//! - [`protocol`]: message, response and error types
//!
//! A `send` call flows through them in order: options are merged and
//! normalized, the builder resolves the url and produces a transport
//! request, a per-protocol executor runs the exchange, and the response
//! processor decompresses, buffers and coerces the body. Redirect responses
//! loop back to the builder with rewritten options, up to the configured
//! limit.
//!
//! # Limitations
//!
//! - No TLS in the crate itself (plug a TLS transport in via [`send_via`])
//! - No connection pooling: one connection per hop
//! - No proxy support
//! - Maximum response header size: 8KB, maximum number of headers: 64

pub mod authority;
pub mod builder;
pub mod codec;
pub mod options;
pub mod protocol;
pub mod transport;

mod client;
mod decompress;
mod executor;
mod processor;
mod transform;

pub use client::{delete, get, head, options, patch, post, put, send, send_via};
pub use options::{Body, Credentials, HttpVersion, RequestOptions, ResponseType};
pub use protocol::{BodyStream, ClientError, RedirectHop, Response, ResponseData};

mod utils;
pub(crate) use utils::ensure;
