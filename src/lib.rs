//! # Request building and response validation over a pluggable HTTP session
//! Webservice is a thin convenience layer over an HTTP transport.
//! It provides:
//! - An immutable-style [`Request`] builder with query, form, JSON and
//!   multipart bodies
//! - Percent and JSON parameter encoding
//! - Response validation (status range, content-type allow-list, non-empty body)
//! - One request pipeline exposed as async methods, completion-callback tasks
//!   and one-shot streams
//!
//! # Quick start
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let body = webservice::get("https://example.com/").await?;
//! println!("{}", String::from_utf8_lossy(&body));
//! # Ok(())
//! # }
//! ```
//!
//! Any transport can be used by implementing [`Session`]; see [`MockSession`]
//! for an in-memory one.

pub mod backend;
pub mod encoding;
mod error;
pub mod header;
mod method;
pub mod mock;
pub mod multipart;
pub mod request;
pub mod requestable;
pub mod service;
pub mod session;
pub mod transform;
pub mod validate;

#[cfg(test)]
mod tests;

pub use error::{Error, ErrorKind, MultipartError, Result};
pub use header::{HttpHeader, HttpHeaders};
pub use method::HttpMethod;
pub use mock::MockSession;
pub use multipart::MultipartFormData;
pub use request::{CachePolicy, Request};
pub use requestable::{Requestable, Route};
pub use service::{DataTask, ServicePublisher, WebService};
pub use session::{Session, SessionConfiguration};
pub use transform::DataResponse;
pub use validate::Validation;

#[cfg(all(not(target_arch = "wasm32"), feature = "hyper-backend"))]
pub use backend::{DefaultSession, HyperSession};

/// A service over the default session.
///
/// Must be called from within a tokio runtime.
#[cfg(all(not(target_arch = "wasm32"), feature = "hyper-backend"))]
pub fn client() -> WebService<DefaultSession> {
    WebService::new(DefaultSession::default())
}

/// Fetch `url` with the default session and return the body.
///
/// # Errors
///
/// Any [`Error`] from the pipeline.
#[cfg(all(not(target_arch = "wasm32"), feature = "hyper-backend"))]
pub async fn get(url: impl Into<String>) -> Result<bytes::Bytes> {
    client().data(Request::get(url)).await
}
