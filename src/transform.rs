//! Response transforms.
//!
//! A transform turns a validated [`DataResponse`] into the caller's result
//! type. The adapters never call one before validation has passed.

use bytes::Bytes;
use http::{HeaderMap, StatusCode, Uri, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;

/// A buffered response together with the URI it answered.
#[derive(Debug, Clone)]
pub struct DataResponse {
    uri: Uri,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl DataResponse {
    /// Wrap a wire response.
    pub fn new(uri: Uri, response: http::Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            uri,
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Requested URI.
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Response body.
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// `Content-Type` header value.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// Body decoded as lossy UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Take the body.
    pub fn into_body(self) -> Bytes {
        self.body
    }
}

/// Return the body unchanged.
///
/// # Errors
///
/// Never fails; the signature matches the other transforms.
pub fn identity(response: &DataResponse) -> Result<Bytes> {
    Ok(response.body.clone())
}

/// Decode the body as JSON into `T`.
///
/// # Errors
///
/// [`Error::Decode`](crate::Error::Decode) if the body does not match `T`.
pub fn json_decode<T: DeserializeOwned>(response: &DataResponse) -> Result<T> {
    Ok(serde_json::from_slice(&response.body)?)
}

/// Decode the body as an untyped JSON value.
///
/// # Errors
///
/// [`Error::Decode`](crate::Error::Decode) if the body is not JSON.
pub fn json_value(response: &DataResponse) -> Result<Value> {
    json_decode(response)
}
