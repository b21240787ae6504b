//! HTTP header collection.
//!
//! [`HttpHeaders`] is an ordered list of [`HttpHeader`] values that never holds
//! two entries whose names compare equal ignoring ASCII case. Updating a header
//! that already exists replaces it in place, so insertion order is stable.

pub mod defaults;

use std::collections::HashMap;

use http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Standard header names.
pub mod names {
    /// `User-Agent`
    pub const USER_AGENT: &str = "User-Agent";
    /// `Content-Type`
    pub const CONTENT_TYPE: &str = "Content-Type";
    /// `Content-Length`
    pub const CONTENT_LENGTH: &str = "Content-Length";
    /// `Content-Encoding`
    pub const CONTENT_ENCODING: &str = "Content-Encoding";
    /// `Content-Disposition`
    pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
    /// `Accept`
    pub const ACCEPT: &str = "Accept";
    /// `Accept-Charset`
    pub const ACCEPT_CHARSET: &str = "Accept-Charset";
    /// `Accept-Encoding`
    pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
    /// `Accept-Language`
    pub const ACCEPT_LANGUAGE: &str = "Accept-Language";
    /// `Cache-Control`
    pub const CACHE_CONTROL: &str = "Cache-Control";
    /// `Authorization`
    pub const AUTHORIZATION: &str = "Authorization";
    /// `Date`
    pub const DATE: &str = "Date";
    /// `x-api-key`
    pub const X_API_KEY: &str = "x-api-key";
    /// `User-Authorization`
    pub const USER_AUTHORIZATION: &str = "User-Authorization";
}

/// Common content type values.
pub mod content_types {
    /// `application/x-www-form-urlencoded`
    pub const FORM_ENCODED: &str = "application/x-www-form-urlencoded";
    /// `application/json`
    pub const JSON: &str = "application/json";
    /// `application/xml`
    pub const XML: &str = "application/xml";
    /// `text/plain`
    pub const TEXT_PLAIN: &str = "text/plain";
    /// `text/html`
    pub const HTML: &str = "text/html";
    /// `text/css`
    pub const CSS: &str = "text/css";
    /// `application/octet-stream`
    pub const OCTET_STREAM: &str = "application/octet-stream";
    /// `image/jpeg`
    pub const JPEG: &str = "image/jpeg";
    /// `image/png`
    pub const PNG: &str = "image/png";
    /// `image/gif`
    pub const GIF: &str = "image/gif";
    /// `image/svg+xml`
    pub const SVG: &str = "image/svg+xml";
    /// `application/fhir+json`
    pub const FHIR_JSON: &str = "application/fhir+json";
    /// `application/json-patch+json`
    pub const PATCH_JSON: &str = "application/json-patch+json";
}

/// A single header name/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HttpHeader {
    name: String,
    value: String,
}

impl HttpHeader {
    /// Create a header.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Header name as given.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Header value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether this header's name equals `name`, ignoring ASCII case.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// `Accept` header.
    pub fn accept(value: impl Into<String>) -> Self {
        Self::new(names::ACCEPT, value)
    }

    /// `Accept-Charset` header.
    pub fn accept_charset(value: impl Into<String>) -> Self {
        Self::new(names::ACCEPT_CHARSET, value)
    }

    /// `Accept-Language` header.
    pub fn accept_language(value: impl Into<String>) -> Self {
        Self::new(names::ACCEPT_LANGUAGE, value)
    }

    /// `Accept-Encoding` header.
    pub fn accept_encoding(value: impl Into<String>) -> Self {
        Self::new(names::ACCEPT_ENCODING, value)
    }

    /// `Authorization` header with a raw value.
    pub fn authorization(value: impl Into<String>) -> Self {
        Self::new(names::AUTHORIZATION, value)
    }

    /// `Authorization: Bearer <token>` header.
    pub fn bearer(token: &str) -> Self {
        Self::authorization(format!("Bearer {token}"))
    }

    /// `Content-Type` header.
    pub fn content_type(value: impl Into<String>) -> Self {
        Self::new(names::CONTENT_TYPE, value)
    }

    /// `Content-Disposition` header.
    pub fn content_disposition(value: impl Into<String>) -> Self {
        Self::new(names::CONTENT_DISPOSITION, value)
    }

    /// `User-Agent` header.
    pub fn user_agent(value: impl Into<String>) -> Self {
        Self::new(names::USER_AGENT, value)
    }
}

/// Ordered header collection, unique by case-insensitive name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<HttpHeader>", into = "Vec<HttpHeader>")]
pub struct HttpHeaders {
    headers: Vec<HttpHeader>,
}

impl HttpHeaders {
    /// Create an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header.has_name(name))
    }

    /// Replace the header with the same name in place, or append it.
    pub fn update(&mut self, header: HttpHeader) {
        match self.position(&header.name) {
            Some(index) => self.headers[index] = header,
            None => self.headers.push(header),
        }
    }

    /// Replace or append a header built from `name` and `value`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.update(HttpHeader::new(name, value));
    }

    /// Return a copy with `header` updated (builder-style).
    #[must_use]
    pub fn add(mut self, header: HttpHeader) -> Self {
        self.update(header);
        self
    }

    /// Update every header of `other` into this collection.
    pub fn merge(&mut self, other: &Self) {
        for header in other {
            self.update(header.clone());
        }
    }

    /// Remove the header named `name`, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<HttpHeader> {
        self.position(name).map(|index| self.headers.remove(index))
    }

    /// Case-insensitive value lookup.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.position(name).map(|index| self.headers[index].value())
    }

    /// Whether a header named `name` exists.
    pub fn contains_name(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Whether an identical header (same name and value) exists.
    pub fn contains(&self, header: &HttpHeader) -> bool {
        self.value(header.name()) == Some(header.value())
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, HttpHeader> {
        self.headers.iter()
    }

    /// Sort by lowercased name.
    pub fn sort(&mut self) {
        self.headers
            .sort_by_cached_key(|header| header.name.to_ascii_lowercase());
    }

    /// Return a copy sorted by lowercased name.
    #[must_use]
    pub fn sorted(&self) -> Self {
        let mut headers = self.clone();
        headers.sort();
        headers
    }

    /// Materialize into a plain name to value map.
    pub fn dictionary(&self) -> HashMap<String, String> {
        self.headers
            .iter()
            .map(|header| (header.name.clone(), header.value.clone()))
            .collect()
    }

    /// Convert to an [`http::HeaderMap`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if a name or value contains characters
    /// the `http` crate refuses.
    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for header in &self.headers {
            let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(|err| {
                Error::InvalidRequest(format!("header name {:?}: {err}", header.name))
            })?;
            let value = HeaderValue::from_str(&header.value).map_err(|err| {
                Error::InvalidRequest(format!("header value for {:?}: {err}", header.name))
            })?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

impl From<Vec<HttpHeader>> for HttpHeaders {
    fn from(headers: Vec<HttpHeader>) -> Self {
        headers.into_iter().collect()
    }
}

impl From<HttpHeaders> for Vec<HttpHeader> {
    fn from(headers: HttpHeaders) -> Self {
        headers.headers
    }
}

impl From<&HeaderMap> for HttpHeaders {
    fn from(map: &HeaderMap) -> Self {
        let mut headers = Self::new();
        for (name, value) in map {
            headers.insert(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        headers
    }
}

impl FromIterator<HttpHeader> for HttpHeaders {
    fn from_iter<I: IntoIterator<Item = HttpHeader>>(iter: I) -> Self {
        let mut headers = Self::new();
        headers.extend(iter);
        headers
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HttpHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(name, value)| HttpHeader::new(name, value))
            .collect()
    }
}

impl Extend<HttpHeader> for HttpHeaders {
    fn extend<I: IntoIterator<Item = HttpHeader>>(&mut self, iter: I) {
        for header in iter {
            self.update(header);
        }
    }
}

impl<'a> IntoIterator for &'a HttpHeaders {
    type Item = &'a HttpHeader;
    type IntoIter = std::slice::Iter<'a, HttpHeader>;

    fn into_iter(self) -> Self::IntoIter {
        self.headers.iter()
    }
}

impl IntoIterator for HttpHeaders {
    type Item = HttpHeader;
    type IntoIter = std::vec::IntoIter<HttpHeader>;

    fn into_iter(self) -> Self::IntoIter {
        self.headers.into_iter()
    }
}
