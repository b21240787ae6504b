//! Request builder.
//!
//! A [`Request`] describes an outgoing call before it is turned into an
//! [`http::Request`]. Every setter consumes the request and returns the
//! modified value, so requests are built by chaining:
//!
//! ```
//! use webservice::{HttpMethod, Request, encoding::parameters};
//!
//! let request = Request::new(HttpMethod::Get, "http://localhost:8080/search")
//!     .set_parameters(parameters([("q", "rust")]), None)
//!     .set_header_value("yes", "X-Trace");
//! let wire = request.to_http_request().unwrap();
//! assert_eq!(wire.uri(), "http://localhost:8080/search?q=rust");
//! ```

use std::{fmt, time::Duration};

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use percent_encoding::AsciiSet;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    Error, HttpHeader, HttpHeaders, HttpMethod, MultipartFormData, Result,
    encoding::{
        self, ParameterEncoding, Parameters, QueryItem, QueryParameterEncoder,
        default_query_encoder,
    },
    header::{content_types, names},
};

/// Timeout applied when none is set.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Caching behaviour requested from the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Whatever the protocol's caching rules say.
    #[default]
    UseProtocolCachePolicy,
    /// Always go to the origin.
    ReloadIgnoringLocalCacheData,
    /// Prefer cached data, load if missing.
    ReturnCacheDataElseLoad,
    /// Only use cached data.
    ReturnCacheDataDontLoad,
}

impl CachePolicy {
    /// `Cache-Control` request directive expressing this policy, if any.
    pub const fn cache_control(self) -> Option<&'static str> {
        match self {
            Self::UseProtocolCachePolicy => None,
            Self::ReloadIgnoringLocalCacheData => Some("no-cache"),
            Self::ReturnCacheDataElseLoad => Some("max-stale"),
            Self::ReturnCacheDataDontLoad => Some("only-if-cached"),
        }
    }
}

/// Per-request transport options, attached to the materialized request as an
/// [`http::Extensions`] entry for the session to honour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Cache policy.
    pub cache_policy: CachePolicy,
    /// Overall timeout.
    pub timeout: Duration,
    /// Whether the session should attach and store cookies.
    pub should_handle_cookies: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            cache_policy: CachePolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            should_handle_cookies: true,
        }
    }
}

/// Description of an outgoing HTTP call.
#[derive(Clone)]
#[must_use]
pub struct Request {
    method: HttpMethod,
    url: String,
    body: Option<Bytes>,
    headers: HttpHeaders,
    parameters: Parameters,
    parameter_encoding: ParameterEncoding,
    query_parameters: Option<Parameters>,
    query_items: Option<Vec<QueryItem>>,
    form_parameters: Option<Parameters>,
    form_escape: Option<&'static AsciiSet>,
    query_encoder: QueryParameterEncoder,
    options: RequestOptions,
}

impl Request {
    /// Start a request. The URL is parsed when the request is materialized.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            headers: HttpHeaders::new(),
            parameters: Parameters::new(),
            parameter_encoding: ParameterEncoding::Percent,
            query_parameters: None,
            query_items: None,
            form_parameters: None,
            form_escape: None,
            query_encoder: default_query_encoder(),
            options: RequestOptions::default(),
        }
    }

    /// Shorthand for `Request::new(HttpMethod::Get, url)`.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Shorthand for `Request::new(HttpMethod::Post, url)`.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    /// Shorthand for `Request::new(HttpMethod::Put, url)`.
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    /// Shorthand for `Request::new(HttpMethod::Delete, url)`.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// HTTP method.
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// URL as given, before parsing.
    pub fn url_string(&self) -> &str {
        &self.url
    }

    /// Explicit body, if any.
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Request headers.
    pub const fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    /// Method-placed parameters.
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Body encoding for [`Self::parameters`].
    pub const fn parameter_encoding(&self) -> ParameterEncoding {
        self.parameter_encoding
    }

    /// Parameters always placed in the URL.
    pub const fn query_parameters(&self) -> Option<&Parameters> {
        self.query_parameters.as_ref()
    }

    /// Query items placed ahead of the URL's own query.
    pub fn query_items(&self) -> Option<&[QueryItem]> {
        self.query_items.as_deref()
    }

    /// Parameters last encoded into a form body.
    pub const fn form_parameters(&self) -> Option<&Parameters> {
        self.form_parameters.as_ref()
    }

    /// Transport options.
    pub const fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// `Content-Type` header value.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.value(names::CONTENT_TYPE)
    }

    /// `User-Agent` header value.
    pub fn user_agent(&self) -> Option<&str> {
        self.headers.value(names::USER_AGENT)
    }

    /// Set the `Content-Type` header.
    pub fn set_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.headers.insert(names::CONTENT_TYPE, content_type);
        self
    }

    /// Set the `User-Agent` header.
    pub fn set_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.headers.insert(names::USER_AGENT, user_agent);
        self
    }

    /// Whether the session should handle cookies for this request.
    pub const fn set_should_handle_cookies(mut self, handle: bool) -> Self {
        self.options.should_handle_cookies = handle;
        self
    }

    /// Set parameters; empty maps are ignored.
    ///
    /// `encoding` defaults to [`ParameterEncoding::Percent`].
    pub fn set_parameters(self, parameters: Parameters, encoding: Option<ParameterEncoding>) -> Self {
        if parameters.is_empty() {
            return self;
        }
        let mut request = self.set_parameter_encoding(encoding.unwrap_or_default());
        request.parameters = parameters;
        request
    }

    /// Set how body parameters are encoded. JSON also sets `Content-Type: application/json`.
    pub fn set_parameter_encoding(mut self, encoding: ParameterEncoding) -> Self {
        self.parameter_encoding = encoding;
        if encoding == ParameterEncoding::Json {
            self.headers.insert(names::CONTENT_TYPE, content_types::JSON);
        }
        self
    }

    /// Set the raw body. It overrides any parameter-encoded body.
    pub fn set_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the raw body together with its content type.
    pub fn set_body_with_content_type(
        self,
        body: impl Into<Bytes>,
        content_type: impl Into<String>,
    ) -> Self {
        self.set_body(body).set_content_type(content_type)
    }

    /// Serialize `value` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if `value` cannot be serialized.
    pub fn set_json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let data = serde_json::to_vec(value)?;
        Ok(self.set_json_data(data))
    }

    /// Use pre-encoded JSON as the body.
    pub fn set_json_data(self, json: impl Into<Bytes>) -> Self {
        self.set_body_with_content_type(json, content_types::JSON)
    }

    /// Encode a multipart form as the body and set its content type.
    ///
    /// # Errors
    ///
    /// Propagates stream errors from [`MultipartFormData::encode`].
    pub fn set_multipart_form(self, form: MultipartFormData) -> Result<Self> {
        let content_type = form.content_type();
        let body = form.encode()?;
        Ok(self.set_body_with_content_type(body, content_type))
    }

    /// Replace all headers; an empty collection is ignored.
    pub fn set_headers(mut self, headers: HttpHeaders) -> Self {
        if !headers.is_empty() {
            self.headers = headers;
        }
        self
    }

    /// Update each of `headers` into the existing set.
    pub fn update_headers(mut self, headers: &HttpHeaders) -> Self {
        self.headers.merge(headers);
        self
    }

    /// Set one header.
    pub fn set_header(mut self, header: HttpHeader) -> Self {
        self.headers.update(header);
        self
    }

    /// Set one header by name.
    pub fn set_header_value(self, value: impl Into<String>, name: impl Into<String>) -> Self {
        self.set_header(HttpHeader::new(name, value))
    }

    /// Set the cache policy.
    pub const fn set_cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.options.cache_policy = cache_policy;
        self
    }

    /// Set the timeout.
    pub const fn set_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Parameters always appended to the URL, whatever the method.
    pub fn set_query_parameters(mut self, parameters: Parameters) -> Self {
        self.query_parameters = Some(parameters);
        self
    }

    /// Query parameters with a custom URL encoder; empty maps are ignored.
    pub fn set_query_parameters_with_encoder<F>(self, parameters: Parameters, encoder: F) -> Self
    where
        F: Fn(Url, &Parameters) -> Option<Url> + Send + Sync + 'static,
    {
        if parameters.is_empty() {
            return self;
        }
        let mut request = self.set_query_parameters(parameters);
        request.query_encoder = std::sync::Arc::new(encoder);
        request
    }

    /// Replace the query item list.
    pub fn set_query_items(mut self, items: Vec<QueryItem>) -> Self {
        self.query_items = Some(items);
        self
    }

    /// Append to the query item list.
    pub fn append_query_items(mut self, items: impl IntoIterator<Item = QueryItem>) -> Self {
        self.query_items.get_or_insert_with(Vec::new).extend(items);
        self
    }

    /// Set form parameters.
    ///
    /// This immediately percent-encodes them into the body, overwriting any body
    /// set earlier, and sets `Content-Type: application/x-www-form-urlencoded`.
    pub fn set_form_parameters(mut self, parameters: Parameters) -> Self {
        let escape = self.form_escape.unwrap_or(encoding::QUERY_ESCAPE);
        self.body = Some(Bytes::from(encoding::percent_encoded_query(
            &parameters,
            escape,
        )));
        self.form_parameters = Some(parameters);
        self.set_content_type(content_types::FORM_ENCODED)
    }

    /// Characters to escape when encoding form parameters set after this call.
    pub const fn set_form_parameters_escape_set(mut self, escape: &'static AsciiSet) -> Self {
        self.form_escape = Some(escape);
        self
    }

    /// Parse the URL string and prepend the configured query items to its query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadUrl`] if the string is not an absolute URL.
    pub fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.url)?;
        if let Some(items) = self.query_items.as_deref().filter(|items| !items.is_empty()) {
            // The existing query text is kept verbatim after the new items.
            let existing = url.query().filter(|query| !query.is_empty()).map(str::to_owned);
            url.set_query(None);
            url = encoding::append_query_items(url, items);
            if let Some(existing) = existing {
                let query = format!("{}&{existing}", url.query().unwrap_or_default());
                url.set_query(Some(&query));
            }
        }
        Ok(url)
    }

    /// Materialize into an [`http::Request`].
    ///
    /// Resolution order:
    /// 1. method, URL (with query items), headers, and [`RequestOptions`] extension;
    /// 2. non-empty `parameters` go into the URL for `GET`/`HEAD`/`DELETE`, into the
    ///    body otherwise (adding a form content type only if none is set);
    /// 3. an explicit body replaces whatever step 2 produced;
    /// 4. query parameters are appended to the URL from step 2.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadUrl`] if no valid URL results and
    /// [`Error::InvalidRequest`] for headers the `http` crate rejects.
    pub fn to_http_request(&self) -> Result<http::Request<Bytes>> {
        let mut url = self.url()?;
        let mut headers = self.headers.to_header_map()?;
        let mut body = Bytes::new();

        if !self.parameters.is_empty() {
            if self.method.encodes_parameters_in_url() {
                if let Some(encoded) = (self.query_encoder)(url.clone(), &self.parameters) {
                    url = encoded;
                }
            } else if let Some(encoded) = self
                .parameter_encoding
                .encode_body(&self.parameters, None)
            {
                body = encoded;
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(
                        CONTENT_TYPE,
                        http::HeaderValue::from_static(content_types::FORM_ENCODED),
                    );
                }
            }
        }

        if let Some(explicit) = &self.body {
            body = explicit.clone();
        }

        if let Some(query_parameters) = &self.query_parameters {
            if let Some(encoded) = (self.query_encoder)(url.clone(), query_parameters) {
                url = encoded;
            }
        }

        let uri: http::Uri = url
            .as_str()
            .parse()
            .map_err(|err: http::uri::InvalidUri| Error::BadUrl(err.to_string()))?;

        let mut request = http::Request::builder()
            .method(http::Method::from(self.method))
            .uri(uri)
            .body(body)?;
        *request.headers_mut() = headers;
        request.extensions_mut().insert(self.options);
        tracing::debug!(method = %self.method, url = %url, "materialized request");
        Ok(request)
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("parameters", &self.parameters)
            .field("parameter_encoding", &self.parameter_encoding)
            .field("query_parameters", &self.query_parameters)
            .field("query_items", &self.query_items)
            .field("form_parameters", &self.form_parameters)
            .field("body_len", &self.body.as_ref().map(Bytes::len))
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
