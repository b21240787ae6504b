//! Canned-response session.
//!
//! ```
//! use webservice::{MockSession, Request, WebService};
//!
//! # futures_executor::block_on(async {
//! let session = MockSession::new();
//! session.respond("http://localhost:8080/", 200, b"{}");
//! let service = WebService::new(session);
//! let body = service.data(Request::get("http://localhost:8080")).await.unwrap();
//! assert_eq!(body.as_ref(), b"{}");
//! # });
//! ```

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri, header::CONTENT_TYPE};

use crate::{Error, HttpHeaders, Result, Session};

type Handler = Arc<dyn Fn(&http::Request<Bytes>) -> Result<http::Response<Bytes>> + Send + Sync>;

/// A request seen by a [`MockSession`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Method.
    pub method: Method,
    /// Full URI.
    pub uri: Uri,
    /// Headers as sent.
    pub headers: HeaderMap,
    /// Body as sent.
    pub body: Bytes,
}

/// [`Session`] answering from handlers registered per URL.
///
/// A handler registered for a URL without a query also answers requests to
/// that URL with any query. Unregistered URLs fail with a transport error.
#[derive(Default, Clone)]
pub struct MockSession {
    handlers: Arc<Mutex<HashMap<String, Handler>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn normalize(url: &str) -> String {
    url.parse::<Uri>()
        .map_or_else(|_| url.to_owned(), |uri| uri.to_string())
}

impl MockSession {
    /// Create a session with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `url`, replacing any previous one.
    pub fn register<F>(&self, url: &str, handler: F)
    where
        F: Fn(&http::Request<Bytes>) -> Result<http::Response<Bytes>> + Send + Sync + 'static,
    {
        lock(&self.handlers).insert(normalize(url), Arc::new(handler));
    }

    /// Answer `url` with `status` and `body`.
    pub fn respond(&self, url: &str, status: u16, body: &'static [u8]) {
        self.respond_with(url, status, HttpHeaders::new(), Bytes::from_static(body));
    }

    /// Answer `url` with `status`, `Content-Type: application/json` and `body`.
    pub fn respond_json(&self, url: &str, status: u16, body: &'static str) {
        let headers = HttpHeaders::new().add(crate::HttpHeader::content_type(
            crate::header::content_types::JSON,
        ));
        self.respond_with(url, status, headers, Bytes::from_static(body.as_bytes()));
    }

    /// Answer `url` with a fully specified response.
    pub fn respond_with(&self, url: &str, status: u16, headers: HttpHeaders, body: Bytes) {
        self.register(url, move |_| {
            let status = StatusCode::from_u16(status)
                .map_err(|err| Error::InvalidRequest(err.to_string()))?;
            let mut response = http::Response::builder()
                .status(status)
                .body(body.clone())?;
            *response.headers_mut() = headers.to_header_map()?;
            Ok(response)
        });
    }

    /// Fail requests to `url` with the error built by `error`.
    pub fn fail<F>(&self, url: &str, error: F)
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        self.register(url, move |_| Err(error()));
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Content type of the last request, if any.
    pub fn last_content_type(&self) -> Option<String> {
        lock(&self.requests)
            .last()
            .and_then(|request| request.headers.get(CONTENT_TYPE))
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    }

    fn handler_for(&self, uri: &Uri) -> Option<Handler> {
        let handlers = lock(&self.handlers);
        if let Some(handler) = handlers.get(&uri.to_string()) {
            return Some(handler.clone());
        }
        let mut without_query = uri.to_string();
        if let Some(index) = without_query.find('?') {
            without_query.truncate(index);
        }
        handlers.get(&without_query).cloned()
    }
}

impl fmt::Debug for MockSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut urls: Vec<String> = lock(&self.handlers).keys().cloned().collect();
        urls.sort();
        f.debug_struct("MockSession")
            .field("urls", &urls)
            .field("requests", &lock(&self.requests).len())
            .finish()
    }
}

impl Session for MockSession {
    async fn execute(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        lock(&self.requests).push(RecordedRequest {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
            body: request.body().clone(),
        });
        tracing::debug!(method = %request.method(), uri = %request.uri(), "mock dispatch");
        let handler = self.handler_for(request.uri()).ok_or_else(|| {
            Error::transport(format!("no mock response registered for {}", request.uri()))
        })?;
        handler(&request)
    }
}
