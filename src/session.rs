//! The transport seam.
//!
//! A [`Session`] performs one wire exchange: it takes a materialized
//! [`http::Request`] and produces the buffered [`http::Response`]. Everything
//! above it (header defaults, validation, transforms, the three adapter
//! styles) lives in [`WebService`](crate::WebService) and is shared by every
//! session implementation.

use std::{future::Future, path::Path, time::Duration};

use bytes::Bytes;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::{
    HttpHeaders, Result,
    header::defaults::{AppInfo, default_headers},
    request::{CachePolicy, DEFAULT_TIMEOUT, RequestOptions},
    validate::Validation,
};

/// Performs HTTP exchanges.
pub trait Session: Send + Sync + 'static {
    /// Send `request` and buffer the whole response.
    fn execute(
        &self,
        request: http::Request<Bytes>,
    ) -> impl Future<Output = Result<http::Response<Bytes>>> + Send;

    /// Send `request` with the contents of `file` as its body.
    ///
    /// Any body already on `request` is discarded. The default reads the
    /// whole file into memory and hands it to [`Self::execute`]; sessions
    /// able to stream a request body should override it.
    fn upload(
        &self,
        request: http::Request<Bytes>,
        file: &Path,
    ) -> impl Future<Output = Result<http::Response<Bytes>>> + Send {
        let file = file.to_path_buf();
        async move {
            let body = async_fs::read(&file).await?;
            tracing::debug!(file = %file.display(), bytes = body.len(), "uploading file");
            let (parts, _) = request.into_parts();
            self.execute(http::Request::from_parts(parts, Bytes::from(body)))
                .await
        }
    }

    /// Run a detached task. Used by the callback adapters.
    ///
    /// The default runs the task to completion on a new thread.
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        std::thread::spawn(move || futures_executor::block_on(task));
    }
}

/// Defaults applied by a [`WebService`](crate::WebService) to every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfiguration {
    /// Headers added to requests that do not already set them.
    pub headers: HttpHeaders,
    /// Cache policy for requests left on the default policy.
    pub cache_policy: Option<CachePolicy>,
    /// Timeout for requests left on the default timeout.
    pub timeout: Option<Duration>,
    /// Response checks run before transforms.
    #[serde(skip)]
    pub validation: Validation,
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self::with_app_info(&AppInfo::detect())
    }
}

impl SessionConfiguration {
    /// Configuration whose default headers describe `info`.
    pub fn with_app_info(info: &AppInfo) -> Self {
        Self {
            headers: default_headers(info),
            cache_policy: None,
            timeout: None,
            validation: Validation::default(),
        }
    }

    /// Configuration without any default headers.
    pub fn empty() -> Self {
        Self {
            headers: HttpHeaders::new(),
            cache_policy: None,
            timeout: None,
            validation: Validation::default(),
        }
    }

    /// Replace the default headers.
    #[must_use]
    pub fn headers(mut self, headers: HttpHeaders) -> Self {
        self.headers = headers;
        self
    }

    /// Set the default cache policy.
    #[must_use]
    pub const fn cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = Some(cache_policy);
        self
    }

    /// Set the default timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the validation policy.
    #[must_use]
    pub fn validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    /// Fill in whatever `request` leaves at its defaults.
    pub(crate) fn apply(&self, request: &mut http::Request<Bytes>) -> Result<()> {
        let defaults = self.headers.to_header_map()?;
        let headers = request.headers_mut();
        for (name, value) in &defaults {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }

        let options = request
            .extensions_mut()
            .get_or_insert_with(RequestOptions::default);
        if let Some(cache_policy) = self.cache_policy {
            if options.cache_policy == CachePolicy::default() {
                options.cache_policy = cache_policy;
            }
        }
        if let Some(timeout) = self.timeout {
            if options.timeout == DEFAULT_TIMEOUT {
                options.timeout = timeout;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use http::header::{ACCEPT_ENCODING, USER_AGENT};

    use super::*;
    use crate::Request;

    #[test]
    fn defaults_do_not_override_request_headers() {
        let configuration = SessionConfiguration::default();
        let mut request = Request::get("http://localhost:8080")
            .set_user_agent("custom/1.0")
            .to_http_request()
            .unwrap();
        configuration.apply(&mut request).unwrap();
        assert_eq!(request.headers()[USER_AGENT], "custom/1.0");
        assert_eq!(
            request.headers()[ACCEPT_ENCODING],
            "br;q=1.0, gzip;q=0.9, deflate;q=0.8"
        );
    }

    #[test]
    fn timeout_and_cache_fill_defaults_only() {
        let configuration = SessionConfiguration::empty()
            .timeout(Duration::from_secs(30))
            .cache_policy(CachePolicy::ReloadIgnoringLocalCacheData);

        let mut untouched = Request::get("http://localhost:8080").to_http_request().unwrap();
        configuration.apply(&mut untouched).unwrap();
        let options = untouched.extensions().get::<RequestOptions>().unwrap();
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert_eq!(options.cache_policy, CachePolicy::ReloadIgnoringLocalCacheData);

        let mut explicit = Request::get("http://localhost:8080")
            .set_timeout(Duration::from_secs(1))
            .to_http_request()
            .unwrap();
        configuration.apply(&mut explicit).unwrap();
        let options = explicit.extensions().get::<RequestOptions>().unwrap();
        assert_eq!(options.timeout, Duration::from_secs(1));
    }

    #[test]
    fn configuration_loads_from_json() {
        let configuration: SessionConfiguration = serde_json::from_str(
            r#"{"headers":[{"name":"X-Api-Key","value":"k"}],"timeout":{"secs":5,"nanos":0}}"#,
        )
        .unwrap();
        assert_eq!(configuration.headers.value("X-Api-Key"), Some("k"));
        assert_eq!(configuration.timeout, Some(Duration::from_secs(5)));
        assert!(configuration.validation.require_body);
    }
}
