//! The request pipeline and its async surface.
//!
//! Every call, whatever its style, runs the same steps:
//!
//! 1. materialize the [`Request`] into an [`http::Request`];
//! 2. add configured default headers the request does not set;
//! 3. hand it to the [`Session`];
//! 4. validate status, content type and body;
//! 5. apply the transform.
//!
//! The first failure ends the call. The async methods below are cancelled by
//! dropping their future, which also drops the in-flight exchange. See
//! [`task`] and [`publisher`] for the callback and stream styles.

mod publisher;
mod task;

pub use publisher::ServicePublisher;
pub use task::DataTask;

use std::{
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    Request, Result, Session, SessionConfiguration,
    requestable::Requestable,
    transform::{self, DataResponse},
};

/// Runs requests through a [`Session`].
///
/// Cloning is cheap; clones share the session and configuration.
#[derive(Debug)]
pub struct WebService<S> {
    session: Arc<S>,
    configuration: Arc<SessionConfiguration>,
}

impl<S> Clone for WebService<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            configuration: Arc::clone(&self.configuration),
        }
    }
}

impl<S: Session> WebService<S> {
    /// Create a service with [`SessionConfiguration::default`].
    pub fn new(session: S) -> Self {
        Self::with_configuration(session, SessionConfiguration::default())
    }

    /// Create a service with an explicit configuration.
    pub fn with_configuration(session: S, configuration: SessionConfiguration) -> Self {
        Self {
            session: Arc::new(session),
            configuration: Arc::new(configuration),
        }
    }

    /// Underlying session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Active configuration.
    pub fn configuration(&self) -> &SessionConfiguration {
        &self.configuration
    }

    /// Build the full pipeline as a `'static` future.
    fn pipeline<T, F>(
        &self,
        request: Request,
        upload: Option<PathBuf>,
        transform: F,
    ) -> impl Future<Output = Result<T>> + Send + 'static
    where
        T: Send + 'static,
        F: FnOnce(&DataResponse) -> Result<T> + Send + 'static,
    {
        let session = Arc::clone(&self.session);
        let configuration = Arc::clone(&self.configuration);
        async move {
            let response =
                exchange(session.as_ref(), &configuration, request, upload.as_deref()).await?;
            transform(&response)
        }
    }

    /// Send `request` and return the validated response.
    ///
    /// # Errors
    ///
    /// Request, transport or validation errors.
    pub async fn send(&self, request: Request) -> Result<DataResponse> {
        self.pipeline(request, None, |response| Ok(response.clone()))
            .await
    }

    /// Send `request` and apply `transform` to the validated response.
    ///
    /// # Errors
    ///
    /// Request, transport, validation or transform errors, in that order.
    pub async fn transform<T, F>(&self, request: Request, transform: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DataResponse) -> Result<T> + Send + 'static,
    {
        self.pipeline(request, None, transform).await
    }

    /// Send `request` and return the body.
    ///
    /// # Errors
    ///
    /// Request, transport or validation errors.
    pub async fn data(&self, request: Request) -> Result<Bytes> {
        self.transform(request, transform::identity).await
    }

    /// Send `request` and decode the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// As [`Self::data`], plus [`Error::Decode`](crate::Error::Decode).
    pub async fn decodable<T>(&self, request: Request) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.transform(request, transform::json_decode::<T>).await
    }

    /// Send `request` and parse the body as untyped JSON.
    ///
    /// # Errors
    ///
    /// As [`Self::decodable`].
    pub async fn serializable(&self, request: Request) -> Result<Value> {
        self.transform(request, transform::json_value).await
    }

    /// Send `request` with `file` as its body and return the response body.
    ///
    /// # Errors
    ///
    /// [`Error::Io`](crate::Error::Io) if the file cannot be read, otherwise as
    /// [`Self::data`].
    pub async fn upload(&self, request: Request, file: impl AsRef<Path>) -> Result<Bytes> {
        self.pipeline(
            request,
            Some(file.as_ref().to_path_buf()),
            transform::identity,
        )
        .await
    }

    /// Fetch a [`Requestable`] and transform the response with it.
    ///
    /// # Errors
    ///
    /// As [`Self::transform`].
    pub async fn fetch<R>(&self, requestable: R) -> Result<R::Output>
    where
        R: Requestable + Send + 'static,
        R::Output: Send + 'static,
    {
        let request = requestable.request()?;
        self.transform(request, move |response| requestable.transform(response))
            .await
    }
}

async fn exchange<S: Session>(
    session: &S,
    configuration: &SessionConfiguration,
    request: Request,
    upload: Option<&Path>,
) -> Result<DataResponse> {
    let mut wire = request.to_http_request()?;
    configuration.apply(&mut wire)?;
    let uri = wire.uri().clone();
    let response = match upload {
        Some(file) => session.upload(wire, file).await?,
        None => session.execute(wire).await?,
    };
    tracing::debug!(uri = %uri, status = response.status().as_u16(), "received response");
    configuration.validation.validate(&response)?;
    Ok(DataResponse::new(uri, response))
}

#[cfg(test)]
mod tests {
    use futures_executor::block_on;
    use serde::Deserialize;

    use super::*;
    use crate::{Error, MockSession, Validation, encoding::parameters};

    const URL: &str = "http://localhost:8080/";

    fn service() -> (MockSession, WebService<MockSession>) {
        let session = MockSession::new();
        (session.clone(), WebService::new(session))
    }

    #[test]
    fn default_headers_are_merged() {
        let (session, service) = service();
        session.respond(URL, 200, b"ok");
        block_on(service.data(Request::get(URL).set_user_agent("mine"))).unwrap();
        let sent = &session.requests()[0];
        assert_eq!(sent.headers[http::header::USER_AGENT], "mine");
        assert!(sent.headers.contains_key(http::header::ACCEPT_LANGUAGE));
    }

    #[test]
    fn validation_precedes_transform() {
        let (session, service) = service();
        session.respond(URL, 500, b"not json");
        let err = block_on(service.decodable::<Value>(Request::get(URL))).unwrap_err();
        assert_eq!(err.status(), Some(http::StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn decode_failure_after_validation() {
        #[derive(Debug, Deserialize)]
        struct Item {
            #[allow(dead_code)]
            id: u32,
        }
        let (session, service) = service();
        session.respond(URL, 200, b"[]");
        let err = block_on(service.decodable::<Item>(Request::get(URL))).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn empty_body_rejected_unless_allowed() {
        let session = MockSession::new();
        session.respond(URL, 204, b"");
        let strict = WebService::new(session.clone());
        assert!(matches!(
            block_on(strict.data(Request::get(URL))),
            Err(Error::ZeroByteResource)
        ));
        let lenient = WebService::with_configuration(
            session,
            SessionConfiguration::empty().validation(Validation::default().allow_empty()),
        );
        assert!(block_on(lenient.data(Request::get(URL))).unwrap().is_empty());
    }

    #[test]
    fn serializable_and_send() {
        let (session, service) = service();
        session.respond_json(URL, 200, r#"{"k":1}"#);
        let value = block_on(service.serializable(Request::get(URL))).unwrap();
        assert_eq!(value["k"], 1);
        let response = block_on(service.send(Request::get(URL))).unwrap();
        assert_eq!(response.content_type(), Some("application/json"));
    }

    #[test]
    fn parameters_reach_the_session() {
        let (session, service) = service();
        session.respond("http://localhost:8080/find", 200, b"ok");
        block_on(service.data(
            Request::get("http://localhost:8080/find").set_parameters(parameters([("q", "x y")]), None),
        ))
        .unwrap();
        assert_eq!(session.requests()[0].uri, "http://localhost:8080/find?q=x%20y");
    }

    #[test]
    fn upload_sends_file_contents() {
        let (session, service) = service();
        session.respond(URL, 200, b"stored");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        std::fs::write(&path, b"file body").unwrap();
        let body = block_on(service.upload(Request::post(URL).set_body(&b"ignored"[..]), &path)).unwrap();
        assert_eq!(body.as_ref(), b"stored");
        assert_eq!(session.requests()[0].body.as_ref(), b"file body");

        let missing = block_on(service.upload(Request::post(URL), dir.path().join("missing")));
        assert!(matches!(missing, Err(Error::Io(_))));
    }
}
