use std::{convert::Infallible, io, path::Path};

use bytes::Bytes;
use futures_util::{AsyncReadExt, future::BoxFuture, stream};
use http::{
    HeaderValue,
    header::{CACHE_CONTROL, CONTENT_LENGTH},
};
use http_body_util::{BodyExt, Full, StreamBody, combinators::UnsyncBoxBody};
use hyper::body::Frame;
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tokio::runtime::Handle;

use crate::{Error, Result, Session, request::RequestOptions};

/// Read size for streamed file uploads.
const UPLOAD_CHUNK_SIZE: usize = 16 * 1024;

type RequestBody = UnsyncBoxBody<Bytes, io::Error>;

fn buffered_body(body: Bytes) -> RequestBody {
    Full::new(body)
        .map_err(|never: Infallible| match never {})
        .boxed_unsync()
}

fn file_body(file: async_fs::File) -> RequestBody {
    let chunks = stream::try_unfold(file, |mut file| async move {
        let mut buffer = vec![0; UPLOAD_CHUNK_SIZE];
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            return Ok(None);
        }
        buffer.truncate(read);
        Ok::<_, io::Error>(Some((Frame::data(Bytes::from(buffer)), file)))
    });
    StreamBody::new(chunks).boxed_unsync()
}

/// [`Session`] over hyper's pooled client with native TLS.
///
/// Must be driven from within a tokio runtime. Callback tasks are spawned on
/// the runtime that was current when the session was created. File uploads
/// are streamed from disk rather than read into memory.
#[derive(Debug, Clone)]
pub struct HyperSession {
    client: HyperClient<HttpsConnector<HttpConnector>, RequestBody>,
    handle: Option<Handle>,
}

impl Default for HyperSession {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperSession {
    /// Create a session, remembering the current tokio runtime if there is one.
    pub fn new() -> Self {
        let client = HyperClient::builder(TokioExecutor::new()).build(HttpsConnector::new());

        Self {
            client,
            handle: Handle::try_current().ok(),
        }
    }

    /// Spawn callback tasks on `handle`.
    #[must_use]
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    async fn exchange(&self, request: http::Request<RequestBody>) -> Result<http::Response<Bytes>> {
        let response = self.client.request(request).await.map_err(Error::transport)?;
        let (parts, body) = response.into_parts();
        let body = body.collect().await.map_err(Error::transport)?.to_bytes();
        Ok(http::Response::from_parts(parts, body))
    }

    async fn send(&self, request: http::Request<RequestBody>) -> Result<http::Response<Bytes>> {
        let options = request
            .extensions()
            .get::<RequestOptions>()
            .copied()
            .unwrap_or_default();
        let (mut parts, body) = request.into_parts();
        if let Some(directive) = options.cache_policy.cache_control() {
            parts
                .headers
                .entry(CACHE_CONTROL)
                .or_insert(HeaderValue::from_static(directive));
        }
        tracing::debug!(method = %parts.method, uri = %parts.uri, "dispatching request");
        let request = http::Request::from_parts(parts, body);

        tokio::time::timeout(options.timeout, self.exchange(request))
            .await
            .map_err(|_| Error::Timeout)?
    }
}

impl Session for HyperSession {
    async fn execute(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        self.send(request.map(buffered_body)).await
    }

    async fn upload(
        &self,
        request: http::Request<Bytes>,
        file: &Path,
    ) -> Result<http::Response<Bytes>> {
        let handle = async_fs::File::open(file).await?;
        let length = handle.metadata().await?.len();
        tracing::debug!(file = %file.display(), bytes = length, "streaming upload");
        let (mut parts, _) = request.into_parts();
        parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        self.send(http::Request::from_parts(parts, file_body(handle)))
            .await
    }

    fn spawn(&self, task: BoxFuture<'static, ()>) {
        if let Some(handle) = &self.handle {
            handle.spawn(task);
            return;
        }
        std::thread::spawn(move || {
            match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime.block_on(task),
                Err(err) => tracing::error!(error = %err, "failed to start runtime for task"),
            }
        });
    }
}
