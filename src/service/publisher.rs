//! Reactive style: a stream that yields at most one item.

use std::{
    fmt,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use futures_core::{FusedStream, Stream};
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::WebService;
use crate::{
    Request, Result, Session,
    transform::{self, DataResponse},
};

/// One-shot stream over a request.
///
/// Nothing is sent until the stream is first polled. It then yields exactly
/// one `Ok` value or one `Err`, and ends. [`ServicePublisher::cancel`] drops
/// the in-flight exchange and ends the stream without an item.
#[must_use = "streams do nothing unless polled"]
pub struct ServicePublisher<T> {
    pending: Option<BoxFuture<'static, Result<T>>>,
}

impl<T> ServicePublisher<T> {
    fn new(future: BoxFuture<'static, Result<T>>) -> Self {
        Self {
            pending: Some(future),
        }
    }

    /// Cancel the request. The stream ends on its next poll.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            tracing::debug!("publisher cancelled");
        }
    }

    /// Whether the stream has finished or been cancelled.
    pub const fn is_finished(&self) -> bool {
        self.pending.is_none()
    }
}

impl<T> Stream for ServicePublisher<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(future) = this.pending.as_mut() else {
            return Poll::Ready(None);
        };
        match future.as_mut().poll(cx) {
            Poll::Ready(result) => {
                this.pending = None;
                Poll::Ready(Some(result))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.pending.is_some() {
            (0, Some(1))
        } else {
            (0, Some(0))
        }
    }
}

impl<T> FusedStream for ServicePublisher<T> {
    fn is_terminated(&self) -> bool {
        self.pending.is_none()
    }
}

impl<T> fmt::Debug for ServicePublisher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServicePublisher")
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl<S: Session> WebService<S> {
    /// Stream form of [`WebService::transform`].
    pub fn transform_publisher<T, F>(&self, request: Request, transform: F) -> ServicePublisher<T>
    where
        T: Send + 'static,
        F: FnOnce(&DataResponse) -> Result<T> + Send + 'static,
    {
        ServicePublisher::new(Box::pin(self.pipeline(request, None, transform)))
    }

    /// Stream form of [`WebService::data`].
    pub fn data_publisher(&self, request: Request) -> ServicePublisher<Bytes> {
        self.transform_publisher(request, transform::identity)
    }

    /// Stream form of [`WebService::decodable`].
    pub fn decodable_publisher<T>(&self, request: Request) -> ServicePublisher<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.transform_publisher(request, transform::json_decode::<T>)
    }

    /// Stream form of [`WebService::serializable`].
    pub fn serializable_publisher(&self, request: Request) -> ServicePublisher<Value> {
        self.transform_publisher(request, transform::json_value)
    }
}
