//! Completion-callback style.
//!
//! Each `*_task` method spawns the pipeline through [`Session::spawn`] and
//! returns a [`DataTask`] immediately. The completion runs exactly once: with
//! the result, or with [`Error::Cancelled`] if the task was cancelled first.

use bytes::Bytes;
use futures_util::future::{AbortHandle, Abortable};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::WebService;
use crate::{Error, Request, Result, Session, transform::{self, DataResponse}};

/// Handle to a spawned request.
#[derive(Debug, Clone)]
pub struct DataTask {
    abort: AbortHandle,
}

impl DataTask {
    /// Cancel the request if it has not completed yet.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    /// Whether [`Self::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }
}

impl<S: Session> WebService<S> {
    /// Run `request` in the background, apply `transform`, then call `completion`.
    pub fn transform_task<T, F, C>(&self, request: Request, transform: F, completion: C) -> DataTask
    where
        T: Send + 'static,
        F: FnOnce(&DataResponse) -> Result<T> + Send + 'static,
        C: FnOnce(Result<T>) + Send + 'static,
    {
        let (abort, registration) = AbortHandle::new_pair();
        let pipeline = Abortable::new(self.pipeline(request, None, transform), registration);
        self.session.spawn(Box::pin(async move {
            let result = pipeline.await.unwrap_or(Err(Error::Cancelled));
            if let Err(err) = &result {
                tracing::debug!(error = %err, kind = %err.kind(), "task failed");
            }
            completion(result);
        }));
        DataTask { abort }
    }

    /// Callback form of [`WebService::data`].
    pub fn data_task<C>(&self, request: Request, completion: C) -> DataTask
    where
        C: FnOnce(Result<Bytes>) + Send + 'static,
    {
        self.transform_task(request, transform::identity, completion)
    }

    /// Callback form of [`WebService::decodable`].
    pub fn decodable_task<T, C>(&self, request: Request, completion: C) -> DataTask
    where
        T: DeserializeOwned + Send + 'static,
        C: FnOnce(Result<T>) + Send + 'static,
    {
        self.transform_task(request, transform::json_decode::<T>, completion)
    }

    /// Callback form of [`WebService::serializable`].
    pub fn serializable_task<C>(&self, request: Request, completion: C) -> DataTask
    where
        C: FnOnce(Result<Value>) + Send + 'static,
    {
        self.transform_task(request, transform::json_value, completion)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::mpsc, time::Duration};

    use futures_util::future::BoxFuture;

    use super::*;
    use crate::MockSession;

    const URL: &str = "http://localhost:8080/";

    #[test]
    fn completion_receives_result() {
        let session = MockSession::new();
        session.respond(URL, 200, b"{}");
        let service = WebService::new(session);
        let (sender, receiver) = mpsc::channel();
        let task = service.data_task(Request::get(URL), move |result| {
            sender.send(result).unwrap();
        });
        let result = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(result.unwrap().as_ref(), b"{}");
        assert!(!task.is_cancelled());
    }

    /// Session whose exchanges never finish.
    #[derive(Debug)]
    struct Stalled;

    impl Session for Stalled {
        async fn execute(&self, _: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
            futures_util::future::pending().await
        }

        fn spawn(&self, task: BoxFuture<'static, ()>) {
            std::thread::spawn(move || futures_executor::block_on(task));
        }
    }

    #[test]
    fn cancel_completes_with_cancelled() {
        let service = WebService::new(Stalled);
        let (sender, receiver) = mpsc::channel();
        let task = service.data_task(Request::get(URL), move |result| {
            sender.send(result).unwrap();
        });
        task.cancel();
        let result = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(result.unwrap_err().is_cancelled());
        assert!(task.is_cancelled());
        assert!(receiver.recv_timeout(Duration::from_millis(100)).is_err());
    }
}
