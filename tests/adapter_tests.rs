//! The three calling styles against a mock session

mod common;

use std::sync::mpsc;
use std::time::Duration;

use bytes::Bytes;
use common::{MOCK_URL, mock_service};
use futures_util::StreamExt;
use webservice::{Request, Result};

fn callback_result(service: &webservice::WebService<webservice::MockSession>) -> Result<Bytes> {
    let (sender, receiver) = mpsc::channel();
    let task = service.data_task(Request::get(MOCK_URL), move |result| {
        sender.send(result).unwrap();
    });
    let result = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(!task.is_cancelled());
    // exactly one completion
    assert!(receiver.recv_timeout(Duration::from_millis(50)).is_err());
    result
}

#[async_std::test]
async fn test_async_style_delivers_payload() {
    let service = mock_service(200);
    let body = service.data(Request::get(MOCK_URL)).await.unwrap();
    assert_eq!(body.len(), 2);
    assert_eq!(String::from_utf8(body.to_vec()).unwrap(), "{}");
}

#[async_std::test]
async fn test_callback_style_delivers_payload() {
    let service = mock_service(200);
    let body = callback_result(&service).unwrap();
    assert_eq!(body.as_ref(), b"{}");
}

#[async_std::test]
async fn test_publisher_style_delivers_payload() {
    let service = mock_service(200);
    let items: Vec<_> = service.data_publisher(Request::get(MOCK_URL)).collect().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_ref().unwrap().as_ref(), b"{}");
}

#[async_std::test]
async fn test_unauthorized_in_every_style() {
    let service = mock_service(401);

    let awaited = service.data(Request::get(MOCK_URL)).await;
    let called = callback_result(&service);
    let published: Vec<_> = service.data_publisher(Request::get(MOCK_URL)).collect().await;

    assert_eq!(published.len(), 1);
    for result in [awaited, called, published.into_iter().next().unwrap()] {
        let err = result.unwrap_err();
        assert!(err.is_status_error());
        assert_eq!(err.status().unwrap().as_u16(), 401);
    }
}

#[async_std::test]
async fn test_custom_transform() {
    let service = mock_service(200);
    let length = service
        .transform(Request::get(MOCK_URL), |response| Ok(response.body().len()))
        .await
        .unwrap();
    assert_eq!(length, 2);
}
