//! Tests for error classification

mod common;

use common::MOCK_URL;
use webservice::{
    Error, ErrorKind, MockSession, Request, SessionConfiguration, Validation, WebService,
};

fn service(session: &MockSession, validation: Validation) -> WebService<MockSession> {
    WebService::with_configuration(
        session.clone(),
        SessionConfiguration::empty().validation(validation),
    )
}

#[async_std::test]
async fn test_invalid_url_error() {
    let service = WebService::new(MockSession::new());
    let err = service.data(Request::get("not a url")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Request);
    assert!(!err.is_network_error());
}

#[async_std::test]
async fn test_invalid_header_error() {
    let service = WebService::new(MockSession::new());
    let err = service
        .data(Request::get(MOCK_URL).set_header_value("bad\nvalue", "X-Bad"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
    assert!(service.session().requests().is_empty());
}

#[async_std::test]
async fn test_missing_content_type_is_bad_response() {
    let session = MockSession::new();
    session.respond(MOCK_URL, 200, b"{}");
    let service = service(
        &session,
        Validation::default().acceptable_content_types(["application/json"]),
    );
    let err = service.data(Request::get(MOCK_URL)).await.unwrap_err();
    assert!(matches!(err, Error::BadResponse));
    assert!(err.is_validation_error());
}

#[async_std::test]
async fn test_custom_status_range() {
    let session = MockSession::new();
    session.respond(MOCK_URL, 404, b"missing");
    let lenient = service(&session, Validation::default().acceptable_status(200..500));
    assert_eq!(
        lenient.data(Request::get(MOCK_URL)).await.unwrap().as_ref(),
        b"missing"
    );
    let strict = service(&session, Validation::default());
    let err = strict.data(Request::get(MOCK_URL)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Status);
    assert_eq!(err.to_string(), "unacceptable status code 404 Not Found");
}

#[async_std::test]
async fn test_json_parsing_error() {
    let session = MockSession::new();
    session.respond(MOCK_URL, 200, b"<html></html>");
    let service = service(&session, Validation::default());
    let err = service
        .serializable(Request::get(MOCK_URL))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[async_std::test]
async fn test_unregistered_url_is_network_error() {
    let service = WebService::new(MockSession::new());
    let err = service
        .data(Request::get("http://localhost:1/nothing"))
        .await
        .unwrap_err();
    assert!(err.is_network_error());
    assert_eq!(err.kind(), ErrorKind::Transport);
}
