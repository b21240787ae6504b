//! Request construction as seen by the session

mod common;

use std::collections::HashMap;

use common::MOCK_URL;
use serde::Serialize;
use webservice::{
    HttpHeader, HttpMethod, MockSession, MultipartFormData, Request, SessionConfiguration,
    WebService,
    encoding::{ParameterEncoding, QueryItem, parameters},
    header::{content_types, defaults::AppInfo},
};

fn service() -> (MockSession, WebService<MockSession>) {
    let session = MockSession::new();
    session.respond(MOCK_URL, 200, b"{}");
    let info = AppInfo::detect()
        .app_version("1.2")
        .bundle_id("org.example.app")
        .build("42");
    let configuration = SessionConfiguration::with_app_info(&info);
    (
        session.clone(),
        WebService::with_configuration(session, configuration),
    )
}

#[test]
fn test_explicit_body_and_get_parameters() {
    let request = Request::get(MOCK_URL)
        .set_parameters(parameters([("a", "1")]), None)
        .set_body(&b"someBytes"[..])
        .to_http_request()
        .unwrap();
    assert!(request.uri().to_string().contains("?a=1"));
    assert_eq!(request.body().as_ref(), b"someBytes");
}

#[test]
fn test_query_round_trip_through_request() {
    let pairs = [
        ("with space", "a b"),
        ("amp&", "x&y"),
        ("eq=", "k=v"),
        ("ключ", "значение"),
        ("emoji", "🦀"),
    ];
    let request = Request::get(MOCK_URL)
        .set_query_parameters(parameters(pairs))
        .to_http_request()
        .unwrap();
    let url = url::Url::parse(&request.uri().to_string()).unwrap();
    let decoded: HashMap<String, String> = url.query_pairs().into_owned().collect();
    let expected: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    assert_eq!(decoded, expected);
}

#[async_std::test]
async fn test_default_headers_reach_session() {
    let (session, service) = service();
    service.data(Request::get(MOCK_URL)).await.unwrap();
    let sent = &session.requests()[0];
    let user_agent = sent.headers["user-agent"].to_str().unwrap();
    assert!(user_agent.contains("/1.2 (org.example.app; build:42; "));
    assert_eq!(
        sent.headers["accept-encoding"],
        "br;q=1.0, gzip;q=0.9, deflate;q=0.8"
    );
    assert_eq!(sent.headers["accept-language"], "en;q=1.0");
}

#[async_std::test]
async fn test_json_body() {
    #[derive(Serialize)]
    struct Payload<'a> {
        name: &'a str,
        tags: Vec<&'a str>,
    }

    let (session, service) = service();
    let request = Request::post(MOCK_URL)
        .set_json(&Payload {
            name: "crab",
            tags: vec!["a", "b"],
        })
        .unwrap();
    service.data(request).await.unwrap();
    assert_eq!(session.last_content_type().as_deref(), Some(content_types::JSON));
    let body: serde_json::Value = serde_json::from_slice(&session.requests()[0].body).unwrap();
    assert_eq!(body["tags"][1], "b");
}

#[async_std::test]
async fn test_form_and_parameter_bodies() {
    let (session, service) = service();
    service
        .data(Request::post(MOCK_URL).set_form_parameters(parameters([("q", "a+b c")])))
        .await
        .unwrap();
    service
        .data(
            Request::new(HttpMethod::Patch, MOCK_URL)
                .set_parameters(parameters([("n", 1)]), Some(ParameterEncoding::Json)),
        )
        .await
        .unwrap();
    let requests = session.requests();
    assert_eq!(requests[0].body.as_ref(), b"q=a%2Bb%20c");
    assert_eq!(
        requests[0].headers["content-type"],
        content_types::FORM_ENCODED
    );
    assert_eq!(requests[1].method, http::Method::PATCH);
    assert_eq!(requests[1].body.as_ref(), br#"{"n":1}"#);
}

#[async_std::test]
async fn test_query_items_and_headers() {
    let (session, service) = service();
    service
        .data(
            Request::get(format!("{MOCK_URL}/?page=3"))
                .set_query_items(vec![QueryItem::new("sort", "desc"), QueryItem::flag("all")])
                .set_header(HttpHeader::bearer("token"))
                .set_header_value("abc", "X-Api-Key"),
        )
        .await
        .unwrap();
    let sent = &session.requests()[0];
    assert_eq!(sent.uri.query(), Some("sort=desc&all&page=3"));
    assert_eq!(sent.headers["authorization"], "Bearer token");
    assert_eq!(sent.headers["x-api-key"], "abc");
}

#[async_std::test]
async fn test_multipart_request_body() {
    let (session, service) = service();
    let mut form = MultipartFormData::with_boundary("XyZ");
    form.append_data(&b"hello"[..], "greeting", None, None);
    let expected_length = form.content_length();
    service
        .data(Request::post(MOCK_URL).set_multipart_form(form).unwrap())
        .await
        .unwrap();
    let sent = &session.requests()[0];
    assert_eq!(
        session.last_content_type().as_deref(),
        Some("multipart/form-data; boundary=XyZ")
    );
    assert_eq!(sent.body.len() as u64, expected_length);
    assert!(sent.body.starts_with(b"--XyZ\r\n"));
    assert!(sent.body.ends_with(b"\r\n--XyZ--\r\n"));
}
