//! Shared test utilities: a small local HTTP server and mock helpers.
//!
//! The server implements just the endpoints the suites need, so nothing here
//! touches the network beyond loopback.

#![allow(dead_code)]

use std::{
    io::Cursor,
    thread,
    time::Duration,
};

use once_cell::sync::OnceCell;
use tiny_http::{Header, Request, Response, Server, StatusCode};
use url::Url;
use webservice::{MockSession, WebService};

/// The URL used by mock-driven scenarios.
pub const MOCK_URL: &str = "http://localhost:8080";

#[derive(Debug)]
pub struct TestServer {
    base: String,
    _thread: thread::JoinHandle<()>,
}

/// Base URL of the local test server.
pub fn server_base() -> String {
    test_server().base.clone()
}

/// Full URL against the local test server.
pub fn server_uri(path: &str) -> String {
    format!("{}/{}", server_base(), path.trim_start_matches('/'))
}

pub fn test_server() -> &'static TestServer {
    static INSTANCE: OnceCell<TestServer> = OnceCell::new();
    INSTANCE.get_or_init(TestServer::start)
}

/// A service over a mock answering [`MOCK_URL`] with `status` and `{}`.
pub fn mock_service(status: u16) -> WebService<MockSession> {
    let session = MockSession::new();
    session.respond(MOCK_URL, status, b"{}");
    WebService::new(session)
}

impl TestServer {
    fn start() -> Self {
        let server = Server::http("127.0.0.1:0").expect("start test server");
        let base = format!("http://{}", server.server_addr());
        let thread = thread::spawn(move || run_server(&server));

        Self {
            base,
            _thread: thread,
        }
    }
}

fn run_server(server: &Server) {
    for mut request in server.incoming_requests() {
        let response = handle_request(&mut request);
        let _ = request.respond(response);
    }
}

fn handle_request(request: &mut Request) -> Response<Cursor<Vec<u8>>> {
    let url = Url::parse(&format!("http://localhost{}", request.url())).unwrap();
    let path = url.path().to_string();

    match path.as_str() {
        "/json" => json_response(
            StatusCode(200),
            r#"{"slideshow":{"title":"local","author":"webservice"}}"#,
        ),
        "/html" => Response::from_string("<html><body>not json</body></html>")
            .with_header(Header::from_bytes("Content-Type", "text/html").unwrap()),
        "/empty" => Response::from_data(Vec::new()),
        "/query" => {
            let pairs: serde_json::Map<String, serde_json::Value> = url
                .query_pairs()
                .into_owned()
                .map(|(key, value)| (key, serde_json::Value::String(value)))
                .collect();
            json_response(StatusCode(200), &serde_json::Value::Object(pairs).to_string())
        }
        "/echo" => {
            let content_type = header_value(request, "content-type").unwrap_or_default();
            let mut body = Vec::new();
            request.as_reader().read_to_end(&mut body).unwrap();
            let echoed = serde_json::json!({
                "method": request.method().to_string(),
                "content_type": content_type,
                "accept": header_value(request, "accept").unwrap_or_default(),
                "user_agent": header_value(request, "user-agent").unwrap_or_default(),
                "length": body.len(),
                "body": String::from_utf8_lossy(&body),
            });
            json_response(StatusCode(200), &echoed.to_string())
        }
        "/delay" => {
            thread::sleep(Duration::from_millis(300));
            text_response(StatusCode(200), "delayed")
        }
        _ => {
            if let Some(stripped) = path.strip_prefix("/status/") {
                let status = stripped.parse::<u16>().unwrap_or(400);
                return text_response(StatusCode(status), format!("status {status}"));
            }
            text_response(StatusCode(404), format!("no route for {path}"))
        }
    }
}

fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.to_string().eq_ignore_ascii_case(name))
        .map(|header| header.value.to_string())
}

fn json_response(status: StatusCode, body: &str) -> Response<Cursor<Vec<u8>>> {
    let content_type = Header::from_bytes("Content-Type", "application/json").unwrap();
    Response::from_string(body.to_string())
        .with_status_code(status)
        .with_header(content_type)
}

fn text_response(status: StatusCode, body: impl Into<String>) -> Response<Cursor<Vec<u8>>> {
    Response::from_string(body.into()).with_status_code(status)
}
