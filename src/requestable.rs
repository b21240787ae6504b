//! Things a [`WebService`](crate::WebService) can fetch.
//!
//! [`Requestable`] is the two-method seam: build the request, transform the
//! response. [`Route`] describes a typical JSON API endpoint declaratively and
//! gets a [`Requestable`] implementation for free.
//!
//! ```
//! use serde::Deserialize;
//! use webservice::requestable::Route;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//! }
//!
//! struct GetUser(u64);
//!
//! impl Route for GetUser {
//!     type Response = User;
//!
//!     fn base_url(&self) -> String {
//!         "https://api.example.com".to_owned()
//!     }
//!
//!     fn path(&self) -> String {
//!         format!("/users/{}", self.0)
//!     }
//! }
//! ```

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::{
    HttpHeader, HttpHeaders, HttpMethod, Request, Result,
    encoding::QueryItem,
    header::content_types,
    transform::{self, DataResponse},
};

/// Describes how to request something and how to read the answer.
pub trait Requestable {
    /// Result of a successful call.
    type Output;

    /// Build the request.
    ///
    /// # Errors
    ///
    /// Implementations fail when the request cannot be described.
    fn request(&self) -> Result<Request>;

    /// Turn a validated response into [`Self::Output`].
    ///
    /// # Errors
    ///
    /// Implementations fail when the response cannot be read.
    fn transform(&self, response: &DataResponse) -> Result<Self::Output>;
}

impl Requestable for Request {
    type Output = Bytes;

    fn request(&self) -> Result<Request> {
        Ok(self.clone())
    }

    fn transform(&self, response: &DataResponse) -> Result<Bytes> {
        transform::identity(response)
    }
}

/// A JSON API endpoint.
pub trait Route {
    /// Decoded response body.
    type Response: DeserializeOwned;

    /// Scheme and host, e.g. `https://api.example.com`.
    fn base_url(&self) -> String;

    /// Path appended to [`Self::base_url`].
    fn path(&self) -> String;

    /// Method, `GET` by default.
    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    /// Headers, `Accept: application/json` by default.
    fn headers(&self) -> HttpHeaders {
        HttpHeaders::new().add(HttpHeader::accept(content_types::JSON))
    }

    /// Body, none by default.
    fn body(&self) -> Option<Bytes> {
        None
    }

    /// Query items, none by default.
    fn query_items(&self) -> Vec<QueryItem> {
        Vec::new()
    }
}

impl<R: Route> Requestable for R {
    type Output = R::Response;

    fn request(&self) -> Result<Request> {
        let url = format!(
            "{}/{}",
            self.base_url().trim_end_matches('/'),
            self.path().trim_start_matches('/')
        );
        let mut request = Request::new(self.method(), url).set_headers(self.headers());
        let items = self.query_items();
        if !items.is_empty() {
            request = request.set_query_items(items);
        }
        if let Some(body) = self.body() {
            request = request.set_body(body);
        }
        Ok(request)
    }

    fn transform(&self, response: &DataResponse) -> Result<R::Response> {
        transform::json_decode(response)
    }
}

#[cfg(test)]
mod tests {
    use http::header::ACCEPT;

    use super::*;

    struct Search {
        term: &'static str,
    }

    impl Route for Search {
        type Response = Vec<String>;

        fn base_url(&self) -> String {
            "http://localhost:8080/".to_owned()
        }

        fn path(&self) -> String {
            "/search".to_owned()
        }

        fn method(&self) -> HttpMethod {
            HttpMethod::Post
        }

        fn body(&self) -> Option<Bytes> {
            Some(Bytes::from_static(b"{}"))
        }

        fn query_items(&self) -> Vec<QueryItem> {
            vec![QueryItem::new("q", self.term)]
        }
    }

    #[test]
    fn route_builds_request() {
        let request = Search { term: "a b" }.request().unwrap();
        let wire = request.to_http_request().unwrap();
        assert_eq!(wire.method(), http::Method::POST);
        assert_eq!(wire.uri(), "http://localhost:8080/search?q=a%20b");
        assert_eq!(wire.headers()[ACCEPT], "application/json");
        assert_eq!(wire.body().as_ref(), b"{}");
    }

    #[test]
    fn request_is_its_own_requestable() {
        let request = Request::get("http://localhost:8080/x");
        assert_eq!(request.request().unwrap().url_string(), "http://localhost:8080/x");
    }
}
