//! Query and body parameter encoding.
//!
//! Parameters are a JSON object map so that the same value can be sent either
//! percent-encoded (`a=1&b=two`) or as a JSON document. Percent-encoding keeps
//! only RFC 3986 unreserved characters literal; everything else, including
//! space, `&`, `=`, `?`, `#` and every non-ASCII byte, becomes a `%XX` sequence
//! of its UTF-8 encoding.

use std::{borrow::Cow, fmt, sync::Arc};

use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Parameter map used for query, form and body parameters.
pub type Parameters = serde_json::Map<String, Value>;

/// Characters escaped when encoding query and form components.
pub const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Hook that appends parameters to a URL. Returning `None` leaves the URL unchanged.
pub type QueryParameterEncoder = Arc<dyn Fn(Url, &Parameters) -> Option<Url> + Send + Sync>;

/// Build a [`Parameters`] map from key/value pairs.
pub fn parameters<I, K, V>(pairs: I) -> Parameters
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// One `name[=value]` component of a URL query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryItem {
    /// Item name (unencoded).
    pub name: String,
    /// Item value (unencoded); `None` renders as a bare name.
    pub value: Option<String>,
}

impl QueryItem {
    /// Create an item with a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Create a value-less item.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    fn encode(&self, escape: &'static AsciiSet) -> String {
        let name = utf8_percent_encode(&self.name, escape);
        match &self.value {
            Some(value) => format!("{name}={}", utf8_percent_encode(value, escape)),
            None => name.to_string(),
        }
    }
}

/// How non-URL parameters are written into the request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterEncoding {
    /// `application/x-www-form-urlencoded` style `key=value&...`.
    #[default]
    Percent,
    /// A flat JSON object.
    Json,
}

impl ParameterEncoding {
    /// Append `parameters` to `url` as query items. JSON cannot be used in a URL.
    pub fn encode_url(self, url: Url, parameters: &Parameters) -> Option<Url> {
        match self {
            Self::Percent => append_query_parameters(url, parameters),
            Self::Json => None,
        }
    }

    /// Encode `parameters` as a request body.
    ///
    /// `escape` overrides [`QUERY_ESCAPE`] for percent encoding.
    pub fn encode_body(
        self,
        parameters: &Parameters,
        escape: Option<&'static AsciiSet>,
    ) -> Option<Bytes> {
        match self {
            Self::Percent => Some(Bytes::from(percent_encoded_query(
                parameters,
                escape.unwrap_or(QUERY_ESCAPE),
            ))),
            Self::Json => serde_json::to_vec(parameters).ok().map(Bytes::from),
        }
    }
}

impl fmt::Display for ParameterEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent => f.write_str("PERCENT"),
            Self::Json => f.write_str("JSON"),
        }
    }
}

/// Text form of a parameter value: strings verbatim, `null` empty, anything else as JSON.
pub fn parameter_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

/// Convert parameters to query items.
pub fn query_items(parameters: &Parameters) -> Vec<QueryItem> {
    parameters
        .iter()
        .map(|(name, value)| QueryItem::new(name.clone(), parameter_value(value)))
        .collect()
}

/// Encode parameters as `key=value&...` with the given escape set.
pub fn percent_encoded_query(parameters: &Parameters, escape: &'static AsciiSet) -> String {
    join_items(&query_items(parameters), escape)
}

fn join_items(items: &[QueryItem], escape: &'static AsciiSet) -> String {
    items
        .iter()
        .map(|item| item.encode(escape))
        .collect::<Vec<_>>()
        .join("&")
}

/// Append query items after any query already on `url`.
pub fn append_query_items(mut url: Url, items: &[QueryItem]) -> Url {
    if items.is_empty() {
        return url;
    }
    let appended = join_items(items, QUERY_ESCAPE);
    let query = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{appended}"),
        _ => appended,
    };
    url.set_query(Some(&query));
    url
}

/// Default [`QueryParameterEncoder`]: percent-encode and append.
pub fn append_query_parameters(url: Url, parameters: &Parameters) -> Option<Url> {
    Some(append_query_items(url, &query_items(parameters)))
}

/// The default [`QueryParameterEncoder`] as a shareable closure.
pub fn default_query_encoder() -> QueryParameterEncoder {
    Arc::new(append_query_parameters)
}
