//! Default `User-Agent`, `Accept-Encoding` and `Accept-Language` headers.

use super::{HttpHeader, HttpHeaders};

const UNKNOWN: &str = "Unknown";
const LIBRARY_NAME: &str = "webservice";
const MAX_LANGUAGES: usize = 6;
const FALLBACK_LANGUAGE: &str = "en";

/// Encodings advertised by default, most preferred first.
pub const DEFAULT_ENCODINGS: [&str; 3] = ["br", "gzip", "deflate"];

/// Application metadata used to build the default `User-Agent`.
///
/// Every field is best effort; anything not supplied renders as `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    /// Executable name.
    pub app_name: Option<String>,
    /// Marketing version.
    pub app_version: Option<String>,
    /// Reverse-DNS bundle identifier.
    pub bundle_id: Option<String>,
    /// Build number.
    pub build: Option<String>,
    /// Operating system version.
    pub os_version: Option<String>,
    /// Preferred languages, most preferred first.
    pub preferred_languages: Vec<String>,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self::detect()
    }
}

impl AppInfo {
    /// Resolve what can be learned from the running process.
    pub fn detect() -> Self {
        Self {
            app_name: process_name(),
            app_version: None,
            bundle_id: None,
            build: None,
            os_version: None,
            preferred_languages: vec![FALLBACK_LANGUAGE.to_owned()],
        }
    }

    /// Set the application version.
    #[must_use]
    pub fn app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = Some(version.into());
        self
    }

    /// Set the bundle identifier.
    #[must_use]
    pub fn bundle_id(mut self, bundle_id: impl Into<String>) -> Self {
        self.bundle_id = Some(bundle_id.into());
        self
    }

    /// Set the build number.
    #[must_use]
    pub fn build(mut self, build: impl Into<String>) -> Self {
        self.build = Some(build.into());
        self
    }

    /// Set the operating system version.
    #[must_use]
    pub fn os_version(mut self, version: impl Into<String>) -> Self {
        self.os_version = Some(version.into());
        self
    }

    /// Set the preferred language list.
    #[must_use]
    pub fn preferred_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred_languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Render the `User-Agent` string.
    ///
    /// Format: `{app}/{version} ({bundle}; build:{build}; {os} {os_version}) webservice`.
    /// Characters that cannot appear in a header value are dropped.
    pub fn user_agent(&self) -> String {
        let field = |value: &Option<String>| value.clone().unwrap_or_else(|| UNKNOWN.to_owned());
        format!(
            "{}/{} ({}; build:{}; {} {}) {LIBRARY_NAME}",
            field(&self.app_name),
            field(&self.app_version),
            field(&self.bundle_id),
            field(&self.build),
            os_name(),
            field(&self.os_version),
        )
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect()
    }
}

fn process_name() -> Option<String> {
    std::env::args()
        .next()
        .and_then(|arg| arg.rsplit(['/', '\\']).next().map(str::to_owned))
        .filter(|name| !name.is_empty())
}

fn os_name() -> &'static str {
    match std::env::consts::OS {
        "" => UNKNOWN,
        os => os,
    }
}

/// Join values with descending quality weights: `a;q=1.0, b;q=0.9, ...`.
///
/// Quality drops by 0.1 per entry and bottoms out at 0.0.
pub fn quality_encoded<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let tenths = 10usize.saturating_sub(index);
            format!("{};q={}.{}", value.as_ref(), tenths / 10, tenths % 10)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Default `User-Agent` header for `info`.
pub fn user_agent(info: &AppInfo) -> HttpHeader {
    HttpHeader::user_agent(info.user_agent())
}

/// Default `Accept-Encoding` header.
pub fn accept_encoding() -> HttpHeader {
    HttpHeader::accept_encoding(quality_encoded(DEFAULT_ENCODINGS))
}

/// Default `Accept-Language` header built from the first six preferred languages.
///
/// An empty preference list falls back to `en`.
pub fn accept_language(info: &AppInfo) -> HttpHeader {
    let languages: Vec<&str> = info
        .preferred_languages
        .iter()
        .map(String::as_str)
        .filter(|language| !language.is_empty())
        .take(MAX_LANGUAGES)
        .collect();
    if languages.is_empty() {
        return HttpHeader::accept_language(quality_encoded([FALLBACK_LANGUAGE]));
    }
    HttpHeader::accept_language(quality_encoded(languages))
}

/// The three default headers for `info`.
pub fn default_headers(info: &AppInfo) -> HttpHeaders {
    [user_agent(info), accept_encoding(), accept_language(info)]
        .into_iter()
        .collect()
}
