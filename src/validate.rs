//! Response validation.
//!
//! Adapters run the checks in a fixed order: status, then content type, then
//! non-empty body. The first failure wins.

use std::{collections::BTreeSet, ops::Range};

use bytes::Bytes;
use http::{StatusCode, header::CONTENT_TYPE};

use crate::{Error, Result};

/// Status codes accepted when nothing else is configured.
pub const DEFAULT_ACCEPTABLE_STATUS: Range<u16> = 200..300;

/// Fail with [`Error::Status`] if `status` is outside `acceptable`.
///
/// # Errors
///
/// See above.
pub fn validate_status(status: StatusCode, acceptable: &Range<u16>) -> Result<()> {
    if acceptable.contains(&status.as_u16()) {
        Ok(())
    } else {
        Err(Error::Status { status })
    }
}

fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

/// Check the response content type against an optional allow-list.
///
/// Only the media type is compared (parameters such as `charset` are ignored),
/// without regard to ASCII case.
///
/// # Errors
///
/// [`Error::BadResponse`] if an allow-list is given and there is no content
/// type; [`Error::ContentTypeRejected`] if it is not listed.
pub fn validate_content_type(
    content_type: Option<&str>,
    acceptable: Option<&BTreeSet<String>>,
) -> Result<()> {
    let Some(acceptable) = acceptable else {
        return Ok(());
    };
    let content_type = content_type.ok_or(Error::BadResponse)?;
    let essence = media_type(content_type);
    if acceptable
        .iter()
        .any(|allowed| media_type(allowed).eq_ignore_ascii_case(essence))
    {
        Ok(())
    } else {
        Err(Error::ContentTypeRejected {
            content_type: content_type.to_owned(),
        })
    }
}

/// Fail with [`Error::ZeroByteResource`] if `body` is empty.
///
/// # Errors
///
/// See above.
pub fn validate_not_empty(body: &[u8]) -> Result<()> {
    if body.is_empty() {
        Err(Error::ZeroByteResource)
    } else {
        Ok(())
    }
}

/// Validation policy applied to every response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    /// Accepted status codes (half-open).
    pub acceptable_status: Range<u16>,
    /// Accepted content types; `None` disables the check.
    pub acceptable_content_types: Option<BTreeSet<String>>,
    /// Whether an empty body is an error.
    pub require_body: bool,
}

impl Default for Validation {
    fn default() -> Self {
        Self {
            acceptable_status: DEFAULT_ACCEPTABLE_STATUS,
            acceptable_content_types: None,
            require_body: true,
        }
    }
}

impl Validation {
    /// Set the accepted status range.
    #[must_use]
    pub const fn acceptable_status(mut self, range: Range<u16>) -> Self {
        self.acceptable_status = range;
        self
    }

    /// Set the content type allow-list.
    #[must_use]
    pub fn acceptable_content_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.acceptable_content_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Allow empty bodies.
    #[must_use]
    pub const fn allow_empty(mut self) -> Self {
        self.require_body = false;
        self
    }

    /// Run every check against `response`.
    ///
    /// # Errors
    ///
    /// The first failing check's error.
    pub fn validate(&self, response: &http::Response<Bytes>) -> Result<()> {
        let result = self.run(response);
        if let Err(err) = &result {
            tracing::warn!(
                error = %err,
                status = response.status().as_u16(),
                body = %String::from_utf8_lossy(response.body()),
                "response rejected"
            );
        }
        result
    }

    fn run(&self, response: &http::Response<Bytes>) -> Result<()> {
        validate_status(response.status(), &self.acceptable_status)?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        validate_content_type(content_type, self.acceptable_content_types.as_ref())?;
        if self.require_body {
            validate_not_empty(response.body())?;
        }
        Ok(())
    }
}

/// Validate `response` against `validation`.
///
/// # Errors
///
/// The first failing check's error.
pub fn validate_response(response: &http::Response<Bytes>, validation: &Validation) -> Result<()> {
    validation.validate(response)
}
