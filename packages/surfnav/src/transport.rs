//! The transport screens use to fetch content.

use async_trait::async_trait;
use http::{HeaderMap, Method};

use crate::error::TransportError;

/// A request issued by a [`RequestScreen`](crate::screen::RequestScreen).
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    /// Path (with query) or absolute URL to fetch.
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    /// An `application/x-www-form-urlencoded` body.
    pub body: Option<String>,
}

impl Request {
    /// Every header as a name/value pair, repeated names included, in insertion order. Values
    /// that are not visible ASCII are skipped.
    pub fn header_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)))
    }
}

/// A completed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// The URL the response was served from, after redirects.
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl Response {
    /// 2xx or 304.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) || self.status == 304
    }
}

/// Performs requests.
///
/// Dropping the returned future must abort the underlying request; the controller relies on it
/// for cancellation and timeouts.
#[async_trait(?Send)]
pub trait Transport {
    async fn request(&self, request: Request) -> Result<Response, TransportError>;
}

/// A form submission captured for a navigation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormSubmission {
    /// The form's `action`, resolved to a URL or path.
    pub action: String,
    /// The form's method. Forms using `GET` are never intercepted.
    pub method: Method,
    /// Form fields in document order.
    pub fields: Vec<(String, String)>,
    /// Names of the fields that carry a selected file. Files cannot be url-encoded, so such
    /// forms are left to the browser.
    pub file_fields: Vec<String>,
}

impl FormSubmission {
    pub fn new(action: impl Into<String>, method: Method) -> Self {
        Self {
            action: action.into(),
            method,
            fields: Vec::new(),
            file_fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Record a field holding a selected file.
    pub fn file_field(mut self, name: impl Into<String>) -> Self {
        self.file_fields.push(name.into());
        self
    }

    pub fn has_files(&self) -> bool {
        !self.file_fields.is_empty()
    }

    /// The fields encoded as `application/x-www-form-urlencoded`.
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields.iter())
            .finish()
    }
}
