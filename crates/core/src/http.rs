//! Request and response snapshots exchanged between the dispatcher, the
//! network and the cache store.

use std::collections::BTreeMap;

use bytes::Bytes;
use url::Url;

/// Credentials mode of an outbound request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Credentials {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

/// An intercepted request.
///
/// Header names are stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Bytes>,
    pub credentials: Credentials,
}

impl Request {
    pub fn new(method: impl Into<String>, url: Url) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            url,
            headers: BTreeMap::new(),
            body: None,
            credentials: Credentials::default(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// True for `http` and `https` URLs.
    pub fn is_http(&self) -> bool {
        self.url.scheme().starts_with("http")
    }

    /// True when the `accept` header asks for HTML.
    pub fn accepts_html(&self) -> bool {
        self.header_value("accept").is_some_and(|accept| accept.contains("text/html"))
    }
}

/// A response snapshot: status, headers and the full body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, status_text: String::new(), headers: BTreeMap::new(), body: body.into() }
    }

    pub fn status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Synthetic terminal fallback returned when nothing else is available.
    pub fn service_unavailable() -> Self {
        Self::new(503, "Offline")
            .status_text("Service Unavailable")
            .header("content-type", "text/plain")
    }

    /// Status in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_method_uppercased() {
        let req = Request::new("post", url("https://example.com/"));
        assert_eq!(req.method, "POST");
        assert!(!req.is_get());
    }

    #[test]
    fn test_accepts_html() {
        let req = Request::get(url("https://example.com/book/42/"))
            .header("Accept", "text/html,application/xhtml+xml;q=0.9");
        assert!(req.accepts_html());

        let json = Request::get(url("https://example.com/api")).header("accept", "application/json");
        assert!(!json.accepts_html());

        let none = Request::get(url("https://example.com/"));
        assert!(!none.accepts_html());
    }

    #[test]
    fn test_is_http() {
        assert!(Request::get(url("http://example.com/")).is_http());
        assert!(Request::get(url("https://example.com/")).is_http());
        assert!(!Request::get(url("chrome-extension://abc/script.js")).is_http());
    }

    #[test]
    fn test_service_unavailable() {
        let resp = Response::service_unavailable();
        assert_eq!(resp.status, 503);
        assert_eq!(resp.status_text, "Service Unavailable");
        assert_eq!(resp.content_type(), Some("text/plain"));
        assert_eq!(resp.text(), "Offline");
        assert!(!resp.is_success());
    }

    #[test]
    fn test_success_range() {
        assert!(Response::new(200, "").is_success());
        assert!(Response::new(204, "").is_success());
        assert!(!Response::new(304, "").is_success());
        assert!(!Response::new(404, "").is_success());
    }
}
