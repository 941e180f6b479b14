//! Network access for the worker.
//!
//! ### Network seam
//! - [`Network`] is the only way the worker reaches the origin.
//! - Transport failures become `Error::NetworkFailure`.
//! - Non-success statuses are returned as responses, callers decide whether
//!   to store them.
//!
//! ### Credentials
//! - The configured session cookie is sent for `include` requests, and for
//!   `same-origin` requests whose URL shares the configured origin.
//!
//! ### Timeouts
//! - None by default. A hung fetch blocks its request until the host gives up.

pub mod url;

use async_trait::async_trait;
use reqwest::{Client, header};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

pub use url::{UrlError, is_same_origin, resolve};

use lumina_core::{AppConfig, Credentials, Error, Request, Response};

/// Something that can perform a request against the network.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "lumina-sw/0.1")
    pub user_agent: String,

    /// Origin used to decide same-origin credentials.
    pub origin: ::url::Url,

    /// Request timeout (default: none)
    pub timeout: Option<Duration>,

    /// Cookie header value sent when credentials allow it.
    pub session_cookie: Option<String>,
}

impl FetchConfig {
    /// Build the fetch configuration from the application config.
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = ::url::Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
        Ok(Self {
            user_agent: config.user_agent.clone(),
            origin,
            timeout: config.timeout(),
            session_cookie: config.session_cookie.clone(),
        })
    }
}

/// reqwest-backed [`Network`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| Error::NetworkFailure(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Whether the session cookie goes out with this request.
    fn sends_credentials(&self, request: &Request) -> bool {
        match request.credentials {
            Credentials::Omit => false,
            Credentials::Include => true,
            Credentials::SameOrigin => is_same_origin(&request.url, &self.config.origin),
        }
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let mut builder = self.http.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(cookie) = &self.config.session_cookie
            && self.sends_credentials(request)
        {
            builder = builder.header(header::COOKIE, cookie.as_str());
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::NetworkFailure(format!("{}: {}", request.url, e)))?;

        let status = response.status();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::NetworkFailure(format!("failed to read {}: {}", request.url, e)))?;

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FetchConfig {
        FetchConfig::from_app(&AppConfig {
            origin: "https://lumina.test".into(),
            session_cookie: Some("sessionid=abc".into()),
            ..Default::default()
        })
        .unwrap()
    }

    fn request(url: &str, credentials: Credentials) -> Request {
        Request::get(::url::Url::parse(url).unwrap()).credentials(credentials)
    }

    #[test]
    fn test_fetch_config_from_app() {
        let config = FetchConfig::from_app(&AppConfig::default()).unwrap();
        assert_eq!(config.user_agent, "lumina-sw/0.1");
        assert_eq!(config.origin.as_str(), "http://localhost:8000/");
        assert!(config.timeout.is_none());
        assert!(config.session_cookie.is_none());
    }

    #[test]
    fn test_fetch_config_bad_origin() {
        let app = AppConfig { origin: "not a url".into(), ..Default::default() };
        assert!(matches!(FetchConfig::from_app(&app), Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_credentials_modes() {
        let client = FetchClient::new(config()).unwrap();
        assert!(client.sends_credentials(&request("https://lumina.test/", Credentials::SameOrigin)));
        assert!(!client.sends_credentials(&request("https://cdn.example.com/", Credentials::SameOrigin)));
        assert!(client.sends_credentials(&request("https://cdn.example.com/", Credentials::Include)));
        assert!(!client.sends_credentials(&request("https://lumina.test/", Credentials::Omit)));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_network_failure() {
        let client = FetchClient::new(config()).unwrap();
        let result = client.fetch(&request("http://127.0.0.1:9/", Credentials::Omit)).await;
        assert!(matches!(result, Err(Error::NetworkFailure(_))));
    }
}
