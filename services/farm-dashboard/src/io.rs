//! HTTP transport abstraction for testability

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

use crate::config::ClientConfig;
use crate::error::DashboardError;

/// HTTP response from a request that reached the server
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over the HTTP transport for dependency injection.
///
/// Implementations classify failures that never produced a response as
/// [`DashboardError::Timeout`] or [`DashboardError::Unreachable`]. Any
/// response, whatever its status, is returned as `Ok`.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request to the given URL
    async fn get(&self, url: &str) -> crate::Result<HttpResponse>;

    /// Send a POST request with a JSON body
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl std::fmt::Debug for ReqwestHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestHttpClient").finish_non_exhaustive()
    }
}

impl ReqwestHttpClient {
    /// Build a client carrying the configured timeout, headers and cookie policy
    pub fn new(config: &ClientConfig) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                DashboardError::Config(format!("Invalid header name {:?}: {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                DashboardError::Config(format!("Invalid value for header {}: {}", name, e))
            })?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .cookie_store(config.with_credentials)
            .build()
            .map_err(|e| DashboardError::Config(format!("Building HTTP client: {}", e)))?;

        tracing::debug!(
            "Created HTTP client (timeout={:?}, credentials={})",
            config.timeout(),
            config.with_credentials
        );

        Ok(Self { client })
    }

    async fn execute(
        &self,
        method: &str,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> crate::Result<HttpResponse> {
        let response = request
            .send()
            .await
            .map_err(|e| classify(method, url, &e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| classify(method, url, &e))?;

        if !(200..300).contains(&status) {
            tracing::warn!("Response error: {} {} -> {}: {}", method, url, status, body);
        }

        tracing::debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

/// Map a reqwest failure that produced no usable response onto the error taxonomy
fn classify(method: &str, url: &str, error: &reqwest::Error) -> DashboardError {
    let detail = format!("{} {} failed: {}", method, url, error);
    tracing::warn!("Request error: {}", detail);
    if error.is_timeout() {
        DashboardError::Timeout(detail)
    } else {
        DashboardError::Unreachable(detail)
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> crate::Result<HttpResponse> {
        tracing::debug!("GET {}", url);
        self.execute("GET", url, self.client.get(url)).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> crate::Result<HttpResponse> {
        tracing::debug!("POST {}", url);
        let request = self.client.post(url).json(body);
        self.execute("POST", url, request).await
    }
}
