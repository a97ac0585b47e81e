//! Async HTTP client wrapping reqwest.
//!
//! Not a browser — one GET per call with a bounded timeout. No retries, no
//! cookie jar; the next resolution cycle is the retry.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ValueIndexResult;

/// Desktop Chrome user-agent sent when a retailer spec does not override it.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/131.0.0.0 Safari/537.36";

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Original requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

/// Something that can fetch a listing page.
///
/// Implemented by [`HttpClient`]; tests substitute canned pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Perform one GET with the given extra headers.
    ///
    /// Non-200 responses are returned as `Ok` so the caller can inspect the
    /// status; only transport failures are `Err`.
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> ValueIndexResult<HttpResponse>;
}

/// HTTP client used by retailer probes.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> ValueIndexResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> ValueIndexResult<HttpResponse> {
        let mut builder = self.client.get(url);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let r = builder.send().await?;
        let status = r.status().as_u16();
        let final_url = r.url().to_string();

        tracing::debug!("GET {url} -> {status} ({final_url})");

        // Skip reading bodies we are going to discard anyway.
        if status != 200 {
            return Ok(HttpResponse {
                url: url.to_string(),
                final_url,
                status,
                body: String::new(),
            });
        }

        let body = r.text().await?;

        Ok(HttpResponse {
            url: url.to_string(),
            final_url,
            status,
            body,
        })
    }
}
