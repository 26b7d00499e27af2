//! Polite HTTP fetching with bounded concurrency
//!
//! A single semaphore caps in-flight requests across the whole crawl (not
//! per host), and each worker sleeps for the politeness delay before its
//! request, so the effective request rate is roughly permits / delay.

use crate::config::CrawlConfig;
use crate::error::{LexragError, Result};
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: String,
}

/// HTTP fetcher shared by all crawl workers
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    permits: Arc<Semaphore>,
    delay: Duration,
}

impl Fetcher {
    /// Build a fetcher from the crawl configuration, sharing the given
    /// concurrency permits with the rest of the pipeline
    pub fn new(config: &CrawlConfig, permits: Arc<Semaphore>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| LexragError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            permits,
            delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    /// Fetch a single URL.
    ///
    /// Non-2xx responses and non-text content types are reported as
    /// [`LexragError::Network`]; the crawler treats these as skip, not
    /// fatal. The per-request timeout is enforced by the underlying client.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| LexragError::Network("fetcher is shutting down".to_string()))?;

        // Politeness delay per worker, inside the permit so the global
        // request rate stays bounded.
        tokio::time::sleep(self.delay).await;

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(LexragError::Network(format!(
                "{} returned status {}",
                url, status
            )));
        }

        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            let value = content_type.to_str().unwrap_or("");
            let is_text = value.starts_with("text/") || value.contains("html") || value.contains("xml");
            if !is_text {
                return Err(LexragError::Network(format!(
                    "{} returned non-text content type '{}'",
                    url, value
                )));
            }
        }

        let body = response.text().await?;
        Ok(FetchedPage {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlConfig;
    use httpmock::prelude::*;

    fn fetcher_with_delay(delay_ms: u64) -> Fetcher {
        let config = CrawlConfig {
            request_delay_ms: delay_ms,
            fetch_timeout_secs: 5,
            ..CrawlConfig::default()
        };
        Fetcher::new(&config, Arc::new(Semaphore::new(2))).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/act");
                then.status(200)
                    .header("content-type", "text/html")
                    .body("<html><body>Land Act</body></html>");
            })
            .await;

        let fetcher = fetcher_with_delay(0);
        let page = fetcher.fetch(&server.url("/act")).await.unwrap();
        assert_eq!(page.status, 200);
        assert!(page.body.contains("Land Act"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_2xx_is_network_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone");
                then.status(404);
            })
            .await;

        let fetcher = fetcher_with_delay(0);
        let result = fetcher.fetch(&server.url("/gone")).await;
        assert!(matches!(result, Err(LexragError::Network(_))));
    }

    #[tokio::test]
    async fn test_non_text_content_type_is_network_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/seal.png");
                then.status(200)
                    .header("content-type", "image/png")
                    .body("binary");
            })
            .await;

        let fetcher = fetcher_with_delay(0);
        let result = fetcher.fetch(&server.url("/seal.png")).await;
        assert!(matches!(result, Err(LexragError::Network(_))));
    }

    #[tokio::test]
    async fn test_politeness_delay_applies() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow");
                then.status(200).header("content-type", "text/html").body("ok");
            })
            .await;

        let fetcher = fetcher_with_delay(100);
        let started = std::time::Instant::now();
        fetcher.fetch(&server.url("/slow")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let fetcher = fetcher_with_delay(0);
        let result = fetcher.fetch("http://127.0.0.1:1/nothing").await;
        assert!(matches!(result, Err(LexragError::Network(_))));
    }
}
