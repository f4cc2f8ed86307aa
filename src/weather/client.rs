//! Retrieval of the raw observations document

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use tracing::instrument;

use crate::config::FeedConfig;

/// Source of raw observation documents
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_document(&self) -> Result<String>;
}

/// HTTP client for the observations feed, retrying transient failures
pub struct FeedClient {
    client: ClientWithMiddleware,
    url: String,
}

impl FeedClient {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("deliveryfee/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self::with_http_client(http, config))
    }

    /// Wrap an already configured HTTP client in the retry stack
    pub fn with_http_client(http: reqwest::Client, config: &FeedConfig) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            client,
            url: config.url.clone(),
        }
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    #[instrument(name = "fetch_observations", skip(self), fields(url = %self.url))]
    async fn fetch_document(&self) -> Result<String> {
        tracing::debug!("Calling the observations feed");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to reach observations feed {}", self.url))?
            .error_for_status()
            .with_context(|| "Observations feed returned an error status")?;

        response
            .text()
            .await
            .with_context(|| "Failed to read observations feed body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, routing::get};
    use rstest::rstest;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}/observations.php")
    }

    fn local_client(url: String) -> FeedClient {
        let config = FeedConfig {
            url,
            max_retries: 0,
            ..FeedConfig::default()
        };
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        FeedClient::with_http_client(http, &config)
    }

    #[test]
    fn test_client_builds_from_config() {
        assert!(FeedClient::new(&FeedConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let url = serve(Router::new().route(
            "/observations.php",
            get(|| async { r#"<observations timestamp="1707227435"/>"# }),
        ))
        .await;

        let document = local_client(url).fetch_document().await.unwrap();
        assert_eq!(document, r#"<observations timestamp="1707227435"/>"#);
    }

    #[rstest]
    #[case(StatusCode::NOT_FOUND)]
    #[case(StatusCode::INTERNAL_SERVER_ERROR)]
    #[tokio::test]
    async fn test_error_status_fails_fetch(#[case] status: StatusCode) {
        let url = serve(Router::new().route(
            "/observations.php",
            get(move || async move { (status, "unavailable") }),
        ))
        .await;

        let err = local_client(url).fetch_document().await.unwrap_err();
        assert!(format!("{err:#}").contains("error status"), "{err:#}");
    }
}
