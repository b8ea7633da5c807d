use crate::utils::APP_NAME;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can fetch a document by URL. Feeds, book pages and movie
/// metadata all go through this so importers can run against fixtures.
#[async_trait]
pub trait HttpSource: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String>;
}

#[async_trait]
impl HttpSource for Client {
    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {} failed", redact(url)))?;
        let response = response
            .error_for_status()
            .with_context(|| format!("{} returned an error status", redact(url)))?;
        response
            .text()
            .await
            .with_context(|| format!("failed to read body from {}", redact(url)))
    }
}

pub fn build_http_client() -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(format!("{APP_NAME}/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")
}

/// Drops the query string so API keys never reach logs or error chains.
pub(crate) fn redact(url: &str) -> &str {
    url.split_once('?').map(|(path, _)| path).unwrap_or(url)
}

#[cfg(test)]
pub(crate) mod fake {
    use super::HttpSource;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned bodies keyed by exact URL and remembers every request.
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pages: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeSource {
        pub(crate) fn with(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
            self.pages.insert(url.into(), body.into());
            self
        }

        pub(crate) fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpSource for FakeSource {
        async fn get_text(&self, url: &str) -> Result<String> {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow!("404 for {url}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_strips_query() {
        assert_eq!(
            redact("https://api.themoviedb.org/3/movie/603?api_key=secret"),
            "https://api.themoviedb.org/3/movie/603"
        );
        assert_eq!(redact("https://example.com/feed"), "https://example.com/feed");
    }
}
