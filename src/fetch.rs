use std::time::Instant;

use tracing::{debug, info};
use url::Url;

use crate::error::{Result, ScrapeError};

/// Retrieves the decoded body of a page. The only network boundary.
#[allow(async_fn_in_trait)]
pub trait DocumentFetcher {
    async fn fetch(&self, url: &Url) -> Result<String>;
}

/// Plain unauthenticated GET over a single shared client.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        info!("Fetching {}", url);
        let start = Instant::now();

        let transport = |source| ScrapeError::Fetch {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Decoded by the Content-Type charset, UTF-8 when none is declared.
        let body = response.text().await.map_err(transport)?;
        debug!(
            "Fetched {} bytes from {} in {}ms",
            body.len(),
            url,
            start.elapsed().as_millis()
        );
        Ok(body)
    }
}
