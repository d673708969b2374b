//! Paragraph scraper: fetch a page and keep the text of its `<p>` elements.
//!
//! No JavaScript rendering; static HTML only.

use std::time::Duration;

use async_trait::async_trait;
use instagraph_core::{Error, Result};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Source of page text for URL inputs.
#[async_trait]
pub trait PageScraper: Send + Sync {
    /// Fetch `url` and return its readable text.
    async fn scrape(&self, url: &str) -> Result<String>;
}

/// Join the text of every `<p>` element with single spaces.
pub fn paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(&PARAGRAPH)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// reqwest-backed scraper.
pub struct HttpScraper {
    client: reqwest::Client,
}

impl HttpScraper {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("instagraph/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageScraper for HttpScraper {
    async fn scrape(&self, url: &str) -> Result<String> {
        debug!("Fetching {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(error = %e, "Scrape request failed");
            Error::Http(format!("Could not retrieve content from URL: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, url, "Scrape returned non-success status");
            return Err(Error::Http(format!(
                "Could not retrieve content from URL (HTTP {})",
                status.as_u16()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("Failed to read response body: {}", e)))?;
        let text = paragraph_text(&html);
        info!("web scrape done: {} chars from {}", text.len(), url);
        Ok(text)
    }
}
