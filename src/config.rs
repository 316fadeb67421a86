use url::Url;

use crate::error::{Result, ScrapeError};

pub const DEFAULT_BASE_URL: &str = "https://hoytarboretum.gardenexplorer.org/taxalist.aspx";
/// Anchors inside the alphabet strip of the root page, one per letter.
pub const DEFAULT_LINKS_SELECTOR: &str = "div.alphabet a";
/// One `<li>` per species on a letter page.
pub const DEFAULT_ITEMS_SELECTOR: &str = "div.taxalist li";

/// Everything a run needs, threaded explicitly from the CLI.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub links_selector: String,
    pub items_selector: String,
    pub limit: Option<usize>,
    pub absolute_urls: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            links_selector: DEFAULT_LINKS_SELECTOR.to_string(),
            items_selector: DEFAULT_ITEMS_SELECTOR.to_string(),
            limit: None,
            absolute_urls: false,
        }
    }
}

impl ScrapeConfig {
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|source| ScrapeError::InvalidUrl {
            input: self.base_url.clone(),
            source,
        })
    }
}
