use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, ScrapeError};

/// A reference to a page on the source site, exactly as it appears in an
/// `href` attribute (usually relative, e.g. `taxalist-A.aspx`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageRef(String);

impl PageRef {
    pub fn new(href: impl Into<String>) -> Self {
        Self(href.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve against `base` the way a browser resolves an `href`.
    pub fn join(&self, base: &Url) -> Result<Url> {
        base.join(&self.0).map_err(|source| ScrapeError::InvalidUrl {
            input: self.0.clone(),
            source,
        })
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<Url> for PageRef {
    fn from(url: Url) -> Self {
        Self(url.into())
    }
}

/// One species entry from a letter page. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub latin_name: String,
    pub detail_url: PageRef,
}

impl SpeciesRecord {
    pub fn new(latin_name: impl Into<String>, detail_url: impl Into<PageRef>) -> Self {
        Self {
            latin_name: latin_name.into(),
            detail_url: detail_url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_relative_to_page() {
        let base = Url::parse("https://hoytarboretum.gardenexplorer.org/taxalist.aspx").unwrap();
        let url = PageRef::new("taxalist-A.aspx").join(&base).unwrap();
        assert_eq!(url.as_str(), "https://hoytarboretum.gardenexplorer.org/taxalist-A.aspx");
    }

    #[test]
    fn join_keeps_absolute_refs() {
        let base = Url::parse("https://example.org/a/b.aspx").unwrap();
        let url = PageRef::new("https://other.org/x").join(&base).unwrap();
        assert_eq!(url.as_str(), "https://other.org/x");
    }

    #[test]
    fn serializes_as_plain_string() {
        let rec = SpeciesRecord::new("Abies alba", "taxon-312.aspx");
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"{"latin_name":"Abies alba","detail_url":"taxon-312.aspx"}"#);
    }
}
