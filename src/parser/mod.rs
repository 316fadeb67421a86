pub mod links;
pub mod species;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::ScrapeConfig;
use crate::error::{Result, ScrapeError};

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// A parsed page. Owned by the single extraction call that built it.
pub struct ParsedDocument {
    html: Html,
}

impl ParsedDocument {
    /// html5ever recovers from any markup, so parsing itself cannot fail.
    pub fn parse(text: &str) -> Self {
        Self {
            html: Html::parse_document(text),
        }
    }

    /// All matches in document order.
    pub fn select<'a, 'b>(&'a self, selector: &'b Selector) -> scraper::html::Select<'a, 'b> {
        self.html.select(selector)
    }
}

/// The two site-specific queries, compiled once per run.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub letter_links: Selector,
    pub species_items: Selector,
}

impl Selectors {
    pub fn compile(config: &ScrapeConfig) -> Result<Self> {
        Ok(Self {
            letter_links: compile(&config.links_selector)?,
            species_items: compile(&config.items_selector)?,
        })
    }
}

#[cfg(test)]
impl Selectors {
    pub(crate) fn site_defaults() -> Self {
        Self::compile(&ScrapeConfig::default()).unwrap()
    }
}

pub fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// First child that is an element, whatever its tag. Text nodes are passed over.
pub fn first_element_child(node: ElementRef<'_>) -> Option<ElementRef<'_>> {
    node.children().find_map(ElementRef::wrap)
}

/// Concatenated text content, trimmed. Goes one step past trimming: runs of
/// whitespace inside the text (a name wrapped across source lines) are
/// collapsed to a single space.
pub fn trimmed_text(node: ElementRef<'_>) -> String {
    let raw: String = node.text().collect();
    WS_RE.replace_all(raw.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_child_skips_text_nodes() {
        let doc = ParsedDocument::parse(r#"<p id="x">  lead <i>Quercus</i><b>no</b></p>"#);
        let sel = compile("p#x").unwrap();
        let p = doc.select(&sel).next().unwrap();
        let child = first_element_child(p).unwrap();
        assert_eq!(child.value().name(), "i");
        assert_eq!(trimmed_text(child), "Quercus");
    }

    #[test]
    fn text_collapses_inner_whitespace() {
        let doc = ParsedDocument::parse("<b>\n   Abies\n     alba  </b>");
        let sel = compile("b").unwrap();
        let b = doc.select(&sel).next().unwrap();
        assert_eq!(trimmed_text(b), "Abies alba");
    }

    #[test]
    fn text_keeps_non_ascii() {
        let doc = ParsedDocument::parse("<b> Castanea × neglecta </b>");
        let sel = compile("b").unwrap();
        let b = doc.select(&sel).next().unwrap();
        assert_eq!(trimmed_text(b), "Castanea × neglecta");
    }

    #[test]
    fn site_defaults_compile() {
        assert!(Selectors::compile(&ScrapeConfig::default()).is_ok());
    }

    #[test]
    fn malformed_selector_is_reported() {
        let cfg = ScrapeConfig {
            items_selector: "li[[".into(),
            ..Default::default()
        };
        match Selectors::compile(&cfg) {
            Err(ScrapeError::Selector { selector, .. }) => assert_eq!(selector, "li[["),
            other => panic!("expected Selector error, got {:?}", other.map(|_| ())),
        }
    }
}
