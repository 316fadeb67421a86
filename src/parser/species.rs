use std::fmt;
use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use tracing::debug;

use super::{first_element_child, trimmed_text, ParsedDocument};
use crate::model::{PageRef, SpeciesRecord};

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// Why a list item produced no record. Local to extraction: the item is
/// skipped and the page carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingElement {
    Anchor,
    Href,
    NameElement,
    EmptyName,
}

impl fmt::Display for MissingElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self {
            Self::Anchor => "no anchor",
            Self::Href => "anchor has no href",
            Self::NameElement => "anchor has no element child",
            Self::EmptyName => "name is empty",
        };
        f.write_str(what)
    }
}

/// Species records from one letter page, lazily, in document order.
pub fn extract<'a>(
    doc: &'a ParsedDocument,
    items: &'a Selector,
) -> impl Iterator<Item = SpeciesRecord> + 'a {
    doc.select(items)
        .enumerate()
        .filter_map(|(idx, item)| match record_from_item(item) {
            Ok(rec) => Some(rec),
            Err(miss) => {
                debug!("Skipping list item {}: {}", idx, miss);
                None
            }
        })
}

/// `<li>` → first `<a>` → href + first element child's text.
pub fn record_from_item(item: ElementRef<'_>) -> Result<SpeciesRecord, MissingElement> {
    let anchor = item.select(&ANCHOR).next().ok_or(MissingElement::Anchor)?;
    let href = anchor.value().attr("href").ok_or(MissingElement::Href)?;
    if href.trim().is_empty() {
        return Err(MissingElement::Href);
    }
    let name_el = first_element_child(anchor).ok_or(MissingElement::NameElement)?;
    let latin_name = trimmed_text(name_el);
    if latin_name.is_empty() {
        return Err(MissingElement::EmptyName);
    }

    Ok(SpeciesRecord {
        latin_name,
        detail_url: PageRef::new(href),
    })
}
