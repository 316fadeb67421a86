use scraper::Selector;
use tracing::debug;

use super::ParsedDocument;
use crate::model::PageRef;

/// Letter-page references from the root index, in document order.
///
/// `selector` scopes the anchors (container + `a`); nothing else is checked.
/// A page without the container yields an empty list.
pub fn discover(doc: &ParsedDocument, selector: &Selector) -> Vec<PageRef> {
    let refs: Vec<PageRef> = doc
        .select(selector)
        .filter_map(|a| a.value().attr("href"))
        .map(PageRef::new)
        .collect();

    debug!("Discovered {} letter pages", refs.len());
    refs
}
