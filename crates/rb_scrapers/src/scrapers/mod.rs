use rb_core::{Error, Result};
use scraper::{ElementRef, Node, Selector};
use url::Url;

pub mod blog;
pub mod extract;

/// Common utilities for scrapers
pub(crate) mod utils {
    use super::*;

    /// Elements whose text never counts as page content.
    pub const STRIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "iframe"];

    pub fn selector(css: &str) -> Result<Selector> {
        Selector::parse(css)
            .map_err(|e| Error::Scraping(format!("Invalid selector {}: {:?}", css, e)))
    }

    /// Collapses whitespace runs to one space and trims.
    pub fn normalize_text(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn element_text(element: ElementRef) -> String {
        normalize_text(&element.text().collect::<String>())
    }

    /// Text of an element, skipping anything inside script-like elements.
    pub fn visible_text(element: ElementRef) -> String {
        let mut out = String::new();
        collect_visible(element, &mut out);
        normalize_text(&out)
    }

    fn collect_visible(element: ElementRef, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => {
                    out.push_str(text);
                    out.push(' ');
                }
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        if !STRIPPED_ELEMENTS.contains(&child.value().name()) {
                            collect_visible(child, out);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// True when the element is, or sits inside, a script-like element.
    pub fn is_stripped(element: ElementRef) -> bool {
        STRIPPED_ELEMENTS.contains(&element.value().name())
            || element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| STRIPPED_ELEMENTS.contains(&a.value().name()))
    }

    pub fn non_empty(text: String) -> Option<String> {
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Resolves a possibly relative link against the page it was found on.
    pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
        base.join(href.trim()).ok().map(String::from)
    }
}
