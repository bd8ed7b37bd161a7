use lazy_static::lazy_static;
use rb_core::Result;
use regex::Regex;
use scraper::Html;
use url::Url;

use super::page_url;
use crate::scrapers::utils;

lazy_static! {
    static ref PAGE_SEGMENT: Regex = Regex::new(r"/page/(\d+)").expect("valid page regex");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub last_page_url: String,
    pub last_page: u32,
}

/// Finds the highest page number among the pagination controls and the URL
/// that leads to it. Without controls the listing is its own last page.
pub fn scan_pagination(html: &str, listing_url: &Url) -> Result<PageInfo> {
    let document = Html::parse_document(html);
    let controls = utils::selector(".page-numbers")?;

    let mut info = PageInfo {
        last_page_url: listing_url.to_string(),
        last_page: 1,
    };

    for control in document.select(&controls) {
        let href = control.value().attr("href");
        let label = utils::element_text(control);

        let number = label
            .parse::<u32>()
            .ok()
            .or_else(|| href.and_then(page_from_href));
        let Some(number) = number else {
            continue;
        };

        if number >= info.last_page {
            info.last_page = number;
            info.last_page_url = match href.and_then(|h| utils::resolve_url(listing_url, h)) {
                Some(url) => url,
                None => page_url(listing_url, number)?,
            };
        }
    }

    Ok(info)
}

fn page_from_href(href: &str) -> Option<u32> {
    PAGE_SEGMENT
        .captures(href)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
