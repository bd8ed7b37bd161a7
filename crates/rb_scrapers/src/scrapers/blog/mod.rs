//! Scraping for the blog listing pages. Selectors follow the site's current
//! theme markup.

use rb_core::{Error, Result};
use url::Url;

pub mod crawler;
pub mod listing;
pub mod pagination;

pub use crawler::BackwardCrawler;
pub use listing::parse_articles;
pub use pagination::{scan_pagination, PageInfo};

/// URL of listing page `n`, i.e. `<listing>/page/<n>/`.
pub fn page_url(listing_url: &Url, page: u32) -> Result<String> {
    listing_url
        .join(&format!("page/{}/", page))
        .map(String::from)
        .map_err(|e| Error::InvalidUrl(format!("{}: {}", listing_url, e)))
}
