use std::collections::HashSet;

use rb_core::types::cmp_published;
use rb_core::{ArticleSummary, Error, Fetcher, Result};
use tracing::{debug, info};
use url::Url;

use super::{page_url, parse_articles, scan_pagination};

/// Collects the oldest articles of a newest-first paginated listing by
/// walking from the last page back to the first.
pub struct BackwardCrawler {
    fetcher: Fetcher,
    listing_url: Url,
}

impl BackwardCrawler {
    pub fn new(fetcher: Fetcher, listing_url: Url) -> Self {
        Self {
            fetcher,
            listing_url,
        }
    }

    pub fn listing_url(&self) -> &Url {
        &self.listing_url
    }

    /// Returns at most `limit` distinct articles, oldest first with undated
    /// articles last. The first failed fetch aborts the whole crawl.
    pub async fn collect_oldest(&self, limit: usize) -> Result<Vec<ArticleSummary>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let root_html = self.fetcher.get_text(self.listing_url.as_str()).await?;
        let last = scan_pagination(&root_html, &self.listing_url)?;
        info!(
            "🦗 Listing has {} pages, walking back from {}",
            last.last_page, last.last_page_url
        );

        let mut seen = HashSet::new();
        let mut collected = Vec::new();

        for page in (1..=last.last_page).rev() {
            if collected.len() >= limit {
                break;
            }
            let url = if page == last.last_page {
                last.last_page_url.clone()
            } else {
                page_url(&self.listing_url, page)?
            };
            let page_html = self.fetcher.get_text(&url).await?;
            let base = Url::parse(&url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;

            // The whole page is kept so that the sort below sees every
            // article of the newest page visited.
            for article in parse_articles(&page_html, &base)? {
                if seen.insert(article.url.clone()) {
                    collected.push(article);
                }
            }
            debug!("📄 Page {} done, {} articles collected", page, collected.len());
        }

        collected.sort_by(|a, b| cmp_published(a.published_at.as_ref(), b.published_at.as_ref()));
        collected.truncate(limit);
        info!("✨ Collected {} oldest articles", collected.len());
        Ok(collected)
    }
}
