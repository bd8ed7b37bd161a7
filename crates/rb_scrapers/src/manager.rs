use std::sync::Arc;

use rb_core::{Article, ArticleStorage, Config, Fetcher, NewArticle, Result};
use tracing::info;

use crate::scrapers::blog::BackwardCrawler;

/// Runs the scrape pipeline: crawl the oldest listing entries and store them.
pub struct ScraperManager {
    storage: Arc<dyn ArticleStorage>,
    crawler: BackwardCrawler,
    batch_size: usize,
}

impl ScraperManager {
    pub fn new(storage: Arc<dyn ArticleStorage>, crawler: BackwardCrawler, batch_size: usize) -> Self {
        Self {
            storage,
            crawler,
            batch_size,
        }
    }

    pub fn from_config(config: &Config, storage: Arc<dyn ArticleStorage>) -> Result<Self> {
        let fetcher = Fetcher::new(&config.fetch)?;
        let crawler = BackwardCrawler::new(fetcher, config.listing_url.clone());
        Ok(Self::new(storage, crawler, config.crawl_batch_size))
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn storage(&self) -> Arc<dyn ArticleStorage> {
        self.storage.clone()
    }

    /// Scrapes the configured batch size.
    pub async fn scrape(&self) -> Result<Vec<Article>> {
        self.scrape_oldest(self.batch_size).await
    }

    /// Crawls first, then upserts each summary in order. A failed crawl
    /// leaves the store untouched.
    pub async fn scrape_oldest(&self, limit: usize) -> Result<Vec<Article>> {
        info!("🦗 Scraping the {} oldest articles from {}", limit, self.crawler.listing_url());
        let summaries = self.crawler.collect_oldest(limit).await?;

        let mut stored = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let article = self.storage.upsert_by_url(NewArticle::from(summary)).await?;
            info!("💾 Stored {}", article.title);
            stored.push(article);
        }
        info!("✅ Scrape finished, {} articles stored", stored.len());
        Ok(stored)
    }
}
