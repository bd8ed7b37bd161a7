use std::sync::Arc;

use rb_core::{
    Article, ArticleSource, ArticleStorage, Config, EnrichedReference, Error, Fetcher, Result,
};
use rb_inference::{create_model, RewriteEngine};
use tracing::{debug, info};

use crate::publisher::Publisher;
use crate::references::ReferenceFinder;
use crate::scrapers::extract::extract_main_content;
use crate::search::create_search_provider;

/// Refreshes one stored article: extract it, find external references,
/// rewrite it in their style and publish the result.
pub struct ArticleGenerator {
    storage: Arc<dyn ArticleStorage>,
    fetcher: Fetcher,
    finder: ReferenceFinder,
    engine: RewriteEngine,
    publisher: Publisher,
}

impl ArticleGenerator {
    pub fn new(
        storage: Arc<dyn ArticleStorage>,
        fetcher: Fetcher,
        finder: ReferenceFinder,
        engine: RewriteEngine,
        publisher: Publisher,
    ) -> Self {
        Self {
            storage,
            fetcher,
            finder,
            engine,
            publisher,
        }
    }

    /// Checks every credential before building anything that talks to the
    /// network.
    pub fn from_config(config: &Config, storage: Arc<dyn ArticleStorage>) -> Result<Self> {
        config.validate_for_generation()?;
        let fetcher = Fetcher::new(&config.fetch)?;
        let provider = create_search_provider(&config.search, fetcher.clone())?;
        let finder = ReferenceFinder::new(provider, &config.listing_url, config.reference_count);
        let engine = RewriteEngine::new(create_model(config, fetcher.clone())?);
        let publisher = Publisher::new(storage.clone());
        Ok(Self::new(storage, fetcher, finder, engine, publisher))
    }

    /// Runs the pipeline for `url`, or for the oldest original article in the
    /// store when no url is given.
    pub async fn generate(&self, url: Option<&str>) -> Result<Article> {
        let article = self.select_article(url).await?;
        info!("🔄 Refreshing \"{}\" ({})", article.title, article.url);

        let html = self.fetcher.get_text(&article.url).await?;
        let original_content = extract_main_content(&html)?;
        if original_content.is_empty() {
            return Err(Error::ExtractionEmpty {
                url: article.url.clone(),
            });
        }

        let links = self.finder.find_references(&article.title).await?;
        if links.len() < self.finder.count() {
            return Err(Error::InsufficientReferences {
                found: links.len(),
                required: self.finder.count(),
            });
        }

        let mut enriched = Vec::with_capacity(links.len());
        for link in &links {
            debug!("📥 Fetching reference {}", link.url);
            let html = self.fetcher.get_text(&link.url).await?;
            enriched.push(EnrichedReference {
                link: link.clone(),
                content: extract_main_content(&html)?,
            });
        }

        let rewritten = self.engine.rewrite(&article.title, &original_content, &enriched).await?;
        let content = if rewritten.content.trim().is_empty() {
            original_content
        } else {
            rewritten.content
        };

        self.publisher.publish(&rewritten.title, &content, &links).await
    }

    async fn select_article(&self, url: Option<&str>) -> Result<Article> {
        let articles = self.storage.list().await?;
        let found = match url {
            Some(url) => articles.into_iter().find(|a| a.url == url),
            None => articles
                .into_iter()
                .find(|a| a.source == ArticleSource::Original),
        };
        found.ok_or(Error::NotFound)
    }
}
