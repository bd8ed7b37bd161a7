use std::sync::Arc;

use clap::Subcommand;
use rb_core::{Article, ArticleStorage, Config, Result};
use tracing::info;

use crate::generate::ArticleGenerator;
use crate::manager::ScraperManager;

#[derive(Subcommand, Debug, Clone)]
pub enum ScraperCommands {
    /// Store the oldest articles of the blog listing
    Scrape {
        /// How many articles to collect (defaults to CRAWL_BATCH_SIZE)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Rewrite one stored article using external references and publish it
    Generate {
        /// Url of the stored article to refresh; defaults to the oldest original article
        #[arg(long)]
        url: Option<String>,
    },
    /// Print the stored articles
    List,
}

pub async fn handle_command(command: ScraperCommands, config: &Config, storage: Arc<dyn ArticleStorage>) -> Result<()> {
    match command {
        ScraperCommands::Scrape { limit } => {
            let manager = ScraperManager::from_config(config, storage)?;
            let limit = limit.unwrap_or(manager.batch_size());
            let articles = manager.scrape_oldest(limit).await?;
            println!("Stored {} articles", articles.len());
            for article in &articles {
                println!("{}", format_article(article));
            }
        }
        ScraperCommands::Generate { url } => {
            let generator = ArticleGenerator::from_config(config, storage)?;
            let article = generator.generate(url.as_deref()).await?;
            info!("✅ Generated article stored with id {}", article.id);
            println!("{}", format_article(&article));
        }
        ScraperCommands::List => {
            let articles = storage.list().await?;
            if articles.is_empty() {
                println!("No articles stored");
            }
            for article in &articles {
                println!("{}", format_article(article));
            }
        }
    }
    Ok(())
}

/// One line per article: source marker, date, title and url.
pub fn format_article(article: &Article) -> String {
    let date = article
        .published_at
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "----------".to_string());
    let marker = match article.source {
        rb_core::ArticleSource::Original => "📰",
        rb_core::ArticleSource::Generated => "🆕",
    };
    format!("{} {} {} - {}", marker, date, article.title, article.url)
}
