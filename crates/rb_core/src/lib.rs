pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod storage;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use fetch::Fetcher;
pub use models::{CompletionModel, SearchProvider};
pub use storage::ArticleStorage;
pub use types::{
    Article, ArticlePatch, ArticleSource, ArticleSummary, EnrichedReference, NewArticle,
    ReferenceLink, RewriteResult, SearchHit,
};
