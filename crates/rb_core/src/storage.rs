use async_trait::async_trait;
use crate::types::{Article, ArticlePatch, NewArticle};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// All articles, undated first, then oldest publication first, ties by creation time
    async fn list(&self) -> Result<Vec<Article>>;

    /// Insert a new article; fails if the url is already stored
    async fn create(&self, article: NewArticle) -> Result<Article>;

    /// Insert or replace the article keyed by its url
    async fn upsert_by_url(&self, article: NewArticle) -> Result<Article>;

    async fn get_by_id(&self, id: &str) -> Result<Article>;

    async fn update_by_id(&self, id: &str, patch: ArticlePatch) -> Result<Article>;

    async fn delete_by_id(&self, id: &str) -> Result<()>;
}
