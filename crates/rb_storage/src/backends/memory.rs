use async_trait::async_trait;
use chrono::Utc;
use rb_core::types::cmp_listing;
use rb_core::{Article, ArticlePatch, ArticleStorage, Error, NewArticle, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn position_by_url(&self, url: &str) -> Option<usize> {
        self.articles.iter().position(|a| a.url == url)
    }

    fn position_by_id(&self, id: &str) -> Option<usize> {
        self.articles.iter().position(|a| a.id == id)
    }

    pub fn list(&self) -> Vec<Article> {
        let mut articles = self.articles.clone();
        articles.sort_by(cmp_listing);
        articles
    }

    pub fn create(&mut self, article: NewArticle) -> Result<Article> {
        article.validate()?;
        if self.position_by_url(&article.url).is_some() {
            return Err(Error::Validation(format!(
                "An article with url {} already exists",
                article.url
            )));
        }
        let now = Utc::now();
        let article = article.into_article(Uuid::new_v4().to_string(), now, now);
        self.articles.push(article.clone());
        Ok(article)
    }

    pub fn upsert_by_url(&mut self, article: NewArticle) -> Result<Article> {
        article.validate()?;
        let now = Utc::now();
        match self.position_by_url(&article.url) {
            Some(index) => {
                let existing = &mut self.articles[index];
                let replaced = article.into_article(existing.id.clone(), existing.created_at, now);
                *existing = replaced.clone();
                Ok(replaced)
            }
            None => {
                let inserted = article.into_article(Uuid::new_v4().to_string(), now, now);
                self.articles.push(inserted.clone());
                Ok(inserted)
            }
        }
    }

    pub fn get_by_id(&self, id: &str) -> Result<Article> {
        self.position_by_id(id)
            .map(|index| self.articles[index].clone())
            .ok_or(Error::NotFound)
    }

    pub fn update_by_id(&mut self, id: &str, patch: ArticlePatch) -> Result<Article> {
        let index = self.position_by_id(id).ok_or(Error::NotFound)?;
        if let Some(url) = patch.url.as_deref() {
            if self.articles.iter().any(|a| a.url == url && a.id != id) {
                return Err(Error::Validation(format!(
                    "An article with url {} already exists",
                    url
                )));
            }
        }

        let mut updated = self.articles[index].clone();
        patch.apply(&mut updated)?;
        updated.updated_at = Utc::now();
        self.articles[index] = updated.clone();
        Ok(updated)
    }

    pub fn delete_by_id(&mut self, id: &str) -> Result<()> {
        let index = self.position_by_id(id).ok_or(Error::NotFound)?;
        self.articles.remove(index);
        Ok(())
    }
}

/// Article storage that lives for the lifetime of the process.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn list(&self) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.list())
    }

    async fn create(&self, article: NewArticle) -> Result<Article> {
        let mut store = self.store.write().await;
        store.create(article)
    }

    async fn upsert_by_url(&self, article: NewArticle) -> Result<Article> {
        let mut store = self.store.write().await;
        store.upsert_by_url(article)
    }

    async fn get_by_id(&self, id: &str) -> Result<Article> {
        let store = self.store.read().await;
        store.get_by_id(id)
    }

    async fn update_by_id(&self, id: &str, patch: ArticlePatch) -> Result<Article> {
        let mut store = self.store.write().await;
        store.update_by_id(id, patch)
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.delete_by_id(id)
    }
}
