use async_trait::async_trait;
use crate::types::SearchHit;
use crate::Result;

#[async_trait]
pub trait CompletionModel: Send + Sync {
    fn name(&self) -> &str;

    /// Run a single-turn completion and return the raw reply text
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Submit a free-text query and return hits in ranking order
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}
