use async_trait::async_trait;
use rb_core::config::SearchConfig;
use rb_core::{Error, Fetcher, Result, SearchHit, SearchProvider};
use serde::Deserialize;
use tracing::debug;

const SERPAPI_ENDPOINT: &str = "https://serpapi.com/search.json";

#[derive(Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<SearchHit>,
}

/// Google results through SerpAPI.
pub struct SerpApiSearch {
    fetcher: Fetcher,
    api_key: String,
    endpoint: String,
}

impl SerpApiSearch {
    pub fn new(config: &SearchConfig, fetcher: Fetcher) -> Result<Self> {
        let api_key = config.serpapi_key.clone().ok_or_else(|| {
            Error::Configuration("SERPAPI_KEY is required for serpapi provider".to_string())
        })?;
        Ok(Self {
            fetcher,
            api_key,
            endpoint: SERPAPI_ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchProvider for SerpApiSearch {
    fn name(&self) -> &str {
        "SerpAPI"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let response: SerpApiResponse = self
            .fetcher
            .get_json(
                &self.endpoint,
                &[("engine", "google"), ("q", query), ("api_key", self.api_key.as_str())],
            )
            .await?;
        debug!("🔎 SerpAPI returned {} results", response.organic_results.len());
        Ok(response.organic_results)
    }
}
