use async_trait::async_trait;
use rb_core::config::SearchConfig;
use rb_core::{Error, Fetcher, Result, SearchHit, SearchProvider};
use serde::Deserialize;
use tracing::debug;

const CSE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

#[derive(Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<SearchHit>,
}

/// Google Programmable Search (Custom Search JSON API).
pub struct GoogleCseSearch {
    fetcher: Fetcher,
    api_key: String,
    cx: String,
    endpoint: String,
}

impl GoogleCseSearch {
    pub fn new(config: &SearchConfig, fetcher: Fetcher) -> Result<Self> {
        match (&config.cse_key, &config.cse_cx) {
            (Some(key), Some(cx)) => Ok(Self {
                fetcher,
                api_key: key.clone(),
                cx: cx.clone(),
                endpoint: CSE_ENDPOINT.to_string(),
            }),
            _ => Err(Error::Configuration(
                "GOOGLE_CSE_KEY and GOOGLE_CSE_CX are required for cse provider".to_string(),
            )),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchProvider for GoogleCseSearch {
    fn name(&self) -> &str {
        "Google CSE"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let response: CseResponse = self
            .fetcher
            .get_json(
                &self.endpoint,
                &[("key", self.api_key.as_str()), ("cx", self.cx.as_str()), ("q", query)],
            )
            .await?;
        debug!("🔎 Google CSE returned {} results", response.items.len());
        Ok(response.items)
    }
}
