use std::sync::Arc;

use rb_core::config::{SearchBackend, SearchConfig};
use rb_core::{Fetcher, Result, SearchProvider};
use tracing::info;

pub mod cse;
pub mod serpapi;

pub use cse::GoogleCseSearch;
pub use serpapi::SerpApiSearch;

/// Builds the configured search backend, failing when its credentials are
/// missing.
pub fn create_search_provider(config: &SearchConfig, fetcher: Fetcher) -> Result<Arc<dyn SearchProvider>> {
    config.validate()?;
    let provider: Arc<dyn SearchProvider> = match config.backend {
        SearchBackend::SerpApi => Arc::new(SerpApiSearch::new(config, fetcher)?),
        SearchBackend::GoogleCse => Arc::new(GoogleCseSearch::new(config, fetcher)?),
    };
    info!("🔎 Search provider ready ({})", provider.name());
    Ok(provider)
}
