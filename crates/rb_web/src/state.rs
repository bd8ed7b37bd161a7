use std::sync::Arc;

use rb_core::ArticleStorage;
use rb_scrapers::ScraperManager;

pub struct AppState {
    pub storage: Arc<dyn ArticleStorage>,
    pub manager: ScraperManager,
}

impl AppState {
    /// The manager writes to the same store the handlers read from.
    pub fn new(manager: ScraperManager) -> Self {
        Self {
            storage: manager.storage(),
            manager,
        }
    }
}
