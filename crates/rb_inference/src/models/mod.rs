use std::sync::Arc;
use rb_core::{CompletionModel, Config, Fetcher, Result};
use tracing::info;

pub mod dummy;
pub mod openai;

pub use dummy::DummyModel;
pub use openai::OpenAiModel;

/// Builds the configured completion backend.
pub fn create_model(config: &Config, fetcher: Fetcher) -> Result<Arc<dyn CompletionModel>> {
    let model = OpenAiModel::new(&config.completion, fetcher)?;
    info!("🧠 Completion model ready ({})", model.name());
    Ok(Arc::new(model))
}
