use async_trait::async_trait;
use rb_core::config::CompletionConfig;
use rb_core::{CompletionModel, Error, Fetcher, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiErrorBody>,
}

// Some compatible servers answer 200 with an error object instead of choices.
#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<Message>,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAiModel {
    fetcher: Fetcher,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiModel {
    /// Fails before any network traffic when the API key is missing.
    pub fn new(config: &CompletionConfig, fetcher: Fetcher) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            Error::Configuration("OPENAI_API_KEY is required for LLM calls".to_string())
        })?;
        Ok(Self {
            fetcher,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl CompletionModel for OpenAiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
        };

        let response: ChatResponse = self
            .fetcher
            .post_json(
                &format!("{}/chat/completions", self.base_url),
                &request,
                Some(&self.api_key),
            )
            .await?;

        if let Some(error) = response.error {
            return Err(Error::Inference(
                error
                    .message
                    .unwrap_or_else(|| "completion endpoint returned an error".to_string()),
            ));
        }

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();
        debug!("🧠 Completion returned {} characters", content.len());
        Ok(content)
    }
}
