//! Restyles an article after its reference articles through a completion
//! model. Model output that is not the expected JSON object never fails the
//! rewrite: the raw text becomes the content and the original title is kept.

use std::sync::Arc;

use rb_core::{CompletionModel, EnrichedReference, Result, RewriteResult};
use serde::Deserialize;
use tracing::{info, warn};

pub const REWRITE_TEMPERATURE: f32 = 0.7;

#[derive(Deserialize)]
struct StructuredRewrite {
    title: Option<String>,
    content: Option<String>,
}

pub struct RewriteEngine {
    model: Arc<dyn CompletionModel>,
}

impl RewriteEngine {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    pub async fn rewrite(
        &self,
        title: &str,
        original_content: &str,
        references: &[EnrichedReference],
    ) -> Result<RewriteResult> {
        let prompt = build_prompt(title, original_content, references);
        info!("🧠 Asking {} to rewrite \"{}\"", self.model.name(), title);
        let raw = self.model.complete(&prompt, REWRITE_TEMPERATURE).await?;
        Ok(parse_rewrite(&raw, title))
    }
}

pub fn build_prompt(title: &str, original_content: &str, references: &[EnrichedReference]) -> String {
    let reference_summaries = references
        .iter()
        .enumerate()
        .map(|(i, r)| format!("Reference {}: {}\n{}", i + 1, r.link.title, r.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are rewriting a blog post.\n\n\
         Original title: {title}\n\n\
         Original content:\n{original_content}\n\n\
         Reference articles:\n{reference_summaries}\n\n\
         Rewrite the original article so that its formatting and content style is similar \
         to the reference articles, while preserving the core topic. Return JSON with keys \
         \"title\" and \"content\". The content should be in HTML with headings and paragraphs."
    )
}

/// Reads the model reply as `{"title", "content"}`, tolerating a Markdown
/// code fence around it.
pub fn parse_rewrite(raw: &str, original_title: &str) -> RewriteResult {
    let fallback = || RewriteResult {
        title: original_title.to_string(),
        content: raw.to_string(),
    };

    let parsed = match serde_json::from_str::<StructuredRewrite>(strip_code_fence(raw)) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("⚠️ Model reply is not structured JSON ({}), using raw text", e);
            return fallback();
        }
    };

    match parsed.content.filter(|c| !c.trim().is_empty()) {
        Some(content) => RewriteResult {
            title: parsed
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| original_title.to_string()),
            content,
        },
        None => {
            warn!("⚠️ Model reply has no content field, using raw text");
            fallback()
        }
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening fence line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DummyModel;
    use rb_core::ReferenceLink;

    fn reference(title: &str, content: &str) -> EnrichedReference {
        EnrichedReference {
            link: ReferenceLink {
                title: title.to_string(),
                url: format!("https://example.org/blog/{}", title.to_lowercase()),
            },
            content: content.to_string(),
        }
    }

    #[test]
    fn test_prompt_embeds_everything() {
        let prompt = build_prompt(
            "Why chatbots",
            "Original body",
            &[reference("Alpha", "Alpha body"), reference("Beta", "Beta body")],
        );
        assert!(prompt.contains("Original title: Why chatbots"));
        assert!(prompt.contains("Original content:\nOriginal body"));
        assert!(prompt.contains("Reference 1: Alpha\nAlpha body"));
        assert!(prompt.contains("Reference 2: Beta\nBeta body"));
        assert!(prompt.contains("\"title\" and \"content\""));
    }

    #[test]
    fn test_parse_structured_reply() {
        let result = parse_rewrite(
            r#"{"title": "New title", "content": "<h2>Intro</h2><p>Body</p>"}"#,
            "Old title",
        );
        assert_eq!(result.title, "New title");
        assert_eq!(result.content, "<h2>Intro</h2><p>Body</p>");
    }

    #[test]
    fn test_parse_fenced_reply() {
        let raw = "```json\n{\"title\": \"Fenced\", \"content\": \"<p>x</p>\"}\n```";
        let result = parse_rewrite(raw, "Old title");
        assert_eq!(result.title, "Fenced");
        assert_eq!(result.content, "<p>x</p>");
    }

    #[test]
    fn test_unstructured_reply_falls_back_to_raw_text() {
        let raw = "Sure! Here is your article: <p>Body</p>";
        let result = parse_rewrite(raw, "Old title");
        assert_eq!(
            result,
            RewriteResult {
                title: "Old title".to_string(),
                content: raw.to_string(),
            }
        );
    }

    #[test]
    fn test_missing_content_falls_back_and_blank_title_is_replaced() {
        let raw = r#"{"title": "Only a title"}"#;
        let result = parse_rewrite(raw, "Old title");
        assert_eq!(result.title, "Old title");
        assert_eq!(result.content, raw);

        let result = parse_rewrite(r#"{"title": " ", "content": "<p>Body</p>"}"#, "Old title");
        assert_eq!(result.title, "Old title");
        assert_eq!(result.content, "<p>Body</p>");
    }

    #[tokio::test]
    async fn test_rewrite_never_fails_on_malformed_output() {
        let model = Arc::new(DummyModel::new("{not json"));
        let engine = RewriteEngine::new(model.clone());
        let result = engine
            .rewrite("Title", "Body", &[reference("Alpha", "A")])
            .await
            .unwrap();
        assert_eq!(result.title, "Title");
        assert_eq!(result.content, "{not json");
        assert_eq!(model.prompts().len(), 1);
    }
}
