use rb_core::Result;
use scraper::Html;

use super::utils;

/// Upper bound on extracted text, in characters.
pub const MAX_CONTENT_CHARS: usize = 4000;

const CONTENT_CANDIDATES: &[&str] = &["article", "main", ".post-content", ".entry-content", "body"];

/// Best-effort main text of an article page: the paragraphs of the first
/// content container that has any, else the whole body text. The result is
/// cut at `MAX_CONTENT_CHARS` regardless of sentence boundaries.
pub fn extract_main_content(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let paragraph = utils::selector("p")?;

    let mut text = String::new();
    for candidate in CONTENT_CANDIDATES {
        let selector = utils::selector(candidate)?;
        let Some(container) = document
            .select(&selector)
            .find(|el| !utils::is_stripped(*el))
        else {
            continue;
        };

        let paragraphs: Vec<String> = container
            .select(&paragraph)
            .filter(|p| !utils::is_stripped(*p))
            .map(utils::visible_text)
            .filter(|p| !p.is_empty())
            .collect();
        if !paragraphs.is_empty() {
            text = paragraphs.join("\n\n");
            break;
        }
    }

    if text.is_empty() {
        let body = utils::selector("body")?;
        text = document
            .select(&body)
            .next()
            .map(utils::visible_text)
            .unwrap_or_default();
    }

    Ok(truncate_chars(text, MAX_CONTENT_CHARS))
}

fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((index, _)) => text[..index].to_string(),
        None => text,
    }
}
