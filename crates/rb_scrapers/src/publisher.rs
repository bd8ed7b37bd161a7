use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rb_core::{Article, ArticleSource, ArticleStorage, NewArticle, ReferenceLink, Result};
use tracing::info;

const MAX_SLUG_LEN: usize = 80;
const GENERATED_AUTHOR: &str = "auto";

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Stores rewritten articles under a synthetic `generated://` url.
pub struct Publisher {
    storage: Arc<dyn ArticleStorage>,
}

impl Publisher {
    pub fn new(storage: Arc<dyn ArticleStorage>) -> Self {
        Self { storage }
    }

    pub async fn publish(&self, title: &str, content: &str, references: &[ReferenceLink]) -> Result<Article> {
        let url = format!("generated://{}-{}", slugify(title), unique_millis());
        let body = format!("{}{}", content, render_references(references));

        let article = NewArticle {
            title: title.to_string(),
            url,
            author: Some(GENERATED_AUTHOR.to_string()),
            published_at: Some(Utc::now()),
            excerpt: None,
            content: Some(body),
            references: references.to_vec(),
            source: ArticleSource::Generated,
        };

        let stored = self.storage.upsert_by_url(article).await?;
        info!("📝 Published {} as {}", stored.title, stored.url);
        Ok(stored)
    }
}

/// Lowercase, dash-separated slug of at most 80 characters.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let capped: String = slug.chars().take(MAX_SLUG_LEN).collect();
    let trimmed = capped.trim_matches('-');
    if trimmed.is_empty() {
        "article".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Wall-clock milliseconds, bumped so that no two calls in this process
/// return the same value.
fn unique_millis() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

/// HTML references section appended to generated content.
pub fn render_references(references: &[ReferenceLink]) -> String {
    if references.is_empty() {
        return String::new();
    }
    let items: String = references
        .iter()
        .map(|r| {
            format!(
                "<li><a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a></li>",
                html_escape::encode_double_quoted_attribute(&r.url),
                html_escape::encode_text(&r.title)
            )
        })
        .collect();
    format!("\n\n<h3>References</h3>\n<ul>{}</ul>", items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rb_storage::backends::InMemoryStorage;

    fn link(title: &str, url: &str) -> ReferenceLink {
        ReferenceLink {
            title: title.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  AI  chatbots: 2024 guide  "), "ai-chatbots-2024-guide");
        assert_eq!(slugify("¿Qué?"), "qu");
        assert_eq!(slugify("!!!"), "article");
        assert_eq!(slugify(""), "article");

        let long = "word ".repeat(40);
        let slug = slugify(&long);
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_render_references_escapes() {
        let html = render_references(&[link("Tips & <Tricks>", "https://a.com/blog/x?a=1&b=\"2\"")]);
        assert!(html.starts_with("\n\n<h3>References</h3>\n<ul><li>"));
        assert!(html.contains("Tips &amp; &lt;Tricks&gt;"));
        assert!(html.contains("href=\"https://a.com/blog/x?a=1&amp;b=&quot;2&quot;\""));
        assert!(html.contains("target=\"_blank\" rel=\"noopener noreferrer\""));
        assert!(html.ends_with("</li></ul>"));
        assert!(render_references(&[]).is_empty());
    }

    #[test]
    fn test_unique_millis_is_strictly_increasing() {
        let mut previous = unique_millis();
        for _ in 0..1000 {
            let next = unique_millis();
            assert!(next > previous);
            previous = next;
        }
    }

    #[tokio::test]
    async fn test_publish_stores_generated_article() {
        let storage = Arc::new(InMemoryStorage::new());
        let publisher = Publisher::new(storage.clone());
        let references = vec![link("X", "https://x.com/blog/x"), link("Y", "https://y.com/news/y")];

        let article = publisher.publish("Hello, World!", "Body text.", &references).await.unwrap();

        let stamp = article.url.strip_prefix("generated://hello-world-").unwrap();
        assert!(!stamp.is_empty() && stamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(article.title, "Hello, World!");
        assert_eq!(article.source, ArticleSource::Generated);
        assert_eq!(article.author.as_deref(), Some("auto"));
        assert!(article.published_at.is_some());
        assert_eq!(article.references, references);
        let content = article.content.as_deref().unwrap();
        assert!(content.starts_with("Body text.\n\n<h3>References</h3>"));
        assert!(content.contains("https://y.com/news/y"));

        let stored = storage.get_by_id(&article.id).await.unwrap();
        assert_eq!(stored.url, article.url);
    }

    #[tokio::test]
    async fn test_same_title_does_not_collide() {
        let storage = Arc::new(InMemoryStorage::new());
        let publisher = Publisher::new(storage.clone());

        let first = publisher.publish("Same", "one", &[]).await.unwrap();
        let second = publisher.publish("Same", "two", &[]).await.unwrap();
        assert_ne!(first.url, second.url);
        assert_eq!(storage.list().await.unwrap().len(), 2);
    }
}
