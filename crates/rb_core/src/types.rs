use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An article card as it appears on a listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub excerpt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceLink {
    pub title: String,
    pub url: String,
}

/// A raw search result; either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: Option<String>,
    #[serde(alias = "link")]
    pub url: Option<String>,
}

/// A reference link together with the body text extracted from its page.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedReference {
    pub link: ReferenceLink,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteResult {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleSource {
    #[default]
    Original,
    Generated,
}

impl ArticleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleSource::Original => "original",
            ArticleSource::Generated => "generated",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "original" => Ok(ArticleSource::Original),
            "generated" => Ok(ArticleSource::Generated),
            other => Err(Error::Validation(format!("Unknown article source: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub references: Vec<ReferenceLink>,
    #[serde(default)]
    pub source: ArticleSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating or upserting an article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub references: Vec<ReferenceLink>,
    #[serde(default)]
    pub source: ArticleSource,
}

impl NewArticle {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("title is required".to_string()));
        }
        if self.url.trim().is_empty() {
            return Err(Error::Validation("url is required".to_string()));
        }
        Ok(())
    }

    pub fn into_article(self, id: String, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Article {
        Article {
            id,
            title: self.title,
            url: self.url,
            author: self.author,
            published_at: self.published_at,
            excerpt: self.excerpt,
            content: self.content,
            references: self.references,
            source: self.source,
            created_at,
            updated_at,
        }
    }
}

impl From<ArticleSummary> for NewArticle {
    fn from(summary: ArticleSummary) -> Self {
        Self {
            title: summary.title,
            url: summary.url,
            author: summary.author,
            published_at: summary.published_at,
            excerpt: summary.excerpt,
            content: None,
            references: Vec::new(),
            source: ArticleSource::Original,
        }
    }
}

/// Partial update applied by `update_by_id`; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub url: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub references: Option<Vec<ReferenceLink>>,
    pub source: Option<ArticleSource>,
}

impl ArticlePatch {
    pub fn apply(self, article: &mut Article) -> Result<()> {
        if let Some(title) = self.title {
            if title.trim().is_empty() {
                return Err(Error::Validation("title is required".to_string()));
            }
            article.title = title;
        }
        if let Some(url) = self.url {
            if url.trim().is_empty() {
                return Err(Error::Validation("url is required".to_string()));
            }
            article.url = url;
        }
        if self.author.is_some() {
            article.author = self.author;
        }
        if self.published_at.is_some() {
            article.published_at = self.published_at;
        }
        if self.excerpt.is_some() {
            article.excerpt = self.excerpt;
        }
        if self.content.is_some() {
            article.content = self.content;
        }
        if let Some(references) = self.references {
            article.references = references;
        }
        if let Some(source) = self.source {
            article.source = source;
        }
        Ok(())
    }
}

/// Ascending by publication time with undated entries last.
pub fn cmp_published(a: Option<&DateTime<Utc>>, b: Option<&DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Store listing order: publication time with undated articles first, then
/// creation time.
pub fn cmp_listing(a: &Article, b: &Article) -> Ordering {
    a.published_at
        .cmp(&b.published_at)
        .then_with(|| a.created_at.cmp(&b.created_at))
}
