use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rb_core::{ArticleSummary, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::scrapers::utils;

const CARD: &str = ".entry-card";
const TITLE_LINK: &str = "h2.entry-title a";
const AUTHOR: &str =
    ".meta-author .ct-meta-element-author span, .meta-author .ct-meta-element-author";
const DATE: &str = "time.ct-meta-element-date";
const EXCERPT: &str = ".entry-excerpt";

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"];

struct CardSelectors {
    card: Selector,
    title_link: Selector,
    author: Selector,
    date: Selector,
    excerpt: Selector,
}

impl CardSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            card: utils::selector(CARD)?,
            title_link: utils::selector(TITLE_LINK)?,
            author: utils::selector(AUTHOR)?,
            date: utils::selector(DATE)?,
            excerpt: utils::selector(EXCERPT)?,
        })
    }
}

/// Parses every article card on a listing page, in page order. Cards
/// without a title or link are skipped.
pub fn parse_articles(html: &str, page_url: &Url) -> Result<Vec<ArticleSummary>> {
    let document = Html::parse_document(html);
    let selectors = CardSelectors::new()?;

    let articles: Vec<_> = document
        .select(&selectors.card)
        .filter_map(|card| parse_card(card, &selectors, page_url))
        .collect();
    debug!("📄 Found {} article cards on {}", articles.len(), page_url);
    Ok(articles)
}

fn parse_card(card: ElementRef, selectors: &CardSelectors, page_url: &Url) -> Option<ArticleSummary> {
    let link = card.select(&selectors.title_link).next()?;
    let title = utils::non_empty(utils::element_text(link))?;
    let url = link
        .value()
        .attr("href")
        .filter(|href| !href.trim().is_empty())
        .and_then(|href| utils::resolve_url(page_url, href))?;

    let author = card
        .select(&selectors.author)
        .next()
        .map(utils::element_text)
        .and_then(utils::non_empty);

    let published_at = card.select(&selectors.date).next().and_then(|time| {
        time.value()
            .attr("datetime")
            .and_then(parse_published_at)
            .or_else(|| parse_published_at(&utils::element_text(time)))
    });

    let excerpt = card
        .select(&selectors.excerpt)
        .next()
        .map(utils::element_text)
        .and_then(utils::non_empty);

    Some(ArticleSummary {
        title,
        url,
        author,
        published_at,
        excerpt,
    })
}

/// Parses the date formats the theme emits. Anything else is `None`.
pub fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Some(date.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(date) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(date.and_utc());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}
