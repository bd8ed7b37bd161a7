use std::collections::HashSet;
use std::sync::Arc;

use rb_core::{ReferenceLink, Result, SearchHit, SearchProvider};
use tracing::{debug, info};
use url::Url;

/// Path segments that mark a URL as an article page.
const ARTICLE_PATH_SEGMENTS: &[&str] = &["blog", "blogs", "article", "news", "posts"];

/// Turns search hits into external reference articles.
pub struct ReferenceFinder {
    provider: Arc<dyn SearchProvider>,
    site_host: String,
    count: usize,
}

impl ReferenceFinder {
    /// `site_url` is the source site; links back to it are never references.
    pub fn new(provider: Arc<dyn SearchProvider>, site_url: &Url, count: usize) -> Self {
        Self {
            provider,
            site_host: site_host(site_url),
            count,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub async fn find_references(&self, query: &str) -> Result<Vec<ReferenceLink>> {
        info!("🔎 Searching {} for \"{}\"", self.provider.name(), query);
        let hits = self.provider.search(query).await?;
        let references = filter_reference_links(&hits, &self.site_host, self.count);
        info!("✨ Selected {} of {} search results", references.len(), hits.len());
        Ok(references)
    }
}

/// Keeps valid external links, preferring article-like paths, and returns at
/// most `count` of them in search order.
pub fn filter_reference_links(hits: &[SearchHit], site_host: &str, count: usize) -> Vec<ReferenceLink> {
    let mut seen = HashSet::new();
    let candidates: Vec<(ReferenceLink, Url)> = hits
        .iter()
        .filter_map(|hit| {
            let title = hit.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
            let raw = hit.url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
            let url = Url::parse(raw).ok()?;
            if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                return None;
            }
            if is_same_site(&url, site_host) {
                debug!("⏭️ Skipping self reference {}", raw);
                return None;
            }
            if !seen.insert(raw.to_string()) {
                return None;
            }
            Some((
                ReferenceLink {
                    title: title.to_string(),
                    url: raw.to_string(),
                },
                url,
            ))
        })
        .collect();

    let mut selected: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, (_, url))| is_article_url(url))
        .map(|(i, _)| i)
        .take(count)
        .collect();

    if selected.len() < count {
        let fill: Vec<usize> = (0..candidates.len())
            .filter(|i| !selected.contains(i))
            .take(count - selected.len())
            .collect();
        selected.extend(fill);
    }

    selected
        .into_iter()
        .map(|i| candidates[i].0.clone())
        .collect()
}

/// True when a non-final path segment is one of the article markers.
pub fn is_article_url(url: &Url) -> bool {
    let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
    let Some((_, directories)) = segments.split_last() else {
        return false;
    };
    directories.iter().any(|segment| {
        ARTICLE_PATH_SEGMENTS
            .iter()
            .any(|marker| segment.eq_ignore_ascii_case(marker))
    })
}

fn site_host(site_url: &Url) -> String {
    let host = site_url.host_str().unwrap_or_default().to_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

fn is_same_site(url: &Url, site_host: &str) -> bool {
    if site_host.is_empty() {
        return false;
    }
    let host = url.host_str().unwrap_or_default().to_lowercase();
    host == site_host || host.ends_with(&format!(".{}", site_host))
}
