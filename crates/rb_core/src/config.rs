//! Process configuration, assembled once at start-up and handed to each
//! component constructor.

use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::{Error, Result};

pub const DEFAULT_LISTING_URL: &str = "https://beyondchats.com/blogs/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; BeyondChatsScraper/1.0)";
pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_CRAWL_BATCH_SIZE: usize = 5;
pub const DEFAULT_REFERENCE_COUNT: usize = 2;
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE_PATH: &str = "articles.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchBackend {
    #[default]
    SerpApi,
    GoogleCse,
}

impl FromStr for SearchBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "serpapi" => Ok(SearchBackend::SerpApi),
            "cse" | "google_cse" => Ok(SearchBackend::GoogleCse),
            other => Err(Error::Configuration(format!(
                "Unsupported SEARCH_PROVIDER: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub extra_ca_certs_path: Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            extra_ca_certs_path: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    pub backend: SearchBackend,
    pub serpapi_key: Option<String>,
    pub cse_key: Option<String>,
    pub cse_cx: Option<String>,
}

impl SearchConfig {
    /// Checks that the credentials for the selected backend are present.
    pub fn validate(&self) -> Result<()> {
        match self.backend {
            SearchBackend::SerpApi if self.serpapi_key.is_none() => Err(Error::Configuration(
                "SERPAPI_KEY is required for serpapi provider".to_string(),
            )),
            SearchBackend::GoogleCse if self.cse_key.is_none() || self.cse_cx.is_none() => {
                Err(Error::Configuration(
                    "GOOGLE_CSE_KEY and GOOGLE_CSE_CX are required for cse provider".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_COMPLETION_BASE_URL.to_string(),
            model: DEFAULT_COMPLETION_MODEL.to_string(),
        }
    }
}

impl CompletionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_none() {
            return Err(Error::Configuration(
                "OPENAI_API_KEY is required for LLM calls".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listing_url: Url,
    pub fetch: FetchConfig,
    pub search: SearchConfig,
    pub completion: CompletionConfig,
    pub crawl_batch_size: usize,
    pub reference_count: usize,
    pub port: u16,
    pub database_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listing_url: Url::parse(DEFAULT_LISTING_URL).expect("default listing url is valid"),
            fetch: FetchConfig::default(),
            search: SearchConfig::default(),
            completion: CompletionConfig::default(),
            crawl_batch_size: DEFAULT_CRAWL_BATCH_SIZE,
            reference_count: DEFAULT_REFERENCE_COUNT,
            port: DEFAULT_PORT,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Config::default();

        let listing_url = match get("LISTING_URL") {
            Some(raw) => parse_listing_url(&raw)?,
            None => defaults.listing_url,
        };

        let search = SearchConfig {
            backend: get("SEARCH_PROVIDER")
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or_default(),
            serpapi_key: get("SERPAPI_KEY"),
            cse_key: get("GOOGLE_CSE_KEY"),
            cse_cx: get("GOOGLE_CSE_CX"),
        };

        let completion = CompletionConfig {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.completion.base_url),
            model: get("OPENAI_MODEL").unwrap_or(defaults.completion.model),
        };

        let fetch = FetchConfig {
            user_agent: get("USER_AGENT").unwrap_or(defaults.fetch.user_agent),
            extra_ca_certs_path: get("EXTRA_CA_CERTS_PATH")
                .or_else(|| get("NODE_EXTRA_CA_CERTS"))
                .map(PathBuf::from),
        };

        Ok(Self {
            listing_url,
            fetch,
            search,
            completion,
            crawl_batch_size: parse_number(get("CRAWL_BATCH_SIZE"), "CRAWL_BATCH_SIZE")?
                .unwrap_or(defaults.crawl_batch_size),
            reference_count: parse_number(get("REFERENCE_COUNT"), "REFERENCE_COUNT")?
                .unwrap_or(defaults.reference_count),
            port: parse_number(get("PORT"), "PORT")?.unwrap_or(defaults.port),
            database_path: get("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
        })
    }

    /// Everything the generate pipeline needs before it touches the network.
    pub fn validate_for_generation(&self) -> Result<()> {
        self.search.validate()?;
        self.completion.validate()?;
        if self.reference_count == 0 {
            return Err(Error::Configuration(
                "REFERENCE_COUNT must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Listing URLs always end with a slash so `page/<n>/` can be appended.
pub fn parse_listing_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| Error::Configuration(format!("Invalid LISTING_URL {}: {}", raw, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_number<T: FromStr>(value: Option<String>, key: &str) -> Result<Option<T>> {
    value
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| Error::Configuration(format!("{} must be a number, got {}", key, v)))
        })
        .transpose()
}
