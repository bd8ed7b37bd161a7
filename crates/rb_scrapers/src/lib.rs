pub mod cli;
pub mod generate;
pub mod logging;
pub mod manager;
pub mod publisher;
pub mod references;
pub mod scrapers;
pub mod search;

pub use cli::{handle_command, ScraperCommands};
pub use generate::ArticleGenerator;
pub use logging::init_logging;
pub use manager::ScraperManager;
pub use publisher::Publisher;
pub use references::ReferenceFinder;
pub use scrapers::blog::BackwardCrawler;

pub mod prelude {
    pub use super::generate::ArticleGenerator;
    pub use super::manager::ScraperManager;
    pub use super::scrapers::blog::BackwardCrawler;
    pub use rb_core::{Article, Error, Result};
}
