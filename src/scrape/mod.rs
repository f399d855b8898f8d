//! Upstream scraping: fetching the component-template document and
//! normalizing it into the domain model.
//!
//! The module is organized into two submodules:
//!
//! - [`upstream`] - serde mirror of the upstream JSON document
//! - `scraper` - the fetch-and-normalize pipeline behind [`ChannelScraper`]
//!
//! One [`ChannelScraper::scrape`] call issues exactly one upstream GET and
//! returns a fully-built [`crate::channel::Channel`]; there is no caching,
//! no retrying and no shared state between calls.

mod scraper;
pub mod upstream;

pub use scraper::{ChannelScraper, ScrapeError};
