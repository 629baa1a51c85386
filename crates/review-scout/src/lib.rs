//! Review Scout: headless retrieval and caching of third-party place reviews.

pub mod cache;
pub mod config;
pub mod delay;
pub mod error;
pub mod extract;
pub mod loader;
pub mod relative_time;
pub mod renderer;
pub mod scraper;
pub mod scripts;
pub mod selectors;
pub mod session;
pub mod summary;
pub mod types;

pub use cache::ReviewCache;
pub use config::ScrapeConfig;
pub use delay::DelayPolicy;
pub use error::{CacheError, ScrapeError, ScrapeResult};
pub use renderer::chromium::ChromiumRenderer;
pub use renderer::{LaunchProfile, NoopRenderer, RenderContext, RenderError, Renderer};
pub use scraper::ReviewScraper;
pub use types::*;
