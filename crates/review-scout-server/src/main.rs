//! Review Scout entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use review_scout::{ChromiumRenderer, NoopRenderer, Renderer, ReviewCache, ReviewScraper, ScrapeConfig};
use review_scout_server::config::{ServerConfig, ServerOverrides, DEFAULT_CACHE_FILE};
use review_scout_server::rest::{self, AppState};
use review_scout_server::widgets::WidgetStore;

#[derive(Parser)]
#[command(
    name = "review-scout",
    about = "Scrape, cache, and serve map-listing reviews for embeddable widgets",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default).
    Serve {
        /// Listen port. Also reads PORT.
        #[arg(short, long)]
        port: Option<u16>,

        /// Review cache file. Also reads SCOUT_CACHE_FILE.
        #[arg(long)]
        cache_file: Option<PathBuf>,

        /// Widget configuration file. Also reads SCOUT_WIDGETS_FILE.
        #[arg(long)]
        widgets_file: Option<PathBuf>,

        /// Directory of widget assets served at `/`. Also reads SCOUT_STATIC_DIR.
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Scrape one place URL and print the review bundle as JSON.
    Scrape {
        /// Place URL to scrape.
        url: String,

        /// Review cache file.
        #[arg(long, default_value = DEFAULT_CACHE_FILE)]
        cache_file: PathBuf,

        /// Override the number of reviews to collect.
        #[arg(long)]
        max_reviews: Option<usize>,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   review-scout completions bash > ~/.local/share/bash-completion/completions/review-scout
    ///   review-scout completions zsh > ~/.zfunc/_review-scout
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

/// Chromium when a binary can be found, otherwise a renderer that refuses
/// to launch so cached responses and widget routes keep working.
fn select_renderer(config: &ScrapeConfig) -> Arc<dyn Renderer> {
    match ChromiumRenderer::new(config.launch.chromium_path.clone()) {
        Ok(renderer) => {
            tracing::info!(executable = %renderer.executable().display(), "using Chromium");
            Arc::new(renderer)
        }
        Err(e) => {
            tracing::warn!("{e}; scrapes will fail until Chromium is installed");
            Arc::new(NoopRenderer)
        }
    }
}

fn build_scraper(config: ScrapeConfig, cache_file: PathBuf) -> ReviewScraper {
    let renderer = select_renderer(&config);
    let cache = ReviewCache::new(cache_file, config.cache_ttl()).with_max_entries(config.max_cache_entries);
    ReviewScraper::new(renderer, cache, config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        cache_file: None,
        widgets_file: None,
        static_dir: None,
    }) {
        Commands::Serve {
            port,
            cache_file,
            widgets_file,
            static_dir,
        } => {
            let server = ServerConfig::resolve(ServerOverrides {
                port,
                cache_file,
                widgets_file,
                static_dir,
            });
            let scraper = build_scraper(ScrapeConfig::from_env(), server.cache_file.clone());
            let state = Arc::new(AppState {
                scraper,
                widgets: WidgetStore::new(server.widgets_file.clone()),
            });
            rest::start(server.addr, state, server.static_dir).await?;
        }

        Commands::Scrape {
            url,
            cache_file,
            max_reviews,
        } => {
            let mut config = ScrapeConfig::from_env();
            if let Some(max) = max_reviews {
                config.max_reviews = max;
            }
            let scraper = build_scraper(config, cache_file);
            let bundle = scraper.fetch(&url).await?;
            println!("{}", serde_json::to_string_pretty(&bundle)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "review-scout", &mut std::io::stdout());
        }
    }

    Ok(())
}
