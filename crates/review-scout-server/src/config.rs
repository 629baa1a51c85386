//! Server configuration resolution: CLI flag, then environment, then default.

use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_CACHE_FILE: &str = "reviews_cache.json";
pub const DEFAULT_WIDGETS_FILE: &str = "widget_configs.json";
pub const DEFAULT_STATIC_DIR: &str = "public";

/// Resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub cache_file: PathBuf,
    pub widgets_file: PathBuf,
    pub static_dir: PathBuf,
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct ServerOverrides {
    pub port: Option<u16>,
    pub cache_file: Option<PathBuf>,
    pub widgets_file: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Resolve against the process environment.
    pub fn resolve(overrides: ServerOverrides) -> Self {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    pub fn resolve_with<F>(overrides: ServerOverrides, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = overrides.port.unwrap_or_else(|| {
            lookup("PORT")
                .and_then(|raw| match raw.trim().parse() {
                    Ok(port) => Some(port),
                    Err(_) => {
                        tracing::warn!(value = %raw, "ignoring invalid PORT");
                        None
                    }
                })
                .unwrap_or(DEFAULT_PORT)
        });
        let path = |explicit: Option<PathBuf>, var: &str, default: &str| {
            explicit
                .or_else(|| lookup(var).filter(|v| !v.is_empty()).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(default))
        };

        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            cache_file: path(overrides.cache_file, "SCOUT_CACHE_FILE", DEFAULT_CACHE_FILE),
            widgets_file: path(overrides.widgets_file, "SCOUT_WIDGETS_FILE", DEFAULT_WIDGETS_FILE),
            static_dir: path(overrides.static_dir, "SCOUT_STATIC_DIR", DEFAULT_STATIC_DIR),
        }
    }
}
