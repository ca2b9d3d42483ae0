pub mod camera;
pub mod config;
pub mod detection;
pub mod display;
pub mod fps;
pub mod frame;
pub mod lessons;
pub mod streaming;

pub use config::Config;
pub use frame::{Frame, PixelFormat};

use std::path::Path;
use tracing_subscriber::EnvFilter;

// RUST_LOG wins over the configured level.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Loads the configuration and starts logging at its level.
///
/// A missing or broken file is reported once logging is up, then the
/// built-in defaults are used.
pub fn bootstrap(config_path: Option<&Path>) -> Config {
    let loaded = match config_path {
        Some(path) => Config::from_file(path),
        None => Config::load_default(),
    };
    let level = match &loaded {
        Ok(cfg) => cfg.system.log_level.as_str(),
        Err(_) => "info",
    };
    init_tracing(level);

    match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("Could not load configuration: {}", e);
            tracing::warn!("Using default configuration");
            Config::default()
        }
    }
}
