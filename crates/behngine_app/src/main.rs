mod config;
mod viewer;

use std::path::PathBuf;

use anyhow::Result;
use behngine_input::InputMap;
use behngine_window::run_app;

use crate::{
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    viewer::Viewer,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = AppConfig::load_or_default(&config_path)?;

    log::info!("Starting {}", config.window.title);

    let window_settings = config.window.clone();
    let viewer = Viewer::new(config)?;

    run_app(window_settings, InputMap::viewport_defaults(), viewer)
}
