//! Showroom Dashboard - Customer Walk-in & Test Drive Dashboard
//!
//! Desktop viewer for daily showroom traffic and test drive conversion.

use anyhow::anyhow;
use eframe::egui;
use showroom_dashboard::config::{load_config, ConfigSource};
use showroom_dashboard::gui::DashboardApp;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const APP_TITLE: &str = "Customer Walk-in & Test Drive Dashboard";

fn main() -> anyhow::Result<()> {
    let (config, source) = load_config();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match &source {
        ConfigSource::File(path) => info!(path = %path.display(), "loaded config"),
        ConfigSource::Default => info!("no config file found, using defaults"),
        ConfigSource::Fallback(e) => warn!(error = %e, "config ignored, using defaults"),
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([1000.0, 640.0])
            .with_title(APP_TITLE),
        ..Default::default()
    };

    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow!("failed to start dashboard: {}", e))
}
