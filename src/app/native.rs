use std::path::PathBuf;

use eframe::egui;
use log::{info, warn};

use crate::{Config, GeminiBackend, Session, Upload};

use super::InpainterApp;

pub fn run_native() -> Result<(), eframe::Error> {
    env_logger::init();

    let config =
        Config::load("config.json").map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;
    let backend = GeminiBackend::new(config.fill.clone())
        .map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size(config.viewport),
        ..Default::default()
    };

    let mut session = Session::new(&config, Box::new(backend));
    if let Some(path) = std::env::args().nth(1) {
        if let Err(e) = Upload::from_path(&path).and_then(|upload| session.upload(upload)) {
            warn!("Cannot open {path}: {e}");
        }
    }
    let download_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    info!("Run with config: {config:?}");
    eframe::run_native(
        "InPainter",
        options,
        Box::new(|_cc| Ok(Box::new(InpainterApp::new(session, download_dir)))),
    )
}
