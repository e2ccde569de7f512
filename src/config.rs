use std::{io, path::Path, time::Duration};

use emath::Vec2;
use log::info;

use crate::Error;

#[derive(serde::Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub canvas: CanvasSize,
    pub brush: BrushSettings,
    pub fill: FillSettings,
    pub download_file_name: String,
    pub viewport: Vec2,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            brush: BrushSettings::default(),
            fill: FillSettings::default(),
            download_file_name: "inpainted-image.png".into(),
            viewport: [720.0, 860.0].into(),
        }
    }
}

impl Config {
    /// Reads `path` as JSON. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let invalid = |reason: String| Error::Config {
            path: path.to_path_buf(),
            reason,
        };
        match std::fs::File::open(path) {
            Ok(f) => {
                let config: Self = serde_json::from_reader(io::BufReader::new(f))
                    .map_err(|e| invalid(e.to_string()))?;
                config.canvas.check().map_err(invalid)?;
                info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Fixed size of the drawing canvas for a session.
#[derive(serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    fn check(self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "canvas must be at least 1x1, got {}x{}",
                self.width, self.height
            ));
        }
        Ok(())
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BrushSettings {
    pub size: f32,
    /// Unpremultiplied RGBA of the on-screen brush.
    pub color: [u8; 4],
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            size: 20.0,
            color: [236, 101, 13, 128],
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FillSettings {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl FillSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FillSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: "gemini-2.0-flash-exp".into(),
            api_key_env: "GEMINI_API_KEY".into(),
            timeout_secs: 120,
        }
    }
}
