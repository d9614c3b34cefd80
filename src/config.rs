// config.rs
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::logging;

pub const WINDOW_TITLE: &str = "R3D3";
pub const WINDOW_WIDTH: u32 = 800;
pub const WINDOW_HEIGHT: u32 = 600;
pub const CLEAR_COLOR: [f64; 4] = [0.3, 0.3, 0.5, 1.0];

// Optional runtime overrides, looked up in the working directory
pub const CONFIG_FILE_PATH: &str = "r3d3.json";

// --- Camera ---
pub const FOV_Y: f32 = 45.0;
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 100.0;
pub const ORBIT_DISTANCE: f32 = 3.0;
pub const ORBIT_SPEED: f32 = 1.5; // radians per second
pub const PITCH_LIMIT: f32 = 1.5;

// --- Shader interface ---
pub const POSITION_LOCATION: u32 = 0;
pub const COLOR_LOCATION: u32 = 1;
pub const VIEW_PROJECTION_UNIFORM: &str = "ViewProjection";
pub const OUTPUT_BLOCK: &str = "VS_OUTPUT";
pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: [f64; 4],
    pub vsync: bool,
    pub sample_count: u32,
    pub log_filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: WINDOW_TITLE.to_string(),
            width: WINDOW_WIDTH,
            height: WINDOW_HEIGHT,
            clear_color: CLEAR_COLOR,
            vsync: true,
            sample_count: 4,
            log_filter: None,
        }
    }
}

impl Settings {
    /// Reads settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let found = Self::read(path)?;
        Ok(Self::report(path, found))
    }

    /// Like [`Settings::load`], but installs the logger in between so the
    /// settings' own `log_filter` applies and the load itself is logged.
    /// The logger is started even when the file is unreadable.
    pub fn load_with_logging(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let found = Self::read(path);
        let filter = match &found {
            Ok(Some(settings)) => settings.log_filter.as_deref(),
            _ => None,
        };
        logging::init_logging(filter);
        Ok(Self::report(path, found?))
    }

    // `None` when the file does not exist. Does not log.
    fn read(path: &Path) -> Result<Option<Self>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(Error::Config { path: path.to_path_buf(), source }),
        };

        let settings: Self = serde_json::from_str(&text)
            .map_err(|source| Error::ConfigParse { path: path.to_path_buf(), source })?;
        settings.validate()?;
        Ok(Some(settings))
    }

    fn report(path: &Path, found: Option<Self>) -> Self {
        match found {
            Some(settings) => {
                log::debug!("loaded settings from {}: {:?}", path.display(), settings);
                settings
            }
            None => {
                log::info!("{} not found, using default settings", path.display());
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidSettings(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !matches!(self.sample_count, 1 | 4) {
            return Err(Error::InvalidSettings(format!(
                "sample_count must be 1 or 4, got {}",
                self.sample_count
            )));
        }
        Ok(())
    }

    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }
}
