use anyhow::Context;

use crate::foundation::error::TwibbonResult;

/// File name suggested for the exported image.
pub const DEFAULT_FILE_NAME: &str = "twibbon-image.png";

/// Largest output edge accepted by default.
pub const DEFAULT_MAX_SURFACE_DIM: u32 = 16_384;

/// Export configuration.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Suggested download file name.
    pub file_name: String,
    /// If set, the canvas is filled with this straight RGBA8 color before the photo is drawn.
    pub clear_rgba: Option<[u8; 4]>,
    /// Largest accepted output width or height; larger frames fail with a surface error.
    pub max_surface_dim: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_FILE_NAME.to_string(),
            clear_rgba: None,
            max_surface_dim: DEFAULT_MAX_SURFACE_DIM,
        }
    }
}

impl ExportSettings {
    /// Defaults, with `TWIBBON_MAX_SURFACE_DIM` applied when it parses to a positive number.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(dim) = std::env::var("TWIBBON_MAX_SURFACE_DIM")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|&n| n > 0)
        {
            settings.max_surface_dim = dim;
        }
        settings
    }

    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> TwibbonResult<Self> {
        let settings = serde_json::from_str(json).context("parse export settings json")?;
        Ok(settings)
    }
}
