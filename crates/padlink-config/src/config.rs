/// Adapter configuration: load, save and sanitize.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Opacity of a peer's highlighted selection.
const DEFAULT_SELECTION_ALPHA: f32 = 0.4;

/// Width of a peer's caret marker, in pixels.
const DEFAULT_CARET_WIDTH_PX: u32 = 2;

/// Settings for an attached adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Force LF line endings in the host buffer when attaching.
    pub normalize_line_endings: bool,
    /// Opacity used for remote selection highlights (0.0..=1.0).
    pub selection_alpha: f32,
    /// Border width of remote caret markers (1..=8).
    pub caret_width_px: u32,
    /// After each translation, check that the operation applied to the
    /// previous snapshot reproduces the host's text.
    pub verify_snapshots: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            normalize_line_endings: true,
            selection_alpha: DEFAULT_SELECTION_ALPHA,
            caret_width_px: DEFAULT_CARET_WIDTH_PX,
            verify_snapshots: true,
        }
    }
}

impl AdapterConfig {
    /// Returns the config file path.
    ///
    /// Resolution order:
    /// 1. `PADLINK_CONFIG` environment variable
    /// 2. `padlink/padlink.json` under the user's config directory
    /// 3. `padlink.json` in the working directory
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PADLINK_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .map(|d| d.join("padlink").join("padlink.json"))
            .unwrap_or_else(|| PathBuf::from("padlink.json"))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (missing file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<AdapterConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {}: {e}", path.display());
                }
            }
            // Don't overwrite a broken file
            Self::default()
        } else {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            config
        }
    }

    /// Saves config to `path` as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Clamps values to valid ranges.
    pub fn sanitize(&mut self) {
        if self.selection_alpha.is_nan() {
            self.selection_alpha = DEFAULT_SELECTION_ALPHA;
        }
        self.selection_alpha = self.selection_alpha.clamp(0.0, 1.0);
        self.caret_width_px = self.caret_width_px.clamp(1, 8);
    }
}
