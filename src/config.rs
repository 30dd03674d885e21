//! Persistent editor settings.
//!
//! Stored as JSON in the platform config directory:
//!   Linux:    `~/.config/sketchpad/sketchpad.json`
//!   Windows:  `%APPDATA%\Sketchpad\sketchpad.json`
//!   macOS:    `~/Library/Application Support/Sketchpad/sketchpad.json`
//!
//! Missing or malformed files fall back to defaults; individual bad color
//! strings fall back to their default color.

use std::path::{Path, PathBuf};

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::color::{BLACK, WHITE, parse_color, to_hex};
use crate::error::{SketchError, SketchResult};
use crate::tools::{ShapeStyle, StrokeParams, Tool};

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;
pub const DEFAULT_SCALE: f32 = 1.0;
pub const DEFAULT_LINE_WIDTH: u32 = 2;
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    /// Surface width in display pixels.
    pub display_width: u32,
    /// Surface height in display pixels.
    pub display_height: u32,
    /// Buffer pixels per display pixel.
    pub device_pixel_scale: f32,
    /// Background color as `#rrggbb`.
    pub background: String,
    /// Drawing color as `#rrggbb`.
    pub color: String,
    pub line_width: u32,
    pub shape_style: ShapeStyle,
    /// Tool active when a canvas is created.
    pub tool: Tool,
    /// Maximum history entries kept; 0 keeps everything.
    pub history_limit: usize,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            display_width: DEFAULT_WIDTH,
            display_height: DEFAULT_HEIGHT,
            device_pixel_scale: DEFAULT_SCALE,
            background: to_hex(WHITE),
            color: to_hex(BLACK),
            line_width: DEFAULT_LINE_WIDTH,
            shape_style: ShapeStyle::Outline,
            tool: Tool::Pencil,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl SketchConfig {
    pub(crate) fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        let dir = std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join("Sketchpad"));
        #[cfg(target_os = "macos")]
        let dir = std::env::var("HOME").ok().map(|home| {
            PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("Sketchpad")
        });
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        let dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
            .ok()
            .map(|d| d.join("sketchpad"));

        dir.map(|d| d.join("sketchpad.json"))
    }

    /// Parse a config file.
    pub fn load(path: &Path) -> SketchResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| SketchError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config.sanitized())
    }

    /// Load from `path`, or the platform settings file when `None`.
    /// Any failure yields the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let resolved = path.map(Path::to_path_buf).or_else(Self::settings_path);
        let Some(path) = resolved else {
            return Self::default();
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                tracing::warn!(error = %e, "config unreadable, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> SketchResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| SketchError::Config(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Clamp numeric fields into usable ranges.
    fn sanitized(mut self) -> Self {
        self.display_width = self.display_width.max(1);
        self.display_height = self.display_height.max(1);
        if !(self.device_pixel_scale.is_finite() && self.device_pixel_scale > 0.0) {
            self.device_pixel_scale = DEFAULT_SCALE;
        }
        self.line_width = self.line_width.max(1);
        self
    }

    pub fn background_color(&self) -> Rgba<u8> {
        resolve_color(&self.background, WHITE, "background")
    }

    pub fn drawing_color(&self) -> Rgba<u8> {
        resolve_color(&self.color, BLACK, "color")
    }

    pub fn stroke_params(&self) -> StrokeParams {
        StrokeParams {
            color: self.drawing_color(),
            line_width: self.line_width.max(1),
            background: self.background_color(),
            shape_style: self.shape_style,
        }
    }
}

fn resolve_color(spec: &str, fallback: Rgba<u8>, field: &str) -> Rgba<u8> {
    match parse_color(spec) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(field, error = %e, "bad color in config, using default");
            fallback
        }
    }
}
