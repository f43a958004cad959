use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use simplelog::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{LazyLock, RwLock};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::gesture::GestureConfig;
use crate::highlight::{ColorCycle, Rgba};
use crate::page::PageConfig;
use crate::text_grid::GlyphMetrics;
use crate::zoom::Zoom;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pagemark";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Successive highlights alternate between these two colors
    #[serde(default = "default_highlight_colors")]
    pub highlight_colors: [Rgba; 2],

    #[serde(default = "default_selection_color")]
    pub selection_color: Rgba,

    #[serde(default = "default_click_interval_ms")]
    pub double_click_ms: u64,

    #[serde(default = "default_click_interval_ms")]
    pub triple_click_ms: u64,

    /// Max pointer travel in pixels between presses of a multi-click
    #[serde(default = "default_click_slop")]
    pub click_slop: f32,

    #[serde(default = "default_zoom")]
    pub zoom: f32,

    #[serde(default = "default_glyph_width")]
    pub glyph_width: f32,

    #[serde(default = "default_line_height")]
    pub line_height: f32,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_highlight_colors() -> [Rgba; 2] {
    ColorCycle::DEFAULT_COLORS
}

fn default_selection_color() -> Rgba {
    PageConfig::DEFAULT_SELECTION_COLOR
}

fn default_click_interval_ms() -> u64 {
    450
}

fn default_click_slop() -> f32 {
    1.0
}

fn default_zoom() -> f32 {
    1.0
}

fn default_glyph_width() -> f32 {
    GlyphMetrics::default().width
}

fn default_line_height() -> f32 {
    GlyphMetrics::default().height
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            highlight_colors: default_highlight_colors(),
            selection_color: default_selection_color(),
            double_click_ms: default_click_interval_ms(),
            triple_click_ms: default_click_interval_ms(),
            click_slop: default_click_slop(),
            zoom: default_zoom(),
            glyph_width: default_glyph_width(),
            line_height: default_line_height(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Read and parse a settings file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::SettingsRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| Error::SettingsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn page_config(&self) -> PageConfig {
        PageConfig {
            gestures: GestureConfig {
                double_click_interval: Duration::from_millis(self.double_click_ms),
                triple_click_interval: Duration::from_millis(self.triple_click_ms),
                click_slop: self.click_slop.max(0.0),
            },
            highlight_colors: self.highlight_colors,
            selection_color: self.selection_color,
        }
    }

    pub fn glyph_metrics(&self) -> GlyphMetrics {
        let defaults = GlyphMetrics::default();
        GlyphMetrics {
            width: positive_or(self.glyph_width, defaults.width),
            height: positive_or(self.line_height, defaults.height),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or_else(|_| {
            warn!("Unknown log level {:?}, using info", self.log_level);
            LevelFilter::Info
        })
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));
static SETTINGS_PATH: RwLock<Option<PathBuf>> = RwLock::new(None);

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

fn settings_path() -> Option<PathBuf> {
    SETTINGS_PATH
        .read()
        .ok()
        .and_then(|path| path.clone())
        .or_else(preferred_config_path)
}

/// Load settings into the global store.
///
/// `path` overrides the default location under the user config directory.
/// A missing file is created with defaults; an unreadable one is logged and
/// defaults stay in effect.
pub fn load_settings(path: Option<&Path>) {
    if let Some(path) = path {
        if let Ok(mut current) = SETTINGS_PATH.write() {
            *current = Some(path.to_path_buf());
        }
    }

    let Some(path) = settings_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };

    if !path.exists() {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
        return;
    }

    match Settings::from_file(&path) {
        Ok(mut settings) => {
            debug!("Loaded settings from {path:?}");

            if settings.version < CURRENT_VERSION {
                migrate_settings(&mut settings);
                save_settings_to_file(&settings, &path);
            }

            if let Ok(mut global) = SETTINGS.write() {
                *global = settings;
            }
        }
        Err(e) => error!("{e}"),
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

pub fn save_settings() {
    let Some(path) = settings_path() else {
        warn!("Could not determine config directory, cannot save settings");
        return;
    };

    if let Ok(settings) = SETTINGS.read() {
        save_settings_to_file(&settings, &path);
    }
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(&format!("version: {}\n", settings.version));
    content.push('\n');
    content.push_str("# Highlight colors as #RRGGBBAA, used alternately\n");
    content.push_str("highlight_colors:\n");
    for color in &settings.highlight_colors {
        content.push_str(&format!("  - \"{color}\"\n"));
    }
    content.push_str(&format!(
        "selection_color: \"{}\"\n",
        settings.selection_color
    ));
    content.push('\n');
    content.push_str("# Multi-click timing in milliseconds and travel in pixels\n");
    content.push_str(&format!("double_click_ms: {}\n", settings.double_click_ms));
    content.push_str(&format!("triple_click_ms: {}\n", settings.triple_click_ms));
    content.push_str(&format!("click_slop: {}\n", settings.click_slop));
    content.push('\n');
    content.push_str(&format!("zoom: {}\n", settings.zoom));
    content.push_str("# Glyph cell size in pixels at zoom 1.0\n");
    content.push_str(&format!("glyph_width: {}\n", settings.glyph_width));
    content.push_str(&format!("line_height: {}\n", settings.line_height));
    content.push('\n');
    content.push_str("# One of: off, error, warn, info, debug, trace\n");
    content.push_str(&format!("log_level: {}\n", settings.log_level));

    content
}

// Public API for accessing/modifying settings

pub fn get_settings() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

pub fn get_zoom() -> f32 {
    SETTINGS
        .read()
        .map(|s| Zoom::clamp_factor(s.zoom))
        .unwrap_or_else(|_| default_zoom())
}

pub fn set_zoom(zoom: f32) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.zoom = zoom;
    }
    save_settings();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn generated_yaml_parses_back() {
        let settings = Settings {
            highlight_colors: [Rgba::new(1, 2, 3, 4), Rgba::new(250, 251, 252, 253)],
            click_slop: 2.5,
            zoom: 1.25,
            ..Settings::default()
        };
        let parsed: Settings = serde_yaml::from_str(&generate_settings_yaml(&settings)).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let parsed: Settings = serde_yaml::from_str("triple_click_ms: 300\n").unwrap();
        assert_eq!(parsed.triple_click_ms, 300);
        assert_eq!(parsed.double_click_ms, 450);
        assert_eq!(parsed.highlight_colors, ColorCycle::DEFAULT_COLORS);
    }

    #[test]
    fn bad_color_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "selection_color: \"teal\"\n").unwrap();
        assert!(matches!(
            Settings::from_file(&path),
            Err(Error::SettingsParse { .. })
        ));
    }

    #[test]
    fn page_config_carries_timings() {
        let settings = Settings {
            double_click_ms: 300,
            triple_click_ms: 500,
            ..Settings::default()
        };
        let config = settings.page_config();
        assert_eq!(
            config.gestures.double_click_interval,
            Duration::from_millis(300)
        );
        assert_eq!(
            config.gestures.triple_click_interval,
            Duration::from_millis(500)
        );
    }

    #[test]
    fn glyph_metrics_reject_non_positive_sizes() {
        let settings = Settings {
            glyph_width: 0.0,
            line_height: -3.0,
            ..Settings::default()
        };
        assert_eq!(settings.glyph_metrics(), GlyphMetrics::default());
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let settings = Settings {
            log_level: "chatty".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.log_level(), LevelFilter::Info);
        let settings = Settings {
            log_level: "debug".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.log_level(), LevelFilter::Debug);
    }

    #[test]
    #[serial]
    fn load_creates_missing_file_and_persists_zoom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        load_settings(Some(&path));
        assert!(path.exists());

        set_zoom(2.0);
        let reloaded = Settings::from_file(&path).unwrap();
        assert_eq!(reloaded.zoom, 2.0);

        load_settings(Some(&path));
        assert_eq!(get_zoom(), 2.0);
        set_zoom(1.0);
    }
}
