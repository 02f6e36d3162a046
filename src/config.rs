//! Viewer configuration, loadable from JSON or YAML.

use std::path::Path;
use std::time::Duration;

use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::color_scheme::ColorScheme;
use crate::data::chart::ChartSettings;
use crate::error::ConfigError;

/// Top-level configuration of the viewer core.
///
/// | Field               | Purpose |
/// |---------------------|---------|
/// | `point_budget`      | Decimation buckets per curve redraw (vertices ≤ 2×) |
/// | `frame_interval_ms` | Tick interval of the sequence player |
/// | `max_axes`          | Vertical scales a chart can hold |
/// | `shared_y_axis`     | Whether new charts start with one shared scale |
/// | `color_scheme`      | Palette new curves draw their colors from |
/// | `limit_color`       | RGBA of limit curves |
///
/// Missing fields take their defaults, so partial files are fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub point_budget: usize,
    pub frame_interval_ms: u64,
    pub max_axes: usize,
    pub shared_y_axis: bool,
    pub color_scheme: ColorScheme,
    pub limit_color: [u8; 4],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            point_budget: 500,
            frame_interval_ms: 100,
            max_axes: 16,
            shared_y_axis: false,
            color_scheme: ColorScheme::default(),
            limit_color: [255, 0, 0, 255],
        }
    }
}

enum Format {
    Json,
    Yaml,
}

fn format_of(path: &Path) -> Result<Format, ConfigError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "json" => Ok(Format::Json),
        "yaml" | "yml" => Ok(Format::Yaml),
        _ => Err(ConfigError::UnsupportedFormat(ext)),
    }
}

impl ViewerConfig {
    /// Read a config file; the format follows the extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = format_of(path)?;
        let text = std::fs::read_to_string(path)?;
        let config: ViewerConfig = match format {
            Format::Json => serde_json::from_str(&text)?,
            Format::Yaml => serde_yaml::from_str(&text)?,
        };
        log::info!("loaded viewer config from {}", path.display());
        Ok(config.validated())
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Yaml => serde_yaml::to_string(self)?,
        };
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Replace zero budgets, intervals and capacities with the defaults.
    pub fn validated(mut self) -> Self {
        let defaults = ViewerConfig::default();
        if self.point_budget == 0 {
            log::warn!("point_budget of 0 is invalid, using {}", defaults.point_budget);
            self.point_budget = defaults.point_budget;
        }
        if self.frame_interval_ms == 0 {
            log::warn!(
                "frame_interval_ms of 0 is invalid, using {}",
                defaults.frame_interval_ms
            );
            self.frame_interval_ms = defaults.frame_interval_ms;
        }
        if self.max_axes == 0 {
            log::warn!("max_axes of 0 is invalid, using {}", defaults.max_axes);
            self.max_axes = defaults.max_axes;
        }
        self
    }

    pub fn limit_color(&self) -> Color32 {
        let [r, g, b, a] = self.limit_color;
        Color32::from_rgba_unmultiplied(r, g, b, a)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Settings for a new chart.
    pub fn chart_settings(&self) -> ChartSettings {
        ChartSettings {
            point_budget: self.point_budget,
            frame_interval: self.frame_interval(),
            max_axes: self.max_axes,
            shared_axes: self.shared_y_axis,
            limit_color: self.limit_color(),
        }
    }
}
