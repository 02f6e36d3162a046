//! CurveLook: visual styling of a curve.

use egui::Color32;
use egui_plot::LineStyle;

use crate::color_scheme::global_palette;

/// Color, visibility and stroke of a curve.
#[derive(Debug, Clone)]
pub struct CurveLook {
    pub color: Color32,
    pub visible: bool,
    pub width: f32,
    pub style: LineStyle,
}

impl Default for CurveLook {
    fn default() -> Self {
        Self {
            color: Color32::GRAY,
            visible: true,
            width: 1.5,
            style: LineStyle::Solid,
        }
    }
}

impl CurveLook {
    /// Look for the `index`-th curve of a chart, colored from the global palette.
    pub fn new(index: usize) -> Self {
        Self {
            color: Self::alloc_color(index),
            ..Default::default()
        }
    }

    /// Look for a limit curve: fixed color, dashed stroke.
    pub fn limit(color: Color32) -> Self {
        Self {
            color,
            style: LineStyle::Dashed { length: 6.0 },
            ..Default::default()
        }
    }

    /// Allocate a distinct color for the given curve index.
    pub fn alloc_color(index: usize) -> Color32 {
        let palette = global_palette();
        if palette.is_empty() {
            return Color32::GRAY;
        }
        palette[index % palette.len()]
    }
}
