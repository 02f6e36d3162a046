//! Color schemes for curve allocation.
//!
//! A scheme is a palette of distinct curve colors. Applying a scheme replaces
//! the process-wide palette that [`CurveLook::alloc_color`](crate::data::curve_look::CurveLook::alloc_color)
//! draws from.

use egui::Color32;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

// Global palette used for curve color allocation. Initialized with the standard
// scheme and replaced whenever a scheme is applied.
static GLOBAL_PALETTE: Lazy<Mutex<Vec<Color32>>> =
    Lazy::new(|| Mutex::new(ColorScheme::Standard.curve_colors()));

/// Get a copy of the current global curve palette.
pub fn global_palette() -> Vec<Color32> {
    GLOBAL_PALETTE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

/// Replace the global palette. Empty palettes are ignored.
pub(crate) fn set_global_palette(new: Vec<Color32>) {
    if new.is_empty() {
        log::warn!("ignoring empty curve palette");
        return;
    }
    let mut guard = GLOBAL_PALETTE.lock().unwrap_or_else(|e| e.into_inner());
    *guard = new;
}

/// Built-in palettes plus user-defined ones. None of them contains pure red,
/// which is kept for limit curves.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    /// Ten-color categorical palette.
    #[default]
    Standard,
    /// Saturated primaries: blue, green, cyan, magenta, yellow.
    Basic,
    /// Okabe-Ito palette, distinguishable with color vision deficiencies.
    Colorblind,
    Custom(CustomColorScheme),
}

/// User-defined palette.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomColorScheme {
    pub palette: Vec<Color32>,
}

impl ColorScheme {
    /// Make this scheme's palette the one new curves draw from.
    pub fn apply(&self) {
        set_global_palette(self.curve_colors());
    }

    pub fn curve_colors(&self) -> Vec<Color32> {
        let rgb = |c: &[(u8, u8, u8)]| -> Vec<Color32> {
            c.iter().map(|&(r, g, b)| Color32::from_rgb(r, g, b)).collect()
        };
        match self {
            ColorScheme::Standard => rgb(&[
                (31, 119, 180),
                (255, 127, 14),
                (44, 160, 44),
                (148, 103, 189),
                (140, 86, 75),
                (227, 119, 194),
                (127, 127, 127),
                (188, 189, 34),
                (23, 190, 207),
                (214, 39, 40),
            ]),
            ColorScheme::Basic => rgb(&[
                (0, 0, 255),
                (0, 255, 0),
                (0, 255, 255),
                (255, 0, 255),
                (255, 255, 0),
            ]),
            ColorScheme::Colorblind => rgb(&[
                (0, 114, 178),
                (230, 159, 0),
                (0, 158, 115),
                (86, 180, 233),
                (204, 121, 167),
                (240, 228, 66),
                (213, 94, 0),
            ]),
            ColorScheme::Custom(custom) => custom.palette.clone(),
        }
    }
}
