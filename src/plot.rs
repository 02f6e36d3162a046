//! Presentation bridge: what a front-end needs to draw one curve.
//!
//! [`Drawable`]s are snapshots taken under the chart lock; turning them into
//! `egui_plot` items happens outside of it.

use egui::Color32;
use egui_plot::Line;

use crate::data::axis::AxisSettings;
use crate::data::curve::CurveHandle;
use crate::data::curve_look::CurveLook;
use crate::data::decimate::Polyline;

/// Snapshot of one curve ready for rendering.
#[derive(Debug, Clone)]
pub struct Drawable {
    pub handle: CurveHandle,
    pub name: String,
    pub unit: String,
    pub polyline: Polyline,
    pub look: CurveLook,
    /// The vertical scale the curve draws against.
    pub axis: AxisSettings,
}

impl Drawable {
    /// Legend label, with the unit when known.
    pub fn label(&self) -> String {
        if self.unit.is_empty() {
            self.name.clone()
        } else {
            format!("{} [{}]", self.name, self.unit)
        }
    }

    /// Vertices in plot space. Log scales map non-positive values to NaN,
    /// which egui_plot leaves out.
    pub fn plot_points(&self) -> Vec<[f64; 2]> {
        if !self.axis.log_scale {
            return self.polyline.clone();
        }
        self.polyline
            .iter()
            .map(|p| [p[0], if p[1] > 0.0 { p[1].log10() } else { f64::NAN }])
            .collect()
    }

    /// Vertices with y mapped into `[0, 1]` through the curve's own scale,
    /// for stacking curves with independent axes on one plot.
    pub fn normalized_points(&self) -> Vec<[f64; 2]> {
        let (lo, hi) = self.axis.bounds;
        let span = hi - lo;
        let span = if span > 0.0 { span } else { 1.0 };
        self.plot_points()
            .into_iter()
            .map(|p| [p[0], (p[1] - lo) / span])
            .collect()
    }

    /// Hidden curves get a fully transparent stroke so the legend entry stays.
    pub fn stroke_color(&self) -> Color32 {
        if self.look.visible {
            self.look.color
        } else {
            Color32::TRANSPARENT
        }
    }

    /// Build the egui_plot line for this curve.
    pub fn to_line(&self) -> Line<'static> {
        Line::new(self.label(), self.plot_points())
            .color(self.stroke_color())
            .width(self.look.width.max(0.1))
            .style(self.look.style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::signal::SignalId;

    fn drawable(polyline: Polyline, axis: AxisSettings) -> Drawable {
        Drawable {
            handle: CurveHandle(SignalId(1)),
            name: "vib".into(),
            unit: "g".into(),
            polyline,
            look: CurveLook::default(),
            axis,
        }
    }

    #[test]
    fn label_carries_the_unit() {
        let d = drawable(Vec::new(), AxisSettings::default());
        assert_eq!(d.label(), "vib [g]");
    }

    #[test]
    fn log_scale_drops_non_positive_values() {
        let axis = AxisSettings {
            log_scale: true,
            ..Default::default()
        };
        let d = drawable(vec![[0.0, 100.0], [1.0, -1.0]], axis);
        let pts = d.plot_points();
        assert_eq!(pts[0], [0.0, 2.0]);
        assert!(pts[1][1].is_nan());
    }

    #[test]
    fn normalization_uses_the_axis_bounds() {
        let axis = AxisSettings {
            bounds: (10.0, 20.0),
            ..Default::default()
        };
        let d = drawable(vec![[0.0, 10.0], [1.0, 15.0], [2.0, 20.0]], axis);
        let ys: Vec<f64> = d.normalized_points().iter().map(|p| p[1]).collect();
        assert_eq!(ys, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn hidden_curves_keep_a_transparent_line() {
        let mut d = drawable(vec![[0.0, 1.0], [1.0, 2.0]], AxisSettings::default());
        assert_eq!(d.stroke_color(), d.look.color);
        let _visible = d.to_line();
        d.look.visible = false;
        assert_eq!(d.stroke_color(), Color32::TRANSPARENT);
        let _hidden = d.to_line();
    }
}
