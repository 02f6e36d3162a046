//! Vertical scales: one per curve, or a single shared one.
//!
//! The [`AxisBinder`] owns every scale of a chart. Each curve holds exactly one
//! binding; toggling the shared mode re-points all bindings to one common scale
//! without touching curve data.

use std::collections::HashMap;

use crate::data::decimate::Polyline;
use crate::data::signal::SignalId;
use crate::error::ChartError;

/// One vertical scale.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSettings {
    pub unit: Option<String>,
    pub log_scale: bool,
    pub name: Option<String>,
    pub bounds: (f64, f64),
    pub auto_fit: bool,
}

impl Default for AxisSettings {
    fn default() -> Self {
        Self {
            unit: None,
            log_scale: false,
            name: None,
            bounds: (0.0, 1.0),
            auto_fit: true,
        }
    }
}

impl AxisSettings {
    fn for_curve(name: &str, unit: &str) -> Self {
        Self {
            unit: (!unit.is_empty()).then(|| unit.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// Fit the bounds to a y-extent. Flat extents are padded by half a unit.
    fn fit_to(&mut self, extent: Option<(f64, f64)>) {
        let Some((lo, hi)) = extent else { return };
        self.bounds = if lo < hi { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisMode {
    #[default]
    Independent,
    Shared,
}

/// Which scale a curve draws against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleRef {
    Independent,
    Shared,
}

/// A curve's link to its scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisBinding {
    pub curve: SignalId,
    pub scale: ScaleRef,
}

/// Fixed-capacity set of per-curve scales plus one shared scale.
#[derive(Debug, Clone)]
pub struct AxisBinder {
    capacity: usize,
    mode: AxisMode,
    bindings: Vec<AxisBinding>,
    scales: HashMap<SignalId, AxisSettings>,
    shared: AxisSettings,
}

impl AxisBinder {
    pub fn new(capacity: usize, mode: AxisMode) -> Self {
        Self {
            capacity: capacity.max(1),
            mode,
            bindings: Vec::new(),
            scales: HashMap::new(),
            shared: AxisSettings {
                name: Some("shared".to_string()),
                ..Default::default()
            },
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn mode(&self) -> AxisMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn current_ref(&self) -> ScaleRef {
        match self.mode {
            AxisMode::Independent => ScaleRef::Independent,
            AxisMode::Shared => ScaleRef::Shared,
        }
    }

    /// Allocate a binding for `curve`. Re-binding an existing curve is a no-op.
    pub fn bind(&mut self, curve: SignalId, name: &str, unit: &str) -> Result<(), ChartError> {
        if self.scales.contains_key(&curve) {
            return Ok(());
        }
        if self.bindings.len() >= self.capacity {
            return Err(ChartError::AxisCapacityExceeded(self.capacity));
        }
        if self.shared.unit.is_none() && !unit.is_empty() {
            self.shared.unit = Some(unit.to_string());
        }
        self.scales.insert(curve, AxisSettings::for_curve(name, unit));
        self.bindings.push(AxisBinding {
            curve,
            scale: self.current_ref(),
        });
        Ok(())
    }

    pub fn unbind(&mut self, curve: SignalId) {
        self.scales.remove(&curve);
        self.bindings.retain(|b| b.curve != curve);
        if self.bindings.is_empty() {
            self.shared = AxisSettings {
                name: Some("shared".to_string()),
                ..Default::default()
            };
        }
    }

    /// Switch between per-curve and shared scales.
    ///
    /// Leaving shared mode resets every per-curve scale to auto-fit; bounds
    /// chosen before sharing are not restored.
    pub fn set_mode(&mut self, mode: AxisMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        let scale = self.current_ref();
        for binding in &mut self.bindings {
            binding.scale = scale;
        }
        match mode {
            AxisMode::Shared => self.shared.auto_fit = true,
            AxisMode::Independent => {
                for settings in self.scales.values_mut() {
                    settings.auto_fit = true;
                }
            }
        }
        log::debug!("axis mode -> {:?} for {} curves", mode, self.bindings.len());
    }

    pub fn binding(&self, curve: SignalId) -> Option<&AxisBinding> {
        self.bindings.iter().find(|b| b.curve == curve)
    }

    pub fn bindings(&self) -> &[AxisBinding] {
        &self.bindings
    }

    /// The scale `curve` currently draws against.
    pub fn scale_for(&self, curve: SignalId) -> Option<&AxisSettings> {
        match self.binding(curve)?.scale {
            ScaleRef::Independent => self.scales.get(&curve),
            ScaleRef::Shared => Some(&self.shared),
        }
    }

    /// Pin the scale of `curve` (or the shared scale) to explicit bounds.
    pub fn set_bounds(&mut self, curve: SignalId, lo: f64, hi: f64) -> Result<(), ChartError> {
        let scale = self
            .binding(curve)
            .map(|b| b.scale)
            .ok_or(ChartError::UnknownCurve(curve))?;
        let settings = match scale {
            ScaleRef::Independent => self
                .scales
                .get_mut(&curve)
                .ok_or(ChartError::UnknownCurve(curve))?,
            ScaleRef::Shared => &mut self.shared,
        };
        settings.bounds = if lo <= hi { (lo, hi) } else { (hi, lo) };
        settings.auto_fit = false;
        Ok(())
    }

    /// Re-enable auto-fit for the scale of `curve`.
    pub fn auto_fit(&mut self, curve: SignalId) {
        let Some(scale) = self.binding(curve).map(|b| b.scale) else {
            return;
        };
        match scale {
            ScaleRef::Independent => {
                if let Some(s) = self.scales.get_mut(&curve) {
                    s.auto_fit = true;
                }
            }
            ScaleRef::Shared => self.shared.auto_fit = true,
        }
    }

    /// Refit auto-fit scales to the curves' current polylines.
    pub fn fit<'a, I>(&mut self, curves: I)
    where
        I: IntoIterator<Item = (SignalId, &'a Polyline)>,
    {
        let mut union: Option<(f64, f64)> = None;
        for (id, polyline) in curves {
            let extent = y_extent(polyline);
            if let Some(settings) = self.scales.get_mut(&id) {
                if settings.auto_fit {
                    settings.fit_to(extent);
                }
            }
            union = match (union, extent) {
                (Some((a, b)), Some((c, d))) => Some((a.min(c), b.max(d))),
                (None, e) => e,
                (u, None) => u,
            };
        }
        if self.shared.auto_fit {
            self.shared.fit_to(union);
        }
    }
}

/// Finite y-range of a polyline.
pub fn y_extent(polyline: &Polyline) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for p in polyline.iter().filter(|p| p[1].is_finite()) {
        lo = lo.min(p[1]);
        hi = hi.max(p[1]);
    }
    (lo <= hi).then_some((lo, hi))
}
