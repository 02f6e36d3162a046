//! Chart: a set of compatible curves sharing one horizontal axis.
//!
//! A [`Chart`] owns its curves, their axis bindings, at most one sequence
//! player and that player's tick source. Callers normally hold a
//! [`ChartHandle`], which adds group propagation on top of the plain chart
//! operations.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use egui::Color32;

use crate::data::axis::{AxisBinder, AxisMode};
use crate::data::curve::{Curve, CurveHandle};
use crate::data::curve_look::CurveLook;
use crate::data::decimate::full_polyline;
use crate::data::group::{self, GroupId, GroupLink};
use crate::data::player::{PlayerStatus, SequencePlayer, TimerCommand, Transition};
use crate::data::signal::{DomainKind, SignalId, XRange};
use crate::error::{ChartError, StoreError};
use crate::events::{
    AxisModeMeta, ColorMeta, CurveMeta, EventController, EventKind, FrameMeta, PlayerMeta,
    RangeMeta, ViewerEvent,
};
use crate::plot::Drawable;
use crate::store::SharedStore;
use crate::ticker::TickSource;

/// Process-unique chart identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChartId(pub u32);

impl ChartId {
    fn next() -> Self {
        static NEXT_ID: AtomicU32 = AtomicU32::new(1);
        ChartId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chart-{}", self.0)
    }
}

/// Per-chart tunables, usually derived from [`ViewerConfig`](crate::config::ViewerConfig).
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    /// Decimation buckets per curve redraw.
    pub point_budget: usize,
    pub frame_interval: Duration,
    pub max_axes: usize,
    pub shared_axes: bool,
    pub limit_color: Color32,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            point_budget: 500,
            frame_interval: Duration::from_millis(100),
            max_axes: 16,
            shared_axes: false,
            limit_color: Color32::RED,
        }
    }
}

/// Outcome of a range change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeChange {
    /// Range in effect after clamping; `None` for an empty chart.
    pub range: Option<XRange>,
    /// Curves removed because their signal vanished during the redraw.
    pub dropped: Vec<SignalId>,
}

pub struct Chart {
    id: ChartId,
    store: SharedStore,
    settings: ChartSettings,
    domain: Option<DomainKind>,
    visible: Option<XRange>,
    bounds: Option<XRange>,
    curves: HashMap<SignalId, Curve>,
    curve_order: Vec<SignalId>,
    axes: AxisBinder,
    player: Option<SequencePlayer>,
    ticks: Option<Box<dyn TickSource>>,
    colors_allocated: usize,
    pub(crate) group: Option<GroupLink>,
    events: Option<EventController>,
}

impl fmt::Debug for Chart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chart")
            .field("id", &self.id)
            .field("domain", &self.domain)
            .field("visible", &self.visible)
            .field("bounds", &self.bounds)
            .field("curves", &self.curve_order)
            .field("player", &self.player)
            .finish()
    }
}

impl Chart {
    pub fn new(store: SharedStore, settings: ChartSettings) -> Self {
        let mode = if settings.shared_axes {
            AxisMode::Shared
        } else {
            AxisMode::Independent
        };
        let id = ChartId::next();
        log::info!("created {id}");
        Self {
            id,
            store,
            axes: AxisBinder::new(settings.max_axes, mode),
            settings,
            domain: None,
            visible: None,
            bounds: None,
            curves: HashMap::new(),
            curve_order: Vec::new(),
            player: None,
            ticks: None,
            colors_allocated: 0,
            group: None,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventController) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_tick_source(mut self, ticks: Box<dyn TickSource>) -> Self {
        self.ticks = Some(ticks);
        self
    }

    pub fn set_events(&mut self, events: EventController) {
        self.events = Some(events);
    }

    /// Install the timer that drives playback, disarming the previous one.
    pub fn set_tick_source(&mut self, ticks: Box<dyn TickSource>) {
        if let Some(mut old) = self.ticks.replace(ticks) {
            old.disarm();
        }
        if self.player.as_ref().is_some_and(|p| p.is_playing()) {
            self.arm_ticks();
        }
    }

    pub fn id(&self) -> ChartId {
        self.id
    }

    pub fn settings(&self) -> &ChartSettings {
        &self.settings
    }

    /// Kind of the first curve added; `None` while the chart is empty.
    pub fn domain(&self) -> Option<DomainKind> {
        self.domain
    }

    pub fn visible_range(&self) -> Option<XRange> {
        self.visible
    }

    /// Union of the native ranges of all curves.
    pub fn bounds(&self) -> Option<XRange> {
        self.bounds
    }

    pub fn curve_count(&self) -> usize {
        self.curve_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curve_order.is_empty()
    }

    pub fn contains(&self, signal: SignalId) -> bool {
        self.curves.contains_key(&signal)
    }

    pub fn curve(&self, handle: CurveHandle) -> Option<&Curve> {
        self.curves.get(&handle.0)
    }

    /// Curves in insertion order.
    pub fn curves(&self) -> impl Iterator<Item = &Curve> + '_ {
        self.curve_order.iter().filter_map(|id| self.curves.get(id))
    }

    pub fn axes(&self) -> &AxisBinder {
        &self.axes
    }

    pub fn player(&self) -> Option<&SequencePlayer> {
        self.player.as_ref()
    }

    pub fn group_id(&self) -> Option<GroupId> {
        self.group.as_ref().map(|l| l.id())
    }

    pub fn is_grouped(&self) -> bool {
        self.group.is_some()
    }

    pub(crate) fn events(&self) -> Option<EventController> {
        self.events.clone()
    }

    fn emit(&self, event: ViewerEvent) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }

    fn curve_meta(&self, curve: &Curve) -> CurveMeta {
        CurveMeta {
            chart_id: self.id,
            signal: curve.id(),
            name: curve.name().to_string(),
        }
    }

    fn emit_range(&self) {
        self.emit(ViewerEvent::new(EventKind::RANGE_CHANGED).with_range(RangeMeta {
            chart_id: self.id,
            range: self.visible,
        }));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Composition
    // ─────────────────────────────────────────────────────────────────────

    /// Display `signal` on this chart.
    ///
    /// On success the visible range and the union bound grow to cover the
    /// signal's native range and every curve is redrawn. On error the chart
    /// is left exactly as it was.
    pub fn add_curve(&mut self, signal: SignalId) -> Result<CurveHandle, ChartError> {
        if self.curves.contains_key(&signal) {
            return Err(ChartError::AlreadyDisplayed(signal));
        }
        let descriptor = self.store.descriptor(signal)?;
        let kind = descriptor.domain_kind;
        if let Some(domain) = self.domain {
            if !domain.accepts(kind) {
                return Err(ChartError::IncompatibleDomain {
                    chart: domain,
                    candidate: kind,
                });
            }
        }
        if kind.is_sequence() {
            if let Some(active) = &self.player {
                return Err(ChartError::SequenceAlreadyActive(active.signal()));
            }
        }

        let look = if kind.is_limit() {
            CurveLook::limit(self.settings.limit_color)
        } else {
            CurveLook::new(self.colors_allocated)
        };
        let mut curve = Curve::new(descriptor, look);
        let native = curve.native_range();
        let visible = self.visible.map_or(native, |v| v.union(&native));

        // Fetch before committing so a vanished signal leaves no trace.
        let player = if kind.is_sequence() {
            let player = SequencePlayer::new(signal, curve.descriptor().frame_count());
            if player.frames() > 0 {
                let frame = self.store.frame_descriptor(signal, 0)?;
                let samples = self.store.frame_samples(signal, 0)?;
                curve.set_polyline(full_polyline(&frame, &samples));
            }
            Some(player)
        } else {
            curve.redraw(&*self.store, &visible, self.settings.point_budget)?;
            None
        };
        self.axes.bind(signal, curve.name(), curve.unit())?;

        if !kind.is_limit() {
            self.colors_allocated += 1;
        }
        log::debug!("{}: added {} ({})", self.id, signal, kind);
        self.emit(ViewerEvent::new(EventKind::CURVE_ADDED).with_curve(self.curve_meta(&curve)));

        self.domain.get_or_insert(kind);
        self.bounds = Some(self.bounds.map_or(native, |b| b.union(&native)));
        self.curves.insert(signal, curve);
        self.curve_order.push(signal);
        if player.is_some() {
            self.player = player;
        }

        if self.visible != Some(visible) {
            self.visible = Some(visible);
            self.redraw_all();
            self.emit_range();
        } else {
            self.fit_axes();
        }
        Ok(CurveHandle(signal))
    }

    /// Remove a curve and its axis binding. Removing the last curve resets
    /// the chart's domain and range.
    pub fn remove_curve(&mut self, handle: CurveHandle) -> Result<(), ChartError> {
        let before = self.visible;
        let curve = self
            .detach(handle.0)
            .ok_or(ChartError::UnknownCurve(handle.0))?;
        log::debug!("{}: removed {}", self.id, handle.0);
        self.emit(ViewerEvent::new(EventKind::CURVE_REMOVED).with_curve(self.curve_meta(&curve)));
        if self.visible != before {
            self.redraw_all();
            self.emit_range();
        } else {
            self.fit_axes();
        }
        Ok(())
    }

    /// Unlink a curve from every structure, recompute bounds and clamp the
    /// visible range. Does not redraw.
    fn detach(&mut self, signal: SignalId) -> Option<Curve> {
        let curve = self.curves.remove(&signal)?;
        self.curve_order.retain(|id| *id != signal);
        self.axes.unbind(signal);
        if self.player.as_ref().is_some_and(|p| p.signal() == signal) {
            self.player = None;
            self.disarm_ticks();
        }

        if self.curve_order.is_empty() {
            self.domain = None;
            self.visible = None;
            self.bounds = None;
            return Some(curve);
        }
        self.bounds = self
            .curves()
            .map(|c| c.native_range())
            .reduce(|a, b| a.union(&b));
        if let (Some(visible), Some(bounds)) = (self.visible, self.bounds) {
            let clamped = visible.clamp_to(&bounds);
            // a view lying wholly inside the removed curve's range zooms out
            self.visible = Some(if clamped.width() == 0.0 && bounds.width() > 0.0 {
                bounds
            } else {
                clamped
            });
        }
        Some(curve)
    }

    /// Redraw every curve against the visible range. Curves whose signal is
    /// gone are removed; the ids of those are returned.
    fn redraw_all(&mut self) -> Vec<SignalId> {
        let mut dropped = Vec::new();
        while let Some(range) = self.visible {
            let mut vanished = Vec::new();
            for id in &self.curve_order {
                let Some(curve) = self.curves.get_mut(id) else {
                    continue;
                };
                match curve.redraw(&*self.store, &range, self.settings.point_budget) {
                    Ok(()) => {}
                    Err(e) if e.is_not_found() => vanished.push(*id),
                    Err(e) => log::warn!("{}: redraw of {} failed: {e}", self.id, id),
                }
            }
            if vanished.is_empty() {
                break;
            }
            for id in vanished {
                self.drop_vanished(id);
                dropped.push(id);
            }
        }
        self.fit_axes();
        dropped
    }

    fn drop_vanished(&mut self, signal: SignalId) {
        if let Some(curve) = self.detach(signal) {
            log::warn!("{}: signal {} vanished from the store, curve dropped", self.id, signal);
            self.emit(
                ViewerEvent::new(EventKind::CURVE_DROPPED).with_curve(self.curve_meta(&curve)),
            );
        }
    }

    fn fit_axes(&mut self) {
        let curves = &self.curves;
        self.axes.fit(
            self.curve_order
                .iter()
                .filter_map(|id| curves.get(id).map(|c| (*id, c.polyline()))),
        );
    }

    // ─────────────────────────────────────────────────────────────────────
    // Viewport
    // ─────────────────────────────────────────────────────────────────────

    /// Apply a new horizontal range: clamp it into the union bound and
    /// redraw every curve. Group propagation is the handle's business.
    pub fn on_range_changed(&mut self, requested: XRange) -> RangeChange {
        let Some(bounds) = self.bounds else {
            return RangeChange::default();
        };
        let clamped = requested.clamp_to(&bounds);
        if clamped != requested {
            log::debug!(
                "{}: range [{}, {}] clamped to [{}, {}]",
                self.id,
                requested.lo,
                requested.hi,
                clamped.lo,
                clamped.hi
            );
        }
        self.visible = Some(clamped);
        let dropped = self.redraw_all();
        self.emit_range();
        RangeChange {
            range: self.visible,
            dropped,
        }
    }

    pub fn set_range(&mut self, lo: f64, hi: f64) -> RangeChange {
        self.on_range_changed(XRange::new(lo, hi))
    }

    /// Zoom back out to the union bound.
    pub fn reset_range(&mut self) -> RangeChange {
        match self.bounds {
            Some(bounds) => self.on_range_changed(bounds),
            None => RangeChange::default(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Look and axes
    // ─────────────────────────────────────────────────────────────────────

    pub fn set_color(&mut self, handle: CurveHandle, color: Color32) -> Result<(), ChartError> {
        let curve = self
            .curves
            .get_mut(&handle.0)
            .ok_or(ChartError::UnknownCurve(handle.0))?;
        curve.look.color = color;
        let meta = ColorMeta {
            chart_id: self.id,
            signal: handle.0,
            color,
            visible: curve.look.visible,
        };
        self.emit(ViewerEvent::new(EventKind::COLOR_CHANGED).with_color(meta));
        Ok(())
    }

    pub fn set_visible(&mut self, handle: CurveHandle, visible: bool) -> Result<(), ChartError> {
        let curve = self
            .curves
            .get_mut(&handle.0)
            .ok_or(ChartError::UnknownCurve(handle.0))?;
        curve.look.visible = visible;
        let meta = ColorMeta {
            chart_id: self.id,
            signal: handle.0,
            color: curve.look.color,
            visible,
        };
        self.emit(ViewerEvent::new(EventKind::COLOR_CHANGED).with_color(meta));
        Ok(())
    }

    /// Toggle between one vertical scale per curve and a single shared one.
    pub fn set_shared_axes(&mut self, shared: bool) {
        let mode = if shared {
            AxisMode::Shared
        } else {
            AxisMode::Independent
        };
        if self.axes.mode() == mode {
            return;
        }
        self.axes.set_mode(mode);
        self.fit_axes();
        self.emit(
            ViewerEvent::new(EventKind::AXIS_MODE_CHANGED).with_axis_mode(AxisModeMeta {
                chart_id: self.id,
                shared,
            }),
        );
    }

    /// Pin the vertical scale used by `handle`.
    pub fn set_axis_bounds(&mut self, handle: CurveHandle, lo: f64, hi: f64) -> Result<(), ChartError> {
        self.axes.set_bounds(handle.0, lo, hi)
    }

    /// Let the vertical scale used by `handle` follow the data again.
    pub fn auto_fit_axis(&mut self, handle: CurveHandle) {
        self.axes.auto_fit(handle.0);
        self.fit_axes();
    }

    /// Everything a presentation layer needs, in curve order.
    pub fn drawables(&self) -> Vec<Drawable> {
        self.curves()
            .map(|curve| Drawable {
                handle: curve.handle(),
                name: curve.name().to_string(),
                unit: curve.unit().to_string(),
                polyline: curve.polyline().clone(),
                look: curve.look.clone(),
                axis: self.axes.scale_for(curve.id()).cloned().unwrap_or_default(),
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Playback
    // ─────────────────────────────────────────────────────────────────────

    fn player_mut(&mut self) -> Result<&mut SequencePlayer, ChartError> {
        self.player.as_mut().ok_or(ChartError::NoSequence)
    }

    pub fn play(&mut self) -> Result<(), ChartError> {
        let t = self.player_mut()?.play();
        self.apply_transition(t)
    }

    pub fn pause(&mut self) -> Result<(), ChartError> {
        let t = self.player_mut()?.pause();
        self.apply_transition(t)
    }

    pub fn stop(&mut self) -> Result<(), ChartError> {
        let t = self.player_mut()?.stop();
        self.apply_transition(t)
    }

    /// Show frame `index`, clamped to the sequence. Works in any state.
    pub fn seek(&mut self, index: i64) -> Result<(), ChartError> {
        let t = self.player_mut()?.seek(index);
        self.apply_transition(t)
    }

    /// Deliver one tick from the tick source. Ticks for a chart without a
    /// sequence, or while not playing, are ignored.
    pub fn tick(&mut self) -> Result<(), ChartError> {
        match self.player.as_mut() {
            Some(player) => {
                let t = player.tick();
                self.apply_transition(t)
            }
            None => Ok(()),
        }
    }

    fn arm_ticks(&mut self) {
        let interval = self.settings.frame_interval;
        if let Some(ticks) = self.ticks.as_mut() {
            ticks.arm(interval);
        }
    }

    fn disarm_ticks(&mut self) {
        if let Some(ticks) = self.ticks.as_mut() {
            ticks.disarm();
        }
    }

    /// Disarm and drop the tick source.
    pub(crate) fn release_ticks(&mut self) {
        if let Some(mut ticks) = self.ticks.take() {
            ticks.disarm();
        }
    }

    fn apply_transition(&mut self, t: Transition) -> Result<(), ChartError> {
        match t.timer {
            TimerCommand::Arm => self.arm_ticks(),
            TimerCommand::Disarm => self.disarm_ticks(),
            TimerCommand::Keep => {}
        }
        if t.status_changed {
            if let Some(player) = &self.player {
                log::debug!("{}: player {} at frame {}", self.id, player.status(), player.current_frame());
                let meta = PlayerMeta {
                    chart_id: self.id,
                    signal: player.signal(),
                    status: player.status(),
                    frame: player.current_frame(),
                };
                self.emit(ViewerEvent::new(EventKind::PLAYER_STATE_CHANGED).with_player(meta));
            }
        }
        match t.display {
            Some(index) => self.display_frame(index),
            None => Ok(()),
        }
    }

    /// Put one whole frame on screen, undecimated.
    fn display_frame(&mut self, index: usize) -> Result<(), ChartError> {
        let Some(player) = &self.player else {
            return Ok(());
        };
        let sequence = player.signal();
        let frames = player.frames();
        let fetched = self
            .store
            .frame_descriptor(sequence, index)
            .and_then(|frame| Ok((self.store.frame_samples(sequence, index)?, frame)));
        let (samples, frame) = match fetched {
            Ok(v) => v,
            Err(e) => return Err(self.frame_failed(sequence, e)),
        };
        if let Some(curve) = self.curves.get_mut(&sequence) {
            curve.set_polyline(full_polyline(&frame, &samples));
        }
        self.fit_axes();
        self.emit(ViewerEvent::new(EventKind::FRAME_CHANGED).with_frame(FrameMeta {
            chart_id: self.id,
            signal: sequence,
            index,
            frames,
        }));
        Ok(())
    }

    fn frame_failed(&mut self, sequence: SignalId, e: StoreError) -> ChartError {
        if e.is_not_found() {
            self.drop_vanished(sequence);
            if self.visible.is_some() {
                self.redraw_all();
            }
            self.emit_range();
        }
        ChartError::Store(e)
    }

    pub fn player_status(&self) -> Option<PlayerStatus> {
        self.player.as_ref().map(|p| p.status())
    }
}

impl Drop for Chart {
    fn drop(&mut self) {
        self.disarm_ticks();
        if let Some(link) = self.group.take() {
            group::leave(&link, self.id);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ChartHandle
// ─────────────────────────────────────────────────────────────────────────────

/// Shared handle to a chart. Range changes made through the handle are
/// mirrored to the chart's group.
#[derive(Clone)]
pub struct ChartHandle {
    id: ChartId,
    inner: Arc<Mutex<Chart>>,
}

impl fmt::Debug for ChartHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ChartHandle").field(&self.id).finish()
    }
}

impl ChartHandle {
    pub fn new(chart: Chart) -> Self {
        Self {
            id: chart.id(),
            inner: Arc::new(Mutex::new(chart)),
        }
    }

    pub fn id(&self) -> ChartId {
        self.id
    }

    /// Lock the chart for direct access. Range changes made through the
    /// guard are not propagated to the group.
    pub fn lock(&self) -> MutexGuard<'_, Chart> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn downgrade(&self) -> Weak<Mutex<Chart>> {
        Arc::downgrade(&self.inner)
    }

    pub fn ptr_eq(&self, other: &ChartHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Run `f` on the chart, then mirror any resulting change of the visible
    /// range to the group. The chart lock is released before propagating.
    fn with_propagation<T>(&self, f: impl FnOnce(&mut Chart) -> T) -> T {
        let (out, changed, link) = {
            let mut chart = self.lock();
            let before = chart.visible_range();
            let out = f(&mut *chart);
            let after = chart.visible_range();
            let changed = after.filter(|_| after != before);
            (out, changed, chart.group.clone())
        };
        if let (Some(range), Some(link)) = (changed, link) {
            group::propagate(&link, self.id, range);
        }
        out
    }

    pub fn add_curve(&self, signal: SignalId) -> Result<CurveHandle, ChartError> {
        self.with_propagation(|c| c.add_curve(signal))
    }

    pub fn remove_curve(&self, handle: CurveHandle) -> Result<(), ChartError> {
        self.with_propagation(|c| c.remove_curve(handle))
    }

    /// Set the visible range and mirror the clamped result to the group.
    pub fn on_range_changed(&self, range: XRange) -> RangeChange {
        let (change, link) = {
            let mut chart = self.lock();
            (chart.on_range_changed(range), chart.group.clone())
        };
        if let (Some(range), Some(link)) = (change.range, link) {
            group::propagate(&link, self.id, range);
        }
        change
    }

    pub fn set_range(&self, lo: f64, hi: f64) -> RangeChange {
        self.on_range_changed(XRange::new(lo, hi))
    }

    pub fn visible_range(&self) -> Option<XRange> {
        self.lock().visible_range()
    }

    pub fn drawables(&self) -> Vec<Drawable> {
        self.lock().drawables()
    }

    pub fn play(&self) -> Result<(), ChartError> {
        self.with_propagation(|c| c.play())
    }

    pub fn pause(&self) -> Result<(), ChartError> {
        self.lock().pause()
    }

    pub fn stop(&self) -> Result<(), ChartError> {
        self.with_propagation(|c| c.stop())
    }

    pub fn seek(&self, index: i64) -> Result<(), ChartError> {
        self.with_propagation(|c| c.seek(index))
    }

    pub fn tick(&self) -> Result<(), ChartError> {
        self.with_propagation(|c| c.tick())
    }

    pub fn is_grouped(&self) -> bool {
        self.lock().is_grouped()
    }
}
