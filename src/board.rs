//! Board: the charts of one window, their selection and their groups.

use std::sync::mpsc::{Receiver, Sender};

use crate::config::ViewerConfig;
use crate::data::chart::{Chart, ChartHandle, ChartId};
use crate::data::curve::CurveHandle;
use crate::data::group::ChartGroup;
use crate::data::signal::SignalId;
use crate::error::{ChartError, GroupError};
use crate::events::{BoardMeta, EventController, EventKind, ViewerEvent};
use crate::store::SharedStore;
use crate::ticker::{IntervalTicker, TickEvent};

pub struct Board {
    store: SharedStore,
    config: ViewerConfig,
    charts: Vec<ChartHandle>,
    selected: Vec<ChartId>,
    events: EventController,
    tick_sender: Option<Sender<TickEvent>>,
}

impl Board {
    /// Create an empty board. The config's color scheme becomes the active
    /// curve palette.
    pub fn new(store: SharedStore, config: ViewerConfig) -> Self {
        let config = config.validated();
        config.color_scheme.apply();
        Self {
            store,
            config,
            charts: Vec::new(),
            selected: Vec::new(),
            events: EventController::new(),
            tick_sender: None,
        }
    }

    /// Give every chart created from now on an [`IntervalTicker`] posting to
    /// `sender`. Feed the receiving end to [`Board::pump_ticks`].
    pub fn with_tick_channel(mut self, sender: Sender<TickEvent>) -> Self {
        self.tick_sender = Some(sender);
        self
    }

    pub fn events(&self) -> &EventController {
        &self.events
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn add_chart(&mut self) -> ChartHandle {
        let mut chart =
            Chart::new(self.store.clone(), self.config.chart_settings()).with_events(self.events.clone());
        if let Some(sender) = &self.tick_sender {
            chart.set_tick_source(Box::new(IntervalTicker::new(chart.id(), sender.clone())));
        }
        let handle = ChartHandle::new(chart);
        self.charts.push(handle.clone());
        self.emit(EventKind::CHART_ADDED, Some(handle.id()));
        handle
    }

    pub fn chart(&self, id: ChartId) -> Option<ChartHandle> {
        self.charts.iter().find(|c| c.id() == id).cloned()
    }

    /// Charts in creation order.
    pub fn charts(&self) -> &[ChartHandle] {
        &self.charts
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    /// Remove a chart, leaving its group and stopping its ticks first.
    pub fn remove_chart(&mut self, id: ChartId) -> bool {
        let Some(pos) = self.charts.iter().position(|c| c.id() == id) else {
            return false;
        };
        let handle = self.charts.remove(pos);
        ChartGroup::ungroup(&handle);
        handle.lock().release_ticks();
        self.selected.retain(|s| *s != id);
        log::info!("removed {id}");
        self.emit(EventKind::CHART_REMOVED, Some(id));
        true
    }

    // ─────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────

    fn has_chart(&self, id: ChartId) -> bool {
        self.charts.iter().any(|c| c.id() == id)
    }

    pub fn select(&mut self, id: ChartId) -> bool {
        if !self.has_chart(id) || self.selected.contains(&id) {
            return false;
        }
        self.selected.push(id);
        self.emit(EventKind::SELECTION_CHANGED, Some(id));
        true
    }

    pub fn deselect(&mut self, id: ChartId) -> bool {
        let before = self.selected.len();
        self.selected.retain(|s| *s != id);
        let changed = self.selected.len() != before;
        if changed {
            self.emit(EventKind::SELECTION_CHANGED, Some(id));
        }
        changed
    }

    /// Flip the selection of `id`; returns whether it is now selected.
    pub fn toggle_selection(&mut self, id: ChartId) -> bool {
        if self.selected.contains(&id) {
            self.deselect(id);
            false
        } else {
            self.select(id)
        }
    }

    pub fn clear_selection(&mut self) {
        if !self.selected.is_empty() {
            self.selected.clear();
            self.emit(EventKind::SELECTION_CHANGED, None);
        }
    }

    pub fn is_selected(&self, id: ChartId) -> bool {
        self.selected.contains(&id)
    }

    /// Selected charts in board order.
    pub fn selected(&self) -> Vec<ChartHandle> {
        self.charts
            .iter()
            .filter(|c| self.selected.contains(&c.id()))
            .cloned()
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Bulk operations on the selection
    // ─────────────────────────────────────────────────────────────────────

    /// Group the selected charts. Fewer than two selected is a no-op.
    pub fn group_selected(&mut self) -> Result<Option<ChartGroup>, GroupError> {
        let selected = self.selected();
        if selected.len() < 2 {
            log::debug!("group request with {} selected charts ignored", selected.len());
            return Ok(None);
        }
        ChartGroup::group(&selected).map(Some)
    }

    /// Take every selected chart out of its group. Returns how many were grouped.
    pub fn ungroup_selected(&mut self) -> usize {
        self.selected()
            .iter()
            .filter(|c| ChartGroup::ungroup(c))
            .count()
    }

    pub fn remove_selected(&mut self) -> usize {
        let ids: Vec<ChartId> = self.selected().iter().map(|c| c.id()).collect();
        ids.into_iter().filter(|id| self.remove_chart(*id)).count()
    }

    /// Display `signal` on the first selected chart. `Ok(None)` when no
    /// chart is selected; compatibility errors come back unchanged.
    pub fn add_signal_to_selected(&mut self, signal: SignalId) -> Result<Option<CurveHandle>, ChartError> {
        match self.selected().first() {
            Some(chart) => chart.add_curve(signal).map(Some),
            None => {
                log::debug!("no chart selected for {signal}");
                Ok(None)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Ticks
    // ─────────────────────────────────────────────────────────────────────

    /// Route one tick to its chart. Ticks for charts no longer on the board
    /// are ignored.
    pub fn tick(&self, chart_id: ChartId) -> Result<(), ChartError> {
        match self.chart(chart_id) {
            Some(chart) => chart.tick(),
            None => {
                log::debug!("stale tick for {chart_id}");
                Ok(())
            }
        }
    }

    /// Deliver every pending tick without blocking. Returns how many were
    /// delivered; failures are logged.
    pub fn pump_ticks(&self, receiver: &Receiver<TickEvent>) -> usize {
        let mut delivered = 0;
        while let Ok(event) = receiver.try_recv() {
            if let Err(e) = self.tick(event.chart_id) {
                log::warn!("tick for {} failed: {e}", event.chart_id);
            }
            delivered += 1;
        }
        delivered
    }

    fn emit(&self, kinds: EventKind, chart_id: Option<ChartId>) {
        self.events.emit(ViewerEvent::new(kinds).with_board(BoardMeta {
            chart_id,
            selected: self.selected.clone(),
        }));
    }
}
