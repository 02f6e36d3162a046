//! Event system for the viewer core.
//!
//! Callers subscribe to chart, group and playback notifications via
//! [`EventController`]. Each event carries a set of [`EventKind`] flags so a
//! single occurrence can match multiple categories (a group dissolving is
//! *also* an ungroup of its last member).
//!
//! The caller specifies an [`EventFilter`] to receive only the events they
//! care about. The filter is a simple OR mask: an event is delivered when
//! `(event.kinds & filter) != 0`.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

use egui::Color32;

use crate::data::chart::ChartId;
use crate::data::group::GroupId;
use crate::data::player::PlayerStatus;
use crate::data::signal::{SignalId, XRange};

// ─────────────────────────────────────────────────────────────────────────────
// EventKind – bitflags
// ─────────────────────────────────────────────────────────────────────────────

/// Bitflags describing the *categories* an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventKind(pub u64);

impl EventKind {
    // ── Curves ──────────────────────────────────────────────────────────
    /// A curve was added to a chart.
    pub const CURVE_ADDED: Self = Self(1 << 0);
    /// A curve was removed on request.
    pub const CURVE_REMOVED: Self = Self(1 << 1);
    /// A curve was removed because its signal vanished from the store.
    pub const CURVE_DROPPED: Self = Self(1 << 2);
    /// A curve colour or visibility changed.
    pub const COLOR_CHANGED: Self = Self(1 << 3);

    // ── View ────────────────────────────────────────────────────────────
    /// The visible horizontal range of a chart changed.
    pub const RANGE_CHANGED: Self = Self(1 << 4);
    /// The chart switched between independent and shared vertical axes.
    pub const AXIS_MODE_CHANGED: Self = Self(1 << 5);

    // ── Playback ────────────────────────────────────────────────────────
    /// A different frame of a sequence is on display.
    pub const FRAME_CHANGED: Self = Self(1 << 6);
    /// The sequence player changed between stopped, playing and paused.
    pub const PLAYER_STATE_CHANGED: Self = Self(1 << 7);

    // ── Groups ──────────────────────────────────────────────────────────
    /// Charts were linked into a group.
    pub const CHARTS_GROUPED: Self = Self(1 << 8);
    /// A chart left its group.
    pub const CHART_UNGROUPED: Self = Self(1 << 9);
    /// A group fell below two members and was dissolved.
    pub const GROUP_DISSOLVED: Self = Self(1 << 10);

    // ── Board ───────────────────────────────────────────────────────────
    /// A chart was added to the board.
    pub const CHART_ADDED: Self = Self(1 << 11);
    /// A chart was removed from the board.
    pub const CHART_REMOVED: Self = Self(1 << 12);
    /// The set of selected charts changed.
    pub const SELECTION_CHANGED: Self = Self(1 << 13);

    /// Wildcard: matches *every* event kind.
    pub const ALL: Self = Self(u64::MAX);

    /// Combine two event kinds (bitwise OR).
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check whether `self` contains all bits in `other`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check whether `self` intersects with `other` (at least one bit in common).
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Returns `true` if no bits are set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventKind {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for EventKind {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for EventKind {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl std::ops::Not for EventKind {
    type Output = Self;
    #[inline]
    fn not(self) -> Self {
        Self(!self.0)
    }
}

const NAMED_KINDS: &[(EventKind, &str)] = &[
    (EventKind::CURVE_ADDED, "CURVE_ADDED"),
    (EventKind::CURVE_REMOVED, "CURVE_REMOVED"),
    (EventKind::CURVE_DROPPED, "CURVE_DROPPED"),
    (EventKind::COLOR_CHANGED, "COLOR_CHANGED"),
    (EventKind::RANGE_CHANGED, "RANGE_CHANGED"),
    (EventKind::AXIS_MODE_CHANGED, "AXIS_MODE_CHANGED"),
    (EventKind::FRAME_CHANGED, "FRAME_CHANGED"),
    (EventKind::PLAYER_STATE_CHANGED, "PLAYER_STATE_CHANGED"),
    (EventKind::CHARTS_GROUPED, "CHARTS_GROUPED"),
    (EventKind::CHART_UNGROUPED, "CHART_UNGROUPED"),
    (EventKind::GROUP_DISSOLVED, "GROUP_DISSOLVED"),
    (EventKind::CHART_ADDED, "CHART_ADDED"),
    (EventKind::CHART_REMOVED, "CHART_REMOVED"),
    (EventKind::SELECTION_CHANGED, "SELECTION_CHANGED"),
];

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "EMPTY");
        }
        if *self == EventKind::ALL {
            return write!(f, "ALL");
        }

        let mut names = Vec::new();
        let mut known_bits: u64 = 0;
        for (kind, name) in NAMED_KINDS {
            known_bits |= kind.0;
            if self.contains(*kind) {
                names.push((*name).to_string());
            }
        }

        let extra = self.0 & !known_bits;
        if extra != 0 {
            names.push(format!("0x{:x}", extra));
        }
        write!(f, "{}", names.join("|"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Metadata – per-event-type payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Metadata for curve add/remove/drop events.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveMeta {
    pub chart_id: ChartId,
    pub signal: SignalId,
    pub name: String,
}

/// Metadata for colour / visibility changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMeta {
    pub chart_id: ChartId,
    pub signal: SignalId,
    pub color: Color32,
    pub visible: bool,
}

/// Metadata for range changes. `range` is `None` when the chart became empty.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeMeta {
    pub chart_id: ChartId,
    pub range: Option<XRange>,
}

/// Metadata for axis mode toggles.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisModeMeta {
    pub chart_id: ChartId,
    pub shared: bool,
}

/// Metadata for frame changes.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMeta {
    pub chart_id: ChartId,
    /// The sequence being played.
    pub signal: SignalId,
    pub index: usize,
    pub frames: usize,
}

/// Metadata for player state transitions.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMeta {
    pub chart_id: ChartId,
    pub signal: SignalId,
    pub status: PlayerStatus,
    pub frame: usize,
}

/// Metadata for group membership changes.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMeta {
    pub group_id: GroupId,
    /// Charts affected by the change.
    pub charts: Vec<ChartId>,
}

/// Metadata for board-level chart management.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardMeta {
    pub chart_id: Option<ChartId>,
    /// Selection after the change.
    pub selected: Vec<ChartId>,
}

// ─────────────────────────────────────────────────────────────────────────────
// ViewerEvent – the top-level event type
// ─────────────────────────────────────────────────────────────────────────────

/// An event emitted by charts, groups and the board.
///
/// `kinds` is a bitflag set of [`EventKind`] categories. The various
/// `Option<…Meta>` fields carry metadata relevant to the kinds that are set.
#[derive(Debug, Clone, Default)]
pub struct ViewerEvent {
    pub kinds: EventKind,
    /// Seconds since the controller was created; set on emit.
    pub timestamp: f64,

    pub curve: Option<CurveMeta>,
    pub color: Option<ColorMeta>,
    pub range: Option<RangeMeta>,
    pub axis_mode: Option<AxisModeMeta>,
    pub frame: Option<FrameMeta>,
    pub player: Option<PlayerMeta>,
    pub group: Option<GroupMeta>,
    pub board: Option<BoardMeta>,
}

impl ViewerEvent {
    pub fn new(kinds: EventKind) -> Self {
        Self {
            kinds,
            ..Default::default()
        }
    }

    pub fn with_curve(mut self, meta: CurveMeta) -> Self {
        self.curve = Some(meta);
        self
    }

    pub fn with_color(mut self, meta: ColorMeta) -> Self {
        self.color = Some(meta);
        self
    }

    pub fn with_range(mut self, meta: RangeMeta) -> Self {
        self.range = Some(meta);
        self
    }

    pub fn with_axis_mode(mut self, meta: AxisModeMeta) -> Self {
        self.axis_mode = Some(meta);
        self
    }

    pub fn with_frame(mut self, meta: FrameMeta) -> Self {
        self.frame = Some(meta);
        self
    }

    pub fn with_player(mut self, meta: PlayerMeta) -> Self {
        self.player = Some(meta);
        self
    }

    pub fn with_group(mut self, meta: GroupMeta) -> Self {
        self.group = Some(meta);
        self
    }

    pub fn with_board(mut self, meta: BoardMeta) -> Self {
        self.board = Some(meta);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventFilter
// ─────────────────────────────────────────────────────────────────────────────

/// Selects which event categories a subscriber receives.
#[derive(Debug, Clone, Copy)]
pub struct EventFilter {
    pub mask: EventKind,
}

impl EventFilter {
    pub const fn all() -> Self {
        Self {
            mask: EventKind::ALL,
        }
    }

    pub const fn only(mask: EventKind) -> Self {
        Self { mask }
    }

    #[inline]
    pub fn matches(&self, event: &ViewerEvent) -> bool {
        event.kinds.intersects(self.mask)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventController
// ─────────────────────────────────────────────────────────────────────────────

struct Subscriber {
    filter: EventFilter,
    sender: Sender<ViewerEvent>,
}

/// Collects and distributes viewer events to subscribers.
///
/// Clones share one subscriber list, so a single controller can be handed to
/// every chart of a board.
#[derive(Clone)]
pub struct EventController {
    inner: Arc<Mutex<EventCtrlInner>>,
}

struct EventCtrlInner {
    subscribers: Vec<Subscriber>,
    start_instant: std::time::Instant,
}

impl EventController {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventCtrlInner {
                subscribers: Vec::new(),
                start_instant: std::time::Instant::now(),
            })),
        }
    }

    /// Subscribe to events matching the given filter.
    pub fn subscribe(&self, filter: EventFilter) -> Receiver<ViewerEvent> {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.subscribers.push(Subscriber { filter, sender: tx });
        rx
    }

    pub fn subscribe_all(&self) -> Receiver<ViewerEvent> {
        self.subscribe(EventFilter::all())
    }

    /// Deliver `event` to every matching subscriber. Subscribers whose
    /// receiver was dropped are pruned when a send to them fails.
    pub fn emit(&self, mut event: ViewerEvent) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        event.timestamp = inner.start_instant.elapsed().as_secs_f64();
        inner.subscribers.retain(|sub| {
            if sub.filter.matches(&event) {
                sub.sender.send(event.clone()).is_ok()
            } else {
                true
            }
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .subscribers
            .len()
    }
}

impl Default for EventController {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────────────────────────
