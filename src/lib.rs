//! dataviewer crate root: re-exports and module wiring.
//!
//! An adaptive multi-resolution rendering core for very large time and
//! frequency signals. Nothing here draws pixels; front-ends consume
//! [`Drawable`]s.
//!
//! - `data`: signals, decimation, curves, charts, groups and the sequence player
//! - `store`: the sample store contract and an in-memory store
//! - `board`: the charts of one window with selection and grouping
//! - `config`: viewer configuration (JSON/YAML)
//! - `events`: subscription to chart, group and playback notifications
//! - `ticker`: tick sources driving playback
//! - `plot`: egui_plot bridge

pub mod board;
pub mod color_scheme;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod plot;
pub mod store;
pub mod ticker;

// Public re-exports for a compact external API
pub use board::Board;
pub use color_scheme::{ColorScheme, CustomColorScheme};
pub use config::ViewerConfig;
pub use data::axis::{AxisBinder, AxisMode, AxisSettings};
pub use data::chart::{Chart, ChartHandle, ChartId, ChartSettings, RangeChange};
pub use data::curve::{Curve, CurveHandle};
pub use data::curve_look::CurveLook;
pub use data::decimate::{decimate, Polyline};
pub use data::group::{ChartGroup, GroupId};
pub use data::player::{PlayerStatus, SequencePlayer};
pub use data::signal::{DomainKind, SignalDescriptor, SignalId, XRange};
pub use error::{ChartError, ConfigError, GroupError, StoreError};
pub use events::{EventController, EventFilter, EventKind, ViewerEvent};
pub use plot::Drawable;
pub use store::{MemoryStore, SampleStore, SharedStore};
pub use ticker::{IntervalTicker, ManualTicks, TickEvent, TickSource};
