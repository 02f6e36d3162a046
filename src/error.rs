//! Error types for the viewer core.
//!
//! None of these are fatal: the worst outcome of any operation is an empty
//! polyline, which is still a valid render result.

use thiserror::Error;

use crate::data::chart::ChartId;
use crate::data::signal::{DomainKind, SignalId};

/// Failures reported by a [`SampleStore`](crate::store::SampleStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("signal {0} is unknown to the sample store")]
    NotFound(SignalId),
    #[error("frame {index} requested from sequence {sequence}, which holds {frames} frames")]
    FrameOutOfRange {
        sequence: SignalId,
        index: usize,
        frames: usize,
    },
}

impl StoreError {
    /// True when the backing signal no longer exists upstream.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Failures of chart composition and playback requests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("cannot add a {candidate} curve to a {chart} chart")]
    IncompatibleDomain {
        chart: DomainKind,
        candidate: DomainKind,
    },
    #[error("signal {0} is already displayed on this chart")]
    AlreadyDisplayed(SignalId),
    #[error("sequence {0} is already playing on this chart; only one sequence per chart")]
    SequenceAlreadyActive(SignalId),
    #[error("axis binder is full ({0} axes)")]
    AxisCapacityExceeded(usize),
    #[error("no curve for signal {0} on this chart")]
    UnknownCurve(SignalId),
    #[error("this chart has no frame sequence to play")]
    NoSequence,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures of chart grouping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    #[error("a group needs at least 2 charts, got {0}")]
    TooFewCharts(usize),
    #[error("chart {0} was listed twice")]
    DuplicateChart(ChartId),
    #[error("chart {0} already belongs to a group")]
    AlreadyGrouped(ChartId),
}

/// Failures loading or saving a [`ViewerConfig`](crate::config::ViewerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported config format {0:?} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),
}
