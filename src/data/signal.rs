//! Signal metadata as supplied by the sample store, and the domain-kind
//! compatibility table that decides what may share a chart.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a signal (or of a single frame of a sequence) in the sample store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignalId(pub u64);

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Horizontal-axis semantics of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainKind {
    Time,
    Frequency,
    TimeLimit,
    FrequencyLimit,
    FrequencySequence,
}

impl DomainKind {
    pub const ALL: [DomainKind; 5] = [
        DomainKind::Time,
        DomainKind::Frequency,
        DomainKind::TimeLimit,
        DomainKind::FrequencyLimit,
        DomainKind::FrequencySequence,
    ];

    /// Whether a chart whose domain is `self` may take a curve of kind `candidate`.
    ///
    /// Time-like kinds mix with each other, frequency-like kinds mix with each
    /// other, and spectrum sequences only live alongside themselves.
    pub fn accepts(self, candidate: DomainKind) -> bool {
        use DomainKind::*;
        match self {
            Time | TimeLimit => matches!(candidate, Time | TimeLimit),
            Frequency | FrequencyLimit => matches!(candidate, Frequency | FrequencyLimit),
            FrequencySequence => matches!(candidate, FrequencySequence),
        }
    }

    /// Limit curves get the dedicated limit color by default.
    pub fn is_limit(self) -> bool {
        matches!(self, DomainKind::TimeLimit | DomainKind::FrequencyLimit)
    }

    pub fn is_sequence(self) -> bool {
        matches!(self, DomainKind::FrequencySequence)
    }

    /// Short label for the horizontal axis.
    pub fn axis_name(self) -> &'static str {
        match self {
            DomainKind::Time | DomainKind::TimeLimit => "Time",
            DomainKind::Frequency | DomainKind::FrequencyLimit | DomainKind::FrequencySequence => {
                "Frequency"
            }
        }
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DomainKind::Time => "TIME",
            DomainKind::Frequency => "FREQUENCY",
            DomainKind::TimeLimit => "TIME_LIMIT",
            DomainKind::FrequencyLimit => "FREQUENCY_LIMIT",
            DomainKind::FrequencySequence => "FREQUENCY_SEQUENCE",
        };
        f.write_str(s)
    }
}

/// A closed horizontal interval `[lo, hi]` in domain coordinates (seconds or hertz).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XRange {
    pub lo: f64,
    pub hi: f64,
}

impl XRange {
    /// Build a range, swapping the endpoints if they arrive reversed.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &XRange) -> XRange {
        XRange {
            lo: self.lo.min(other.lo),
            hi: self.hi.max(other.hi),
        }
    }

    /// Narrow `self` so both endpoints lie inside `bound`. A NaN endpoint
    /// is replaced by the matching edge of `bound`.
    pub fn clamp_to(&self, bound: &XRange) -> XRange {
        let lo = if self.lo.is_nan() { bound.lo } else { self.lo };
        let hi = if self.hi.is_nan() { bound.hi } else { self.hi };
        XRange::new(lo.clamp(bound.lo, bound.hi), hi.clamp(bound.lo, bound.hi))
    }

    pub fn is_finite(&self) -> bool {
        self.lo.is_finite() && self.hi.is_finite()
    }
}

/// Immutable description of a stored signal.
///
/// For [`DomainKind::FrequencySequence`] the sampling geometry
/// (`origin`, `step`, `sample_count`) describes each contained frame and
/// `frames` lists the frame ids in playback order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDescriptor {
    pub id: SignalId,
    pub domain_kind: DomainKind,
    /// `tmin` or `fmin`.
    pub origin: f64,
    /// `dt` or `df`; always strictly positive.
    pub step: f64,
    pub sample_count: u64,
    pub unit: String,
    pub display_name: String,
    #[serde(default)]
    pub frames: Vec<SignalId>,
}

impl SignalDescriptor {
    /// Full domain extent `[origin, origin + step * sample_count]`.
    pub fn native_range(&self) -> XRange {
        XRange {
            lo: self.origin,
            hi: self.origin + self.step * self.sample_count as f64,
        }
    }

    /// Domain coordinate of sample `index`.
    #[inline]
    pub fn x_at(&self, index: u64) -> f64 {
        self.origin + self.step * index as f64
    }

    /// Nearest sample index for domain coordinate `x`, clamped to `[0, sample_count]`.
    pub fn index_of(&self, x: f64) -> u64 {
        let raw = ((x - self.origin) / self.step).round();
        if raw.is_nan() || raw <= 0.0 {
            0
        } else if raw >= self.sample_count as f64 {
            self.sample_count
        } else {
            raw as u64
        }
    }

    /// Sample index bounds `[start, end)` covering `range`.
    pub fn index_bounds(&self, range: &XRange) -> (u64, u64) {
        let start = self.index_of(range.lo);
        let end = self.index_of(range.hi).max(start);
        (start, end)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}
