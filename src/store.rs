//! Sample store contract consumed by the viewer, plus an in-memory store.
//!
//! The core never holds a signal in full: it asks for descriptors and for
//! bounded `[offset, offset + count)` slices only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::data::signal::{DomainKind, SignalDescriptor, SignalId};
use crate::error::StoreError;

/// Addressable source of signal metadata and samples.
///
/// Implementations must answer promptly (bounded slice reads); any I/O
/// latency hiding is their business.
pub trait SampleStore {
    /// Metadata of `id`, or [`StoreError::NotFound`].
    fn descriptor(&self, id: SignalId) -> Result<SignalDescriptor, StoreError>;

    /// Up to `count` samples starting at `start`.
    ///
    /// Returns `min(count, sample_count - start)` values, possibly none.
    /// Out-of-range offsets are not an error; unknown ids are.
    fn samples(&self, id: SignalId, start: u64, count: u64) -> Result<Vec<f64>, StoreError>;

    /// Descriptor of frame `index` of a spectrum sequence.
    fn frame_descriptor(
        &self,
        sequence: SignalId,
        index: usize,
    ) -> Result<SignalDescriptor, StoreError> {
        let frame = frame_id(&self.descriptor(sequence)?, index)?;
        self.descriptor(frame)
    }

    /// All samples of frame `index` of a spectrum sequence.
    fn frame_samples(&self, sequence: SignalId, index: usize) -> Result<Vec<f64>, StoreError> {
        let frame = self.frame_descriptor(sequence, index)?;
        self.samples(frame.id, 0, frame.sample_count)
    }
}

fn frame_id(sequence: &SignalDescriptor, index: usize) -> Result<SignalId, StoreError> {
    sequence
        .frames
        .get(index)
        .copied()
        .ok_or(StoreError::FrameOutOfRange {
            sequence: sequence.id,
            index,
            frames: sequence.frames.len(),
        })
}

/// Shared, thread-safe store handle as held by charts.
pub type SharedStore = Arc<dyn SampleStore + Send + Sync>;

struct StoredSignal {
    descriptor: SignalDescriptor,
    samples: Vec<f64>,
}

/// In-memory [`SampleStore`].
///
/// Ids are allocated by the store. Removing a signal simulates an upstream
/// deletion: later reads fail with [`StoreError::NotFound`].
#[derive(Default)]
pub struct MemoryStore {
    next_id: AtomicU64,
    signals: RwLock<HashMap<SignalId, StoredSignal>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap into the handle type charts expect.
    pub fn shared(self) -> SharedStore {
        Arc::new(self)
    }

    fn alloc_id(&self) -> SignalId {
        SignalId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Register a plain signal (time, frequency or limit curve).
    ///
    /// `step` must be strictly positive; non-positive steps are replaced by 1.
    pub fn register_signal<S: Into<String>>(
        &self,
        domain_kind: DomainKind,
        name: S,
        unit: S,
        origin: f64,
        step: f64,
        samples: Vec<f64>,
    ) -> SignalId {
        let id = self.alloc_id();
        let descriptor = SignalDescriptor {
            id,
            domain_kind,
            origin,
            step: sanitize_step(step),
            sample_count: samples.len() as u64,
            unit: unit.into(),
            display_name: name.into(),
            frames: Vec::new(),
        };
        self.insert(descriptor, samples);
        id
    }

    /// Register a spectrum sequence made of `frames`, each one spectrum with
    /// the shared `origin`/`step` geometry. Returns the sequence id; frames get
    /// their own ids and can be read individually.
    pub fn register_sequence<S: Into<String>>(
        &self,
        name: S,
        unit: S,
        origin: f64,
        step: f64,
        frames: Vec<Vec<f64>>,
    ) -> SignalId {
        let name = name.into();
        let unit = unit.into();
        let step = sanitize_step(step);
        let frame_len = frames.first().map(|f| f.len()).unwrap_or(0) as u64;
        let mut frame_ids = Vec::with_capacity(frames.len());
        for (idx, samples) in frames.into_iter().enumerate() {
            let id = self.alloc_id();
            let descriptor = SignalDescriptor {
                id,
                domain_kind: DomainKind::Frequency,
                origin,
                step,
                sample_count: samples.len() as u64,
                unit: unit.clone(),
                display_name: format!("{name} [{idx}]"),
                frames: Vec::new(),
            };
            self.insert(descriptor, samples);
            frame_ids.push(id);
        }
        let id = self.alloc_id();
        let descriptor = SignalDescriptor {
            id,
            domain_kind: DomainKind::FrequencySequence,
            origin,
            step,
            sample_count: frame_len,
            unit,
            display_name: name,
            frames: frame_ids,
        };
        self.insert(descriptor, Vec::new());
        id
    }

    /// Delete a signal (and, for a sequence, its frames). Returns whether it existed.
    pub fn remove_signal(&self, id: SignalId) -> bool {
        let mut signals = self.signals.write().unwrap_or_else(|e| e.into_inner());
        match signals.remove(&id) {
            Some(stored) => {
                for frame in stored.descriptor.frames {
                    signals.remove(&frame);
                }
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.signals.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, descriptor: SignalDescriptor, samples: Vec<f64>) {
        let mut signals = self.signals.write().unwrap_or_else(|e| e.into_inner());
        signals.insert(descriptor.id, StoredSignal { descriptor, samples });
    }
}

fn sanitize_step(step: f64) -> f64 {
    if step > 0.0 && step.is_finite() {
        step
    } else {
        log::warn!("non-positive sample step {step}, using 1.0");
        1.0
    }
}

impl SampleStore for MemoryStore {
    fn descriptor(&self, id: SignalId) -> Result<SignalDescriptor, StoreError> {
        let signals = self.signals.read().unwrap_or_else(|e| e.into_inner());
        signals
            .get(&id)
            .map(|s| s.descriptor.clone())
            .ok_or(StoreError::NotFound(id))
    }

    fn samples(&self, id: SignalId, start: u64, count: u64) -> Result<Vec<f64>, StoreError> {
        let signals = self.signals.read().unwrap_or_else(|e| e.into_inner());
        let stored = signals.get(&id).ok_or(StoreError::NotFound(id))?;
        let len = stored.samples.len();
        let s = usize::try_from(start).unwrap_or(usize::MAX).min(len);
        let e = s.saturating_add(usize::try_from(count).unwrap_or(usize::MAX)).min(len);
        Ok(stored.samples[s..e].to_vec())
    }
}
