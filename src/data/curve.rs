//! Curve: one signal drawn on a chart.

use crate::data::curve_look::CurveLook;
use crate::data::decimate::{decimate, Polyline};
use crate::data::signal::{DomainKind, SignalDescriptor, SignalId, XRange};
use crate::error::StoreError;
use crate::store::SampleStore;

/// Caller-facing reference to a curve on a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurveHandle(pub SignalId);

impl CurveHandle {
    pub fn signal(&self) -> SignalId {
        self.0
    }
}

/// A displayed signal with its current decimated polyline.
#[derive(Debug, Clone)]
pub struct Curve {
    descriptor: SignalDescriptor,
    pub look: CurveLook,
    polyline: Polyline,
}

impl Curve {
    pub fn new(descriptor: SignalDescriptor, look: CurveLook) -> Self {
        Self {
            descriptor,
            look,
            polyline: Polyline::new(),
        }
    }

    pub fn id(&self) -> SignalId {
        self.descriptor.id
    }

    pub fn handle(&self) -> CurveHandle {
        CurveHandle(self.descriptor.id)
    }

    pub fn descriptor(&self) -> &SignalDescriptor {
        &self.descriptor
    }

    pub fn domain_kind(&self) -> DomainKind {
        self.descriptor.domain_kind
    }

    pub fn name(&self) -> &str {
        &self.descriptor.display_name
    }

    pub fn unit(&self) -> &str {
        &self.descriptor.unit
    }

    pub fn native_range(&self) -> XRange {
        self.descriptor.native_range()
    }

    pub fn polyline(&self) -> &Polyline {
        &self.polyline
    }

    /// Re-decimate the part of the signal inside `range` with at most
    /// `point_budget` buckets.
    ///
    /// Sequence curves are left alone: their polyline belongs to the player.
    pub fn redraw<S>(&mut self, store: &S, range: &XRange, point_budget: usize) -> Result<(), StoreError>
    where
        S: SampleStore + ?Sized,
    {
        if self.descriptor.domain_kind.is_sequence() {
            return Ok(());
        }
        let (start, end) = self.descriptor.index_bounds(range);
        let id = self.descriptor.id;
        self.polyline = decimate(
            |offset, count| store.samples(id, offset, count),
            &self.descriptor,
            start,
            end,
            point_budget,
        )?;
        log::debug!(
            "redraw {} [{start}, {end}) -> {} vertices",
            id,
            self.polyline.len()
        );
        Ok(())
    }

    /// Replace the polyline wholesale (frame display).
    pub(crate) fn set_polyline(&mut self, polyline: Polyline) {
        self.polyline = polyline;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn redraw_covers_only_the_visible_range() {
        let store = MemoryStore::new();
        let samples: Vec<f64> = (0..1000).map(|i| i as f64).collect();
        let id = store.register_signal(DomainKind::Time, "ramp", "V", 0.0, 0.01, samples);
        let mut curve = Curve::new(store.descriptor(id).unwrap(), CurveLook::default());

        curve.redraw(&store, &XRange::new(2.0, 4.0), 50).unwrap();
        let poly = curve.polyline();
        assert!(poly.len() <= 100);
        assert!((poly[0][0] - 2.0).abs() < 1e-9);
        assert_eq!(poly[0][1], 200.0);
        assert_eq!(poly.last().unwrap()[1], 399.0);
    }

    #[test]
    fn redraw_is_idempotent() {
        let store = MemoryStore::new();
        let samples: Vec<f64> = (0..5000).map(|i| ((i * 37) % 101) as f64).collect();
        let id = store.register_signal(DomainKind::Time, "s", "V", 0.0, 1.0, samples);
        let mut curve = Curve::new(store.descriptor(id).unwrap(), CurveLook::default());
        let range = XRange::new(100.0, 4100.0);
        curve.redraw(&store, &range, 500).unwrap();
        let first = curve.polyline().clone();
        curve.redraw(&store, &range, 500).unwrap();
        assert_eq!(&first, curve.polyline());
    }

    #[test]
    fn sequence_redraw_is_a_no_op() {
        let store = MemoryStore::new();
        let seq = store.register_sequence("spectra", "dB", 0.0, 1.0, vec![vec![1.0, 2.0]]);
        let mut curve = Curve::new(store.descriptor(seq).unwrap(), CurveLook::default());
        curve.set_polyline(vec![[0.0, 1.0]]);
        curve.redraw(&store, &XRange::new(0.0, 2.0), 500).unwrap();
        assert_eq!(curve.polyline(), &vec![[0.0, 1.0]]);
    }

    #[test]
    fn vanished_signal_reports_not_found() {
        let store = MemoryStore::new();
        let id = store.register_signal(DomainKind::Time, "s", "V", 0.0, 1.0, vec![1.0; 10]);
        let mut curve = Curve::new(store.descriptor(id).unwrap(), CurveLook::default());
        store.remove_signal(id);
        let err = curve.redraw(&store, &XRange::new(0.0, 10.0), 10).unwrap_err();
        assert!(err.is_not_found());
    }
}
