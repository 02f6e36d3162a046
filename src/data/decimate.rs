//! Min/max envelope decimation.
//!
//! Turns an arbitrary sample range into a polyline of at most
//! `2 * max_output_points` vertices. Every bucket contributes its minimum and
//! its maximum at the x of its first sample, so peaks and troughs survive any
//! zoom level.

use crate::data::signal::SignalDescriptor;

/// Drawable vertices `[x, y]` in domain coordinates.
pub type Polyline = Vec<[f64; 2]>;

/// Number of samples collapsed into one bucket.
///
/// Rounded up so the bucket count never exceeds `max_output_points`.
pub fn bucket_size(sample_span: u64, max_output_points: usize) -> u64 {
    let max_points = max_output_points.max(1) as u64;
    sample_span.div_ceil(max_points).max(1)
}

/// Decimate `[start, end)` of a signal into a min/max polyline.
///
/// `fetch(offset, count)` returns the samples of one bucket. A shorter slice
/// than requested is taken as-is; an empty one means the bucket is skipped,
/// without shifting the x of the buckets that follow. Fetch errors propagate.
pub fn decimate<F, E>(
    mut fetch: F,
    geometry: &SignalDescriptor,
    start: u64,
    end: u64,
    max_output_points: usize,
) -> Result<Polyline, E>
where
    F: FnMut(u64, u64) -> Result<Vec<f64>, E>,
{
    let end = end.min(geometry.sample_count);
    if start >= end {
        return Ok(Polyline::new());
    }
    let size = bucket_size(end - start, max_output_points);
    let buckets = (end - start).div_ceil(size);
    let mut out = Polyline::with_capacity(2 * buckets as usize);

    let mut bucket_start = start;
    while bucket_start < end {
        let count = size.min(end - bucket_start);
        let chunk = fetch(bucket_start, count)?;
        if let Some((lo, hi)) = envelope(&chunk) {
            let x = geometry.x_at(bucket_start);
            out.push([x, lo]);
            out.push([x, hi]);
        }
        bucket_start += size;
    }
    Ok(out)
}

/// Min and max of a slice, `None` when empty. NaN samples are ignored unless
/// the whole slice is NaN.
pub fn envelope(samples: &[f64]) -> Option<(f64, f64)> {
    if samples.is_empty() {
        return None;
    }
    let lo = samples.iter().copied().fold(f64::NAN, f64::min);
    let hi = samples.iter().copied().fold(f64::NAN, f64::max);
    Some((lo, hi))
}

/// Lay out a whole frame as a polyline, one vertex per sample.
pub fn full_polyline(geometry: &SignalDescriptor, samples: &[f64]) -> Polyline {
    samples
        .iter()
        .enumerate()
        .map(|(i, &y)| [geometry.x_at(i as u64), y])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::signal::{DomainKind, SignalId};
    use std::convert::Infallible;

    fn geometry(count: u64) -> SignalDescriptor {
        SignalDescriptor {
            id: SignalId(7),
            domain_kind: DomainKind::Time,
            origin: 0.0,
            step: 1.0,
            sample_count: count,
            unit: String::new(),
            display_name: String::new(),
            frames: Vec::new(),
        }
    }

    fn slice_of(data: &[f64]) -> impl FnMut(u64, u64) -> Result<Vec<f64>, Infallible> + '_ {
        move |offset, count| {
            let s = (offset as usize).min(data.len());
            let e = (s + count as usize).min(data.len());
            Ok(data[s..e].to_vec())
        }
    }

    #[test]
    fn bucket_size_rounds_up() {
        assert_eq!(bucket_size(1999, 1000), 2);
        assert_eq!(bucket_size(1000, 1000), 1);
        assert_eq!(bucket_size(10, 1000), 1);
        assert_eq!(bucket_size(0, 5), 1);
    }

    #[test]
    fn single_sample_has_equal_min_and_max() {
        let data = [3.5];
        let out = decimate(slice_of(&data), &geometry(1), 0, 1, 500).unwrap();
        assert_eq!(out, vec![[0.0, 3.5], [0.0, 3.5]]);
    }

    #[test]
    fn empty_range_yields_nothing() {
        let data = [1.0, 2.0];
        let out = decimate(slice_of(&data), &geometry(2), 1, 1, 10).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn short_slice_is_authoritative() {
        // store claims 10 samples but only holds 5
        let data = [1.0, 5.0, -2.0, 4.0, 0.0];
        let out = decimate(slice_of(&data), &geometry(10), 0, 10, 2).unwrap();
        assert_eq!(out, vec![[0.0, -2.0], [0.0, 5.0]]);
    }

    #[test]
    fn fetch_errors_propagate() {
        let res: Result<Polyline, &str> =
            decimate(|_, _| Err("gone"), &geometry(4), 0, 4, 2);
        assert_eq!(res, Err("gone"));
    }

    #[test]
    fn envelope_ignores_nan_samples() {
        assert_eq!(envelope(&[f64::NAN, 2.0, -1.0]), Some((-1.0, 2.0)));
        assert_eq!(envelope(&[]), None);
    }
}
