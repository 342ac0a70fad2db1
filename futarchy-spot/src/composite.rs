//! Series arithmetic for composite prices

use futarchy_core::PricePoint;
use std::collections::{BTreeSet, HashSet};

/// Drop duplicate timestamps (first occurrence wins), drop values that are
/// not positive finite prices, then sort ascending.
pub fn normalize_series(points: Vec<PricePoint>) -> Vec<PricePoint> {
    let mut seen = HashSet::new();
    let mut series: Vec<PricePoint> = points
        .into_iter()
        .filter(|p| seen.insert(p.time))
        .filter(|p| p.value.is_finite() && p.value > 0.0)
        .collect();
    series.sort_by_key(|p| p.time);
    series
}

pub fn invert_series(series: &mut [PricePoint]) {
    for point in series.iter_mut() {
        point.value = 1.0 / point.value;
    }
}

pub fn divide_series(series: &mut [PricePoint], divisor: f64) {
    for point in series.iter_mut() {
        point.value /= divisor;
    }
}

/// Multiply hop series together on the union of their timestamps.
///
/// Each hop contributes its most recent value at or before the timestamp.
/// Timestamps before every hop has produced a value are skipped. Inputs must
/// be ascending and free of duplicates.
pub fn forward_fill_join(hops: &[Vec<PricePoint>]) -> Vec<PricePoint> {
    match hops {
        [] => return Vec::new(),
        [single] => return single.clone(),
        _ => {}
    }

    let timestamps: BTreeSet<i64> = hops.iter().flatten().map(|p| p.time).collect();
    let mut cursors = vec![0usize; hops.len()];
    let mut carried: Vec<Option<f64>> = vec![None; hops.len()];
    let mut joined = Vec::with_capacity(timestamps.len());

    for t in timestamps {
        for (i, hop) in hops.iter().enumerate() {
            while let Some(point) = hop.get(cursors[i]).filter(|p| p.time <= t) {
                carried[i] = Some(point.value);
                cursors[i] += 1;
            }
        }

        let product = carried
            .iter()
            .try_fold(1.0, |acc, value| value.map(|v| acc * v));
        if let Some(value) = product {
            joined.push(PricePoint::new(t, value));
        }
    }

    joined
}
