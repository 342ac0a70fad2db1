//! Candle continuity
//!
//! Indexers only emit a bucket when a trade lands in it. Charts want every
//! bucket, so quiet hours carry the previous close forward.

use futarchy_core::Candle;

/// Fill gaps in `candles` with buckets that repeat the previous close.
///
/// The input is sorted and de-duplicated by `period_start` (first wins).
/// Candles past `ceiling` are dropped and nothing is synthesized past it.
/// The last real candle is carried forward up to the ceiling, so a single
/// candle still yields a continuous series.
pub fn fill_candle_gaps(candles: &[Candle], bucket_secs: i64, ceiling: i64) -> Vec<Candle> {
    let mut sorted: Vec<&Candle> = candles.iter().filter(|c| c.period_start <= ceiling).collect();
    sorted.sort_by_key(|c| c.period_start);
    sorted.dedup_by_key(|c| c.period_start);

    if bucket_secs <= 0 {
        return sorted.into_iter().cloned().collect();
    }

    let mut filled: Vec<Candle> = Vec::with_capacity(sorted.len());
    for candle in sorted {
        if let Some(prev) = filled.last().cloned() {
            let mut gap_ts = prev.period_start + bucket_secs;
            while gap_ts < candle.period_start {
                filled.push(Candle::new(gap_ts, prev.close.clone()));
                gap_ts += bucket_secs;
            }
        }
        filled.push(candle.clone());
    }

    if let Some(last) = filled.last().cloned() {
        let mut gap_ts = last.period_start + bucket_secs;
        while gap_ts <= ceiling {
            filled.push(Candle::new(gap_ts, last.close.clone()));
            gap_ts += bucket_secs;
        }
    }

    filled
}
