//! Downsampling for plots and bucketed price volatility.

use chrono::DateTime;
use tickprep_core::{Error, PriceSeries, Result, Timestamp, VolatilityPoint};

/// Stride used to bring `len` items down to roughly `target`.
///
/// `target == 0` means no limit.
#[inline]
pub fn stride(len: usize, target: usize) -> usize {
    if target == 0 || len <= target {
        1
    } else {
        (len / target).max(1)
    }
}

/// Keep every k-th item, `k = floor(len / target)`, starting at index 0.
///
/// Returns the input unchanged when `len <= target`. The last item only
/// survives if the stride lands on it.
pub fn downsample<T: Clone>(items: &[T], target: usize) -> Vec<T> {
    let k = stride(items.len(), target);
    items.iter().step_by(k).cloned().collect()
}

/// [`downsample`] for a price series.
pub fn downsample_series(series: &PriceSeries, target: usize) -> PriceSeries {
    series.step_by(stride(series.len(), target))
}

/// Sample standard deviation (n - 1). `None` below two observations.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((ss / (n - 1) as f64).sqrt())
}

/// Start of the epoch-aligned bucket of width `secs` containing `ts`.
#[inline]
fn bucket_start(ts: Timestamp, secs: i64) -> i64 {
    ts.timestamp().div_euclid(secs) * secs
}

/// Standard deviation of price per fixed-width bucket.
///
/// Buckets are aligned to the Unix epoch (hourly buckets start on the hour).
/// Only buckets with at least two ticks produce a point: empty buckets have
/// no data and a single tick has no sample deviation.
pub fn periodic_volatility(series: &PriceSeries, bucket_secs: i64) -> Result<Vec<VolatilityPoint>> {
    if bucket_secs <= 0 {
        return Err(Error::config(format!(
            "volatility bucket must be a positive number of seconds, got {}",
            bucket_secs
        )));
    }

    let mut out = Vec::new();
    let mut current: Option<i64> = None;
    let mut prices: Vec<f64> = Vec::new();

    // Series order keeps each bucket contiguous.
    for point in series {
        let start = bucket_start(point.ts, bucket_secs);
        if current != Some(start) {
            if let Some(prev) = current {
                push_bucket(&mut out, prev, &prices);
            }
            current = Some(start);
            prices.clear();
        }
        prices.push(point.price);
    }
    if let Some(prev) = current {
        push_bucket(&mut out, prev, &prices);
    }

    Ok(out)
}

fn push_bucket(out: &mut Vec<VolatilityPoint>, start_secs: i64, prices: &[f64]) {
    let std = match sample_std(prices) {
        Some(s) => s,
        None => return,
    };
    if let Some(ts) = DateTime::from_timestamp(start_secs, 0) {
        out.push(VolatilityPoint { ts, stddev: std });
    }
}

/// Hourly [`periodic_volatility`].
pub fn hourly_volatility(series: &PriceSeries) -> Result<Vec<VolatilityPoint>> {
    periodic_volatility(series, 3600)
}
