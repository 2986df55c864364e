//! Core data types for the tickprep pipeline.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// UTC instant with nanosecond precision.
pub type Timestamp = DateTime<Utc>;

/// Parse an ISO-8601 instant.
///
/// Offsets are honoured and normalized to UTC. Naive timestamps (no offset)
/// and bare dates are coerced to UTC: this is a fixed policy, not an
/// inference of the zone the value was recorded in.
pub fn parse_instant(s: &str) -> Result<Timestamp> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive_formats = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    for fmt in &naive_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc());
        }
    }

    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = d.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }

    Err(Error::parse(format!("could not parse timestamp: '{}'", s)))
}

/// Serde adapter for instants that accepts naive strings (coerced to UTC).
pub mod instant {
    use super::{parse_instant, Timestamp};
    use chrono::SecondsFormat;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_instant(&s).map_err(serde::de::Error::custom)
    }
}

/// A single tick event as read from a source file.
///
/// `action`, `side` and the venue fields are passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    /// Receive timestamp.
    pub ts_recv: Timestamp,
    /// Event timestamp (used for ordering).
    pub ts_event: Timestamp,
    /// Record type.
    pub rtype: u16,
    pub publisher_id: u32,
    pub instrument_id: u64,
    /// Event action code.
    pub action: String,
    /// Side code.
    pub side: String,
    /// Book depth.
    pub depth: u32,
    /// Trade price.
    pub price: f64,
    /// Trade size.
    pub size: u64,
    pub flags: u32,
    /// Matching-engine to gateway latency (ns).
    pub ts_in_delta: i64,
    /// Venue sequence number.
    pub sequence: u64,
    pub symbol: String,
}

/// A (timestamp, value) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub ts: Timestamp,
    pub price: f64,
}

impl PricePoint {
    pub fn new(ts: Timestamp, price: f64) -> Self {
        Self { ts, price }
    }
}

/// Price series ordered by timestamp (non-decreasing).
///
/// Ties keep their entry order. The ordering invariant is established at
/// construction and preserved by every method that returns a new series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Create a series from points that must already be ordered.
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        if let Some(i) = points.windows(2).position(|w| w[1].ts < w[0].ts) {
            return Err(Error::unsorted(format!(
                "point {} at {} precedes point {} at {}",
                i + 1,
                points[i + 1].ts,
                i,
                points[i].ts
            )));
        }
        Ok(Self { points })
    }

    /// Create a series from points in any order (stable sort by timestamp).
    pub fn from_unsorted(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.ts);
        Self { points }
    }

    /// Build a series from tick records keyed by event timestamp.
    pub fn from_ticks(ticks: &[TickRecord]) -> Self {
        Self::from_unsorted(
            ticks
                .iter()
                .map(|t| PricePoint::new(t.ts_event, t.price))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PricePoint> {
        self.points.iter()
    }

    /// Prices in series order.
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Minimum and maximum price, `None` for an empty series.
    pub fn price_range(&self) -> Option<(f64, f64)> {
        let min = self.points.iter().map(|p| OrderedFloat(p.price)).min()?;
        let max = self.points.iter().map(|p| OrderedFloat(p.price)).max()?;
        Some((min.0, max.0))
    }

    /// Points with `start <= ts < end`.
    pub fn between(&self, start: Timestamp, end: Timestamp) -> Self {
        let lo = self.points.partition_point(|p| p.ts < start);
        let hi = self.points.partition_point(|p| p.ts < end).max(lo);
        Self {
            points: self.points[lo..hi].to_vec(),
        }
    }

    /// Replace every value, keeping timestamps and order.
    pub fn map_points<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&PricePoint) -> f64,
    {
        Self {
            points: self
                .points
                .iter()
                .map(|p| PricePoint::new(p.ts, f(p)))
                .collect(),
        }
    }

    /// Replace every price, keeping timestamps and order.
    pub fn map_prices<F>(&self, mut f: F) -> Self
    where
        F: FnMut(f64) -> f64,
    {
        self.map_points(|p| f(p.price))
    }

    /// Every `step`-th point starting at the first (`step` of 0 behaves as 1).
    pub fn step_by(&self, step: usize) -> Self {
        Self {
            points: self.points.iter().step_by(step.max(1)).copied().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PriceSeries {
    type Item = &'a PricePoint;
    type IntoIter = std::slice::Iter<'a, PricePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// A forward split: prices strictly before `cutoff` are divided by `ratio`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitEvent {
    /// Start of the post-split regime.
    #[serde(with = "instant")]
    pub cutoff: Timestamp,
    /// Shares after / shares before (e.g. 4.0 for 4:1).
    pub ratio: f64,
}

impl SplitEvent {
    pub fn new(cutoff: Timestamp, ratio: f64) -> Self {
        Self { cutoff, ratio }
    }

    /// Whether a price at `ts` predates this split.
    #[inline]
    pub fn applies_to(&self, ts: Timestamp) -> bool {
        ts < self.cutoff
    }
}

/// Standard deviation of prices within one resampling bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityPoint {
    /// Bucket start.
    pub ts: Timestamp,
    pub stddev: f64,
}

/// Half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(with = "instant")]
    pub start: Timestamp,
    #[serde(with = "instant")]
    pub end: Timestamp,
}

impl DateRange {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start <= ts && ts < self.end
    }
}
