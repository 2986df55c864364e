//! Split adjustment.
//!
//! Restates historical prices in post-split units as of the latest split.

use tickprep_core::{Error, PriceSeries, Result, SplitEvent, Timestamp};
use tracing::info;

/// Divides pre-split prices by the ratio of every later split.
///
/// Each event is evaluated independently against the price timestamp: a
/// price before cutoffs `C1 < C2` is divided by `r1 * r2`, a price in
/// `[C1, C2)` by `r2` only, and a price at or after `C2` is left alone.
///
/// Adjustment is not idempotent. Feeding an already adjusted series back in
/// divides it again, so callers must keep track of which series are raw.
#[derive(Debug, Clone)]
pub struct SplitAdjuster {
    /// Events sorted by cutoff.
    events: Vec<SplitEvent>,
    /// `suffix[i]` is the product of ratios of `events[i..]`.
    suffix: Vec<f64>,
}

impl SplitAdjuster {
    /// Create an adjuster, rejecting non-positive or non-finite ratios.
    pub fn new(mut events: Vec<SplitEvent>) -> Result<Self> {
        if let Some(bad) = events.iter().find(|e| !(e.ratio > 0.0) || !e.ratio.is_finite()) {
            return Err(Error::malformed_split(format!(
                "ratio {} at {} must be positive and finite",
                bad.ratio, bad.cutoff
            )));
        }

        events.sort_by_key(|e| e.cutoff);

        let mut suffix = vec![1.0; events.len() + 1];
        for i in (0..events.len()).rev() {
            suffix[i] = suffix[i + 1] * events[i].ratio;
        }

        Ok(Self { events, suffix })
    }

    /// Events in cutoff order.
    pub fn events(&self) -> &[SplitEvent] {
        &self.events
    }

    /// Product of the ratios of every split whose cutoff is after `ts`.
    pub fn divisor_at(&self, ts: Timestamp) -> f64 {
        // First event with cutoff > ts; every event from there on applies.
        let idx = self.events.partition_point(|e| e.cutoff <= ts);
        self.suffix[idx]
    }

    /// Return a new series with every price restated in current-era units.
    pub fn adjust(&self, series: &PriceSeries) -> PriceSeries {
        let adjusted = series.map_points(|p| p.price / self.divisor_at(p.ts));

        if let Some((lo, hi)) = adjusted.price_range() {
            info!(
                splits = self.events.len(),
                points = adjusted.len(),
                "Split-adjusted price range: {:.2} to {:.2}",
                lo,
                hi
            );
        }

        adjusted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};
    use tickprep_core::PricePoint;

    fn day(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn series(points: &[(Timestamp, f64)]) -> PriceSeries {
        PriceSeries::new(points.iter().map(|(t, p)| PricePoint::new(*t, *p)).collect()).unwrap()
    }

    #[test]
    fn test_single_split_scales_pre_cutoff_only() {
        let cutoff = day(2021, 7, 20);
        let adjuster = SplitAdjuster::new(vec![SplitEvent::new(cutoff, 4.0)]).unwrap();
        let input = series(&[
            (cutoff - Duration::days(1), 800.0),
            (cutoff - Duration::nanoseconds(1), 760.0),
            (cutoff, 190.0),
            (cutoff + Duration::hours(3), 195.0),
        ]);

        let out = adjuster.adjust(&input);

        assert_eq!(out.len(), input.len());
        assert_relative_eq!(out.points()[0].price, 200.0);
        assert_relative_eq!(out.points()[1].price, 190.0);
        // Exactly at the cutoff is already post-split.
        assert_relative_eq!(out.points()[2].price, 190.0);
        assert_relative_eq!(out.points()[3].price, 195.0);
    }

    #[test]
    fn test_two_splits_compose() {
        let c1 = day(2021, 7, 20);
        let c2 = day(2024, 6, 10);
        // Given out of order on purpose.
        let adjuster = SplitAdjuster::new(vec![SplitEvent::new(c2, 10.0), SplitEvent::new(c1, 4.0)]).unwrap();
        let input = series(&[
            (day(2020, 1, 2), 240.0),
            (day(2022, 3, 1), 250.0),
            (c2, 120.0),
            (day(2024, 9, 1), 110.0),
        ]);

        let out = adjuster.adjust(&input).prices();

        assert_relative_eq!(out[0], 240.0 / 40.0);
        assert_relative_eq!(out[1], 250.0 / 10.0);
        assert_relative_eq!(out[2], 120.0);
        assert_relative_eq!(out[3], 110.0);
    }

    #[test]
    fn test_order_and_timestamps_preserved() {
        let cutoff = day(2021, 7, 20);
        let adjuster = SplitAdjuster::new(vec![SplitEvent::new(cutoff, 2.0)]).unwrap();
        let t = day(2021, 7, 1);
        let input = series(&[(t, 10.0), (t, 12.0), (cutoff, 6.0)]);
        let out = adjuster.adjust(&input);
        let ts: Vec<_> = out.iter().map(|p| p.ts).collect();
        assert_eq!(ts, vec![t, t, cutoff]);
        assert_eq!(out.prices(), vec![5.0, 6.0, 6.0]);
    }

    #[test]
    fn test_reapplying_divides_again() {
        let cutoff = day(2021, 7, 20);
        let adjuster = SplitAdjuster::new(vec![SplitEvent::new(cutoff, 4.0)]).unwrap();
        let input = series(&[(day(2021, 1, 4), 400.0)]);
        let twice = adjuster.adjust(&adjuster.adjust(&input));
        assert_relative_eq!(twice.points()[0].price, 25.0);
    }

    #[test]
    fn test_no_events_is_identity() {
        let adjuster = SplitAdjuster::new(Vec::new()).unwrap();
        let input = series(&[(day(2021, 1, 4), 400.0), (day(2021, 1, 5), 401.0)]);
        assert_eq!(adjuster.adjust(&input), input);
        assert_eq!(adjuster.divisor_at(day(1999, 1, 1)), 1.0);
    }

    #[test]
    fn test_malformed_ratio_rejected() {
        for ratio in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let result = SplitAdjuster::new(vec![SplitEvent::new(day(2021, 7, 20), ratio)]);
            assert!(matches!(result, Err(Error::MalformedSplitEvent(_))));
        }
    }

    #[test]
    fn test_divisor_at() {
        let adjuster = SplitAdjuster::new(vec![
            SplitEvent::new(day(2021, 7, 20), 4.0),
            SplitEvent::new(day(2024, 6, 10), 10.0),
        ])
        .unwrap();
        assert_eq!(adjuster.divisor_at(day(2019, 1, 1)), 40.0);
        assert_eq!(adjuster.divisor_at(day(2021, 7, 20)), 10.0);
        assert_eq!(adjuster.divisor_at(day(2024, 6, 10)), 1.0);
    }
}
