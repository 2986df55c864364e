//! Daily returns from an adjusted price series.

use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use serde::Serialize;
use tickprep_core::PriceSeries;

/// Last trade price of a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// Fractional change between two consecutive trading days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyReturn {
    pub date: NaiveDate,
    /// `close[date] / close[previous trading day] - 1`.
    pub value: f64,
}

/// Daily closes and the returns between them.
///
/// The first day has a close but no return record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyReturns {
    pub closes: Vec<DailyClose>,
    pub returns: Vec<DailyReturn>,
}

impl DailyReturns {
    /// Return values, finite ones only.
    pub fn values(&self) -> Vec<f64> {
        self.returns
            .iter()
            .map(|r| r.value)
            .filter(|v| v.is_finite())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Smallest and largest return, `None` when there are none.
    pub fn range(&self) -> Option<(f64, f64)> {
        let values = self.values();
        let min = values.iter().copied().map(OrderedFloat).min()?;
        let max = values.iter().copied().map(OrderedFloat).max()?;
        Some((min.0, max.0))
    }
}

/// Group by UTC calendar date, keep the last price of each day, and take
/// the change between consecutive days present in the data.
///
/// Days without trades are skipped, so a return may span a weekend or
/// holiday.
pub fn daily_returns(series: &PriceSeries) -> DailyReturns {
    let mut closes: Vec<DailyClose> = Vec::new();

    for point in series {
        let date = point.ts.date_naive();
        match closes.last_mut() {
            Some(last) if last.date == date => last.close = point.price,
            _ => closes.push(DailyClose {
                date,
                close: point.price,
            }),
        }
    }

    let returns = closes
        .windows(2)
        .map(|w| DailyReturn {
            date: w[1].date,
            value: w[1].close / w[0].close - 1.0,
        })
        .collect();

    DailyReturns { closes, returns }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};
    use tickprep_core::PricePoint;

    fn at(d: u32, h: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap()
    }

    fn series(points: &[(chrono::DateTime<Utc>, f64)]) -> PriceSeries {
        PriceSeries::new(points.iter().map(|(t, p)| PricePoint::new(*t, *p)).collect()).unwrap()
    }

    #[test]
    fn test_two_days_one_return() {
        let out = daily_returns(&series(&[(at(4, 15), 100.0), (at(5, 15), 110.0)]));
        assert_eq!(out.closes.len(), 2);
        assert_eq!(out.len(), 1);
        assert_eq!(out.returns[0].date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_relative_eq!(out.returns[0].value, 0.10, max_relative = 1e-12);
    }

    #[test]
    fn test_last_trade_of_day_used() {
        let out = daily_returns(&series(&[
            (at(4, 9), 90.0),
            (at(4, 15), 100.0),
            (at(5, 9), 200.0),
            (at(5, 20), 105.0),
        ]));
        assert_eq!(out.closes[0].close, 100.0);
        assert_eq!(out.closes[1].close, 105.0);
        assert_relative_eq!(out.returns[0].value, 0.05, max_relative = 1e-12);
    }

    #[test]
    fn test_gaps_are_skipped() {
        // Friday then Monday.
        let out = daily_returns(&series(&[(at(1, 15), 100.0), (at(4, 15), 90.0)]));
        assert_eq!(out.len(), 1);
        assert_eq!(out.returns[0].date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_relative_eq!(out.returns[0].value, -0.10, max_relative = 1e-12);
    }

    #[test]
    fn test_single_day_has_no_returns() {
        let out = daily_returns(&series(&[(at(4, 9), 100.0), (at(4, 10), 101.0)]));
        assert_eq!(out.closes.len(), 1);
        assert!(out.is_empty());
        assert!(out.range().is_none());
    }

    #[test]
    fn test_day_boundary_is_utc() {
        // 23:30 and 00:30 UTC fall on different days.
        let late = Utc.with_ymd_and_hms(2024, 3, 4, 23, 30, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 3, 5, 0, 30, 0).unwrap();
        let out = daily_returns(&series(&[(late, 100.0), (early, 102.0)]));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_range() {
        let out = daily_returns(&series(&[(at(4, 9), 100.0), (at(5, 9), 110.0), (at(6, 9), 99.0)]));
        let (lo, hi) = out.range().unwrap();
        assert_relative_eq!(lo, -0.1, max_relative = 1e-12);
        assert_relative_eq!(hi, 0.1, max_relative = 1e-12);
    }
}
