//! Log transform with a positive floor.

use tickprep_core::{Error, PriceSeries, Result};

/// Maps prices to `ln(price + epsilon) / ln(base)`.
///
/// Informational only. Consumers that need the original prices back can use
/// `base.powf(value) - epsilon`, but no round trip is promised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogTransformer {
    epsilon: f64,
    ln_base: f64,
}

impl LogTransformer {
    /// `epsilon` must be positive, `base` positive and not 1.
    pub fn new(base: f64, epsilon: f64) -> Result<Self> {
        if !(epsilon > 0.0) {
            return Err(Error::config(format!("log epsilon must be positive, got {}", epsilon)));
        }
        if !(base > 0.0) || base == 1.0 || !base.is_finite() {
            return Err(Error::config(format!("invalid log base {}", base)));
        }
        Ok(Self {
            epsilon,
            ln_base: base.ln(),
        })
    }

    /// Natural logarithm with the given floor.
    pub fn natural(epsilon: f64) -> Result<Self> {
        Self::new(std::f64::consts::E, epsilon)
    }

    #[inline]
    pub fn transform(&self, price: f64) -> f64 {
        (price + self.epsilon).ln() / self.ln_base
    }

    pub fn transform_all(&self, prices: &[f64]) -> Vec<f64> {
        prices.iter().map(|&p| self.transform(p)).collect()
    }

    pub fn transform_series(&self, series: &PriceSeries) -> PriceSeries {
        series.map_prices(|p| self.transform(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_hits_floor() {
        let log = LogTransformer::natural(1e-10).unwrap();
        let v = log.transform(0.0);
        assert!(v.is_finite());
        assert!(v < 0.0);
        assert_relative_eq!(v, 1e-10_f64.ln(), max_relative = 1e-12);
    }

    #[test]
    fn test_base_ten() {
        let log = LogTransformer::new(10.0, 1e-10).unwrap();
        assert_relative_eq!(log.transform(1000.0), 3.0, max_relative = 1e-9);
        let floor = log.transform(0.0);
        assert_relative_eq!(floor, -10.0, max_relative = 1e-9);
    }

    #[test]
    fn test_documented_inverse() {
        let log = LogTransformer::new(2.0, 1e-6).unwrap();
        let p = 123.456;
        assert_relative_eq!(2.0_f64.powf(log.transform(p)) - 1e-6, p, max_relative = 1e-9);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(LogTransformer::new(1.0, 1e-10).is_err());
        assert!(LogTransformer::new(-2.0, 1e-10).is_err());
        assert!(LogTransformer::new(10.0, 0.0).is_err());
        assert!(LogTransformer::new(10.0, f64::NAN).is_err());
    }

    #[test]
    fn test_series_keeps_timestamps() {
        use chrono::{TimeZone, Utc};
        use tickprep_core::PricePoint;

        let t = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let series = PriceSeries::new(vec![PricePoint::new(t, 1.0)]).unwrap();
        let logged = LogTransformer::natural(1e-10).unwrap().transform_series(&series);
        assert_eq!(logged.points()[0].ts, t);
        assert!(logged.points()[0].price.abs() < 1e-9);
    }
}
