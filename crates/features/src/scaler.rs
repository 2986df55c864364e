//! Min-max scaling with a safety buffer.
//!
//! Maps price space onto `[0, 1]` through an affine transform fitted on a
//! buffered copy of the observed price range.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tickprep_core::{Error, PriceSeries, Result};
use tracing::info;

/// Fitted affine scaler. Immutable once built; refit to get a new one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    /// Lower edge of the buffered domain (maps to 0).
    lo: f64,
    /// Upper edge of the buffered domain (maps to 1).
    hi: f64,
    /// Width used for division; 1.0 when the domain is degenerate.
    scale: f64,
}

impl Scaler {
    /// Fit on `prices` with `buffer_factor` in `[0, 1)`.
    ///
    /// The domain is `[min - b * range, max + b * range]`.
    pub fn fit(prices: &[f64], buffer_factor: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&buffer_factor) {
            return Err(Error::config(format!(
                "buffer factor must be in [0, 1), got {}",
                buffer_factor
            )));
        }

        let min = prices.iter().copied().map(OrderedFloat).min();
        let max = prices.iter().copied().map(OrderedFloat).max();
        let (min, max) = match (min, max) {
            (Some(min), Some(max)) => (min.0, max.0),
            _ => return Err(Error::insufficient_data("cannot fit a scaler on no prices")),
        };
        if !min.is_finite() || !max.is_finite() {
            return Err(Error::insufficient_data("cannot fit a scaler on non-finite prices"));
        }

        let buffer = (max - min) * buffer_factor;
        let scaler = Self::from_domain(min - buffer, max + buffer);

        info!(
            "Scaler fitted: prices {:.2} to {:.2}, buffered domain {:.2} to {:.2}",
            min, max, scaler.lo, scaler.hi
        );

        Ok(scaler)
    }

    /// Fit on the prices of a series.
    pub fn fit_series(series: &PriceSeries, buffer_factor: f64) -> Result<Self> {
        Self::fit(&series.prices(), buffer_factor)
    }

    fn from_domain(lo: f64, hi: f64) -> Self {
        let width = hi - lo;
        let scale = if width > 0.0 { width } else { 1.0 };
        Self { lo, hi, scale }
    }

    /// Buffered domain `(lo, hi)` mapped onto `[0, 1]`.
    pub fn domain(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    /// Price to scaled value. Extrapolates linearly outside the domain.
    #[inline]
    pub fn forward(&self, price: f64) -> f64 {
        (price - self.lo) / self.scale
    }

    /// Scaled value back to price.
    #[inline]
    pub fn inverse(&self, scaled: f64) -> f64 {
        scaled * self.scale + self.lo
    }

    pub fn transform(&self, prices: &[f64]) -> Vec<f64> {
        prices.iter().map(|&p| self.forward(p)).collect()
    }

    pub fn inverse_transform(&self, scaled: &[f64]) -> Vec<f64> {
        scaled.iter().map(|&s| self.inverse(s)).collect()
    }

    /// Scaled values of a series, in series order.
    pub fn transform_series(&self, series: &PriceSeries) -> Vec<f64> {
        series.iter().map(|p| self.forward(p.price)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_buffered_domain() {
        let scaler = Scaler::fit(&[100.0, 150.0, 200.0], 0.1).unwrap();
        let (lo, hi) = scaler.domain();
        assert_relative_eq!(lo, 90.0);
        assert_relative_eq!(hi, 210.0);
        assert_relative_eq!(scaler.forward(90.0), 0.0);
        assert_relative_eq!(scaler.forward(210.0), 1.0);
        assert_relative_eq!(scaler.forward(150.0), 0.5);
    }

    #[test]
    fn test_observed_prices_stay_inside_unit_interval() {
        let prices = [12.5, 48.0, 130.2, 7.9, 99.9];
        let scaler = Scaler::fit(&prices, 0.1).unwrap();
        for s in scaler.transform(&prices) {
            assert!(s > 0.0 && s < 1.0);
        }
    }

    #[test]
    fn test_round_trip() {
        let prices = [3.21, 45.6, 118.75, 140.01, 0.99];
        let scaler = Scaler::fit(&prices, 0.1).unwrap();
        let (lo, hi) = scaler.domain();
        for i in 0..=100 {
            let p = lo + (hi - lo) * i as f64 / 100.0;
            assert_relative_eq!(scaler.inverse(scaler.forward(p)), p, max_relative = 1e-6);
        }
        let restored = scaler.inverse_transform(&scaler.transform(&prices));
        for (a, b) in restored.iter().zip(prices.iter()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_extrapolates_outside_domain() {
        let scaler = Scaler::fit(&[100.0, 200.0], 0.0).unwrap();
        assert_relative_eq!(scaler.forward(300.0), 2.0);
        assert_relative_eq!(scaler.forward(0.0), -1.0);
        assert_relative_eq!(scaler.inverse(-1.0), 0.0);
    }

    #[test]
    fn test_constant_prices_stay_finite() {
        let scaler = Scaler::fit(&[42.0, 42.0], 0.1).unwrap();
        assert_abs_diff_eq!(scaler.forward(42.0), 0.0);
        assert_relative_eq!(scaler.inverse(scaler.forward(43.0)), 43.0);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(Scaler::fit(&[], 0.1), Err(Error::InsufficientData(_))));
        assert!(matches!(Scaler::fit(&[1.0, 2.0], 1.0), Err(Error::Config(_))));
        assert!(matches!(Scaler::fit(&[1.0, 2.0], -0.1), Err(Error::Config(_))));
    }

    #[test]
    fn test_refit_is_independent() {
        let a = Scaler::fit(&[1.0, 2.0], 0.1).unwrap();
        let b = Scaler::fit(&[10.0, 20.0], 0.1).unwrap();
        assert_ne!(a, b);
        assert_relative_eq!(a.forward(1.5), 0.5);
    }
}
