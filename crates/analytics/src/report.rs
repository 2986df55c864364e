//! Returns report.
//!
//! Combines descriptive statistics, risk metrics and the normality test
//! computed over the defined daily returns.

use crate::returns::DailyReturns;
use crate::statistics::{DescriptiveStats, JarqueBera, RiskMetrics};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tickprep_core::config::ReturnsConfig;
use tickprep_core::{Error, Result};

/// Full statistics report over daily returns.
#[derive(Debug, Clone, Serialize)]
pub struct ReturnsReport {
    pub stats: DescriptiveStats,
    pub risk: RiskMetrics,
    pub normality: JarqueBera,
}

impl ReturnsReport {
    /// Metric name to value, in report order.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        let s = &self.stats;
        let r = &self.risk;
        let jb = &self.normality;
        vec![
            ("Mean (%)", s.mean_pct),
            ("Median (%)", s.median_pct),
            ("Std Dev (%)", s.std_dev_pct),
            ("Skewness", s.skewness),
            ("Kurtosis", s.kurtosis),
            ("Min (%)", s.min_pct),
            ("Max (%)", s.max_pct),
            ("Value at Risk 95% (%)", r.var_95_pct),
            ("Value at Risk 99% (%)", r.var_99_pct),
            ("Positive Days (%)", r.positive_days_pct),
            ("Negative Days (%)", r.negative_days_pct),
            ("Avg Positive Return (%)", r.avg_positive_pct),
            ("Avg Negative Return (%)", r.avg_negative_pct),
            ("Sharpe Ratio", r.sharpe_ratio),
            ("JB Statistic", jb.statistic),
            ("P-value", jb.p_value),
        ]
    }

    /// Key to value mapping of every numeric metric.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.entries()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

impl fmt::Display for ReturnsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries();
        let (basic, rest) = entries.split_at(7);
        let (risk, normality) = rest.split_at(7);

        writeln!(f, "--- Basic Statistics ---")?;
        for (name, value) in basic {
            writeln!(f, "{:<24}: {:>10.3}", name, value)?;
        }
        writeln!(f)?;
        writeln!(f, "--- Risk Metrics ---")?;
        for (name, value) in risk {
            writeln!(f, "{:<24}: {:>10.3}", name, value)?;
        }
        writeln!(f)?;
        writeln!(f, "--- Jarque-Bera Test ---")?;
        for (name, value) in normality {
            writeln!(f, "{:<24}: {}", name, value)?;
        }
        write!(f, "{:<24}: {}", "Normal Distribution", self.normality.verdict)
    }
}

/// Returns analyzer.
pub struct ReturnsAnalyzer {
    config: ReturnsConfig,
}

impl ReturnsAnalyzer {
    /// Create a new analyzer.
    pub fn new(config: ReturnsConfig) -> Self {
        Self { config }
    }

    /// Analyze raw return values. Non-finite entries are dropped first.
    pub fn analyze_values(&self, values: &[f64]) -> Result<ReturnsReport> {
        let returns: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if returns.is_empty() {
            return Err(Error::empty_returns("no defined daily returns to analyze"));
        }

        Ok(ReturnsReport {
            stats: DescriptiveStats::compute(&returns),
            risk: RiskMetrics::compute(&returns, &self.config),
            normality: JarqueBera::test(&returns, self.config.normality_alpha)?,
        })
    }

    /// Analyze a daily returns series.
    pub fn analyze(&self, daily: &DailyReturns) -> Result<ReturnsReport> {
        self.analyze_values(&daily.values())
    }
}

/// Analyze `daily` with `config`.
pub fn analyze_returns(daily: &DailyReturns, config: &ReturnsConfig) -> Result<ReturnsReport> {
    ReturnsAnalyzer::new(config.clone()).analyze(daily)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::returns::daily_returns;
    use crate::statistics::NormalityVerdict;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};
    use tickprep_core::{PricePoint, PriceSeries};

    fn daily_series(closes: &[f64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap();
        PriceSeries::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, p)| PricePoint::new(start + Duration::days(i as i64), *p))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_returns_error() {
        let daily = daily_returns(&daily_series(&[100.0]));
        let result = analyze_returns(&daily, &ReturnsConfig::default());
        assert!(matches!(result, Err(Error::EmptyReturns(_))));
    }

    #[test]
    fn test_two_day_report() {
        let daily = daily_returns(&daily_series(&[100.0, 110.0]));
        let report = analyze_returns(&daily, &ReturnsConfig::default()).unwrap();
        assert_eq!(report.stats.count, 1);
        assert_relative_eq!(report.stats.mean_pct, 10.0, max_relative = 1e-9);
        assert!(report.stats.std_dev_pct.is_nan());
        assert!(report.risk.sharpe_ratio.is_nan());
    }

    #[test]
    fn test_constant_price_sharpe_undefined() {
        let daily = daily_returns(&daily_series(&[50.0; 10]));
        let report = analyze_returns(&daily, &ReturnsConfig::default()).unwrap();
        assert!(report.risk.sharpe_ratio.is_nan());
        assert_eq!(report.stats.std_dev_pct, 0.0);
        assert_eq!(report.normality.verdict, NormalityVerdict::Undetermined);
    }

    #[test]
    fn test_map_keys() {
        let daily = daily_returns(&daily_series(&[100.0, 101.0, 99.5, 102.0, 103.0, 101.0]));
        let report = analyze_returns(&daily, &ReturnsConfig::default()).unwrap();
        let map = report.to_map();
        assert_eq!(map.len(), 16);
        assert_relative_eq!(map["Mean (%)"], report.stats.mean_pct);
        assert_relative_eq!(map["Value at Risk 95% (%)"], report.risk.var_95_pct);
        assert!(map.contains_key("Sharpe Ratio"));
        assert!(map.contains_key("P-value"));
    }

    #[test]
    fn test_non_finite_values_dropped() {
        let analyzer = ReturnsAnalyzer::new(ReturnsConfig::default());
        let report = analyzer.analyze_values(&[f64::NAN, 0.01, 0.03]).unwrap();
        assert_eq!(report.stats.count, 2);
        assert!(matches!(analyzer.analyze_values(&[f64::NAN]), Err(Error::EmptyReturns(_))));
    }

    #[test]
    fn test_display_sections() {
        let daily = daily_returns(&daily_series(&[100.0, 101.0, 99.5, 102.0, 103.0]));
        let text = analyze_returns(&daily, &ReturnsConfig::default()).unwrap().to_string();
        assert!(text.contains("--- Basic Statistics ---"));
        assert!(text.contains("--- Risk Metrics ---"));
        assert!(text.contains("Normal Distribution"));
    }
}
