//! Descriptive statistics, risk metrics and the Jarque-Bera normality test.

use ordered_float::OrderedFloat;
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tickprep_core::config::ReturnsConfig;
use tickprep_core::{Error, Result};

/// Central moment sums of a sample.
struct Moments {
    n: f64,
    mean: f64,
    /// Sum of squared deviations.
    m2: f64,
    m3: f64,
    m4: f64,
}

impl Moments {
    fn of(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        for v in values {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        Self { n, mean, m2, m3, m4 }
    }

    /// Sample standard deviation (n - 1 denominator).
    fn sample_std(&self) -> f64 {
        if self.n < 2.0 {
            return f64::NAN;
        }
        (self.m2 / (self.n - 1.0)).sqrt()
    }

    /// Bias-adjusted Fisher-Pearson skewness (G1).
    fn adjusted_skew(&self) -> f64 {
        let n = self.n;
        if n < 3.0 {
            return f64::NAN;
        }
        if self.m2 == 0.0 {
            return 0.0;
        }
        n * (n - 1.0).sqrt() / (n - 2.0) * self.m3 / self.m2.powf(1.5)
    }

    /// Bias-adjusted excess kurtosis (G2).
    fn adjusted_kurtosis(&self) -> f64 {
        let n = self.n;
        if n < 4.0 {
            return f64::NAN;
        }
        if self.m2 == 0.0 {
            return 0.0;
        }
        let numerator = n * (n + 1.0) * (n - 1.0) * self.m4;
        let denominator = (n - 2.0) * (n - 3.0) * self.m2 * self.m2;
        let adj = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
        numerator / denominator - adj
    }

    /// Moment-based skewness `m3 / m2^1.5` (biased).
    fn moment_skew(&self) -> f64 {
        let m2 = self.m2 / self.n;
        (self.m3 / self.n) / m2.powf(1.5)
    }

    /// Moment-based excess kurtosis `m4 / m2^2 - 3` (biased).
    fn moment_kurtosis(&self) -> f64 {
        let m2 = self.m2 / self.n;
        (self.m4 / self.n) / (m2 * m2) - 3.0
    }
}

/// Sort a copy ascending.
fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by_key(|v| OrderedFloat(*v));
    out
}

/// Percentile `q` in `[0, 100]` with linear interpolation between ranks.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Basic statistics of daily returns. Fields ending in `_pct` are percent.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean_pct: f64,
    pub median_pct: f64,
    /// Sample standard deviation (n - 1).
    pub std_dev_pct: f64,
    /// Bias-adjusted skewness.
    pub skewness: f64,
    /// Bias-adjusted excess kurtosis.
    pub kurtosis: f64,
    pub min_pct: f64,
    pub max_pct: f64,
}

impl DescriptiveStats {
    pub fn compute(returns: &[f64]) -> Self {
        let m = Moments::of(returns);
        let s = sorted(returns);
        Self {
            count: returns.len(),
            mean_pct: m.mean * 100.0,
            median_pct: percentile(&s, 50.0) * 100.0,
            std_dev_pct: m.sample_std() * 100.0,
            skewness: m.adjusted_skew(),
            kurtosis: m.adjusted_kurtosis(),
            min_pct: s.first().copied().unwrap_or(f64::NAN) * 100.0,
            max_pct: s.last().copied().unwrap_or(f64::NAN) * 100.0,
        }
    }
}

/// Risk metrics of daily returns.
#[derive(Debug, Clone, Serialize)]
pub struct RiskMetrics {
    /// 5th percentile return (percent).
    pub var_95_pct: f64,
    /// 1st percentile return (percent).
    pub var_99_pct: f64,
    pub positive_days_pct: f64,
    pub negative_days_pct: f64,
    /// Mean of positive returns (percent), 0 without positive days.
    pub avg_positive_pct: f64,
    /// Mean of negative returns (percent), 0 without negative days.
    pub avg_negative_pct: f64,
    /// Annualized Sharpe ratio, NaN when volatility is zero or undefined.
    pub sharpe_ratio: f64,
}

impl RiskMetrics {
    pub fn compute(returns: &[f64], config: &ReturnsConfig) -> Self {
        let n = returns.len() as f64;
        let s = sorted(returns);
        let positive: Vec<f64> = returns.iter().copied().filter(|r| *r > 0.0).collect();
        let negative: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();

        Self {
            var_95_pct: percentile(&s, 5.0) * 100.0,
            var_99_pct: percentile(&s, 1.0) * 100.0,
            positive_days_pct: positive.len() as f64 / n * 100.0,
            negative_days_pct: negative.len() as f64 / n * 100.0,
            avg_positive_pct: mean(&positive).map_or(0.0, |m| m * 100.0),
            avg_negative_pct: mean(&negative).map_or(0.0, |m| m * 100.0),
            sharpe_ratio: sharpe_ratio(returns, config),
        }
    }
}

/// `(mean * days - rf) / (std * sqrt(days))`.
pub fn sharpe_ratio(returns: &[f64], config: &ReturnsConfig) -> f64 {
    if returns.is_empty() {
        return f64::NAN;
    }
    let m = Moments::of(returns);
    let days = config.trading_days_per_year as f64;
    let annualized_return = m.mean * days;
    let annualized_vol = m.sample_std() * days.sqrt();

    // NaN volatility fails the comparison as well.
    if annualized_vol > 0.0 {
        (annualized_return - config.risk_free_rate) / annualized_vol
    } else {
        f64::NAN
    }
}

/// Outcome of the normality test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NormalityVerdict {
    /// p-value below the significance level.
    Rejected,
    NotRejected,
    /// Statistic undefined (zero variance).
    Undetermined,
}

impl std::fmt::Display for NormalityVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NormalityVerdict::Rejected => "Rejected",
            NormalityVerdict::NotRejected => "Not Rejected",
            NormalityVerdict::Undetermined => "Undetermined",
        };
        f.write_str(s)
    }
}

/// Jarque-Bera test result.
#[derive(Debug, Clone, Serialize)]
pub struct JarqueBera {
    pub statistic: f64,
    pub p_value: f64,
    pub verdict: NormalityVerdict,
}

impl JarqueBera {
    /// `JB = n / 6 * (S^2 + K^2 / 4)` with moment-based skewness `S` and
    /// excess kurtosis `K`; p-value from the chi-squared(2) tail.
    pub fn test(returns: &[f64], alpha: f64) -> Result<Self> {
        if returns.is_empty() {
            return Err(Error::insufficient_data("Jarque-Bera needs at least one return"));
        }
        let m = Moments::of(returns);
        let s = m.moment_skew();
        let k = m.moment_kurtosis();
        let statistic = m.n / 6.0 * (s * s + k * k / 4.0);

        if !statistic.is_finite() {
            return Ok(Self {
                statistic: f64::NAN,
                p_value: f64::NAN,
                verdict: NormalityVerdict::Undetermined,
            });
        }

        let chi2 = ChiSquared::new(2.0).map_err(|e| Error::config(e.to_string()))?;
        let p_value = chi2.sf(statistic);
        let verdict = if p_value < alpha {
            NormalityVerdict::Rejected
        } else {
            NormalityVerdict::NotRejected
        };

        Ok(Self {
            statistic,
            p_value,
            verdict,
        })
    }
}
