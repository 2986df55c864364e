//! Configuration structures for the tickprep pipeline.
//!
//! A `Config` is an immutable value handed to each stage's entry point.

use crate::error::{Error, Result};
use crate::types::{parse_instant, DateRange, SplitEvent};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Instrument configuration.
    pub instrument: InstrumentConfig,
    /// Training and testing windows.
    pub dates: DatesConfig,
    /// Explicit split events for `instrument.symbol`. `None` falls back to
    /// [`known_splits`] for the symbol.
    pub splits: Option<Vec<SplitEvent>>,
    /// Input file configuration.
    pub ingest: IngestConfig,
    /// Downsampling and volatility resampling.
    pub resample: ResampleConfig,
    /// Scaler configuration.
    pub scaler: ScalerConfig,
    /// Log transform configuration.
    pub log: LogConfig,
    /// Returns analysis configuration.
    pub returns: ReturnsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instrument: InstrumentConfig::default(),
            dates: DatesConfig::default(),
            splits: None,
            ingest: IngestConfig::default(),
            resample: ResampleConfig::default(),
            scaler: ScalerConfig::default(),
            log: LogConfig::default(),
            returns: ReturnsConfig::default(),
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Missing sections take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Split events that apply to the configured symbol.
    pub fn split_events(&self) -> Vec<SplitEvent> {
        match &self.splits {
            Some(events) => events.clone(),
            None => known_splits(&self.instrument.symbol),
        }
    }

    /// Switch to another symbol. Explicit splits belong to the previous
    /// symbol and are dropped when the symbol changes.
    pub fn set_symbol(&mut self, symbol: impl Into<String>) {
        let symbol = symbol.into();
        if symbol != self.instrument.symbol {
            self.splits = None;
            self.instrument.symbol = symbol;
        }
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.instrument.symbol.trim().is_empty() {
            return Err(Error::config("instrument.symbol must not be empty"));
        }
        for (name, range) in [("train", &self.dates.train), ("test", &self.dates.test)] {
            if range.start > range.end {
                return Err(Error::config(format!(
                    "dates.{} starts after it ends ({} > {})",
                    name, range.start, range.end
                )));
            }
        }
        if !(0.0..1.0).contains(&self.scaler.buffer_factor) {
            return Err(Error::config(format!(
                "scaler.buffer_factor must be in [0, 1), got {}",
                self.scaler.buffer_factor
            )));
        }
        if !(self.log.epsilon > 0.0) {
            return Err(Error::config("log.epsilon must be positive"));
        }
        if !(self.log.base > 0.0) || self.log.base == 1.0 {
            return Err(Error::config("log.base must be positive and not 1"));
        }
        if self.resample.volatility_bucket_secs <= 0 {
            return Err(Error::config("resample.volatility_bucket_secs must be positive"));
        }
        if self.returns.trading_days_per_year == 0 {
            return Err(Error::config("returns.trading_days_per_year must be positive"));
        }
        if !(self.returns.normality_alpha > 0.0 && self.returns.normality_alpha < 1.0) {
            return Err(Error::config("returns.normality_alpha must be in (0, 1)"));
        }
        Ok(())
    }
}

/// Instrument-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// Ticker symbol (e.g., "NVDA").
    pub symbol: String,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            symbol: "NVDA".to_string(),
        }
    }
}

/// Training and testing windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatesConfig {
    /// Training window; also bounds the split lookup.
    pub train: DateRange,
    /// Testing window.
    pub test: DateRange,
}

impl Default for DatesConfig {
    fn default() -> Self {
        // Constant literals, parse cannot fail.
        let at = |s: &str| parse_instant(s).unwrap_or_default();
        Self {
            train: DateRange::new(
                at("2018-05-02T08:44:39.292059872Z"),
                at("2024-10-21T08:00:00.143369486Z"),
            ),
            test: DateRange::new(
                at("2024-03-07T09:00:00.785957501Z"),
                at("2024-10-21T23:59:51.581176405Z"),
            ),
        }
    }
}

/// Input file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// File extension of tick files in the data directory.
    pub file_extension: String,
    /// Field delimiter.
    pub delimiter: u8,
    /// Skip rows that fail validation instead of failing the whole file.
    pub skip_invalid_rows: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            file_extension: "csv".to_string(),
            delimiter: b',',
            skip_invalid_rows: false,
        }
    }
}

/// Downsampling and volatility resampling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    /// Upper bound on points kept for plotting.
    pub downsample_target_points: usize,
    /// Volatility bucket width in seconds.
    pub volatility_bucket_secs: i64,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            downsample_target_points: 10_000,
            volatility_bucket_secs: 3600,
        }
    }
}

/// Scaler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalerConfig {
    /// Fraction of the price range added on each side before normalizing.
    pub buffer_factor: f64,
    /// Prices round-tripped through a fitted scaler as a sanity check.
    pub probe_prices: Vec<f64>,
    /// Scaled values mapped back to price space as a sanity check.
    pub probe_scaled: Vec<f64>,
}

impl Default for ScalerConfig {
    fn default() -> Self {
        Self {
            buffer_factor: 0.1,
            probe_prices: vec![50.0, 100.0, 150.0],
            probe_scaled: vec![0.5, 1.0],
        }
    }
}

/// Log transform configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Logarithm base.
    pub base: f64,
    /// Floor added before taking the logarithm.
    pub epsilon: f64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base: std::f64::consts::E,
            epsilon: 1e-10,
        }
    }
}

/// Returns analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnsConfig {
    /// Annualized risk-free rate (0.01 = 1%).
    pub risk_free_rate: f64,
    /// Trading days used for annualization.
    pub trading_days_per_year: u32,
    /// Significance level for the normality test.
    pub normality_alpha: f64,
}

impl Default for ReturnsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.01,
            trading_days_per_year: 252,
            normality_alpha: 0.05,
        }
    }
}

/// Built-in split table. Symbols without an entry have no splits.
pub fn known_splits(symbol: &str) -> Vec<SplitEvent> {
    match symbol {
        "NVDA" => default_splits(),
        _ => Vec::new(),
    }
}

/// Splits applied to the default instrument.
pub fn default_splits() -> Vec<SplitEvent> {
    [("2021-07-20T00:00:00Z", 4.0), ("2024-06-10T00:00:00Z", 10.0)]
        .iter()
        .filter_map(|(cutoff, ratio)| {
            parse_instant(cutoff)
                .ok()
                .map(|ts| SplitEvent::new(ts, *ratio))
        })
        .collect()
}
