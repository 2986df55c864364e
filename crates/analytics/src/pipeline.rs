//! End-to-end preparation pipeline.
//!
//! Runs the stages in order, each on a fully materialized input:
//! ticks -> split adjustment -> {returns report, downsampling, volatility,
//! scaling, log transform}.

use crate::report::{ReturnsAnalyzer, ReturnsReport};
use crate::returns::{daily_returns, DailyReturns};
use tickprep_core::{Config, DateRange, PriceSeries, Result, TickRecord, VolatilityPoint};
use tickprep_features::{
    downsample_series, periodic_volatility, LogTransformer, Scaler, SplitAdjuster,
};
use tickprep_ingestion::{resolve_splits, SplitSource};
use tracing::{debug, info, warn};

/// Everything the pipeline produces for downstream consumers.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Prices as recorded, in chronological order.
    pub unadjusted: PriceSeries,
    /// Split-adjusted prices.
    pub adjusted: PriceSeries,
    /// Adjusted prices thinned for plotting.
    pub downsampled: PriceSeries,
    pub daily: DailyReturns,
    /// Returns statistics, `None` when the data has no defined daily return.
    pub report: Option<ReturnsReport>,
    /// Bucketed volatility of adjusted prices.
    pub volatility: Vec<VolatilityPoint>,
    /// Scaler fitted on adjusted prices.
    pub scaler: Scaler,
    /// Adjusted prices scaled by `scaler`.
    pub scaled: Vec<f64>,
    /// Log-transformed adjusted prices.
    pub log_prices: PriceSeries,
    /// Bucketed volatility of log prices.
    pub log_volatility: Vec<VolatilityPoint>,
    /// Scaler fitted on log prices, independent of `scaler`.
    pub log_scaler: Scaler,
    /// Log prices scaled by `log_scaler`.
    pub log_scaled: Vec<f64>,
    dates: (DateRange, DateRange),
}

impl PipelineOutput {
    /// Adjusted prices inside `range`.
    pub fn window(&self, range: &DateRange) -> PriceSeries {
        self.adjusted.between(range.start, range.end)
    }

    /// Adjusted prices inside the configured training window.
    pub fn train(&self) -> PriceSeries {
        self.window(&self.dates.0)
    }

    /// Adjusted prices inside the configured testing window.
    pub fn test(&self) -> PriceSeries {
        self.window(&self.dates.1)
    }
}

/// Preparation pipeline bound to one configuration.
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    /// Create a pipeline, validating the configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every stage over `ticks` with splits looked up from `splits`.
    ///
    /// The ticks must be raw (unadjusted) prices. A returns analysis failure
    /// leaves `report` empty; the other stages still run.
    pub fn run(&self, ticks: &[TickRecord], splits: &dyn SplitSource) -> Result<PipelineOutput> {
        let config = &self.config;

        let unadjusted = PriceSeries::from_ticks(ticks);
        if let (Some(first), Some(last)) = (unadjusted.first(), unadjusted.last()) {
            info!(points = unadjusted.len(), "Time range: {} to {}", first.ts, last.ts);
        }

        let train = &config.dates.train;
        let events = resolve_splits(splits, &config.instrument.symbol, train.start, train.end);
        let adjuster = SplitAdjuster::new(events)?;
        let adjusted = adjuster.adjust(&unadjusted);

        let daily = daily_returns(&adjusted);
        let report = match ReturnsAnalyzer::new(config.returns.clone()).analyze(&daily) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Skipping returns report: {}", e);
                None
            }
        };
        if let Some((lo, hi)) = daily.range() {
            info!("Daily returns range: {:.2}% to {:.2}%", lo * 100.0, hi * 100.0);
        }

        let downsampled = downsample_series(&adjusted, config.resample.downsample_target_points);
        let volatility = periodic_volatility(&adjusted, config.resample.volatility_bucket_secs)?;

        let scaler = Scaler::fit_series(&adjusted, config.scaler.buffer_factor)?;
        let scaled = scaler.transform_series(&adjusted);
        self.probe(&scaler);

        let log = LogTransformer::new(config.log.base, config.log.epsilon)?;
        let log_prices = log.transform_series(&adjusted);
        let log_volatility = periodic_volatility(&log_prices, config.resample.volatility_bucket_secs)?;
        let log_scaler = Scaler::fit_series(&log_prices, config.scaler.buffer_factor)?;
        let log_scaled = log_scaler.transform_series(&log_prices);

        info!(
            points = adjusted.len(),
            days = daily.closes.len(),
            buckets = volatility.len(),
            plotted = downsampled.len(),
            "Pipeline complete"
        );

        Ok(PipelineOutput {
            unadjusted,
            adjusted,
            downsampled,
            daily,
            report,
            volatility,
            scaler,
            scaled,
            log_prices,
            log_volatility,
            log_scaler,
            log_scaled,
            dates: (config.dates.train, config.dates.test),
        })
    }

    /// Log configured probe points through a fitted scaler.
    fn probe(&self, scaler: &Scaler) {
        for &s in &self.config.scaler.probe_scaled {
            debug!("Scaled {:.4} -> price {:.4}", s, scaler.inverse(s));
        }
        for &p in &self.config.scaler.probe_prices {
            let s = scaler.forward(p);
            debug!("Price {:.2} -> scaled {:.4} -> restored {:.2}", p, s, scaler.inverse(s));
        }
    }
}
