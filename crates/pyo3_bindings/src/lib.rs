//! PyO3 bindings for the tickprep pipeline.
//!
//! Exposes the Rust implementations to Python:
//! - Split adjustment and daily returns
//! - Returns statistics report
//! - Scaling and log transform
//! - Downsampling and bucketed volatility
//! - The full pipeline over a data directory
//!
//! Timestamps cross the boundary as integer nanoseconds since the Unix epoch.

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use chrono::DateTime;
use tickprep_analytics::{
    daily_returns as rust_daily_returns, Pipeline, PipelineOutput as RustPipelineOutput,
    ReturnsAnalyzer, ReturnsReport,
};
use tickprep_core::config::ReturnsConfig;
use tickprep_core::{
    Config, Error as RustError, PricePoint, PriceSeries, SplitEvent, Timestamp,
};
use tickprep_features::{
    downsample as rust_downsample, periodic_volatility as rust_periodic_volatility,
    LogTransformer as RustLogTransformer, Scaler as RustScaler, SplitAdjuster,
};
use tickprep_ingestion::{StaticSplitSource, TickReader};

// ============================================================================
// Conversions
// ============================================================================

fn to_py_err(e: RustError) -> PyErr {
    match e {
        RustError::Io(_) | RustError::InputNotFound(_) | RustError::FileRead { .. } => {
            PyIOError::new_err(e.to_string())
        }
        _ => PyValueError::new_err(e.to_string()),
    }
}

fn to_ns(ts: Timestamp) -> PyResult<i64> {
    ts.timestamp_nanos_opt()
        .ok_or_else(|| PyValueError::new_err(format!("timestamp {} out of nanosecond range", ts)))
}

fn series_from(ts_ns: &[i64], prices: &[f64]) -> PyResult<PriceSeries> {
    if ts_ns.len() != prices.len() {
        return Err(PyValueError::new_err(format!(
            "timestamps and prices differ in length ({} vs {})",
            ts_ns.len(),
            prices.len()
        )));
    }
    let points = ts_ns
        .iter()
        .zip(prices)
        .map(|(ns, p)| PricePoint::new(DateTime::from_timestamp_nanos(*ns), *p))
        .collect();
    PriceSeries::new(points).map_err(to_py_err)
}

fn series_to(series: &PriceSeries) -> PyResult<(Vec<i64>, Vec<f64>)> {
    let ts = series.iter().map(|p| to_ns(p.ts)).collect::<PyResult<Vec<_>>>()?;
    Ok((ts, series.prices()))
}

fn report_dict<'py>(py: Python<'py>, report: &ReturnsReport) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    for (name, value) in report.entries() {
        dict.set_item(name, value)?;
    }
    dict.set_item("Normal Distribution", report.normality.verdict.to_string())?;
    Ok(dict)
}

// ============================================================================
// Python-exposed Classes
// ============================================================================

/// Buffered min-max scaler.
#[pyclass(name = "Scaler")]
#[derive(Clone, Copy)]
pub struct PyScaler {
    inner: RustScaler,
}

#[pymethods]
impl PyScaler {
    /// Fit on prices with a buffer factor in [0, 1).
    #[staticmethod]
    #[pyo3(signature = (prices, buffer_factor = 0.1))]
    fn fit(prices: Vec<f64>, buffer_factor: f64) -> PyResult<Self> {
        let inner = RustScaler::fit(&prices, buffer_factor).map_err(to_py_err)?;
        Ok(PyScaler { inner })
    }

    /// Buffered domain mapped onto [0, 1].
    #[getter]
    fn domain(&self) -> (f64, f64) {
        self.inner.domain()
    }

    fn forward(&self, price: f64) -> f64 {
        self.inner.forward(price)
    }

    fn inverse(&self, scaled: f64) -> f64 {
        self.inner.inverse(scaled)
    }

    fn transform(&self, prices: Vec<f64>) -> Vec<f64> {
        self.inner.transform(&prices)
    }

    fn inverse_transform(&self, scaled: Vec<f64>) -> Vec<f64> {
        self.inner.inverse_transform(&scaled)
    }

    fn __repr__(&self) -> String {
        let (lo, hi) = self.inner.domain();
        format!("Scaler(lo={:.4}, hi={:.4})", lo, hi)
    }
}

/// Log transform with a positive floor.
#[pyclass(name = "LogTransformer")]
#[derive(Clone, Copy)]
pub struct PyLogTransformer {
    inner: RustLogTransformer,
}

#[pymethods]
impl PyLogTransformer {
    #[new]
    #[pyo3(signature = (base = std::f64::consts::E, epsilon = 1e-10))]
    fn new(base: f64, epsilon: f64) -> PyResult<Self> {
        let inner = RustLogTransformer::new(base, epsilon).map_err(to_py_err)?;
        Ok(PyLogTransformer { inner })
    }

    fn transform(&self, prices: Vec<f64>) -> Vec<f64> {
        self.inner.transform_all(&prices)
    }
}

/// Results of a full pipeline run.
#[pyclass(name = "PipelineOutput")]
pub struct PyPipelineOutput {
    inner: RustPipelineOutput,
}

#[pymethods]
impl PyPipelineOutput {
    /// Unadjusted `(ts_ns, prices)`.
    #[getter]
    fn unadjusted(&self) -> PyResult<(Vec<i64>, Vec<f64>)> {
        series_to(&self.inner.unadjusted)
    }

    /// Split-adjusted `(ts_ns, prices)`.
    #[getter]
    fn adjusted(&self) -> PyResult<(Vec<i64>, Vec<f64>)> {
        series_to(&self.inner.adjusted)
    }

    /// Downsampled adjusted `(ts_ns, prices)` for plotting.
    #[getter]
    fn downsampled(&self) -> PyResult<(Vec<i64>, Vec<f64>)> {
        series_to(&self.inner.downsampled)
    }

    /// Log-transformed adjusted `(ts_ns, values)`.
    #[getter]
    fn log_prices(&self) -> PyResult<(Vec<i64>, Vec<f64>)> {
        series_to(&self.inner.log_prices)
    }

    #[getter]
    fn scaled(&self) -> Vec<f64> {
        self.inner.scaled.clone()
    }

    #[getter]
    fn log_scaled(&self) -> Vec<f64> {
        self.inner.log_scaled.clone()
    }

    #[getter]
    fn scaler(&self) -> PyScaler {
        PyScaler { inner: self.inner.scaler }
    }

    #[getter]
    fn log_scaler(&self) -> PyScaler {
        PyScaler { inner: self.inner.log_scaler }
    }

    /// Bucketed volatility `(bucket_start_ns, stddev)`.
    #[getter]
    fn volatility(&self) -> PyResult<(Vec<i64>, Vec<f64>)> {
        let ts = self.inner.volatility.iter().map(|v| to_ns(v.ts)).collect::<PyResult<_>>()?;
        Ok((ts, self.inner.volatility.iter().map(|v| v.stddev).collect()))
    }

    /// Daily returns as `(iso_date, value)` pairs.
    #[getter]
    fn daily_returns(&self) -> Vec<(String, f64)> {
        self.inner
            .daily
            .returns
            .iter()
            .map(|r| (r.date.to_string(), r.value))
            .collect()
    }

    /// Returns statistics keyed by metric name, `None` without daily returns.
    fn report<'py>(&self, py: Python<'py>) -> PyResult<Option<Bound<'py, PyDict>>> {
        self.inner
            .report
            .as_ref()
            .map(|report| report_dict(py, report))
            .transpose()
    }

    /// Adjusted `(ts_ns, prices)` inside the training window.
    fn train(&self) -> PyResult<(Vec<i64>, Vec<f64>)> {
        series_to(&self.inner.train())
    }

    /// Adjusted `(ts_ns, prices)` inside the testing window.
    fn test(&self) -> PyResult<(Vec<i64>, Vec<f64>)> {
        series_to(&self.inner.test())
    }

    fn __repr__(&self) -> String {
        format!(
            "PipelineOutput(points={}, days={}, buckets={})",
            self.inner.adjusted.len(),
            self.inner.daily.closes.len(),
            self.inner.volatility.len()
        )
    }
}

// ============================================================================
// Python-exposed Functions
// ============================================================================

/// Divide prices by every split whose cutoff is later than the price.
///
/// `splits` is a list of `(cutoff_ns, ratio)`.
#[pyfunction]
fn adjust_for_splits(ts_ns: Vec<i64>, prices: Vec<f64>, splits: Vec<(i64, f64)>) -> PyResult<Vec<f64>> {
    let series = series_from(&ts_ns, &prices)?;
    let events = splits
        .into_iter()
        .map(|(ns, ratio)| SplitEvent::new(DateTime::from_timestamp_nanos(ns), ratio))
        .collect();
    let adjuster = SplitAdjuster::new(events).map_err(to_py_err)?;
    Ok(adjuster.adjust(&series).prices())
}

/// Daily returns as `(iso_date, value)` pairs.
#[pyfunction]
fn daily_returns(ts_ns: Vec<i64>, prices: Vec<f64>) -> PyResult<Vec<(String, f64)>> {
    let series = series_from(&ts_ns, &prices)?;
    Ok(rust_daily_returns(&series)
        .returns
        .into_iter()
        .map(|r| (r.date.to_string(), r.value))
        .collect())
}

/// Statistics report over daily return values.
#[pyfunction]
#[pyo3(signature = (returns, risk_free_rate = 0.01, normality_alpha = 0.05))]
fn analyze_returns<'py>(
    py: Python<'py>,
    returns: Vec<f64>,
    risk_free_rate: f64,
    normality_alpha: f64,
) -> PyResult<Bound<'py, PyDict>> {
    let config = ReturnsConfig {
        risk_free_rate,
        normality_alpha,
        ..ReturnsConfig::default()
    };
    let report = ReturnsAnalyzer::new(config)
        .analyze_values(&returns)
        .map_err(to_py_err)?;
    report_dict(py, &report)
}

/// Every k-th value, starting at the first, with k = max(1, len / target).
#[pyfunction]
fn downsample(values: Vec<f64>, target: usize) -> Vec<f64> {
    rust_downsample(&values, target)
}

/// Sample standard deviation per time bucket as `(bucket_start_ns, stddev)`.
#[pyfunction]
#[pyo3(signature = (ts_ns, prices, bucket_secs = 3600))]
fn periodic_volatility(ts_ns: Vec<i64>, prices: Vec<f64>, bucket_secs: i64) -> PyResult<(Vec<i64>, Vec<f64>)> {
    let series = series_from(&ts_ns, &prices)?;
    let points = rust_periodic_volatility(&series, bucket_secs).map_err(to_py_err)?;
    let ts = points.iter().map(|v| to_ns(v.ts)).collect::<PyResult<_>>()?;
    Ok((ts, points.iter().map(|v| v.stddev).collect()))
}

/// Run the full pipeline over a directory of tick files.
///
/// `config_json` overrides defaults. Splits come from its `splits` list, or
/// from the built-in table for its symbol when the list is absent. `symbol`
/// replaces the configured symbol and drops splits listed for another one.
#[pyfunction]
#[pyo3(signature = (data_dir, config_json = None, symbol = None))]
fn run_pipeline(
    data_dir: &str,
    config_json: Option<&str>,
    symbol: Option<&str>,
) -> PyResult<PyPipelineOutput> {
    let mut config = match config_json {
        Some(json) => Config::from_json_str(json).map_err(to_py_err)?,
        None => Config::default(),
    };
    if let Some(symbol) = symbol {
        config.set_symbol(symbol);
    }
    let ingest = TickReader::new(config.ingest.clone())
        .read_directory(data_dir)
        .map_err(to_py_err)?;
    let splits =
        StaticSplitSource::new().with_splits(config.instrument.symbol.clone(), config.split_events());
    let inner = Pipeline::new(config)
        .and_then(|p| p.run(&ingest.records, &splits))
        .map_err(to_py_err)?;
    Ok(PyPipelineOutput { inner })
}

// ============================================================================
// Module Definition
// ============================================================================

/// tickprep - Rust price preparation components for Python.
#[pymodule]
fn tickprep(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Classes
    m.add_class::<PyScaler>()?;
    m.add_class::<PyLogTransformer>()?;
    m.add_class::<PyPipelineOutput>()?;

    // Functions
    m.add_function(wrap_pyfunction!(adjust_for_splits, m)?)?;
    m.add_function(wrap_pyfunction!(daily_returns, m)?)?;
    m.add_function(wrap_pyfunction!(analyze_returns, m)?)?;
    m.add_function(wrap_pyfunction!(downsample, m)?)?;
    m.add_function(wrap_pyfunction!(periodic_volatility, m)?)?;
    m.add_function(wrap_pyfunction!(run_pipeline, m)?)?;

    Ok(())
}
