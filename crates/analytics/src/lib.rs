//! Returns analytics and pipeline orchestration for tickprep.
//!
//! This crate provides:
//! - Daily close and return computation
//! - Descriptive statistics and risk metrics
//! - Jarque-Bera normality testing
//! - The end-to-end preparation pipeline

pub mod returns;
pub mod statistics;
pub mod report;
pub mod pipeline;

pub use returns::{daily_returns, DailyClose, DailyReturn, DailyReturns};
pub use statistics::{DescriptiveStats, JarqueBera, NormalityVerdict, RiskMetrics};
pub use report::{analyze_returns, ReturnsAnalyzer, ReturnsReport};
pub use pipeline::{Pipeline, PipelineOutput};
