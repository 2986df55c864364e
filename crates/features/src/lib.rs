//! Price-series transforms for the tickprep pipeline.
//!
//! This crate handles:
//! - Split adjustment of historical prices
//! - Buffered min-max scaling with an exact inverse
//! - Log transform with a numerical floor
//! - Plot downsampling and bucketed volatility

pub mod split_adjuster;
pub mod scaler;
pub mod log_transform;
pub mod resample;

pub use split_adjuster::SplitAdjuster;
pub use scaler::Scaler;
pub use log_transform::LogTransformer;
pub use resample::{downsample, downsample_series, periodic_volatility};
