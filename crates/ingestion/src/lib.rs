//! Data ingestion for the tickprep pipeline.
//!
//! This crate handles:
//! - Reading delimited tick files into typed records
//! - Per-file error recovery across a data directory
//! - Corporate-action (split) lookup with empty-set fallback

pub mod reader;
pub mod splits;

pub use reader::{FileFailure, IngestReport, TickReader};
pub use splits::{resolve_splits, SplitSource, StaticSplitSource};
