//! Corporate-action (split) reference data.

use std::collections::HashMap;
use tickprep_core::{Result, SplitEvent, Timestamp};
use tracing::{info, warn};

/// Source of split events for a symbol.
pub trait SplitSource {
    /// Splits for `symbol` with cutoff in `[start, end]`.
    ///
    /// A symbol without data yields an empty list, not an error.
    fn splits(&self, symbol: &str, start: Timestamp, end: Timestamp) -> Result<Vec<SplitEvent>>;
}

/// In-memory split table keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct StaticSplitSource {
    table: HashMap<String, Vec<SplitEvent>>,
}

impl StaticSplitSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register splits for `symbol`, replacing any previous entry.
    pub fn with_splits(mut self, symbol: impl Into<String>, mut events: Vec<SplitEvent>) -> Self {
        events.sort_by_key(|e| e.cutoff);
        self.table.insert(symbol.into(), events);
        self
    }
}

impl SplitSource for StaticSplitSource {
    fn splits(&self, symbol: &str, start: Timestamp, end: Timestamp) -> Result<Vec<SplitEvent>> {
        Ok(self
            .table
            .get(symbol)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| start <= e.cutoff && e.cutoff <= end)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Look up splits, substituting an empty set when the source fails.
pub fn resolve_splits(
    source: &dyn SplitSource,
    symbol: &str,
    start: Timestamp,
    end: Timestamp,
) -> Vec<SplitEvent> {
    match source.splits(symbol, start, end) {
        Ok(events) => {
            if events.is_empty() {
                info!("No stock splits found for {}", symbol);
            }
            for e in &events {
                info!("Split on {}: {}:1 ratio", e.cutoff.date_naive(), e.ratio);
            }
            events
        }
        Err(e) => {
            warn!("Error fetching split data for {}: {}; continuing without adjustment", symbol, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tickprep_core::Error;

    fn day(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn nvda() -> StaticSplitSource {
        StaticSplitSource::new().with_splits(
            "NVDA",
            vec![SplitEvent::new(day(2024, 6, 10), 10.0), SplitEvent::new(day(2021, 7, 20), 4.0)],
        )
    }

    struct Unavailable;

    impl SplitSource for Unavailable {
        fn splits(&self, _: &str, _: Timestamp, _: Timestamp) -> Result<Vec<SplitEvent>> {
            Err(Error::reference_lookup("service unavailable"))
        }
    }

    #[test]
    fn test_filters_by_range() {
        let source = nvda();
        let all = source.splits("NVDA", day(2018, 1, 1), day(2025, 1, 1)).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].ratio, 4.0);

        let early = source.splits("NVDA", day(2018, 1, 1), day(2022, 1, 1)).unwrap();
        assert_eq!(early, vec![SplitEvent::new(day(2021, 7, 20), 4.0)]);
    }

    #[test]
    fn test_unknown_symbol_is_empty() {
        let events = nvda().splits("MSFT", day(2018, 1, 1), day(2025, 1, 1)).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_lookup_failure_falls_back_to_empty() {
        let events = resolve_splits(&Unavailable, "NVDA", day(2018, 1, 1), day(2025, 1, 1));
        assert!(events.is_empty());
    }

    #[test]
    fn test_resolve_passes_events_through() {
        let events = resolve_splits(&nvda(), "NVDA", day(2018, 1, 1), day(2025, 1, 1));
        assert_eq!(events.len(), 2);
    }
}
