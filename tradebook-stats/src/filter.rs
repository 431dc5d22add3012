//! Predicate keys for partial (filtered) aggregations.

use std::fmt;

use tradebook_core::domain::Trade;

/// A named trade predicate.
///
/// The stats engine runs one level of filtering: each filter's matching
/// subset gets its own full `TradingStats`, keyed by the filter's name.
/// Predicates do not nest.
pub struct StatsFilter {
    key: String,
    predicate: Box<dyn Fn(&Trade) -> bool + Send + Sync>,
}

impl StatsFilter {
    pub fn new(
        key: impl Into<String>,
        predicate: impl Fn(&Trade) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            predicate: Box::new(predicate),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        (self.predicate)(trade)
    }
}

impl fmt::Debug for StatsFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsFilter")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use tradebook_core::domain::TradeId;

    #[test]
    fn filter_applies_its_predicate() {
        let filter = StatsFilter::new("winners", Trade::is_winner);
        let time = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let trade = Trade {
            id: TradeId(1),
            pnl: dec!(10),
            pnl_net: dec!(9),
            fees: dec!(1),
            entry_time: time,
            exit_time: time,
        };
        assert_eq!(filter.key(), "winners");
        assert!(filter.matches(&trade));
    }
}
