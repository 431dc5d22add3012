//! Trade — a closed round-trip as recorded by the journal.
//!
//! The trade store (persistence layer) supplies these ordered by entry time;
//! open positions are filtered out before they reach the stats engine.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Journal-assigned trade identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TradeId(pub u64);

/// A closed trade: gross and net outcome plus its time span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    /// Gross profit and loss.
    pub pnl: Decimal,
    /// Profit and loss after fees.
    pub pnl_net: Decimal,
    pub fees: Decimal,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
}

impl Trade {
    /// Time the position was held.
    pub fn duration(&self) -> Duration {
        self.exit_time - self.entry_time
    }

    pub fn is_winner(&self) -> bool {
        self.pnl_net > Decimal::ZERO
    }
}
