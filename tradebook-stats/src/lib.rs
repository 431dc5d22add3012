//! Tradebook Stats — trade performance aggregation.
//!
//! Pure, synchronous computations over an immutable closed-trade list:
//! summary statistics, win/loss buckets, the drawdown timeline, and
//! predicate-filtered partial aggregations. Every money figure goes through
//! the journal's shared decimal context; empty aggregations come back as
//! `None`, never as errors or zero-filled stand-ins.

pub mod drawdown;
pub mod filter;
pub mod stats;

pub use drawdown::Drawdown;
pub use filter::StatsFilter;
pub use stats::{BucketStats, TradingStats};

/// Serde adapter: `chrono::Duration` as whole milliseconds.
pub(crate) mod serde_duration {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::milliseconds(i64::deserialize(deserializer)?))
    }
}

/// Serde adapter: optional `chrono::Duration` as whole milliseconds.
pub(crate) mod serde_opt_duration {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.num_milliseconds()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<i64>::deserialize(deserializer)?.map(Duration::milliseconds))
    }
}
