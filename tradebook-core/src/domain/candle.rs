//! Candle — the fundamental market data unit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::MathContext;

/// OHLCV bar for a single time bucket.
///
/// All price and volume figures are exact decimals. A candle is a value:
/// series mutations replace candles wholesale, they never edit one in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    /// Bucket open instant.
    pub time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// A candle that violates the OHLC ordering invariant.
///
/// Rejected at the series boundary before any part of the mutation applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CandleError {
    #[error("low {low} is above min(open, close) {body_low}")]
    LowAboveBody { low: Decimal, body_low: Decimal },

    #[error("high {high} is below max(open, close) {body_high}")]
    HighBelowBody { high: Decimal, body_high: Decimal },

    #[error("negative volume {volume}")]
    NegativeVolume { volume: Decimal },
}

impl Candle {
    /// Build a candle, rejecting one that violates the OHLC invariant.
    pub fn new(
        time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Result<Self, CandleError> {
        let candle = Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        };
        candle.validate()?;
        Ok(candle)
    }

    /// Check `low <= min(open, close) <= max(open, close) <= high` and
    /// `volume >= 0`.
    pub fn validate(&self) -> Result<(), CandleError> {
        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);
        if self.low > body_low {
            return Err(CandleError::LowAboveBody {
                low: self.low,
                body_low,
            });
        }
        if self.high < body_high {
            return Err(CandleError::HighBelowBody {
                high: self.high,
                body_high,
            });
        }
        if self.volume < Decimal::ZERO {
            return Err(CandleError::NegativeVolume {
                volume: self.volume,
            });
        }
        Ok(())
    }

    /// `close > open`. A flat candle is not bullish.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Absolute open-to-close distance.
    pub fn body(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    /// High-to-low distance.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self, ctx: &MathContext) -> Decimal {
        ctx.round((self.high + self.low + self.close) / Decimal::from(3u64))
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: Decimal) -> Decimal {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}
