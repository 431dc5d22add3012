//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], with
//! alpha = 2 / (period + 1). Seed: EMA[period-1] = SMA of the first
//! `period` closes. Each step is rounded through the series context, so the
//! sequential-fill path and the cold recompute path agree bit for bit.

use rust_decimal::Decimal;

use super::Indicator;
use crate::series::{CandleSeries, SeriesError};

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    key: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            key: format!("ema_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    fn alpha(&self) -> Decimal {
        Decimal::from(2u64) / Decimal::from(self.period as u64 + 1)
    }
}

impl Indicator for Ema {
    type Output = Option<Decimal>;

    fn key(&self) -> Option<&str> {
        Some(&self.key)
    }

    fn calculate(
        &self,
        series: &CandleSeries,
        index: usize,
        prev: Option<&Self::Output>,
    ) -> Result<Self::Output, SeriesError> {
        if index + 1 < self.period {
            return Ok(None);
        }
        let ctx = series.math_context();
        let alpha = self.alpha();
        let one_minus_alpha = Decimal::ONE - alpha;

        // Sequential fill: advance from the memoized previous value.
        if let Some(&Some(prev_ema)) = prev {
            let close = series.get(index)?.close;
            return Ok(Some(ctx.round(alpha * close + one_minus_alpha * prev_ema)));
        }

        // Cold start: seed at index period-1, then walk forward.
        let mut sum = Decimal::ZERO;
        for i in 0..self.period {
            sum += series.get(i)?.close;
        }
        let mut ema = match ctx.mean(sum, self.period) {
            Some(seed) => seed,
            None => return Ok(None),
        };
        for i in self.period..=index {
            let close = series.get(i)?.close;
            ema = ctx.round(alpha * close + one_minus_alpha * ema);
        }
        Ok(Some(ema))
    }
}
