//! Average True Range (ATR).
//!
//! True range needs a previous close, so TR starts at index 1. The seed at
//! index `period` is the mean of TR[1..=period]; later values use Wilder
//! smoothing: ATR[t] = (ATR[t-1] * (period - 1) + TR[t]) / period.

use rust_decimal::Decimal;

use super::Indicator;
use crate::series::{CandleSeries, SeriesError};

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    key: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            key: format!("atr_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    fn true_range_at(series: &CandleSeries, index: usize) -> Result<Decimal, SeriesError> {
        let prev_close = series.get(index - 1)?.close;
        Ok(series.get(index)?.true_range(prev_close))
    }
}

impl Indicator for Atr {
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
        if index < self.period {
            return Ok(None);
        }
        let ctx = series.math_context();
        let period = Decimal::from(self.period as u64);
        let period_minus_1 = period - Decimal::ONE;

        if let Some(&Some(prev_atr)) = prev {
            let tr = Self::true_range_at(series, index)?;
            return Ok(Some(ctx.round((prev_atr * period_minus_1 + tr) / period)));
        }

        let mut sum = Decimal::ZERO;
        for i in 1..=self.period {
            sum += Self::true_range_at(series, i)?;
        }
        let mut atr = match ctx.mean(sum, self.period) {
            Some(seed) => seed,
            None => return Ok(None),
        };
        for i in (self.period + 1)..=index {
            let tr = Self::true_range_at(series, i)?;
            atr = ctx.round((atr * period_minus_1 + tr) / period);
        }
        Ok(Some(atr))
    }
}
