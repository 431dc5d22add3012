//! Simple Moving Average (SMA).
//!
//! Mean of the last `period` closes. Warmup: the first `period - 1` indices
//! have no value.

use rust_decimal::Decimal;

use super::Indicator;
use crate::series::{CandleSeries, SeriesError};

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    key: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            key: format!("sma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    type Output = Option<Decimal>;

    fn key(&self) -> Option<&str> {
        Some(&self.key)
    }

    fn calculate(
        &self,
        series: &CandleSeries,
        index: usize,
        _prev: Option<&Self::Output>,
    ) -> Result<Self::Output, SeriesError> {
        if index + 1 < self.period {
            return Ok(None);
        }
        let mut sum = Decimal::ZERO;
        for i in (index + 1 - self.period)..=index {
            sum += series.get(i)?.close;
        }
        Ok(series.math_context().mean(sum, self.period))
    }
}
