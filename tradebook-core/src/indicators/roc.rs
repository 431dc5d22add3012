//! Rate of Change (ROC).
//!
//! Fractional change over `period` candles:
//! ROC[t] = (close[t] - close[t-period]) / close[t-period].

use rust_decimal::Decimal;

use super::Indicator;
use crate::series::{CandleSeries, SeriesError};

#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
    key: String,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ROC period must be >= 1");
        Self {
            period,
            key: format!("roc_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Roc {
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
        if index < self.period {
            return Ok(None);
        }
        let past = series.get(index - self.period)?.close;
        let current = series.get(index)?.close;
        // A zero reference price yields no value rather than a division error.
        Ok(series.math_context().div(current - past, past))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{make_series, CachedIndicator};
    use rust_decimal_macros::dec;

    #[test]
    fn roc_known_values() {
        let series = make_series(&[dec!(100), dec!(110), dec!(99)]);
        let roc = CachedIndicator::new(&series, Roc::new(1));

        assert_eq!(roc.get(&series, 0).unwrap(), None);
        assert_eq!(roc.get(&series, 1).unwrap(), Some(dec!(0.1)));
        assert_eq!(roc.get(&series, 2).unwrap(), Some(dec!(-0.1)));
    }

    #[test]
    fn roc_longer_period() {
        let series = make_series(&[dec!(50), dec!(60), dec!(75)]);
        let roc = CachedIndicator::new(&series, Roc::new(2));
        assert_eq!(roc.get(&series, 2).unwrap(), Some(dec!(0.5)));
    }
}
