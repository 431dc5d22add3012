//! Indicators — memoized per-index derived values over a candle series.
//!
//! An indicator is a pure function of the series contents at indices at or
//! below the requested one; `CachedIndicator` memoizes it through the cache
//! the series hands out for the indicator's key. Concrete indicators live in
//! this module's submodules and share the `<name>_<period>` key convention.

pub mod atr;
pub mod ema;
pub mod roc;
pub mod sma;

pub use atr::Atr;
pub use ema::Ema;
pub use roc::Roc;
pub use sma::Sma;

use std::sync::Arc;

use crate::series::{CandleSeries, IndicatorCache, SeriesError};

/// A per-index computed value over a candle series.
///
/// # Look-ahead guard
/// `calculate` at index `t` must not read candles at `t + 1` or later — the
/// replay simulator depends on this to keep history honest.
///
/// `prev` is this indicator's own memoized value at `index - 1` when the
/// cache holds one. Recursive indicators may advance from it in O(1); every
/// implementation must still produce the same value from the series alone
/// when `prev` is absent.
pub trait Indicator {
    type Output: Clone + Send + 'static;

    /// Cache key on the series; `None` keeps the memo private to this
    /// instance. Instances sharing a key on one series share one cache.
    fn key(&self) -> Option<&str>;

    fn calculate(
        &self,
        series: &CandleSeries,
        index: usize,
        prev: Option<&Self::Output>,
    ) -> Result<Self::Output, SeriesError>;
}

/// An indicator bound to the cache its series hands out for its key.
///
/// The cache is fetched once at construction; using the wrapper with a
/// different series than the one it was built on misaligns the memo.
pub struct CachedIndicator<I: Indicator> {
    indicator: I,
    cache: Arc<IndicatorCache<I::Output>>,
}

impl<I: Indicator> CachedIndicator<I> {
    /// Bind to the cache for `indicator.key()` on `series`.
    pub fn new(series: &CandleSeries, indicator: I) -> Self {
        let cache = series.indicator_cache(indicator.key());
        Self { indicator, cache }
    }

    /// Bind to a fresh unshared cache regardless of the indicator's key.
    pub fn with_private_cache(series: &CandleSeries, indicator: I) -> Self {
        let cache = series.indicator_cache(None);
        Self { indicator, cache }
    }

    /// Memoized value at `index`: cached if present, computed and stored
    /// otherwise. At most one stored value per index between
    /// cache-invalidating mutations.
    pub fn get(&self, series: &CandleSeries, index: usize) -> Result<I::Output, SeriesError> {
        let len = series.len();
        if index >= len {
            return Err(SeriesError::IndexOutOfRange { index, len });
        }
        if let Some(value) = self.cache.get(index) {
            return Ok(value);
        }
        let prev = if index > 0 { self.cache.get(index - 1) } else { None };
        let value = self.indicator.calculate(series, index, prev.as_ref())?;
        self.cache.set(index, value.clone());
        Ok(value)
    }

    /// `get` mapped over the inclusive range in ascending order, so
    /// recursive indicators see their lower indices filled first.
    pub fn get_range(
        &self,
        series: &CandleSeries,
        from: usize,
        to_inclusive: usize,
    ) -> Result<Vec<I::Output>, SeriesError> {
        if from > to_inclusive {
            return Ok(Vec::new());
        }
        let mut values = Vec::with_capacity(to_inclusive - from + 1);
        for index in from..=to_inclusive {
            values.push(self.get(series, index)?);
        }
        Ok(values)
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    pub fn cache(&self) -> &Arc<IndicatorCache<I::Output>> {
        &self.cache
    }
}

/// Create a series from close prices for testing.
///
/// Generates plausible OHLV: open = prev close (or close for the first
/// candle), high = max(open, close) + 1, low = min(open, close) - 1.
#[cfg(test)]
pub(crate) fn make_series(closes: &[rust_decimal::Decimal]) -> CandleSeries {
    use crate::domain::{Candle, Timeframe};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                time: base + Timeframe::M1.duration() * i as i32,
                open,
                high: open.max(close) + dec!(1),
                low: open.min(close) - dec!(1),
                close,
                volume: dec!(1000),
            }
        })
        .collect();
    CandleSeries::from_candles(Timeframe::M1, candles).unwrap()
}
