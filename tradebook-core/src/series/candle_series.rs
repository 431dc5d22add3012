//! CandleSeries — the authoritative, mutating, time-ordered OHLCV sequence.
//!
//! Exactly one ingestion path (live feed or replay driver) mutates a series;
//! indicators and aggregations read it. Mutations take `&mut self`, so a
//! structural change and its cache realignment land as one atomic step
//! before any reader can observe the new size or time span.

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::ops::Range;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, Weak};

use thiserror::Error;

use super::events::{EventHub, InstantRange, LiveUpdate, Modification};
use super::indicator_cache::{CacheRealign, IndicatorCache};
use crate::domain::{Candle, CandleError, Timeframe};
use crate::math::MathContext;

/// Structured error types for series access and mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    /// A caller bug: indices are dense in `[0, len)` at all times.
    #[error("index {index} out of range for series of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The ingested candle violates the OHLC invariant; nothing was applied.
    #[error("rejected candle: {0}")]
    InvalidCandle(#[from] CandleError),
}

/// A keyed cache is held under two views of the same allocation: the typed
/// view handed to indicators and the erased view the mutation bookkeeping
/// drives.
struct KeyedCache {
    typed: Arc<dyn Any + Send + Sync>,
    realign: Arc<dyn CacheRealign>,
}

#[derive(Default)]
struct CacheRegistry {
    keyed: Mutex<HashMap<String, KeyedCache>>,
    /// Unkeyed caches are owned by their indicator; the series only keeps a
    /// weak realignment handle and forgets them once the indicator is gone.
    private: Mutex<Vec<Weak<dyn CacheRealign>>>,
}

impl CacheRegistry {
    fn for_each(&self, apply: impl Fn(&dyn CacheRealign)) {
        for entry in self.keyed.lock().unwrap().values() {
            apply(entry.realign.as_ref());
        }
        self.private
            .lock()
            .unwrap()
            .retain(|weak| match weak.upgrade() {
                Some(cache) => {
                    apply(cache.as_ref());
                    true
                }
                None => false,
            });
    }
}

/// Mutable, positionally indexed candle sequence with per-key indicator
/// caches and event streams for live updates, structural modifications,
/// and the covering time span.
pub struct CandleSeries {
    timeframe: Timeframe,
    ctx: MathContext,
    candles: VecDeque<Candle>,
    caches: CacheRegistry,
    live_hub: EventHub<LiveUpdate>,
    modification_hub: EventHub<Modification>,
    range_hub: EventHub<Option<InstantRange>>,
}

impl CandleSeries {
    /// Empty series with the default math context.
    pub fn new(timeframe: Timeframe) -> Self {
        Self::with_context(timeframe, MathContext::default())
    }

    pub fn with_context(timeframe: Timeframe, ctx: MathContext) -> Self {
        Self {
            timeframe,
            ctx,
            candles: VecDeque::new(),
            caches: CacheRegistry::default(),
            live_hub: EventHub::new(),
            modification_hub: EventHub::new(),
            range_hub: EventHub::new(),
        }
    }

    /// Pre-seeded series. Every candle is validated; the first invalid one
    /// rejects the whole construction.
    pub fn from_candles(
        timeframe: Timeframe,
        candles: Vec<Candle>,
    ) -> Result<Self, SeriesError> {
        for candle in &candles {
            candle.validate()?;
        }
        let mut series = Self::new(timeframe);
        series.candles = candles.into();
        Ok(series)
    }

    // ── Read access ──────────────────────────────────────────────────

    /// Random access; indices run 0 (oldest) to `len() - 1` (newest).
    pub fn get(&self, index: usize) -> Result<&Candle, SeriesError> {
        self.candles.get(index).ok_or(SeriesError::IndexOutOfRange {
            index,
            len: self.candles.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.front()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn math_context(&self) -> &MathContext {
        &self.ctx
    }

    /// Covering time span: first bucket open through the end of the newest
    /// bucket. `None` while the series is empty.
    pub fn instant_range(&self) -> Option<InstantRange> {
        let first = self.candles.front()?;
        let last = self.candles.back()?;
        Some(InstantRange {
            start: first.time,
            end: last.time + self.timeframe.duration(),
        })
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// One event per `append`/`update_last`, in mutation order, from the
    /// point of subscription onward.
    pub fn subscribe_live(&self) -> Receiver<LiveUpdate> {
        self.live_hub.subscribe()
    }

    /// One event per structural mutation (trim, splice, clear).
    pub fn subscribe_modifications(&self) -> Receiver<Modification> {
        self.modification_hub.subscribe()
    }

    /// The covering span after every mutation, exactly once per mutation.
    pub fn subscribe_instant_range(&self) -> Receiver<Option<InstantRange>> {
        self.range_hub.subscribe()
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Add a new newest candle. The feed contract is non-decreasing candle
    /// times; backfills go through `splice` instead.
    pub fn append(&mut self, candle: Candle) -> Result<(), SeriesError> {
        candle.validate()?;
        self.candles.push_back(candle.clone());
        let index = self.candles.len() - 1;
        self.live_hub.emit(LiveUpdate { index, candle });
        self.emit_instant_range();
        Ok(())
    }

    /// Replace the newest candle in place (a still-forming bar). Emits the
    /// live event with the unchanged index. Calling this on an empty series
    /// is the same caller bug as an out-of-range read.
    pub fn update_last(&mut self, candle: Candle) -> Result<(), SeriesError> {
        candle.validate()?;
        let len = self.candles.len();
        let slot = self
            .candles
            .back_mut()
            .ok_or(SeriesError::IndexOutOfRange { index: 0, len: 0 })?;
        *slot = candle.clone();
        self.live_hub.emit(LiveUpdate {
            index: len - 1,
            candle,
        });
        self.emit_instant_range();
        Ok(())
    }

    /// Evict the `n` oldest candles; `n` is clamped to the available size.
    /// Every cache shifts by the same amount, so surviving entries keep
    /// pointing at the candles they were computed from.
    pub fn trim_front(&mut self, n: usize) {
        let n = n.min(self.candles.len());
        if n == 0 {
            return;
        }
        self.candles.drain(..n);
        self.caches.for_each(|cache| cache.remove_first(n));
        self.modification_hub.emit(Modification {
            invalidated: Some(0..n),
            inserted: None,
        });
        self.emit_instant_range();
    }

    /// Evict the `n` newest candles; `n` is clamped to the available size.
    pub fn trim_back(&mut self, n: usize) {
        let len = self.candles.len();
        let n = n.min(len);
        if n == 0 {
            return;
        }
        self.candles.truncate(len - n);
        self.caches.for_each(|cache| cache.remove_last(n));
        self.modification_hub.emit(Modification {
            invalidated: Some(len - n..len),
            inserted: None,
        });
        self.emit_instant_range();
    }

    /// Replace the sub-range `range` with `candles` (backfill, gap repair).
    ///
    /// All replacement candles are validated before anything is applied; the
    /// range is clamped to the current size. Caches are truncated from
    /// `range.start` upward — entries below the splice stay valid because an
    /// indicator value only depends on indices at or below its own.
    pub fn splice(
        &mut self,
        range: Range<usize>,
        candles: Vec<Candle>,
    ) -> Result<(), SeriesError> {
        for candle in &candles {
            candle.validate()?;
        }
        let len = self.candles.len();
        let start = range.start.min(len);
        let end = range.end.min(len).max(start);
        let inserted_len = candles.len();
        if start == end && inserted_len == 0 {
            return Ok(());
        }

        let tail = self.candles.split_off(end);
        self.candles.truncate(start);
        self.candles.extend(candles);
        self.candles.extend(tail);

        self.caches.for_each(|cache| cache.truncate_from(start));
        self.modification_hub.emit(Modification {
            invalidated: (start < end).then_some(start..end),
            inserted: (inserted_len > 0).then_some(start..start + inserted_len),
        });
        self.emit_instant_range();
        Ok(())
    }

    /// Reset the series: drop every candle and clear (not shift) every cache.
    pub fn clear(&mut self) {
        let len = self.candles.len();
        if len == 0 {
            return;
        }
        self.candles.clear();
        self.caches.for_each(|cache| cache.clear());
        self.modification_hub.emit(Modification {
            invalidated: Some(0..len),
            inserted: None,
        });
        self.emit_instant_range();
    }

    // ── Indicator caches ─────────────────────────────────────────────

    /// The cache for `key` on this series, created on first request.
    ///
    /// Repeated calls with the same non-`None` key return the same instance.
    /// A `None` key always mints a fresh cache private to the caller; the
    /// series keeps only a realignment handle to it.
    ///
    /// # Panics
    ///
    /// Requesting an existing key at a different value type is a caller bug
    /// and panics rather than silently minting a second cache for the key.
    pub fn indicator_cache<T>(&self, key: Option<&str>) -> Arc<IndicatorCache<T>>
    where
        T: Clone + Send + 'static,
    {
        match key {
            None => {
                let cache = Arc::new(IndicatorCache::<T>::new());
                let realign: Arc<dyn CacheRealign> = cache.clone();
                let handle: Weak<dyn CacheRealign> = Arc::downgrade(&realign);
                self.caches.private.lock().unwrap().push(handle);
                cache
            }
            Some(key) => {
                let mut keyed = self.caches.keyed.lock().unwrap();
                if let Some(entry) = keyed.get(key) {
                    return entry.typed.clone().downcast().unwrap_or_else(|_| {
                        panic!("indicator cache key {key:?} is bound to a different value type")
                    });
                }
                let cache = Arc::new(IndicatorCache::<T>::new());
                keyed.insert(
                    key.to_string(),
                    KeyedCache {
                        typed: cache.clone(),
                        realign: cache.clone(),
                    },
                );
                cache
            }
        }
    }

    fn emit_instant_range(&self) {
        self.range_hub.emit(self.instant_range());
    }
}

impl fmt::Debug for CandleSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandleSeries")
            .field("timeframe", &self.timeframe)
            .field("len", &self.candles.len())
            .field("instant_range", &self.instant_range())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn candle_at(i: usize, close: Decimal) -> Candle {
        let time = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
            + Timeframe::M1.duration() * i as i32;
        Candle {
            time,
            open: close - dec!(1),
            high: close + dec!(2),
            low: close - dec!(2),
            close,
            volume: dec!(1000),
        }
    }

    fn seeded_series(n: usize) -> CandleSeries {
        let candles = (0..n).map(|i| candle_at(i, dec!(100))).collect();
        CandleSeries::from_candles(Timeframe::M1, candles).unwrap()
    }

    #[test]
    fn get_in_and_out_of_range() {
        let series = seeded_series(3);
        assert!(series.get(2).is_ok());
        assert_eq!(
            series.get(3),
            Err(SeriesError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn append_emits_live_with_new_index() {
        let mut series = CandleSeries::new(Timeframe::M1);
        let live = series.subscribe_live();
        series.append(candle_at(0, dec!(100))).unwrap();
        series.append(candle_at(1, dec!(101))).unwrap();

        let events: Vec<LiveUpdate> = live.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].index, 0);
        assert_eq!(events[1].index, 1);
        assert_eq!(events[1].candle.close, dec!(101));
    }

    #[test]
    fn update_last_keeps_index() {
        let mut series = seeded_series(3);
        let live = series.subscribe_live();
        series.update_last(candle_at(2, dec!(107))).unwrap();

        let events: Vec<LiveUpdate> = live.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].index, 2);
        assert_eq!(series.get(2).unwrap().close, dec!(107));
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn update_last_on_empty_is_index_error() {
        let mut series = CandleSeries::new(Timeframe::M1);
        assert_eq!(
            series.update_last(candle_at(0, dec!(100))),
            Err(SeriesError::IndexOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn invalid_candle_rejected_without_partial_apply() {
        let mut series = seeded_series(2);
        let mut bad = candle_at(2, dec!(100));
        bad.high = dec!(10); // below the body
        assert!(matches!(
            series.append(bad),
            Err(SeriesError::InvalidCandle(_))
        ));
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn trim_front_clamps_and_signals() {
        let mut series = seeded_series(4);
        let mods = series.subscribe_modifications();
        series.trim_front(2);
        assert_eq!(series.len(), 2);

        let events: Vec<Modification> = mods.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].invalidated, Some(0..2));
        assert_eq!(events[0].inserted, None);

        // over-trim clamps, never underflows
        series.trim_front(10);
        assert!(series.is_empty());
    }

    #[test]
    fn zero_trim_is_silent() {
        let mut series = seeded_series(2);
        let mods = series.subscribe_modifications();
        let ranges = series.subscribe_instant_range();
        series.trim_front(0);
        series.trim_back(0);
        assert_eq!(mods.try_iter().count(), 0);
        assert_eq!(ranges.try_iter().count(), 0);
    }

    #[test]
    fn trim_back_signals_tail_range() {
        let mut series = seeded_series(5);
        let mods = series.subscribe_modifications();
        series.trim_back(2);
        assert_eq!(series.len(), 3);

        let events: Vec<Modification> = mods.try_iter().collect();
        assert_eq!(events[0].invalidated, Some(3..5));
    }

    #[test]
    fn splice_replaces_subrange_and_signals_both_sides() {
        let mut series = seeded_series(5);
        let mods = series.subscribe_modifications();
        let backfill = vec![
            candle_at(1, dec!(200)),
            candle_at(2, dec!(201)),
            candle_at(3, dec!(202)),
        ];
        series.splice(1..3, backfill).unwrap();

        assert_eq!(series.len(), 6);
        assert_eq!(series.get(1).unwrap().close, dec!(200));
        assert_eq!(series.get(3).unwrap().close, dec!(202));
        assert_eq!(series.get(4).unwrap().close, dec!(100)); // old index 3

        let events: Vec<Modification> = mods.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].invalidated, Some(1..3));
        assert_eq!(events[0].inserted, Some(1..4));
    }

    #[test]
    fn splice_pure_insertion_has_no_invalidated_side() {
        let mut series = seeded_series(2);
        let mods = series.subscribe_modifications();
        series.splice(2..2, vec![candle_at(2, dec!(103))]).unwrap();
        let events: Vec<Modification> = mods.try_iter().collect();
        assert_eq!(events[0].invalidated, None);
        assert_eq!(events[0].inserted, Some(2..3));
    }

    #[test]
    fn splice_rejects_invalid_batch_wholesale() {
        let mut series = seeded_series(3);
        let mut bad = candle_at(1, dec!(100));
        bad.low = dec!(500);
        let result = series.splice(1..2, vec![candle_at(1, dec!(100)), bad]);
        assert!(matches!(result, Err(SeriesError::InvalidCandle(_))));
        assert_eq!(series.len(), 3);
        assert_eq!(series.get(1).unwrap().close, dec!(100));
    }

    #[test]
    fn instant_range_tracks_mutations() {
        let mut series = CandleSeries::new(Timeframe::M5);
        assert_eq!(series.instant_range(), None);

        let ranges = series.subscribe_instant_range();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut candle = candle_at(0, dec!(100));
        candle.time = t0;
        series.append(candle).unwrap();

        let events: Vec<Option<InstantRange>> = ranges.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            Some(InstantRange {
                start: t0,
                end: t0 + Timeframe::M5.duration(),
            })
        );
    }

    #[test]
    fn keyed_cache_is_shared_private_is_not() {
        let series = seeded_series(3);
        let a = series.indicator_cache::<Decimal>(Some("ema_21"));
        let b = series.indicator_cache::<Decimal>(Some("ema_21"));
        assert!(Arc::ptr_eq(&a, &b));

        let p = series.indicator_cache::<Decimal>(None);
        let q = series.indicator_cache::<Decimal>(None);
        assert!(!Arc::ptr_eq(&p, &q));
    }

    #[test]
    #[should_panic(expected = "different value type")]
    fn keyed_cache_type_mismatch_panics() {
        let series = seeded_series(1);
        let _ = series.indicator_cache::<Decimal>(Some("ema_21"));
        let _ = series.indicator_cache::<u64>(Some("ema_21"));
    }

    #[test]
    fn trims_realign_registered_caches() {
        let mut series = seeded_series(6);
        let keyed = series.indicator_cache::<i64>(Some("probe"));
        let private = series.indicator_cache::<i64>(None);
        for i in 0..6 {
            keyed.set(i, i as i64);
            private.set(i, i as i64 * 10);
        }

        series.trim_front(2);
        assert_eq!(keyed.get(0), Some(2));
        assert_eq!(private.get(0), Some(20));

        series.trim_back(1);
        assert_eq!(keyed.len(), 3);
        assert_eq!(private.len(), 3);
    }

    #[test]
    fn splice_truncates_caches_from_start() {
        let mut series = seeded_series(6);
        let cache = series.indicator_cache::<i64>(Some("probe"));
        for i in 0..6 {
            cache.set(i, i as i64);
        }
        series
            .splice(3..5, vec![candle_at(3, dec!(50)), candle_at(4, dec!(51))])
            .unwrap();
        assert_eq!(cache.get(2), Some(2));
        assert_eq!(cache.get(3), None);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn clear_resets_series_and_caches() {
        let mut series = seeded_series(4);
        let cache = series.indicator_cache::<i64>(Some("probe"));
        cache.set(0, 1);
        let mods = series.subscribe_modifications();

        series.clear();
        assert!(series.is_empty());
        assert!(cache.is_empty());
        assert_eq!(series.instant_range(), None);

        let events: Vec<Modification> = mods.try_iter().collect();
        assert_eq!(events[0].invalidated, Some(0..4));
    }

    #[test]
    fn dropped_private_cache_is_forgotten() {
        let mut series = seeded_series(3);
        let private = series.indicator_cache::<i64>(None);
        drop(private);
        series.trim_front(1); // walks the registry and prunes the dead handle
        assert!(series.caches.private.lock().unwrap().is_empty());
    }
}
