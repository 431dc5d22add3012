//! Bar replay — stepwise reveal of a historical candle's formation.
//!
//! `reveal_at` is a pure transform from a known full candle to the partial
//! candle a viewer would have seen at that point of the bar's life. It is
//! deterministic bit for bit, so replay sessions reproduce exactly.

use serde::{Deserialize, Serialize};

use crate::domain::Candle;
use crate::series::{CandleSeries, SeriesError};
use rust_decimal::Decimal;

/// Point within a forming bar.
///
/// A bar replays in four ticks: the open prints first, then the extreme on
/// the side the bar closes away from, then the other extreme, then the true
/// close with volume. Direction alone decides the extreme order; a flat
/// candle takes the bearish branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplayStep {
    Open,
    Extreme1,
    Extreme2,
    Close,
}

impl ReplayStep {
    pub const ALL: [ReplayStep; 4] = [
        ReplayStep::Open,
        ReplayStep::Extreme1,
        ReplayStep::Extreme2,
        ReplayStep::Close,
    ];

    /// The following step, or `None` after `Close`.
    pub fn next(self) -> Option<ReplayStep> {
        match self {
            ReplayStep::Open => Some(ReplayStep::Extreme1),
            ReplayStep::Extreme1 => Some(ReplayStep::Extreme2),
            ReplayStep::Extreme2 => Some(ReplayStep::Close),
            ReplayStep::Close => None,
        }
    }

    pub fn is_final(self) -> bool {
        self == ReplayStep::Close
    }
}

/// The partial candle visible at `step` of the full candle's formation.
///
/// Volume stays zero until `Close`; `reveal_at(candle, Close)` is the
/// identity. Every partial satisfies the OHLC ordering invariant.
pub fn reveal_at(full: &Candle, step: ReplayStep) -> Candle {
    let bullish = full.is_bullish();
    match step {
        ReplayStep::Open => Candle {
            time: full.time,
            open: full.open,
            high: full.open,
            low: full.open,
            close: full.open,
            volume: Decimal::ZERO,
        },
        ReplayStep::Extreme1 => {
            if bullish {
                // Low prints first on a bar that closes up.
                Candle {
                    time: full.time,
                    open: full.open,
                    high: full.open,
                    low: full.low,
                    close: full.low,
                    volume: Decimal::ZERO,
                }
            } else {
                Candle {
                    time: full.time,
                    open: full.open,
                    high: full.high,
                    low: full.open,
                    close: full.high,
                    volume: Decimal::ZERO,
                }
            }
        }
        ReplayStep::Extreme2 => {
            // Both extremes are known now; close sits at the second one.
            Candle {
                time: full.time,
                open: full.open,
                high: full.high,
                low: full.low,
                close: if bullish { full.high } else { full.low },
                volume: Decimal::ZERO,
            }
        }
        ReplayStep::Close => full.clone(),
    }
}

/// Drives a series through the step-by-step replay of a future candle list.
///
/// Sits between the full-candle source and the series: each `tick` reveals
/// one more step, appending on `Open` and rewriting the forming bar
/// otherwise, so subscribers see the same live events a real feed produces.
#[derive(Debug)]
pub struct ReplayDriver {
    future: Vec<Candle>,
    cursor: usize,
    step: ReplayStep,
}

impl ReplayDriver {
    pub fn new(future: Vec<Candle>) -> Self {
        Self {
            future,
            cursor: 0,
            step: ReplayStep::Open,
        }
    }

    /// Reveal the next step into `series`. Returns the step just applied,
    /// or `None` once every future candle has fully formed.
    pub fn tick(&mut self, series: &mut CandleSeries) -> Result<Option<ReplayStep>, SeriesError> {
        let Some(full) = self.future.get(self.cursor) else {
            return Ok(None);
        };
        let step = self.step;
        let partial = reveal_at(full, step);
        match step {
            ReplayStep::Open => series.append(partial)?,
            _ => series.update_last(partial)?,
        }
        match step.next() {
            Some(next) => self.step = next,
            None => {
                self.cursor += 1;
                self.step = ReplayStep::Open;
            }
        }
        Ok(Some(step))
    }

    /// Future candles not yet fully revealed.
    pub fn remaining(&self) -> usize {
        self.future.len() - self.cursor
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.future.len()
    }
}
