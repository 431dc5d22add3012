//! Drawdown timeline — contiguous declines from a cumulative-pnl peak.
//!
//! An episode opens on the first trade that leaves the cumulative curve
//! below its running peak and closes on the last trade before the curve
//! returns to (or exceeds) that peak — the recovering trade itself is not
//! part of the episode. An episode still below peak at the end of the list
//! closes at the last trade.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradebook_core::domain::{Trade, TradeId};

/// One completed drawdown episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drawdown {
    pub trade_count: usize,
    /// Entry time of the episode's first trade.
    pub from: DateTime<Utc>,
    /// Exit time of the episode's last trade.
    pub to: DateTime<Utc>,
    #[serde(with = "crate::serde_duration")]
    pub duration: Duration,
    pub trade_id_from: TradeId,
    pub trade_id_to: TradeId,
    /// The cumulative-pnl peak being drawn down from.
    pub pnl_peak: Decimal,
    /// Peak minus trough, as a positive magnitude.
    pub drawdown: Decimal,
}

/// Explicit accumulator threaded through the trade list by the stats pass.
///
/// `observe` takes each trade with the cumulative net pnl after it; `finish`
/// closes any still-open episode and yields the timeline in order.
#[derive(Debug, Default)]
pub(crate) struct DrawdownTracker {
    peak: Option<Decimal>,
    open: Option<OpenEpisode>,
    episodes: Vec<Drawdown>,
}

#[derive(Debug)]
struct OpenEpisode {
    trade_count: usize,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    trade_id_from: TradeId,
    trade_id_to: TradeId,
    trough: Decimal,
}

impl DrawdownTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn observe(&mut self, trade: &Trade, cumulative: Decimal) {
        match self.peak {
            None => self.peak = Some(cumulative),
            Some(peak) if cumulative >= peak => {
                self.close_episode(peak);
                self.peak = Some(cumulative);
            }
            Some(_) => match &mut self.open {
                None => {
                    self.open = Some(OpenEpisode {
                        trade_count: 1,
                        from: trade.entry_time,
                        to: trade.exit_time,
                        trade_id_from: trade.id,
                        trade_id_to: trade.id,
                        trough: cumulative,
                    });
                }
                Some(episode) => {
                    episode.trade_count += 1;
                    episode.to = trade.exit_time;
                    episode.trade_id_to = trade.id;
                    episode.trough = episode.trough.min(cumulative);
                }
            },
        }
    }

    pub(crate) fn finish(mut self) -> Vec<Drawdown> {
        if let Some(peak) = self.peak {
            self.close_episode(peak);
        }
        self.episodes
    }

    fn close_episode(&mut self, peak: Decimal) {
        if let Some(episode) = self.open.take() {
            self.episodes.push(Drawdown {
                trade_count: episode.trade_count,
                from: episode.from,
                to: episode.to,
                duration: episode.to - episode.from,
                trade_id_from: episode.trade_id_from,
                trade_id_to: episode.trade_id_to,
                pnl_peak: peak,
                drawdown: peak - episode.trough,
            });
        }
    }
}
