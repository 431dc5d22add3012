//! TradingStats — summary statistics over an ordered closed-trade list.
//!
//! One linear pass accumulates totals, peaks, win/loss buckets, streaks and
//! the drawdown timeline; derived ratios come out of the shared decimal
//! context afterwards. Trades are classified on net pnl (`> 0` wins,
//! `<= 0` losses) and the drawdown timeline walks the cumulative net curve.

use std::collections::HashMap;

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradebook_core::domain::Trade;
use tradebook_core::math::MathContext;

use crate::drawdown::{Drawdown, DrawdownTracker};
use crate::filter::StatsFilter;

/// Per-bucket (win or loss) aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketStats {
    pub count: usize,
    /// Net pnl summed over the bucket.
    pub pnl_net: Decimal,
    pub fees: Decimal,
    /// Fraction of all trades that landed in this bucket (0..=1).
    pub share: Decimal,
    /// Largest single-trade magnitude in the bucket.
    pub largest: Decimal,
    /// Mean net pnl; `None` when the bucket is empty.
    pub average: Option<Decimal>,
    /// Longest run of consecutive same-bucket trades in input order.
    pub longest_streak: usize,
    /// Mean holding time; `None` when the bucket is empty.
    #[serde(with = "crate::serde_opt_duration")]
    pub average_duration: Option<Duration>,
}

/// Immutable snapshot of a trade list's performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingStats {
    pub trade_count: usize,
    /// Gross pnl over all trades.
    pub pnl: Decimal,
    /// Net pnl over all trades.
    pub pnl_net: Decimal,
    pub fees: Decimal,
    /// Highest value the running cumulative gross pnl ever reached.
    pub pnl_peak: Decimal,
    /// Highest value the running cumulative net pnl ever reached.
    pub pnl_net_peak: Decimal,
    pub wins: BucketStats,
    pub losses: BucketStats,
    /// Winning pnl over absolute losing pnl; `None` when there is no losing
    /// pnl (never a division error).
    pub profit_factor: Option<Decimal>,
    /// Share-weighted average pnl per trade; `None` when either bucket is
    /// empty.
    pub expectancy: Option<Decimal>,
    /// Drawdown episodes over the cumulative net pnl curve, in input order.
    pub drawdowns: Vec<Drawdown>,
    pub drawdown_max: Option<Decimal>,
    pub drawdown_average: Option<Decimal>,
    #[serde(with = "crate::serde_opt_duration")]
    pub drawdown_duration_max: Option<Duration>,
    #[serde(with = "crate::serde_opt_duration")]
    pub drawdown_duration_average: Option<Duration>,
    /// One level of predicate-filtered sub-aggregations; `None` for a key
    /// whose subset is empty.
    pub partial_stats: HashMap<String, Option<TradingStats>>,
}

#[derive(Default)]
struct BucketAcc {
    count: usize,
    pnl_net: Decimal,
    fees: Decimal,
    largest: Decimal,
    duration_ms: i64,
    current_streak: usize,
    longest_streak: usize,
}

impl BucketAcc {
    fn record(&mut self, trade: &Trade, extends_streak: bool) {
        self.count += 1;
        self.pnl_net += trade.pnl_net;
        self.fees += trade.fees;
        self.largest = self.largest.max(trade.pnl_net.abs());
        self.duration_ms += trade.duration().num_milliseconds();
        self.current_streak = if extends_streak {
            self.current_streak + 1
        } else {
            1
        };
        self.longest_streak = self.longest_streak.max(self.current_streak);
    }

    fn finish(self, ctx: &MathContext, total: usize) -> BucketStats {
        BucketStats {
            count: self.count,
            pnl_net: self.pnl_net,
            fees: self.fees,
            share: ctx.fraction(self.count, total).unwrap_or(Decimal::ZERO),
            largest: self.largest,
            average: ctx.mean(self.pnl_net, self.count),
            longest_streak: self.longest_streak,
            average_duration: if self.count == 0 {
                None
            } else {
                Some(Duration::milliseconds(self.duration_ms / self.count as i64))
            },
        }
    }
}

impl TradingStats {
    /// Aggregate a trade list ordered by entry time. `None` for an empty
    /// list — an empty aggregation is not an error.
    pub fn compute(trades: &[Trade], ctx: &MathContext) -> Option<TradingStats> {
        Self::compute_with_filters(trades, ctx, &[])
    }

    /// As `compute`, plus one `partial_stats` entry per filter. Partial
    /// subsets are aggregated without further filtering — predicates do not
    /// nest.
    pub fn compute_with_filters(
        trades: &[Trade],
        ctx: &MathContext,
        filters: &[StatsFilter],
    ) -> Option<TradingStats> {
        if trades.is_empty() {
            return None;
        }
        let total = trades.len();

        let mut pnl = Decimal::ZERO;
        let mut pnl_net = Decimal::ZERO;
        let mut fees = Decimal::ZERO;
        let mut cumulative_pnl = Decimal::ZERO;
        let mut cumulative_net = Decimal::ZERO;
        let mut pnl_peak: Option<Decimal> = None;
        let mut pnl_net_peak: Option<Decimal> = None;
        let mut wins = BucketAcc::default();
        let mut losses = BucketAcc::default();
        let mut tracker = DrawdownTracker::new();
        let mut prev_was_win: Option<bool> = None;

        for trade in trades {
            pnl += trade.pnl;
            pnl_net += trade.pnl_net;
            fees += trade.fees;
            cumulative_pnl += trade.pnl;
            cumulative_net += trade.pnl_net;
            pnl_peak = Some(pnl_peak.map_or(cumulative_pnl, |p| p.max(cumulative_pnl)));
            pnl_net_peak = Some(pnl_net_peak.map_or(cumulative_net, |p| p.max(cumulative_net)));

            let is_win = trade.is_winner();
            let bucket = if is_win { &mut wins } else { &mut losses };
            bucket.record(trade, prev_was_win == Some(is_win));
            prev_was_win = Some(is_win);

            tracker.observe(trade, cumulative_net);
        }

        let wins = wins.finish(ctx, total);
        let losses = losses.finish(ctx, total);

        let profit_factor = ctx.div(wins.pnl_net, losses.pnl_net.abs());
        let expectancy = match (wins.average, losses.average) {
            (Some(win_avg), Some(loss_avg)) => {
                Some(ctx.round(wins.share * win_avg + losses.share * loss_avg))
            }
            _ => None,
        };

        let drawdowns = tracker.finish();
        let drawdown_max = drawdowns.iter().map(|d| d.drawdown).max();
        let drawdown_average = ctx.mean(
            drawdowns.iter().map(|d| d.drawdown).sum(),
            drawdowns.len(),
        );
        let drawdown_duration_max = drawdowns.iter().map(|d| d.duration).max();
        let drawdown_duration_average = if drawdowns.is_empty() {
            None
        } else {
            let total_ms: i64 = drawdowns.iter().map(|d| d.duration.num_milliseconds()).sum();
            Some(Duration::milliseconds(total_ms / drawdowns.len() as i64))
        };

        let partial_stats = filters
            .iter()
            .map(|filter| {
                let subset: Vec<Trade> = trades
                    .iter()
                    .filter(|trade| filter.matches(trade))
                    .cloned()
                    .collect();
                (filter.key().to_string(), Self::compute(&subset, ctx))
            })
            .collect();

        Some(TradingStats {
            trade_count: total,
            pnl,
            pnl_net,
            fees,
            pnl_peak: pnl_peak.unwrap_or(Decimal::ZERO),
            pnl_net_peak: pnl_net_peak.unwrap_or(Decimal::ZERO),
            wins,
            losses,
            profit_factor,
            expectancy,
            drawdowns,
            drawdown_max,
            drawdown_average,
            drawdown_duration_max,
            drawdown_duration_average,
            partial_stats,
        })
    }
}
