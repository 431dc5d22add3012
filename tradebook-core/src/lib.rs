//! Tradebook Core — the journal's trading-data computation engine.
//!
//! This crate contains the pieces whose correctness bugs would corrupt
//! financial figures rather than misrender a screen:
//! - Domain types (candles, timeframes, closed trades) with exact decimal
//!   price/money fields
//! - The mutable, time-indexed candle series with live/modification/range
//!   event streams
//! - Index-aligned indicator caches and the memoized indicator catalogue
//! - The deterministic intra-candle replay simulator
//! - The dual-window throttle for outbound API calls
//!
//! Screens, persistence, broker clients and backup glue are external
//! collaborators that consume this crate through value passing.

pub mod domain;
pub mod indicators;
pub mod math;
pub mod replay;
pub mod series;
pub mod throttle;
