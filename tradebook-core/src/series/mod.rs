//! The candle series and its cache/event machinery.

pub mod candle_series;
pub mod events;
pub mod indicator_cache;

pub use candle_series::{CandleSeries, SeriesError};
pub use events::{InstantRange, LiveUpdate, Modification};
pub use indicator_cache::IndicatorCache;
