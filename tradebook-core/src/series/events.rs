//! Series event types and the subscription fan-out.
//!
//! Consumers (chart panels, cache maintenance, session recorders) subscribe
//! and receive events over std `mpsc` channels. Delivery starts at the point
//! of subscription — there is no buffered history; late subscribers read the
//! past through `CandleSeries::get`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use crate::domain::Candle;

/// A candle appended or rewritten in place while forming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveUpdate {
    pub index: usize,
    pub candle: Candle,
}

/// A structural mutation: trim, splice, or reset.
///
/// `None` on a side means nothing on that side changed. Ranges are in the
/// index space the series had when the mutation was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    /// Indices whose candles were evicted or replaced.
    pub invalidated: Option<Range<usize>>,
    /// Indices now occupied by newly inserted candles.
    pub inserted: Option<Range<usize>>,
}

/// The time span a series currently covers: first bucket open through the
/// end of the newest bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Fan-out of one event stream to any number of subscribers.
///
/// Disconnected receivers are pruned on the next emit. The sender list lives
/// behind a `Mutex` so readers can subscribe through a shared series.
#[derive(Debug, Default)]
pub(crate) struct EventHub<T> {
    senders: Mutex<Vec<Sender<T>>>,
}

impl<T: Clone> EventHub<T> {
    pub(crate) fn new() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = mpsc::channel();
        self.senders.lock().unwrap().push(tx);
        rx
    }

    pub(crate) fn emit(&self, event: T) {
        self.senders
            .lock()
            .unwrap()
            .retain(|sender| sender.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_arrive_in_emission_order() {
        let hub = EventHub::new();
        let rx = hub.subscribe();
        hub.emit(1);
        hub.emit(2);
        hub.emit(3);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn late_subscriber_sees_nothing_before_subscription() {
        let hub = EventHub::new();
        hub.emit(1);
        let rx = hub.subscribe();
        hub.emit(2);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let hub = EventHub::new();
        let rx = hub.subscribe();
        drop(rx);
        hub.emit(1); // prunes the dead sender
        assert_eq!(hub.senders.lock().unwrap().len(), 0);
    }

    #[test]
    fn multiple_subscribers_each_get_every_event() {
        let hub = EventHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();
        hub.emit("tick");
        assert_eq!(a.try_iter().collect::<Vec<_>>(), vec!["tick"]);
        assert_eq!(b.try_iter().collect::<Vec<_>>(), vec!["tick"]);
    }
}
