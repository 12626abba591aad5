//! Connectivity subscription stream.

use futures::{Stream, StreamExt};
use satchel_core::provider::ConnectionEvents;
use std::{
    collections::VecDeque,
    pin::Pin,
    task::{Context, Poll},
};

/// Delivers the connectivity of a started provider: the snapshot taken at
/// subscription time first, then every connect/disconnect transition for as
/// long as the stream is held. Dropping the stream ends the subscription;
/// the stream itself ends when the provider goes away.
#[derive(Debug)]
pub struct ConnectedSubscription {
    queued: VecDeque<bool>,
    events: ConnectionEvents,
}

impl ConnectedSubscription {
    pub(crate) fn new(connected: bool, events: ConnectionEvents) -> Self {
        Self { queued: VecDeque::from([connected]), events }
    }
}

impl Stream for ConnectedSubscription {
    type Item = bool;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let pin = self.get_mut();
        if let Some(snapshot) = pin.queued.pop_front() {
            return Poll::Ready(Some(snapshot));
        }
        pin.events.poll_next_unpin(cx)
    }
}
