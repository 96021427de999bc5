//! Channel registry and pub/sub delivery.
//!
//! Subscribers are recorded as `(client id, outbox sender)` pairs per
//! channel, alongside a per-client view of its channels and patterns used
//! for the count replies and for disconnect cleanup.
//!
//! Delivery is fire-and-forget: `publish` computes its recipient count under
//! the registry lock, then pushes the encoded frame into each subscriber's
//! outbox without waiting. A subscriber whose outbox is full or gone is
//! dropped from the registry so a slow client can never stall a publisher.
//!
//! Pattern subscriptions are tracked for their counts only; no pattern
//! matching is performed at publish time.

use std::collections::{BTreeSet, HashMap};

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::warn;

use crate::resp::RespValue;

#[derive(Debug)]
struct Subscriber {
    client_id: u64,
    outbox: mpsc::Sender<Bytes>,
}

#[derive(Debug, Default)]
pub struct PubSubRegistry {
    /// Channel -> subscribers in subscription order.
    channels: HashMap<String, Vec<Subscriber>>,
    /// Client -> channels it subscribes to.
    client_channels: HashMap<u64, BTreeSet<String>>,
    /// Client -> patterns it subscribes to (counted, never delivered to).
    client_patterns: HashMap<u64, BTreeSet<String>>,
}

impl PubSubRegistry {
    /// Subscribes a client to `channel` and returns its subscription count
    /// after the insert. Re-subscribing to the same channel changes nothing.
    pub fn subscribe(
        &mut self,
        client_id: u64,
        channel: &str,
        outbox: mpsc::Sender<Bytes>,
    ) -> usize {
        let newly_added = self
            .client_channels
            .entry(client_id)
            .or_default()
            .insert(channel.to_string());

        if newly_added {
            self.channels
                .entry(channel.to_string())
                .or_default()
                .push(Subscriber { client_id, outbox });
        }

        self.subscription_count(client_id)
    }

    /// Unsubscribes a client from `channel` and returns its remaining
    /// subscription count.
    pub fn unsubscribe(&mut self, client_id: u64, channel: &str) -> usize {
        if let Some(channels) = self.client_channels.get_mut(&client_id) {
            channels.remove(channel);
        }
        if let Some(subscribers) = self.channels.get_mut(channel) {
            subscribers.retain(|subscriber| subscriber.client_id != client_id);
            if subscribers.is_empty() {
                self.channels.remove(channel);
            }
        }
        self.subscription_count(client_id)
    }

    pub fn subscribe_pattern(&mut self, client_id: u64, pattern: &str) -> usize {
        self.client_patterns
            .entry(client_id)
            .or_default()
            .insert(pattern.to_string());
        self.subscription_count(client_id)
    }

    pub fn unsubscribe_pattern(&mut self, client_id: u64, pattern: &str) -> usize {
        if let Some(patterns) = self.client_patterns.get_mut(&client_id) {
            patterns.remove(pattern);
        }
        self.subscription_count(client_id)
    }

    /// The channels a client currently subscribes to, in name order.
    pub fn channels_of(&self, client_id: u64) -> Vec<String> {
        self.client_channels
            .get(&client_id)
            .map(|channels| channels.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn patterns_of(&self, client_id: u64) -> Vec<String> {
        self.client_patterns
            .get(&client_id)
            .map(|patterns| patterns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Channels plus patterns, the count echoed in subscribe-family replies.
    pub fn subscription_count(&self, client_id: u64) -> usize {
        let channels = self
            .client_channels
            .get(&client_id)
            .map(BTreeSet::len)
            .unwrap_or(0);
        let patterns = self
            .client_patterns
            .get(&client_id)
            .map(BTreeSet::len)
            .unwrap_or(0);
        channels + patterns
    }

    /// Delivers `["message", channel, payload]` to every current subscriber
    /// of `channel` and returns the recipient count.
    ///
    /// The count is fixed before delivery: a subscriber dropped for a full
    /// or closed outbox still counts for this publish.
    pub fn publish(&mut self, channel: &str, payload: &str) -> usize {
        let Some(subscribers) = self.channels.get_mut(channel) else {
            return 0;
        };
        let count = subscribers.len();

        let frame = Bytes::from(
            RespValue::from_strings(["message", channel, payload]).encode(),
        );

        let mut dropped: Vec<u64> = Vec::new();
        for subscriber in subscribers.iter() {
            match subscriber.outbox.try_send(frame.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        client_id = subscriber.client_id,
                        channel, "subscriber outbox full, dropping its subscriptions"
                    );
                    dropped.push(subscriber.client_id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    dropped.push(subscriber.client_id);
                }
            }
        }

        for client_id in dropped {
            self.remove_client(client_id);
        }

        count
    }

    /// Clears every registration for a client; called on disconnect and when
    /// a slow subscriber is dropped.
    pub fn remove_client(&mut self, client_id: u64) {
        if let Some(channels) = self.client_channels.remove(&client_id) {
            for channel in channels {
                if let Some(subscribers) = self.channels.get_mut(&channel) {
                    subscribers.retain(|subscriber| subscriber.client_id != client_id);
                    if subscribers.is_empty() {
                        self.channels.remove(&channel);
                    }
                }
            }
        }
        self.client_patterns.remove(&client_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outbox(capacity: usize) -> (mpsc::Sender<Bytes>, mpsc::Receiver<Bytes>) {
        mpsc::channel(capacity)
    }

    #[test]
    fn test_subscribe_counts_per_client() {
        let mut registry = PubSubRegistry::default();
        let (tx, _rx) = outbox(4);

        assert_eq!(registry.subscribe(1, "a", tx.clone()), 1);
        assert_eq!(registry.subscribe(1, "b", tx.clone()), 2);
        // Duplicate subscription does not change the count.
        assert_eq!(registry.subscribe(1, "a", tx.clone()), 2);
        assert_eq!(registry.subscribe_pattern(1, "news.*"), 3);
        assert_eq!(registry.unsubscribe(1, "a"), 2);
        assert_eq!(registry.unsubscribe_pattern(1, "news.*"), 1);
    }

    #[test]
    fn test_publish_delivers_to_all_subscribers() {
        let mut registry = PubSubRegistry::default();
        let (tx1, mut rx1) = outbox(4);
        let (tx2, mut rx2) = outbox(4);

        registry.subscribe(1, "ch", tx1);
        registry.subscribe(2, "ch", tx2);

        assert_eq!(registry.publish("ch", "hi"), 2);

        let expected = Bytes::from("*3\r\n$7\r\nmessage\r\n$2\r\nch\r\n$2\r\nhi\r\n");
        assert_eq!(rx1.try_recv().ok(), Some(expected.clone()));
        assert_eq!(rx2.try_recv().ok(), Some(expected));
    }

    #[test]
    fn test_publish_to_empty_channel() {
        let mut registry = PubSubRegistry::default();
        assert_eq!(registry.publish("nobody", "hi"), 0);
    }

    #[test]
    fn test_slow_subscriber_is_dropped_but_counted() {
        let mut registry = PubSubRegistry::default();
        let (tx, _rx) = outbox(1);
        registry.subscribe(1, "ch", tx.clone());

        // Fill the outbox so the next delivery overflows.
        tx.try_send(Bytes::from_static(b"filler")).unwrap();

        assert_eq!(registry.publish("ch", "hi"), 1);
        assert_eq!(registry.subscription_count(1), 0);
        assert_eq!(registry.publish("ch", "hi"), 0);
    }

    #[test]
    fn test_remove_client_clears_everything() {
        let mut registry = PubSubRegistry::default();
        let (tx, _rx) = outbox(4);

        registry.subscribe(1, "a", tx.clone());
        registry.subscribe(1, "b", tx.clone());
        registry.subscribe_pattern(1, "p.*");
        registry.remove_client(1);

        assert_eq!(registry.subscription_count(1), 0);
        assert_eq!(registry.publish("a", "x"), 0);
        assert_eq!(registry.publish("b", "x"), 0);
    }
}
