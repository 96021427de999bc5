//! The blocking-wait coordinator for `BLPOP` and `XREAD BLOCK`.
//!
//! Clients that find nothing to consume register a wait record here and park
//! on a oneshot channel. Writers notify the board *after* their mutation,
//! inside the same stores critical section, so a wakeup can never race a
//! concurrent reader or get lost.
//!
//! List waiters are consuming: the notifier pops the element itself and
//! hands `(key, element)` to exactly one waiter, always the oldest
//! registration for that key. Stream waiters are non-consuming: every parked
//! reader of the key is woken and re-reads the stream past its own cursor.
//!
//! Each registration carries a token from a single monotonically increasing
//! counter. Queue order already gives per-key FIFO; the token identifies the
//! record for cancellation (timeout or disconnect) across all of its keys.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::store::ListStore;

/// A single-use delivery slot shared by every per-key record of one waiter.
/// Taking the sender claims the waiter; records left behind in other key
/// queues become dead and are skipped during traversal.
type Slot<T> = Arc<Mutex<Option<oneshot::Sender<T>>>>;

#[derive(Debug)]
struct ListWaiter {
    token: u64,
    slot: Slot<(String, String)>,
}

#[derive(Debug)]
struct StreamWaiter {
    token: u64,
    slot: Slot<()>,
}

#[derive(Debug, Default)]
pub struct WaitBoard {
    next_token: u64,
    lists: HashMap<String, VecDeque<ListWaiter>>,
    streams: HashMap<String, Vec<StreamWaiter>>,
}

impl WaitBoard {
    /// Registers a `BLPOP` waiter on every listed key. The returned receiver
    /// yields the `(key, element)` pair the notifier hands over.
    pub fn register_list_waiter(
        &mut self,
        keys: &[String],
    ) -> (u64, oneshot::Receiver<(String, String)>) {
        let token = self.next_token();
        let (sender, receiver) = oneshot::channel();
        let slot: Slot<(String, String)> = Arc::new(Mutex::new(Some(sender)));

        for key in keys {
            self.lists
                .entry(key.clone())
                .or_default()
                .push_back(ListWaiter {
                    token,
                    slot: Arc::clone(&slot),
                });
        }

        (token, receiver)
    }

    /// Drops a waiter's records from all of its keys. Safe to call after the
    /// waiter was already served; serving consumed the slot, so at worst this
    /// removes dead records.
    pub fn cancel_list_waiter(&mut self, keys: &[String], token: u64) {
        for key in keys {
            if let Some(queue) = self.lists.get_mut(key) {
                queue.retain(|waiter| waiter.token != token);
                if queue.is_empty() {
                    self.lists.remove(key);
                }
            }
        }
    }

    /// Hands freshly pushed elements of `key` to parked waiters, oldest
    /// first, until either side runs out. Returns how many elements were
    /// consumed, so the caller can capture the pops for replication.
    ///
    /// A waiter whose receiver disappeared between the pop and the send gets
    /// its element restored to the head and the next waiter is tried.
    pub fn drain_list_waiters(&mut self, lists: &mut ListStore, key: &str) -> usize {
        let Some(queue) = self.lists.get_mut(key) else {
            return 0;
        };

        let mut delivered = 0;
        while let Some(waiter) = queue.pop_front() {
            let Some(sender) = waiter.slot.lock().take() else {
                // Served via another key, timed out, or disconnected.
                continue;
            };

            let Some(element) = lists.pop_front(key) else {
                // Nothing left to hand over; the waiter keeps waiting.
                *waiter.slot.lock() = Some(sender);
                queue.push_front(waiter);
                break;
            };

            match sender.send((key.to_string(), element)) {
                Ok(()) => delivered += 1,
                Err((_, element)) => lists.push_front(key, element),
            }
        }

        if queue.is_empty() {
            self.lists.remove(key);
        }
        delivered
    }

    /// Registers an `XREAD BLOCK` waiter on every listed stream key.
    pub fn register_stream_waiter(&mut self, keys: &[String]) -> (u64, oneshot::Receiver<()>) {
        let token = self.next_token();
        let (sender, receiver) = oneshot::channel();
        let slot: Slot<()> = Arc::new(Mutex::new(Some(sender)));

        for key in keys {
            self.streams
                .entry(key.clone())
                .or_default()
                .push(StreamWaiter {
                    token,
                    slot: Arc::clone(&slot),
                });
        }

        (token, receiver)
    }

    pub fn cancel_stream_waiter(&mut self, keys: &[String], token: u64) {
        for key in keys {
            if let Some(waiters) = self.streams.get_mut(key) {
                waiters.retain(|waiter| waiter.token != token);
                if waiters.is_empty() {
                    self.streams.remove(key);
                }
            }
        }
    }

    /// Wakes every reader parked on `key`. Reads do not consume, so there is
    /// no handoff; woken clients re-read past their own cursors.
    pub fn notify_stream_waiters(&mut self, key: &str) {
        let Some(waiters) = self.streams.remove(key) else {
            return;
        };
        for waiter in waiters {
            if let Some(sender) = waiter.slot.lock().take() {
                let _ = sender.send(());
            }
        }
    }

    fn next_token(&mut self) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        token
    }
}
