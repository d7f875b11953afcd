use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

/// What a timed receive produced.
#[derive(Debug, PartialEq)]
pub enum Recv<T> {
    Item(T),
    Timeout,
    Closed,
}

/// Single-slot, latest-wins handoff between the receive task and the
/// processing loop.
///
/// `push` never waits: a pending item is evicted and counted as dropped.
/// One consumer.
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Mutex<Slot<T>>,
    notify: Notify,
    received: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug)]
struct Slot<T> {
    item: Option<T>,
    closed: bool,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                item: None,
                closed: false,
            }),
            notify: Notify::new(),
            received: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Store `item`, replacing any pending one. Returns true if an item was
    /// evicted. Items pushed after `close` are discarded.
    pub fn push(&self, item: T) -> bool {
        let evicted = {
            let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
            if slot.closed {
                return false;
            }
            slot.item.replace(item).is_some()
        };
        self.received.fetch_add(1, Ordering::Relaxed);
        if evicted {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        self.notify.notify_one();
        evicted
    }

    /// Wait for the next item. `None` once closed and drained.
    pub async fn recv(&self) -> Option<T> {
        loop {
            {
                let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(item) = slot.item.take() {
                    return Some(item);
                }
                if slot.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    pub async fn recv_timeout(&self, timeout: Duration) -> Recv<T> {
        match tokio::time::timeout(timeout, self.recv()).await {
            Ok(Some(item)) => Recv::Item(item),
            Ok(None) => Recv::Closed,
            Err(_) => Recv::Timeout,
        }
    }

    /// Wake the consumer and refuse further items. A pending item can still
    /// be received.
    pub fn close(&self) {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).closed = true;
        self.notify.notify_one();
    }

    /// Items accepted by `push`, evicted ones included.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
