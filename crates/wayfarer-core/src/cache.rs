//! Keyed query cache with optimistic updates
//!
//! Views subscribe to a key and hold the returned [`Subscription`]. The
//! entry lives while at least one subscription does; dropping the last
//! one evicts it. Optimistic writes return a ticket carrying the prior
//! value so the caller can confirm with the server's answer or roll back.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::trace;
use ulid::Ulid;

struct Slot<V> {
    sender: watch::Sender<Option<V>>,
    subscribers: usize,
}

type Slots<K, V> = Arc<Mutex<HashMap<K, Slot<V>>>>;

/// Cache of values shared between views
pub struct QueryCache<K, V> {
    slots: Slots<K, V>,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<K, V> Default for QueryCache<K, V> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `key`, creating an empty entry if needed
    pub fn subscribe(&self, key: K) -> Subscription<K, V> {
        let mut slots = self.slots.lock();
        let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
            sender: watch::channel(None).0,
            subscribers: 0,
        });
        slot.subscribers += 1;
        let receiver = slot.sender.subscribe();
        drop(slots);

        Subscription {
            key,
            receiver,
            slots: self.slots.clone(),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.slots
            .lock()
            .get(key)
            .and_then(|slot| slot.sender.borrow().clone())
    }

    /// Store a value for a subscribed key. Unwatched keys are not cached.
    pub fn set(&self, key: &K, value: V) -> bool {
        match self.slots.lock().get(key) {
            Some(slot) => {
                slot.sender.send_replace(Some(value));
                true
            }
            None => false,
        }
    }

    /// Mutate the cached value ahead of the server.
    ///
    /// Returns `None` when nothing is cached for `key`.
    pub fn apply_optimistic(
        &self,
        key: &K,
        update: impl FnOnce(&mut V),
    ) -> Option<OptimisticTicket<K, V>> {
        let slots = self.slots.lock();
        let slot = slots.get(key)?;
        let snapshot = slot.sender.borrow().clone()?;

        let mut next = snapshot.clone();
        update(&mut next);
        slot.sender.send_replace(Some(next));

        let ticket = OptimisticTicket {
            id: Ulid::new(),
            key: key.clone(),
            snapshot,
        };
        trace!(key = ?ticket.key, ticket = %ticket.id, "Applied optimistic update");
        Some(ticket)
    }

    /// Replace the optimistic value with what the server returned
    pub fn confirm(&self, ticket: OptimisticTicket<K, V>, server_value: V) {
        trace!(key = ?ticket.key, ticket = %ticket.id, "Confirmed optimistic update");
        self.set(&ticket.key, server_value);
    }

    /// Restore the value captured before the optimistic update
    pub fn rollback(&self, ticket: OptimisticTicket<K, V>) {
        trace!(key = ?ticket.key, ticket = %ticket.id, "Rolled back optimistic update");
        self.set(&ticket.key, ticket.snapshot);
    }

    pub fn contains(&self, key: &K) -> bool {
        self.slots.lock().contains_key(key)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pending optimistic update, holding the value to restore on failure
#[derive(Debug)]
pub struct OptimisticTicket<K, V> {
    id: Ulid,
    key: K,
    snapshot: V,
}

impl<K, V> OptimisticTicket<K, V> {
    pub fn id(&self) -> Ulid {
        self.id
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn snapshot(&self) -> &V {
        &self.snapshot
    }
}

/// Live interest in one cache key. Dropping the last one evicts the entry.
pub struct Subscription<K: Eq + Hash, V> {
    key: K,
    receiver: watch::Receiver<Option<V>>,
    slots: Slots<K, V>,
}

impl<K: Eq + Hash, V: Clone> Subscription<K, V> {
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Current value
    pub fn current(&self) -> Option<V> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next write to this key
    pub async fn changed(&mut self) -> Option<V> {
        self.receiver.changed().await.ok()?;
        self.receiver.borrow_and_update().clone()
    }
}

impl<K: Eq + Hash, V> Drop for Subscription<K, V> {
    fn drop(&mut self) {
        let mut slots = self.slots.lock();
        let evict = match slots.get_mut(&self.key) {
            Some(slot) => {
                slot.subscribers = slot.subscribers.saturating_sub(1);
                slot.subscribers == 0
            }
            None => false,
        };
        if evict {
            slots.remove(&self.key);
        }
    }
}
