//! Listener Registry: global and frame-id-keyed frame subscribers.
//!
//! The Reader pushes every decoded frame through [`ListenerRegistry::dispatch`]
//! without ever blocking on a slow subscriber. Each subscription is a small
//! bounded ring buffer with a drop-oldest overflow policy (logged via
//! `tracing::warn!`) rather than a plain `tokio::sync::mpsc` channel, since
//! `mpsc` has no way to evict an already-queued item from the sending side.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex as StdMutex,
    },
};

use tokio::sync::{Mutex, Notify};
use xbee_proto::Frame;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug)]
struct Inbox {
    queue: Mutex<VecDeque<Frame>>,
    notify: Notify,
    capacity: usize,
    closed: AtomicBool,
}

impl Inbox {
    fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity,
            closed: AtomicBool::new(false),
        }
    }

    async fn push(&self, frame: Frame) {
        let mut queue = self.queue.lock().await;
        if queue.len() >= self.capacity {
            tracing::warn!(capacity = self.capacity, "listener inbox full, dropping oldest frame");
            queue.pop_front();
        }
        queue.push_back(frame);
        drop(queue);
        self.notify.notify_one();
    }

    fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }
}

/// A handle to a single subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    inbox: Arc<Inbox>,
    registry: Arc<Shared>,
    keyed: Option<u8>,
}

impl Subscription {
    /// Awaits the next frame delivered to this subscription.
    ///
    /// Returns `None` once the registry has been marked closed (the Reader
    /// observed transport EOF or a fatal I/O error) and no frame is still
    /// queued — callers waiting on a response translate this into
    /// `XBeeError::TransportClosed`.
    pub async fn recv(&self) -> Option<Frame> {
        loop {
            {
                let mut queue = self.inbox.queue.lock().await;
                if let Some(frame) = queue.pop_front() {
                    return Some(frame);
                }
                if self.inbox.closed.load(Ordering::Acquire) {
                    return None;
                }
            }
            self.inbox.notify.notified().await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.remove(self.id, self.keyed);
    }
}

#[derive(Debug, Default)]
struct Shared {
    next_id: AtomicU64,
    global: StdMutex<HashMap<u64, Arc<Inbox>>>,
    keyed: StdMutex<HashMap<u8, HashMap<u64, Arc<Inbox>>>>,
    closed: AtomicBool,
}

impl Shared {
    /// Blocks for the lock rather than `try_lock`-and-skip: a subscription
    /// drop that raced a concurrent `dispatch()` must still unregister, or
    /// its `Arc<Inbox>` leaks in the registry for the registry's lifetime.
    /// Neither map is ever held across an `.await`, so this never blocks an
    /// async task for longer than a plain `HashMap` mutation takes.
    fn remove(&self, id: u64, keyed: Option<u8>) {
        if let Some(key) = keyed {
            let mut map = self.keyed.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(bucket) = map.get_mut(&key) {
                bucket.remove(&id);
                if bucket.is_empty() {
                    map.remove(&key);
                }
            }
        } else {
            let mut map = self.global.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            map.remove(&id);
        }
    }
}

/// Registry of global and frame-id-keyed listeners.
///
/// Cloning is cheap: all clones share the same underlying subscriber maps.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    shared: Arc<Shared>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to every frame the Reader decodes, regardless of frame id.
    pub async fn subscribe_global(&self) -> Subscription {
        self.subscribe_global_with_capacity(DEFAULT_CAPACITY).await
    }

    /// Same as [`ListenerRegistry::subscribe_global`] with an explicit
    /// inbox capacity.
    pub async fn subscribe_global_with_capacity(&self, capacity: usize) -> Subscription {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let inbox = Arc::new(Inbox::new(capacity));
        if self.shared.closed.load(Ordering::Acquire) {
            inbox.mark_closed();
        }
        self.shared.global.lock().unwrap_or_else(std::sync::PoisonError::into_inner).insert(id, inbox.clone());
        Subscription { id, inbox, registry: self.shared.clone(), keyed: None }
    }

    /// Subscribes only to frames whose frame id equals `frame_id`.
    pub async fn subscribe_keyed(&self, frame_id: u8) -> Subscription {
        self.subscribe_keyed_with_capacity(frame_id, DEFAULT_CAPACITY).await
    }

    /// Same as [`ListenerRegistry::subscribe_keyed`] with an explicit inbox
    /// capacity.
    pub async fn subscribe_keyed_with_capacity(&self, frame_id: u8, capacity: usize) -> Subscription {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let inbox = Arc::new(Inbox::new(capacity));
        if self.shared.closed.load(Ordering::Acquire) {
            inbox.mark_closed();
        }
        self.shared
            .keyed
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entry(frame_id)
            .or_default()
            .insert(id, inbox.clone());
        Subscription { id, inbox, registry: self.shared.clone(), keyed: Some(frame_id) }
    }

    /// Marks the registry closed: every current and future subscription's
    /// [`Subscription::recv`] returns `None` once its queued frames are
    /// drained. Called by the Reader on transport EOF/fatal I/O error.
    pub async fn mark_closed(&self) {
        self.shared.closed.store(true, Ordering::Release);
        for inbox in self.shared.global.lock().unwrap_or_else(std::sync::PoisonError::into_inner).values() {
            inbox.mark_closed();
        }
        for bucket in self.shared.keyed.lock().unwrap_or_else(std::sync::PoisonError::into_inner).values() {
            for inbox in bucket.values() {
                inbox.mark_closed();
            }
        }
    }

    /// Delivers `frame` to every matching subscriber. Never blocks waiting
    /// for a subscriber to drain — overflow is handled per-inbox.
    pub async fn dispatch(&self, frame: Frame) {
        let global = self
            .shared
            .global
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .values()
            .cloned()
            .collect::<Vec<_>>();
        for inbox in &global {
            inbox.push(frame.clone()).await;
        }

        if let Some(frame_id) = frame.frame_id {
            let keyed = self
                .shared
                .keyed
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .get(&frame_id)
                .map(|bucket| bucket.values().cloned().collect::<Vec<_>>());
            if let Some(inboxes) = keyed {
                for inbox in &inboxes {
                    inbox.push(frame.clone()).await;
                }
            }
        }
    }
}
