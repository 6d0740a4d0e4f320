use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Lifecycle notification broadcast to application subscribers.
///
/// These are the application-facing milestones, decoupled from the raw host
/// callbacks that produce them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// Initial application content can be prepared.
    Loaded,
    /// The window client area changed size. Carries the new bounds.
    WindowResized { width: u32, height: u32 },
    /// The host is about to suspend the application. Subscribers run their
    /// shutdown work inside the suspend grace period.
    Suspending,
    /// The host brought the application back from suspension.
    Resumed,
}

/// Identifier for one subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Broadcast channel for [`Notification`]s.
///
/// Subscribers are invoked synchronously on the publishing thread, in
/// subscription order. Publication snapshots the subscriber list first and
/// invokes callbacks outside the lock, so a callback may subscribe or
/// unsubscribe without deadlocking; such changes take effect from the next
/// publication.
///
/// # Example
///
/// ```ignore
/// let hub = NotificationHub::new();
/// let id = hub.subscribe(|n| log::info!("lifecycle: {n:?}"));
/// hub.publish(Notification::Loaded);
/// hub.unsubscribe(id);
/// ```
pub struct NotificationHub {
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    next_id: AtomicU64,
}

impl NotificationHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Adds a subscriber and returns its id.
    pub fn subscribe(&self, subscriber: impl Fn(&Notification) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().push((id, Arc::new(subscriber)));
        id
    }

    /// Removes a subscriber. Returns whether the id was present.
    ///
    /// Unknown or already-removed ids are a harmless no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }

    /// Delivers a notification to every current subscriber.
    pub fn publish(&self, notification: Notification) {
        let snapshot: Vec<Subscriber> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();
        log::trace!(
            "publishing {notification:?} to {} subscriber(s)",
            snapshot.len()
        );
        for subscriber in snapshot {
            subscriber(&notification);
        }
    }

    /// Returns the current subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn delivers_in_subscription_order() {
        let hub = NotificationHub::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in 0..3 {
            let order = Arc::clone(&order);
            hub.subscribe(move |_| order.lock().push(tag));
        }

        hub.publish(Notification::Loaded);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hub = NotificationHub::new();
        let count = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&count);
        let id = hub.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        hub.publish(Notification::Resumed);
        assert!(hub.unsubscribe(id));
        hub.publish(Notification::Resumed);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        // Second removal reports the id as unknown.
        assert!(!hub.unsubscribe(id));
    }

    #[test]
    fn resize_payload_reaches_subscribers() {
        let hub = NotificationHub::new();
        let seen = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&seen);
        hub.subscribe(move |n| {
            if let Notification::WindowResized { width, height } = *n {
                *sink.lock() = Some((width, height));
            }
        });

        hub.publish(Notification::WindowResized {
            width: 800,
            height: 600,
        });
        assert_eq!(*seen.lock(), Some((800, 600)));
    }

    #[test]
    fn subscriber_may_unsubscribe_itself_during_delivery() {
        let hub = Arc::new(NotificationHub::new());
        let count = Arc::new(AtomicUsize::new(0));

        let id_slot = Arc::new(Mutex::new(None));
        let counter = Arc::clone(&count);
        let hub_ref = Arc::clone(&hub);
        let slot = Arc::clone(&id_slot);
        let id = hub.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *slot.lock() {
                hub_ref.unsubscribe(id);
            }
        });
        *id_slot.lock() = Some(id);

        hub.publish(Notification::Suspending);
        hub.publish(Notification::Suspending);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn distinct_ids_for_each_subscription() {
        let hub = NotificationHub::new();
        let a = hub.subscribe(|_| {});
        let b = hub.subscribe(|_| {});
        assert_ne!(a, b);
        assert_eq!(hub.subscriber_count(), 2);
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let hub = NotificationHub::new();
        hub.publish(Notification::Loaded);
        assert_eq!(hub.subscriber_count(), 0);
    }
}
