//! Observer system for receiver notifications.
//!
//! The receive loop hands every new notification to the registered observers
//! one after another, in registration order, on its own task. Observers run
//! synchronously: a slow observer slows down polling.

use tokio::sync::mpsc;

use crate::types::Notification;

/// Receives notifications from a [`Receiver`](crate::Receiver).
pub trait Observer: Send + 'static {
    /// Called once per new notification.
    fn on_notification(&mut self, notification: &Notification);
}

impl<F> Observer for F
where
    F: FnMut(&Notification) + Send + 'static,
{
    fn on_notification(&mut self, notification: &Notification) {
        self(notification);
    }
}

/// Ordered list of observers.
#[derive(Default)]
pub struct NotificationDispatcher {
    observers: Vec<Box<dyn Observer>>,
}

impl NotificationDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observer.
    pub fn register(&mut self, observer: impl Observer) {
        self.observers.push(Box::new(observer));
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns true if no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Delivers a notification to every observer in registration order.
    pub fn dispatch(&mut self, notification: &Notification) {
        for observer in &mut self.observers {
            observer.on_notification(notification);
        }
    }
}

/// Observer that forwards notifications into an unbounded queue.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<Notification>,
}

impl Observer for ChannelObserver {
    fn on_notification(&mut self, notification: &Notification) {
        // A dropped receiver just means nobody is listening anymore.
        if self.sender.send(*notification).is_err() {
            tracing::trace!("notification queue closed");
        }
    }
}

/// Creates an observer and the queue it feeds.
#[must_use]
pub fn channel() -> (ChannelObserver, mpsc::UnboundedReceiver<Notification>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ChannelObserver { sender }, receiver)
}
