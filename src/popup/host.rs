//! Platform ports used by the popup broker
//!
//! The broker never talks to a concrete windowing system. It opens child windows
//! through a [`PopupHost`] and receives cross-window messages through the host's
//! [`MessageBus`], which plays the role of the global `message` event: every
//! registered listener sees every posted message until it deregisters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::mpsc;

use super::types::{ScreenMetrics, WindowMessage};

/// Handle to an opened child window
pub trait PopupWindow: Send {
    /// Whether the window has been closed (by the user, the provider, or us)
    fn is_closed(&self) -> bool;

    /// Close the window. Closing an already closed window is a no-op.
    fn close(&mut self);
}

/// The windowing environment a popup flow runs in
pub trait PopupHost: Send + Sync {
    /// Position and size of the opener window
    fn screen_metrics(&self) -> ScreenMetrics;

    /// Open a child window at `url`
    ///
    /// Returns `None` when the platform refuses (e.g. a pop-up blocker).
    fn open(&self, url: &str, window_name: &str, features: &str) -> Option<Box<dyn PopupWindow>>;

    /// The opener's cross-window message channel
    fn messages(&self) -> &MessageBus;
}

type ListenerMap = HashMap<u64, mpsc::UnboundedSender<WindowMessage>>;

#[derive(Debug, Default)]
struct BusInner {
    next_id: AtomicU64,
    registrations: AtomicU64,
    listeners: Mutex<ListenerMap>,
}

impl BusInner {
    fn listeners(&self) -> MutexGuard<'_, ListenerMap> {
        self.listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Broadcast channel for cross-window messages delivered to the opener
#[derive(Debug, Clone, Default)]
pub struct MessageBus {
    inner: Arc<BusInner>,
}

impl MessageBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until dropped or removed.
    #[must_use]
    pub fn add_listener(&self) -> MessageListener {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.registrations.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners().insert(id, sender);
        MessageListener {
            id,
            bus: Arc::downgrade(&self.inner),
            receiver,
        }
    }

    /// Deliver a message to every registered listener
    ///
    /// Returns the number of listeners the message was delivered to.
    pub fn post(&self, message: &WindowMessage) -> usize {
        let mut listeners = self.inner.listeners();
        listeners.retain(|_, sender| !sender.is_closed());
        listeners
            .values()
            .filter(|sender| sender.send(message.clone()).is_ok())
            .count()
    }

    /// Number of currently registered listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners().len()
    }

    /// Total number of listeners ever registered on this bus
    #[must_use]
    pub fn registrations(&self) -> u64 {
        self.inner.registrations.load(Ordering::Relaxed)
    }
}

/// A registered message listener; deregisters itself on drop
#[derive(Debug)]
pub struct MessageListener {
    id: u64,
    bus: Weak<BusInner>,
    receiver: mpsc::UnboundedReceiver<WindowMessage>,
}

impl MessageListener {
    /// Wait for the next message
    ///
    /// Returns `None` once the bus itself has gone away.
    pub async fn recv(&mut self) -> Option<WindowMessage> {
        self.receiver.recv().await
    }

    /// Deregister explicitly
    pub fn remove(self) {
        drop(self);
    }
}

impl Drop for MessageListener {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.listeners().remove(&self.id);
        }
        self.receiver.close();
    }
}
