//! Change notification for the registries.
//!
//! Multiple UI surfaces bind to the same per-server state; instead of each
//! holding private copies, consumers subscribe to a broadcast channel and
//! react to [`RegistryEvent`]s as registries mutate. Emission never blocks
//! a registry operation: with no subscribers the event is dropped quietly,
//! and a lagging subscriber loses oldest events per broadcast semantics.

use crate::registry::connection::RconConnection;
use crate::registry::status::ServerStatus;
use tokio::sync::broadcast;
use tracing;

/// Default buffered capacity for the change feed.
const DEFAULT_CAPACITY: usize = 64;

/// A change observed on one of the registries.
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    /// A server's connection entry was created or merged.
    ConnectionChanged {
        /// Server whose entry changed.
        server_name: String,
        /// The entry after the merge.
        connection: RconConnection,
    },
    /// A server's coarse status changed.
    StatusChanged {
        /// Server whose status changed.
        server_name: String,
        /// Status before the transition.
        old_status: ServerStatus,
        /// Status after the transition.
        new_status: ServerStatus,
    },
}

/// Handles broadcasting registry changes to subscribed consumers
///
/// This struct manages the broadcasting of events to any number of
/// subscribers using a Tokio broadcast channel. Both registries emit
/// through a shared instance so one subscription observes the whole model.
pub struct EventManager {
    /// Broadcast channel for sending events to all subscribers
    sender: broadcast::Sender<RegistryEvent>,
}

impl EventManager {
    /// Create a new event manager with the specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events buffered before old events are dropped
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Get a new receiver for the broadcast channel
    ///
    /// Each call creates an independent subscriber that observes every
    /// event emitted after the call.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.sender.subscribe()
    }

    /// Broadcast a registry change to all subscribers
    pub fn emit(&self, event: RegistryEvent) {
        if self.sender.receiver_count() > 0 {
            if let Err(e) = self.sender.send(event) {
                tracing::warn!(error = %e, "Failed to broadcast registry event");
            }
        } else {
            tracing::trace!("No registry event subscribers, event dropped");
        }
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
