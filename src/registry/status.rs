use crate::error::{Error, Result};
use crate::registry::events::{EventManager, RegistryEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Coarse lifecycle status of a server process.
///
/// Independent of RCON reachability: a server can be online before RCON is
/// even configured. `Starting` and `Stopping` are the in-flight states of
/// the optimistic transitions; they settle to `Online`/`Offline` on success
/// and revert to the pre-operation status on failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    /// Process not running; the resting state for new entries.
    #[default]
    Offline,
    /// A start request is in flight.
    Starting,
    /// Process running.
    Online,
    /// A stop request is in flight.
    Stopping,
}

/// Map from server name to coarse online/offline status.
///
/// A pure state holder: transitions are driven by the session coordinator
/// (user actions) and the health monitor (backend reconciliation). Entries
/// default to [`ServerStatus::Offline`] until first written. Every actual
/// change emits a [`RegistryEvent::StatusChanged`] carrying the old and new
/// status.
pub struct StatusRegistry {
    /// Per-server statuses
    statuses: Mutex<HashMap<String, ServerStatus>>,
    /// Change feed shared with the connection registry
    events: Arc<EventManager>,
}

impl StatusRegistry {
    /// Create an empty registry emitting on the given change feed.
    pub fn new(events: Arc<EventManager>) -> Self {
        Self {
            statuses: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// A server's current status; `Offline` if never written.
    pub fn get(&self, server_name: &str) -> Result<ServerStatus> {
        let statuses = self
            .statuses
            .lock()
            .map_err(|_| Error::Other("Failed to lock status registry".to_string()))?;

        Ok(statuses.get(server_name).copied().unwrap_or_default())
    }

    /// Set a server's status, creating the entry when absent.
    ///
    /// Returns the previous status. Emits a change event only when the
    /// status actually changed.
    pub fn set(&self, server_name: &str, status: ServerStatus) -> Result<ServerStatus> {
        let old_status = {
            let mut statuses = self
                .statuses
                .lock()
                .map_err(|_| Error::Other("Failed to lock status registry".to_string()))?;

            let entry = statuses.entry(server_name.to_string()).or_default();
            let old = *entry;
            *entry = status;
            old
        };

        if old_status != status {
            self.events.emit(RegistryEvent::StatusChanged {
                server_name: server_name.to_string(),
                old_status,
                new_status: status,
            });
        }

        Ok(old_status)
    }

    /// A point-in-time copy of every server's status.
    pub fn all(&self) -> Result<HashMap<String, ServerStatus>> {
        let statuses = self
            .statuses
            .lock()
            .map_err(|_| Error::Other("Failed to lock status registry".to_string()))?;

        Ok(statuses.clone())
    }

    /// Drop a server's entry entirely.
    pub fn remove(&self, server_name: &str) -> Result<()> {
        let mut statuses = self
            .statuses
            .lock()
            .map_err(|_| Error::Other("Failed to lock status registry".to_string()))?;

        statuses.remove(server_name);

        Ok(())
    }
}
