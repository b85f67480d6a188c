use crate::config::RconConfig;
use crate::error::{Error, Result};
use crate::registry::events::{EventManager, RegistryEvent};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Where a server's RCON session currently stands.
///
/// The state is a single enum rather than a pair of booleans, so a session
/// can never read as connected and connecting at the same time. The last
/// failure message lives in [`RconConnection::error`] instead of a state
/// variant because an error must be able to coexist with any state: a
/// failed disconnect records an error while reachability stays whatever it
/// was.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live session; the resting state for new entries.
    #[default]
    Disconnected,
    /// A connect attempt is in flight; gates re-entry into `connect`.
    Connecting,
    /// The last operation against this session succeeded. No guarantee
    /// about the next one.
    Connected,
}

/// Connection-state entry for a single named server.
///
/// Created lazily on first reference with default fields; persists for the
/// application session (entries are only removed when a server is forgotten
/// outright). Multiple servers' entries coexist independently.
#[derive(Debug, Clone, Default)]
pub struct RconConnection {
    /// Current session state.
    pub state: ConnectionState,
    /// Last failure, cleared by the next successful operation.
    pub error: Option<String>,
    /// Connection parameters last used (or defaults until first use).
    pub config: RconConfig,
}

impl RconConnection {
    /// Whether the last known state of this session is reachable.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Whether a connect attempt is currently in flight.
    pub fn is_connecting(&self) -> bool {
        self.state == ConnectionState::Connecting
    }
}

/// Partial-fields payload for [`ConnectionRegistry::update`].
///
/// `None` leaves a field untouched; `Some` overwrites it. The `error` field
/// is doubly wrapped so an update can distinguish "leave the error alone"
/// (`None`) from "clear the error" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct ConnectionUpdate {
    /// New session state, if changing.
    pub state: Option<ConnectionState>,
    /// New error value, if changing (use `Some(None)` to clear).
    pub error: Option<Option<String>>,
    /// New connection parameters, if changing.
    pub config: Option<RconConfig>,
}

/// Authoritative map from server name to RCON connection state.
///
/// This registry is the single source of truth for "is this server's
/// console reachable". All mutation goes through [`update`] (or its
/// specialized atomic guard [`try_begin_connect`]); each merge emits a
/// [`RegistryEvent::ConnectionChanged`] so UI consumers can react without
/// holding copies.
///
/// The map lock is never held across an await point; every
/// read-modify-write that must be atomic happens inside one lock
/// acquisition.
///
/// [`update`]: ConnectionRegistry::update
/// [`try_begin_connect`]: ConnectionRegistry::try_begin_connect
pub struct ConnectionRegistry {
    /// Per-server connection entries
    connections: Mutex<HashMap<String, RconConnection>>,
    /// Change feed shared with the status registry
    events: Arc<EventManager>,
}

impl ConnectionRegistry {
    /// Create an empty registry emitting on the given change feed.
    pub fn new(events: Arc<EventManager>) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Get a server's connection entry, or `None` if it was never
    /// referenced.
    pub fn get(&self, server_name: &str) -> Result<Option<RconConnection>> {
        let connections = self
            .connections
            .lock()
            .map_err(|_| Error::Other("Failed to lock connection registry".to_string()))?;

        Ok(connections.get(server_name).cloned())
    }

    /// Merge fields into a server's entry, creating it with defaults first
    /// when absent. This is the registry's only mutation primitive.
    ///
    /// Returns the entry after the merge.
    pub fn update(&self, server_name: &str, update: ConnectionUpdate) -> Result<RconConnection> {
        let merged = {
            let mut connections = self
                .connections
                .lock()
                .map_err(|_| Error::Other("Failed to lock connection registry".to_string()))?;

            let entry = connections.entry(server_name.to_string()).or_default();

            if let Some(state) = update.state {
                entry.state = state;
            }
            if let Some(error) = update.error {
                entry.error = error;
            }
            if let Some(config) = update.config {
                entry.config = config;
            }

            entry.clone()
        };

        self.events.emit(RegistryEvent::ConnectionChanged {
            server_name: server_name.to_string(),
            connection: merged.clone(),
        });

        Ok(merged)
    }

    /// Atomically claim the right to run a connect attempt.
    ///
    /// Returns `false` without touching the entry when an attempt is
    /// already in flight. Otherwise transitions the entry (created with
    /// defaults when absent) to [`ConnectionState::Connecting`], clears its
    /// error, and returns `true`.
    ///
    /// The check and the transition happen under one lock acquisition, so
    /// two racing callers can never both claim the attempt.
    pub fn try_begin_connect(&self, server_name: &str) -> Result<bool> {
        let merged = {
            let mut connections = self
                .connections
                .lock()
                .map_err(|_| Error::Other("Failed to lock connection registry".to_string()))?;

            let entry = connections.entry(server_name.to_string()).or_default();

            if entry.state == ConnectionState::Connecting {
                return Ok(false);
            }

            entry.state = ConnectionState::Connecting;
            entry.error = None;
            entry.clone()
        };

        self.events.emit(RegistryEvent::ConnectionChanged {
            server_name: server_name.to_string(),
            connection: merged,
        });

        Ok(true)
    }

    /// Names of all servers currently recorded as connected.
    pub fn connected_servers(&self) -> Result<Vec<String>> {
        let connections = self
            .connections
            .lock()
            .map_err(|_| Error::Other("Failed to lock connection registry".to_string()))?;

        Ok(connections
            .iter()
            .filter(|(_, conn)| conn.is_connected())
            .map(|(name, _)| name.clone())
            .collect())
    }

    /// Whether any server has a connect attempt in flight.
    pub fn any_connecting(&self) -> Result<bool> {
        let connections = self
            .connections
            .lock()
            .map_err(|_| Error::Other("Failed to lock connection registry".to_string()))?;

        Ok(connections.values().any(|conn| conn.is_connecting()))
    }

    /// A point-in-time copy of every entry.
    pub fn snapshot(&self) -> Result<HashMap<String, RconConnection>> {
        let connections = self
            .connections
            .lock()
            .map_err(|_| Error::Other("Failed to lock connection registry".to_string()))?;

        Ok(connections.clone())
    }

    /// Drop a server's entry entirely.
    pub fn remove(&self, server_name: &str) -> Result<()> {
        let mut connections = self
            .connections
            .lock()
            .map_err(|_| Error::Other("Failed to lock connection registry".to_string()))?;

        connections.remove(server_name);

        Ok(())
    }
}
