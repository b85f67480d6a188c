/*!
 # Craft Console

 A Rust library for coordinating RCON console sessions and lifecycle state
 for locally hosted Minecraft servers.

 ## Overview

 Craft Console provides functionality to:
 - Track per-server RCON connection state in one authoritative registry
 - Connect, disconnect and run console commands with a guarded protocol
 - Start and stop server processes with optimistic, revertible status
 - Reconcile recorded state against backend reality on a timer
 - Notify UI consumers of every state change over a broadcast feed

 All backend interaction goes through the [`CommandGateway`] trait; the
 host application supplies the implementation that actually reaches its
 process supervisor and RCON transport; this crate owns the coordination
 around it.

 ## Basic Usage

 ```no_run
 use craft_console::{CommandGateway, ConsoleManager, Result};
 use std::sync::Arc;

 async fn run(gateway: Arc<dyn CommandGateway>) -> Result<()> {
     // Create a manager with default configuration
     let mut manager = ConsoleManager::from_config_str(gateway, "{}")?;

     // Keep registry state reconciled in the background
     manager.start_monitoring()?;

     // Start a server, then bring up its console session
     manager.start_server("Survival").await?;
     let connected = manager.connect("Survival").await?;

     if connected {
         let players = manager.execute_command("Survival", "list").await?;
         println!("Players: {players}");
     }

     Ok(())
 }
 ```

 ## Features

 - **Connection Registry**: single source of truth for console reachability
 - **Guarded Connects**: at most one in-flight attempt per server
 - **Timeouts**: every gateway call is bounded, nothing wedges in-flight
 - **Health Monitoring**: fixed or adaptive polling cadence
 - **Change Events**: subscribe instead of holding state copies
 - **Async Support**: full async/await support

 ## License

 This project is licensed under the terms in the LICENSE file.
*/

pub mod config;
pub mod error;
pub mod gateway;
pub mod registry;
pub mod session;

pub use config::Config;
pub use error::{Error, Result};
pub use gateway::CommandGateway;
pub use registry::{
    ConnectionRegistry, ConnectionState, ConnectionUpdate, RconConnection, RegistryEvent,
    ServerStatus, StatusRegistry,
};
pub use session::{HealthMonitor, MonitorCadence, SessionCoordinator};

use crate::config::RconConfig;
use crate::registry::EventManager;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Coordinate console sessions and lifecycle state for a fleet of servers
///
/// This struct is the main entry point: it wires the gateway, both
/// registries, the session coordinator and the health monitor together and
/// exposes the whole operation surface behind one handle.
/// All public methods are instrumented with `tracing` spans.
pub struct ConsoleManager {
    /// Protocol implementation over the gateway
    coordinator: Arc<SessionCoordinator>,
    /// Background reconciliation loop
    monitor: HealthMonitor,
    /// Authoritative connection state
    connections: Arc<ConnectionRegistry>,
    /// Coarse process status
    statuses: Arc<StatusRegistry>,
    /// Change feed both registries emit on
    events: Arc<EventManager>,
}

impl ConsoleManager {
    /// Create a new console manager from a configuration file path
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(gateway, path), fields(config_path = ?path.as_ref()))]
    pub fn from_config_file(
        gateway: Arc<dyn CommandGateway>,
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        tracing::info!("Loading configuration from file");
        let config = Config::from_file(path)?;
        config::validate_config(&config)?;
        Ok(Self::new(gateway, config))
    }

    /// Create a new console manager from a configuration string
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(gateway, content))]
    pub fn from_config_str(gateway: Arc<dyn CommandGateway>, content: &str) -> Result<Self> {
        tracing::info!("Loading configuration from string");
        let config = Config::parse_from_str(content)?;
        config::validate_config(&config)?;
        Ok(Self::new(gateway, config))
    }

    /// Create a new console manager from a configuration
    ///
    /// The health monitor is created with the fleet-wide fixed cadence; it
    /// does not run until [`start_monitoring`](Self::start_monitoring) is
    /// called. For a per-view adaptive monitor, build a [`HealthMonitor`]
    /// directly over [`coordinator`](Self::coordinator).
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(gateway, config), fields(num_overrides = config.servers.len()))]
    pub fn new(gateway: Arc<dyn CommandGateway>, config: Config) -> Self {
        tracing::info!("Creating new ConsoleManager");
        let events = Arc::new(EventManager::default());
        let connections = Arc::new(ConnectionRegistry::new(Arc::clone(&events)));
        let statuses = Arc::new(StatusRegistry::new(Arc::clone(&events)));

        let cadence = MonitorCadence::fleet(&config.settings);
        let coordinator = Arc::new(SessionCoordinator::new(
            gateway,
            Arc::clone(&connections),
            Arc::clone(&statuses),
            config,
        ));
        let monitor = HealthMonitor::new(Arc::clone(&coordinator), cadence);

        Self {
            coordinator,
            monitor,
            connections,
            statuses,
            events,
        }
    }

    /// The session coordinator behind this manager.
    ///
    /// Useful for wiring additional monitors or passing the operation
    /// surface to another component without the monitor handle.
    pub fn coordinator(&self) -> Arc<SessionCoordinator> {
        Arc::clone(&self.coordinator)
    }

    /// Establish (or re-establish) a server's RCON session using its
    /// configured parameters.
    ///
    /// Returns the confirmed reachability; returns `false` without touching
    /// the gateway when an attempt is already in flight.
    pub async fn connect(&self, server_name: &str) -> Result<bool> {
        self.coordinator.connect(server_name).await
    }

    /// Establish (or re-establish) a server's RCON session with explicit
    /// parameters.
    pub async fn connect_with(&self, server_name: &str, config: RconConfig) -> Result<bool> {
        self.coordinator.connect_with(server_name, config).await
    }

    /// Release a server's RCON session.
    pub async fn disconnect(&self, server_name: &str) -> Result<()> {
        self.coordinator.disconnect(server_name).await
    }

    /// Run a console command over a server's RCON session.
    pub async fn execute_command(&self, server_name: &str, command: &str) -> Result<String> {
        self.coordinator.execute_command(server_name, command).await
    }

    /// Probe a server's RCON endpoint without keeping a session.
    pub async fn test_connection(&self, server_name: &str) -> Result<bool> {
        self.coordinator.test_connection(server_name).await
    }

    /// Start a server's backend process.
    pub async fn start_server(&self, server_name: &str) -> Result<()> {
        self.coordinator.start_server(server_name).await
    }

    /// Stop a server's backend process.
    pub async fn stop_server(&self, server_name: &str) -> Result<()> {
        self.coordinator.stop_server(server_name).await
    }

    /// Best-effort release of every known RCON session.
    pub async fn disconnect_all(&self) {
        self.coordinator.disconnect_all().await;
    }

    /// A server's connection entry, or `None` if it was never referenced.
    pub fn connection(&self, server_name: &str) -> Result<Option<RconConnection>> {
        self.connections.get(server_name)
    }

    /// A server's coarse status; `Offline` if never written.
    pub fn status(&self, server_name: &str) -> Result<ServerStatus> {
        self.statuses.get(server_name)
    }

    /// A point-in-time copy of every server's status.
    pub fn all_statuses(&self) -> Result<HashMap<String, ServerStatus>> {
        self.statuses.all()
    }

    /// Names of all servers currently recorded as connected.
    pub fn connected_servers(&self) -> Result<Vec<String>> {
        self.connections.connected_servers()
    }

    /// Subscribe to registry change events.
    ///
    /// Each call creates an independent subscriber observing every
    /// connection and status change from that point on.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Start the background health monitor. Idempotent.
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self))]
    pub fn start_monitoring(&mut self) -> Result<()> {
        self.monitor.start()
    }

    /// Stop the background health monitor. Idempotent.
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self))]
    pub fn stop_monitoring(&mut self) -> Result<()> {
        self.monitor.stop()
    }

    /// Stop tracking a server entirely.
    ///
    /// Performs a best-effort disconnect (failure is logged, not returned)
    /// and drops the server's entries from both registries.
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self), fields(server_name = %server_name))]
    pub async fn forget_server(&self, server_name: &str) -> Result<()> {
        tracing::info!("Forgetting server");

        let has_entry = self.connections.get(server_name)?.is_some();
        if has_entry {
            if let Err(e) = self.coordinator.disconnect(server_name).await {
                tracing::warn!(error = %e, "Failed to disconnect while forgetting server");
            }
        }

        self.connections.remove(server_name)?;
        self.statuses.remove(server_name)?;

        Ok(())
    }
}
