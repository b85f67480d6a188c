use crate::config::{Config, RconConfig, Settings};
use crate::error::{Error, Result};
use crate::gateway::CommandGateway;
use crate::registry::{
    ConnectionRegistry, ConnectionState, ConnectionUpdate, ServerStatus, StatusRegistry,
};
use std::future::Future;
use std::sync::Arc;

/// Orchestrates the connect/disconnect/execute protocol per server name.
///
/// The coordinator is the only component that drives the command gateway on
/// behalf of user actions. It keeps the [`ConnectionRegistry`] consistent
/// with every outcome it observes, enforces the at-most-one-concurrent
/// connect attempt guard, and drives the optimistic status transitions on
/// the [`StatusRegistry`].
///
/// Every gateway call is bounded by the configured operation timeout, so a
/// hung backend call settles as a [`Error::Timeout`] failure instead of
/// wedging an entry in `Connecting` forever.
///
/// All public methods are instrumented with `tracing` spans.
pub struct SessionCoordinator {
    /// Backend command boundary
    gateway: Arc<dyn CommandGateway>,
    /// Authoritative connection state
    connections: Arc<ConnectionRegistry>,
    /// Coarse process status
    statuses: Arc<StatusRegistry>,
    /// Defaults, overrides and behavior settings
    config: Config,
}

impl SessionCoordinator {
    /// Create a coordinator over the given gateway and registries.
    pub fn new(
        gateway: Arc<dyn CommandGateway>,
        connections: Arc<ConnectionRegistry>,
        statuses: Arc<StatusRegistry>,
        config: Config,
    ) -> Self {
        Self {
            gateway,
            connections,
            statuses,
            config,
        }
    }

    /// The connection registry this coordinator maintains.
    pub fn connections(&self) -> &Arc<ConnectionRegistry> {
        &self.connections
    }

    /// The status registry this coordinator maintains.
    pub fn statuses(&self) -> &Arc<StatusRegistry> {
        &self.statuses
    }

    /// The behavior settings in effect.
    pub fn settings(&self) -> &Settings {
        &self.config.settings
    }

    /// Establish (or re-establish) a server's RCON session using its
    /// configured parameters.
    ///
    /// Resolves the per-server override from the configuration, falling
    /// back to the defaults, then delegates to [`connect_with`].
    ///
    /// [`connect_with`]: SessionCoordinator::connect_with
    #[tracing::instrument(skip(self), fields(server_name = %server_name))]
    pub async fn connect(&self, server_name: &str) -> Result<bool> {
        let config = self.config.connection_for(server_name);
        self.connect_with(server_name, config).await
    }

    /// Establish (or re-establish) a server's RCON session with explicit
    /// parameters.
    ///
    /// Protocol: claim the attempt (no-op when one is already in flight),
    /// fetch the dynamic password, configure the endpoint, connect, then
    /// confirm actual reachability with the backend rather than trusting
    /// the connect call's silence.
    ///
    /// Returns the confirmed reachability. Any step failure settles the
    /// entry as disconnected with the failure recorded, and the error is
    /// returned so calling UI code can surface a one-off notification.
    #[tracing::instrument(skip(self, config), fields(server_name = %server_name))]
    pub async fn connect_with(&self, server_name: &str, config: RconConfig) -> Result<bool> {
        if !self.connections.try_begin_connect(server_name)? {
            tracing::debug!("Connect attempt already in flight, ignoring");
            return Ok(false);
        }

        tracing::info!("Connecting RCON session");
        let mut working = config;

        // The fetched secret supersedes whatever the static config carries;
        // the static password is only the fallback when the policy allows it.
        match self
            .call(
                "fetch RCON password",
                self.gateway.fetch_rcon_password(server_name),
            )
            .await
        {
            Ok(password) => working.password = password,
            Err(e) if self.config.settings.require_fetched_password => {
                return self.fail_connect(server_name, Error::PasswordFetch(e.raw_message()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Password fetch failed, falling back to configured password");
            }
        }

        if let Err(e) = self
            .call(
                "setup RCON",
                self.gateway
                    .setup_rcon(server_name, &working.host, working.port, &working.password),
            )
            .await
        {
            return self.fail_connect(server_name, wrap_step(e, Error::Setup));
        }

        if let Err(e) = self
            .call("connect RCON", self.gateway.connect_rcon(server_name))
            .await
        {
            return self.fail_connect(server_name, wrap_step(e, Error::Connect));
        }

        let confirmed = match self
            .call(
                "confirm RCON connection",
                self.gateway.is_rcon_connected(server_name),
            )
            .await
        {
            Ok(connected) => connected,
            Err(e) => return self.fail_connect(server_name, wrap_step(e, Error::Connect)),
        };

        self.connections.update(
            server_name,
            ConnectionUpdate {
                state: Some(if confirmed {
                    ConnectionState::Connected
                } else {
                    ConnectionState::Disconnected
                }),
                error: Some(None),
                config: Some(working),
            },
        )?;

        tracing::info!(connected = confirmed, "RCON session established");
        Ok(confirmed)
    }

    /// Release a server's RCON session.
    ///
    /// A failed disconnect records the error but leaves the stored
    /// reachability unchanged; it asserts nothing about the session state.
    #[tracing::instrument(skip(self), fields(server_name = %server_name))]
    pub async fn disconnect(&self, server_name: &str) -> Result<()> {
        match self
            .call("disconnect RCON", self.gateway.disconnect_rcon(server_name))
            .await
        {
            Ok(()) => {
                self.connections.update(
                    server_name,
                    ConnectionUpdate {
                        state: Some(ConnectionState::Disconnected),
                        error: Some(None),
                        ..Default::default()
                    },
                )?;
                tracing::info!("RCON session released");
                Ok(())
            }
            Err(e) => {
                let err = wrap_step(e, Error::Disconnect);
                tracing::warn!(error = %err, "Failed to release RCON session");
                self.connections.update(
                    server_name,
                    ConnectionUpdate {
                        error: Some(Some(err.to_string())),
                        ..Default::default()
                    },
                )?;
                Err(err)
            }
        }
    }

    /// Run a console command over a server's RCON session.
    ///
    /// Command execution doubles as the cheapest liveness probe: success
    /// flips a non-connected entry to connected immediately, and failure
    /// marks the entry disconnected without waiting for the next health
    /// poll. Failures are returned to the caller worded as "unreachable";
    /// the raw backend error only reaches debug logs.
    #[tracing::instrument(skip(self), fields(server_name = %server_name, command = %command))]
    pub async fn execute_command(&self, server_name: &str, command: &str) -> Result<String> {
        self.connections.update(
            server_name,
            ConnectionUpdate {
                error: Some(None),
                ..Default::default()
            },
        )?;

        match self
            .call(
                "execute RCON command",
                self.gateway.execute_rcon_command(server_name, command),
            )
            .await
        {
            Ok(response) => {
                let marked_connected = self
                    .connections
                    .get(server_name)?
                    .map(|conn| conn.is_connected())
                    .unwrap_or(false);

                if !marked_connected {
                    tracing::debug!("Command succeeded while marked disconnected, flipping state");
                    self.connections.update(
                        server_name,
                        ConnectionUpdate {
                            state: Some(ConnectionState::Connected),
                            ..Default::default()
                        },
                    )?;
                }

                Ok(response)
            }
            Err(e) => {
                tracing::debug!(error = %e, "RCON command failed");
                let err = Error::Unreachable(server_name.to_string());
                self.connections.update(
                    server_name,
                    ConnectionUpdate {
                        state: Some(ConnectionState::Disconnected),
                        error: Some(Some(err.to_string())),
                        ..Default::default()
                    },
                )?;
                Err(err)
            }
        }
    }

    /// Probe a server's RCON endpoint without keeping a session.
    #[tracing::instrument(skip(self), fields(server_name = %server_name))]
    pub async fn test_connection(&self, server_name: &str) -> Result<bool> {
        self.call(
            "test RCON connection",
            self.gateway.test_rcon_connection(server_name),
        )
        .await
    }

    /// Start a server's backend process.
    ///
    /// The status transitions optimistically through `Starting` and settles
    /// `Online`; a failure reverts to the pre-operation status and returns
    /// the error.
    #[tracing::instrument(skip(self), fields(server_name = %server_name))]
    pub async fn start_server(&self, server_name: &str) -> Result<()> {
        let previous = self.statuses.get(server_name)?;
        self.statuses.set(server_name, ServerStatus::Starting)?;
        tracing::info!("Starting server");

        let loader_kind = match self
            .call("query loader kind", self.gateway.loader_kind(server_name))
            .await
        {
            Ok(kind) => kind,
            Err(e) => {
                return self.fail_transition(server_name, previous, wrap_step(e, Error::Start));
            }
        };

        if let Err(e) = self
            .call(
                "start server",
                self.gateway.start_server(server_name, &loader_kind),
            )
            .await
        {
            return self.fail_transition(server_name, previous, wrap_step(e, Error::Start));
        }

        self.statuses.set(server_name, ServerStatus::Online)?;
        tracing::info!(loader_kind = %loader_kind, "Server started");
        Ok(())
    }

    /// Stop a server's backend process.
    ///
    /// The status transitions optimistically through `Stopping` and settles
    /// `Offline`; a failure reverts to the pre-operation status and returns
    /// the error.
    #[tracing::instrument(skip(self), fields(server_name = %server_name))]
    pub async fn stop_server(&self, server_name: &str) -> Result<()> {
        let previous = self.statuses.get(server_name)?;
        self.statuses.set(server_name, ServerStatus::Stopping)?;
        tracing::info!("Stopping server");

        if let Err(e) = self
            .call("stop server", self.gateway.stop_server(server_name))
            .await
        {
            return self.fail_transition(server_name, previous, wrap_step(e, Error::Stop));
        }

        self.statuses.set(server_name, ServerStatus::Offline)?;
        tracing::info!("Server stopped");
        Ok(())
    }

    /// Best-effort release of every known RCON session.
    ///
    /// Failures are logged per server and do not stop the sweep.
    #[tracing::instrument(skip(self))]
    pub async fn disconnect_all(&self) {
        let server_names: Vec<String> = match self.connections.snapshot() {
            Ok(snapshot) => snapshot.into_keys().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to snapshot connections for shutdown");
                return;
            }
        };

        for server_name in server_names {
            if let Err(e) = self.disconnect(&server_name).await {
                tracing::warn!(server = %server_name, error = %e, "Failed to disconnect during shutdown");
            }
        }
    }

    /// Query whether a server's backend process is running, bounded by the
    /// operation timeout. Used by the health monitor.
    pub(crate) async fn probe_server_running(&self, server_name: &str) -> Result<bool> {
        self.call(
            "check server running",
            self.gateway.is_server_running(server_name),
        )
        .await
    }

    /// Query a server's actual RCON reachability, bounded by the operation
    /// timeout. Used by the health monitor.
    pub(crate) async fn probe_rcon_connected(&self, server_name: &str) -> Result<bool> {
        self.call(
            "check RCON connection",
            self.gateway.is_rcon_connected(server_name),
        )
        .await
    }

    /// Bound a gateway call by the configured operation timeout.
    async fn call<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let timeout = self.config.settings.operation_timeout();
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "{} did not resolve within {}s",
                what,
                timeout.as_secs()
            ))),
        }
    }

    /// Settle a failed connect attempt: record the failure, hand the error
    /// back to the caller.
    fn fail_connect<T>(&self, server_name: &str, err: Error) -> Result<T> {
        tracing::warn!(error = %err, "Connect attempt failed");
        self.connections.update(
            server_name,
            ConnectionUpdate {
                state: Some(ConnectionState::Disconnected),
                error: Some(Some(err.to_string())),
                ..Default::default()
            },
        )?;
        Err(err)
    }

    /// Revert an optimistic status transition and hand the error back.
    fn fail_transition(&self, server_name: &str, previous: ServerStatus, err: Error) -> Result<()> {
        tracing::warn!(error = %err, "Status transition failed, reverting");
        self.statuses.set(server_name, previous)?;
        Err(err)
    }
}

/// Wrap a raw gateway failure into an operation-specific variant; any other
/// error (timeout, registry) passes through untouched.
fn wrap_step(err: Error, wrap: fn(String) -> Error) -> Error {
    match err {
        Error::Gateway(msg) => wrap(msg),
        other => other,
    }
}
