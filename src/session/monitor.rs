use crate::config::Settings;
use crate::error::{Error, Result};
use crate::registry::{ConnectionState, ConnectionUpdate, ServerStatus};
use crate::session::SessionCoordinator;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;

/// Consecutive poll failures tolerated at debug level before escalating to
/// a warning.
const POLL_FAILURE_WARN_THRESHOLD: u32 = 3;

/// How often the monitor reconciles.
///
/// The fleet-wide monitor runs on a fixed cadence; the per-view variant
/// polls faster while a connect attempt is in flight and relaxes once the
/// fleet is settled. The two differ only in cadence, not protocol.
#[derive(Debug, Clone, Copy)]
pub enum MonitorCadence {
    /// One fixed interval between ticks.
    Fixed(Duration),
    /// `active` between ticks while any connect is in flight, `idle`
    /// otherwise.
    Adaptive {
        /// Interval while any connect attempt is in flight.
        active: Duration,
        /// Interval while the fleet is settled.
        idle: Duration,
    },
}

impl MonitorCadence {
    /// The fleet-wide cadence from the configured settings.
    pub fn fleet(settings: &Settings) -> Self {
        MonitorCadence::Fixed(settings.poll_interval())
    }

    /// The per-view adaptive cadence from the configured settings.
    pub fn per_view(settings: &Settings) -> Self {
        MonitorCadence::Adaptive {
            active: settings.active_poll_interval(),
            idle: settings.idle_poll_interval(),
        }
    }

    /// Interval to sleep before the next tick.
    pub fn next_interval(&self, any_connecting: bool) -> Duration {
        match self {
            MonitorCadence::Fixed(interval) => *interval,
            MonitorCadence::Adaptive { active, idle } => {
                if any_connecting {
                    *active
                } else {
                    *idle
                }
            }
        }
    }
}

/// Periodically reconciles registry state against backend reality.
///
/// For each server currently recorded as connected, a tick checks whether
/// the backend process is still alive. A dead process triggers a full
/// disconnect (not a flag flip) so any backend-held session is released;
/// otherwise the tick re-queries actual RCON reachability and merges the
/// stored state when it disagrees.
///
/// Poll failures carry no information: state is left untouched, and a
/// transient gateway hiccup can never mark a working connection as failed.
pub struct HealthMonitor {
    /// Coordinator used for probes and full disconnects
    coordinator: Arc<SessionCoordinator>,
    /// Tick cadence
    cadence: MonitorCadence,
    /// Consecutive poll failures per server, for log escalation
    failure_counts: Arc<Mutex<HashMap<String, u32>>>,
    /// Monitor task
    monitor_task: Option<JoinHandle<()>>,
    /// Running flag
    running: Arc<Mutex<bool>>,
}

impl HealthMonitor {
    /// Create a monitor over the given coordinator.
    pub fn new(coordinator: Arc<SessionCoordinator>, cadence: MonitorCadence) -> Self {
        Self {
            coordinator,
            cadence,
            failure_counts: Arc::new(Mutex::new(HashMap::new())),
            monitor_task: None,
            running: Arc::new(Mutex::new(false)),
        }
    }

    /// Start the background reconciliation loop. Idempotent.
    pub fn start(&mut self) -> Result<()> {
        {
            let mut running = self
                .running
                .lock()
                .map_err(|_| Error::Other("Failed to lock running flag".to_string()))?;

            if *running {
                return Ok(());
            }

            *running = true;
        }

        let coordinator = Arc::clone(&self.coordinator);
        let failure_counts = Arc::clone(&self.failure_counts);
        let running = Arc::clone(&self.running);
        let cadence = self.cadence;

        tracing::info!(?cadence, "Starting health monitor");

        let task = tokio::spawn(async move {
            loop {
                let any_connecting = coordinator
                    .connections()
                    .any_connecting()
                    .unwrap_or(false);
                time::sleep(cadence.next_interval(any_connecting)).await;

                // Check if we should stop
                {
                    let running_guard = running.lock().unwrap();
                    if !*running_guard {
                        break;
                    }
                }

                Self::tick(&coordinator, &failure_counts).await;
            }
        });

        self.monitor_task = Some(task);

        Ok(())
    }

    /// Stop the background loop. Idempotent.
    pub fn stop(&mut self) -> Result<()> {
        {
            let mut running = self
                .running
                .lock()
                .map_err(|_| Error::Other("Failed to lock running flag".to_string()))?;

            if !*running {
                return Ok(());
            }

            *running = false;
        }

        if let Some(task) = self.monitor_task.take() {
            task.abort();
        }

        tracing::info!("Health monitor stopped");
        Ok(())
    }

    /// Force one reconciliation pass immediately, outside the timer.
    ///
    /// Useful when a caller has fresh reason to distrust the recorded
    /// state (e.g. right after the application regains focus).
    pub async fn run_once(&self) {
        Self::tick(&self.coordinator, &self.failure_counts).await;
    }

    /// One reconciliation pass over every connected server.
    async fn tick(
        coordinator: &Arc<SessionCoordinator>,
        failure_counts: &Arc<Mutex<HashMap<String, u32>>>,
    ) {
        let connected = match coordinator.connections().connected_servers() {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list connected servers for health check");
                return;
            }
        };

        for server_name in connected {
            match coordinator.probe_server_running(&server_name).await {
                Ok(false) => {
                    Self::reset_failures(failure_counts, &server_name);
                    tracing::info!(
                        server = %server_name,
                        "Backend process stopped, releasing RCON session"
                    );

                    // Full disconnect so the backend drops its session too.
                    if let Err(e) = coordinator.disconnect(&server_name).await {
                        tracing::warn!(
                            server = %server_name,
                            error = %e,
                            "Failed to release session for stopped server"
                        );
                    }

                    if let Err(e) = coordinator
                        .statuses()
                        .set(&server_name, ServerStatus::Offline)
                    {
                        tracing::warn!(server = %server_name, error = %e, "Failed to reconcile status");
                    }
                }
                Ok(true) => match coordinator.probe_rcon_connected(&server_name).await {
                    Ok(actual) => {
                        Self::reset_failures(failure_counts, &server_name);

                        let stored = coordinator
                            .connections()
                            .get(&server_name)
                            .ok()
                            .flatten()
                            .map(|conn| conn.is_connected())
                            .unwrap_or(false);

                        if actual != stored {
                            tracing::info!(
                                server = %server_name,
                                connected = actual,
                                "RCON reachability drifted, updating registry"
                            );
                            if let Err(e) = coordinator.connections().update(
                                &server_name,
                                ConnectionUpdate {
                                    state: Some(if actual {
                                        ConnectionState::Connected
                                    } else {
                                        ConnectionState::Disconnected
                                    }),
                                    ..Default::default()
                                },
                            ) {
                                tracing::warn!(server = %server_name, error = %e, "Failed to update registry");
                            }
                        }
                    }
                    Err(e) => Self::record_failure(failure_counts, &server_name, &e),
                },
                Err(e) => Self::record_failure(failure_counts, &server_name, &e),
            }
        }
    }

    /// A poll failure is "no information": log it, count it, change nothing.
    fn record_failure(
        failure_counts: &Arc<Mutex<HashMap<String, u32>>>,
        server_name: &str,
        error: &Error,
    ) {
        let count = {
            let mut counts = failure_counts.lock().unwrap();
            let count = counts.entry(server_name.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        if count >= POLL_FAILURE_WARN_THRESHOLD {
            tracing::warn!(
                server = %server_name,
                consecutive_failures = count,
                error = %error,
                "Health poll keeps failing, leaving state unchanged"
            );
        } else {
            tracing::debug!(server = %server_name, error = %error, "Health poll failed, leaving state unchanged");
        }
    }

    fn reset_failures(failure_counts: &Arc<Mutex<HashMap<String, u32>>>, server_name: &str) {
        let mut counts = failure_counts.lock().unwrap();
        counts.remove(server_name);
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.monitor_task.take() {
            task.abort();
        }
    }
}
