use async_trait::async_trait;
use craft_console::config::{Config, Settings};
use craft_console::error::{Error, Result};
use craft_console::gateway::CommandGateway;
use craft_console::{
    ConnectionState, ConnectionUpdate, ConsoleManager, HealthMonitor, MonitorCadence, ServerStatus,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scriptable backend double: per-server process/RCON answers plus call
/// counters, so tests can assert which gateway operations a tick issued.
#[derive(Default)]
struct FakeBackend {
    running: Mutex<HashMap<String, bool>>,
    rcon_connected: Mutex<HashMap<String, bool>>,
    fail_polls: AtomicBool,
    running_checks: AtomicUsize,
    disconnect_calls: AtomicUsize,
}

impl FakeBackend {
    fn set_running(&self, server_name: &str, running: bool) {
        self.running
            .lock()
            .unwrap()
            .insert(server_name.to_string(), running);
    }

    fn set_rcon_connected(&self, server_name: &str, connected: bool) {
        self.rcon_connected
            .lock()
            .unwrap()
            .insert(server_name.to_string(), connected);
    }
}

#[async_trait]
impl CommandGateway for FakeBackend {
    async fn is_server_running(&self, server_name: &str) -> Result<bool> {
        self.running_checks.fetch_add(1, Ordering::SeqCst);
        if self.fail_polls.load(Ordering::SeqCst) {
            return Err(Error::Gateway("gateway hiccup".to_string()));
        }
        Ok(*self
            .running
            .lock()
            .unwrap()
            .get(server_name)
            .unwrap_or(&false))
    }

    async fn fetch_rcon_password(&self, _server_name: &str) -> Result<String> {
        Ok("abc123".to_string())
    }

    async fn setup_rcon(
        &self,
        _server_name: &str,
        _host: &str,
        _port: u16,
        _password: &str,
    ) -> Result<()> {
        Ok(())
    }

    async fn connect_rcon(&self, _server_name: &str) -> Result<()> {
        Ok(())
    }

    async fn is_rcon_connected(&self, server_name: &str) -> Result<bool> {
        if self.fail_polls.load(Ordering::SeqCst) {
            return Err(Error::Gateway("gateway hiccup".to_string()));
        }
        Ok(*self
            .rcon_connected
            .lock()
            .unwrap()
            .get(server_name)
            .unwrap_or(&false))
    }

    async fn disconnect_rcon(&self, _server_name: &str) -> Result<()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn execute_rcon_command(&self, _server_name: &str, _command: &str) -> Result<String> {
        Ok(String::new())
    }

    async fn test_rcon_connection(&self, _server_name: &str) -> Result<bool> {
        Ok(false)
    }

    async fn loader_kind(&self, _server_name: &str) -> Result<String> {
        Ok("vanilla".to_string())
    }

    async fn start_server(&self, _server_name: &str, _loader_kind: &str) -> Result<()> {
        Ok(())
    }

    async fn stop_server(&self, _server_name: &str) -> Result<()> {
        Ok(())
    }
}

fn manager_over(backend: &Arc<FakeBackend>) -> ConsoleManager {
    ConsoleManager::new(Arc::clone(backend) as Arc<dyn CommandGateway>, Config::default())
}

fn mark_connected(manager: &ConsoleManager, server_name: &str) {
    manager
        .coordinator()
        .connections()
        .update(
            server_name,
            ConnectionUpdate {
                state: Some(ConnectionState::Connected),
                ..Default::default()
            },
        )
        .unwrap();
    manager
        .coordinator()
        .statuses()
        .set(server_name, ServerStatus::Online)
        .unwrap();
}

#[tokio::test]
async fn test_tick_fully_disconnects_stopped_server() {
    let backend = Arc::new(FakeBackend::default());
    let manager = manager_over(&backend);
    mark_connected(&manager, "Survival");
    backend.set_running("Survival", false);

    let monitor = HealthMonitor::new(
        manager.coordinator(),
        MonitorCadence::fleet(&Settings::default()),
    );
    monitor.run_once().await;

    // A stopped process triggers a real disconnect so the backend releases
    // its session, not just a registry flag flip.
    assert_eq!(backend.disconnect_calls.load(Ordering::SeqCst), 1);

    let conn = manager.connection("Survival").unwrap().unwrap();
    assert!(!conn.is_connected());
    assert_eq!(manager.status("Survival").unwrap(), ServerStatus::Offline);
}

#[tokio::test]
async fn test_tick_detects_silent_rcon_drop() {
    let backend = Arc::new(FakeBackend::default());
    let manager = manager_over(&backend);
    mark_connected(&manager, "Survival");
    backend.set_running("Survival", true);
    backend.set_rcon_connected("Survival", false);

    let monitor = HealthMonitor::new(
        manager.coordinator(),
        MonitorCadence::fleet(&Settings::default()),
    );
    monitor.run_once().await;

    // The process is alive, so no full disconnect; only the stored
    // reachability is corrected.
    assert_eq!(backend.disconnect_calls.load(Ordering::SeqCst), 0);

    let conn = manager.connection("Survival").unwrap().unwrap();
    assert!(!conn.is_connected());
    assert_eq!(manager.status("Survival").unwrap(), ServerStatus::Online);
}

#[tokio::test]
async fn test_tick_agrees_with_stored_state() {
    let backend = Arc::new(FakeBackend::default());
    let manager = manager_over(&backend);
    mark_connected(&manager, "Survival");
    backend.set_running("Survival", true);
    backend.set_rcon_connected("Survival", true);

    let monitor = HealthMonitor::new(
        manager.coordinator(),
        MonitorCadence::fleet(&Settings::default()),
    );
    monitor.run_once().await;

    let conn = manager.connection("Survival").unwrap().unwrap();
    assert!(conn.is_connected());
}

#[tokio::test]
async fn test_tick_poll_failure_is_no_information() {
    let backend = Arc::new(FakeBackend::default());
    let manager = manager_over(&backend);
    mark_connected(&manager, "Survival");
    backend.fail_polls.store(true, Ordering::SeqCst);

    let monitor = HealthMonitor::new(
        manager.coordinator(),
        MonitorCadence::fleet(&Settings::default()),
    );
    // Repeated failing polls must never mark a working connection as
    // failed.
    for _ in 0..5 {
        monitor.run_once().await;
    }

    assert_eq!(backend.disconnect_calls.load(Ordering::SeqCst), 0);
    let conn = manager.connection("Survival").unwrap().unwrap();
    assert!(conn.is_connected());
    assert!(conn.error.is_none());
    assert_eq!(manager.status("Survival").unwrap(), ServerStatus::Online);
}

#[tokio::test]
async fn test_tick_skips_servers_not_marked_connected() {
    let backend = Arc::new(FakeBackend::default());
    let manager = manager_over(&backend);
    manager
        .coordinator()
        .connections()
        .update(
            "Survival",
            ConnectionUpdate {
                state: Some(ConnectionState::Disconnected),
                ..Default::default()
            },
        )
        .unwrap();

    let monitor = HealthMonitor::new(
        manager.coordinator(),
        MonitorCadence::fleet(&Settings::default()),
    );
    monitor.run_once().await;

    assert_eq!(backend.running_checks.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cadence_selection() {
    let settings = Settings::default();

    let fleet = MonitorCadence::fleet(&settings);
    assert_eq!(fleet.next_interval(false), Duration::from_secs(5));
    assert_eq!(fleet.next_interval(true), Duration::from_secs(5));

    let per_view = MonitorCadence::per_view(&settings);
    assert_eq!(per_view.next_interval(true), Duration::from_secs(3));
    assert_eq!(per_view.next_interval(false), Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn test_background_monitoring_reconciles_over_time() {
    let backend = Arc::new(FakeBackend::default());
    let mut manager = manager_over(&backend);
    mark_connected(&manager, "Survival");
    backend.set_running("Survival", true);
    backend.set_rcon_connected("Survival", false);

    manager.start_monitoring().unwrap();
    // Starting twice is a no-op.
    manager.start_monitoring().unwrap();

    // Well past the 5s fleet cadence in virtual time.
    tokio::time::sleep(Duration::from_secs(30)).await;

    let conn = manager.connection("Survival").unwrap().unwrap();
    assert!(!conn.is_connected());

    manager.stop_monitoring().unwrap();
    manager.stop_monitoring().unwrap();
}
