//! Session orchestration.
//!
//! [`SessionCoordinator`] implements the connect/disconnect/execute
//! protocol and the optimistic start/stop transitions over the command
//! gateway; [`HealthMonitor`] reconciles registry state against backend
//! reality on a timer.

mod coordinator;
mod monitor;

pub use coordinator::SessionCoordinator;
pub use monitor::{HealthMonitor, MonitorCadence};
