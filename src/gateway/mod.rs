//! Command gateway boundary.
//!
//! Every backend interaction (starting and stopping server processes,
//! configuring and driving RCON sessions, querying running state) goes
//! through the [`CommandGateway`] trait. The library never talks to a
//! process or a socket itself; it coordinates state around whatever
//! implementation the host application provides (a Tauri invoke bridge,
//! an IPC client, an in-process supervisor, a test double).
//!
//! Implementations report backend-side failures as
//! [`Error::Gateway`](crate::Error::Gateway) carrying the backend's raw
//! message; the session coordinator wraps those into operation-specific
//! variants before they reach callers or the registry.

use crate::error::Result;
use async_trait::async_trait;

/// Asynchronous request/response boundary to the server backend.
///
/// One method per backend operation the core consumes. All methods take the
/// stable server name as the key; identifiers, transports and encodings
/// behind this trait are the implementation's concern.
///
/// The trait is object-safe and used behind `Arc<dyn CommandGateway>`, so a
/// single implementation can serve the coordinator, the health monitor and
/// any number of UI surfaces concurrently.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use craft_console::error::Result;
/// use craft_console::gateway::CommandGateway;
///
/// struct NullGateway;
///
/// #[async_trait]
/// impl CommandGateway for NullGateway {
///     async fn is_server_running(&self, _server_name: &str) -> Result<bool> { Ok(false) }
///     async fn fetch_rcon_password(&self, _server_name: &str) -> Result<String> {
///         Ok("secret".to_string())
///     }
///     async fn setup_rcon(
///         &self,
///         _server_name: &str,
///         _host: &str,
///         _port: u16,
///         _password: &str,
///     ) -> Result<()> { Ok(()) }
///     async fn connect_rcon(&self, _server_name: &str) -> Result<()> { Ok(()) }
///     async fn is_rcon_connected(&self, _server_name: &str) -> Result<bool> { Ok(false) }
///     async fn disconnect_rcon(&self, _server_name: &str) -> Result<()> { Ok(()) }
///     async fn execute_rcon_command(&self, _server_name: &str, command: &str) -> Result<String> {
///         Ok(format!("ran {command}"))
///     }
///     async fn test_rcon_connection(&self, _server_name: &str) -> Result<bool> { Ok(false) }
///     async fn loader_kind(&self, _server_name: &str) -> Result<String> {
///         Ok("vanilla".to_string())
///     }
///     async fn start_server(&self, _server_name: &str, _loader_kind: &str) -> Result<()> { Ok(()) }
///     async fn stop_server(&self, _server_name: &str) -> Result<()> { Ok(()) }
/// }
/// ```
#[async_trait]
pub trait CommandGateway: Send + Sync {
    /// Whether the backend server process itself is currently running.
    async fn is_server_running(&self, server_name: &str) -> Result<bool>;

    /// Fetch the server's dynamic RCON password.
    ///
    /// The secret is per-server and owned by the backend (typically read
    /// from the server's own configuration). A failure here is surfaced as
    /// an explicit `Err`; whether the caller falls back to a statically
    /// configured password is policy, not this method's concern.
    async fn fetch_rcon_password(&self, server_name: &str) -> Result<String>;

    /// Configure the RCON endpoint parameters for a server.
    async fn setup_rcon(
        &self,
        server_name: &str,
        host: &str,
        port: u16,
        password: &str,
    ) -> Result<()>;

    /// Establish the RCON session for a server.
    async fn connect_rcon(&self, server_name: &str) -> Result<()>;

    /// Whether the backend currently holds a live RCON session for a server.
    async fn is_rcon_connected(&self, server_name: &str) -> Result<bool>;

    /// Release the RCON session for a server.
    async fn disconnect_rcon(&self, server_name: &str) -> Result<()>;

    /// Run a console command over the server's RCON session.
    async fn execute_rcon_command(&self, server_name: &str, command: &str) -> Result<String>;

    /// Probe the RCON endpoint without keeping a session.
    async fn test_rcon_connection(&self, server_name: &str) -> Result<bool>;

    /// The loader/runtime kind the server was set up with.
    ///
    /// Returned verbatim (e.g. `"vanilla"`, `"fabric"`, `"paper"`); the
    /// catalog is backend-owned and treated as opaque here.
    async fn loader_kind(&self, server_name: &str) -> Result<String>;

    /// Start the server process.
    async fn start_server(&self, server_name: &str, loader_kind: &str) -> Result<()>;

    /// Stop the server process.
    async fn stop_server(&self, server_name: &str) -> Result<()>;
}
