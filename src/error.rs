/// Error handling module for craft-console.
///
/// This module defines the error types used throughout the library.
/// It provides a comprehensive set of errors that can occur when
/// coordinating RCON sessions and server lifecycle state, along with
/// helpful context for debugging.
///
/// # Example
///
/// ```
/// use craft_console::error::{Error, Result};
///
/// fn handle_error(result: Result<()>) {
///     match result {
///         Ok(_) => println!("Operation succeeded"),
///         Err(Error::Unreachable(name)) => println!("Server '{}' cannot be reached", name),
///         Err(Error::Timeout(msg)) => println!("Operation timed out: {}", msg),
///         Err(e) => println!("Other error: {}", e),
///     }
/// }
/// ```
use thiserror::Error;

/// Errors that can occur in the craft-console library.
///
/// This enum represents all possible error types that can be returned from
/// operations in the library. Each variant includes context information to
/// help diagnose and handle the error appropriately.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to parse configuration from a file or string.
    ///
    /// This error occurs when:
    /// - The configuration JSON is malformed
    /// - Required fields are missing
    /// - Field types are incorrect
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration is valid JSON but contains invalid values.
    ///
    /// This error occurs when:
    /// - A connection port is zero
    /// - A host is empty
    /// - A timeout or polling interval is zero
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Raw failure reported by the command gateway backend.
    ///
    /// Gateway implementations return this variant for any backend-side
    /// failure. The payload is the backend's own message, carried verbatim
    /// so coordination code can wrap it into an operation-specific variant
    /// without double prefixes.
    #[error("{0}")]
    Gateway(String),

    /// The dynamic RCON password could not be fetched.
    ///
    /// This error occurs when:
    /// - The gateway's password lookup fails and the configured policy
    ///   requires the fetched secret (no static fallback allowed)
    #[error("Failed to fetch RCON password: {0}")]
    PasswordFetch(String),

    /// RCON could not be configured for a server.
    ///
    /// This error occurs when:
    /// - The gateway rejects the host/port/password parameters
    /// - The backend cannot reach the server's RCON endpoint during setup
    #[error("Failed to setup RCON: {0}")]
    Setup(String),

    /// The RCON connection could not be established or confirmed.
    ///
    /// This error occurs when:
    /// - The gateway's connect call fails
    /// - The post-connect reachability confirmation fails
    #[error("Failed to connect RCON: {0}")]
    Connect(String),

    /// The RCON connection could not be cleanly released.
    ///
    /// A failed disconnect does not assert anything about reachability;
    /// the stored connection state is left unchanged.
    #[error("Failed to disconnect RCON: {0}")]
    Disconnect(String),

    /// A console command could not be delivered to the server.
    ///
    /// This is the user-facing wording for command execution failures.
    /// The raw backend error is logged but never carried here, so terminal
    /// views do not leak backend error formats.
    #[error("Server '{0}' is unreachable")]
    Unreachable(String),

    /// The server process could not be started.
    #[error("Failed to start server: {0}")]
    Start(String),

    /// The server process could not be stopped.
    #[error("Failed to stop server: {0}")]
    Stop(String),

    /// Operation timed out.
    ///
    /// This error occurs when:
    /// - A gateway call does not resolve within the configured operation
    ///   timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Any other error not covered by the above categories.
    ///
    /// This is a catch-all error for cases not explicitly handled elsewhere.
    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// The raw message behind this error.
    ///
    /// For `Gateway` errors this is the backend's message without any
    /// prefix; for every other variant it is the display form. Used when
    /// wrapping a step failure into an operation-specific variant.
    pub fn raw_message(&self) -> String {
        match self {
            Error::Gateway(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for craft-console operations.
///
/// This is a convenience type alias for `std::result::Result` with the `Error` type
/// from this module. Use this throughout the library and in client code to handle
/// errors in a consistent way.
pub type Result<T> = std::result::Result<T, Error>;
