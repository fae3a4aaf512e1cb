//! Error types for the Turnitin API client.
//!
//! # Design
//! Only failures the caller cannot treat as data become `Err`: a bad
//! configuration, a submission type the integration does not handle, and a
//! transport that never produced a response. Errors reported by the vendor
//! and bodies that cannot be interpreted are returned as
//! [`RemoteError`](crate::response::RemoteError) values instead, so batch
//! operations keep going after one of them.

use thiserror::Error;

/// Errors returned by `TurnitinClient` and `ClientConfig`.
#[derive(Debug, Error)]
pub enum TurnitinError {
    /// The account id is missing or empty.
    #[error("account id required")]
    MissingAccountId,

    /// The shared secret is missing or empty.
    #[error("shared secret required")]
    MissingSharedSecret,

    /// A configuration value could not be interpreted.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// `submit_paper` was called with a submission type it cannot send.
    #[error("unsupported submission type for turnitin integration: {0}")]
    UnsupportedSubmissionType(String),

    /// The service could not be reached. Already logged and captured by the
    /// client's diagnostics before being returned.
    #[error("turnitin api unreachable at {host}{endpoint}")]
    Unreachable {
        host: String,
        endpoint: String,
        #[source]
        source: TransportError,
    },
}

/// Failures raised by a [`Transport`](crate::transport::Transport)
/// implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response arrived within the read timeout.
    #[error("request timed out")]
    Timeout,

    /// Connecting, the TLS handshake, or sending the request failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The response arrived but its body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}
