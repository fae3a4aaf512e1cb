//! Error reporting side channel for the dispatcher.
//!
//! # Design
//! Logging and error capture are a capability handed to the client rather
//! than a global, so tests can record what would have been reported. The
//! default implementation emits `tracing` events; the application decides
//! where they go by installing a subscriber.

use std::error::Error;

use tracing::error;

/// Where and for which account a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureContext<'a> {
    /// Machine-readable failure class, e.g. `turnitin_api_unreachable`.
    pub kind: &'static str,
    pub account_id: &'a str,
    pub host: &'a str,
    pub endpoint: &'a str,
}

pub trait Diagnostics {
    /// Record an error-level log line.
    fn log_error(&self, message: &str);

    /// Report an exception-like failure together with its context.
    fn capture(&self, context: &FailureContext<'_>, error: &(dyn Error + 'static));
}

/// Default diagnostics: everything goes to `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn log_error(&self, message: &str) {
        error!("{message}");
    }

    fn capture(&self, context: &FailureContext<'_>, err: &(dyn Error + 'static)) {
        error!(
            kind = context.kind,
            account_id = context.account_id,
            host = context.host,
            endpoint = context.endpoint,
            error = %err,
            "turnitin request failed"
        );
    }
}
