//! Recording stand-ins for the transport and diagnostics seams.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::error::Error;

use crate::diagnostics::{Diagnostics, FailureContext};
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Replays queued outcomes in order and records every request.
#[derive(Debug, Default)]
pub struct StubTransport {
    replies: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn replying(bodies: &[&str]) -> Self {
        let stub = Self::default();
        for body in bodies {
            stub.push(Ok(HttpResponse::ok(body)));
        }
        stub
    }

    pub fn push(&self, reply: Result<HttpResponse, TransportError>) {
        self.replies.borrow_mut().push_back(reply);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }
}

impl Transport for StubTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connection("no reply queued".to_string())))
    }
}

/// A captured failure, flattened for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub kind: String,
    pub account_id: String,
    pub host: String,
    pub endpoint: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    pub logs: RefCell<Vec<String>>,
    pub captures: RefCell<Vec<Captured>>,
}

impl Diagnostics for RecordingDiagnostics {
    fn log_error(&self, message: &str) {
        self.logs.borrow_mut().push(message.to_string());
    }

    fn capture(&self, context: &FailureContext<'_>, error: &(dyn Error + 'static)) {
        self.captures.borrow_mut().push(Captured {
            kind: context.kind.to_string(),
            account_id: context.account_id.to_string(),
            host: context.host.to_string(),
            endpoint: context.endpoint.to_string(),
            error: error.to_string(),
        });
    }
}
