//! Synchronous client for the Turnitin plagiarism-detection API.
//!
//! # Overview
//! An LMS registers users, courses and assignments with the service, submits
//! student papers, and later reads originality scores or opens signed report
//! URLs. Every call is a set of named parameters signed with an MD5 digest
//! over a fixed key order plus the account's shared secret.
//!
//! # Design
//! - `RequestBuilder` turns domain objects into unsigned `RequestParams`.
//! - `Dispatcher` signs, escapes and encodes them into a plain-data
//!   `HttpRequest`, hands it to a `Transport`, and decodes the reply into a
//!   `TurnitinResponse`. The network is reached only through `Transport`.
//! - `TurnitinClient` is the facade with one method per operation. It keeps
//!   no state between calls.
//! - Vendor errors and unreadable bodies come back as `RemoteResult` data;
//!   only configuration, usage and transport failures are `Err`.
//! - Domain types are defined independently from the mock-server crate;
//!   integration tests catch drift between the two.

pub mod builder;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod http;
pub mod multipart;
pub mod operation;
pub mod params;
pub mod response;
pub mod settings;
pub mod signing;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use builder::{PaperView, RequestBuilder};
pub use client::{AssignmentCreated, PaperSubmitted, Reply, TurnitinClient};
pub use config::ClientConfig;
pub use diagnostics::{Diagnostics, FailureContext, TracingDiagnostics};
pub use error::{TransportError, TurnitinError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use operation::{FunctionCommand, Operation, PaperType, UserType};
pub use params::{PaperData, RequestParams};
pub use response::{RemoteError, RemoteResult, ReportScores, SimilarityState, TurnitinResponse};
pub use settings::AssignmentSettings;
pub use transport::{Dispatched, Dispatcher, SignedRequest, Transport, UreqTransport};
pub use types::{
    Assignment, Attachment, Course, RemoteIdentity, Submission, SubmissionType, TurnitinAssetData, User,
};
