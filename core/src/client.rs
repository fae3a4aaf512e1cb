//! One method per supported remote operation.
//!
//! # Design
//! `TurnitinClient` derives inputs from the domain objects, builds the
//! parameters with a fresh `RequestBuilder`, and hands them to its
//! `Dispatcher`. It holds only the immutable configuration and the transport
//! handle, so nothing carries over between calls and nothing is retried.
//!
//! Results come back in three layers: `Err` for configuration, usage and
//! transport failures; `None` when testing mode withholds the result; and
//! otherwise a [`RemoteResult`] that is either the operation's payload or the
//! vendor's error as data.

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::{Map, Value};

use crate::builder::{PaperView, RequestBuilder};
use crate::config::ClientConfig;
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::TurnitinError;
use crate::http::HttpMethod;
use crate::operation::UserType;
use crate::params::RequestParams;
use crate::response::{RemoteResult, ReportScores, TurnitinResponse};
use crate::settings::AssignmentSettings;
use crate::transport::{Dispatched, Dispatcher, Transport, UreqTransport};
use crate::types::{Assignment, Course, Submission, SubmissionType, User};

/// Outcome of a call that returns data; `None` in testing mode.
pub type Reply<T> = Option<RemoteResult<T>>;

/// Payload of a successful `create_or_update_assignment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentCreated {
    pub assignment_id: Option<String>,
}

/// Payload of one successfully submitted paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperSubmitted {
    /// Id to store and pass to later report and URL calls.
    pub object_id: Option<String>,
}

#[derive(Debug)]
pub struct TurnitinClient<T = UreqTransport, D = TracingDiagnostics> {
    dispatcher: Dispatcher<T, D>,
}

impl TurnitinClient {
    /// Client over HTTPS with `tracing` diagnostics.
    pub fn new(config: ClientConfig) -> Result<Self, TurnitinError> {
        let transport = UreqTransport::new(config.read_timeout());
        Self::with_transport(config, transport, TracingDiagnostics)
    }
}

impl<T: Transport, D: Diagnostics> TurnitinClient<T, D> {
    pub fn with_transport(config: ClientConfig, transport: T, diagnostics: D) -> Result<Self, TurnitinError> {
        config.validate()?;
        Ok(Self {
            dispatcher: Dispatcher::new(config, transport, diagnostics),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.dispatcher.config()
    }

    pub fn transport(&self) -> &T {
        self.dispatcher.transport()
    }

    pub fn diagnostics(&self) -> &D {
        self.dispatcher.diagnostics()
    }

    /// Builder stamped with the current time.
    pub fn request_builder(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(self.config(), Utc::now())
    }

    fn call(&self, params: &RequestParams, method: HttpMethod) -> Result<Reply<TurnitinResponse>, TurnitinError> {
        match self.dispatcher.send(params, method)? {
            Dispatched::Response(result) => Ok(Some(result)),
            // URL-only commands go through `paper_url`, never through here.
            Dispatched::Suppressed | Dispatched::Url(_) => Ok(None),
        }
    }

    /// Check the account credentials by creating a throwaway instructor.
    pub fn test_settings(&self) -> Result<bool, TurnitinError> {
        let admin = User::new("admin_test", "Admin", "Test");
        let reply = self.create_teacher(&admin)?;
        Ok(matches!(reply, Some(RemoteResult::Success(_))))
    }

    pub fn create_student(&self, user: &User) -> Result<Reply<TurnitinResponse>, TurnitinError> {
        let params = self.request_builder().create_user(user, UserType::Student);
        self.call(&params, HttpMethod::Get)
    }

    pub fn create_teacher(&self, user: &User) -> Result<Reply<TurnitinResponse>, TurnitinError> {
        let params = self.request_builder().create_user(user, UserType::Instructor);
        self.call(&params, HttpMethod::Get)
    }

    pub fn create_course(&self, course: &Course) -> Result<Reply<TurnitinResponse>, TurnitinError> {
        let params = self.request_builder().create_course(course);
        self.call(&params, HttpMethod::Get)
    }

    pub fn enroll_student(&self, course: &Course, student: &User) -> Result<Reply<TurnitinResponse>, TurnitinError> {
        let params = self.request_builder().enroll_student(course, student);
        self.call(&params, HttpMethod::Get)
    }

    /// Normalize `settings` and create the assignment, or update it when the
    /// settings say it was already created.
    pub fn create_or_update_assignment(
        &self,
        assignment: &Assignment,
        settings: &Map<String, Value>,
    ) -> Result<Reply<AssignmentCreated>, TurnitinError> {
        let settings = AssignmentSettings::normalize(settings);
        let params = self.request_builder().create_assignment(assignment, settings);
        let reply = self.call(&params, HttpMethod::Post)?;
        Ok(reply.map(|result| {
            result.map(|response| AssignmentCreated {
                assignment_id: response.assignment_id().map(str::to_string),
            })
        }))
    }

    /// Submit the submission's papers, keyed by asset string.
    ///
    /// Uploads send one request per eligible attachment; text entries send
    /// the plaintext body. With `only_asset`, just that asset is sent. A
    /// vendor error on one paper does not stop the others.
    pub fn submit_paper(
        &self,
        submission: &Submission,
        only_asset: Option<&str>,
    ) -> Result<BTreeMap<String, Reply<PaperSubmitted>>, TurnitinError> {
        let wanted = |asset: &str| only_asset.map_or(true, |only| only == asset);
        let builder = self.request_builder();

        let mut requests = Vec::new();
        match &submission.submission_type {
            SubmissionType::OnlineUpload => {
                for attachment in &submission.attachments {
                    if attachment.turnitinable && wanted(&attachment.asset_string) {
                        let params = builder.submit_attachment(submission, attachment);
                        requests.push((attachment.asset_string.clone(), params));
                    }
                }
            }
            SubmissionType::OnlineTextEntry => {
                if wanted(&submission.asset_string) {
                    requests.push((submission.asset_string.clone(), builder.submit_text(submission)));
                }
            }
            SubmissionType::Other(other) => {
                return Err(TurnitinError::UnsupportedSubmissionType(other.clone()));
            }
        }

        let mut outcomes = BTreeMap::new();
        for (asset, params) in requests {
            let reply = self.call(&params, HttpMethod::Post)?;
            let reply = reply.map(|result| {
                result.map(|response| PaperSubmitted {
                    object_id: response.object_id().map(str::to_string),
                })
            });
            outcomes.insert(asset, reply);
        }
        Ok(outcomes)
    }

    /// Scores for `asset`. Empty when nothing was submitted for it yet or
    /// when testing mode withholds the result.
    pub fn generate_report(&self, submission: &Submission, asset: &str) -> Result<RemoteResult<ReportScores>, TurnitinError> {
        let Some(object_id) = submission.object_id(asset) else {
            return Ok(RemoteResult::Success(ReportScores::default()));
        };
        let params = self.request_builder().generate_report(submission, object_id);
        Ok(match self.call(&params, HttpMethod::Get)? {
            Some(result) => result.map(|response| ReportScores::from_response(&response)),
            None => RemoteResult::Success(ReportScores::default()),
        })
    }

    /// Instructor's originality report URL.
    pub fn submission_report_url(&self, submission: &Submission, asset: &str) -> Result<Option<String>, TurnitinError> {
        self.paper_url(PaperView::InstructorReport, submission, asset)
    }

    /// Student's originality report URL.
    pub fn submission_student_report_url(&self, submission: &Submission, asset: &str) -> Result<Option<String>, TurnitinError> {
        self.paper_url(PaperView::StudentReport, submission, asset)
    }

    pub fn submission_preview_url(&self, submission: &Submission, asset: &str) -> Result<Option<String>, TurnitinError> {
        self.paper_url(PaperView::Preview, submission, asset)
    }

    pub fn submission_download_url(&self, submission: &Submission, asset: &str) -> Result<Option<String>, TurnitinError> {
        self.paper_url(PaperView::Download, submission, asset)
    }

    /// Signed URL for `view`; `None` when `asset` has no stored paper id.
    fn paper_url(&self, view: PaperView, submission: &Submission, asset: &str) -> Result<Option<String>, TurnitinError> {
        let Some(object_id) = submission.object_id(asset) else {
            return Ok(None);
        };
        let params = self.request_builder().paper_url(view, submission, object_id);
        match self.dispatcher.send(&params, HttpMethod::Get)? {
            Dispatched::Url(url) => Ok(Some(url)),
            Dispatched::Response(_) | Dispatched::Suppressed => Ok(None),
        }
    }

    /// Remote paper ids submitted to `assignment`.
    pub fn list_submissions(&self, assignment: &Assignment) -> Result<Reply<Vec<String>>, TurnitinError> {
        let params = self.request_builder().list_papers(assignment);
        let reply = self.call(&params, HttpMethod::Get)?;
        Ok(reply.map(|result| {
            result.map(|response| response.values("objectid").map(str::to_string).collect())
        }))
    }
}
