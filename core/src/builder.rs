//! Per-operation parameter assembly.
//!
//! # Design
//! `RequestBuilder` turns domain inputs into unsigned [`RequestParams`]. It
//! reads the clock once at construction, so every request built from one
//! builder carries the same timestamp and tests can pin it. Nothing here
//! touches the network or the signature.

use chrono::{DateTime, Utc};

use crate::config::ClientConfig;
use crate::operation::{FunctionCommand, Operation, PaperType, UserType};
use crate::params::{PaperData, RequestParams};
use crate::settings::AssignmentSettings;
use crate::types::{Assignment, Attachment, Course, RemoteIdentity, Submission, User};

/// Domain for synthesized addresses; `example.com` subdomains never deliver.
pub const PLACEHOLDER_EMAIL_DOMAIN: &str = "null.lms.example.com";

/// The acting user of a request. Courses act as their own instructor.
#[derive(Debug, Clone, Copy)]
pub enum Party<'a> {
    Person(&'a User),
    Course(&'a Course),
}

/// Whose view of a paper a signed URL opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperView {
    /// Originality report as the instructor sees it.
    InstructorReport,
    /// Originality report as the student sees it.
    StudentReport,
    Preview,
    Download,
}

/// Email for `obj`: the user's own address, or a placeholder. Courses and
/// assignments build it from their remote id when they have one; users always
/// use their asset string.
pub fn email(obj: &impl RemoteIdentity) -> String {
    if let Some(address) = obj.email() {
        return address.to_string();
    }
    format!("{}@{PLACEHOLDER_EMAIL_DOMAIN}", obj.placeholder_local_part())
}

#[derive(Debug, Clone)]
pub struct RequestBuilder<'a> {
    config: &'a ClientConfig,
    now: DateTime<Utc>,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(config: &'a ClientConfig, now: DateTime<Utc>) -> Self {
        Self { config, now }
    }

    /// Remote id for `obj`: `test_`-prefixed in testing mode, otherwise its
    /// existing remote id, otherwise `{account_id}_{asset_string}`.
    pub fn id(&self, obj: &impl RemoteIdentity) -> String {
        if self.config.testing {
            return format!("test_{}", obj.asset_string());
        }
        match obj.remote_id() {
            Some(remote) => remote.to_string(),
            None => format!("{}_{}", self.config.account_id, obj.asset_string()),
        }
    }

    /// `gmtime`: UTC `YYYYMMDDHHM`, i.e. to the tens of minutes.
    pub fn timestamp(&self) -> String {
        let mut stamp = self.now.format("%Y%m%d%H%M").to_string();
        stamp.truncate(11);
        stamp
    }

    /// Parameters common to every call.
    pub fn base(&self, operation: Operation, command: FunctionCommand) -> RequestParams {
        RequestParams {
            gmtime: Some(self.timestamp()),
            fid: Some(operation.function_id().to_string()),
            fcmd: Some(command.as_str().to_string()),
            encrypt: Some("0".to_string()),
            aid: Some(self.config.account_id.clone()),
            src: Some("15".to_string()),
            dis: Some("1".to_string()),
            diagnostic: self.config.testing.then(|| "1".to_string()),
            ..RequestParams::default()
        }
    }

    fn with_party(&self, mut params: RequestParams, party: Party<'_>, user_type: UserType) -> RequestParams {
        params.utp = Some(user_type.as_str().to_string());
        match party {
            Party::Person(user) => {
                params.uid = Some(self.id(user));
                params.uem = Some(email(user));
                params.ufn = Some(user.first_name.clone());
                params.uln = Some(if user.last_name.trim().is_empty() {
                    "Student".to_string()
                } else {
                    user.last_name.clone()
                });
            }
            Party::Course(course) => {
                params.uid = Some(self.id(course));
                params.uem = Some(email(course));
                params.ufn = Some(course.name.clone());
                params.uln = Some("Course".to_string());
            }
        }
        params
    }

    fn with_course(&self, mut params: RequestParams, course: &Course) -> RequestParams {
        params.cid = Some(self.id(course));
        params.ctl = Some(course.name.clone());
        params
    }

    fn with_assignment(&self, mut params: RequestParams, assignment: &Assignment) -> RequestParams {
        params.assign = Some(format!("{} - {}", assignment.title, assignment.id));
        params.assignid = Some(self.id(assignment));
        params
    }

    /// Parameters naming the course's instructor, for student-side calls.
    fn with_instructor_email(&self, mut params: RequestParams, course: &Course) -> RequestParams {
        params.tem = Some(email(course));
        params
    }

    pub fn create_user(&self, user: &User, user_type: UserType) -> RequestParams {
        let params = self.base(Operation::CreateUser, FunctionCommand::Standard);
        self.with_party(params, Party::Person(user), user_type)
    }

    pub fn create_course(&self, course: &Course) -> RequestParams {
        let params = self.base(Operation::CreateCourse, FunctionCommand::Standard);
        let params = self.with_party(params, Party::Course(course), UserType::Instructor);
        self.with_course(params, course)
    }

    pub fn enroll_student(&self, course: &Course, student: &User) -> RequestParams {
        let params = self.base(Operation::EnrollStudent, FunctionCommand::Standard);
        let params = self.with_party(params, Party::Person(student), UserType::Student);
        let params = self.with_course(params, course);
        self.with_instructor_email(params, course)
    }

    /// Create (or, once `settings.created`, update) an assignment. Start,
    /// due and post dates are the course's local date at midnight.
    pub fn create_assignment(&self, assignment: &Assignment, settings: AssignmentSettings) -> RequestParams {
        let command = if settings.created {
            FunctionCommand::Update
        } else {
            FunctionCommand::Standard
        };
        let course = &assignment.course;
        let today = self.now.with_timezone(&course.utc_offset).format("%Y-%m-%d");
        let midnight = format!("{today} 00:00:00");

        let params = self.base(Operation::CreateAssignment, command);
        let params = self.with_party(params, Party::Course(course), UserType::Instructor);
        let params = self.with_course(params, course);
        let mut params = self.with_assignment(params, assignment);
        params.dtstart = Some(midnight.clone());
        params.dtdue = Some(midnight.clone());
        params.dtpost = Some(midnight);
        params.late_accept_flag = Some("1".to_string());
        params.settings = Some(settings);
        params
    }

    fn submit_paper(&self, submission: &Submission, title: &str, paper_type: PaperType, data: PaperData) -> RequestParams {
        let assignment = &submission.assignment;
        let course = &assignment.course;
        let params = self.base(Operation::SubmitPaper, FunctionCommand::Standard);
        let params = self.with_party(params, Party::Person(&submission.user), UserType::Student);
        let params = self.with_course(params, course);
        let params = self.with_assignment(params, assignment);
        let mut params = self.with_instructor_email(params, course);
        params.ptl = Some(title.to_string());
        params.ptype = Some(paper_type.as_str().to_string());
        params.pdata = Some(data);
        params
    }

    /// One uploaded file, titled by its display name.
    pub fn submit_attachment(&self, submission: &Submission, attachment: &Attachment) -> RequestParams {
        let data = PaperData::File {
            filename: attachment.display_name.clone(),
            content: attachment.content.clone(),
        };
        self.submit_paper(submission, &attachment.display_name, PaperType::File, data)
    }

    /// A text entry, titled by the assignment.
    pub fn submit_text(&self, submission: &Submission) -> RequestParams {
        let data = PaperData::Text(submission.plaintext_body.clone());
        self.submit_paper(submission, &submission.assignment.title, PaperType::Text, data)
    }

    /// Scores for a submitted paper, requested as the instructor.
    pub fn generate_report(&self, submission: &Submission, object_id: &str) -> RequestParams {
        let assignment = &submission.assignment;
        let course = &assignment.course;
        let params = self.base(Operation::GenerateReport, FunctionCommand::Standard);
        let params = self.with_party(params, Party::Course(course), UserType::Instructor);
        let params = self.with_course(params, course);
        let mut params = self.with_assignment(params, assignment);
        params.oid = Some(object_id.to_string());
        params
    }

    /// URL-only request opening `view` of a submitted paper.
    pub fn paper_url(&self, view: PaperView, submission: &Submission, object_id: &str) -> RequestParams {
        let assignment = &submission.assignment;
        let course = &assignment.course;
        let operation = match view {
            PaperView::InstructorReport | PaperView::StudentReport => Operation::GenerateReport,
            PaperView::Preview | PaperView::Download => Operation::ShowPaper,
        };
        let params = self.base(operation, FunctionCommand::UrlOnly);
        let params = match view {
            PaperView::InstructorReport => {
                self.with_party(params, Party::Course(course), UserType::Instructor)
            }
            _ => {
                let params = self.with_party(params, Party::Person(&submission.user), UserType::Student);
                self.with_instructor_email(params, course)
            }
        };
        let params = self.with_course(params, course);
        let mut params = self.with_assignment(params, assignment);
        params.oid = Some(object_id.to_string());
        params
    }

    pub fn list_papers(&self, assignment: &Assignment) -> RequestParams {
        let course = &assignment.course;
        let params = self.base(Operation::ListPapers, FunctionCommand::Standard);
        let params = self.with_party(params, Party::Course(course), UserType::Student);
        let params = self.with_course(params, course);
        let params = self.with_assignment(params, assignment);
        self.with_instructor_email(params, course)
    }
}
