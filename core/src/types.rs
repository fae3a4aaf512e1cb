//! Domain inputs consumed by the client.
//!
//! # Design
//! These are the caller's objects reduced to the handful of fields the
//! integration reads. They are owned plain data so the caller can build them
//! from whatever storage it uses. Anything that can be a party to a request
//! (user, course, assignment) implements [`RemoteIdentity`], which replaces
//! runtime "does this object carry a remote id" checks with a typed optional.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{FixedOffset, Offset, Utc};

/// Identity of an object as seen by the remote service.
pub trait RemoteIdentity {
    /// Stable, locally generated identifier, e.g. `user_42`.
    fn asset_string(&self) -> &str;

    /// Identifier previously assigned by (or registered with) the service.
    fn remote_id(&self) -> Option<&str> {
        None
    }

    /// A real, deliverable email address. Only people have one.
    fn email(&self) -> Option<&str> {
        None
    }

    /// Local part of the placeholder address used when there is no real
    /// email.
    fn placeholder_local_part(&self) -> &str {
        self.remote_id().unwrap_or_else(|| self.asset_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub asset_string: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    /// Id the user was registered under before, if not the derived one.
    pub remote_id: Option<String>,
}

impl User {
    pub fn new(asset_string: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            asset_string: asset_string.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: None,
            remote_id: None,
        }
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn with_remote_id(mut self, remote_id: &str) -> Self {
        self.remote_id = Some(remote_id.to_string());
        self
    }
}

impl RemoteIdentity for User {
    fn asset_string(&self) -> &str {
        &self.asset_string
    }

    fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    // Placeholder addresses for people stay on the asset string.
    fn placeholder_local_part(&self) -> &str {
        &self.asset_string
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub asset_string: String,
    pub name: String,
    /// Offset of the course's time zone; assignment dates are sent as the
    /// course's local date.
    pub utc_offset: FixedOffset,
    pub remote_id: Option<String>,
}

impl Course {
    pub fn new(asset_string: &str, name: &str) -> Self {
        Self {
            asset_string: asset_string.to_string(),
            name: name.to_string(),
            utc_offset: Utc.fix(),
            remote_id: None,
        }
    }
}

impl RemoteIdentity for Course {
    fn asset_string(&self) -> &str {
        &self.asset_string
    }

    fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub asset_string: String,
    pub id: u64,
    pub title: String,
    pub remote_id: Option<String>,
    /// The course the assignment belongs to.
    pub course: Course,
}

impl Assignment {
    pub fn new(id: u64, title: &str, course: Course) -> Self {
        Self {
            asset_string: format!("assignment_{id}"),
            id,
            title: title.to_string(),
            remote_id: None,
            course,
        }
    }
}

impl RemoteIdentity for Assignment {
    fn asset_string(&self) -> &str {
        &self.asset_string
    }

    fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }
}

/// How a student turned in their work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionType {
    OnlineUpload,
    OnlineTextEntry,
    /// Any type the integration does not submit (e.g. `online_url`).
    Other(String),
}

impl SubmissionType {
    pub fn as_str(&self) -> &str {
        match self {
            SubmissionType::OnlineUpload => "online_upload",
            SubmissionType::OnlineTextEntry => "online_text_entry",
            SubmissionType::Other(other) => other,
        }
    }
}

impl FromStr for SubmissionType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "online_upload" => SubmissionType::OnlineUpload,
            "online_text_entry" => SubmissionType::OnlineTextEntry,
            other => SubmissionType::Other(other.to_string()),
        })
    }
}

impl fmt::Display for SubmissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub asset_string: String,
    pub display_name: String,
    /// Whether the file type can be checked for originality.
    pub turnitinable: bool,
    pub content: Vec<u8>,
}

/// What the caller stored from earlier calls for one submitted asset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnitinAssetData {
    /// Paper id returned by `submit_paper`.
    pub object_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub asset_string: String,
    pub submission_type: SubmissionType,
    pub user: User,
    pub assignment: Assignment,
    pub plaintext_body: String,
    pub attachments: Vec<Attachment>,
    /// Per-asset data keyed by asset string.
    pub turnitin_data: BTreeMap<String, TurnitinAssetData>,
}

impl Submission {
    /// The stored remote paper id for `asset_string`, if any.
    pub fn object_id(&self, asset_string: &str) -> Option<&str> {
        self.turnitin_data.get(asset_string)?.object_id.as_deref()
    }
}
