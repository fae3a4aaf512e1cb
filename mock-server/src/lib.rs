//! In-memory stand-in for the Turnitin API endpoint.
//!
//! Serves `GET` (query string) and `POST` (multipart) on [`ENDPOINT`], checks
//! the MD5 signature with its own copy of the key order, and answers with the
//! same XML documents the service returns. State lives in memory for the
//! lifetime of the router.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use md5::{Digest, Md5};
use percent_encoding::percent_decode;
use quick_xml::escape::escape;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::debug;

pub const ENDPOINT: &str = "/api.asp";

/// Keys covered by `md5`, in digest order.
const SIGNED_KEYS: [&str; 30] = [
    "aid", "assign", "assignid", "cid", "cpw", "ctl", "diagnostic", "dis", "dtdue", "dtstart", "dtpost",
    "encrypt", "fcmd", "fid", "gmtime", "newassign", "newupw", "oid", "pfn", "pln", "ptl", "ptype", "said",
    "tem", "uem", "ufn", "uid", "uln", "upw", "utp",
];

#[derive(Clone, Debug)]
pub struct MockConfig {
    pub account_id: String,
    pub shared_secret: String,
}

impl MockConfig {
    pub fn new(account_id: &str, shared_secret: &str) -> Self {
        Self {
            account_id: account_id.to_string(),
            shared_secret: shared_secret.to_string(),
        }
    }
}

/// A submitted paper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paper {
    pub object_id: String,
    pub assignment: String,
    pub title: String,
    pub size: usize,
}

/// Everything the mock has been told, keyed by the caller's ids.
#[derive(Debug, Default)]
pub struct Store {
    last_id: u64,
    pub users: BTreeMap<String, String>,
    pub courses: BTreeMap<String, String>,
    pub enrollments: BTreeSet<(String, String)>,
    pub assignments: BTreeMap<String, String>,
    pub papers: Vec<Paper>,
}

impl Store {
    fn next_id(&mut self) -> String {
        self.last_id += 1;
        (1000 + self.last_id).to_string()
    }

    fn user(&mut self, uid: &str) -> String {
        if let Some(id) = self.users.get(uid) {
            return id.clone();
        }
        let id = self.next_id();
        self.users.insert(uid.to_string(), id.clone());
        id
    }

    fn course(&mut self, cid: &str) -> String {
        if let Some(id) = self.courses.get(cid) {
            return id.clone();
        }
        let id = self.next_id();
        self.courses.insert(cid.to_string(), id.clone());
        id
    }

    fn assignment(&mut self, assignid: &str) -> String {
        if let Some(id) = self.assignments.get(assignid) {
            return id.clone();
        }
        let id = self.next_id();
        self.assignments.insert(assignid.to_string(), id.clone());
        id
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
struct AppState {
    config: Arc<MockConfig>,
    db: Db,
}

/// One decoded call: text parameters plus the uploaded file, if any.
#[derive(Debug, Default)]
struct Call {
    params: HashMap<String, String>,
    upload: Option<Upload>,
}

#[derive(Debug)]
struct Upload {
    file_name: String,
    size: usize,
}

impl Call {
    fn param(&self, key: &str) -> &str {
        self.params.get(key).map(String::as_str).unwrap_or_default()
    }

    fn signature_valid(&self, shared_secret: &str) -> bool {
        let mut hasher = Md5::new();
        for key in SIGNED_KEYS {
            if let Some(value) = self.params.get(key) {
                hasher.update(value.as_bytes());
            }
        }
        hasher.update(shared_secret.as_bytes());
        let expected = format!("{:x}", hasher.finalize());
        self.params.get("md5") == Some(&expected)
    }

    /// Length of the paper body, text or file.
    fn paper_size(&self) -> usize {
        match &self.upload {
            Some(upload) => upload.size,
            None => self.param("pdata").len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf(&'static str, String),
    Group(&'static str, Vec<(&'static str, String)>),
}

#[derive(Debug, Clone, PartialEq)]
struct Reply {
    rcode: u32,
    message: &'static str,
    nodes: Vec<Node>,
}

impl Reply {
    fn new(rcode: u32, message: &'static str) -> Self {
        Self {
            rcode,
            message,
            nodes: Vec::new(),
        }
    }

    fn leaf(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.nodes.push(Node::Leaf(name, value.into()));
        self
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<returndata>");
        xml.push_str(&format!("<rcode>{}</rcode>", self.rcode));
        xml.push_str(&format!("<rmessage>{}</rmessage>", escape(self.message)));
        for node in &self.nodes {
            match node {
                Node::Leaf(name, value) => xml.push_str(&format!("<{name}>{}</{name}>", escape(value.as_str()))),
                Node::Group(name, children) => {
                    xml.push_str(&format!("<{name}>"));
                    for (child, value) in children {
                        xml.push_str(&format!("<{child}>{}</{child}>", escape(value.as_str())));
                    }
                    xml.push_str(&format!("</{name}>"));
                }
            }
        }
        xml.push_str("</returndata>\n");
        xml
    }
}

pub fn app(config: MockConfig) -> Router {
    app_with_store(config, Db::default())
}

/// Router over a caller-provided store, so tests can inspect what was recorded.
pub fn app_with_store(config: MockConfig, db: Db) -> Router {
    let state = AppState {
        config: Arc::new(config),
        db,
    };
    Router::new()
        .route(ENDPOINT, get(api_get).post(api_post))
        .with_state(state)
}

pub async fn run(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app(config)).await
}

async fn api_get(State(state): State<AppState>, Query(params): Query<HashMap<String, String>>) -> Response {
    respond(&state, Call { params, upload: None }).await
}

async fn api_post(State(state): State<AppState>, mut multipart: Multipart) -> Result<Response, MultipartError> {
    let mut call = Call::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        match file_name {
            Some(file_name) => {
                call.upload = Some(Upload {
                    file_name,
                    size: bytes.len(),
                });
            }
            None => {
                let value = percent_decode(&bytes).decode_utf8_lossy().into_owned();
                call.params.insert(name, value);
            }
        }
    }
    Ok(respond(&state, call).await)
}

async fn respond(state: &AppState, call: Call) -> Response {
    let reply = if call.signature_valid(&state.config.shared_secret) {
        let mut store = state.db.write().await;
        handle(&mut store, &call)
    } else {
        Reply::new(203, "MD5 not authenticated")
    };
    debug!(
        fid = call.param("fid"),
        fcmd = call.param("fcmd"),
        rcode = reply.rcode,
        "handled api call"
    );
    ([(header::CONTENT_TYPE, "text/xml; charset=utf-8")], reply.to_xml()).into_response()
}

fn handle(store: &mut Store, call: &Call) -> Reply {
    match (call.param("fid"), call.param("fcmd")) {
        ("1", "2") => {
            let user_id = store.user(call.param("uid"));
            Reply::new(11, "Successful!").leaf("userid", user_id)
        }
        ("2", "2") => {
            let user_id = store.user(call.param("uid"));
            let class_id = store.course(call.param("cid"));
            Reply::new(21, "Class created")
                .leaf("userid", user_id)
                .leaf("classid", class_id)
        }
        ("3", "2") => {
            let cid = call.param("cid");
            if !store.courses.contains_key(cid) {
                return Reply::new(204, "Class does not exist");
            }
            let user_id = store.user(call.param("uid"));
            store.enrollments.insert((cid.to_string(), call.param("uid").to_string()));
            Reply::new(31, "Student enrolled").leaf("userid", user_id)
        }
        ("4", "2") => {
            store.course(call.param("cid"));
            let assignment_id = store.assignment(call.param("assignid"));
            Reply::new(41, "Assignment created").leaf("assignmentid", assignment_id)
        }
        ("4", "3") => match store.assignments.get(call.param("assignid")) {
            Some(id) => Reply::new(42, "Assignment updated").leaf("assignmentid", id.clone()),
            None => Reply::new(419, "Assignment does not exist"),
        },
        ("5", "2") => {
            let assignid = call.param("assignid");
            if !store.assignments.contains_key(assignid) {
                return Reply::new(206, "Assignment does not exist");
            }
            let object_id = store.next_id();
            let title = match &call.upload {
                Some(upload) if call.param("ptl").is_empty() => upload.file_name.clone(),
                _ => call.param("ptl").to_string(),
            };
            store.papers.push(Paper {
                object_id: object_id.clone(),
                assignment: assignid.to_string(),
                title,
                size: call.paper_size(),
            });
            Reply::new(51, "Paper submitted").leaf("objectID", object_id)
        }
        ("6", "2") => {
            let Some(paper) = store.papers.iter().find(|p| p.object_id == call.param("oid")) else {
                return Reply::new(415, "Paper does not exist");
            };
            // Scores follow the paper size so callers can predict them.
            let score = paper.size % 100;
            Reply::new(61, "Report generated")
                .leaf("originalityscore", score.to_string())
                .leaf("web_overlap", score.to_string())
                .leaf("publication_overlap", "0")
                .leaf("student_paper_overlap", "0")
        }
        ("10", "2") => {
            let assignid = call.param("assignid");
            if !store.assignments.contains_key(assignid) {
                return Reply::new(206, "Assignment does not exist");
            }
            let mut reply = Reply::new(72, "Papers listed");
            for paper in store.papers.iter().filter(|p| p.assignment == assignid) {
                reply.nodes.push(Node::Group(
                    "object",
                    vec![("objectID", paper.object_id.clone()), ("title", paper.title.clone())],
                ));
            }
            reply
        }
        _ => Reply::new(100, "Function not supported"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed(pairs: &[(&str, &str)], secret: &str) -> Call {
        let mut call = Call {
            params: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            upload: None,
        };
        let mut hasher = Md5::new();
        for key in SIGNED_KEYS {
            if let Some(value) = call.params.get(key) {
                hasher.update(value.as_bytes());
            }
        }
        hasher.update(secret.as_bytes());
        call.params.insert("md5".to_string(), format!("{:x}", hasher.finalize()));
        call
    }

    #[test]
    fn signature_checks_secret() {
        let call = signed(&[("aid", "100"), ("fid", "1"), ("src", "15")], "secret");
        assert!(call.signature_valid("secret"));
        assert!(!call.signature_valid("other"));
    }

    #[test]
    fn unsigned_keys_do_not_affect_signature() {
        let mut call = signed(&[("aid", "100"), ("fid", "1")], "secret");
        call.params.insert("src".to_string(), "99".to_string());
        call.params.insert("late_accept_flag".to_string(), "1".to_string());
        assert!(call.signature_valid("secret"));
        call.params.insert("uid".to_string(), "tampered".to_string());
        assert!(!call.signature_valid("secret"));
    }

    #[test]
    fn known_digest() {
        // md5("secret")
        let call = signed(&[], "secret");
        assert_eq!(call.param("md5"), "5ebe2294ecd0e0f08eab7690d2a6ee69");
    }

    #[test]
    fn reply_renders_escaped_xml() {
        let xml = Reply::new(51, "Paper submitted")
            .leaf("objectID", "1001")
            .leaf("title", "Fish & Chips <draft>")
            .to_xml();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<rcode>51</rcode>"));
        assert!(xml.contains("<objectID>1001</objectID>"));
        assert!(xml.contains("<title>Fish &amp; Chips &lt;draft&gt;</title>"));
    }

    #[test]
    fn update_requires_existing_assignment() {
        let mut store = Store::default();
        let call = signed(&[("fid", "4"), ("fcmd", "3"), ("assignid", "a1")], "s");
        assert_eq!(handle(&mut store, &call).rcode, 419);
        let create = signed(&[("fid", "4"), ("fcmd", "2"), ("assignid", "a1"), ("cid", "c1")], "s");
        assert_eq!(handle(&mut store, &create).rcode, 41);
        assert_eq!(handle(&mut store, &call).rcode, 42);
    }

    #[test]
    fn ids_are_stable_per_caller_id() {
        let mut store = Store::default();
        let first = store.user("u1");
        assert_eq!(store.user("u1"), first);
        assert_ne!(store.user("u2"), first);
    }

    #[test]
    fn unknown_function_is_unsupported() {
        let mut store = Store::default();
        let call = signed(&[("fid", "99"), ("fcmd", "2")], "s");
        assert_eq!(handle(&mut store, &call).rcode, 100);
    }
}
