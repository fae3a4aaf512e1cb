use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use md5::{Digest, Md5};
use mock_server::{app, app_with_store, Db, MockConfig};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tower::ServiceExt;

const SECRET: &str = "secret";
const BOUNDARY: &str = "----mock-test-boundary";

const SIGNED_KEYS: [&str; 30] = [
    "aid", "assign", "assignid", "cid", "cpw", "ctl", "diagnostic", "dis", "dtdue", "dtstart", "dtpost",
    "encrypt", "fcmd", "fid", "gmtime", "newassign", "newupw", "oid", "pfn", "pln", "ptl", "ptype", "said",
    "tem", "uem", "ufn", "uid", "uln", "upw", "utp",
];

fn config() -> MockConfig {
    MockConfig::new("100", SECRET)
}

fn md5_of(pairs: &[(&str, &str)], secret: &str) -> String {
    let mut hasher = Md5::new();
    for key in SIGNED_KEYS {
        if let Some((_, value)) = pairs.iter().find(|(k, _)| *k == key) {
            hasher.update(value.as_bytes());
        }
    }
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

fn get_request(pairs: &[(&str, &str)], secret: &str) -> Request<Body> {
    let mut query: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={}", encode(v))).collect();
    query.push(format!("md5={}", md5_of(pairs, secret)));
    Request::builder()
        .uri(format!("/api.asp?{}", query.join("&")))
        .body(Body::empty())
        .unwrap()
}

fn post_request(pairs: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    let md5 = md5_of(pairs, SECRET);
    let text = pairs.iter().map(|(k, v)| (*k, encode(v))).chain(std::iter::once(("md5", md5)));
    for (name, value) in text {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some((filename, content)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"pdata\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api.asp")
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Send and return the XML body, asserting a 200.
async fn call(app: &Router, request: Request<Body>) -> String {
    let resp = app.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[http::header::CONTENT_TYPE],
        "text/xml; charset=utf-8"
    );
    body_text(resp).await
}

fn element<'a>(xml: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{name}>");
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&format!("</{name}>"))? + start;
    Some(&xml[start..end])
}

fn rcode(xml: &str) -> u32 {
    element(xml, "rcode").unwrap().parse().unwrap()
}

fn assignment_pairs<'a>(fcmd: &'a str, title: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("fid", "4"),
        ("fcmd", fcmd),
        ("aid", "100"),
        ("cid", "100_course_5"),
        ("assignid", "100_assignment_12"),
        ("assign", title),
    ]
}

// --- signatures ---

#[tokio::test]
async fn create_user_returns_user_id() {
    let app = app(config());
    let xml = call(&app, get_request(&[("fid", "1"), ("fcmd", "2"), ("uid", "100_user_3")], SECRET)).await;
    assert_eq!(rcode(&xml), 11);
    assert!(element(&xml, "userid").is_some());
}

#[tokio::test]
async fn bad_signature_is_rejected() {
    let app = app(config());
    let xml = call(&app, get_request(&[("fid", "1"), ("fcmd", "2"), ("uid", "u")], "wrong")).await;
    assert_eq!(rcode(&xml), 203);
}

#[tokio::test]
async fn query_values_are_decoded_before_verifying() {
    let app = app(config());
    let pairs = [("fid", "2"), ("fcmd", "2"), ("cid", "c1"), ("ctl", "Intro to Rhetoric & Logic")];
    let xml = call(&app, get_request(&pairs, SECRET)).await;
    assert_eq!(rcode(&xml), 21);
    assert!(element(&xml, "classid").is_some());
}

#[tokio::test]
async fn multipart_values_are_decoded_before_verifying() {
    let app = app(config());
    let xml = call(&app, post_request(&assignment_pairs("2", "Essay One - 12"), None)).await;
    assert_eq!(rcode(&xml), 41);
}

// --- operations ---

#[tokio::test]
async fn enroll_requires_known_course() {
    let app = app(config());
    let enroll = [("fid", "3"), ("fcmd", "2"), ("cid", "c1"), ("uid", "u1")];
    assert_eq!(rcode(&call(&app, get_request(&enroll, SECRET)).await), 204);

    let course = [("fid", "2"), ("fcmd", "2"), ("cid", "c1"), ("uid", "c1")];
    assert_eq!(rcode(&call(&app, get_request(&course, SECRET)).await), 21);
    assert_eq!(rcode(&call(&app, get_request(&enroll, SECRET)).await), 31);
}

#[tokio::test]
async fn assignment_update_reuses_id() {
    let db = Db::default();
    let app = app_with_store(config(), db.clone());
    let created = call(&app, post_request(&assignment_pairs("2", "Essay"), None)).await;
    let updated = call(&app, post_request(&assignment_pairs("3", "Essay v2"), None)).await;
    assert_eq!(rcode(&updated), 42);
    assert_eq!(element(&created, "assignmentid"), element(&updated, "assignmentid"));
    assert_eq!(db.read().await.assignments.len(), 1);
}

#[tokio::test]
async fn update_of_unknown_assignment_fails() {
    let app = app(config());
    let xml = call(&app, post_request(&assignment_pairs("3", "Essay"), None)).await;
    assert_eq!(rcode(&xml), 419);
}

#[tokio::test]
async fn submission_to_unknown_assignment_fails() {
    let app = app(config());
    let pairs = [("fid", "5"), ("fcmd", "2"), ("assignid", "nope"), ("ptype", "1"), ("pdata", "text")];
    assert_eq!(rcode(&call(&app, post_request(&pairs, None)).await), 206);
}

#[tokio::test]
async fn papers_are_stored_reported_and_listed() {
    let db = Db::default();
    let app = app_with_store(config(), db.clone());
    call(&app, post_request(&assignment_pairs("2", "Essay"), None)).await;

    let text = [
        ("fid", "5"),
        ("fcmd", "2"),
        ("assignid", "100_assignment_12"),
        ("ptl", "Essay"),
        ("ptype", "1"),
        ("pdata", "Forty-two characters of very original text"),
    ];
    let xml = call(&app, post_request(&text, None)).await;
    assert_eq!(rcode(&xml), 51);
    let text_oid = element(&xml, "objectID").unwrap().to_string();

    let file = [
        ("fid", "5"),
        ("fcmd", "2"),
        ("assignid", "100_assignment_12"),
        ("ptl", "draft.docx"),
        ("ptype", "2"),
    ];
    let xml = call(&app, post_request(&file, Some(("draft.docx", &[7u8; 130][..])))).await;
    assert_eq!(rcode(&xml), 51);
    assert_eq!(db.read().await.papers[1].size, 130);

    let report = [("fid", "6"), ("fcmd", "2"), ("oid", text_oid.as_str())];
    let xml = call(&app, get_request(&report, SECRET)).await;
    assert_eq!(rcode(&xml), 61);
    assert_eq!(element(&xml, "originalityscore"), Some("42"));
    assert_eq!(element(&xml, "publication_overlap"), Some("0"));

    let list = [("fid", "10"), ("fcmd", "2"), ("assignid", "100_assignment_12")];
    let xml = call(&app, get_request(&list, SECRET)).await;
    assert_eq!(rcode(&xml), 72);
    assert_eq!(xml.matches("<object>").count(), 2);
    assert!(xml.contains(&format!("<objectID>{text_oid}</objectID>")));
}

#[tokio::test]
async fn report_for_unknown_paper_fails() {
    let app = app(config());
    let report = [("fid", "6"), ("fcmd", "2"), ("oid", "404")];
    assert_eq!(rcode(&call(&app, get_request(&report, SECRET)).await), 415);
}

#[tokio::test]
async fn unsupported_function() {
    let app = app(config());
    let xml = call(&app, get_request(&[("fid", "8"), ("fcmd", "2")], SECRET)).await;
    assert_eq!(rcode(&xml), 100);
}

#[tokio::test]
async fn other_paths_are_not_found() {
    let app = app(config());
    let resp = app
        .oneshot(Request::builder().uri("/api.php").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
