//! Interpretation of service responses.
//!
//! # Design
//! The service answers either with an XML document (`<returndata>` holding
//! flat elements such as `<rcode>`, `<rmessage>`, `<objectID>`) or with a
//! form-encoded line of `key=value` pairs. Both are reduced to the same list
//! of lower-cased `(name, text)` pairs in document order, so field lookup does
//! not care which encoding arrived. A return code of 1 to 99 is success;
//! anything else is a vendor error. A body without a numeric return code is
//! malformed, which is reported separately from vendor errors.

use std::fmt;

use percent_encoding::percent_decode_str;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::http::HttpResponse;

/// Why a call did not succeed, as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The service processed the request and reported an error code.
    Vendor { code: u32, message: String },
    /// The body could not be interpreted.
    Malformed { reason: String, body: String },
}

impl RemoteError {
    pub fn code(&self) -> Option<u32> {
        match self {
            RemoteError::Vendor { code, .. } => Some(*code),
            RemoteError::Malformed { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RemoteError::Vendor { message, .. } => message,
            RemoteError::Malformed { reason, .. } => reason,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Vendor { code, message } => write!(f, "error {code}: {message}"),
            RemoteError::Malformed { reason, .. } => write!(f, "malformed response: {reason}"),
        }
    }
}

/// Outcome of one remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteResult<T> {
    Success(T),
    Error(RemoteError),
}

impl<T> RemoteResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, RemoteResult::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            RemoteResult::Success(value) => Some(value),
            RemoteResult::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            RemoteResult::Success(_) => None,
            RemoteResult::Error(err) => Some(err),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> RemoteResult<U> {
        match self {
            RemoteResult::Success(value) => RemoteResult::Success(f(value)),
            RemoteResult::Error(err) => RemoteResult::Error(err),
        }
    }
}

/// A decoded response with a numeric return code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnitinResponse {
    status: u16,
    return_code: u32,
    fields: Vec<(String, String)>,
    body: String,
}

impl TurnitinResponse {
    /// Decode `response`; fails only when the body cannot be interpreted.
    pub fn parse(response: HttpResponse) -> Result<Self, RemoteError> {
        let trimmed = response.body.trim_start_matches('\u{feff}').trim_start();
        let fields = if trimmed.is_empty() {
            return Err(malformed(&response, "empty body".to_string()));
        } else if trimmed.starts_with('<') {
            parse_xml(trimmed).map_err(|reason| malformed(&response, reason))?
        } else if trimmed.contains('=') {
            parse_form(trimmed)
        } else {
            return Err(malformed(&response, "unrecognized body encoding".to_string()));
        };

        let return_code = first(&fields, "rcode")
            .and_then(|code| code.trim().parse::<u32>().ok())
            .ok_or_else(|| {
                malformed(
                    &response,
                    format!("missing or non-numeric rcode (HTTP {})", response.status),
                )
            })?;

        Ok(Self {
            status: response.status,
            return_code,
            fields,
            body: response.body,
        })
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn return_code(&self) -> u32 {
        self.return_code
    }

    pub fn is_success(&self) -> bool {
        (1..100).contains(&self.return_code)
    }

    pub fn message(&self) -> Option<&str> {
        self.field("rmessage")
    }

    /// First value recorded for `name` (case-insensitive).
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Every value recorded for `name`, in document order.
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Paper id assigned by the service.
    pub fn object_id(&self) -> Option<&str> {
        self.field("objectid")
    }

    pub fn assignment_id(&self) -> Option<&str> {
        self.field("assignmentid")
    }

    pub fn user_id(&self) -> Option<&str> {
        self.field("userid")
    }

    pub fn class_id(&self) -> Option<&str> {
        self.field("classid")
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// `Success(self)` for success codes, otherwise the vendor error.
    pub fn into_result(self) -> RemoteResult<TurnitinResponse> {
        if self.is_success() {
            return RemoteResult::Success(self);
        }
        RemoteResult::Error(RemoteError::Vendor {
            code: self.return_code,
            message: self.message().unwrap_or_default().to_string(),
        })
    }
}

/// Originality scores from a generated report. Missing values stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportScores {
    pub similarity_score: Option<f64>,
    pub web_overlap: Option<f64>,
    pub publication_overlap: Option<f64>,
    pub student_overlap: Option<f64>,
}

impl ReportScores {
    pub fn from_response(response: &TurnitinResponse) -> Self {
        let number = |name: &str| response.field(name).and_then(|v| v.trim().parse::<f64>().ok());
        Self {
            similarity_score: number("originalityscore"),
            web_overlap: number("web_overlap"),
            publication_overlap: number("publication_overlap"),
            student_overlap: number("student_paper_overlap"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn state(&self) -> Option<SimilarityState> {
        self.similarity_score.map(SimilarityState::from_score)
    }
}

/// Display bucket for a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityState {
    None,
    Acceptable,
    Warning,
    Problem,
    Failure,
}

impl SimilarityState {
    pub fn from_score(score: f64) -> Self {
        if score == 0.0 {
            SimilarityState::None
        } else if score < 25.0 {
            SimilarityState::Acceptable
        } else if score < 50.0 {
            SimilarityState::Warning
        } else if score < 75.0 {
            SimilarityState::Problem
        } else {
            SimilarityState::Failure
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SimilarityState::None => "none",
            SimilarityState::Acceptable => "acceptable",
            SimilarityState::Warning => "warning",
            SimilarityState::Problem => "problem",
            SimilarityState::Failure => "failure",
        }
    }
}

fn malformed(response: &HttpResponse, reason: String) -> RemoteError {
    RemoteError::Malformed {
        reason,
        body: response.body.clone(),
    }
}

fn first<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// An element being read: its name, accumulated text, and whether it has
/// child elements (only leaves are recorded).
struct Open {
    name: String,
    text: String,
    has_children: bool,
}

fn parse_xml(body: &str) -> Result<Vec<(String, String)>, String> {
    let mut reader = Reader::from_str(body);
    let mut stack: Vec<Open> = Vec::new();
    let mut fields = Vec::new();

    loop {
        match reader.read_event().map_err(|e| format!("invalid XML: {e}"))? {
            Event::Start(start) => {
                if let Some(parent) = stack.last_mut() {
                    parent.has_children = true;
                }
                stack.push(Open {
                    name: String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase(),
                    text: String::new(),
                    has_children: false,
                });
            }
            Event::Empty(empty) => {
                if let Some(parent) = stack.last_mut() {
                    parent.has_children = true;
                }
                let name = String::from_utf8_lossy(empty.name().as_ref()).to_ascii_lowercase();
                fields.push((name, String::new()));
            }
            Event::Text(text) => {
                if let Some(open) = stack.last_mut() {
                    let text = text.unescape().map_err(|e| format!("invalid XML text: {e}"))?;
                    open.text.push_str(&text);
                }
            }
            Event::CData(cdata) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Event::End(_) => {
                if let Some(open) = stack.pop() {
                    if !open.has_children {
                        fields.push((open.name, open.text.trim().to_string()));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err("unexpected end of XML document".to_string());
    }
    Ok(fields)
}

fn parse_form(body: &str) -> Vec<(String, String)> {
    body.trim()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_form(key).to_ascii_lowercase(), decode_form(value))
        })
        .collect()
}

fn decode_form(value: &str) -> String {
    let spaced = value.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<TurnitinResponse, RemoteError> {
        TurnitinResponse::parse(HttpResponse::ok(body))
    }

    #[test]
    fn parses_xml_success() {
        let response = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <returndata>
              <rcode>51</rcode>
              <rmessage>Paper submitted &amp; saved</rmessage>
              <objectID>1234567</objectID>
            </returndata>"#,
        )
        .unwrap();
        assert_eq!(response.return_code(), 51);
        assert!(response.is_success());
        assert_eq!(response.message(), Some("Paper submitted & saved"));
        assert_eq!(response.object_id(), Some("1234567"));
        assert!(response.into_result().is_success());
    }

    #[test]
    fn parses_form_encoded_error() {
        let response = parse("rcode=217&rmessage=Assignment+does+not+exist%21").unwrap();
        assert_eq!(response.return_code(), 217);
        assert!(!response.is_success());
        let err = response.into_result().error().cloned().unwrap();
        assert_eq!(
            err,
            RemoteError::Vendor {
                code: 217,
                message: "Assignment does not exist!".to_string()
            }
        );
        assert_eq!(err.code(), Some(217));
    }

    #[test]
    fn zero_return_code_is_an_error() {
        let response = parse("<returndata><rcode>0</rcode></returndata>").unwrap();
        assert!(!response.is_success());
        assert_eq!(response.into_result().error().and_then(RemoteError::code), Some(0));
    }

    #[test]
    fn byte_order_mark_is_skipped() {
        let response = parse(
            "\u{feff}<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <returndata><rcode>51</rcode><objectID>77</objectID></returndata>",
        )
        .unwrap();
        assert_eq!(response.return_code(), 51);
        assert_eq!(response.object_id(), Some("77"));
        let response = parse("\u{feff}rcode=11&userid=5").unwrap();
        assert_eq!(response.user_id(), Some("5"));
    }

    #[test]
    fn field_lookup_ignores_case() {
        let response = parse("<returndata><rcode>21</rcode><ClassID>9</ClassID></returndata>").unwrap();
        let name = String::from("CLASSID");
        let class_id = response.field(&name);
        drop(name);
        assert_eq!(class_id, Some("9"));
    }

    #[test]
    fn missing_rcode_is_malformed() {
        let err = parse("<returndata><rmessage>hi</rmessage></returndata>").unwrap_err();
        assert!(matches!(err, RemoteError::Malformed { .. }));
        assert_eq!(err.code(), None);
        assert!(matches!(parse("").unwrap_err(), RemoteError::Malformed { .. }));
        assert!(matches!(parse("<html>oops").unwrap_err(), RemoteError::Malformed { .. }));
        assert!(matches!(parse("Service Unavailable").unwrap_err(), RemoteError::Malformed { .. }));
    }

    #[test]
    fn repeated_elements_are_all_recorded() {
        let response = parse(
            "<returndata><rcode>72</rcode>\
             <object><objectID>1</objectID><title>A</title></object>\
             <object><objectID>2</objectID><title>B</title></object>\
             </returndata>",
        )
        .unwrap();
        assert_eq!(response.values("objectid").collect::<Vec<_>>(), ["1", "2"]);
        assert_eq!(response.field("title"), Some("A"));
    }

    #[test]
    fn report_scores_are_optional() {
        let response = parse(
            "<returndata><rcode>61</rcode><originalityscore>42</originalityscore>\
             <web_overlap>30</web_overlap><student_paper_overlap>12</student_paper_overlap>\
             </returndata>",
        )
        .unwrap();
        let scores = ReportScores::from_response(&response);
        assert_eq!(scores.similarity_score, Some(42.0));
        assert_eq!(scores.web_overlap, Some(30.0));
        assert_eq!(scores.publication_overlap, None);
        assert_eq!(scores.student_overlap, Some(12.0));
        assert_eq!(scores.state(), Some(SimilarityState::Warning));
        assert!(!scores.is_empty());
        assert!(ReportScores::default().is_empty());
    }

    #[test]
    fn similarity_thresholds() {
        assert_eq!(SimilarityState::from_score(0.0), SimilarityState::None);
        assert_eq!(SimilarityState::from_score(24.9), SimilarityState::Acceptable);
        assert_eq!(SimilarityState::from_score(25.0), SimilarityState::Warning);
        assert_eq!(SimilarityState::from_score(50.0), SimilarityState::Problem);
        assert_eq!(SimilarityState::from_score(75.0), SimilarityState::Failure);
        assert_eq!(SimilarityState::from_score(100.0).as_str(), "failure");
    }

    #[test]
    fn map_preserves_errors() {
        let ok: RemoteResult<u32> = RemoteResult::Success(2);
        assert_eq!(ok.map(|n| n * 2), RemoteResult::Success(4));
        let err: RemoteResult<u32> = RemoteResult::Error(RemoteError::Vendor {
            code: 300,
            message: "nope".to_string(),
        });
        assert!(err.map(|n| n * 2).error().is_some());
    }
}
