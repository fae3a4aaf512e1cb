//! Plagiarism-check settings attached to an assignment.
//!
//! # Design
//! Settings arrive as a loose JSON object (whatever the caller stored) and
//! leave as [`AssignmentSettings`], whose fields are already the exact
//! strings the service expects. Normalization never fails: unknown keys are
//! dropped and every out-of-range value falls back to a fixed default, so
//! normalizing a normalized value changes nothing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const VISIBILITIES: [&str; 4] = ["immediate", "after_grading", "after_due_date", "never"];
const EXCLUDE_TYPES: [&str; 3] = ["0", "1", "2"];

/// Normalized assignment settings, ready to be merged into a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSettings {
    /// One of `immediate`, `after_grading`, `after_due_date`, `never`.
    pub originality_report_visibility: String,
    /// `"0"` when students never see the report, `"1"` otherwise.
    pub s_view_report: String,
    pub s_paper_check: String,
    pub internet_check: String,
    pub journal_check: String,
    pub exclude_biblio: String,
    pub exclude_quoted: String,
    /// `"0"` no exclusion, `"1"` by word count, `"2"` by percentage.
    pub exclude_type: String,
    pub exclude_value: String,
    /// `0` none, `1` standard repository, `2` institution repository.
    pub submit_papers_to: String,
    /// The assignment already exists remotely; the request becomes an update.
    #[serde(default)]
    pub created: bool,
}

impl Default for AssignmentSettings {
    fn default() -> Self {
        Self {
            originality_report_visibility: "immediate".to_string(),
            s_view_report: "1".to_string(),
            s_paper_check: "1".to_string(),
            internet_check: "1".to_string(),
            journal_check: "1".to_string(),
            exclude_biblio: "1".to_string(),
            exclude_quoted: "1".to_string(),
            exclude_type: "0".to_string(),
            exclude_value: String::new(),
            submit_papers_to: "1".to_string(),
            created: false,
        }
    }
}

impl AssignmentSettings {
    /// Restrict `raw` to the recognized keys and coerce every value into its
    /// permitted range.
    pub fn normalize(raw: &Map<String, Value>) -> Self {
        let visibility = match raw.get("originality_report_visibility") {
            Some(Value::String(v)) if VISIBILITIES.contains(&v.as_str()) => v.clone(),
            _ => "immediate".to_string(),
        };

        let exclude_type = match raw.get("exclude_type") {
            Some(Value::String(v)) if EXCLUDE_TYPES.contains(&v.as_str()) => v.clone(),
            _ => "0".to_string(),
        };
        let requested = raw.get("exclude_value").map_or(0, integer_value);
        let exclude_value = match exclude_type.as_str() {
            "1" => requested.max(1).to_string(),
            "2" if (0..=100).contains(&requested) => requested.to_string(),
            "2" => "0".to_string(),
            _ => String::new(),
        };

        Self {
            s_view_report: student_visibility(&visibility).to_string(),
            originality_report_visibility: visibility,
            s_paper_check: flag(raw.get("s_paper_check")),
            internet_check: flag(raw.get("internet_check")),
            journal_check: flag(raw.get("journal_check")),
            exclude_biblio: flag(raw.get("exclude_biblio")),
            exclude_quoted: flag(raw.get("exclude_quoted")),
            exclude_type,
            exclude_value,
            submit_papers_to: flag(raw.get("submit_papers_to")),
            created: raw.get("created").is_some_and(truthy),
        }
    }

    /// Wire parameters in the order they are sent. `created` is consumed by
    /// the client and never sent.
    pub fn fields(&self) -> [(&'static str, &str); 10] {
        [
            ("originality_report_visibility", &self.originality_report_visibility),
            ("s_view_report", &self.s_view_report),
            ("s_paper_check", &self.s_paper_check),
            ("internet_check", &self.internet_check),
            ("journal_check", &self.journal_check),
            ("exclude_biblio", &self.exclude_biblio),
            ("exclude_quoted", &self.exclude_quoted),
            ("exclude_type", &self.exclude_type),
            ("exclude_value", &self.exclude_value),
            ("submit_papers_to", &self.submit_papers_to),
        ]
    }
}

/// `"0"` only for `never`.
pub fn student_visibility(visibility: &str) -> &'static str {
    if visibility == "never" {
        "0"
    } else {
        "1"
    }
}

fn flag(value: Option<&Value>) -> String {
    if value.is_some_and(truthy) {
        "1".to_string()
    } else {
        "0".to_string()
    }
}

/// Loose boolean coercion for values entered through settings forms.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "on" | "1" => true,
            "no" | "false" | "off" | "0" => false,
            other => leading_integer(other) != 0,
        },
        other => integer_value(other) != 0,
    }
}

fn integer_value(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => leading_integer(s),
        _ => 0,
    }
}

/// Integer prefix of `s` after leading whitespace; `0` when there is none.
/// `"42abc"` is 42, `"-5"` is -5.
fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));
    if negative {
        -magnitude
    } else {
        magnitude
    }
}
