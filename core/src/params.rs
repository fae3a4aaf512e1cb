//! Typed parameter set for one remote call.
//!
//! # Design
//! Every key the service understands is a named field. The struct is only
//! flattened into `(key, value)` pairs at the wire boundary, in
//! [`WIRE_KEYS`] order with the paper payload last; the signing order lives
//! separately in [`crate::signing::SIGNING_KEYS`].

use serde_json::{Map, Value};

use crate::settings::AssignmentSettings;

/// Keys sent but not covered by the signature.
pub const UNSIGNED_KEYS: [&str; 2] = ["src", "late_accept_flag"];

/// Text keys in the order they are written to the wire (signed keys first,
/// then unsigned keys, then assignment settings).
pub const WIRE_KEYS: [&str; 32] = [
    "aid", "assign", "assignid", "cid", "cpw", "ctl", "diagnostic", "dis", "dtdue", "dtstart",
    "dtpost", "encrypt", "fcmd", "fid", "gmtime", "newassign", "newupw", "oid", "pfn", "pln",
    "ptl", "ptype", "said", "tem", "uem", "ufn", "uid", "uln", "upw", "utp", "src",
    "late_accept_flag",
];

/// Paper body for `submit_paper` (`pdata`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaperData {
    /// Plaintext body; escaped like any other text value on POST.
    Text(String),
    /// Raw file bytes; sent as a multipart file part, never escaped.
    File { filename: String, content: Vec<u8> },
}

/// A value as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue<'a> {
    Text(String),
    File { filename: &'a str, content: &'a [u8] },
}

/// Unsigned request parameters, one optional field per vocabulary key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    /// Account id.
    pub aid: Option<String>,
    /// Assignment title, `"{title} - {id}"`.
    pub assign: Option<String>,
    pub assignid: Option<String>,
    /// Course (class) id.
    pub cid: Option<String>,
    /// Course password.
    pub cpw: Option<String>,
    /// Course title.
    pub ctl: Option<String>,
    pub diagnostic: Option<String>,
    pub dis: Option<String>,
    pub dtdue: Option<String>,
    pub dtstart: Option<String>,
    pub dtpost: Option<String>,
    pub encrypt: Option<String>,
    pub fcmd: Option<String>,
    pub fid: Option<String>,
    /// UTC timestamp, `YYYYMMDDHHM`.
    pub gmtime: Option<String>,
    pub newassign: Option<String>,
    pub newupw: Option<String>,
    /// Remote paper (object) id.
    pub oid: Option<String>,
    pub pfn: Option<String>,
    pub pln: Option<String>,
    /// Paper title.
    pub ptl: Option<String>,
    pub ptype: Option<String>,
    pub said: Option<String>,
    /// Instructor (course) email on student calls.
    pub tem: Option<String>,
    pub uem: Option<String>,
    pub ufn: Option<String>,
    pub uid: Option<String>,
    pub uln: Option<String>,
    pub upw: Option<String>,
    pub utp: Option<String>,
    pub src: Option<String>,
    pub late_accept_flag: Option<String>,
    pub settings: Option<AssignmentSettings>,
    pub pdata: Option<PaperData>,
}

impl RequestParams {
    /// Text value for `key`, including assignment settings keys. The paper
    /// payload is not a text value.
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "aid" => &self.aid,
            "assign" => &self.assign,
            "assignid" => &self.assignid,
            "cid" => &self.cid,
            "cpw" => &self.cpw,
            "ctl" => &self.ctl,
            "diagnostic" => &self.diagnostic,
            "dis" => &self.dis,
            "dtdue" => &self.dtdue,
            "dtstart" => &self.dtstart,
            "dtpost" => &self.dtpost,
            "encrypt" => &self.encrypt,
            "fcmd" => &self.fcmd,
            "fid" => &self.fid,
            "gmtime" => &self.gmtime,
            "newassign" => &self.newassign,
            "newupw" => &self.newupw,
            "oid" => &self.oid,
            "pfn" => &self.pfn,
            "pln" => &self.pln,
            "ptl" => &self.ptl,
            "ptype" => &self.ptype,
            "said" => &self.said,
            "tem" => &self.tem,
            "uem" => &self.uem,
            "ufn" => &self.ufn,
            "uid" => &self.uid,
            "uln" => &self.uln,
            "upw" => &self.upw,
            "utp" => &self.utp,
            "src" => &self.src,
            "late_accept_flag" => &self.late_accept_flag,
            other => {
                return self
                    .settings
                    .as_ref()?
                    .fields()
                    .into_iter()
                    .find(|(name, _)| *name == other)
                    .map(|(_, value)| value);
            }
        };
        value.as_deref()
    }

    /// Present text values in wire order.
    pub fn text_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields: Vec<(&'static str, &str)> = WIRE_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect();
        if let Some(settings) = &self.settings {
            fields.extend(settings.fields());
        }
        fields
    }

    /// Every present value in wire order, text first, `pdata` last.
    pub fn wire_fields(&self) -> Vec<(&'static str, WireValue<'_>)> {
        let mut fields: Vec<(&'static str, WireValue<'_>)> = self
            .text_fields()
            .into_iter()
            .map(|(key, value)| (key, WireValue::Text(value.to_string())))
            .collect();
        match &self.pdata {
            Some(PaperData::Text(text)) => fields.push(("pdata", WireValue::Text(text.clone()))),
            Some(PaperData::File { filename, content }) => fields.push((
                "pdata",
                WireValue::File {
                    filename,
                    content,
                },
            )),
            None => {}
        }
        fields
    }

    /// JSON rendering for error logs. File payloads are summarized by size.
    pub fn to_log_json(&self, md5: &str) -> String {
        let mut map = Map::new();
        for (key, value) in self.text_fields() {
            map.insert(key.to_string(), Value::String(value.to_string()));
        }
        match &self.pdata {
            Some(PaperData::Text(text)) => {
                map.insert("pdata".to_string(), Value::String(text.clone()));
            }
            Some(PaperData::File { filename, content }) => {
                map.insert(
                    "pdata".to_string(),
                    Value::String(format!("<file {filename}, {} bytes>", content.len())),
                );
            }
            None => {}
        }
        map.insert("md5".to_string(), Value::String(md5.to_string()));
        Value::Object(map).to_string()
    }
}
