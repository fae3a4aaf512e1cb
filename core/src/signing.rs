//! Request signing and value escaping.
//!
//! # Design
//! The service authenticates a request by recomputing an MD5 digest over the
//! values of a fixed list of keys followed by the account's shared secret. It
//! unescapes parameters before digesting, so the digest is always taken over
//! raw values and escaping happens afterwards, on the way to the wire.

use md5::{Digest, Md5};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::params::RequestParams;

/// Keys covered by the signature, in digest order.
pub const SIGNING_KEYS: [&str; 30] = [
    "aid", "assign", "assignid", "cid", "cpw", "ctl", "diagnostic", "dis", "dtdue", "dtstart",
    "dtpost", "encrypt", "fcmd", "fid", "gmtime", "newassign", "newupw", "oid", "pfn", "pln",
    "ptl", "ptype", "said", "tem", "uem", "ufn", "uid", "uln", "upw", "utp",
];

/// Characters left as-is by form escaping: ASCII alphanumerics and `_ . - ~`.
const FORM_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Signature for `params`: lower-case hex MD5 over the signed values in
/// [`SIGNING_KEYS`] order, then `shared_secret`.
pub fn sign(params: &RequestParams, shared_secret: &str) -> String {
    sign_with(|key| params.get(key), shared_secret)
}

/// Same as [`sign`] for any key lookup. Absent keys contribute nothing.
pub fn sign_with<'a, F>(lookup: F, shared_secret: &str) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut hasher = Md5::new();
    for key in SIGNING_KEYS {
        if let Some(value) = lookup(key) {
            hasher.update(value.as_bytes());
        }
    }
    hasher.update(shared_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Escaping for multipart POST values. Spaces become `%20`, which is what
/// the service expects instead of `+`.
pub fn escape_post_value(value: &str) -> String {
    utf8_percent_encode(value, FORM_ESCAPE).to_string()
}

/// Escaping for query-string values. Spaces become `+`.
pub fn escape_query_value(value: &str) -> String {
    // Every `%` in the encoded output starts a triple, so `%20` is a space.
    escape_post_value(value).replace("%20", "+")
}
