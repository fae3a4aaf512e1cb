//! `multipart/form-data` encoding for POST requests.
//!
//! Text parts are written verbatim (callers escape them beforehand); file
//! parts carry a filename and raw bytes.

use uuid::Uuid;

use crate::params::WireValue;

/// A random boundary that cannot collide with escaped text values.
pub fn boundary() -> String {
    format!("----turnitin-{}", Uuid::new_v4().simple())
}

pub fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}

pub fn encode(fields: &[(&str, WireValue<'_>)], boundary: &str) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match value {
            WireValue::Text(text) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(text.as_bytes());
            }
            WireValue::File { filename, content } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{}\"\r\n",
                        quote_filename(filename)
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Transfer-Encoding: binary\r\n");
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
                body.extend_from_slice(content);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

/// Strip line breaks and escape quotes so the header stays on one line.
fn quote_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .map(|c| if c == '"' { "%22".to_string() } else { c.to_string() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_text_and_file_parts() {
        let fields = [
            ("aid", WireValue::Text("100".to_string())),
            (
                "pdata",
                WireValue::File {
                    filename: "a.txt",
                    content: b"hello",
                },
            ),
        ];
        let body = encode(&fields, "XYZ");
        let expected = "--XYZ\r\n\
            Content-Disposition: form-data; name=\"aid\"\r\n\r\n\
            100\r\n\
            --XYZ\r\n\
            Content-Disposition: form-data; name=\"pdata\"; filename=\"a.txt\"\r\n\
            Content-Transfer-Encoding: binary\r\n\
            Content-Type: application/octet-stream\r\n\r\n\
            hello\r\n\
            --XYZ--\r\n";
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn filenames_cannot_break_headers() {
        assert_eq!(quote_filename("my \"best\"\r\nessay.pdf"), "my %22best%22essay.pdf");
    }

    #[test]
    fn boundaries_are_unique() {
        let a = boundary();
        assert!(a.starts_with("----turnitin-"));
        assert_ne!(a, boundary());
        assert_eq!(content_type("B"), "multipart/form-data; boundary=B");
    }
}
