use bytes::{BufMut, Bytes, BytesMut};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::{Error, Result};

/// Content type used for the file part.
const OCTET_STREAM: &str = "application/octet-stream";

/// MultipartForm encodes a `multipart/form-data` body.
///
/// Text fields are written in insertion order and the file part always comes
/// last: S3 ignores every field that follows the file in a POST upload.
///
/// ```
/// use bytes::Bytes;
/// use upsign_core::MultipartForm;
///
/// let form = MultipartForm::with_boundary("xyz")
///     .text("key", "videos/a.mp4")
///     .file("file", "a.mp4", Bytes::from_static(b"data"));
///
/// assert_eq!(form.content_type(), "multipart/form-data; boundary=xyz");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartForm {
    boundary: String,
    fields: Vec<(String, String)>,
    file: Option<FilePart>,
}

/// The file carried by a [`MultipartForm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name, `file` for S3 POST uploads.
    pub name: String,
    /// File name sent in the content disposition.
    pub filename: String,
    /// Content type of the part.
    pub content_type: String,
    /// Raw file content.
    pub content: Bytes,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    /// Create a form with a random boundary.
    pub fn new() -> Self {
        let boundary: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        Self::with_boundary(boundary)
    }

    /// Create a form with given boundary.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            fields: Vec::new(),
            file: None,
        }
    }

    /// Append a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Set the file part, replacing the previous one.
    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content: Bytes,
    ) -> Self {
        self.file = Some(FilePart {
            name: name.into(),
            filename: filename.into(),
            content_type: OCTET_STREAM.to_string(),
            content,
        });
        self
    }

    /// Boundary separating the parts.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Text fields in the order they are written.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Get the value of the first text field named `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The file part, if any.
    pub fn file_part(&self) -> Option<&FilePart> {
        self.file.as_ref()
    }

    /// Value for the `Content-Type` header of the request carrying this form.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encode the form into a request body.
    pub fn build(self) -> Bytes {
        let size = self
            .fields
            .iter()
            .map(|(k, v)| k.len() + v.len() + self.boundary.len() + 64)
            .sum::<usize>()
            + self.file.as_ref().map_or(0, |f| f.content.len() + 256);
        let mut buf = BytesMut::with_capacity(size);

        for (name, value) in &self.fields {
            buf.put_slice(format!("--{}\r\n", self.boundary).as_bytes());
            buf.put_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    escape_param(name)
                )
                .as_bytes(),
            );
            buf.put_slice(value.as_bytes());
            buf.put_slice(b"\r\n");
        }

        if let Some(file) = &self.file {
            buf.put_slice(format!("--{}\r\n", self.boundary).as_bytes());
            buf.put_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    escape_param(&file.name),
                    escape_param(&file.filename)
                )
                .as_bytes(),
            );
            buf.put_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
            buf.put_slice(&file.content);
            buf.put_slice(b"\r\n");
        }

        buf.put_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        buf.freeze()
    }

    /// Decode a body produced by [`MultipartForm::build`].
    ///
    /// `content_type` is the value of the request's `Content-Type` header.
    /// Parts carrying a `filename` become the file part, the others text
    /// fields.
    pub fn parse(content_type: &str, body: &[u8]) -> Result<Self> {
        let boundary = extract_boundary(content_type)?;
        let delimiter = format!("--{boundary}");
        let part_end = format!("\r\n{delimiter}");
        let malformed = || Error::request_invalid("malformed multipart body");

        let start = find(body, delimiter.as_bytes()).ok_or_else(malformed)?;
        let mut rest = &body[start + delimiter.len()..];
        let mut form = Self::with_boundary(boundary);

        // A delimiter followed by `--` closes the body.
        while !rest.starts_with(b"--") {
            rest = rest.strip_prefix(b"\r\n").ok_or_else(malformed)?;
            let end = find(rest, part_end.as_bytes()).ok_or_else(malformed)?;
            let part = &rest[..end];
            rest = &rest[end + part_end.len()..];

            let header_end = find(part, b"\r\n\r\n").ok_or_else(malformed)?;
            let headers = std::str::from_utf8(&part[..header_end])
                .map_err(|e| malformed().with_source(e))?;
            let content = &part[header_end + 4..];

            let mut name = None;
            let mut filename = None;
            let mut part_type = OCTET_STREAM.to_string();
            for line in headers.split("\r\n") {
                let Some((key, value)) = line.split_once(':') else {
                    continue;
                };
                match key.trim().to_ascii_lowercase().as_str() {
                    "content-disposition" => {
                        for (key, value) in disposition_params(value) {
                            match key.as_str() {
                                "name" => name = Some(value),
                                "filename" => filename = Some(value),
                                _ => {}
                            }
                        }
                    }
                    "content-type" => part_type = value.trim().to_string(),
                    _ => {}
                }
            }

            let name = name.ok_or_else(|| {
                Error::request_invalid("multipart part without name in content disposition")
            })?;
            match filename {
                Some(filename) => {
                    form.file = Some(FilePart {
                        name,
                        filename,
                        content_type: part_type,
                        content: Bytes::copy_from_slice(content),
                    })
                }
                None => {
                    let value = String::from_utf8(content.to_vec())
                        .map_err(|e| malformed().with_source(e))?;
                    form.fields.push((name, value));
                }
            }
        }

        Ok(form)
    }
}

/// Extract the boundary string from a `multipart/form-data; boundary=...` value.
fn extract_boundary(content_type: &str) -> Result<String> {
    if !content_type
        .to_ascii_lowercase()
        .starts_with("multipart/form-data")
    {
        return Err(Error::request_invalid(format!(
            "expect content type multipart/form-data, got: {content_type}"
        )));
    }

    content_type
        .split(';')
        .filter_map(|part| part.trim().strip_prefix("boundary="))
        .map(|v| v.trim_matches('"').to_string())
        .find(|v| !v.is_empty())
        .ok_or_else(|| Error::request_invalid("missing boundary in content type"))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Escape a parameter value of the content disposition.
///
/// CR, LF and `"` are percent-encoded like browsers do, so a value can never
/// end the quoted string or the header line.
fn escape_param(s: &str) -> String {
    s.replace('\r', "%0D")
        .replace('\n', "%0A")
        .replace('"', "%22")
}

fn unescape_param(s: &str) -> String {
    s.replace("%0D", "\r")
        .replace("%0A", "\n")
        .replace("%22", "\"")
}

/// Parse the `key=value` parameters following the disposition type.
///
/// Keys are lower-cased. Quoted values may contain `;`.
fn disposition_params(value: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = value.chars().peekable();

    // Skip `form-data`.
    while chars.next_if(|&c| c != ';').is_some() {}
    while chars.next() == Some(';') {
        let mut key = String::new();
        while let Some(c) = chars.next_if(|&c| c != '=' && c != ';') {
            key.push(c);
        }

        let mut value = String::new();
        if chars.next_if_eq(&'=').is_some() {
            while chars.next_if(|c| c.is_ascii_whitespace()).is_some() {}
            if chars.next_if_eq(&'"').is_some() {
                for c in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                    value.push(c);
                }
                while chars.next_if(|&c| c != ';').is_some() {}
            } else {
                while let Some(c) = chars.next_if(|&c| c != ';') {
                    value.push(c);
                }
                value.truncate(value.trim_end().len());
            }
        }

        params.push((key.trim().to_ascii_lowercase(), unescape_param(&value)));
    }
    params
}
