use std::fmt::Debug;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use log::debug;

use crate::{Error, MultipartForm, Result};

/// UploadTarget describes where a file is uploaded and how.
///
/// Each storage backend implements this trait. Implementations only build
/// request descriptions: sending them, and retrying, is up to the caller.
pub trait UploadTarget: Debug + Send + Sync {
    /// Region of the storage endpoint.
    ///
    /// Returns `None` for backends without the notion of region.
    fn region(&self) -> Option<&str>;

    /// Bucket receiving the upload.
    ///
    /// Returns `None` for backends without the notion of bucket.
    fn bucket(&self) -> Option<&str>;

    /// URL the upload request is sent to.
    fn url(&self) -> &str;

    /// Build the request that uploads the file at `path`.
    ///
    /// The file is read while building the request and closed before this
    /// function returns, whether it succeeds or not.
    fn create_upload_request(&self, path: &Path) -> Result<http::Request<Bytes>>;
}

/// DirectUploadTarget posts the file to a plain URL without any authorization.
///
/// It's useful for local object stores, upload proxies that hold their own
/// credentials, and tests.
#[derive(Debug, Clone)]
pub struct DirectUploadTarget {
    url: String,
    fields: Vec<(String, String)>,
}

impl DirectUploadTarget {
    /// Create a target posting to `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            fields: Vec::new(),
        }
    }

    /// Add a form field sent before the file.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }
}

impl UploadTarget for DirectUploadTarget {
    fn region(&self) -> Option<&str> {
        None
    }

    fn bucket(&self) -> Option<&str> {
        None
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn create_upload_request(&self, path: &Path) -> Result<http::Request<Bytes>> {
        let content = read_upload_file(path)?;

        let form = self
            .fields
            .iter()
            .fold(MultipartForm::new(), |form, (k, v)| form.text(k, v))
            .file("file", upload_file_name(path), content);

        build_form_request(&self.url, form)
    }
}

/// Read the whole file at `path` for uploading.
///
/// A missing file or a directory is reported as
/// [`crate::ErrorKind::FileNotFound`]. The file handle is dropped before
/// returning.
pub fn read_upload_file(path: &Path) -> Result<Bytes> {
    let mut f = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            Error::file_not_found(format!("file '{}' does not exist", path.display()))
                .with_source(e)
        }
        _ => Error::file_not_found(format!("file '{}' can't be opened", path.display()))
            .with_source(e),
    })?;

    let meta = f.metadata().map_err(|e| {
        Error::unexpected(format!("failed to stat file '{}'", path.display())).with_source(e)
    })?;
    if meta.is_dir() {
        return Err(Error::file_not_found(format!(
            "file '{}' is a directory",
            path.display()
        )));
    }

    let mut buf = Vec::with_capacity(usize::try_from(meta.len()).unwrap_or_default());
    f.read_to_end(&mut buf).map_err(|e| {
        Error::unexpected(format!("failed to read file '{}'", path.display())).with_source(e)
    })?;
    debug!("read {} bytes from {}", buf.len(), path.display());

    Ok(buf.into())
}

/// File name sent in the form's content disposition.
pub fn upload_file_name(path: &Path) -> String {
    path.file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Build a `POST` request to `url` carrying `form`.
pub fn build_form_request(url: &str, form: MultipartForm) -> Result<http::Request<Bytes>> {
    let content_type = form.content_type();
    let body = form.build();

    let req = http::Request::post(url)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, body.len().to_string())
        .body(body)?;
    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_direct_upload_target() -> anyhow::Result<()> {
        let mut f = tempfile::NamedTempFile::new()?;
        f.write_all(b"fake video content")?;

        let target = DirectUploadTarget::new("http://127.0.0.1:9000/upload")
            .with_field("token", "abc")
            .with_field("acl", "private");
        assert_eq!(target.region(), None);
        assert_eq!(target.bucket(), None);
        assert_eq!(target.url(), "http://127.0.0.1:9000/upload");

        let req = target.create_upload_request(f.path())?;
        assert_eq!(req.method(), http::Method::POST);
        assert_eq!(req.uri(), "http://127.0.0.1:9000/upload");

        let content_type = req.headers()[CONTENT_TYPE].to_str()?;
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert_eq!(
            req.headers()[CONTENT_LENGTH].to_str()?,
            req.body().len().to_string()
        );

        let form = MultipartForm::parse(content_type, req.body())?;
        assert_eq!(
            form.fields(),
            &[
                ("token".to_string(), "abc".to_string()),
                ("acl".to_string(), "private".to_string())
            ]
        );
        let file = form.file_part().expect("file part must exist");
        assert_eq!(file.name, "file");
        assert_eq!(file.filename, upload_file_name(f.path()));
        assert_eq!(file.content.as_ref(), b"fake video content");
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let target = DirectUploadTarget::new("http://127.0.0.1:9000/upload");
        let err = target
            .create_upload_request(Path::new("myfile.mp4"))
            .expect_err("must fail");

        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(err.to_string(), "file 'myfile.mp4' does not exist");
    }

    #[test]
    fn test_directory_is_not_a_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let target = DirectUploadTarget::new("http://127.0.0.1:9000/upload");

        let err = target
            .create_upload_request(dir.path())
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        Ok(())
    }

    #[test]
    fn test_invalid_url() -> anyhow::Result<()> {
        let f = tempfile::NamedTempFile::new()?;
        let target = DirectUploadTarget::new("http://exa mple.com/upload");

        let err = target
            .create_upload_request(f.path())
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::RequestInvalid);
        Ok(())
    }
}
