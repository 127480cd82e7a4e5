use std::path::Path;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST};
use http::request::Parts;
use http::HeaderMap;
use log::debug;
use serde::{Deserialize, Serialize};
use upsign_core::{
    build_form_request, canonical_header_key, read_upload_file, upload_file_name, Error,
    MultipartForm, Result, SigningRequest, UploadTarget,
};

use crate::action_url::{parse_action_url, ActionUrl};
use crate::{Credential, SignedResult, V4Request};

/// UploadParameters are the POST-policy fields handed out by the video API.
///
/// Field names follow the JSON returned by the API, which are also the form
/// field names S3 expects.
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadParameters {
    /// Object key of the upload.
    pub key: String,
    /// Canned ACL of the object.
    pub acl: String,
    /// Content type of the object.
    #[serde(rename = "Content-Type")]
    pub content_type: String,
    /// Access key the policy was signed with.
    #[serde(rename = "AWSAccessKeyId")]
    pub aws_access_key_id: String,
    /// URL of the uploader signature service.
    pub signature_url: String,
    /// Upload destination, a virtual-host style S3 URL.
    pub action: String,
    /// Base64 encoded POST policy.
    #[serde(rename = "Policy", skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    /// Signature of the POST policy.
    #[serde(rename = "Signature", skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl UploadParameters {
    /// The parameters carry an object key.
    pub fn is_valid(&self) -> bool {
        !self.key.is_empty()
    }

    /// Form fields sent before the file, in order.
    ///
    /// `action` is the request url and never a field. Optional fields are
    /// skipped when unset.
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![
            ("key", self.key.as_str()),
            ("acl", self.acl.as_str()),
            ("Content-Type", self.content_type.as_str()),
            ("AWSAccessKeyId", self.aws_access_key_id.as_str()),
        ];
        if !self.signature_url.is_empty() {
            fields.push(("signature_url", self.signature_url.as_str()));
        }
        if let Some(v) = &self.policy {
            fields.push(("Policy", v.as_str()));
        }
        if let Some(v) = &self.signature {
            fields.push(("Signature", v.as_str()));
        }
        fields
    }
}

/// S3UploadTarget uploads files to the bucket named by the parameters' action URL.
///
/// ```
/// use upsign_aws_s3::{S3UploadTarget, UploadParameters};
///
/// let target = S3UploadTarget::new(UploadParameters {
///     key: "k".to_string(),
///     acl: "private".to_string(),
///     action: "https://bucket.s3.amazonaws.com".to_string(),
///     ..Default::default()
/// })
/// .unwrap();
///
/// assert_eq!(target.region(), "us-east-1");
/// assert_eq!(target.bucket(), "bucket");
/// ```
#[derive(Debug, Clone)]
pub struct S3UploadTarget {
    url: ActionUrl,
    params: UploadParameters,
}

impl S3UploadTarget {
    /// Validate `params` and create a target.
    ///
    /// Fails with [`upsign_core::ErrorKind::InvalidActionUrl`] when the action
    /// isn't an S3 virtual-host URL.
    pub fn new(params: UploadParameters) -> Result<Self> {
        let url = parse_action_url(&params.action)?;
        Ok(Self { url, params })
    }

    /// Region of the bucket.
    pub fn region(&self) -> &str {
        &self.url.region
    }

    /// Bucket receiving the upload.
    pub fn bucket(&self) -> &str {
        &self.url.bucket
    }

    /// Host of the action URL.
    pub fn host(&self) -> &str {
        &self.url.host
    }

    /// Action URL the form is posted to.
    pub fn url(&self) -> &str {
        &self.params.action
    }

    /// Object key.
    pub fn key(&self) -> &str {
        &self.params.key
    }

    /// Canned ACL.
    pub fn acl(&self) -> &str {
        &self.params.acl
    }

    /// Content type of the object.
    pub fn content_type(&self) -> &str {
        &self.params.content_type
    }

    /// Access key the POST policy was signed with.
    pub fn aws_key_id(&self) -> &str {
        &self.params.aws_access_key_id
    }

    /// URL of the uploader signature service.
    pub fn uploader_sig_url(&self) -> &str {
        &self.params.signature_url
    }

    /// The parameters this target was built from.
    pub fn params(&self) -> &UploadParameters {
        &self.params
    }

    /// Sign the request in `parts` with `cred` and apply the signed headers.
    ///
    /// `Host`, `Content-Type` and every `x-amz-*` header present are signed.
    /// The returned [`SignedResult`] is already applied to `parts.headers`.
    pub fn sign_request(&self, parts: &mut Parts, cred: &Credential) -> Result<SignedResult> {
        let req = SigningRequest::build(parts)?;

        let mut signed = HeaderMap::new();
        for (name, value) in parts.headers.iter() {
            if name == CONTENT_TYPE || name.as_str().starts_with("x-amz-") {
                signed.insert(name.clone(), value.clone());
            }
        }

        let mut v4 = V4Request::new(self.region(), &req, &signed);
        v4.headers
            .entry(canonical_header_key(HOST.as_str()))
            .or_insert_with(|| self.url.host.clone());
        let result = v4.sign(&cred.access_key_id, &cred.secret_access_key)?;
        debug!("signed upload request for bucket {}", self.bucket());

        result.apply(&mut parts.headers)?;
        Ok(result)
    }
}

impl UploadTarget for S3UploadTarget {
    fn region(&self) -> Option<&str> {
        Some(S3UploadTarget::region(self))
    }

    fn bucket(&self) -> Option<&str> {
        Some(S3UploadTarget::bucket(self))
    }

    fn url(&self) -> &str {
        S3UploadTarget::url(self)
    }

    fn create_upload_request(&self, path: &Path) -> Result<http::Request<Bytes>> {
        if !self.params.is_valid() {
            return Err(Error::request_invalid("no valid upload data"));
        }
        let content: Bytes = read_upload_file(path)?;

        let form = self
            .params
            .form_fields()
            .into_iter()
            .fold(MultipartForm::new(), |form, (k, v)| form.text(k, v))
            .file("file", upload_file_name(path), content);
        debug!(
            "built upload form for key {} to {}",
            self.key(),
            self.url()
        );

        build_form_request(self.url(), form)
    }
}
