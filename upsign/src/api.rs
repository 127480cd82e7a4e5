use std::fmt::{Debug, Formatter};
use std::path::Path;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::StatusCode;
use log::{debug, info, warn};
use quick_xml::de;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use upsign_aws_s3::{Credential, S3UploadTarget, UploadParameters};
use upsign_core::utils::Redact;
use upsign_core::{Context, Error, Result, UploadTarget};

use crate::{Config, Video};

/// VideoApi drives the video API and the uploads it authorizes.
///
/// Every API call is a form encoded `POST <api_url>/v1/video/<action>`
/// carrying the api key. Requests go through [`Context::http_send`], nothing
/// is retried.
#[derive(Clone)]
pub struct VideoApi {
    ctx: Context,
    api_key: String,
    api_url: String,
}

impl Debug for VideoApi {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoApi")
            .field("ctx", &self.ctx)
            .field("api_key", &Redact::from(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl VideoApi {
    /// Create a client, `config.api_key` must be set.
    pub fn new(ctx: Context, config: Config) -> Result<Self> {
        let api_url = config.api_url().to_string();
        let api_key = config
            .api_key
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::config_invalid("api_key is required for the video api"))?;

        Ok(Self {
            ctx,
            api_key,
            api_url,
        })
    }

    /// Base url of the API.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Create a new video.
    pub async fn create(&self) -> Result<Video> {
        self.call("create", &[]).await
    }

    /// Load the details of video `id`.
    pub async fn get_video(&self, id: &str) -> Result<Video> {
        self.call("details", &[("video_id", id)]).await
    }

    /// Load the upload parameters of `video`.
    ///
    /// Nothing is fetched when valid parameters are already loaded.
    pub async fn upload_info(&self, video: &mut Video) -> Result<()> {
        if video.has_upload_info() {
            info!("upload info of video {} already loaded, skipping", video.id);
            return Ok(());
        }

        let params: UploadParameters = self.call("upload", &[("video_id", video.id.as_str())]).await?;
        video.upload_info = Some(params);
        Ok(())
    }

    /// Upload the file at `path` as the source of `video`.
    ///
    /// Upload parameters are loaded first if needed. The request is signed
    /// when `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY` are both set in
    /// the context, otherwise the POST policy fields authorize it.
    pub async fn upload_file(&self, video: &mut Video, path: &Path) -> Result<()> {
        self.upload_info(video).await.inspect_err(|e| {
            warn!("failed to load upload info of video {}: {e}", video.id);
        })?;
        let params = video
            .upload_info
            .clone()
            .ok_or_else(|| Error::request_invalid("no valid upload data"))?;

        let target = S3UploadTarget::new(params)?;
        let req = target.create_upload_request(path)?;
        let req = match Credential::from_env(&self.ctx) {
            Some(cred) => {
                let (mut parts, body) = req.into_parts();
                target.sign_request(&mut parts, &cred)?;
                http::Request::from_parts(parts, body)
            }
            None => req,
        };

        self.send_upload(req).await
    }

    /// Upload the file at `path` to an arbitrary `target`.
    pub async fn upload_file_to(&self, target: &dyn UploadTarget, path: &Path) -> Result<()> {
        let req = target.create_upload_request(path)?;
        self.send_upload(req).await
    }

    async fn send_upload(&self, req: http::Request<Bytes>) -> Result<()> {
        debug!("uploading {} bytes to {}", req.body().len(), req.uri());

        let resp = self.ctx.http_send(req).await?;
        if !resp.status().is_success() {
            return Err(parse_storage_error(resp.status(), resp.body()));
        }

        info!("upload finished with status {}", resp.status());
        Ok(())
    }

    async fn call<T: DeserializeOwned>(&self, action: &str, form: &[(&str, &str)]) -> Result<T> {
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("api_key", &self.api_key)
            .extend_pairs(form)
            .finish();
        let req = http::Request::post(format!("{}/v1/video/{action}", self.api_url))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Bytes::from(body))?;

        let resp = self.ctx.http_send(req).await?;
        if !resp.status().is_success() {
            return Err(parse_api_error(resp.status(), resp.body()));
        }

        serde_json::from_slice(resp.body()).map_err(|e| {
            Error::unexpected(format!("failed to parse response of video api {action}"))
                .with_source(e)
        })
    }
}

#[derive(Default, Debug, Deserialize)]
#[serde(default)]
struct ApiError {
    url: String,
    name: String,
    message: String,
}

/// Turn an error response of the video API into an error carrying its message.
fn parse_api_error(status: StatusCode, body: &[u8]) -> Error {
    match serde_json::from_slice::<ApiError>(body) {
        Ok(e) if !e.message.is_empty() => {
            debug!("video api responded {status}: {} ({})", e.name, e.url);
            Error::remote_rejection(e.message)
        }
        _ => Error::remote_rejection(format!(
            "video api responded {status}: {}",
            String::from_utf8_lossy(body)
        )),
    }
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct StorageError {
    code: String,
    message: String,
}

/// Turn an S3 XML error response into an error carrying its `<Message>`.
fn parse_storage_error(status: StatusCode, body: &[u8]) -> Error {
    let content = String::from_utf8_lossy(body);
    match de::from_str::<StorageError>(&content) {
        Ok(e) if !e.message.is_empty() => {
            debug!("storage responded {status}: {}", e.code);
            Error::remote_rejection(e.message)
        }
        _ => Error::remote_rejection(format!("storage responded {status}: {content}")),
    }
}
