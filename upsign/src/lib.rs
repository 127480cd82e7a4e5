//! Direct video uploads to S3 compatible object stores.
//!
//! `upsign` fetches upload parameters from the video API and posts files to
//! the storage endpoint those parameters point at. The signing and request
//! building pieces live in their own crates and are re-exported here:
//!
//! - [`upsign_core`]: errors, [`Context`], [`UploadTarget`], multipart forms
//! - [`aws`]: S3 action URLs, SigV4 signing, [`aws::S3UploadTarget`]
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use upsign::{Config, VideoApi};
//!
//! # async fn example() -> upsign::Result<()> {
//! let ctx = upsign::default_context();
//! let config = Config::default().from_env(&ctx);
//! let api = VideoApi::new(ctx, config)?;
//!
//! let mut video = api.create().await?;
//! api.upload_file(&mut video, Path::new("video.mp4")).await?;
//! print!("{video}");
//! # Ok(())
//! # }
//! ```

pub use upsign_core::*;

/// S3 upload signing.
pub mod aws {
    pub use upsign_aws_s3::*;
}

mod config;
pub use config::Config;

mod video;
pub use video::Player;
pub use video::Video;

mod api;
pub use api::VideoApi;

/// Create a [`Context`] that sends requests with reqwest and reads the
/// process environment.
#[cfg(feature = "default-context")]
pub fn default_context() -> Context {
    Context::new()
        .with_http_send(upsign_http_send_reqwest::ReqwestHttpSend::default())
        .with_env(OsEnv)
}
