use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use upsign_aws_s3::UploadParameters;

/// Player information of an uploaded video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Player {
    /// Number of views.
    pub views: u64,
    /// Url of the embeddable player.
    pub embed_url: String,
    /// Url of the thumbnail.
    pub thumbnail_url: String,
}

/// Video is a video resource of the video API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Video {
    /// Id of the video.
    #[serde(rename = "video_id")]
    pub id: String,
    /// Transcoded outputs keyed by format.
    pub outputs: HashMap<String, Value>,
    /// Player information.
    pub player: Player,
    /// Metadata of the uploaded source file.
    pub input: HashMap<String, Value>,
    /// Processing state: `created`, `uploading`, `uploaded`...
    pub state: String,
    /// User supplied metadata.
    pub userdata: HashMap<String, Value>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
    /// Upload parameters, loaded by [`crate::VideoApi::upload_info`].
    #[serde(skip)]
    pub upload_info: Option<UploadParameters>,
}

impl Video {
    /// Upload parameters are loaded and carry an object key.
    pub fn has_upload_info(&self) -> bool {
        self.upload_info
            .as_ref()
            .is_some_and(UploadParameters::is_valid)
    }
}

impl Display for Video {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.id.is_empty() {
            return writeln!(f, "Empty Video");
        }

        writeln!(f, "Video {}", self.id)?;
        writeln!(f, "\tState : {}", self.state)?;
        if self.state == "uploaded" {
            writeln!(f, "\tEmbed URL : {}", self.player.embed_url)?;
            writeln!(f, "\tThumbnail : {}", self.player.thumbnail_url)?;
        }
        Ok(())
    }
}
