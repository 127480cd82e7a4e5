use std::fmt::{Debug, Formatter};

use upsign_core::utils::Redact;
use upsign_core::Context;

/// Env name of the video API key.
pub const UPSIGN_API_KEY: &str = "UPSIGN_API_KEY";
/// Env name of the video API base url.
pub const UPSIGN_API_URL: &str = "UPSIGN_API_URL";

/// Base url used when none is configured.
pub const DEFAULT_API_URL: &str = "https://api.synq.fm";

/// Config for the video API client.
#[derive(Clone, Default)]
pub struct Config {
    /// API key sent with every call.
    pub api_key: Option<String>,
    /// Base url of the API, without the `/v1` suffix.
    pub api_url: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &Redact::from(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Config {
    /// Fill unset fields from `UPSIGN_API_KEY` and `UPSIGN_API_URL`.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        let envs = ctx.env_vars();

        if self.api_key.is_none() {
            self.api_key = envs.get(UPSIGN_API_KEY).cloned();
        }
        if self.api_url.is_none() {
            self.api_url = envs.get(UPSIGN_API_URL).cloned();
        }
        self
    }

    /// Base url of the API, `https://api.synq.fm` if unset.
    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .map(|v| v.trim_end_matches('/'))
            .unwrap_or(DEFAULT_API_URL)
    }
}
