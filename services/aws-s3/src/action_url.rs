use http::Uri;
use log::debug;
use upsign_core::{Error, Result};

use crate::constants::DEFAULT_REGION;

/// Destination resolved from an S3 action URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionUrl {
    /// Full host of the action URL, `bucket.s3.amazonaws.com`.
    pub host: String,
    /// Region encoded in the host.
    pub region: String,
    /// Bucket encoded in the host.
    pub bucket: String,
}

/// Parse a virtual-host style S3 action URL.
///
/// Two host patterns are accepted:
///
/// - `<bucket>.s3.amazonaws.com`: region is `us-east-1`
/// - `<bucket>.s3-<region>.amazonaws.com`: region is `<region>`
///
/// The `us-east-1` fallback mirrors the legacy global endpoint. Buckets
/// created in other regions behind that endpoint are not detected.
pub fn parse_action_url(action: &str) -> Result<ActionUrl> {
    let uri = match action {
        "" => Uri::default(),
        v => v.parse::<Uri>().map_err(|e| {
            Error::invalid_action_url(format!("Invalid action URL: {v}")).with_source(e)
        })?,
    };
    let host = uri.host().unwrap_or_default();

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() != 4 || labels.iter().any(|v| v.is_empty()) {
        return Err(Error::invalid_action_url(
            "Invalid action URL. Not exactly 4 period-separated words in host.",
        ));
    }

    let region = match labels[1] {
        "s3" => DEFAULT_REGION,
        v => match v.strip_prefix("s3-") {
            Some(region) if !region.is_empty() => region,
            _ => {
                return Err(Error::invalid_action_url(format!(
                    "Invalid action URL. Host {host} is not an S3 endpoint."
                )))
            }
        },
    };
    debug!("resolved action url {action} to region {region}, bucket {}", labels[0]);

    Ok(ActionUrl {
        host: host.to_string(),
        region: region.to_string(),
        bucket: labels[0].to_string(),
    })
}
