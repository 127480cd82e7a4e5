//! AWS S3 upload signer
//!
//! Resolves upload destinations from S3 action URLs, builds the multipart
//! POST carrying the file, and signs requests with
//! [Signature Version 4](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html).

mod constants;
pub use constants::DEFAULT_REGION;

mod action_url;
pub use action_url::parse_action_url;
pub use action_url::ActionUrl;

mod canonical;
pub use canonical::build_canonical;
pub use canonical::CanonicalRequest;

mod signing_key;
pub use signing_key::generate_signing_key;

mod credential;
pub use credential::Credential;

mod v4;
pub use v4::SignedResult;
pub use v4::V4Request;

mod upload;
pub use upload::S3UploadTarget;
pub use upload::UploadParameters;
