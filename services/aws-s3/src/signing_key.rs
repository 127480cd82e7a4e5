use upsign_core::hash::hmac_sha256;

/// Derive the SigV4 signing key.
///
/// ```text
/// kDate    = HMAC("AWS4" + secret, date_stamp)
/// kRegion  = HMAC(kDate, region)
/// kService = HMAC(kRegion, service)
/// kSigning = HMAC(kService, "aws4_request")
/// ```
///
/// `date_stamp` is formatted as `YYYYMMDD`. Malformed inputs still produce a
/// key, the server rejects signatures made with it.
pub fn generate_signing_key(secret: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), date_stamp.as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), "aws4_request".as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Example from <https://docs.aws.amazon.com/general/latest/gr/signature-v4-examples.html>
    #[test]
    fn test_generate_signing_key() {
        let key = generate_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );

        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_empty_region_still_derives() {
        let key = generate_signing_key("secret", "20220301", "", "s3");
        assert_eq!(key.len(), 32);
        assert_ne!(key, generate_signing_key("secret", "20220301", "us-east-1", "s3"));
    }
}
