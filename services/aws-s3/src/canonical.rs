use std::collections::BTreeMap;
use std::fmt::Write;

use http::Method;
use log::debug;
use percent_encoding::utf8_percent_encode;
use upsign_core::hash::hex_sha256;
use upsign_core::Result;

use crate::constants::{
    AWS_QUERY_ENCODE_SET, AWS_URI_ENCODE_SET, UNSIGNED_PAYLOAD, X_AMZ_CONTENT_SHA_256,
};

/// CanonicalRequest is the normalized form of a request that gets hashed
/// into the string to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    /// The canonical request string.
    pub canonical: String,
    /// Lower-cased names of the signed headers, sorted.
    pub signed_headers: Vec<String>,
}

impl CanonicalRequest {
    /// Hex encoded SHA-256 of the canonical request.
    pub fn hash(&self) -> String {
        hex_sha256(self.canonical.as_bytes())
    }

    /// Signed header names joined with `;`.
    pub fn signed_headers_string(&self) -> String {
        self.signed_headers.join(";")
    }
}

/// Build the SigV4 canonical request.
///
/// Every entry of `headers` is signed. Callers filter the set beforehand.
///
/// ```text
/// <method>
/// <canonical path>
/// <canonical query>
/// <name>:<value>     one line per header
///
/// <signed headers>
/// <payload hash>
/// ```
pub fn build_canonical(
    method: &Method,
    path: &str,
    raw_query: &str,
    headers: &BTreeMap<String, String>,
) -> Result<CanonicalRequest> {
    let headers = canonicalize_headers(headers);

    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);
    writeln!(f, "{method}")?;
    writeln!(f, "{}", canonicalize_path(path))?;
    writeln!(f, "{}", canonicalize_query(raw_query))?;
    for (name, value) in headers.iter() {
        writeln!(f, "{name}:{value}")?;
    }
    writeln!(f)?;

    let signed_headers: Vec<String> = headers.keys().cloned().collect();
    writeln!(f, "{}", signed_headers.join(";"))?;
    write!(
        f,
        "{}",
        headers
            .get(X_AMZ_CONTENT_SHA_256)
            .map(String::as_str)
            .unwrap_or(UNSIGNED_PAYLOAD)
    )?;
    debug!("calculated canonical request: {f}");

    Ok(CanonicalRequest {
        canonical: f,
        signed_headers,
    })
}

/// Lower-case names and trim values. Names that collide after lower-casing
/// are joined with `,`.
fn canonicalize_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut canonical: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = normalize_header_value(value);
        canonical
            .entry(name.to_ascii_lowercase())
            .and_modify(|v| {
                v.push(',');
                v.push_str(&value);
            })
            .or_insert(value);
    }
    canonical
}

/// Trim the value and collapse sequential spaces into one.
fn normalize_header_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Encode `path` with the AWS URI encode set.
///
/// Valid percent-escapes are kept as they are, so `%2F` inside a segment
/// stays distinct from `/`. A `%` not starting an escape becomes `%25`.
fn canonicalize_path(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len() + 1);
    if !path.starts_with('/') {
        encoded.push('/');
    }

    let mut rest = path;
    while let Some(idx) = rest.find('%') {
        encoded.extend(utf8_percent_encode(&rest[..idx], &AWS_URI_ENCODE_SET));
        let escape = rest[idx..].as_bytes();
        if escape.len() >= 3 && escape[1].is_ascii_hexdigit() && escape[2].is_ascii_hexdigit() {
            encoded.push_str(&rest[idx..idx + 3]);
            rest = &rest[idx + 3..];
        } else {
            encoded.push_str("%25");
            rest = &rest[idx + 1..];
        }
    }
    encoded.extend(utf8_percent_encode(rest, &AWS_URI_ENCODE_SET));
    encoded
}

fn canonicalize_query(raw_query: &str) -> String {
    if raw_query.is_empty() {
        return String::new();
    }

    let mut query: Vec<(String, String)> = form_urlencoded::parse(raw_query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    query.sort();

    query
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_build_canonical() -> anyhow::Result<()> {
        let req = build_canonical(
            &Method::PUT,
            "/videos/a b.mp4",
            "uploads&c=d&a=b",
            &headers(&[
                ("Host", "bucket.s3.amazonaws.com"),
                ("Test-Header", "  val   two "),
                ("X-Amz-Date", "20220301T081234Z"),
            ]),
        )?;

        let expected = "PUT\n\
            /videos/a%20b.mp4\n\
            a=b&c=d&uploads=\n\
            host:bucket.s3.amazonaws.com\n\
            test-header:val two\n\
            x-amz-date:20220301T081234Z\n\
            \n\
            host;test-header;x-amz-date\n\
            UNSIGNED-PAYLOAD";
        assert_eq!(req.canonical, expected);
        assert_eq!(req.signed_headers_string(), "host;test-header;x-amz-date");
        assert_eq!(req.hash().len(), 64);
        Ok(())
    }

    #[test]
    fn test_payload_hash_from_header() -> anyhow::Result<()> {
        let empty = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        let req = build_canonical(
            &Method::GET,
            "/",
            "",
            &headers(&[("X-Amz-Content-Sha256", empty)]),
        )?;

        assert!(req.canonical.ends_with(&format!("\n{empty}")));
        Ok(())
    }

    #[test]
    fn test_colliding_header_names() -> anyhow::Result<()> {
        let req = build_canonical(
            &Method::GET,
            "/",
            "",
            &headers(&[("X-Amz-Meta-Tag", "one"), ("x-amz-meta-tag", "two")]),
        )?;

        assert_eq!(req.signed_headers, vec!["x-amz-meta-tag".to_string()]);
        assert!(req.canonical.contains("x-amz-meta-tag:one,two\n"));
        Ok(())
    }

    #[test]
    fn test_deterministic() -> anyhow::Result<()> {
        let hs = headers(&[("Host", "h"), ("Content-Type", "video/mp4")]);
        let a = build_canonical(&Method::POST, "upload", "x=1", &hs)?;
        let b = build_canonical(&Method::POST, "upload", "x=1", &hs)?;
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
        Ok(())
    }

    #[test_case("", "/"; "empty")]
    #[test_case("url", "/url"; "relative")]
    #[test_case("/a/b", "/a/b"; "plain")]
    #[test_case("/a%20b", "/a%20b"; "already encoded")]
    #[test_case("/héllo", "/h%C3%A9llo"; "unicode")]
    #[test_case("/a+b=c", "/a%2Bb%3Dc"; "reserved")]
    #[test_case("/videos/a%2Fb.mp4", "/videos/a%2Fb.mp4"; "encoded slash kept")]
    #[test_case("/a%2fb", "/a%2fb"; "lower case escape kept")]
    #[test_case("/100%", "/100%25"; "trailing percent")]
    #[test_case("/a%zzb c", "/a%25zzb%20c"; "invalid escape")]
    fn test_canonicalize_path(input: &str, expected: &str) {
        assert_eq!(canonicalize_path(input), expected);
    }

    #[test_case("", ""; "empty")]
    #[test_case("a=b&c=d", "a=b&c=d"; "sorted")]
    #[test_case("c=d&a=b", "a=b&c=d"; "unsorted")]
    #[test_case("list-type=2&delimiter=/&encoding-type=url", "delimiter=%2F&encoding-type=url&list-type=2"; "escaped")]
    #[test_case("a=b&a=a", "a=a&a=b"; "repeated keys sorted by value")]
    fn test_canonicalize_query(input: &str, expected: &str) {
        assert_eq!(canonicalize_query(input), expected);
    }
}
