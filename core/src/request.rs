use std::collections::BTreeMap;
use std::str::FromStr;

use http::header::HOST;
use http::uri::{Authority, PathAndQuery, Scheme};
use http::{HeaderName, HeaderValue, Method, Uri};

use crate::{Error, Result};

/// SigningRequest is the minimal request description signers work on.
///
/// It only carries what a signature covers: method, path, raw query and
/// headers. Header names are kept in canonical MIME casing (`Test-Header`),
/// so looking a header up never depends on how the caller spelled it.
///
/// Use [`SigningRequest::build`] and [`SigningRequest::into_request`] to
/// convert from and to `http` requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP path, as sent on the wire.
    pub path: String,
    /// HTTP query without the leading `?`.
    pub raw_query: String,
    /// HTTP headers keyed by canonical name.
    pub headers: BTreeMap<String, String>,
}

impl SigningRequest {
    /// Build a signing request from http::request::Parts.
    ///
    /// The `Host` header is filled from the uri authority when absent, without
    /// the port if it's the scheme's default one. Repeated headers are joined
    /// with `,`.
    pub fn build(parts: &http::request::Parts) -> Result<Self> {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in parts.headers.iter() {
            let value = value.to_str()?;
            headers
                .entry(canonical_header_key(name.as_str()))
                .and_modify(|v| {
                    v.push(',');
                    v.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        if let Some(authority) = parts.uri.authority() {
            headers
                .entry(canonical_header_key(HOST.as_str()))
                .or_insert_with(|| host_header(parts.uri.scheme(), authority));
        }

        Ok(SigningRequest {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            raw_query: parts.uri.query().unwrap_or_default().to_string(),
            headers,
        })
    }

    /// Get header value by name, the name is matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&canonical_header_key(name))
            .map(String::as_str)
    }

    /// Insert a header, replacing the previous value if any.
    pub fn insert_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(canonical_header_key(name), value.into());
    }

    /// Remove a header and return its value.
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(&canonical_header_key(name))
    }

    /// Materialize an `http::Request` carrying `body`.
    ///
    /// The uri authority is taken from the `Host` header. Without one, the
    /// request uri is in origin form (`/path?query`).
    pub fn into_request<B>(self, scheme: Scheme, body: B) -> Result<http::Request<B>> {
        let paq = {
            let mut s = String::with_capacity(self.path.len() + self.raw_query.len() + 2);
            if !self.path.starts_with('/') {
                s.push('/');
            }
            s.push_str(&self.path);
            if !self.raw_query.is_empty() {
                s.push('?');
                s.push_str(&self.raw_query);
            }
            PathAndQuery::from_str(&s)?
        };

        let uri = match self.header(HOST.as_str()) {
            Some(host) => Uri::builder()
                .scheme(scheme)
                .authority(host)
                .path_and_query(paq)
                .build()?,
            None => Uri::from(paq),
        };

        let mut req = http::Request::new(body);
        *req.method_mut() = self.method;
        *req.uri_mut() = uri;

        for (name, value) in self.headers {
            let name = HeaderName::from_str(&name)?;
            let value = HeaderValue::from_str(&value).map_err(|e| {
                Error::request_invalid(format!("invalid value of header {name}")).with_source(e)
            })?;
            req.headers_mut().insert(name, value);
        }

        Ok(req)
    }
}

/// Value of the `Host` header clients send for `authority`.
fn host_header(scheme: Option<&Scheme>, authority: &Authority) -> String {
    let default_port = match scheme.map(Scheme::as_str) {
        Some("https") => Some(443),
        Some("http") => Some(80),
        _ => None,
    };

    match authority.port_u16() {
        Some(port) if Some(port) != default_port => format!("{}:{port}", authority.host()),
        _ => authority.host().to_string(),
    }
}

/// Returns the canonical format of the header name.
///
/// The first letter and any letter following a hyphen are upper case, the
/// rest are lower case: `x-amz-date` becomes `X-Amz-Date`. Names containing
/// a space or other invalid bytes are returned unchanged.
pub fn canonical_header_key(name: &str) -> String {
    let valid = name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));
    if !valid {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let c = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            c
        })
        .collect()
}
