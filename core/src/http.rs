use crate::Result;
use bytes::Bytes;
use std::fmt::Debug;

/// HttpSend is used to send http requests built by upsign.
///
/// The video API client talks to its service and the object store through
/// this trait only, so callers decide which client runs the requests and
/// tests can record them instead.
#[async_trait::async_trait]
pub trait HttpSend: Debug + Send + Sync + 'static {
    /// Send http request and return the response.
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>>;
}

/// NoopHttpSend is the default sender, it refuses every request.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NoopHttpSend;

#[async_trait::async_trait]
impl HttpSend for NoopHttpSend {
    async fn http_send(&self, _req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        Err(crate::Error::unexpected(
            "HTTP sending not supported: no HTTP client configured",
        ))
    }
}
