use std::path::Path;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use upsign_core::{read_upload_file, Result, UploadTarget};

/// An upload target that `PUT`s the raw file to a presigned url.
///
/// Unlike form uploads, the body is the file itself and the authorization
/// travels in the url query.
#[derive(Debug)]
struct PresignedPutTarget {
    url: String,
    content_type: String,
}

impl UploadTarget for PresignedPutTarget {
    fn region(&self) -> Option<&str> {
        None
    }

    fn bucket(&self) -> Option<&str> {
        None
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn create_upload_request(&self, path: &Path) -> Result<http::Request<Bytes>> {
        let content = read_upload_file(path)?;

        let req = http::Request::put(&self.url)
            .header(CONTENT_TYPE, &self.content_type)
            .header(CONTENT_LENGTH, content.len().to_string())
            .body(content)?;
        Ok(req)
    }
}

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Cargo.toml".to_string());

    let target = PresignedPutTarget {
        url: "https://storage.example.com/videos/a.mp4?X-Amz-Signature=demo".to_string(),
        content_type: "video/mp4".to_string(),
    };

    let req = target.create_upload_request(Path::new(&path))?;
    println!("{} {}", req.method(), req.uri());
    for (name, value) in req.headers() {
        println!("  {name}: {value:?}");
    }
    println!("  body: {} bytes", req.body().len());
    Ok(())
}
