use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use upsign_core::{Context, DirectUploadTarget, UploadTarget};
use upsign_http_send_reqwest::ReqwestHttpSend;

/// Post a local file to an upload endpoint that needs no authorization.
///
/// ```shell
/// cargo run --example direct_upload -- http://127.0.0.1:9000/upload video.mp4
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (Some(url), Some(path)) = (args.next(), args.next()) else {
        eprintln!("usage: direct_upload <url> <file>");
        std::process::exit(2);
    };

    let client = Client::builder()
        .timeout(Duration::from_secs(300))
        .user_agent("upsign-example/0.1")
        .build()?;
    let ctx = Context::new().with_http_send(ReqwestHttpSend::new(client));

    let target = DirectUploadTarget::new(url);
    let req = target.create_upload_request(&PathBuf::from(path))?;
    println!("uploading {} bytes to {}", req.body().len(), target.url());

    let resp = ctx.http_send_as_string(req).await?;
    println!("response status: {}", resp.status());
    println!("{}", resp.body());
    Ok(())
}
