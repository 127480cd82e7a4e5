use std::collections::BTreeMap;
use std::time::SystemTime;

use aws_credential_types::Credentials;
use aws_sigv4::http_request::PayloadChecksumKind;
use aws_sigv4::http_request::PercentEncodingMode;
use aws_sigv4::http_request::SignableBody;
use aws_sigv4::http_request::SignableRequest;
use aws_sigv4::http_request::SigningSettings;
use aws_sigv4::sign::v4::SigningParams;
use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use upsign_aws_s3::V4Request;

criterion_group!(benches, bench);
criterion_main!(benches);

pub fn bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("aws_s3");

    group.bench_function("upsign", |b| {
        let req = V4Request {
            region: "test".to_string(),
            method: http::Method::POST,
            path: "/".to_string(),
            headers: BTreeMap::from([
                ("Host".to_string(), "bucket.s3.amazonaws.com".to_string()),
                (
                    "Content-Type".to_string(),
                    "multipart/form-data; boundary=abc".to_string(),
                ),
            ]),
            ..Default::default()
        };

        b.iter(|| {
            req.sign("access_key_id", "secret_access_key")
                .expect("signing must succeed")
        })
    });

    group.bench_function("aws_sigv4", |b| {
        let mut ss = SigningSettings::default();
        ss.percent_encoding_mode = PercentEncodingMode::Single;
        ss.payload_checksum_kind = PayloadChecksumKind::XAmzSha256;

        let credentials = Credentials::new(
            "access_key_id".to_string(),
            "secret_access_key".to_string(),
            None,
            None,
            "test",
        )
        .into();

        let sp = SigningParams::builder()
            .identity(&credentials)
            .region("test")
            .name("s3")
            .time(SystemTime::now())
            .settings(ss)
            .build()
            .expect("signing params must be valid")
            .into();

        let headers = [("content-type", "multipart/form-data; boundary=abc")];

        b.iter(|| {
            let _ = aws_sigv4::http_request::sign(
                SignableRequest::new(
                    "POST",
                    "https://bucket.s3.amazonaws.com/",
                    headers.into_iter(),
                    SignableBody::UnsignedPayload,
                )
                .expect("request must be signable"),
                &sp,
            )
            .expect("signing must succeed");
        })
    });

    group.finish();
}
