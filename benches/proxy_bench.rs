//! Benchmarks for the request-handling hot path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use offline_proxy::config::{NotificationConfig, RoutingConfig};
use offline_proxy::net::Request;
use offline_proxy::notify::{build_notification, PushPayload};
use offline_proxy::proxy::classify::classify;
use url::Url;

fn bench_classification(c: &mut Criterion) {
    let routing = RoutingConfig::default();
    let app = Url::parse("https://app.test").unwrap();
    let api = Url::parse("https://api.test").unwrap();

    let requests: Vec<Request> = [
        "https://app.test/assets/index-abc123.js",
        "https://api.test/rest/v1/staff?select=*",
        "https://app.test/export/report.csv",
        "https://cdn.elsewhere.com/lib.js",
        "https://app.test/fonts/inter.woff2",
    ]
    .iter()
    .map(|url| Request::get(Url::parse(url).unwrap()))
    .collect();

    c.bench_function("classify_mixed_requests", |b| {
        b.iter(|| {
            for request in &requests {
                black_box(classify(&routing, &app, &api, black_box(request)));
            }
        })
    });
}

fn bench_notification_build(c: &mut Criterion) {
    let config = NotificationConfig::default();
    let payload: PushPayload = serde_json::from_str(
        r#"{"title":"Nhắc nhở","body":"TS đến hạn","tag":"due",
            "notificationId":"n-42","data":{"url":"/assets/42","assetCode":"TS-0042"}}"#,
    )
    .unwrap();

    c.bench_function("build_notification", |b| {
        b.iter(|| {
            black_box(build_notification(
                black_box(payload.clone()),
                &config,
                1_700_000_000_000,
            ))
        })
    });
}

criterion_group!(benches, bench_classification, bench_notification_build);
criterion_main!(benches);
