//! Image discovery against a mock basket CDN

use crate::common::{image_path, mount_image, ARTICLE};
use pricelens::config::{HttpConfig, RateLimitConfig};
use pricelens::limiter::RateLimiter;
use pricelens::scraper::{build_http_client, ImageLookup, ImageProbe, ScrapeError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn probe(server: &MockServer, max_shards: u8) -> ImageProbe {
    ImageProbe::new(
        format!(
            "{}/basket-{{shard}}/vol{{vol}}/part{{part}}/{{article}}/images/big/1.{{ext}}",
            server.uri()
        ),
        "webp",
        max_shards,
    )
}

fn limiter() -> RateLimiter {
    RateLimiter::new(&RateLimitConfig {
        limit: 1000,
        burst: 200,
        ..RateLimitConfig::default()
    })
}

#[tokio::test]
async fn test_probe_stops_at_first_image() {
    let server = MockServer::start().await;

    for shard in 1..=5 {
        Mock::given(method("GET"))
            .and(path(image_path(shard, ARTICLE)))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<html>not here</html>", "text/html"),
            )
            .expect(1)
            .mount(&server)
            .await;
    }
    mount_image(&server, 6, ARTICLE).await;
    Mock::given(method("GET"))
        .and(path(image_path(7, ARTICLE)))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8; 4], "image/webp"))
        .expect(0)
        .mount(&server)
        .await;

    let client = build_http_client(&HttpConfig::default()).unwrap();
    let limiter = limiter();
    let lookup = probe(&server, 99)
        .discover(&client, &limiter, ARTICLE)
        .await
        .unwrap();

    assert_eq!(
        lookup,
        ImageLookup::Found(format!("{}{}", server.uri(), image_path(6, ARTICLE)))
    );
    assert_eq!(limiter.snapshot().await.period_total, 6);
}

#[tokio::test]
async fn test_probe_exhaustion_is_not_an_error() {
    let server = MockServer::start().await;

    let client = build_http_client(&HttpConfig::default()).unwrap();
    let limiter = limiter();
    let lookup = probe(&server, 4)
        .discover(&client, &limiter, ARTICLE)
        .await
        .unwrap();

    assert_eq!(lookup, ImageLookup::NotFound);
    assert_eq!(limiter.snapshot().await.period_events, 4);
}

#[tokio::test]
async fn test_probe_transport_error_is_reported() {
    let client = build_http_client(&HttpConfig::default()).unwrap();
    let limiter = limiter();
    let unreachable = ImageProbe::new(
        "http://127.0.0.1:1/basket-{shard}/{article}/1.{ext}",
        "webp",
        10,
    );

    let result = unreachable.discover(&client, &limiter, ARTICLE).await;

    match result {
        Err(ScrapeError::ProbeTransport { shard, url, .. }) => {
            assert_eq!(shard, 1);
            assert_eq!(url, format!("http://127.0.0.1:1/basket-01/{}/1.webp", ARTICLE));
        }
        other => panic!("expected a probe transport error, got {:?}", other),
    }
    // Admitted once, never reported back
    assert_eq!(limiter.snapshot().await.period_total, 1);
}

#[tokio::test]
async fn test_throttled_shard_is_charged_before_moving_on() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(image_path(1, ARTICLE)))
        .respond_with(ResponseTemplate::new(409).set_body_string("too many requests"))
        .expect(1)
        .mount(&server)
        .await;
    mount_image(&server, 2, ARTICLE).await;

    let client = build_http_client(&HttpConfig::default()).unwrap();
    let limiter = limiter();
    let lookup = probe(&server, 10)
        .discover(&client, &limiter, ARTICLE)
        .await
        .unwrap();

    assert_eq!(
        lookup,
        ImageLookup::Found(format!("{}{}", server.uri(), image_path(2, ARTICLE)))
    );
    // Two admissions of weight 1, plus 4 extra for the 409
    let snapshot = limiter.snapshot().await;
    assert_eq!(snapshot.period_total, 2 + 4);
    assert_eq!(snapshot.period_events, 3);
}
