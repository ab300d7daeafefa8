//! End-to-end product scraping against a mock card API

use crate::common::{
    image_path, mount_card, mount_image, test_config, two_size_card, ARTICLE, DETAIL_PATH,
};
use pricelens::config::{HttpConfig, RateLimitConfig, WildberriesConfig};
use pricelens::product::{Marketplace, ProductIdentifier};
use pricelens::scraper::{build_http_client, ScrapeError, Scraper, WildberriesScraper};
use pricelens::storage::{ProductRepository, SqliteStorage};
use pricelens::{Coordinator, PricelensError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MISSING_ARTICLE: u64 = 12345678;

async fn mount_detail_status(server: &MockServer, article: u64, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(DETAIL_PATH))
        .and(query_param("nm", article.to_string()))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_product_with_image_on_third_shard() {
    let server = MockServer::start().await;
    mount_card(&server, ARTICLE, two_size_card(ARTICLE)).await;
    mount_image(&server, 3, ARTICLE).await;

    let config = test_config(&server, "unused.db", 99);
    let coordinator = Coordinator::new(&config).unwrap();

    let variants = coordinator
        .fetch_product(&ProductIdentifier::Article(ARTICLE))
        .await
        .unwrap();

    assert_eq!(variants.len(), 2);
    let expected_image = format!("{}{}", server.uri(), image_path(3, ARTICLE));

    let small = &variants[0];
    assert_eq!(small.marketplace, Marketplace::Wildberries);
    assert_eq!(small.internal_id, ARTICLE);
    assert_eq!(small.name, "Running sneakers");
    assert_eq!(small.brand, "Runner");
    assert_eq!(small.brand_id, Some(77));
    assert_eq!(small.size, "S");
    assert_eq!(small.price_basic, 1000.0);
    assert_eq!(small.price, 900.0);
    assert_eq!(small.quantity, 3);
    assert_eq!(small.pics, 6);
    assert_eq!(small.image_url, expected_image);

    let medium = &variants[1];
    assert_eq!(medium.size, "M");
    assert_eq!(medium.price_basic, 0.0);
    assert_eq!(medium.price, 0.0);
    assert_eq!(medium.quantity, 0);
    assert_eq!(medium.image_url, expected_image);
}

#[tokio::test]
async fn test_catalog_url_identifier() {
    let server = MockServer::start().await;
    mount_card(&server, ARTICLE, two_size_card(ARTICLE)).await;
    mount_image(&server, 1, ARTICLE).await;

    let config = test_config(&server, "unused.db", 5);
    let coordinator = Coordinator::new(&config).unwrap();
    let identifier: ProductIdentifier = format!(
        "https://www.wildberries.ru/catalog/{}/detail.aspx?size=1",
        ARTICLE
    )
    .parse()
    .unwrap();

    let variants = coordinator.fetch_product(&identifier).await.unwrap();
    assert_eq!(variants.len(), 2);
    assert!(variants[0].image_url.ends_with(&image_path(1, ARTICLE)));
}

#[tokio::test]
async fn test_missing_image_leaves_url_empty() {
    let server = MockServer::start().await;
    mount_card(&server, ARTICLE, two_size_card(ARTICLE)).await;

    let config = test_config(&server, "unused.db", 3);
    let coordinator = Coordinator::new(&config).unwrap();

    let variants = coordinator
        .fetch_product(&ProductIdentifier::Article(ARTICLE))
        .await
        .unwrap();
    assert!(variants.iter().all(|v| v.image_url.is_empty()));
}

#[tokio::test]
async fn test_non_success_status_carries_snippet() {
    let server = MockServer::start().await;
    mount_detail_status(&server, MISSING_ARTICLE, 404, "Not Found\nno such card\n").await;

    let config = test_config(&server, "unused.db", 3);
    let coordinator = Coordinator::new(&config).unwrap();

    let result = coordinator
        .fetch_product(&ProductIdentifier::Article(MISSING_ARTICLE))
        .await;

    match result {
        Err(PricelensError::Scrape(ScrapeError::UnexpectedStatus {
            marketplace,
            article,
            status,
            snippet,
        })) => {
            assert_eq!(marketplace, Marketplace::Wildberries);
            assert_eq!(article, MISSING_ARTICLE);
            assert_eq!(status, 404);
            assert_eq!(snippet, "Not Found no such card");
        }
        other => panic!("expected an unexpected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_long_error_body_is_truncated() {
    let server = MockServer::start().await;
    let body = "e".repeat(1000);
    mount_detail_status(&server, MISSING_ARTICLE, 500, &body).await;

    let config = test_config(&server, "unused.db", 3);
    let coordinator = Coordinator::new(&config).unwrap();

    let result = coordinator
        .fetch_product(&ProductIdentifier::Article(MISSING_ARTICLE))
        .await;

    match result {
        Err(PricelensError::Scrape(ScrapeError::UnexpectedStatus { snippet, .. })) => {
            assert_eq!(snippet.len(), 203);
            assert!(snippet.ends_with("..."));
        }
        other => panic!("expected an unexpected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_truncated_error_body_keeps_status() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Promises 100 bytes of body, sends 7, then hangs up
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&chunk[..n]),
            }
        }
        let _ = socket
            .write_all(b"HTTP/1.1 502 Bad Gateway\r\ncontent-length: 100\r\n\r\npartial")
            .await;
    });

    let wildberries = WildberriesConfig {
        detail_endpoint: format!("http://{}{}?nm=", addr, DETAIL_PATH),
        ..WildberriesConfig::default()
    };
    let scraper = WildberriesScraper::new(&wildberries, &RateLimitConfig::default());
    let client = build_http_client(&HttpConfig::default()).unwrap();

    let result = scraper
        .fetch_product(&client, &ProductIdentifier::Article(MISSING_ARTICLE))
        .await;

    match result {
        Err(ScrapeError::UnexpectedStatus { status, snippet, .. }) => {
            assert_eq!(status, 502);
            assert_eq!(snippet, "");
        }
        other => panic!("expected an unexpected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_payloads() {
    let server = MockServer::start().await;
    mount_card(&server, ARTICLE, serde_json::json!({ "products": [] })).await;
    mount_detail_status(&server, MISSING_ARTICLE, 200, "<html>maintenance</html>").await;

    let config = test_config(&server, "unused.db", 3);
    let coordinator = Coordinator::new(&config).unwrap();

    for article in [ARTICLE, MISSING_ARTICLE] {
        let result = coordinator
            .fetch_product(&ProductIdentifier::Article(article))
            .await;
        assert!(
            matches!(
                result,
                Err(PricelensError::Scrape(ScrapeError::MalformedResponse { .. }))
            ),
            "article {} gave {:?}",
            article,
            result
        );
    }
}

#[tokio::test]
async fn test_throttled_response_charges_penalty() {
    let server = MockServer::start().await;
    mount_detail_status(&server, ARTICLE, 409, "slow down").await;

    let config = test_config(&server, "unused.db", 3);
    let scraper = WildberriesScraper::new(&config.wildberries, &config.rate_limit);
    let client = build_http_client(&config.http).unwrap();

    let result = scraper
        .fetch_product(&client, &ProductIdentifier::Article(ARTICLE))
        .await;

    assert!(matches!(
        result,
        Err(ScrapeError::UnexpectedStatus { status: 409, .. })
    ));
    // One reserved unit plus four of penalty
    assert_eq!(scraper.limiter().snapshot().await.period_total, 5);
}

#[tokio::test]
async fn test_unreachable_cdn_does_not_fail_product() {
    let server = MockServer::start().await;
    mount_card(&server, ARTICLE, two_size_card(ARTICLE)).await;

    let config = test_config(&server, "unused.db", 3);
    let wildberries = WildberriesConfig {
        image_template: "http://127.0.0.1:1/basket-{shard}/{article}/1.{ext}".to_string(),
        ..config.wildberries.clone()
    };
    let scraper = WildberriesScraper::new(&wildberries, &config.rate_limit);
    let client = build_http_client(&HttpConfig::default()).unwrap();

    let variants = scraper
        .fetch_product(&client, &ProductIdentifier::Article(ARTICLE))
        .await
        .unwrap();

    assert_eq!(variants.len(), 2);
    assert!(variants.iter().all(|v| v.image_url.is_empty()));
}

#[tokio::test]
async fn test_scrape_and_save_retries_and_skips_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DETAIL_PATH))
        .and(query_param("nm", ARTICLE.to_string()))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_card(&server, ARTICLE, two_size_card(ARTICLE)).await;
    mount_image(&server, 1, ARTICLE).await;
    mount_detail_status(&server, MISSING_ARTICLE, 404, "Not Found").await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pricelens.db");
    let config = test_config(&server, &db_path.to_string_lossy(), 3);
    let coordinator = Coordinator::new(&config).unwrap();
    let mut storage = SqliteStorage::new(&db_path).unwrap();

    let identifiers = vec![
        ProductIdentifier::Article(ARTICLE),
        ProductIdentifier::Article(MISSING_ARTICLE),
    ];
    let report = coordinator.scrape_and_save(&identifiers, &mut storage).await;

    assert_eq!(report.requested, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.saved_ids.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, MISSING_ARTICLE.to_string());
    assert_eq!(report.products.len(), 1);
    let sizes: Vec<&str> = report.products[0].iter().map(|v| v.size.as_str()).collect();
    assert_eq!(sizes, vec!["S", "M"]);

    assert_eq!(storage.count_products().unwrap(), 2);
    assert_eq!(storage.count_prices().unwrap(), 1);

    let small = storage
        .get_product_by_internal_id(ARTICLE, Marketplace::Wildberries, Some("S"))
        .unwrap()
        .unwrap();
    assert_eq!(small.quantity, 3);
    assert!(small.image_url.ends_with(&image_path(1, ARTICLE)));
    assert_eq!(storage.get_latest_price(small.id).unwrap(), Some(900.0));

    let medium = storage
        .get_product_by_internal_id(ARTICLE, Marketplace::Wildberries, Some("M"))
        .unwrap()
        .unwrap();
    assert_eq!(storage.get_latest_price(medium.id).unwrap(), None);
}

#[tokio::test]
async fn test_rescrape_appends_price_history() {
    let server = MockServer::start().await;
    mount_card(&server, ARTICLE, two_size_card(ARTICLE)).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pricelens.db");
    let config = test_config(&server, &db_path.to_string_lossy(), 1);
    let coordinator = Coordinator::new(&config).unwrap();
    let mut storage = SqliteStorage::new(&db_path).unwrap();

    let identifiers = vec![ProductIdentifier::Article(ARTICLE)];
    let first = coordinator.scrape_and_save(&identifiers, &mut storage).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = coordinator.scrape_and_save(&identifiers, &mut storage).await;

    assert_eq!(first.saved_ids, second.saved_ids);
    assert_eq!(storage.count_products().unwrap(), 2);
    assert_eq!(storage.count_prices().unwrap(), 2);
    assert_eq!(storage.get_price_history(first.saved_ids[0], None).unwrap().len(), 2);
}
