//! Shared fixtures for the integration tests

use pricelens::config::{parse_config, Config};
use pricelens::scraper::derive_route;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ARTICLE: u64 = 288392979;

pub const DETAIL_PATH: &str = "/cards/v4/detail";

/// Builds a validated config pointing every endpoint at `server`
pub fn test_config(server: &MockServer, database_path: &str, max_shards: u8) -> Config {
    let toml = format!(
        r#"
[scraper]
max-concurrent-fetches = 2
max-attempts = 3
retry-backoff-ms = 10

[rate-limit]
period = 60.0
limit = 1000
interval = 1.0
burst = 200

[wildberries]
detail-endpoint = "{uri}{detail}?appType=1&curr=rub&dest=-1257786&nm="
image-template = "{uri}/basket-{{shard}}/vol{{vol}}/part{{part}}/{{article}}/images/big/1.{{ext}}"
max-shards = {max_shards}

[output]
database-path = "{database_path}"
"#,
        uri = server.uri(),
        detail = DETAIL_PATH,
        max_shards = max_shards,
        database_path = database_path,
    );
    parse_config(&toml).expect("test config should be valid")
}

/// Image path served by `shard` for `article`
pub fn image_path(shard: u8, article: u64) -> String {
    let route = derive_route(article);
    format!(
        "/basket-{:02}/vol{}/part{}/{}/images/big/1.webp",
        shard, route.vol, route.part, article
    )
}

/// Card with a priced size `S` and a size `M` without an offer
pub fn two_size_card(article: u64) -> Value {
    json!({
        "products": [{
            "id": article,
            "name": "Running sneakers",
            "brand": "Runner",
            "brandId": 77,
            "pics": 6,
            "sizes": [
                {
                    "name": "S",
                    "origName": "42",
                    "price": { "basic": 100000, "product": 90000 },
                    "stocks": [{ "wh": 507, "qty": 2 }, { "wh": 117986, "qty": 1 }]
                },
                { "name": "M", "origName": "44", "stocks": [] }
            ]
        }]
    })
}

pub async fn mount_card(server: &MockServer, article: u64, card: Value) {
    Mock::given(method("GET"))
        .and(path(DETAIL_PATH))
        .and(query_param("nm", article.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(card))
        .mount(server)
        .await;
}

pub async fn mount_image(server: &MockServer, shard: u8, article: u64) {
    Mock::given(method("GET"))
        .and(path(image_path(shard, article)))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 16], "image/webp"))
        .mount(server)
        .await;
}
