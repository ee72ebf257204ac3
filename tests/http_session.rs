//! End-to-end: a feed session driving the HTTP service against a mock server.

use listing_sync::config::Config;
use listing_sync::listing::{FilterQuery, ListingId};
use listing_sync::remote::HttpListingService;
use listing_sync::sync::FeedSession;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page_body(page: u32, ids: &[i64]) -> Value {
    json!({
        "data": ids.iter().map(|id| json!({"id": id, "title": format!("Flat {id}")})).collect::<Vec<_>>(),
        "pagination": {
            "currentPage": page, "pageSize": 3, "totalCount": 5,
            "totalPages": 2, "hasNextPage": page < 2
        }
    })
}

async fn server_with_feed() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/listings"))
        .and(query_param("page", "1"))
        .and(query_param("pageSize", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, &[1, 2, 3])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/listings"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(2, &[3, 4, 5])))
        .mount(&server)
        .await;
    server
}

fn session_for(server: &MockServer) -> FeedSession<HttpListingService> {
    let config = Config {
        api_base_url: server.uri(),
        page_size: 3,
        user_id: "u-9".to_string(),
        ..Config::default()
    };
    let service = HttpListingService::from_config(&config).unwrap();
    FeedSession::new(Arc::new(service), config.page_size, config.user_id.clone())
}

#[tokio::test]
async fn test_pages_through_http_feed() {
    let server = server_with_feed().await;
    let mut session = session_for(&server);

    session.mount();
    assert!(session.settle().await.is_empty());
    session.load_next_page();
    assert!(session.settle().await.is_empty());

    let view = session.view();
    let ids: Vec<String> = view.items.iter().map(|i| i.id.to_string()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    assert!(view.is_exhausted);
    assert_eq!(view.items[3].title(), Some("Flat 4"));
}

#[tokio::test]
async fn test_search_and_favorite_over_http() {
    let server = server_with_feed().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_json(json!({"location": "Moda"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [{"id": "m-1"}, {"id": "m-2"}],
            "metadata": {"totalCount": 2, "hasNextPage": false}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/favorites/toggle"))
        .and(body_json(json!({"userId": "u-9", "targetId": "m-1", "actionType": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isSuccess": true,
            "result": {"id": "fav-1", "targetId": "m-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session.mount();
    session.settle().await;

    session.apply_filter(FilterQuery::new().location("Moda")).unwrap();
    assert!(session.settle().await.is_empty());
    assert!(session.view().filter_active);
    assert_eq!(session.view().total_count, 2);

    session.toggle_favorite("m-1");
    assert!(session.settle().await.is_empty());
    assert!(session.engine().is_favorite(&ListingId::from("m-1")));
    assert_eq!(session.engine().favorites()[0].record_id, "fav-1");
}

#[tokio::test]
async fn test_rejected_toggle_rolls_back() {
    let server = server_with_feed().await;
    Mock::given(method("POST"))
        .and(path("/favorites/toggle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isSuccess": false,
            "result": {"message": "listing archived", "code": "E_ARCHIVED"}
        })))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session.toggle_favorite(2_i64);
    let errors = session.settle().await;

    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("listing archived"));
    assert!(session.engine().favorites().is_empty());
}
