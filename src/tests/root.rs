use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Duration;
use chrono::Utc;
use serde_json::Map;
use serde_json::Value;
use uuid::Uuid;

use crate::clock::Clock;
use crate::clock::ManualClock;
use crate::tests::helper;

#[tokio::test]
async fn test_root() {
    let mut app = helper::setup_test_app();

    let (status_code, location, _) = helper::root(&mut app, "").await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(None, location);
}

#[tokio::test]
async fn test_root_with_valid_utf8() {
    let mut app = helper::setup_test_app();

    let (status_code, location, _) = helper::root(&mut app, "%20").await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(None, location);
}

#[tokio::test]
async fn test_root_with_invalid_utf8() {
    let mut app = helper::setup_test_app();

    let (status_code, location, body) = helper::root(&mut app, "%c0").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(None, location);
    assert!(body.contains("URL contains invalid UTF-8 characters"));
}

#[tokio::test]
async fn test_root_with_unknown_code() {
    let mut app = helper::setup_test_app();

    let (status_code, location, _) = helper::root(&mut app, "unknown").await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(None, location);
}

#[tokio::test]
async fn test_root_redirects() {
    let mut app = helper::setup_test_app();

    let link = helper::create_link(
        &mut app,
        None,
        "https://www.example.com/some/page?with=query",
        None,
    )
    .await;

    let (status_code, location, _) = helper::root(&mut app, &link.code).await;
    assert_eq!(StatusCode::FOUND, status_code);
    assert_eq!(
        Some("https://www.example.com/some/page?with=query".to_string()),
        location
    );

    // trailing slashes are ignored
    let (status_code, location, _) = helper::root(&mut app, &format!("{}/", link.code)).await;
    assert_eq!(StatusCode::FOUND, status_code);
    assert!(location.is_some());
}

#[tokio::test]
async fn test_root_counts_clicks() {
    let mut app = helper::setup_test_app();

    let link =
        helper::create_link(&mut app, None, "https://www.example.com/", Some("clicks")).await;

    for _ in 0..3 {
        let (status_code, _, _) = helper::root(&mut app, &link.code).await;
        assert_eq!(StatusCode::FOUND, status_code);
    }

    // unknown codes are not counted anywhere
    let (status_code, _, _) = helper::root(&mut app, "clicks2").await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);

    let (status_code, stats, _) = helper::link_stats(&mut app, None, &link.code).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(3, stats.unwrap().click_count);
}

#[tokio::test]
async fn test_root_with_deleted_link() {
    let mut app = helper::setup_test_app();

    let owner_id = Uuid::new_v4();
    let access_token = helper::access_token(&owner_id);

    let link = helper::create_link(
        &mut app,
        Some(&access_token),
        "https://www.example.com/",
        None,
    )
    .await;

    let (status_code, _) =
        helper::maybe_delete_link(&mut app, Some(&access_token), &link.code).await;
    assert_eq!(StatusCode::NO_CONTENT, status_code);

    let (status_code, location, _) = helper::root(&mut app, &link.code).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(None, location);
}

#[tokio::test]
async fn test_root_with_expired_link() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let mut app = helper::setup_test_app_with_clock(clock.clone());

    let mut payload = Map::new();
    payload.insert(
        "originalUrl".to_string(),
        Value::String("https://www.example.com/".to_string()),
    );
    payload.insert(
        "customCode".to_string(),
        Value::String("expiring".to_string()),
    );
    payload.insert(
        "expiresAt".to_string(),
        Value::String((clock.now() + Duration::hours(1)).to_rfc3339()),
    );

    let (status_code, _, _) = helper::maybe_create_link_with_payload(&mut app, None, payload).await;
    assert_eq!(StatusCode::CREATED, status_code);

    let (status_code, location, _) = helper::root(&mut app, "expiring").await;
    assert_eq!(StatusCode::FOUND, status_code);
    assert_eq!(Some("https://www.example.com/".to_string()), location);

    clock.advance(Duration::hours(2));

    let (status_code, location, _) = helper::root(&mut app, "expiring").await;
    assert_eq!(StatusCode::FOUND, status_code);
    assert_eq!(Some(helper::EXPIRED_REDIRECT.to_string()), location);

    // only the redirect before the expiration counts
    let (status_code, stats, _) = helper::link_stats(&mut app, None, "expiring").await;
    assert_eq!(StatusCode::OK, status_code);
    let stats = stats.unwrap();
    assert_eq!(1, stats.click_count);
    assert!(stats.is_expired);
}
