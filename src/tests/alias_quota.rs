use axum::http::StatusCode;
use serde_json::Map;
use serde_json::Value;

use crate::tests::helper;

#[tokio::test]
async fn test_quota_blocks_creation_at_the_limit() {
    let mut app = helper::setup_test_app().await;

    // the test config allows three creations per day
    helper::create_alias(&mut app, "one").await;
    helper::create_alias(&mut app, "two").await;
    helper::create_alias(&mut app, "three").await;

    let mut payload = Map::new();
    payload.insert("project".to_string(), Value::String("four".to_string()));

    let (status_code, _, error) = helper::maybe_create_alias(&mut app, &payload).await;

    assert_eq!(StatusCode::TOO_MANY_REQUESTS, status_code);
    assert_eq!(Some("Daily limit reached: 3 of 3".to_string()), error);

    // the rejected creation left no record and no counter bump
    let (aliases, daily_usage) = helper::list_aliases(&mut app).await;
    assert_eq!(3, aliases.len());
    assert_eq!(3, daily_usage.used);
    assert_eq!(0, daily_usage.remaining);
    assert_eq!(100, daily_usage.percentage);
}

#[tokio::test]
async fn test_quota_is_not_refunded_by_deletion() {
    let mut app = helper::setup_test_app().await;

    let alias = helper::create_alias(&mut app, "one").await;
    helper::create_alias(&mut app, "two").await;
    helper::create_alias(&mut app, "three").await;

    assert_eq!(
        StatusCode::NO_CONTENT,
        helper::delete_alias(&mut app, &alias.id).await
    );

    // the counter tracks creations, not live records
    let mut payload = Map::new();
    payload.insert("project".to_string(), Value::String("four".to_string()));

    let (status_code, _, _) = helper::maybe_create_alias(&mut app, &payload).await;
    assert_eq!(StatusCode::TOO_MANY_REQUESTS, status_code);
}

#[tokio::test]
async fn test_quota_percentage_tracks_usage() {
    let mut app = helper::setup_test_app().await;

    let (_, daily_usage) = helper::list_aliases(&mut app).await;
    assert_eq!(0, daily_usage.used);
    assert_eq!(0, daily_usage.percentage);

    helper::create_alias(&mut app, "one").await;

    let (_, daily_usage) = helper::list_aliases(&mut app).await;
    assert_eq!(1, daily_usage.used);
    assert_eq!(33, daily_usage.percentage);
}
