use axum::body::Body;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use tower::Service;
use uuid::Uuid;

use crate::tests::helper;

#[tokio::test]
async fn test_alias_delete() {
    let mut app = helper::setup_test_app().await;

    let alias = helper::create_alias(&mut app, "proj").await;
    let other = helper::create_alias(&mut app, "other").await;

    assert_eq!(
        StatusCode::NO_CONTENT,
        helper::delete_alias(&mut app, &alias.id).await
    );

    // only the targeted alias is gone
    let (aliases, _) = helper::list_aliases(&mut app).await;
    assert_eq!(1, aliases.len());
    assert_eq!(other.id, aliases[0].id);

    // a second delete is a miss
    assert_eq!(
        StatusCode::NOT_FOUND,
        helper::delete_alias(&mut app, &alias.id).await
    );
}

#[tokio::test]
async fn test_alias_delete_unknown_id() {
    let mut app = helper::setup_test_app().await;

    helper::create_alias(&mut app, "proj").await;

    assert_eq!(
        StatusCode::NOT_FOUND,
        helper::delete_alias(&mut app, &Uuid::new_v4()).await
    );

    // unrelated aliases are untouched
    let (aliases, _) = helper::list_aliases(&mut app).await;
    assert_eq!(1, aliases.len());
}

#[tokio::test]
async fn test_alias_delete_invalid_id() {
    let mut app = helper::setup_test_app().await;

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/aliases/not-a-uuid")
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();

    assert_eq!(StatusCode::BAD_REQUEST, response.status());
}
