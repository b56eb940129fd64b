use axum::http::StatusCode;
use uuid::Uuid;

use crate::tests::helper;

#[tokio::test]
async fn test_alias_use_transition() {
    let mut app = helper::setup_test_app().await;

    let alias = helper::create_alias(&mut app, "proj").await;

    let used = helper::use_alias(&mut app, &alias.id, "webshop signup").await;

    assert!(used.used);
    assert_eq!("used", used.status);
    assert_eq!(Some("webshop signup".to_string()), used.usage_location);
    assert!(used.used_at.is_some());

    // the address landed in the used-address registry
    let status = helper::get_status(&mut app).await;
    let used_addresses = status["usedAddresses"].as_array().unwrap();
    assert_eq!(1, used_addresses.len());
    assert_eq!("proj@outlook.com", used_addresses[0].as_str().unwrap());
}

#[tokio::test]
async fn test_alias_use_is_one_way() {
    let mut app = helper::setup_test_app().await;

    let alias = helper::create_alias(&mut app, "proj").await;
    let used = helper::use_alias(&mut app, &alias.id, "first location").await;

    let (status_code, _, error) =
        helper::maybe_use_alias(&mut app, &alias.id, Some("second location")).await;

    assert_eq!(StatusCode::CONFLICT, status_code);
    assert_eq!(Some("Alias already used".to_string()), error);

    // the first transition is untouched
    let (aliases, _) = helper::list_aliases(&mut app).await;
    assert_eq!(Some("first location".to_string()), aliases[0].usage_location);
    assert_eq!(used.used_at, aliases[0].used_at);
}

#[tokio::test]
async fn test_alias_use_requires_usage_location() {
    let mut app = helper::setup_test_app().await;

    let alias = helper::create_alias(&mut app, "proj").await;

    let (status_code, _, error) = helper::maybe_use_alias(&mut app, &alias.id, None).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Usage location is required".to_string()), error);

    let (status_code, _, _) = helper::maybe_use_alias(&mut app, &alias.id, Some("   ")).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);

    // still pending
    let (aliases, _) = helper::list_aliases(&mut app).await;
    assert!(!aliases[0].used);
}

#[tokio::test]
async fn test_alias_use_unknown_id() {
    let mut app = helper::setup_test_app().await;

    let (status_code, _, error) =
        helper::maybe_use_alias(&mut app, &Uuid::new_v4(), Some("somewhere")).await;

    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(Some("Alias not found".to_string()), error);
}

#[tokio::test]
async fn test_used_address_is_not_reissued() {
    let mut app = helper::setup_test_app().await;

    let alias = helper::create_alias(&mut app, "proj").await;
    assert_eq!("proj@outlook.com", alias.address);

    helper::use_alias(&mut app, &alias.id, "webshop").await;

    // generation probes past the registry entry
    let alias = helper::create_alias(&mut app, "proj").await;
    assert_eq!("proj1@outlook.com", alias.address);
}
