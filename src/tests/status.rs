use crate::tests::helper;

#[tokio::test]
async fn test_status_of_a_fresh_deployment() {
    let mut app = helper::setup_test_app().await;

    let status = helper::get_status(&mut app).await;

    assert_eq!("inbox@outlook.com", status["primary"].as_str().unwrap());

    let daily_usage = helper::parse_daily_usage(&status["dailyUsage"]);
    assert_eq!(0, daily_usage.used);
    assert_eq!(3, daily_usage.limit);
    assert_eq!(3, daily_usage.remaining);

    assert!(status["todayAliases"].as_array().unwrap().is_empty());
    assert!(status["usedAddresses"].as_array().unwrap().is_empty());
    assert!(status["expiredAliases"].as_array().unwrap().is_empty());

    let stats = &status["stats"];
    assert_eq!(0, stats["totalAliases"].as_i64().unwrap());
    assert_eq!(0, stats["daysUsed"].as_i64().unwrap());
    assert_eq!(0, stats["distinctUsers"].as_i64().unwrap());
    assert_eq!(0, stats["usedCount"].as_i64().unwrap());
}

#[tokio::test]
async fn test_status_tracks_creations_and_uses() {
    let mut app = helper::setup_test_app().await;

    let first = helper::create_alias(&mut app, "first").await;
    helper::create_alias(&mut app, "second").await;
    helper::use_alias(&mut app, &first.id, "webshop").await;

    let status = helper::get_status(&mut app).await;

    let daily_usage = helper::parse_daily_usage(&status["dailyUsage"]);
    assert_eq!(2, daily_usage.used);
    assert_eq!(1, daily_usage.remaining);

    let today_aliases = status["todayAliases"].as_array().unwrap();
    assert_eq!(2, today_aliases.len());

    // newest creation first
    assert_eq!(
        "second@outlook.com",
        today_aliases[0]["address"].as_str().unwrap()
    );

    let stats = &status["stats"];
    assert_eq!(2, stats["totalAliases"].as_i64().unwrap());
    assert_eq!(1, stats["daysUsed"].as_i64().unwrap());
    assert_eq!(1, stats["distinctUsers"].as_i64().unwrap());
    assert_eq!(1, stats["usedCount"].as_i64().unwrap());

    // nothing has expired, the default validity lies in the future
    assert!(status["expiredAliases"].as_array().unwrap().is_empty());
}
