mod common;

use axum::http::StatusCode;
use common::{assert_redirect, body_text, spawn_app};
use yatube_core::test_utils::{insert_post_at, insert_user, minutes};

#[tokio::test]
async fn follow_feed_shows_followed_authors_only() {
    let app = spawn_app().await;
    let leo = insert_user(app.db(), "leo").await;
    let kate = insert_user(app.db(), "kate").await;
    insert_post_at(app.db(), kate.id, "Kate writes", None, minutes(0)).await;
    insert_post_at(app.db(), leo.id, "Leo writes", None, minutes(1)).await;
    let cookie = app.login(&leo).await;

    let response = app.get("/kate/follow", Some(&cookie)).await;
    assert_redirect(&response, "/kate/");

    let html = body_text(app.get("/follow/", Some(&cookie)).await).await;
    assert!(html.contains("Kate writes"));
    assert!(!html.contains("Leo writes"));

    let response = app.get("/kate/unfollow", Some(&cookie)).await;
    assert_redirect(&response, "/kate/");

    let html = body_text(app.get("/follow/", Some(&cookie)).await).await;
    assert!(!html.contains("Kate writes"));
}

#[tokio::test]
async fn following_twice_keeps_one_edge() {
    let app = spawn_app().await;
    let leo = insert_user(app.db(), "leo").await;
    let kate = insert_user(app.db(), "kate").await;
    let cookie = app.login(&leo).await;

    app.get("/kate/follow", Some(&cookie)).await;
    app.get("/kate/follow", Some(&cookie)).await;

    let follows = &app.state.core.follows;
    assert_eq!(follows.followers_count(kate.id).await.unwrap(), 1);

    let html = body_text(app.get("/kate/", Some(&cookie)).await).await;
    assert!(html.contains("Подписчиков: 1"));
    assert!(html.contains("Отписаться"));
}

#[tokio::test]
async fn self_follow_is_ignored() {
    let app = spawn_app().await;
    let leo = insert_user(app.db(), "leo").await;
    let cookie = app.login(&leo).await;

    let response = app.get("/leo/follow", Some(&cookie)).await;
    assert_redirect(&response, "/leo/");

    let follows = &app.state.core.follows;
    assert!(!follows.is_following(leo.id, leo.id).await.unwrap());

    // no follow button on your own profile
    let html = body_text(app.get("/leo/", Some(&cookie)).await).await;
    assert!(!html.contains("Подписаться"));
}

#[tokio::test]
async fn follow_actions_require_login() {
    let app = spawn_app().await;
    insert_user(app.db(), "kate").await;

    let response = app.get("/kate/follow", None).await;
    assert_redirect(&response, "/auth/login/?next=%2Fkate%2Ffollow");

    let response = app.get("/kate/unfollow", None).await;
    assert_redirect(&response, "/auth/login/?next=%2Fkate%2Funfollow");
}

#[tokio::test]
async fn following_unknown_user_is_not_found() {
    let app = spawn_app().await;
    let leo = insert_user(app.db(), "leo").await;
    let cookie = app.login(&leo).await;

    let response = app.get("/nobody/follow", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stale_session_is_anonymous() {
    let app = spawn_app().await;

    let response = app.get("/follow/", Some("sessionid=forged")).await;
    assert_redirect(&response, "/auth/login/?next=%2Ffollow%2F");
}
