mod common;

use common::{assert_ok, assert_redirect, body_text, spawn_app, spawn_app_with};
use yatube_core::test_utils::{insert_post_at, insert_user, minutes};

/// Pulls `(key, answer)` out of the rendered comment form.
fn solve_captcha(html: &str) -> (String, String) {
    let key = html
        .split(r#"name="captcha_key" value=""#)
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .expect("captcha key in form")
        .to_string();

    let question = html
        .split("<label>")
        .find(|chunk| chunk.contains("= ?"))
        .expect("captcha question in form");
    let sum: u32 = question
        .split(" = ?")
        .next()
        .unwrap()
        .split(" + ")
        .map(|n| n.trim().parse::<u32>().unwrap())
        .sum();

    (key, sum.to_string())
}

#[tokio::test]
async fn comment_is_shown_under_post() {
    let app = spawn_app().await;
    let leo = insert_user(app.db(), "leo").await;
    let kate = insert_user(app.db(), "kate").await;
    let post = insert_post_at(app.db(), leo.id, "Discuss this", None, minutes(0)).await;
    let cookie = app.login(&kate).await;

    let detail = format!("/leo/{}/", post.id);
    let response = app
        .post_form(&format!("{detail}comment"), Some(&cookie), "text=Nice+post")
        .await;
    assert_redirect(&response, &detail);

    let html = body_text(app.get(&detail, None).await).await;
    assert!(html.contains("Nice post"));
    assert!(html.contains("kate"));

    let html = body_text(app.get("/", None).await).await;
    assert!(html.contains("Комментарии: 1"));
}

#[tokio::test]
async fn blank_comment_redisplays_post() {
    let app = spawn_app().await;
    let leo = insert_user(app.db(), "leo").await;
    let post = insert_post_at(app.db(), leo.id, "Discuss this", None, minutes(0)).await;
    let cookie = app.login(&leo).await;

    let response = app
        .post_form(&format!("/leo/{}/comment", post.id), Some(&cookie), "text=+")
        .await;

    assert_ok(&response);
    let html = body_text(response).await;
    assert!(html.contains("Discuss this"));
    assert!(html.contains("Обязательное поле."));
}

#[tokio::test]
async fn comment_requires_login() {
    let app = spawn_app().await;
    let leo = insert_user(app.db(), "leo").await;
    let post = insert_post_at(app.db(), leo.id, "Discuss this", None, minutes(0)).await;

    let uri = format!("/leo/{}/comment", post.id);
    let response = app.post_form(&uri, None, "text=hi").await;

    assert_redirect(
        &response,
        &format!("/auth/login/?next={}", urlencoding::encode(&uri)),
    );
}

#[tokio::test]
async fn captcha_gates_comments_when_enabled() {
    let app = spawn_app_with(|config| config.captcha_enabled = true).await;
    let leo = insert_user(app.db(), "leo").await;
    let post = insert_post_at(app.db(), leo.id, "Discuss this", None, minutes(0)).await;
    let cookie = app.login(&leo).await;
    let detail = format!("/leo/{}/", post.id);
    let comment = format!("{detail}comment");

    // wrong answer
    let html = body_text(app.get(&detail, Some(&cookie)).await).await;
    let (key, _) = solve_captcha(&html);
    let response = app
        .post_form(
            &comment,
            Some(&cookie),
            &format!("text=Guessing&captcha_key={key}&captcha_answer=100"),
        )
        .await;
    assert_ok(&response);
    assert!(body_text(response)
        .await
        .contains("Неверный ответ на проверочный вопрос."));

    // right answer on a fresh challenge
    let html = body_text(app.get(&detail, Some(&cookie)).await).await;
    let (key, answer) = solve_captcha(&html);
    let response = app
        .post_form(
            &comment,
            Some(&cookie),
            &format!("text=Solved&captcha_key={key}&captcha_answer={answer}"),
        )
        .await;
    assert_redirect(&response, &detail);

    let comments = app.state.core.comments.list_for_post(post.id).await.unwrap();
    let texts: Vec<_> = comments.iter().map(|c| c.comment.text.as_str()).collect();
    assert_eq!(texts, ["Solved"]);
}
