//! HTML views.
//!
//! Every piece of user-provided text goes through [`escape`] before it is
//! interpolated.

use yatube_core::{
    entity::prelude::{GroupModel, PostModel, UserModel},
    ids::{GroupId, PostId},
    service::{
        comments::CommentView,
        feed::{FeedItem, FeedPage},
    },
    validation::{FieldErrors, ValidationError},
};

use crate::{auth::LOGIN_PATH, captcha::Challenge};

const SITE_NAME: &str = "Yatube";

pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn paragraphs(text: &str) -> String {
    escape(text).replace('\n', "<br>\n")
}

pub fn profile_url(username: &str) -> String {
    format!("/{}/", urlencoding::encode(username))
}

pub fn post_url(username: &str, post_id: PostId) -> String {
    format!("/{}/{post_id}/", urlencoding::encode(username))
}

fn layout(title: &str, viewer: Option<&UserModel>, content: &str) -> String {
    let account = match viewer {
        Some(user) => format!(
            r#"<a href="/new/">Новая запись</a> <a href="/follow/">Избранные авторы</a> <a href="{}">{}</a>"#,
            profile_url(&user.username),
            escape(&user.username)
        ),
        None => format!(r#"<a href="{LOGIN_PATH}">Войти</a>"#),
    };

    format!(
        r#"<!doctype html>
<html lang="ru">
<head><meta charset="utf-8"><title>{title} | {SITE_NAME}</title></head>
<body>
<nav><a href="/">{SITE_NAME}</a> {account}</nav>
<main>
{content}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn error_list(errors: &[ValidationError]) -> String {
    if errors.is_empty() {
        return String::new();
    }

    let items: String = errors
        .iter()
        .map(|error| format!("<li>{}</li>", escape(&error.to_string())))
        .collect();
    format!(r#"<ul class="errorlist">{items}</ul>"#)
}

fn post_card(
    post: &PostModel,
    author: &UserModel,
    group: Option<&GroupModel>,
    comments: u64,
) -> String {
    let group = group
        .map(|group| {
            format!(
                r#" <a class="group" href="/group/{}/">#{}</a>"#,
                escape(&group.slug),
                escape(&group.title)
            )
        })
        .unwrap_or_default();
    let image = post
        .image
        .as_deref()
        .map(|image| format!(r#"<img src="/media/{}" alt="">"#, escape(image)))
        .unwrap_or_default();

    format!(
        r#"<article class="post">
<header><a href="{profile}">{author}</a> <time>{date}</time>{group}</header>
{image}
<p>{text}</p>
<footer><a href="{url}">Комментарии: {comments}</a></footer>
</article>
"#,
        profile = profile_url(&author.username),
        author = escape(&author.username),
        date = post.created_at.format("%d.%m.%Y %H:%M"),
        text = paragraphs(&post.text),
        url = post_url(&author.username, post.id),
    )
}

fn paginator(page: &FeedPage) -> String {
    if page.total_pages <= 1 {
        return String::new();
    }

    let mut links = Vec::new();
    if page.has_previous() {
        links.push(format!(r#"<a href="?page={}">&laquo;</a>"#, page.number - 1));
    }
    for number in 1..=page.total_pages {
        if number == page.number {
            links.push(format!("<span>{number}</span>"));
        } else {
            links.push(format!(r#"<a href="?page={number}">{number}</a>"#));
        }
    }
    if page.has_next() {
        links.push(format!(r#"<a href="?page={}">&raquo;</a>"#, page.number + 1));
    }

    format!(r#"<nav class="pagination">{}</nav>"#, links.join(" "))
}

/// Post list plus pagination, without the surrounding layout. This is the
/// unit kept in the page cache.
pub fn feed_fragment(page: &FeedPage) -> String {
    let posts: String = if page.is_empty() {
        "<p>Записей пока нет.</p>\n".to_string()
    } else {
        page.items
            .iter()
            .map(|FeedItem { post, author, group, comment_count }| {
                post_card(post, author, group.as_ref(), *comment_count)
            })
            .collect()
    };

    format!("{posts}{}", paginator(page))
}

pub fn index_page(viewer: Option<&UserModel>, fragment: &str) -> String {
    layout(
        "Последние обновления на сайте",
        viewer,
        &format!("<h1>Последние обновления на сайте</h1>\n{fragment}"),
    )
}

pub fn follow_page(viewer: Option<&UserModel>, fragment: &str) -> String {
    layout(
        "Избранные авторы",
        viewer,
        &format!("<h1>Записи избранных авторов</h1>\n{fragment}"),
    )
}

pub fn group_page(viewer: Option<&UserModel>, group: &GroupModel, fragment: &str) -> String {
    let content = format!(
        "<h1>{}</h1>\n<p>{}</p>\n{fragment}",
        escape(&group.title),
        paragraphs(&group.description)
    );
    layout(&group.title, viewer, &content)
}

pub struct ProfileView<'a> {
    pub author: &'a UserModel,
    pub posts_count: u64,
    pub followers: u64,
    pub following: u64,
    /// `None` when the viewer cannot follow this author.
    pub viewer_follows: Option<bool>,
    pub page: &'a FeedPage,
}

pub fn profile_page(viewer: Option<&UserModel>, profile: &ProfileView<'_>) -> String {
    let username = urlencoding::encode(&profile.author.username);
    let follow_button = match profile.viewer_follows {
        Some(true) => format!(r#"<a class="button" href="/{username}/unfollow">Отписаться</a>"#),
        Some(false) => format!(r#"<a class="button" href="/{username}/follow">Подписаться</a>"#),
        None => String::new(),
    };

    let content = format!(
        r#"<section class="profile">
<h1>{name}</h1>
<p>Записей: {posts}</p>
<p>Подписчиков: {followers} Подписан: {following}</p>
{follow_button}
</section>
{fragment}"#,
        name = escape(&profile.author.username),
        posts = profile.posts_count,
        followers = profile.followers,
        following = profile.following,
        fragment = feed_fragment(profile.page),
    );
    layout(&profile.author.username, viewer, &content)
}

/// State of the comment form under a post.
pub struct CommentForm<'a> {
    pub text: &'a str,
    pub errors: &'a FieldErrors,
    pub challenge: Option<&'a Challenge>,
}

pub struct PostView<'a> {
    pub post: &'a PostModel,
    pub author: &'a UserModel,
    pub group: Option<&'a GroupModel>,
    pub posts_count: u64,
    pub comments: &'a [CommentView],
}

pub fn post_page(
    viewer: Option<&UserModel>,
    view: &PostView<'_>,
    form: &CommentForm<'_>,
) -> String {
    let url = post_url(&view.author.username, view.post.id);

    let owner_links = if viewer.is_some_and(|user| user.id == view.post.author_id) {
        format!(r#"<p><a href="{url}edit">Редактировать</a> <a href="{url}confirm">Удалить</a></p>"#)
    } else {
        String::new()
    };

    let comments: String = view
        .comments
        .iter()
        .map(|entry| {
            format!(
                r#"<div class="comment"><a href="{}">{}</a> <time>{}</time><p>{}</p></div>
"#,
                profile_url(&entry.author_username),
                escape(&entry.author_username),
                entry.comment.created_at.format("%d.%m.%Y %H:%M"),
                paragraphs(&entry.comment.text)
            )
        })
        .collect();

    let comment_form = if viewer.is_some() {
        let captcha = form
            .challenge
            .map(|challenge| {
                format!(
                    r#"<input type="hidden" name="captcha_key" value="{key}">
<label>{question} <input name="captcha_answer"></label>
{errors}"#,
                    key = escape(&challenge.key),
                    question = escape(&challenge.question),
                    errors = error_list(form.errors.get("captcha")),
                )
            })
            .unwrap_or_default();

        format!(
            r#"<form method="post" action="{url}comment">
<textarea name="text">{text}</textarea>
{text_errors}
{captcha}
<button type="submit">Отправить</button>
</form>"#,
            text = escape(form.text),
            text_errors = error_list(form.errors.get("text")),
        )
    } else {
        String::new()
    };

    let content = format!(
        "{card}<p>Записей автора: {count}</p>\n{owner_links}\n<section class=\"comments\">\n{comments}</section>\n{comment_form}",
        card = post_card(view.post, view.author, view.group, view.comments.len() as u64),
        count = view.posts_count,
    );
    layout(&view.author.username, viewer, &content)
}

/// Values for the post form, on first display or after a failed submit.
pub struct PostForm<'a> {
    pub heading: &'a str,
    pub action: &'a str,
    pub text: &'a str,
    pub group_id: Option<GroupId>,
    pub groups: &'a [GroupModel],
    pub errors: &'a FieldErrors,
}

pub fn post_form_page(viewer: Option<&UserModel>, form: &PostForm<'_>) -> String {
    let options: String = form
        .groups
        .iter()
        .map(|group| {
            let selected = if form.group_id == Some(group.id) { " selected" } else { "" };
            format!(
                r#"<option value="{}"{selected}>{}</option>"#,
                group.id,
                escape(&group.title)
            )
        })
        .collect();

    let content = format!(
        r#"<h1>{heading}</h1>
<form method="post" action="{action}" enctype="multipart/form-data">
<label>Текст <textarea name="text">{text}</textarea></label>
{text_errors}
<label>Группа <select name="group"><option value="">---------</option>{options}</select></label>
{group_errors}
<label>Изображение <input type="file" name="image" accept="image/*"></label>
{image_errors}
<button type="submit">Сохранить</button>
</form>"#,
        heading = escape(form.heading),
        action = escape(form.action),
        text = escape(form.text),
        text_errors = error_list(form.errors.get("text")),
        group_errors = error_list(form.errors.get("group")),
        image_errors = error_list(form.errors.get("image")),
    );
    layout(form.heading, viewer, &content)
}

pub fn confirm_page(viewer: Option<&UserModel>, username: &str, post_id: PostId) -> String {
    let url = post_url(username, post_id);
    let content = format!(
        r#"<h1>Удалить запись?</h1>
<form method="post" action="{url}delete">
<button type="submit">Удалить</button> <a href="{url}">Отмена</a>
</form>"#
    );
    layout("Удаление записи", viewer, &content)
}

pub fn not_found_page() -> String {
    layout(
        "Страница не найдена",
        None,
        "<h1>Ошибка 404</h1>\n<p>Страница не найдена.</p>",
    )
}

pub fn server_error_page() -> String {
    layout(
        "Ошибка сервера",
        None,
        "<h1>Ошибка 500</h1>\n<p>Что-то пошло не так. Попробуйте позже.</p>",
    )
}
