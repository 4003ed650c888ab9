mod common;

use std::collections::HashSet;

use axum::http::StatusCode;
use common::spawn;
use layerzero::{
    comments::store::create_comment,
    likes::store::toggle_like,
    posts::store::{create_post, get_posts, FeedCursor, FeedQuery, FeedScope, NewPost},
};
use serde_json::{json, Value};
use uuid::Uuid;

fn post_by(author: &str, content: &str) -> NewPost {
    NewPost {
        content: content.to_owned(),
        author_auth_id: author.to_owned(),
        ..Default::default()
    }
}

fn ids(page: &Value) -> Vec<String> {
    page["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_owned())
        .collect()
}

#[tokio::test]
async fn creating_a_post_requires_a_session() {
    let app = spawn().await;

    let (status, body) = app.post("/api/posts", None, json!({ "content": "hello" })).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
    assert_eq!(app.count("SELECT COUNT(*) FROM posts").await, 0);
}

#[tokio::test]
async fn blank_content_is_rejected_and_nothing_is_stored() {
    let app = spawn().await;
    let cookie = app.login("google:1").await;

    let (status, _) = app.post("/api/posts", Some(&cookie), json!({ "content": "   \n" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.count("SELECT COUNT(*) FROM posts").await, 0);
}

#[tokio::test]
async fn created_post_comes_back_with_its_author() {
    let app = spawn().await;
    let cookie = app.login("google:1").await;

    let (status, created) = app
        .post("/api/posts", Some(&cookie), json!({ "content": "  first post  ", "imageUrl": "https://cdn.test/uploads/a.png" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["success"], true);
    let post_id = created["postId"].as_str().unwrap();

    let (status, body) = app.get(&format!("/api/posts/{post_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let post = &body["post"];
    assert_eq!(post["content"], "first post");
    assert_eq!(post["authorAuthId"], "google:1");
    assert_eq!(post["likesCount"], 0);
    assert_eq!(post["commentsCount"], 0);
    assert_eq!(post["author"]["authId"], "google:1");
}

#[tokio::test]
async fn unknown_and_malformed_post_ids() {
    let app = spawn().await;

    let (status, _) = app.get(&format!("/api/posts/{}", Uuid::now_v7()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/posts/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn feed_pages_neither_overlap_nor_skip() {
    let app = spawn().await;
    let cookie = app.login("google:1").await;

    let mut created = HashSet::new();
    for i in 0..7 {
        let (_, body) = app.post("/api/posts", Some(&cookie), json!({ "content": format!("post {i}") })).await;
        created.insert(body["postId"].as_str().unwrap().to_owned());
    }

    let mut seen = Vec::new();
    let mut uri = "/api/posts?limit=3".to_owned();
    loop {
        let (status, page) = app.get(&uri, None).await;
        assert_eq!(status, StatusCode::OK);
        seen.extend(ids(&page));

        if page["isDone"] == true {
            assert!(page["nextCursor"].is_null());
            break;
        }
        let cursor = page["nextCursor"].as_str().unwrap();
        uri = format!("/api/posts?limit=3&cursor={cursor}");
    }

    assert_eq!(seen.len(), 7);
    assert_eq!(seen.iter().cloned().collect::<HashSet<_>>(), created);
}

#[tokio::test]
async fn feed_is_newest_first_with_id_tie_break() {
    let app = spawn().await;
    app.login("google:1").await;

    for _ in 0..4 {
        create_post(&app.db, post_by("google:1", "same moment")).await.unwrap();
    }
    // pin every post to one timestamp so only the id orders them
    sqlx::query("UPDATE posts SET created_at=1000")
        .execute(app.db.pool())
        .await
        .unwrap();

    let first = get_posts(&app.db, FeedQuery { limit: 2, cursor: None, scope: FeedScope::Global })
        .await
        .unwrap();
    assert!(!first.is_done);
    let cursor: FeedCursor = first.next_cursor.as_deref().unwrap().parse().unwrap();
    let second = get_posts(&app.db, FeedQuery { limit: 2, cursor: Some(cursor), scope: FeedScope::Global })
        .await
        .unwrap();

    let order: Vec<String> = first
        .posts
        .iter()
        .chain(second.posts.iter())
        .map(|p| p.post.id.clone())
        .collect();
    let mut expected = order.clone();
    expected.sort_by(|a, b| b.cmp(a));
    assert_eq!(order, expected);
    assert_eq!(order.iter().collect::<HashSet<_>>().len(), 4);
}

#[tokio::test]
async fn scoped_posts_stay_out_of_the_global_feed() {
    let app = spawn().await;
    let cookie = app.login("google:1").await;

    app.post("/api/posts", Some(&cookie), json!({ "content": "public" })).await;
    app.post("/api/posts", Some(&cookie), json!({ "content": "group", "groupId": "g1" })).await;
    app.post("/api/posts", Some(&cookie), json!({ "content": "channel", "groupId": "g1", "channelId": "c1" })).await;

    let contents = |page: &Value| -> Vec<String> {
        page["posts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["content"].as_str().unwrap().to_owned())
            .collect()
    };

    let (_, global) = app.get("/api/posts", None).await;
    assert_eq!(contents(&global), ["public"]);

    let (_, group) = app.get("/api/posts?groupId=g1", None).await;
    assert_eq!(contents(&group), ["channel", "group"]);

    let (_, channel) = app.get("/api/posts?groupId=g1&channelId=c1", None).await;
    assert_eq!(contents(&channel), ["channel"]);
}

#[tokio::test]
async fn bad_feed_parameters_are_client_errors() {
    let app = spawn().await;

    let (status, _) = app.get("/api/posts?cursor=yesterday", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/posts?limit=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/posts?limit=lots", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_posts_only_lists_that_author() {
    let app = spawn().await;
    app.login("google:1").await;
    app.login("github:2").await;

    create_post(&app.db, post_by("google:1", "mine")).await.unwrap();
    create_post(&app.db, post_by("github:2", "theirs")).await.unwrap();

    let (status, body) = app.get("/api/posts/user/google:1", None).await;
    assert_eq!(status, StatusCode::OK);
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["content"], "mine");
    assert_eq!(posts[0]["author"]["authId"], "google:1");
}

#[tokio::test]
async fn only_the_author_may_delete_a_post() {
    let app = spawn().await;
    app.login("google:1").await;
    let intruder = app.login("github:2").await;

    let post_id = create_post(&app.db, post_by("google:1", "keep me")).await.unwrap();

    let (status, _) = app.delete(&format!("/api/posts/{post_id}"), Some(&intruder)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.count("SELECT COUNT(*) FROM posts").await, 1);

    let (status, _) = app.delete(&format!("/api/posts/{post_id}"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleting_a_post_removes_its_likes_and_comments() {
    let app = spawn().await;
    let author = app.login("google:1").await;
    app.login("github:2").await;

    let doomed = create_post(&app.db, post_by("google:1", "doomed")).await.unwrap();
    let survivor = create_post(&app.db, post_by("google:1", "survivor")).await.unwrap();

    for post in [doomed, survivor] {
        toggle_like(&app.db, post, "google:1").await.unwrap();
        toggle_like(&app.db, post, "github:2").await.unwrap();
        create_comment(&app.db, post, "nice", "github:2").await.unwrap();
    }

    let (status, body) = app.delete(&format!("/api/posts/{doomed}"), Some(&author)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let doomed = doomed.to_string();
    let left = |table: &str| format!("SELECT COUNT(*) FROM {table} WHERE post_id='{doomed}'");
    assert_eq!(app.count(&left("likes")).await, 0);
    assert_eq!(app.count(&left("comments")).await, 0);
    assert_eq!(app.count("SELECT COUNT(*) FROM likes").await, 2);
    assert_eq!(app.count("SELECT COUNT(*) FROM comments").await, 1);

    let (status, _) = app.get(&format!("/api/posts/{doomed}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&format!("/api/posts/{doomed}"), Some(&author)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
