mod common;

use axum::http::{Method, StatusCode};
use common::{spawn, user, Part, CDN};
use layerzero::{
    users::store::{ensure_user, get_user, upsert_user, UpsertUser},
    AppError,
};
use object_store::{path::Path, ObjectStore};
use serde_json::json;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nnot really a png";

#[tokio::test]
async fn upsert_is_idempotent() {
    let app = spawn().await;

    let first = upsert_user(&app.db, user("google:1")).await.unwrap();
    let second = upsert_user(&app.db, user("google:1")).await.unwrap();

    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, 1);
    assert_eq!(first.auth_id, second.auth_id);
    assert_eq!(first.email, second.email);
    assert_eq!(first.created_at, second.created_at);
}

#[tokio::test]
async fn upsert_overwrites_mutable_fields() {
    let app = spawn().await;
    upsert_user(&app.db, user("google:1")).await.unwrap();

    let updated = upsert_user(&app.db, UpsertUser {
        name: Some("Renamed".into()),
        image: Some("https://img.test/a.png".into()),
        ..user("google:1")
    })
    .await
    .unwrap();

    assert_eq!(updated.name.as_deref(), Some("Renamed"));
    assert_eq!(updated.image.as_deref(), Some("https://img.test/a.png"));
}

#[tokio::test]
async fn emails_belong_to_one_account() {
    let app = spawn().await;
    upsert_user(&app.db, user("google:1")).await.unwrap();

    let err = upsert_user(&app.db, UpsertUser {
        email: user("google:1").email,
        ..user("github:2")
    })
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn ensure_user_keeps_an_existing_profile() {
    let app = spawn().await;
    upsert_user(&app.db, UpsertUser { bio: Some("hand written".into()), ..user("google:1") })
        .await
        .unwrap();

    let kept = ensure_user(&app.db, UpsertUser { name: Some("From provider".into()), ..user("google:1") })
        .await
        .unwrap();

    assert_eq!(kept.bio.as_deref(), Some("hand written"));
    assert_eq!(kept.name.as_deref(), Some("User google:1"));
}

#[tokio::test]
async fn second_provider_with_the_same_email_signs_into_the_first_account() {
    let app = spawn().await;
    let first = ensure_user(&app.db, UpsertUser {
        email: "ada@example.com".into(),
        ..user("google:1")
    })
    .await
    .unwrap();

    for email in ["ada@example.com", "Ada@Example.com"] {
        let linked = ensure_user(&app.db, UpsertUser {
            name: Some("octo-ada".into()),
            email: email.into(),
            ..user("github:9")
        })
        .await
        .unwrap();
        assert_eq!(linked, first);
    }

    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, 1);
    assert!(get_user(&app.db, "github:9").await.unwrap().is_none());
}

#[tokio::test]
async fn new_identity_with_a_new_email_gets_its_own_account() {
    let app = spawn().await;
    ensure_user(&app.db, user("google:1")).await.unwrap();

    let created = ensure_user(&app.db, user("github:9")).await.unwrap();

    assert_eq!(created.auth_id, "github:9");
    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, 2);
}

#[tokio::test]
async fn profiles_are_public_and_batchable() {
    let app = spawn().await;
    app.login("google:1").await;
    app.login("github:2").await;

    let (status, body) = app.get("/api/users/github:2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authId"], "github:2");

    let (status, _) = app.get("/api/users/github:404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .post("/api/users/batch", None, json!({ "authIds": ["google:1", "github:2", "github:404"] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let users = body["users"].as_object().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users["google:1"]["authId"], "google:1");

    let too_many: Vec<String> = (0..101).map(|i| format!("github:{i}")).collect();
    let (status, _) = app.post("/api/users/batch", None, json!({ "authIds": too_many })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn me_reflects_the_session() {
    let app = spawn().await;

    let (status, _) = app.get("/api/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = app.login("google:1").await;
    let (status, body) = app.get("/api/me", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["authId"], "google:1");
}

#[tokio::test]
async fn sync_needs_a_provider_profile() {
    let app = spawn().await;
    let cookie = app.login("google:1").await;

    let (status, _) = app.post("/api/users/sync", Some(&cookie), json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_edits_are_checked() {
    let app = spawn().await;
    let cookie = app.login("google:1").await;

    let (status, body) = app
        .call(Method::PATCH, "/api/users/me", Some(&cookie), Some(json!({ "bio": "  hi there  " })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["bio"], "hi there");
    assert_eq!(body["user"]["name"], "User google:1");

    let (status, _) = app
        .call(Method::PATCH, "/api/users/me", Some(&cookie), Some(json!({ "name": "   " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(Method::PATCH, "/api/users/me", Some(&cookie), Some(json!({ "bio": "b".repeat(501) })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(Method::PATCH, "/api/users/me", None, Some(json!({ "bio": "anon" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn avatar_upload_and_removal() {
    let app = spawn().await;
    let cookie = app.login("google:1").await;
    let avatar = Part::File { name: "avatar", file_name: "me.png", content_type: "image/png", bytes: PNG };

    let (status, body) = app
        .multipart(Method::POST, "/api/users/google:1/avatar", &cookie, &[avatar])
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let url = body["user"]["image"].as_str().unwrap().to_owned();
    assert!(url.starts_with(&format!("{CDN}/avatars/")), "{url}");
    assert!(url.ends_with("me.png"));

    let key = Path::from(url.strip_prefix(&format!("{CDN}/")).unwrap());
    let stored = app.objects.head(&key).await.unwrap();
    assert_eq!(stored.size, PNG.len());

    let (status, body) = app.delete("/api/users/google:1/avatar", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["user"]["image"].is_null());
    assert!(app.objects.head(&key).await.is_err());
    assert!(get_user(&app.db, "google:1").await.unwrap().unwrap().image.is_none());

    let (status, _) = app.delete("/api/users/google:1/avatar", Some(&cookie)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn avatars_belong_to_their_owner() {
    let app = spawn().await;
    app.login("google:1").await;
    let intruder = app.login("github:2").await;
    let avatar = Part::File { name: "avatar", file_name: "me.png", content_type: "image/png", bytes: PNG };

    let (status, _) = app
        .multipart(Method::POST, "/api/users/google:1/avatar", &intruder, &[avatar])
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete("/api/users/google:1/avatar", Some(&intruder)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn avatars_must_be_images() {
    let app = spawn().await;
    let cookie = app.login("google:1").await;
    let script = Part::File { name: "avatar", file_name: "x.sh", content_type: "text/x-shellscript", bytes: b"rm -rf /" };

    let (status, _) = app
        .multipart(Method::POST, "/api/users/google:1/avatar", &cookie, &[script])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(get_user(&app.db, "google:1").await.unwrap().unwrap().image.is_none());
}
