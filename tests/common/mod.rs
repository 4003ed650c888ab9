#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::Path,
    http::{header, Method, Request, StatusCode},
    routing::post,
    Router,
};
use layerzero::{
    auth::Clients,
    config::Config,
    db::Db,
    session::USER_ID,
    storage::Storage,
    users::store::{upsert_user, UpsertUser},
    AppState,
};
use object_store::memory::InMemory;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};

pub const CDN: &str = "https://cdn.test";

pub struct TestApp {
    pub router: Router,
    pub db: Db,
    pub objects: Arc<InMemory>,
}

async fn login_as(session: Session, Path(auth_id): Path<String>) -> StatusCode {
    session.insert(USER_ID, auth_id).await.unwrap();
    StatusCode::NO_CONTENT
}

pub async fn spawn() -> TestApp {
    spawn_with(&[]).await
}

/// Like [`spawn`], with extra environment values for the config.
pub async fn spawn_with(vars: &[(&str, &str)]) -> TestApp {
    let db = Db::in_memory().await.unwrap();
    let objects = Arc::new(InMemory::new());
    let config = Config::from_lookup(|key| match vars.iter().find(|(k, _)| *k == key) {
        Some((_, value)) => Some(value.to_string()),
        None => (key == "STORAGE_BACKEND").then(|| "memory".to_owned()),
    })
    .unwrap();

    let state = AppState {
        db: db.clone(),
        clients: Clients::default(),
        storage: Storage::new(objects.clone(), CDN),
        config: Arc::new(config),
    };

    let router = layerzero::router()
        .route("/test/login/{auth_id}", post(login_as))
        .layer(SessionManagerLayer::new(MemoryStore::default()))
        .with_state(state);

    TestApp { router, db, objects }
}

pub fn user(auth_id: &str) -> UpsertUser {
    UpsertUser {
        auth_id: auth_id.to_owned(),
        name: Some(format!("User {auth_id}")),
        email: format!("{}@example.com", auth_id.replace(':', "_")),
        image: None,
        bio: None,
    }
}

impl TestApp {
    /// Creates the user row and returns a session cookie for it.
    pub async fn login(&self, auth_id: &str) -> String {
        upsert_user(&self.db, user(auth_id)).await.unwrap();

        let response = self
            .router
            .clone()
            .oneshot(
                Request::post(format!("/test/login/{auth_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        response
            .headers()
            .get(header::SET_COOKIE)
            .expect("login sets a session cookie")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_owned()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn call(&self, method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, cookie, None).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, cookie, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, cookie, None).await
    }

    pub async fn multipart(&self, method: Method, uri: &str, cookie: &str, parts: &[Part<'_>]) -> (StatusCode, Value) {
        const BOUNDARY: &str = "layerzero-test-boundary";

        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::File { name, file_name, content_type, bytes } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
                Part::Text { name, value } => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}").as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn count(&self, sql: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(sql).fetch_one(self.db.pool()).await.unwrap();
        n
    }
}

pub enum Part<'a> {
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}
