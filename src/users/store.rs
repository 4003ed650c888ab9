use std::collections::HashMap;

use serde::Deserialize;
use tracing::info;

use crate::{db::{now_millis, Db}, models::User, AppError, AppResult};

const USER_COLUMNS: &str = "auth_id, name, email, image, bio, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertUser {
    pub auth_id: String,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    pub bio: Option<String>,
}

/// Profile edit. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub image: Option<String>,
    pub bio: Option<String>,
}

fn email_taken(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::validation("Email is already in use by another account")
        }
        _ => err.into(),
    }
}

fn check_user(user: &UpsertUser) -> AppResult<()> {
    if user.auth_id.trim().is_empty() {
        return Err(AppError::validation("authId is required"));
    }
    if user.email.trim().is_empty() {
        return Err(AppError::validation("email is required"));
    }
    Ok(())
}

/// Inserts the user, or overwrites every mutable field of the existing row.
pub async fn upsert_user(db: &Db, user: UpsertUser) -> AppResult<User> {
    check_user(&user)?;
    let now = now_millis();

    sqlx::query_as(&format!(
        "INSERT INTO users ({USER_COLUMNS}) VALUES (?,?,?,?,?,?,?)
         ON CONFLICT(auth_id) DO UPDATE SET
            name=excluded.name, email=excluded.email, image=excluded.image,
            bio=excluded.bio, updated_at=excluded.updated_at
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&user.auth_id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.image)
    .bind(&user.bio)
    .bind(now)
    .bind(now)
    .fetch_one(db.pool())
    .await
    .map_err(email_taken)
}

/// Account for a provider sign-in. An existing row for the auth id, or else
/// for the same email, is returned untouched; only an unknown identity is
/// inserted. The email must have been verified by the provider, since a
/// match on it signs the caller into that account.
pub async fn ensure_user(db: &Db, user: UpsertUser) -> AppResult<User> {
    if let Some(existing) = get_user(db, &user.auth_id).await? {
        return Ok(existing);
    }
    if let Some(existing) = get_user_by_email(db, &user.email).await? {
        info!("linking {} to account {}", user.auth_id, existing.auth_id);
        return Ok(existing);
    }
    check_user(&user)?;
    let now = now_millis();

    sqlx::query(&format!(
        "INSERT INTO users ({USER_COLUMNS}) VALUES (?,?,?,?,?,?,?) ON CONFLICT DO NOTHING"
    ))
    .bind(&user.auth_id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.image)
    .bind(&user.bio)
    .bind(now)
    .bind(now)
    .execute(db.pool())
    .await?;

    // a concurrent sign-in may have claimed the auth id or the email first
    if let Some(stored) = get_user(db, &user.auth_id).await? {
        return Ok(stored);
    }
    get_user_by_email(db, &user.email)
        .await?
        .ok_or(AppError::NotFound("User"))
}

pub async fn get_user(db: &Db, auth_id: &str) -> AppResult<Option<User>> {
    Ok(
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE auth_id=?"))
            .bind(auth_id)
            .fetch_optional(db.pool())
            .await?
    )
}

pub async fn get_user_by_email(db: &Db, email: &str) -> AppResult<Option<User>> {
    Ok(
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email=? COLLATE NOCASE"))
            .bind(email.trim())
            .fetch_optional(db.pool())
            .await?
    )
}

/// Looks each id up on its own; unknown ids are left out of the map.
pub async fn get_users(db: &Db, auth_ids: &[String]) -> AppResult<HashMap<String, User>> {
    let mut users = HashMap::with_capacity(auth_ids.len());
    for auth_id in auth_ids {
        if users.contains_key(auth_id) {
            continue;
        }
        if let Some(user) = get_user(db, auth_id).await? {
            users.insert(auth_id.clone(), user);
        }
    }
    Ok(users)
}

pub async fn update_profile(db: &Db, auth_id: &str, patch: ProfilePatch) -> AppResult<User> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET
            name=COALESCE(?, name), image=COALESCE(?, image), bio=COALESCE(?, bio), updated_at=?
         WHERE auth_id=?
         RETURNING {USER_COLUMNS}"
    ))
    .bind(patch.name)
    .bind(patch.image)
    .bind(patch.bio)
    .bind(now_millis())
    .bind(auth_id)
    .fetch_optional(db.pool())
    .await?
    .ok_or(AppError::NotFound("User"))
}

/// Replaces (or with `None`, clears) the avatar URL.
pub async fn set_avatar(db: &Db, auth_id: &str, image: Option<&str>) -> AppResult<User> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET image=?, updated_at=? WHERE auth_id=? RETURNING {USER_COLUMNS}"
    ))
    .bind(image)
    .bind(now_millis())
    .bind(auth_id)
    .fetch_optional(db.pool())
    .await?
    .ok_or(AppError::NotFound("User"))
}
