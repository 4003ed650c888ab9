use uuid::Uuid;

use crate::{
    db::{now_millis, Db},
    models::{Like, LikeWithPost, PostPreview},
    posts::store::find_post,
    AppError, AppResult,
};

const LIKE_COLUMNS: &str = "id, post_id, user_auth_id, created_at";

/// Flips the caller's like on a post and returns whether the post is now liked.
/// The like row and the post's counter change commit together.
pub async fn toggle_like(db: &Db, post_id: Uuid, user_auth_id: &str) -> AppResult<bool> {
    let post_id = post_id.to_string();
    let mut tx = db.begin_write().await?;

    if sqlx::query("SELECT 1 FROM posts WHERE id=?")
        .bind(&post_id)
        .fetch_optional(&mut *tx)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Post"));
    }

    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM likes WHERE post_id=? AND user_auth_id=?")
        .bind(&post_id)
        .bind(user_auth_id)
        .fetch_optional(&mut *tx)
        .await?;

    let liked = match existing {
        Some((like_id,)) => {
            sqlx::query("DELETE FROM likes WHERE id=?")
                .bind(like_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE posts SET likes_count=MAX(likes_count - 1, 0) WHERE id=?")
                .bind(&post_id)
                .execute(&mut *tx)
                .await?;
            false
        }
        None => {
            sqlx::query(&format!("INSERT INTO likes ({LIKE_COLUMNS}) VALUES (?,?,?,?)"))
                .bind(Uuid::now_v7().to_string())
                .bind(&post_id)
                .bind(user_auth_id)
                .bind(now_millis())
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE posts SET likes_count=likes_count + 1 WHERE id=?")
                .bind(&post_id)
                .execute(&mut *tx)
                .await?;
            true
        }
    };

    tx.commit().await?;
    Ok(liked)
}

pub async fn has_liked(db: &Db, post_id: Uuid, user_auth_id: &str) -> AppResult<bool> {
    Ok(
        sqlx::query("SELECT 1 FROM likes WHERE post_id=? AND user_auth_id=?")
            .bind(post_id.to_string())
            .bind(user_auth_id)
            .fetch_optional(db.pool())
            .await?
            .is_some()
    )
}

pub async fn get_post_likes(db: &Db, post_id: Uuid, limit: i64) -> AppResult<Vec<Like>> {
    Ok(
        sqlx::query_as(&format!(
            "SELECT {LIKE_COLUMNS} FROM likes WHERE post_id=? ORDER BY created_at DESC, id DESC LIMIT ?"
        ))
        .bind(post_id.to_string())
        .bind(limit)
        .fetch_all(db.pool())
        .await?
    )
}

/// A user's likes, newest first, each with a preview of the liked post.
pub async fn get_user_likes(db: &Db, user_auth_id: &str, limit: i64) -> AppResult<Vec<LikeWithPost>> {
    let likes: Vec<Like> = sqlx::query_as(&format!(
        "SELECT {LIKE_COLUMNS} FROM likes WHERE user_auth_id=? ORDER BY created_at DESC, id DESC LIMIT ?"
    ))
    .bind(user_auth_id)
    .bind(limit)
    .fetch_all(db.pool())
    .await?;

    let mut out = Vec::with_capacity(likes.len());
    for like in likes {
        let post = find_post(db, &like.post_id).await?;
        out.push(LikeWithPost {
            post: post.as_ref().map(PostPreview::from),
            like,
        });
    }
    Ok(out)
}
