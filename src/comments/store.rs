use uuid::Uuid;

use crate::{
    db::{now_millis, Db},
    models::{Comment, CommentWithAuthor, PostPreview},
    posts::store::find_post,
    users::store::get_user,
    AppError, AppResult,
};

const COMMENT_COLUMNS: &str = "id, post_id, author_auth_id, content, created_at";

pub async fn create_comment(db: &Db, post_id: Uuid, content: &str, author_auth_id: &str) -> AppResult<Uuid> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::validation("Content is required"));
    }

    let post_id = post_id.to_string();
    let mut tx = db.begin_write().await?;

    let bumped = sqlx::query("UPDATE posts SET comments_count=comments_count + 1 WHERE id=?")
        .bind(&post_id)
        .execute(&mut *tx)
        .await?;
    if bumped.rows_affected() == 0 {
        return Err(AppError::NotFound("Post"));
    }

    let id = Uuid::now_v7();
    sqlx::query(&format!("INSERT INTO comments ({COMMENT_COLUMNS}) VALUES (?,?,?,?,?)"))
        .bind(id.to_string())
        .bind(&post_id)
        .bind(author_auth_id)
        .bind(content)
        .bind(now_millis())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(id)
}

/// Only the author may delete a comment. The parent's counter drops with it
/// when the post is still there.
pub async fn delete_comment(db: &Db, comment_id: Uuid, requester: &str) -> AppResult<()> {
    let comment_id = comment_id.to_string();
    let mut tx = db.begin_write().await?;

    let Some((post_id, author)): Option<(String, String)> =
        sqlx::query_as("SELECT post_id, author_auth_id FROM comments WHERE id=?")
            .bind(&comment_id)
            .fetch_optional(&mut *tx)
            .await?
    else {
        return Err(AppError::NotFound("Comment"));
    };

    if author != requester {
        return Err(AppError::Forbidden("Unauthorized to delete this comment"));
    }

    sqlx::query("UPDATE posts SET comments_count=MAX(comments_count - 1, 0) WHERE id=?")
        .bind(&post_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM comments WHERE id=?")
        .bind(&comment_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn get_post_comments(db: &Db, post_id: Uuid, limit: i64) -> AppResult<Vec<CommentWithAuthor>> {
    let comments: Vec<Comment> = sqlx::query_as(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id=? ORDER BY created_at DESC, id DESC LIMIT ?"
    ))
    .bind(post_id.to_string())
    .bind(limit)
    .fetch_all(db.pool())
    .await?;

    let mut out = Vec::with_capacity(comments.len());
    for comment in comments {
        let author = get_user(db, &comment.author_auth_id).await?;
        out.push(CommentWithAuthor { comment, author, post: None });
    }
    Ok(out)
}

/// A user's comments, newest first, with the author and a preview of each post.
pub async fn get_user_comments(db: &Db, author_auth_id: &str, limit: i64) -> AppResult<Vec<CommentWithAuthor>> {
    let comments: Vec<Comment> = sqlx::query_as(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE author_auth_id=? ORDER BY created_at DESC, id DESC LIMIT ?"
    ))
    .bind(author_auth_id)
    .bind(limit)
    .fetch_all(db.pool())
    .await?;

    let mut out = Vec::with_capacity(comments.len());
    for comment in comments {
        let author = get_user(db, &comment.author_auth_id).await?;
        let post = find_post(db, &comment.post_id).await?;
        out.push(CommentWithAuthor {
            post: post.as_ref().map(PostPreview::from),
            comment,
            author,
        });
    }
    Ok(out)
}
