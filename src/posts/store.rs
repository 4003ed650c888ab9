use std::{fmt, str::FromStr};

use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::{
    db::{now_millis, Db},
    models::{Post, PostWithAuthor},
    users::store::get_user,
    AppError, AppResult,
};

pub(crate) const POST_COLUMNS: &str =
    "id, author_auth_id, content, image_url, group_id, channel_id, created_at, likes_count, comments_count";

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub content: String,
    pub author_auth_id: String,
    pub image_url: Option<String>,
    pub group_id: Option<String>,
    pub channel_id: Option<String>,
}

/// Which posts a feed request may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    Global,
    Group(String),
    Channel(String),
}

impl FeedScope {
    /// A channel wins over a group; with neither, only unscoped posts are shown.
    pub fn new(group_id: Option<String>, channel_id: Option<String>) -> Self {
        match (group_id, channel_id) {
            (_, Some(channel)) => FeedScope::Channel(channel),
            (Some(group), None) => FeedScope::Group(group),
            (None, None) => FeedScope::Global,
        }
    }
}

/// Position after the last post of a page: its creation time and id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCursor {
    pub created_at: i64,
    pub id: String,
}

impl fmt::Display for FeedCursor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.created_at, self.id)
    }
}

impl FromStr for FeedCursor {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AppError::validation("Malformed cursor");
        let (created_at, id) = s.split_once(':').ok_or_else(malformed)?;
        let created_at = created_at.parse().map_err(|_| malformed())?;
        let id = Uuid::parse_str(id).map_err(|_| malformed())?;

        Ok(FeedCursor { created_at, id: id.to_string() })
    }
}

impl From<&Post> for FeedCursor {
    fn from(post: &Post) -> Self {
        FeedCursor {
            created_at: post.created_at,
            id: post.id.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedQuery {
    pub limit: i64,
    pub cursor: Option<FeedCursor>,
    pub scope: FeedScope,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub posts: Vec<PostWithAuthor>,
    pub next_cursor: Option<String>,
    pub is_done: bool,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

pub async fn create_post(db: &Db, post: NewPost) -> AppResult<Uuid> {
    let content = post.content.trim();
    if content.is_empty() {
        return Err(AppError::validation("Content is required"));
    }

    let id = Uuid::now_v7();
    sqlx::query(&format!(
        "INSERT INTO posts ({POST_COLUMNS}) VALUES (?,?,?,?,?,?,?,0,0)"
    ))
    .bind(id.to_string())
    .bind(&post.author_auth_id)
    .bind(content)
    .bind(non_empty(post.image_url))
    .bind(non_empty(post.group_id))
    .bind(non_empty(post.channel_id))
    .bind(now_millis())
    .execute(db.pool())
    .await?;

    Ok(id)
}

pub(crate) async fn find_post(db: &Db, id: &str) -> AppResult<Option<Post>> {
    Ok(
        sqlx::query_as(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id=?"))
            .bind(id)
            .fetch_optional(db.pool())
            .await?
    )
}

async fn with_author(db: &Db, post: Post) -> AppResult<PostWithAuthor> {
    let author = get_user(db, &post.author_auth_id).await?;
    Ok(PostWithAuthor { post, author })
}

/// One page of a feed, newest first.
pub async fn get_posts(db: &Db, query: FeedQuery) -> AppResult<FeedPage> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {POST_COLUMNS} FROM posts WHERE "));
    match query.scope {
        FeedScope::Global => {
            qb.push("group_id IS NULL AND channel_id IS NULL");
        }
        FeedScope::Group(group) => {
            qb.push("group_id = ").push_bind(group);
        }
        FeedScope::Channel(channel) => {
            qb.push("channel_id = ").push_bind(channel);
        }
    }
    if let Some(cursor) = query.cursor {
        qb.push(" AND (created_at < ")
            .push_bind(cursor.created_at)
            .push(" OR (created_at = ")
            .push_bind(cursor.created_at)
            .push(" AND id < ")
            .push_bind(cursor.id)
            .push("))");
    }
    // one extra row tells whether an older page exists
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(query.limit + 1);

    let mut rows: Vec<Post> = qb.build_query_as().fetch_all(db.pool()).await?;
    let is_done = rows.len() as i64 <= query.limit;
    rows.truncate(query.limit as usize);

    let next_cursor = match (is_done, rows.last()) {
        (false, Some(last)) => Some(FeedCursor::from(last).to_string()),
        _ => None,
    };

    let mut posts = Vec::with_capacity(rows.len());
    for post in rows {
        posts.push(with_author(db, post).await?);
    }

    Ok(FeedPage { posts, next_cursor, is_done })
}

pub async fn get_post(db: &Db, id: Uuid) -> AppResult<Option<PostWithAuthor>> {
    match find_post(db, &id.to_string()).await? {
        Some(post) => Ok(Some(with_author(db, post).await?)),
        None => Ok(None),
    }
}

pub async fn get_user_posts(db: &Db, author_auth_id: &str, limit: i64) -> AppResult<Vec<PostWithAuthor>> {
    let posts: Vec<Post> = sqlx::query_as(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE author_auth_id=? ORDER BY created_at DESC, id DESC LIMIT ?"
    ))
    .bind(author_auth_id)
    .bind(limit)
    .fetch_all(db.pool())
    .await?;

    let author = get_user(db, author_auth_id).await?;
    Ok(posts
        .into_iter()
        .map(|post| PostWithAuthor { post, author: author.clone() })
        .collect())
}

/// Removes the post with its likes and comments in one transaction. Only the
/// author may do this.
pub async fn delete_post(db: &Db, id: Uuid, requester: &str) -> AppResult<()> {
    let id = id.to_string();
    let mut tx = db.begin_write().await?;

    let Some((author,)): Option<(String,)> = sqlx::query_as("SELECT author_auth_id FROM posts WHERE id=?")
        .bind(&id)
        .fetch_optional(&mut *tx)
        .await?
    else {
        return Err(AppError::NotFound("Post"));
    };

    if author != requester {
        return Err(AppError::Forbidden("Unauthorized to delete this post"));
    }

    sqlx::query("DELETE FROM likes WHERE post_id=?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM comments WHERE post_id=?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM posts WHERE id=?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
