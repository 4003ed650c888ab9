use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub auth_id: String,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author_auth_id: String,
    pub content: String,
    pub image_url: Option<String>,
    pub group_id: Option<String>,
    pub channel_id: Option<String>,
    pub created_at: i64,
    pub likes_count: i64,
    pub comments_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<User>,
}

/// Shortened view of a post attached to likes and comments in per-user listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPreview {
    pub id: String,
    pub content: String,
    pub author_auth_id: String,
}

const PREVIEW_CHARS: usize = 100;

impl From<&Post> for PostPreview {
    fn from(post: &Post) -> Self {
        let mut content: String = post.content.chars().take(PREVIEW_CHARS).collect();
        if post.content.chars().count() > PREVIEW_CHARS {
            content.push_str("...");
        }

        Self {
            id: post.id.clone(),
            content,
            author_auth_id: post.author_auth_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: String,
    pub post_id: String,
    pub user_auth_id: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeWithPost {
    #[serde(flatten)]
    pub like: Like,
    pub post: Option<PostPreview>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_auth_id: String,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<PostPreview>,
}
