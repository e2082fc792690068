use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::PostForm;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub job_timeframe: String,
    pub payment: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Post joined with its author's display name, the shape the feed and the
/// single-post view render.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostWithAuthor {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_fullname: String,
    pub title: String,
    pub content: String,
    pub job_timeframe: String,
    pub payment: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: OffsetDateTime,
}

const POST_COLUMNS: &str =
    "id, author_id, title, content, job_timeframe, payment, email, phone, created_at";

const JOINED_COLUMNS: &str = "p.id, p.author_id, u.fullname AS author_fullname, p.title, \
     p.content, p.job_timeframe, p.payment, p.email, p.phone, p.created_at";

impl Post {
    pub async fn create(db: &PgPool, author_id: Uuid, form: &PostForm) -> anyhow::Result<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO posts (author_id, title, content, job_timeframe, payment, email, phone)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {POST_COLUMNS}"
        ))
        .bind(author_id)
        .bind(&form.title)
        .bind(&form.content)
        .bind(&form.job_timeframe)
        .bind(&form.payment)
        .bind(&form.email)
        .bind(&form.phone)
        .fetch_one(db)
        .await?;
        Ok(post)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(post)
    }

    /// The author never changes on update.
    pub async fn update(db: &PgPool, id: Uuid, form: &PostForm) -> anyhow::Result<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts
             SET title = $2, content = $3, job_timeframe = $4, payment = $5, email = $6, phone = $7
             WHERE id = $1
             RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(&form.title)
        .bind(&form.content)
        .bind(&form.job_timeframe)
        .bind(&form.payment)
        .bind(&form.email)
        .bind(&form.phone)
        .fetch_one(db)
        .await?;
        Ok(post)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

impl PostWithAuthor {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<PostWithAuthor>> {
        let post = sqlx::query_as::<_, PostWithAuthor>(&format!(
            "SELECT {JOINED_COLUMNS}
             FROM posts p JOIN users u ON u.id = p.author_id
             WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(post)
    }

    /// One feed page, newest first.
    pub async fn feed_page(
        db: &PgPool,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<PostWithAuthor>> {
        let rows = sqlx::query_as::<_, PostWithAuthor>(&format!(
            "SELECT {JOINED_COLUMNS}
             FROM posts p JOIN users u ON u.id = p.author_id
             ORDER BY p.created_at DESC
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn feed_page_by_author(
        db: &PgPool,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<PostWithAuthor>> {
        let rows = sqlx::query_as::<_, PostWithAuthor>(&format!(
            "SELECT {JOINED_COLUMNS}
             FROM posts p JOIN users u ON u.id = p.author_id
             WHERE p.author_id = $1
             ORDER BY p.created_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count_all(db: &PgPool) -> anyhow::Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(db)
            .await?;
        Ok(total)
    }

    pub async fn count_by_author(db: &PgPool, author_id: Uuid) -> anyhow::Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(db)
            .await?;
        Ok(total)
    }
}
