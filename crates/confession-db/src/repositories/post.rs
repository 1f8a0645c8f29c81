//! PostgreSQL implementation of PostStore

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use confession_core::entities::Post;
use confession_core::traits::{PostStore, RepoResult};
use confession_core::value_objects::PostId;

use crate::models::PostModel;

use super::error::{map_db_error, post_not_found};

/// PostgreSQL implementation of PostStore
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    #[instrument(skip(self, content))]
    async fn insert_post(&self, content: &str) -> RepoResult<Post> {
        let model = sqlx::query_as::<_, PostModel>(
            r#"
            INSERT INTO posts (content)
            VALUES ($1)
            RETURNING id, content, created_at, likes
            "#,
        )
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Post::from(model))
    }

    #[instrument(skip(self))]
    async fn update_likes(&self, id: PostId, likes: i64) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE posts SET likes = $2 WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .bind(likes)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(post_not_found(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn increment_likes(&self, id: PostId) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE posts SET likes = likes + 1 WHERE id = $1 RETURNING likes
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| post_not_found(id))
    }

    #[instrument(skip(self))]
    async fn fetch_likes(&self, id: PostId) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT likes FROM posts WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| post_not_found(id))
    }

    #[instrument(skip(self))]
    async fn list_newest_first(&self) -> RepoResult<Vec<Post>> {
        let results = sqlx::query_as::<_, PostModel>(
            r#"
            SELECT id, content, created_at, likes
            FROM posts
            ORDER BY created_at DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Post::from).collect())
    }
}
