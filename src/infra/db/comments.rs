use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{CommentsRepo, NewCommentParams, RepoError};
use crate::domain::entities::CommentRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    name: String,
    email: String,
    body: String,
    created_at: OffsetDateTime,
    active: bool,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            name: row.name,
            email: row.email,
            body: row.body,
            created_at: row.created_at,
            active: row.active,
        }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_active(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT id, post_id, name, email, body, created_at, active \
             FROM comments \
             WHERE post_id = $1 AND active \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn insert_comment(&self, params: NewCommentParams) -> Result<CommentRecord, RepoError> {
        let id = Uuid::new_v4();

        let row = sqlx::query_as::<_, CommentRow>(
            "INSERT INTO comments (id, post_id, name, email, body) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, post_id, name, email, body, created_at, active",
        )
        .bind(id)
        .bind(params.post_id)
        .bind(&params.name)
        .bind(&params.email)
        .bind(&params.body)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(CommentRecord::from(row))
    }
}
