use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::application::repos::{PostsRepo, RepoError, SearchHit, SimilarCandidate};
use crate::domain::entities::PostRecord;
use crate::domain::types::PostStatus;

use super::{PostgresRepositories, map_sqlx_error};

const POST_COLUMNS: &str =
    "p.id, p.title, p.slug, p.body, p.publish, p.status, p.created_at, p.updated_at";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    slug: String,
    body: String,
    publish: OffsetDateTime,
    status: PostStatus,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            body: row.body,
            publish: row.publish,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SimilarRow {
    #[sqlx(flatten)]
    post: PostRow,
    same_tags: i64,
}

#[derive(sqlx::FromRow)]
struct SearchRow {
    #[sqlx(flatten)]
    post: PostRow,
    sim: f32,
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_published(
        &self,
        tag_slug: Option<&str>,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE p.status = 'published'::post_status "
        ));
        Self::apply_tag_filter(&mut qb, tag_slug);
        qb.push(" ORDER BY p.publish DESC, p.id DESC LIMIT ");
        qb.push_bind(i64::from(limit));
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(offset).unwrap_or(i64::MAX));

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn count_published(&self, tag_slug: Option<&str>) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new(
            "SELECT COUNT(*) FROM posts p WHERE p.status = 'published'::post_status ",
        );
        Self::apply_tag_filter(&mut qb, tag_slug);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn find_published_by_day_and_slug(
        &self,
        day: Date,
        slug: &str,
    ) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p \
             WHERE p.status = 'published'::post_status \
               AND p.slug = $1 \
               AND date(timezone('UTC', p.publish)) = $2"
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(slug)
            .bind(day)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn find_published_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p \
             WHERE p.status = 'published'::post_status AND p.id = $1"
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn list_sharing_tags(&self, post_id: Uuid) -> Result<Vec<SimilarCandidate>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS}, COUNT(pt.tag_id) AS same_tags \
             FROM posts p \
             INNER JOIN post_tags pt ON pt.post_id = p.id \
             WHERE p.status = 'published'::post_status \
               AND p.id <> $1 \
               AND pt.tag_id IN (SELECT tag_id FROM post_tags WHERE post_id = $1) \
             GROUP BY p.id"
        );

        let rows = sqlx::query_as::<_, SimilarRow>(&sql)
            .bind(post_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| SimilarCandidate {
                post: PostRecord::from(row.post),
                same_tags: u32::try_from(row.same_tags).unwrap_or(u32::MAX),
            })
            .collect())
    }

    async fn search_published(
        &self,
        query: &str,
        min_similarity: f32,
    ) -> Result<Vec<SearchHit>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS}, \
                    similarity(p.title, $1) + similarity(p.body, $1) AS sim \
             FROM posts p \
             WHERE p.status = 'published'::post_status \
               AND similarity(p.title, $1) + similarity(p.body, $1) > $2 \
             ORDER BY sim DESC, p.id DESC"
        );

        let rows = sqlx::query_as::<_, SearchRow>(&sql)
            .bind(query)
            .bind(min_similarity)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| SearchHit {
                post: PostRecord::from(row.post),
                similarity: row.sim,
            })
            .collect())
    }
}
