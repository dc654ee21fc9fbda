//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::Date;
use uuid::Uuid;

use crate::domain::entities::{CommentRecord, PostRecord, TagRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// A published post annotated with the number of tags it shares with some
/// reference post. Returned in no particular order; ranking happens in the
/// application layer.
#[derive(Debug, Clone)]
pub struct SimilarCandidate {
    pub post: PostRecord,
    pub same_tags: u32,
}

/// A published post annotated with its combined trigram similarity against a
/// search query.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub post: PostRecord,
    pub similarity: f32,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Published posts ordered by publish descending (id descending on ties),
    /// optionally restricted to posts carrying `tag_slug`.
    async fn list_published(
        &self,
        tag_slug: Option<&str>,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn count_published(&self, tag_slug: Option<&str>) -> Result<u64, RepoError>;

    /// The published post whose slug and publish day (UTC) match, if any.
    /// The store guarantees at most one row can match.
    async fn find_published_by_day_and_slug(
        &self,
        day: Date,
        slug: &str,
    ) -> Result<Option<PostRecord>, RepoError>;

    async fn find_published_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;

    /// Published posts sharing at least one tag with `post_id`, excluding the
    /// post itself, each annotated with the shared-tag count.
    async fn list_sharing_tags(&self, post_id: Uuid) -> Result<Vec<SimilarCandidate>, RepoError>;

    /// Published posts whose combined trigram similarity
    /// (`similarity(title, query) + similarity(body, query)`) exceeds
    /// `min_similarity`, ordered by that score descending.
    async fn search_published(
        &self,
        query: &str,
        min_similarity: f32,
    ) -> Result<Vec<SearchHit>, RepoError>;
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<TagRecord>, RepoError>;

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<TagRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewCommentParams {
    pub post_id: Uuid,
    pub name: String,
    pub email: String,
    pub body: String,
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Active comments for a post, oldest first.
    async fn list_active(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError>;

    async fn insert_comment(&self, params: NewCommentParams) -> Result<CommentRecord, RepoError>;
}
