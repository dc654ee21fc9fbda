#![allow(dead_code)]

//! In-memory repository and mailer fakes shared by the integration suites.

use std::sync::Mutex;

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use quaderno::application::repos::{
    CommentsRepo, NewCommentParams, PostsRepo, RepoError, SearchHit, SimilarCandidate, TagsRepo,
};
use quaderno::application::share::{MailError, Mailer, OutgoingEmail};
use quaderno::domain::entities::{CommentRecord, PostRecord, TagRecord};
use quaderno::domain::types::PostStatus;

#[derive(Default)]
pub struct InMemoryStore {
    pub posts: Vec<PostRecord>,
    pub tags: Vec<TagRecord>,
    pub post_tags: Vec<(Uuid, Uuid)>,
    pub comments: Mutex<Vec<CommentRecord>>,
    /// When set, any call to `search_published` fails the test.
    pub deny_search: bool,
}

impl InMemoryStore {
    pub fn with_posts(posts: Vec<PostRecord>) -> Self {
        Self {
            posts,
            ..Self::default()
        }
    }

    pub fn add_tag(&mut self, slug: &str, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.tags.push(TagRecord {
            id,
            slug: slug.to_string(),
            name: name.to_string(),
        });
        id
    }

    pub fn attach_tag(&mut self, post_id: Uuid, tag_id: Uuid) {
        self.post_tags.push((post_id, tag_id));
    }

    fn tag_ids_of(&self, post_id: Uuid) -> Vec<Uuid> {
        self.post_tags
            .iter()
            .filter(|(post, _)| *post == post_id)
            .map(|(_, tag)| *tag)
            .collect()
    }

    fn published(&self) -> impl Iterator<Item = &PostRecord> {
        self.posts
            .iter()
            .filter(|post| post.status == PostStatus::Published)
    }

    fn matches_tag(&self, post_id: Uuid, tag_slug: &str) -> bool {
        self.tag_ids_of(post_id).iter().any(|tag_id| {
            self.tags
                .iter()
                .any(|tag| tag.id == *tag_id && tag.slug == tag_slug)
        })
    }
}

#[async_trait]
impl PostsRepo for InMemoryStore {
    async fn list_published(
        &self,
        tag_slug: Option<&str>,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let mut posts: Vec<PostRecord> = self
            .published()
            .filter(|post| tag_slug.is_none_or(|slug| self.matches_tag(post.id, slug)))
            .cloned()
            .collect();
        posts.sort_by(|left, right| {
            right
                .publish
                .cmp(&left.publish)
                .then(right.id.cmp(&left.id))
        });
        Ok(posts
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect())
    }

    async fn count_published(&self, tag_slug: Option<&str>) -> Result<u64, RepoError> {
        let count = self
            .published()
            .filter(|post| tag_slug.is_none_or(|slug| self.matches_tag(post.id, slug)))
            .count();
        Ok(count as u64)
    }

    async fn find_published_by_day_and_slug(
        &self,
        day: Date,
        slug: &str,
    ) -> Result<Option<PostRecord>, RepoError> {
        Ok(self
            .published()
            .find(|post| post.slug == slug && post.publish.date() == day)
            .cloned())
    }

    async fn find_published_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.published().find(|post| post.id == id).cloned())
    }

    async fn list_sharing_tags(&self, post_id: Uuid) -> Result<Vec<SimilarCandidate>, RepoError> {
        let reference_tags = self.tag_ids_of(post_id);
        let mut candidates = Vec::new();
        for post in self.published() {
            if post.id == post_id {
                continue;
            }
            let shared = self
                .tag_ids_of(post.id)
                .iter()
                .filter(|tag| reference_tags.contains(tag))
                .count();
            if shared > 0 {
                candidates.push(SimilarCandidate {
                    post: post.clone(),
                    same_tags: shared as u32,
                });
            }
        }
        Ok(candidates)
    }

    async fn search_published(
        &self,
        query: &str,
        min_similarity: f32,
    ) -> Result<Vec<SearchHit>, RepoError> {
        assert!(!self.deny_search, "search_published should not be called");

        let needle = query.to_lowercase();
        let mut hits: Vec<SearchHit> = self
            .published()
            .filter_map(|post| {
                let mut similarity = 0.0_f32;
                if post.title.to_lowercase().contains(&needle) {
                    similarity += 0.5;
                }
                if post.body.to_lowercase().contains(&needle) {
                    similarity += 0.5;
                }
                (similarity > min_similarity).then(|| SearchHit {
                    post: post.clone(),
                    similarity,
                })
            })
            .collect();
        hits.sort_by(|left, right| {
            right
                .similarity
                .partial_cmp(&left.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(hits)
    }
}

#[async_trait]
impl TagsRepo for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<TagRecord>, RepoError> {
        Ok(self.tags.iter().find(|tag| tag.slug == slug).cloned())
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<TagRecord>, RepoError> {
        let ids = self.tag_ids_of(post_id);
        let mut tags: Vec<TagRecord> = self
            .tags
            .iter()
            .filter(|tag| ids.contains(&tag.id))
            .cloned()
            .collect();
        tags.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(tags)
    }
}

#[async_trait]
impl CommentsRepo for InMemoryStore {
    async fn list_active(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let comments = self.comments.lock().expect("comments lock");
        let mut active: Vec<CommentRecord> = comments
            .iter()
            .filter(|comment| comment.post_id == post_id && comment.active)
            .cloned()
            .collect();
        active.sort_by(|left, right| left.created_at.cmp(&right.created_at));
        Ok(active)
    }

    async fn insert_comment(&self, params: NewCommentParams) -> Result<CommentRecord, RepoError> {
        let record = CommentRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            name: params.name,
            email: params.email,
            body: params.body,
            created_at: OffsetDateTime::now_utc(),
            active: true,
        };
        self.comments
            .lock()
            .expect("comments lock")
            .push(record.clone());
        Ok(record)
    }
}

/// Captures outgoing mail instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().expect("sent lock").push(email);
        Ok(())
    }
}

pub fn published_post(id: u128, slug: &str, publish: OffsetDateTime) -> PostRecord {
    PostRecord {
        id: Uuid::from_u128(id),
        title: format!("Post {id}"),
        slug: slug.to_string(),
        body: "A body about nothing in particular.".to_string(),
        publish,
        status: PostStatus::Published,
        created_at: publish,
        updated_at: publish,
    }
}

pub fn draft_post(id: u128, slug: &str, publish: OffsetDateTime) -> PostRecord {
    PostRecord {
        status: PostStatus::Draft,
        ..published_post(id, slug, publish)
    }
}
