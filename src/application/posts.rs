//! Post Query Service: listings, detail lookup, similarity rail, search.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use time::{Date, Month};
use uuid::Uuid;

use crate::application::forms::{CommentForm, FormErrors, SearchForm};
use crate::application::pagination::Paginator;
use crate::application::repos::{
    CommentsRepo, PostsRepo, RepoError, SearchHit, SimilarCandidate, TagsRepo,
};
use crate::domain::entities::{CommentRecord, PostRecord};
use crate::domain::format_human_date;
use crate::presentation::views::{
    CommentFormView, CommentView, ListingContext, PostCard, PostDetailContext, SearchContext,
    SearchResultView, TagBadge, build_tag_badges,
};

/// Maximum number of posts in the similar-posts rail.
pub const SIMILAR_POSTS_LIMIT: usize = 4;

/// Combined trigram similarity a post must exceed to count as a search hit.
pub const SEARCH_MIN_SIMILARITY: f32 = 0.1;

const EXCERPT_MAX_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown tag")]
    UnknownTag,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct PostQueryService {
    posts: Arc<dyn PostsRepo>,
    tags: Arc<dyn TagsRepo>,
    comments: Arc<dyn CommentsRepo>,
    page_size: u32,
}

impl PostQueryService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        tags: Arc<dyn TagsRepo>,
        comments: Arc<dyn CommentsRepo>,
        page_size: u32,
    ) -> Self {
        Self {
            posts,
            tags,
            comments,
            page_size: page_size.max(1),
        }
    }

    /// Paginated listing of published posts, optionally filtered by tag.
    ///
    /// The page parameter is taken as submitted: anything that is not a
    /// positive integer falls back to page 1, and a page past the end falls
    /// back to the last page.
    pub async fn listing(
        &self,
        tag_slug: Option<&str>,
        page: Option<&str>,
    ) -> Result<ListingContext, QueryError> {
        let tag = match tag_slug {
            Some(slug) => Some(
                self.tags
                    .find_by_slug(slug)
                    .await?
                    .ok_or(QueryError::UnknownTag)?,
            ),
            None => None,
        };
        let tag_filter = tag.as_ref().map(|record| record.slug.as_str());

        let total = self.posts.count_published(tag_filter).await?;
        let paginator = Paginator::new(total, self.page_size);
        let number = paginator.resolve(page);

        let records = self
            .posts
            .list_published(tag_filter, paginator.offset(number), paginator.per_page())
            .await?;

        let mut cards = Vec::with_capacity(records.len());
        for record in &records {
            cards.push(self.record_to_card(record).await?);
        }

        let base_path = match &tag {
            Some(record) => format!("/tag/{}", record.slug),
            None => "/".to_string(),
        };

        Ok(ListingContext {
            posts: cards,
            page: paginator.page_info(number),
            active_tag: tag.map(|record| TagBadge {
                value: record.slug,
                label: format!("#{}", record.name),
            }),
            base_path,
        })
    }

    /// The published post matching the four-part detail key, if the date
    /// parts form a real calendar day and exactly one post matches.
    pub async fn find_post(
        &self,
        year: i32,
        month: u8,
        day: u8,
        slug: &str,
    ) -> Result<Option<PostRecord>, QueryError> {
        let Some(date) = calendar_day(year, month, day) else {
            return Ok(None);
        };
        let post = self.posts.find_published_by_day_and_slug(date, slug).await?;
        Ok(post)
    }

    /// Full detail context for a resolved post: tag badges, active comments,
    /// the similar-posts rail, and the comment form state to render.
    pub async fn detail_context(
        &self,
        post: &PostRecord,
        form: &CommentForm,
        errors: &FormErrors,
        comment_posted: bool,
    ) -> Result<PostDetailContext, QueryError> {
        let tags = self.tags.list_for_post(post.id).await?;
        let comments = self.comments.list_active(post.id).await?;
        let similar = self.similar(post.id).await?;

        let mut similar_cards = Vec::with_capacity(similar.len());
        for record in &similar {
            similar_cards.push(self.record_to_card(record).await?);
        }

        Ok(PostDetailContext {
            title: post.title.clone(),
            path: post.detail_path(),
            share_path: format!("/posts/{}/share", post.id),
            published: format_human_date(post.publish.date()),
            body: post.body.clone(),
            tags: build_tag_badges(
                tags.iter()
                    .map(|tag| (tag.slug.as_str(), tag.name.as_str())),
            ),
            comments: comments.iter().map(comment_to_view).collect(),
            comment_count: comments.len(),
            similar_posts: similar_cards,
            comment_form: comment_form_view(form, errors),
            comment_posted,
        })
    }

    /// Published posts sharing at least one tag with `post_id`, ranked by
    /// shared-tag count then recency, truncated to the rail limit.
    pub async fn similar(&self, post_id: Uuid) -> Result<Vec<PostRecord>, QueryError> {
        let candidates = self.posts.list_sharing_tags(post_id).await?;
        Ok(rank_similar(candidates, SIMILAR_POSTS_LIMIT))
    }

    /// Trigram search over published posts. An empty or whitespace-only
    /// query short-circuits without consulting the store.
    pub async fn search(&self, form: &SearchForm) -> Result<SearchContext, QueryError> {
        let Some(query) = form.effective_query() else {
            return Ok(SearchContext {
                query: None,
                results: Vec::new(),
                searched: false,
            });
        };

        counter!("quaderno_searches_total").increment(1);
        let hits = self
            .posts
            .search_published(query, SEARCH_MIN_SIMILARITY)
            .await?;

        let mut results = Vec::with_capacity(hits.len());
        for SearchHit { post, similarity } in &hits {
            results.push(SearchResultView {
                post: self.record_to_card(post).await?,
                similarity: *similarity,
            });
        }

        Ok(SearchContext {
            query: Some(query.to_string()),
            results,
            searched: true,
        })
    }

    async fn record_to_card(&self, record: &PostRecord) -> Result<PostCard, QueryError> {
        let tags = self.tags.list_for_post(record.id).await?;
        Ok(PostCard {
            title: record.title.clone(),
            path: record.detail_path(),
            published: format_human_date(record.publish.date()),
            excerpt: excerpt_of(&record.body),
            badges: build_tag_badges(
                tags.iter()
                    .map(|tag| (tag.slug.as_str(), tag.name.as_str())),
            ),
        })
    }
}

/// Order similar-post candidates by shared-tag count descending, then
/// publish timestamp descending, then id descending for determinism.
pub fn rank_similar(mut candidates: Vec<SimilarCandidate>, limit: usize) -> Vec<PostRecord> {
    candidates.sort_by(|left, right| {
        right
            .same_tags
            .cmp(&left.same_tags)
            .then(right.post.publish.cmp(&left.post.publish))
            .then(right.post.id.cmp(&left.post.id))
    });
    candidates
        .into_iter()
        .take(limit)
        .map(|candidate| candidate.post)
        .collect()
}

fn calendar_day(year: i32, month: u8, day: u8) -> Option<Date> {
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

fn comment_to_view(comment: &CommentRecord) -> CommentView {
    CommentView {
        name: comment.name.clone(),
        body: comment.body.clone(),
        created: format_human_date(comment.created_at.date()),
    }
}

fn comment_form_view(form: &CommentForm, errors: &FormErrors) -> CommentFormView {
    CommentFormView {
        name: form.name.clone(),
        email: form.email.clone(),
        body: form.body.clone(),
        name_error: errors.message_for("name").map(str::to_string),
        email_error: errors.message_for("email").map(str::to_string),
        body_error: errors.message_for("body").map(str::to_string),
    }
}

/// First words of the body, cut at a character budget.
fn excerpt_of(body: &str) -> String {
    let mut excerpt = String::with_capacity(EXCERPT_MAX_CHARS);
    for word in body.split_whitespace() {
        if excerpt.chars().count() + word.chars().count() + 1 > EXCERPT_MAX_CHARS {
            excerpt.push('…');
            break;
        }
        if !excerpt.is_empty() {
            excerpt.push(' ');
        }
        excerpt.push_str(word);
    }
    excerpt
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn post(id: u128, publish: time::OffsetDateTime) -> PostRecord {
        PostRecord {
            id: Uuid::from_u128(id),
            title: format!("post-{id}"),
            slug: format!("post-{id}"),
            body: String::new(),
            publish,
            status: crate::domain::types::PostStatus::Published,
            created_at: publish,
            updated_at: publish,
        }
    }

    #[test]
    fn ranking_prefers_more_shared_tags() {
        let older = post(1, datetime!(2023-01-01 00:00 UTC));
        let newer = post(2, datetime!(2023-06-01 00:00 UTC));
        let ranked = rank_similar(
            vec![
                SimilarCandidate {
                    post: newer.clone(),
                    same_tags: 1,
                },
                SimilarCandidate {
                    post: older.clone(),
                    same_tags: 3,
                },
            ],
            4,
        );
        assert_eq!(ranked[0].id, older.id);
        assert_eq!(ranked[1].id, newer.id);
    }

    #[test]
    fn ranking_breaks_ties_by_recency() {
        let older = post(1, datetime!(2023-01-01 00:00 UTC));
        let newer = post(2, datetime!(2023-06-01 00:00 UTC));
        let ranked = rank_similar(
            vec![
                SimilarCandidate {
                    post: older.clone(),
                    same_tags: 1,
                },
                SimilarCandidate {
                    post: newer.clone(),
                    same_tags: 1,
                },
            ],
            4,
        );
        assert_eq!(ranked[0].id, newer.id);
        assert_eq!(ranked[1].id, older.id);
    }

    #[test]
    fn ranking_truncates_to_limit() {
        let when = datetime!(2023-01-01 00:00 UTC);
        let candidates = (1..=6)
            .map(|id| SimilarCandidate {
                post: post(id, when),
                same_tags: 1,
            })
            .collect();
        assert_eq!(rank_similar(candidates, 4).len(), 4);
    }

    #[test]
    fn invalid_calendar_days_resolve_to_none() {
        assert!(calendar_day(2023, 2, 30).is_none());
        assert!(calendar_day(2023, 13, 1).is_none());
        assert!(calendar_day(2023, 5, 1).is_some());
    }

    #[test]
    fn excerpt_cuts_at_word_boundary() {
        let body = "word ".repeat(100);
        let excerpt = excerpt_of(&body);
        assert!(excerpt.chars().count() <= EXCERPT_MAX_CHARS + 1);
        assert!(excerpt.ends_with('…'));
        assert!(!excerpt.contains("  "));
    }

    #[test]
    fn short_bodies_are_kept_whole() {
        assert_eq!(excerpt_of("a short body"), "a short body");
    }
}
