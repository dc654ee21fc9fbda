//! Comment submission: validate, persist, report.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::forms::{CommentForm, FormErrors};
use crate::application::repos::{CommentsRepo, NewCommentParams, RepoError};
use crate::domain::entities::CommentRecord;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Outcome of a comment submission. Invalid input carries the normalized
/// form back so the page can re-render it inline.
pub enum CommentOutcome {
    Accepted(CommentRecord),
    Rejected { form: CommentForm, errors: FormErrors },
}

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentsRepo>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentsRepo>) -> Self {
        Self { comments }
    }

    /// Validate a submission against `post_id` and insert it when valid.
    /// Validation failures persist nothing.
    pub async fn submit(
        &self,
        post_id: Uuid,
        form: CommentForm,
    ) -> Result<CommentOutcome, CommentError> {
        let form = form.normalized();
        if let Err(errors) = form.check() {
            return Ok(CommentOutcome::Rejected { form, errors });
        }

        let record = self
            .comments
            .insert_comment(NewCommentParams {
                post_id,
                name: form.name,
                email: form.email,
                body: form.body,
            })
            .await?;

        counter!("quaderno_comments_submitted_total").increment(1);
        info!(
            target = "quaderno::comments",
            post_id = %post_id,
            comment_id = %record.id,
            "comment accepted"
        );

        Ok(CommentOutcome::Accepted(record))
    }
}
