//! Share-by-email: resolve the post, compose the message, hand it to the
//! mail transport.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::forms::{FormErrors, ShareForm};
use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::entities::PostRecord;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mail address: {0}")]
    InvalidAddress(String),
    #[error("mail transport error: {0}")]
    Transport(String),
}

/// Outgoing plain-text message handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery seam. Transport failures propagate to the HTTP boundary
/// unchanged; the service does not retry or swallow them.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("post not found")]
    UnknownPost,
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Mail(#[from] MailError),
}

/// Outcome of a share submission for re-rendering the form page.
#[derive(Debug)]
pub enum ShareOutcome {
    Sent,
    Rejected { form: ShareForm, errors: FormErrors },
}

#[derive(Clone)]
pub struct ShareService {
    posts: Arc<dyn PostsRepo>,
    mailer: Arc<dyn Mailer>,
    public_site_url: String,
}

impl ShareService {
    pub fn new(posts: Arc<dyn PostsRepo>, mailer: Arc<dyn Mailer>, public_site_url: String) -> Self {
        Self {
            posts,
            mailer,
            public_site_url,
        }
    }

    /// The published post a share page is about, or `UnknownPost`.
    pub async fn resolve_post(&self, post_id: Uuid) -> Result<PostRecord, ShareError> {
        self.posts
            .find_published_by_id(post_id)
            .await?
            .ok_or(ShareError::UnknownPost)
    }

    /// Validate a share submission and deliver the recommendation email.
    /// Validation failures send nothing.
    pub async fn share(&self, post_id: Uuid, form: ShareForm) -> Result<ShareOutcome, ShareError> {
        let post = self.resolve_post(post_id).await?;

        let form = form.normalized();
        if let Err(errors) = form.check() {
            return Ok(ShareOutcome::Rejected { form, errors });
        }

        let email = compose_share_email(&post, &form, &self.public_site_url);
        self.mailer.send(email).await?;

        counter!("quaderno_share_emails_sent_total").increment(1);
        info!(
            target = "quaderno::share",
            post_id = %post.id,
            "share email sent"
        );

        Ok(ShareOutcome::Sent)
    }
}

/// Build the recommendation message from a validated share form.
pub fn compose_share_email(post: &PostRecord, form: &ShareForm, site_url: &str) -> OutgoingEmail {
    let post_url = absolute_url(site_url, &post.detail_path());
    let subject = format!("{} recommends you read {}", form.name, post.title);
    let body = format!(
        "Read {title} at {post_url}\n\n{name}'s comments: {comments}",
        title = post.title,
        name = form.name,
        comments = form.comments,
    );
    OutgoingEmail {
        to: form.to.clone(),
        subject,
        body,
    }
}

fn absolute_url(site_url: &str, path: &str) -> String {
    let root = site_url.trim_end_matches('/');
    format!("{root}{path}")
}
