//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::PostStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub publish: OffsetDateTime,
    pub status: PostStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl PostRecord {
    /// Canonical detail path derived from the publish day (UTC) and slug.
    pub fn detail_path(&self) -> String {
        let date = self.publish.date();
        format!(
            "/{year}/{month}/{day}/{slug}",
            year = date.year(),
            month = u8::from(date.month()),
            day = date.day(),
            slug = self.slug
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagRecord {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub name: String,
    pub email: String,
    pub body: String,
    pub created_at: OffsetDateTime,
    pub active: bool,
}
