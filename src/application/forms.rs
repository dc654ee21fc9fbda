//! Visitor-facing form payloads and their validation rules.
//!
//! Validation failures never abort the request: handlers re-render the page
//! with the submitted values and per-field messages, and nothing is
//! persisted or sent.

use serde::Deserialize;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Per-field validation messages in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    errors: Vec<FieldError>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| entry.message.as_str())
    }

    fn collect(source: &ValidationErrors, order: &[&'static str]) -> Self {
        let by_field = source.field_errors();
        let mut errors = Vec::new();
        for field in order {
            if let Some(field_errors) = by_field.get(*field)
                && let Some(first) = field_errors.first()
            {
                let message = first
                    .message
                    .as_ref()
                    .map(|cow| cow.to_string())
                    .unwrap_or_else(|| format!("invalid value for `{field}`"));
                errors.push(FieldError { field, message });
            }
        }
        Self { errors }
    }
}

/// Comment submission on a post detail page.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CommentForm {
    #[validate(length(min = 1, max = 80, message = "Enter your name (80 characters max)."))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, max = 2000, message = "Enter a comment (2000 characters max)."))]
    pub body: String,
}

impl CommentForm {
    const FIELD_ORDER: &'static [&'static str] = &["name", "email", "body"];

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.body = self.body.trim().to_string();
        self
    }

    pub fn check(&self) -> Result<(), FormErrors> {
        self.validate()
            .map_err(|errors| FormErrors::collect(&errors, Self::FIELD_ORDER))
    }
}

/// "Share this post by email" submission.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ShareForm {
    #[validate(length(min = 1, max = 80, message = "Enter your name (80 characters max)."))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(email(message = "Enter a valid recipient address."))]
    pub to: String,
    #[validate(length(max = 2000, message = "Comments are limited to 2000 characters."))]
    pub comments: String,
}

impl ShareForm {
    const FIELD_ORDER: &'static [&'static str] = &["name", "email", "to", "comments"];

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.to = self.to.trim().to_string();
        self.comments = self.comments.trim().to_string();
        self
    }

    pub fn check(&self) -> Result<(), FormErrors> {
        self.validate()
            .map_err(|errors| FormErrors::collect(&errors, Self::FIELD_ORDER))
    }
}

/// Free-text search query parameter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchForm {
    pub query: Option<String>,
}

impl SearchForm {
    /// The trimmed query, or `None` when absent or whitespace-only.
    pub fn effective_query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(name: &str, email: &str, body: &str) -> CommentForm {
        CommentForm {
            name: name.to_string(),
            email: email.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn valid_comment_passes() {
        let form = comment("Ada", "ada@example.com", "Great read.").normalized();
        assert!(form.check().is_ok());
    }

    #[test]
    fn blank_fields_are_rejected_in_order() {
        let form = comment("  ", "not-an-email", "").normalized();
        let errors = form.check().expect_err("invalid comment rejected");
        let fields: Vec<_> = errors.iter().map(|entry| entry.field).collect();
        assert_eq!(fields, vec!["name", "email", "body"]);
    }

    #[test]
    fn whitespace_only_body_is_rejected_after_normalization() {
        let form = comment("Ada", "ada@example.com", "   ").normalized();
        let errors = form.check().expect_err("blank body rejected");
        assert!(errors.message_for("body").is_some());
        assert!(errors.message_for("name").is_none());
    }

    #[test]
    fn share_form_requires_both_addresses() {
        let form = ShareForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            to: "not-an-address".to_string(),
            comments: String::new(),
        }
        .normalized();
        let errors = form.check().expect_err("invalid recipient rejected");
        assert_eq!(errors.message_for("to"), Some("Enter a valid recipient address."));
        assert!(errors.message_for("email").is_none());
    }

    #[test]
    fn share_comments_are_optional() {
        let form = ShareForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            to: "friend@example.com".to_string(),
            comments: String::new(),
        };
        assert!(form.check().is_ok());
    }

    #[test]
    fn search_query_trims_to_none() {
        assert_eq!(SearchForm { query: None }.effective_query(), None);
        assert_eq!(
            SearchForm {
                query: Some("   ".to_string())
            }
            .effective_query(),
            None
        );
        assert_eq!(
            SearchForm {
                query: Some(" django ".to_string())
            }
            .effective_query(),
            Some("django")
        );
    }
}
