use crate::application::error::{ErrorReport, HttpError};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(site: SiteChrome) -> Response {
    let content = ErrorPageView::not_found();
    let view = LayoutContext::new(site, content);
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// Site-wide chrome shared by every rendered page.
#[derive(Clone)]
pub struct SiteChrome {
    pub title: String,
    pub tagline: String,
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub site: SiteChrome,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(site: SiteChrome, content: T) -> Self {
        Self { site, content }
    }
}

#[derive(Clone, Debug)]
pub struct TagBadge {
    pub value: String,
    pub label: String,
}

#[derive(Clone, Debug)]
pub struct PostCard {
    pub title: String,
    pub path: String,
    pub published: String,
    pub excerpt: String,
    pub badges: Vec<TagBadge>,
}

#[derive(Debug)]
pub struct ListingContext {
    pub posts: Vec<PostCard>,
    pub page: crate::application::pagination::PageInfo,
    pub active_tag: Option<TagBadge>,
    pub base_path: String,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<ListingContext>,
}

#[derive(Clone)]
pub struct CommentView {
    pub name: String,
    pub body: String,
    pub created: String,
}

#[derive(Clone, Default)]
pub struct CommentFormView {
    pub name: String,
    pub email: String,
    pub body: String,
    pub name_error: Option<String>,
    pub email_error: Option<String>,
    pub body_error: Option<String>,
}

pub struct PostDetailContext {
    pub title: String,
    pub path: String,
    pub share_path: String,
    pub published: String,
    pub body: String,
    pub tags: Vec<TagBadge>,
    pub comments: Vec<CommentView>,
    pub comment_count: usize,
    pub similar_posts: Vec<PostCard>,
    pub comment_form: CommentFormView,
    pub comment_posted: bool,
}

#[derive(Template)]
#[template(path = "detail.html")]
pub struct PostDetailTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

#[derive(Clone, Default)]
pub struct ShareFormView {
    pub name: String,
    pub email: String,
    pub to: String,
    pub comments: String,
    pub name_error: Option<String>,
    pub email_error: Option<String>,
    pub to_error: Option<String>,
    pub comments_error: Option<String>,
}

pub struct ShareContext {
    pub post_title: String,
    pub post_path: String,
    pub form: ShareFormView,
    pub sent: bool,
}

#[derive(Template)]
#[template(path = "share.html")]
pub struct ShareTemplate {
    pub view: LayoutContext<ShareContext>,
}

#[derive(Clone)]
pub struct SearchResultView {
    pub post: PostCard,
    pub similarity: f32,
}

pub struct SearchContext {
    pub query: Option<String>,
    pub results: Vec<SearchResultView>,
    pub searched: bool,
}

#[derive(Template)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub view: LayoutContext<SearchContext>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist. Try returning to the homepage."
                .to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

pub fn build_tag_badges<'a, T>(tags: T) -> Vec<TagBadge>
where
    T: IntoIterator<Item = (&'a str, &'a str)>,
{
    tags.into_iter()
        .map(|(value, name)| TagBadge {
            value: value.to_string(),
            label: format!("#{}", name),
        })
        .collect()
}
