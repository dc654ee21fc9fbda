use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    application::{
        comments::{CommentError, CommentOutcome, CommentService},
        error::{ErrorReport, HttpError},
        forms::{CommentForm, FormErrors, SearchForm, ShareForm},
        posts::{PostQueryService, QueryError},
        share::{ShareError, ShareOutcome, ShareService},
    },
    domain::entities::PostRecord,
    infra::db::PostgresRepositories,
    presentation::views::{
        IndexTemplate, LayoutContext, PostDetailTemplate, SearchTemplate, ShareContext,
        ShareFormView, ShareTemplate, SiteChrome, render_not_found_response,
        render_template_response,
    },
};

use super::{
    db_health_response,
    middleware::{log_responses, set_request_context},
    repo_error_to_http,
};

#[derive(Clone)]
pub struct HttpState {
    pub queries: Arc<PostQueryService>,
    pub comments: Arc<CommentService>,
    pub share: Arc<ShareService>,
    pub db: Arc<PostgresRepositories>,
    pub site: SiteChrome,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/tag/{slug}", get(tag_index))
        .route("/search", get(search))
        .route("/posts/{id}/share", get(share_form).post(share_submit))
        .route(
            "/{year}/{month}/{day}/{slug}",
            get(post_detail).post(submit_comment),
        )
        .route("/_health/db", get(public_health))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageQuery {
    page: Option<String>,
}

async fn index(State(state): State<HttpState>, Query(query): Query<PageQuery>) -> Response {
    match state.queries.listing(None, query.page.as_deref()).await {
        Ok(content) => render_template_response(
            IndexTemplate {
                view: LayoutContext::new(state.site.clone(), content),
            },
            StatusCode::OK,
        ),
        Err(err) => query_error_to_response("infra::http::public::index", err, state.site.clone()),
    }
}

async fn tag_index(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    match state
        .queries
        .listing(Some(&slug), query.page.as_deref())
        .await
    {
        Ok(content) => render_template_response(
            IndexTemplate {
                view: LayoutContext::new(state.site.clone(), content),
            },
            StatusCode::OK,
        ),
        Err(err) => {
            query_error_to_response("infra::http::public::tag_index", err, state.site.clone())
        }
    }
}

async fn post_detail(
    State(state): State<HttpState>,
    Path(parts): Path<(String, String, String, String)>,
) -> Response {
    let (year_raw, month_raw, day_raw, slug) = parts;
    let Some((year, month, day)) = parse_date_parts(&year_raw, &month_raw, &day_raw) else {
        return render_not_found_response(state.site.clone());
    };

    match state.queries.find_post(year, month, day, &slug).await {
        Ok(Some(post)) => {
            render_detail(
                &state,
                &post,
                &CommentForm::default(),
                &FormErrors::default(),
                false,
            )
            .await
        }
        Ok(None) => render_not_found_response(state.site.clone()),
        Err(err) => {
            query_error_to_response("infra::http::public::post_detail", err, state.site.clone())
        }
    }
}

async fn submit_comment(
    State(state): State<HttpState>,
    Path(parts): Path<(String, String, String, String)>,
    Form(form): Form<CommentForm>,
) -> Response {
    const SOURCE: &str = "infra::http::public::submit_comment";

    let (year_raw, month_raw, day_raw, slug) = parts;
    let Some((year, month, day)) = parse_date_parts(&year_raw, &month_raw, &day_raw) else {
        return render_not_found_response(state.site.clone());
    };

    let post = match state.queries.find_post(year, month, day, &slug).await {
        Ok(Some(post)) => post,
        Ok(None) => return render_not_found_response(state.site.clone()),
        Err(err) => return query_error_to_response(SOURCE, err, state.site.clone()),
    };

    match state.comments.submit(post.id, form).await {
        Ok(CommentOutcome::Accepted(_)) => {
            render_detail(
                &state,
                &post,
                &CommentForm::default(),
                &FormErrors::default(),
                true,
            )
            .await
        }
        Ok(CommentOutcome::Rejected { form, errors }) => {
            render_detail(&state, &post, &form, &errors, false).await
        }
        Err(CommentError::Repo(err)) => repo_error_to_http(SOURCE, err).into_response(),
    }
}

async fn render_detail(
    state: &HttpState,
    post: &PostRecord,
    form: &CommentForm,
    errors: &FormErrors,
    comment_posted: bool,
) -> Response {
    match state
        .queries
        .detail_context(post, form, errors, comment_posted)
        .await
    {
        Ok(content) => render_template_response(
            PostDetailTemplate {
                view: LayoutContext::new(state.site.clone(), content),
            },
            StatusCode::OK,
        ),
        Err(err) => {
            query_error_to_response("infra::http::public::post_detail", err, state.site.clone())
        }
    }
}

async fn share_form(State(state): State<HttpState>, Path(id): Path<Uuid>) -> Response {
    const SOURCE: &str = "infra::http::public::share_form";

    match state.share.resolve_post(id).await {
        Ok(post) => render_share_page(&state, &post, ShareFormView::default(), false),
        Err(err) => share_error_to_response(SOURCE, err, state.site.clone()),
    }
}

async fn share_submit(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
    Form(form): Form<ShareForm>,
) -> Response {
    const SOURCE: &str = "infra::http::public::share_submit";

    let post = match state.share.resolve_post(id).await {
        Ok(post) => post,
        Err(err) => return share_error_to_response(SOURCE, err, state.site.clone()),
    };

    let form = form.normalized();
    match state.share.share(id, form.clone()).await {
        Ok(ShareOutcome::Sent) => render_share_page(
            &state,
            &post,
            share_form_view(&form, &FormErrors::default()),
            true,
        ),
        Ok(ShareOutcome::Rejected { form, errors }) => {
            render_share_page(&state, &post, share_form_view(&form, &errors), false)
        }
        Err(err) => share_error_to_response(SOURCE, err, state.site.clone()),
    }
}

fn render_share_page(
    state: &HttpState,
    post: &PostRecord,
    form: ShareFormView,
    sent: bool,
) -> Response {
    let content = ShareContext {
        post_title: post.title.clone(),
        post_path: post.detail_path(),
        form,
        sent,
    };
    render_template_response(
        ShareTemplate {
            view: LayoutContext::new(state.site.clone(), content),
        },
        StatusCode::OK,
    )
}

fn share_form_view(form: &ShareForm, errors: &FormErrors) -> ShareFormView {
    ShareFormView {
        name: form.name.clone(),
        email: form.email.clone(),
        to: form.to.clone(),
        comments: form.comments.clone(),
        name_error: errors.message_for("name").map(str::to_string),
        email_error: errors.message_for("email").map(str::to_string),
        to_error: errors.message_for("to").map(str::to_string),
        comments_error: errors.message_for("comments").map(str::to_string),
    }
}

async fn search(State(state): State<HttpState>, Query(form): Query<SearchForm>) -> Response {
    match state.queries.search(&form).await {
        Ok(content) => render_template_response(
            SearchTemplate {
                view: LayoutContext::new(state.site.clone(), content),
            },
            StatusCode::OK,
        ),
        Err(err) => query_error_to_response("infra::http::public::search", err, state.site.clone()),
    }
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.db.health_check().await)
}

async fn fallback(State(state): State<HttpState>) -> Response {
    render_not_found_response(state.site.clone())
}

fn parse_date_parts(year: &str, month: &str, day: &str) -> Option<(i32, u8, u8)> {
    Some((year.parse().ok()?, month.parse().ok()?, day.parse().ok()?))
}

fn query_error_to_response(source: &'static str, err: QueryError, site: SiteChrome) -> Response {
    match err {
        QueryError::UnknownTag => {
            let mut response = render_not_found_response(site);
            ErrorReport::from_message(source, StatusCode::NOT_FOUND, "Unknown tag")
                .attach(&mut response);
            response
        }
        QueryError::Repo(err) => repo_error_to_http(source, err).into_response(),
    }
}

fn share_error_to_response(source: &'static str, err: ShareError, site: SiteChrome) -> Response {
    match err {
        ShareError::UnknownPost => {
            let mut response = render_not_found_response(site);
            ErrorReport::from_message(source, StatusCode::NOT_FOUND, "Unknown post")
                .attach(&mut response);
            response
        }
        ShareError::Repo(err) => repo_error_to_http(source, err).into_response(),
        ShareError::Mail(err) => HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Email delivery failed",
            &err,
        )
        .into_response(),
    }
}
