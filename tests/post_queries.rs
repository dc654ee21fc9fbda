mod support;

use std::sync::Arc;

use quaderno::application::forms::SearchForm;
use quaderno::application::posts::{PostQueryService, QueryError};
use support::{InMemoryStore, draft_post, published_post};
use time::macros::datetime;
use uuid::Uuid;

fn service(store: Arc<InMemoryStore>, page_size: u32) -> PostQueryService {
    PostQueryService::new(store.clone(), store.clone(), store, page_size)
}

fn seven_posts() -> Vec<quaderno::domain::entities::PostRecord> {
    (1..=7i64)
        .map(|id| {
            published_post(
                id as u128,
                &format!("post-{id}"),
                datetime!(2023-01-01 12:00 UTC) + time::Duration::days(id),
            )
        })
        .collect()
}

#[tokio::test]
async fn listing_is_newest_first() {
    let store = Arc::new(InMemoryStore::with_posts(seven_posts()));
    let queries = service(store, 3);

    let listing = queries.listing(None, None).await.expect("listing");
    assert_eq!(listing.page.number, 1);
    assert_eq!(listing.page.num_pages, 3);
    assert_eq!(listing.page.total, 7);
    let titles: Vec<_> = listing.posts.iter().map(|post| post.title.clone()).collect();
    assert_eq!(titles, vec!["Post 7", "Post 6", "Post 5"]);
}

#[tokio::test]
async fn tag_listing_excludes_untagged_and_draft_posts() {
    let mut store = InMemoryStore::with_posts(vec![
        published_post(1, "tagged", datetime!(2023-03-01 09:00 UTC)),
        published_post(2, "untagged", datetime!(2023-03-02 09:00 UTC)),
        draft_post(3, "draft-tagged", datetime!(2023-03-03 09:00 UTC)),
    ]);
    let rust = store.add_tag("rust", "Rust");
    store.attach_tag(Uuid::from_u128(1), rust);
    store.attach_tag(Uuid::from_u128(3), rust);

    let queries = service(Arc::new(store), 3);
    let listing = queries.listing(Some("rust"), None).await.expect("listing");

    assert_eq!(listing.posts.len(), 1);
    assert_eq!(listing.posts[0].title, "Post 1");
    assert_eq!(listing.base_path, "/tag/rust");
    assert_eq!(
        listing.active_tag.as_ref().map(|tag| tag.label.as_str()),
        Some("#Rust")
    );
}

#[tokio::test]
async fn unknown_tag_is_an_error() {
    let store = Arc::new(InMemoryStore::with_posts(seven_posts()));
    let queries = service(store, 3);

    let err = queries
        .listing(Some("missing"), None)
        .await
        .expect_err("unknown tag rejected");
    assert!(matches!(err, QueryError::UnknownTag));
}

#[tokio::test]
async fn non_numeric_page_behaves_like_the_first_page() {
    let store = Arc::new(InMemoryStore::with_posts(seven_posts()));
    let queries = service(store, 3);

    let garbled = queries.listing(None, Some("abc")).await.expect("listing");
    let first = queries.listing(None, Some("1")).await.expect("listing");

    assert_eq!(garbled.page.number, 1);
    assert_eq!(
        garbled.posts.iter().map(|p| &p.title).collect::<Vec<_>>(),
        first.posts.iter().map(|p| &p.title).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn past_the_end_page_clamps_to_the_last_page() {
    let store = Arc::new(InMemoryStore::with_posts(seven_posts()));
    let queries = service(store, 3);

    let clamped = queries.listing(None, Some("9999")).await.expect("listing");
    assert_eq!(clamped.page.number, 3);
    assert!(!clamped.page.has_next);
    assert!(clamped.page.has_previous);
    let titles: Vec<_> = clamped.posts.iter().map(|post| post.title.clone()).collect();
    assert_eq!(titles, vec!["Post 1"]);
}

#[tokio::test]
async fn similar_posts_rank_by_shared_tags_then_recency() {
    let mut store = InMemoryStore::with_posts(vec![
        published_post(1, "reference", datetime!(2023-05-01 09:00 UTC)),
        published_post(2, "two-shared-old", datetime!(2023-01-01 09:00 UTC)),
        published_post(3, "one-shared-new", datetime!(2023-06-01 09:00 UTC)),
        draft_post(4, "two-shared-draft", datetime!(2023-06-15 09:00 UTC)),
        published_post(5, "unrelated", datetime!(2023-06-20 09:00 UTC)),
    ]);
    let rust = store.add_tag("rust", "Rust");
    let web = store.add_tag("web", "Web");

    store.attach_tag(Uuid::from_u128(1), rust);
    store.attach_tag(Uuid::from_u128(1), web);
    store.attach_tag(Uuid::from_u128(2), rust);
    store.attach_tag(Uuid::from_u128(2), web);
    store.attach_tag(Uuid::from_u128(3), rust);
    store.attach_tag(Uuid::from_u128(4), rust);
    store.attach_tag(Uuid::from_u128(4), web);

    let queries = service(Arc::new(store), 3);
    let similar = queries.similar(Uuid::from_u128(1)).await.expect("similar");

    let slugs: Vec<_> = similar.iter().map(|post| post.slug.as_str()).collect();
    assert_eq!(slugs, vec!["two-shared-old", "one-shared-new"]);
}

#[tokio::test]
async fn blank_search_never_touches_the_store() {
    let mut store = InMemoryStore::with_posts(seven_posts());
    store.deny_search = true;
    let queries = service(Arc::new(store), 3);

    let context = queries
        .search(&SearchForm {
            query: Some("   ".to_string()),
        })
        .await
        .expect("search");

    assert!(!context.searched);
    assert!(context.results.is_empty());
    assert_eq!(context.query, None);
}

#[tokio::test]
async fn search_orders_results_by_similarity() {
    let mut posts = vec![
        published_post(1, "title-and-body", datetime!(2023-04-01 09:00 UTC)),
        published_post(2, "body-only", datetime!(2023-04-02 09:00 UTC)),
    ];
    posts[0].title = "All about ferrets".to_string();
    posts[0].body = "Ferrets are busy.".to_string();
    posts[1].body = "A ferret appears midway.".to_string();

    let queries = service(Arc::new(InMemoryStore::with_posts(posts)), 3);
    let context = queries
        .search(&SearchForm {
            query: Some("ferret".to_string()),
        })
        .await
        .expect("search");

    assert!(context.searched);
    assert_eq!(context.results.len(), 2);
    assert_eq!(context.results[0].post.title, "All about ferrets");
    assert!(context.results[0].similarity > context.results[1].similarity);
}

#[tokio::test]
async fn detail_lookup_requires_the_matching_day() {
    let store = Arc::new(InMemoryStore::with_posts(vec![published_post(
        1,
        "notes",
        datetime!(2023-05-01 09:00 UTC),
    )]));
    let queries = service(store, 3);

    let found = queries.find_post(2023, 5, 1, "notes").await.expect("query");
    assert!(found.is_some());

    let wrong_day = queries.find_post(2023, 5, 2, "notes").await.expect("query");
    assert!(wrong_day.is_none());

    let impossible = queries.find_post(2023, 2, 30, "notes").await.expect("query");
    assert!(impossible.is_none());
}
