use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use folio::application::cms::ContentStore;
use folio::config::Settings;
use folio::domain::content_types::BLOG_POST;
use folio::infra::cms::memory::MemoryStore;
use folio::infra::http::{RouterState, build_app};

fn test_settings() -> Settings {
    let mut settings = Settings::defaults().expect("default settings");
    settings.provisioning.entry_delay = Duration::ZERO;
    settings.provisioning.publish_delay = Duration::ZERO;
    settings.setup.poll_attempts = 1;
    settings.setup.poll_interval = Duration::ZERO;
    settings
}

fn app(store: MemoryStore) -> Router {
    build_app(RouterState::new(
        Arc::new(store),
        "memory",
        &test_settings(),
    ))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

async fn text_body(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

#[tokio::test]
async fn health_returns_no_content() {
    let response = app(MemoryStore::new())
        .oneshot(get("/_health"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn unconfigured_home_redirects_to_setup() {
    let response = app(MemoryStore::new())
        .oneshot(get("/"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/setup")
    );
}

#[tokio::test]
async fn configured_home_renders_owner_details() {
    let response = app(MemoryStore::seeded())
        .oneshot(get("/"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let html = text_body(response).await;
    assert!(html.contains("My Personal Site"));
    assert!(html.contains("Getting Started with Headless CMS"));
    assert!(html.contains("Edit Content"));
    assert!(html.contains(r#"href="https://app.contentstack.com""#));
    assert!(html.contains(r#"data-nav-section="portfolio""#));
}

#[tokio::test]
async fn edit_link_points_at_configured_stack() {
    let mut settings = test_settings();
    settings.cms.api_key = Some("blt-stack".into());
    let router = build_app(RouterState::new(
        Arc::new(MemoryStore::seeded()),
        "memory",
        &settings,
    ));

    let html = text_body(router.clone().oneshot(get("/")).await.expect("response")).await;
    assert!(html.contains("https://app.contentstack.com/stack/blt-stack/dashboard"));
    assert!(html.contains("/static/nav.js"));

    let response = router
        .oneshot(get("/static/nav.js"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn setup_page_redirects_once_configured() {
    let response = app(MemoryStore::seeded())
        .oneshot(get("/setup"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app(MemoryStore::new())
        .oneshot(get("/setup"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = text_body(response).await;
    assert!(html.contains("/api/setup"));
}

#[tokio::test]
async fn setup_rejects_missing_fields() {
    let response = app(MemoryStore::new())
        .oneshot(post_json("/api/setup", json!({"ownerName": "Ada"})))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "invalid_input");
}

#[tokio::test]
async fn setup_completes_then_conflicts() {
    let router = app(MemoryStore::new());

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/setup",
            json!({"ownerName": "Ada Lovelace", "siteName": "Notes", "bio": "Engines"}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert!(body["entryUid"].as_str().is_some_and(|uid| !uid.is_empty()));

    let response = router
        .clone()
        .oneshot(get("/"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(post_json(
            "/api/setup",
            json!({"owner_name": "Ada", "site_name": "Again"}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "already_completed");
}

#[tokio::test]
async fn seeded_store_refuses_second_setup() {
    let response = app(MemoryStore::seeded())
        .oneshot(post_json(
            "/api/setup",
            json!({"ownerName": "Ada", "siteName": "Notes"}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn setup_status_is_never_cached() {
    let response = app(MemoryStore::seeded())
        .oneshot(get("/api/setup/status"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::CACHE_CONTROL).and_then(|v| v.to_str().ok()),
        Some("no-cache, no-store, must-revalidate")
    );
    assert_eq!(
        headers.get(header::PRAGMA).and_then(|v| v.to_str().ok()),
        Some("no-cache")
    );
    assert_eq!(
        headers.get(header::EXPIRES).and_then(|v| v.to_str().ok()),
        Some("0")
    );

    let body = json_body(response).await;
    assert_eq!(body["setupCompleted"], true);
    assert_eq!(body["siteConfigExists"], true);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn unknown_asset_is_not_found() {
    let response = app(MemoryStore::seeded())
        .oneshot(get("/api/asset/blt-missing"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn force_refresh_reports_success() {
    let router = app(MemoryStore::seeded());
    router
        .clone()
        .oneshot(get("/"))
        .await
        .expect("warm cache");

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/force-refresh")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok()),
        Some("no-cache, no-store, must-revalidate")
    );
    assert_eq!(
        response.headers().get(header::PRAGMA).and_then(|v| v.to_str().ok()),
        Some("no-cache")
    );
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Cleared 1 cached page(s)");
}

#[tokio::test]
async fn home_page_shows_new_posts_once_cache_expires() {
    let store = Arc::new(MemoryStore::seeded());
    let mut settings = test_settings();
    settings.cache.home_ttl = Duration::from_millis(100);
    let router = build_app(RouterState::new(store.clone(), "memory", &settings));

    let html = text_body(router.clone().oneshot(get("/")).await.expect("response")).await;
    assert!(!html.contains("Brand New Post"));

    let created = store
        .create_entry(
            BLOG_POST,
            &json!({
                "title": "Brand New Post",
                "slug": "brand-new",
                "excerpt": "Fresh off the press.",
                "published_date": "2030-01-01T00:00:00.000Z"
            }),
        )
        .await
        .expect("post");
    store
        .publish_entry(BLOG_POST, &created.uid)
        .await
        .expect("publish");

    let html = text_body(router.clone().oneshot(get("/")).await.expect("response")).await;
    assert!(!html.contains("Brand New Post"), "served from cache within the TTL");

    tokio::time::sleep(Duration::from_millis(150)).await;
    let response = router.oneshot(get("/")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(text_body(response).await.contains("Brand New Post"));
}

#[tokio::test]
async fn disabled_cache_serves_every_publish_immediately() {
    let store = Arc::new(MemoryStore::seeded());
    let mut settings = test_settings();
    settings.cache.home_ttl = Duration::ZERO;
    let router = build_app(RouterState::new(store.clone(), "memory", &settings));

    router.clone().oneshot(get("/")).await.expect("response");
    let created = store
        .create_entry(
            BLOG_POST,
            &json!({
                "title": "Brand New Post",
                "slug": "brand-new",
                "published_date": "2030-01-01T00:00:00.000Z"
            }),
        )
        .await
        .expect("post");
    store
        .publish_entry(BLOG_POST, &created.uid)
        .await
        .expect("publish");

    let html = text_body(router.oneshot(get("/")).await.expect("response")).await;
    assert!(html.contains("Brand New Post"));
}

#[tokio::test]
async fn blog_post_renders_and_missing_slug_is_404() {
    let router = app(MemoryStore::seeded());

    let response = router
        .clone()
        .oneshot(get("/blog/getting-started-headless-cms"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = text_body(response).await;
    assert!(html.contains("Getting Started with Headless CMS"));

    let response = router
        .oneshot(get("/blog/no-such-post"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn debug_endpoints_report_presence_only() {
    let router = app(MemoryStore::seeded());

    let response = router
        .clone()
        .oneshot(get("/api/debug-setup"))
        .await
        .expect("response");
    let body = json_body(response).await;
    assert_eq!(body["contentTypesExist"], true);
    assert_eq!(body["setupCompleted"], true);
    assert_eq!(body["recentlyCompleted"], false);

    let response = router
        .oneshot(get("/api/debug-config"))
        .await
        .expect("response");
    let body = json_body(response).await;
    assert_eq!(body["siteConfigExists"], true);
    assert_eq!(body["credentials"]["apiKey"], false);
}

#[tokio::test]
async fn unknown_route_renders_not_found_page() {
    let response = app(MemoryStore::seeded())
        .oneshot(get("/nowhere"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let html = text_body(response).await;
    assert!(html.contains("Page Not Found"));
}
