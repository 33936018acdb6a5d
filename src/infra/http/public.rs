use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tracing::{debug, error};

use crate::{
    application::{
        content::{ContentService, HomeSnapshot},
        gate::{self, GateDecision},
        setup::SetupService,
        site::SiteViews,
    },
    infra::{
        assets::serve_static,
        cache::{HOME_PAGE_KEY, ResponseCache},
    },
    presentation::views::{
        ErrorPageView, IndexTemplate, LayoutChrome, LayoutContext, PostTemplate, RefreshPageView,
        RefreshTemplate, SetupPageView, SetupTemplate, render_not_found_response,
        render_template_response,
    },
};

use super::RouterState;

const FORCE_REFRESH_ENDPOINT: &str = "/api/force-refresh";

#[derive(Clone)]
pub struct HttpState {
    pub content: Arc<ContentService>,
    pub setup: Arc<SetupService>,
    pub views: Arc<SiteViews>,
    pub cache: ResponseCache,
    pub max_avatar_bytes: u64,
    pub status_poll_attempts: u32,
}

pub fn build_router() -> Router<RouterState> {
    Router::new()
        .route("/", get(index))
        .route("/setup", get(setup_page))
        .route("/refresh", get(refresh_page))
        .route("/blog/{slug}", get(post_detail))
        .route("/_health", get(health))
        .route("/static/{*path}", get(serve_static))
        .fallback(fallback)
}

async fn index(State(state): State<HttpState>) -> Response {
    // The gate runs on every load; only the rendered page is cached.
    let configuration = state.content.site_configuration().await;
    match gate::decide(configuration.is_some(), state.setup.recent()) {
        GateDecision::RedirectToSetup => {
            debug!(
                target = "folio::http::public::index",
                "no site configuration; redirecting to setup"
            );
            state.cache.invalidate_all().await;
            Redirect::to("/setup").into_response()
        }
        // Fallback content only; keep it out of the cache.
        GateDecision::RenderAfterRecentSetup => {
            let snapshot = state.content.home_snapshot_for(configuration).await;
            render_home(&state, &snapshot)
        }
        GateDecision::Render => {
            if let Some(cached) = state.cache.get(HOME_PAGE_KEY).await {
                return cached;
            }

            let snapshot = state.content.home_snapshot_for(configuration).await;
            let response = render_home(&state, &snapshot);
            match state.cache.store_response(HOME_PAGE_KEY, response).await {
                Ok(response) => response,
                Err((response, err)) => {
                    error!(
                        target = "folio::http::public::index",
                        error = %err,
                        "failed to cache home page"
                    );
                    response
                }
            }
        }
    }
}

fn render_home(state: &HttpState, snapshot: &HomeSnapshot) -> Response {
    let chrome = state.views.chrome(snapshot.configuration.as_ref());
    let view = LayoutContext::new(chrome, state.views.home(snapshot));
    render_template_response(IndexTemplate { view }, StatusCode::OK)
}

async fn setup_page(State(state): State<HttpState>) -> Response {
    if state.content.site_configuration().await.is_some() {
        return Redirect::to("/").into_response();
    }

    let chrome = state.views.chrome(None);
    let content = SetupPageView {
        max_avatar_label: format_megabytes(state.max_avatar_bytes),
        status_poll_attempts: state.status_poll_attempts,
    };
    let view = LayoutContext::new(chrome, content);
    render_template_response(SetupTemplate { view }, StatusCode::OK)
}

async fn refresh_page(State(state): State<HttpState>) -> Response {
    let configuration = state.content.site_configuration().await;
    let chrome = state.views.chrome(configuration.as_ref());
    let view = LayoutContext::new(
        chrome,
        RefreshPageView {
            endpoint: FORCE_REFRESH_ENDPOINT.to_string(),
        },
    );
    render_template_response(RefreshTemplate { view }, StatusCode::OK)
}

async fn post_detail(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    let (configuration, post) = tokio::join!(
        state.content.site_configuration(),
        state.content.blog_post(&slug),
    );
    let chrome = state.views.chrome(configuration.as_ref());

    match post {
        Some(post) => {
            let title = format!("{} | {}", post.title, chrome.meta.title);
            let chrome = LayoutChrome {
                meta: chrome.meta.with_title(title),
                ..chrome
            };
            let view = LayoutContext::new(chrome, state.views.post_detail(&post));
            render_template_response(PostTemplate { view }, StatusCode::OK)
        }
        None => render_not_found_response(chrome, ErrorPageView::post_not_found()),
    }
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn fallback(State(state): State<HttpState>) -> Response {
    let configuration = state.content.site_configuration().await;
    render_not_found_response(
        state.views.chrome(configuration.as_ref()),
        ErrorPageView::not_found(),
    )
}

fn format_megabytes(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else if bytes >= MIB {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    } else {
        format!("{} KB", bytes.div_ceil(1024))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_limit_label_is_human_readable() {
        assert_eq!(format_megabytes(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_megabytes(1536 * 1024), "1.5 MB");
        assert_eq!(format_megabytes(1000), "1 KB");
    }
}
