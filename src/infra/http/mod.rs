mod api;
mod middleware;
mod public;

pub use api::{ApiState, build_api_router};
pub use public::{HttpState, build_router};

use std::sync::Arc;

use axum::{Router, extract::FromRef, middleware as axum_middleware};

use crate::{
    application::{
        cms::ContentStore,
        content::ContentService,
        diagnostics::{CredentialPresence, DiagnosticsService},
        gate::RecentCompletion,
        provisioning::{ProvisioningDelays, ProvisioningService},
        setup::{SetupPolicy, SetupService},
        site::SiteViews,
    },
    config::Settings,
    infra::cache::ResponseCache,
};

use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct RouterState {
    pub http: HttpState,
    pub api: ApiState,
}

impl RouterState {
    /// Wires every service around one content store.
    pub fn new(store: Arc<dyn ContentStore>, store_kind: &'static str, settings: &Settings) -> Self {
        let provisioning = ProvisioningService::new(
            store.clone(),
            ProvisioningDelays {
                after_entry: settings.provisioning.entry_delay,
                between_publishes: settings.provisioning.publish_delay,
            },
        );
        let content = Arc::new(ContentService::new(
            store.clone(),
            provisioning.clone(),
            settings.provisioning.auto,
        ));
        let recent = Arc::new(RecentCompletion::new(settings.setup.recent_window));
        let max_avatar_bytes = settings.uploads.max_avatar_bytes.get();
        let setup = Arc::new(SetupService::new(
            store.clone(),
            content.clone(),
            recent,
            SetupPolicy {
                poll_attempts: settings.setup.poll_attempts,
                poll_interval: settings.setup.poll_interval,
                max_avatar_bytes: usize::try_from(max_avatar_bytes).unwrap_or(usize::MAX),
            },
        ));
        let diagnostics = Arc::new(DiagnosticsService::new(
            store.clone(),
            store_kind,
            content.clone(),
            provisioning,
            CredentialPresence::of(&settings.cms),
        ));
        let cache = ResponseCache::new(settings.cache.home_ttl);

        let http = HttpState {
            content,
            setup: setup.clone(),
            views: Arc::new(SiteViews::new(settings.cms.api_key.clone())),
            cache: cache.clone(),
            max_avatar_bytes,
            status_poll_attempts: settings.setup.poll_attempts.saturating_mul(2).max(1),
        };
        let api = ApiState {
            store,
            setup,
            diagnostics,
            cache,
            max_request_bytes: usize::try_from(settings.uploads.max_request_bytes.get())
                .unwrap_or(usize::MAX),
        };

        Self { http, api }
    }
}

impl FromRef<RouterState> for HttpState {
    fn from_ref(state: &RouterState) -> Self {
        state.http.clone()
    }
}

impl FromRef<RouterState> for ApiState {
    fn from_ref(state: &RouterState) -> Self {
        state.api.clone()
    }
}

/// Public pages and the JSON API behind shared request logging.
pub fn build_app(state: RouterState) -> Router {
    let max_request_bytes = state.api.max_request_bytes;
    build_router()
        .merge(build_api_router(max_request_bytes))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
