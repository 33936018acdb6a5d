use std::sync::Arc;

use crate::application::{
    cms::ContentStore, diagnostics::DiagnosticsService, setup::SetupService,
};
use crate::infra::cache::ResponseCache;

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn ContentStore>,
    pub setup: Arc<SetupService>,
    pub diagnostics: Arc<DiagnosticsService>,
    pub cache: ResponseCache,
    pub max_request_bytes: usize,
}
