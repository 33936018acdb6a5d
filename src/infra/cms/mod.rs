//! CMS adapters behind [`ContentStore`](crate::application::cms::ContentStore).

pub mod contentstack;
pub mod memory;

use std::sync::Arc;

use crate::{
    application::cms::ContentStore,
    config::{CmsMode, CmsSettings},
    infra::error::InfraError,
};

use self::{contentstack::ContentstackClient, memory::MemoryStore};

/// Builds the configured store along with a short name for diagnostics.
pub fn build_store(settings: &CmsSettings) -> Result<(Arc<dyn ContentStore>, &'static str), InfraError> {
    match settings.mode {
        CmsMode::Contentstack => Ok((Arc::new(ContentstackClient::new(settings)?), "contentstack")),
        CmsMode::Memory => Ok((Arc::new(MemoryStore::seeded()), "memory")),
    }
}
