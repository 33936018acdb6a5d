//! Payloads for the debug endpoints.
//!
//! Credentials are only ever reported as present or absent.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::{
    application::{
        cms::{CmsError, ContentStore, EntryQuery},
        content::ContentService,
        normalize::first_entry,
        provisioning::ProvisioningService,
    },
    config::CmsSettings,
    domain::content_types::SITE_CONFIGURATION,
};

/// Which CMS settings are configured, without their values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPresence {
    pub api_key: bool,
    pub delivery_token: bool,
    pub management_token: bool,
    pub api_host: bool,
    pub cdn_host: bool,
    pub environment: bool,
}

impl CredentialPresence {
    pub fn of(settings: &CmsSettings) -> Self {
        let non_empty = |value: &str| !value.trim().is_empty();
        Self {
            api_key: settings.api_key.is_some(),
            delivery_token: settings.delivery_token.is_some(),
            management_token: settings.management_token.is_some(),
            api_host: non_empty(&settings.api_host),
            cdn_host: non_empty(&settings.cdn_host),
            environment: non_empty(&settings.environment),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    pub ok: bool,
    pub entry: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugReport {
    pub credentials: CredentialPresence,
    pub store: &'static str,
    pub delivery: LookupResult,
    pub management: LookupResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
    pub uid: String,
    pub site_name: String,
    pub owner_name: String,
    pub has_avatar: bool,
    pub setup_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugConfigReport {
    pub site_config_exists: bool,
    pub site_config: Option<ConfigSummary>,
    pub credentials: CredentialPresence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugSetupReport {
    pub content_types_exist: bool,
    pub site_config_exists: bool,
    pub setup_completed: bool,
    pub recently_completed: bool,
}

pub struct DiagnosticsService {
    store: Arc<dyn ContentStore>,
    store_kind: &'static str,
    content: Arc<ContentService>,
    provisioning: ProvisioningService,
    credentials: CredentialPresence,
}

impl DiagnosticsService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        store_kind: &'static str,
        content: Arc<ContentService>,
        provisioning: ProvisioningService,
        credentials: CredentialPresence,
    ) -> Self {
        Self {
            store,
            store_kind,
            content,
            provisioning,
            credentials,
        }
    }

    /// Raw configuration lookups against both APIs, bypassing fallbacks.
    pub async fn debug(&self) -> DebugReport {
        let query = EntryQuery::new(SITE_CONFIGURATION).newest_first("updated_at");
        let (delivery, management) = tokio::join!(
            self.store.delivery_entries(&query),
            self.store.management_entries(&query),
        );

        DebugReport {
            credentials: self.credentials,
            store: self.store_kind,
            delivery: lookup(delivery),
            management: lookup(management),
        }
    }

    pub async fn debug_config(&self) -> DebugConfigReport {
        let configuration = self.content.site_configuration().await;
        DebugConfigReport {
            site_config_exists: configuration.is_some(),
            site_config: configuration.map(|config| ConfigSummary {
                has_avatar: config.avatar_photo.is_some(),
                setup_completed: config.setup_completed.is_set(),
                uid: config.uid,
                site_name: config.site_name,
                owner_name: config.owner_name,
            }),
            credentials: self.credentials,
        }
    }

    pub async fn debug_setup(&self, recently_completed: bool) -> DebugSetupReport {
        let content_types_exist = self.provisioning.content_types_exist().await;
        let configuration = if content_types_exist {
            self.content.site_configuration().await
        } else {
            None
        };

        DebugSetupReport {
            content_types_exist,
            site_config_exists: configuration.is_some(),
            setup_completed: configuration.is_some(),
            recently_completed,
        }
    }
}

fn lookup(result: Result<Value, CmsError>) -> LookupResult {
    match result {
        Ok(payload) => LookupResult {
            ok: true,
            entry: first_entry(&payload).cloned().map(Value::Object),
            error: None,
        },
        Err(err) => LookupResult {
            ok: false,
            entry: None,
            error: Some(err.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{application::provisioning::ProvisioningDelays, infra::cms::memory::MemoryStore};

    const NONE_CONFIGURED: CredentialPresence = CredentialPresence {
        api_key: false,
        delivery_token: false,
        management_token: false,
        api_host: true,
        cdn_host: true,
        environment: true,
    };

    fn diagnostics(store: Arc<MemoryStore>) -> DiagnosticsService {
        let provisioning = ProvisioningService::new(store.clone(), ProvisioningDelays::NONE);
        let content = Arc::new(ContentService::new(store.clone(), provisioning.clone(), false));
        DiagnosticsService::new(store, "memory", content, provisioning, NONE_CONFIGURED)
    }

    #[tokio::test]
    async fn seeded_store_reports_configuration_from_both_apis() {
        let report = diagnostics(Arc::new(MemoryStore::seeded())).debug().await;

        assert!(report.delivery.ok);
        assert!(report.delivery.entry.is_some());
        assert!(report.management.entry.is_some());
        assert!(!report.credentials.api_key);
    }

    #[tokio::test]
    async fn empty_store_reports_missing_content_types() {
        let report = diagnostics(Arc::new(MemoryStore::new()))
            .debug_setup(false)
            .await;

        assert!(!report.content_types_exist);
        assert!(!report.site_config_exists);
        assert!(!report.setup_completed);
    }

    #[tokio::test]
    async fn config_summary_hides_everything_but_identifiers() {
        let report = diagnostics(Arc::new(MemoryStore::seeded()))
            .debug_config()
            .await;

        let summary = report.site_config.expect("summary");
        assert!(report.site_config_exists);
        assert!(summary.setup_completed);
        assert!(!summary.site_name.is_empty());
    }
}
