//! Creates the content-type schemas and seeds sample entries.
//!
//! The run is sequential and not transactional: a failure part way leaves the
//! schemas and entries created so far in place. Re-running is safe because
//! existing schemas and entries are detected and skipped.

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    application::{
        cms::{CmsError, ContentStore, EntryQuery},
        normalize::first_entry,
    },
    domain::{
        content_types::{REQUIRED_CONTENT_TYPES, catalogue},
        samples::{ExistenceProbe, SampleEntry, sample_entries},
    },
};

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to create content type `{content_type}`")]
    ContentType {
        content_type: &'static str,
        #[source]
        source: CmsError,
    },
    #[error("failed to create sample `{content_type}` entry")]
    Entry {
        content_type: &'static str,
        #[source]
        source: CmsError,
    },
}

/// Pauses between CMS writes to stay under vendor rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisioningDelays {
    pub after_entry: Duration,
    pub between_publishes: Duration,
}

impl ProvisioningDelays {
    pub const NONE: Self = Self {
        after_entry: Duration::ZERO,
        between_publishes: Duration::ZERO,
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedEntry {
    pub content_type: &'static str,
    pub uid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub schemas_created: Vec<&'static str>,
    pub schemas_existing: Vec<&'static str>,
    pub entries_created: Vec<CreatedEntry>,
    pub entries_skipped: usize,
    pub published: usize,
    pub publish_failures: Vec<String>,
}

#[derive(Clone)]
pub struct ProvisioningService {
    store: Arc<dyn ContentStore>,
    delays: ProvisioningDelays,
}

impl ProvisioningService {
    pub fn new(store: Arc<dyn ContentStore>, delays: ProvisioningDelays) -> Self {
        Self { store, delays }
    }

    /// True only when every required content type is registered. Lookup
    /// failures count as missing.
    pub async fn content_types_exist(&self) -> bool {
        match self.store.content_type_uids().await {
            Ok(uids) => REQUIRED_CONTENT_TYPES
                .iter()
                .all(|required| uids.iter().any(|uid| uid == required)),
            Err(err) => {
                warn!(
                    target = "application::provisioning::content_types_exist",
                    error = %err,
                    "content type lookup failed"
                );
                false
            }
        }
    }

    pub async fn run(&self) -> Result<ProvisionReport, ProvisionError> {
        let mut report = ProvisionReport::default();

        for schema in catalogue() {
            match self.store.create_content_type(&schema).await {
                Ok(()) => report.schemas_created.push(schema.uid),
                Err(CmsError::AlreadyExists { .. }) => report.schemas_existing.push(schema.uid),
                Err(source) => {
                    return Err(ProvisionError::ContentType {
                        content_type: schema.uid,
                        source,
                    });
                }
            }
        }

        info!(
            target = "application::provisioning::run",
            created = report.schemas_created.len(),
            existing = report.schemas_existing.len(),
            "content types ensured"
        );

        for sample in sample_entries() {
            if self.sample_exists(&sample).await {
                report.entries_skipped += 1;
                continue;
            }

            match self.store.create_entry(sample.content_type, &sample.body).await {
                Ok(created) => report.entries_created.push(CreatedEntry {
                    content_type: sample.content_type,
                    uid: created.uid,
                }),
                Err(CmsError::AlreadyExists { .. }) => report.entries_skipped += 1,
                Err(source) => {
                    return Err(ProvisionError::Entry {
                        content_type: sample.content_type,
                        source,
                    });
                }
            }
            sleep(self.delays.after_entry).await;
        }

        self.publish_created(&mut report).await;

        info!(
            target = "application::provisioning::run",
            entries_created = report.entries_created.len(),
            entries_skipped = report.entries_skipped,
            published = report.published,
            publish_failures = report.publish_failures.len(),
            "sample content provisioned"
        );

        Ok(report)
    }

    async fn sample_exists(&self, sample: &SampleEntry) -> bool {
        let query = match &sample.probe {
            ExistenceProbe::AnyEntry => EntryQuery::new(sample.content_type),
            ExistenceProbe::Field { field, value } => {
                EntryQuery::new(sample.content_type).matching(field, *value)
            }
        };

        match self.store.management_entries(&query.limit(1)).await {
            Ok(payload) => first_entry(&payload).is_some(),
            Err(err) => {
                warn!(
                    target = "application::provisioning::sample_exists",
                    content_type = sample.content_type,
                    error = %err,
                    "existence probe failed; treating sample as absent"
                );
                false
            }
        }
    }

    async fn publish_created(&self, report: &mut ProvisionReport) {
        let total = report.entries_created.len();
        for (index, entry) in report.entries_created.iter().enumerate() {
            match self.store.publish_entry(entry.content_type, &entry.uid).await {
                Ok(()) => report.published += 1,
                Err(err) => {
                    warn!(
                        target = "application::provisioning::publish_created",
                        content_type = entry.content_type,
                        uid = %entry.uid,
                        error = %err,
                        "publish failed; continuing"
                    );
                    report.publish_failures.push(entry.uid.clone());
                }
            }
            if index + 1 < total {
                sleep(self.delays.between_publishes).await;
            }
        }
    }
}

async fn sleep(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::cms::memory::MemoryStore;

    fn service(store: Arc<MemoryStore>) -> ProvisioningService {
        ProvisioningService::new(store, ProvisioningDelays::NONE)
    }

    #[tokio::test]
    async fn first_run_creates_schemas_and_samples() {
        let store = Arc::new(MemoryStore::new());
        let provisioning = service(store.clone());

        assert!(!provisioning.content_types_exist().await);
        let report = provisioning.run().await.expect("provision");

        assert_eq!(report.schemas_created, REQUIRED_CONTENT_TYPES);
        assert!(report.schemas_existing.is_empty());
        assert_eq!(report.entries_created.len(), sample_entries().len());
        assert_eq!(report.published, sample_entries().len());
        assert!(provisioning.content_types_exist().await);
    }

    #[tokio::test]
    async fn second_run_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let provisioning = service(store.clone());

        provisioning.run().await.expect("first run");
        let entries_after_first = store.entry_count();
        let report = provisioning.run().await.expect("second run");

        assert!(report.schemas_created.is_empty());
        assert_eq!(report.schemas_existing, REQUIRED_CONTENT_TYPES);
        assert!(report.entries_created.is_empty());
        assert_eq!(report.entries_skipped, sample_entries().len());
        assert_eq!(store.entry_count(), entries_after_first);
    }

    #[tokio::test]
    async fn site_configuration_is_never_seeded() {
        let store = Arc::new(MemoryStore::new());
        let report = service(store).run().await.expect("provision");

        assert!(
            report
                .entries_created
                .iter()
                .all(|entry| entry.content_type != "site_configuration")
        );
    }
}
