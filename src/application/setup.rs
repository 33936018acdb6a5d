//! First-run setup: turns the owner's form into the site configuration entry.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use metrics::counter;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    application::{
        cms::{AssetUpload, CmsError, ContentStore, EntryQuery, EntryRef},
        content::ContentService,
        gate::RecentCompletion,
        normalize::{decode_first, first_entry},
    },
    domain::{
        content_types::SITE_CONFIGURATION,
        entries::{SetupFlag, SiteConfiguration},
        error::DomainError,
        setup::{AvatarAttachment, SetupSubmission, ValidSetup},
    },
};

const METRIC_SETUP_POLL_ATTEMPTS: &str = "folio_setup_poll_attempts_total";

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("avatar must be an image, got `{0}`")]
    AvatarNotImage(String),
    #[error("avatar is {size} bytes, limit is {limit}")]
    AvatarTooLarge { size: usize, limit: usize },
    #[error("setup has already been completed")]
    AlreadyCompleted,
    #[error("content types are not provisioned")]
    ContentTypesMissing,
    #[error("cms call `{operation}` failed")]
    Cms {
        operation: &'static str,
        #[source]
        source: CmsError,
    },
}

impl SetupError {
    fn cms(operation: &'static str) -> impl FnOnce(CmsError) -> Self {
        move |source| Self::Cms { operation, source }
    }
}

#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct SetupRequest {
    pub submission: SetupSubmission,
    pub avatar: Option<AvatarUpload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupOutcome {
    pub entry_uid: String,
    pub published: bool,
    pub propagated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_uid: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupStatus {
    pub setup_completed: bool,
    pub site_config_exists: bool,
    pub setup_flag: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupPolicy {
    pub poll_attempts: u32,
    pub poll_interval: Duration,
    pub max_avatar_bytes: usize,
}

pub struct SetupService {
    store: Arc<dyn ContentStore>,
    content: Arc<ContentService>,
    recent: Arc<RecentCompletion>,
    policy: SetupPolicy,
    submissions: Mutex<()>,
}

impl SetupService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        content: Arc<ContentService>,
        recent: Arc<RecentCompletion>,
        policy: SetupPolicy,
    ) -> Self {
        Self {
            store,
            content,
            recent,
            policy,
            submissions: Mutex::new(()),
        }
    }

    pub fn recent(&self) -> &Arc<RecentCompletion> {
        &self.recent
    }

    pub async fn status(&self) -> SetupStatus {
        let configuration = self.content.site_configuration().await;
        let site_config_exists = configuration.is_some();
        SetupStatus {
            setup_completed: site_config_exists,
            site_config_exists,
            setup_flag: configuration.is_some_and(|config| config.setup_completed.is_set()),
        }
    }

    pub async fn complete(&self, request: SetupRequest) -> Result<SetupOutcome, SetupError> {
        let setup = request.submission.validate()?;
        if let Some(avatar) = &request.avatar {
            self.check_avatar(avatar)?;
        }

        // Serialise submissions so the existence check and the write below
        // cannot interleave within this process.
        let _guard = self.submissions.lock().await;

        if self.recent.is_recent() {
            return Err(SetupError::AlreadyCompleted);
        }
        if !self.content.ensure_content_types().await {
            return Err(SetupError::ContentTypesMissing);
        }

        let existing = self.existing_configuration().await?;
        if existing
            .as_ref()
            .is_some_and(|config| config.setup_completed.is_set())
        {
            return Err(SetupError::AlreadyCompleted);
        }

        let avatar_uid = match request.avatar {
            Some(avatar) => Some(self.upload_avatar(avatar, &setup.site_name).await?),
            None => None,
        };

        let target = existing.map(|config| config.uid).filter(|uid| !uid.is_empty());
        let (entry, avatar_attached) = self
            .write_configuration(&setup, target.as_deref(), avatar_uid.as_deref())
            .await?;

        let published = match self.store.publish_entry(SITE_CONFIGURATION, &entry.uid).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    target = "application::setup::complete",
                    uid = %entry.uid,
                    error = %err,
                    "publishing site configuration failed"
                );
                false
            }
        };

        self.recent.mark();
        let propagated = self.await_propagation().await;

        info!(
            target = "application::setup::complete",
            uid = %entry.uid,
            claimed_existing = target.is_some(),
            published,
            propagated,
            "site configuration saved"
        );

        Ok(SetupOutcome {
            entry_uid: entry.uid,
            published,
            propagated,
            avatar_uid: avatar_uid.filter(|_| avatar_attached),
        })
    }

    fn check_avatar(&self, avatar: &AvatarUpload) -> Result<(), SetupError> {
        if !avatar.content_type.starts_with("image/") {
            return Err(SetupError::AvatarNotImage(avatar.content_type.clone()));
        }
        if avatar.bytes.len() > self.policy.max_avatar_bytes {
            return Err(SetupError::AvatarTooLarge {
                size: avatar.bytes.len(),
                limit: self.policy.max_avatar_bytes,
            });
        }
        Ok(())
    }

    async fn existing_configuration(&self) -> Result<Option<SiteConfiguration>, SetupError> {
        let query = EntryQuery::new(SITE_CONFIGURATION)
            .newest_first("updated_at")
            .limit(1);
        let payload = self
            .store
            .management_entries(&query)
            .await
            .map_err(SetupError::cms("list_site_configuration"))?;

        match decode_first::<SiteConfiguration>(&payload) {
            Ok(config) => Ok(config),
            Err(err) => {
                // Unreadable but present still blocks a second configuration.
                warn!(
                    target = "application::setup::existing_configuration",
                    error = %err,
                    "existing configuration failed to decode"
                );
                let flag = first_entry(&payload)
                    .and_then(|entry| entry.get("setup_completed"))
                    .map(SetupFlag::from_value)
                    .unwrap_or_default();
                Ok(first_entry(&payload).map(|entry| SiteConfiguration {
                    uid: entry
                        .get("uid")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    setup_completed: flag,
                    ..SiteConfiguration::default()
                }))
            }
        }
    }

    async fn upload_avatar(&self, avatar: AvatarUpload, site_name: &str) -> Result<String, SetupError> {
        let upload = AssetUpload {
            title: format!("{site_name} avatar"),
            filename: avatar.filename,
            content_type: avatar.content_type,
            bytes: avatar.bytes,
        };
        let asset = self
            .store
            .upload_asset(upload)
            .await
            .map_err(SetupError::cms("upload_asset"))?;

        if let Err(err) = self.store.publish_asset(&asset.uid).await {
            warn!(
                target = "application::setup::upload_avatar",
                uid = %asset.uid,
                error = %err,
                "publishing avatar failed; continuing"
            );
        }
        Ok(asset.uid)
    }

    /// Creates or updates the entry, trying each avatar encoding the stack
    /// may accept before falling back to an entry without the avatar.
    async fn write_configuration(
        &self,
        setup: &ValidSetup,
        existing_uid: Option<&str>,
        avatar_uid: Option<&str>,
    ) -> Result<(EntryRef, bool), SetupError> {
        if let Some(asset_uid) = avatar_uid {
            for attachment in AvatarAttachment::ATTEMPT_ORDER {
                let body = setup.to_entry(Some((asset_uid, attachment)));
                match self.write_entry(existing_uid, &body).await {
                    Ok(entry) => return Ok((entry, true)),
                    Err(err) if err.is_validation() => {
                        warn!(
                            target = "application::setup::write_configuration",
                            ?attachment,
                            error = %err,
                            "avatar encoding rejected"
                        );
                    }
                    Err(err) => return Err(SetupError::Cms { operation: "write_site_configuration", source: err }),
                }
            }
        }

        let entry = self
            .write_entry(existing_uid, &setup.to_entry(None))
            .await
            .map_err(SetupError::cms("write_site_configuration"))?;
        Ok((entry, false))
    }

    async fn write_entry(&self, existing_uid: Option<&str>, body: &Value) -> Result<EntryRef, CmsError> {
        match existing_uid {
            Some(uid) => self.store.update_entry(SITE_CONFIGURATION, uid, body).await,
            None => self.store.create_entry(SITE_CONFIGURATION, body).await,
        }
    }

    /// Polls delivery until the new entry is served or attempts run out.
    async fn await_propagation(&self) -> bool {
        let query = EntryQuery::new(SITE_CONFIGURATION).limit(1);
        for attempt in 1..=self.policy.poll_attempts {
            counter!(METRIC_SETUP_POLL_ATTEMPTS).increment(1);
            match self.store.delivery_entries(&query).await {
                Ok(payload) if first_entry(&payload).is_some() => return true,
                Ok(_) => {}
                Err(err) => warn!(
                    target = "application::setup::await_propagation",
                    attempt,
                    error = %err,
                    "propagation check failed"
                ),
            }
            if attempt < self.policy.poll_attempts && !self.policy.poll_interval.is_zero() {
                tokio::time::sleep(self.policy.poll_interval).await;
            }
        }
        false
    }
}
