//! Read side of the site: named collections fetched from the CMS.
//!
//! Reads never fail. Transport, status and decode errors are logged and turn
//! into `None` or an empty list so a flaky CMS degrades the page instead of
//! breaking it.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::{
    application::{
        cms::{CmsError, ContentStore, EntryQuery},
        normalize::{decode_first, decode_list},
        provisioning::ProvisioningService,
    },
    domain::{
        content_types::{BLOG_POST, HOME_PAGE, PORTFOLIO_PROJECT, SITE_CONFIGURATION, WORK_EXPERIENCE},
        entries::{BlogPost, HomePageContent, PortfolioProject, SiteConfiguration, WorkExperience},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaState {
    /// Content types were registered before this process looked.
    Present,
    /// This process created them on first read.
    Provisioned,
    /// Still missing after the one provisioning attempt.
    Missing,
}

/// Everything the home page renders, fetched in one go.
#[derive(Debug, Clone, Default)]
pub struct HomeSnapshot {
    pub configuration: Option<SiteConfiguration>,
    pub home: Option<HomePageContent>,
    pub posts: Vec<BlogPost>,
    pub experiences: Vec<WorkExperience>,
    pub projects: Vec<PortfolioProject>,
}

pub struct ContentService {
    store: Arc<dyn ContentStore>,
    provisioning: ProvisioningService,
    auto_provision: bool,
    schema_state: OnceCell<SchemaState>,
    /// Set once the content types are known to exist; never cleared.
    schema_confirmed: AtomicBool,
}

impl ContentService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        provisioning: ProvisioningService,
        auto_provision: bool,
    ) -> Self {
        Self {
            store,
            provisioning,
            auto_provision,
            schema_state: OnceCell::new(),
            schema_confirmed: AtomicBool::new(false),
        }
    }

    /// Whether the content types are registered, provisioning them on the
    /// first call of the process when they are not.
    pub async fn ensure_content_types(&self) -> bool {
        if self.schema_confirmed.load(Ordering::Acquire) {
            return true;
        }

        let state = *self
            .schema_state
            .get_or_init(|| self.provision_once())
            .await;

        let present = match state {
            SchemaState::Present | SchemaState::Provisioned => true,
            // Another process may have provisioned since; look again but do
            // not provision twice.
            SchemaState::Missing => self.provisioning.content_types_exist().await,
        };
        if present {
            self.schema_confirmed.store(true, Ordering::Release);
        }
        present
    }

    async fn provision_once(&self) -> SchemaState {
        if self.provisioning.content_types_exist().await {
            return SchemaState::Present;
        }
        if !self.auto_provision {
            warn!(
                target = "application::content::provision_once",
                "content types are missing and automatic provisioning is disabled"
            );
            return SchemaState::Missing;
        }

        info!(
            target = "application::content::provision_once",
            "content types not found; provisioning"
        );
        match self.provisioning.run().await {
            Ok(_) => SchemaState::Provisioned,
            Err(err) => {
                warn!(
                    target = "application::content::provision_once",
                    error = %err,
                    "automatic provisioning failed"
                );
                SchemaState::Missing
            }
        }
    }

    /// The newest configuration entry, read from delivery first and from the
    /// management API when delivery fails or has not caught up yet.
    pub async fn site_configuration(&self) -> Option<SiteConfiguration> {
        if !self.ensure_content_types().await {
            return None;
        }
        self.read_site_configuration().await
    }

    async fn read_site_configuration(&self) -> Option<SiteConfiguration> {
        let query = EntryQuery::new(SITE_CONFIGURATION).newest_first("updated_at");
        match self.store.delivery_entries(&query).await {
            Ok(payload) => {
                if let Some(config) = decode_entry::<SiteConfiguration>(SITE_CONFIGURATION, &payload) {
                    return Some(config);
                }
            }
            Err(err) => log_read_failure(SITE_CONFIGURATION, "delivery", &err),
        }

        match self.store.management_entries(&query).await {
            Ok(payload) => decode_entry(SITE_CONFIGURATION, &payload),
            Err(err) => {
                log_read_failure(SITE_CONFIGURATION, "management", &err);
                None
            }
        }
    }

    pub async fn home_page(&self) -> Option<HomePageContent> {
        self.ensure_content_types().await;
        self.read_home_page().await
    }

    pub async fn blog_posts(&self) -> Vec<BlogPost> {
        self.ensure_content_types().await;
        self.read_blog_posts().await
    }

    pub async fn blog_post(&self, slug: &str) -> Option<BlogPost> {
        self.ensure_content_types().await;
        self.delivery_first(EntryQuery::new(BLOG_POST).matching("slug", slug).limit(1))
            .await
    }

    pub async fn work_experiences(&self) -> Vec<WorkExperience> {
        self.ensure_content_types().await;
        self.read_work_experiences().await
    }

    pub async fn portfolio_projects(&self) -> Vec<PortfolioProject> {
        self.ensure_content_types().await;
        self.read_portfolio_projects().await
    }

    pub async fn featured_projects(&self) -> Vec<PortfolioProject> {
        self.ensure_content_types().await;
        self.delivery_list(
            EntryQuery::new(PORTFOLIO_PROJECT)
                .matching("featured", true)
                .newest_first("created_at"),
        )
        .await
    }

    /// Every home-page collection, read concurrently after a single
    /// content-type check.
    pub async fn home_snapshot(&self) -> HomeSnapshot {
        if !self.ensure_content_types().await {
            return HomeSnapshot::default();
        }

        let (configuration, home, posts, experiences, projects) = tokio::join!(
            self.read_site_configuration(),
            self.read_home_page(),
            self.read_blog_posts(),
            self.read_work_experiences(),
            self.read_portfolio_projects(),
        );

        HomeSnapshot {
            configuration,
            home,
            posts,
            experiences,
            projects,
        }
    }

    /// Like [`Self::home_snapshot`] for a configuration the caller already
    /// fetched.
    pub async fn home_snapshot_for(&self, configuration: Option<SiteConfiguration>) -> HomeSnapshot {
        if !self.ensure_content_types().await {
            return HomeSnapshot {
                configuration,
                ..HomeSnapshot::default()
            };
        }

        let (home, posts, experiences, projects) = tokio::join!(
            self.read_home_page(),
            self.read_blog_posts(),
            self.read_work_experiences(),
            self.read_portfolio_projects(),
        );

        HomeSnapshot {
            configuration,
            home,
            posts,
            experiences,
            projects,
        }
    }

    async fn read_home_page(&self) -> Option<HomePageContent> {
        self.delivery_first(EntryQuery::new(HOME_PAGE)).await
    }

    async fn read_blog_posts(&self) -> Vec<BlogPost> {
        self.delivery_list(EntryQuery::new(BLOG_POST).newest_first("published_date"))
            .await
    }

    async fn read_work_experiences(&self) -> Vec<WorkExperience> {
        self.delivery_list(EntryQuery::new(WORK_EXPERIENCE).newest_first("start_date"))
            .await
    }

    async fn read_portfolio_projects(&self) -> Vec<PortfolioProject> {
        self.delivery_list(EntryQuery::new(PORTFOLIO_PROJECT).newest_first("created_at"))
            .await
    }

    async fn delivery_first<T: DeserializeOwned>(&self, query: EntryQuery) -> Option<T> {
        match self.store.delivery_entries(&query).await {
            Ok(payload) => decode_entry(query.content_type, &payload),
            Err(err) => {
                log_read_failure(query.content_type, "delivery", &err);
                None
            }
        }
    }

    async fn delivery_list<T: DeserializeOwned>(&self, query: EntryQuery) -> Vec<T> {
        match self.store.delivery_entries(&query).await {
            Ok(payload) => decode_list(&payload),
            Err(err) => {
                log_read_failure(query.content_type, "delivery", &err);
                Vec::new()
            }
        }
    }
}

fn decode_entry<T: DeserializeOwned>(content_type: &'static str, payload: &Value) -> Option<T> {
    match decode_first(payload) {
        Ok(entry) => entry,
        Err(err) => {
            warn!(
                target = "application::content::decode_entry",
                content_type,
                error = %err,
                "entry failed to decode"
            );
            None
        }
    }
}

fn log_read_failure(content_type: &'static str, api: &'static str, err: &CmsError) {
    warn!(
        target = "application::content::read",
        content_type,
        api,
        error = %err,
        "cms read failed"
    );
}
