//! In-process CMS used for offline preview and tests.
//!
//! Mirrors the parts of the hosted API the site relies on: duplicate
//! content types are refused, entries are invisible to delivery until
//! published, and queries support equality filters, ordering and limits.

use std::{
    collections::BTreeMap,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    application::cms::{
        AssetRecord, AssetUpload, CmsError, ContentStore, EntryQuery, EntryRef, SortDirection,
    },
    domain::{
        content_types::{ContentTypeSchema, SITE_CONFIGURATION, catalogue},
        samples::sample_entries,
    },
};

#[derive(Debug, Clone)]
struct StoredEntry {
    content_type: String,
    published: bool,
    fields: Map<String, Value>,
}

#[derive(Debug, Clone)]
struct StoredAsset {
    record: AssetRecord,
    published: bool,
}

#[derive(Debug, Default)]
struct State {
    content_types: BTreeMap<String, ContentTypeSchema>,
    /// Insertion ordered by uid, which is monotonic.
    entries: BTreeMap<String, StoredEntry>,
    assets: BTreeMap<String, StoredAsset>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    next_uid: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stack that looks provisioned and set up: every content type, the
    /// published sample entries and a completed site configuration.
    pub fn seeded() -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            for schema in catalogue() {
                state.content_types.insert(schema.uid.to_string(), schema);
            }
        }
        for sample in sample_entries() {
            store.insert_entry(sample.content_type, &sample.body, true);
        }
        store.insert_entry(
            SITE_CONFIGURATION,
            &json!({
                "title": "Site Configuration",
                "site_name": "My Personal Site",
                "site_subtitle": "Creator & Developer",
                "owner_name": "Your Name",
                "owner_email": "hello@example.com",
                "bio": "Welcome to my digital space",
                "years_experience": 5,
                "projects_completed": 20,
                "technologies_count": 12,
                "work_location": "Remote",
                "setup_completed": true
            }),
            true,
        );
        store
    }

    /// Number of stored entries across every content type.
    pub fn entry_count(&self) -> usize {
        self.lock().entries.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_uid(&self) -> String {
        let n = self.next_uid.fetch_add(1, Ordering::Relaxed) + 1;
        format!("bltmem{n:010}")
    }

    fn insert_entry(&self, content_type: &str, body: &Value, published: bool) -> String {
        let uid = self.next_uid();
        let now = timestamp();
        let mut fields = body.as_object().cloned().unwrap_or_default();
        fields.insert("uid".into(), Value::String(uid.clone()));
        fields.insert("created_at".into(), Value::String(now.clone()));
        fields.insert("updated_at".into(), Value::String(now));

        self.lock().entries.insert(
            uid.clone(),
            StoredEntry {
                content_type: content_type.to_string(),
                published,
                fields,
            },
        );
        uid
    }

    fn require_content_type(state: &State, content_type: &str) -> Result<(), CmsError> {
        if state.content_types.contains_key(content_type) {
            Ok(())
        } else {
            Err(CmsError::NotFound {
                subject: content_type.to_string(),
            })
        }
    }

    fn query(&self, query: &EntryQuery, published_only: bool) -> Result<Value, CmsError> {
        let state = self.lock();
        Self::require_content_type(&state, query.content_type)?;

        let filter = query.filter.as_ref().and_then(Value::as_object);
        let mut matches: Vec<&StoredEntry> = state
            .entries
            .values()
            .filter(|entry| entry.content_type == query.content_type)
            .filter(|entry| entry.published || !published_only)
            .filter(|entry| filter.is_none_or(|filter| matches_filter(&entry.fields, filter)))
            .collect();

        if let Some((field, direction)) = query.order {
            matches.sort_by(|a, b| {
                let ordering = compare_field(a.fields.get(field), b.fields.get(field));
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            matches.truncate(limit as usize);
        }

        let entries: Vec<Value> = matches
            .into_iter()
            .map(|entry| Value::Object(entry.fields.clone()))
            .collect();
        Ok(json!({ "entries": entries }))
    }
}

fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

fn matches_filter(fields: &Map<String, Value>, filter: &Map<String, Value>) -> bool {
    filter
        .iter()
        .all(|(key, expected)| fields.get(key) == Some(expected))
}

fn compare_field(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn content_type_uids(&self) -> Result<Vec<String>, CmsError> {
        Ok(self.lock().content_types.keys().cloned().collect())
    }

    async fn create_content_type(&self, schema: &ContentTypeSchema) -> Result<(), CmsError> {
        let mut state = self.lock();
        if state.content_types.contains_key(schema.uid) {
            return Err(CmsError::AlreadyExists {
                subject: schema.uid.to_string(),
            });
        }
        state
            .content_types
            .insert(schema.uid.to_string(), schema.clone());
        Ok(())
    }

    async fn delivery_entries(&self, query: &EntryQuery) -> Result<Value, CmsError> {
        self.query(query, true)
    }

    async fn management_entries(&self, query: &EntryQuery) -> Result<Value, CmsError> {
        self.query(query, false)
    }

    async fn create_entry(&self, content_type: &str, entry: &Value) -> Result<EntryRef, CmsError> {
        Self::require_content_type(&self.lock(), content_type)?;
        if !entry.is_object() {
            return Err(CmsError::Rejected {
                status: 422,
                body: "entry must be an object".into(),
            });
        }
        let uid = self.insert_entry(content_type, entry, false);
        Ok(EntryRef { uid })
    }

    async fn update_entry(
        &self,
        content_type: &str,
        uid: &str,
        entry: &Value,
    ) -> Result<EntryRef, CmsError> {
        let mut state = self.lock();
        let stored = state
            .entries
            .get_mut(uid)
            .filter(|stored| stored.content_type == content_type)
            .ok_or_else(|| CmsError::NotFound {
                subject: uid.to_string(),
            })?;

        if let Some(fields) = entry.as_object() {
            for (key, value) in fields {
                stored.fields.insert(key.clone(), value.clone());
            }
        }
        stored
            .fields
            .insert("updated_at".into(), Value::String(timestamp()));
        // An edit needs a fresh publish before delivery serves it.
        stored.published = false;
        Ok(EntryRef {
            uid: uid.to_string(),
        })
    }

    async fn publish_entry(&self, content_type: &str, uid: &str) -> Result<(), CmsError> {
        let mut state = self.lock();
        match state.entries.get_mut(uid) {
            Some(stored) if stored.content_type == content_type => {
                stored.published = true;
                Ok(())
            }
            _ => Err(CmsError::NotFound {
                subject: uid.to_string(),
            }),
        }
    }

    async fn upload_asset(&self, upload: AssetUpload) -> Result<AssetRecord, CmsError> {
        let uid = self.next_uid();
        let record = AssetRecord {
            url: Some(format!("/memory/assets/{uid}/{}", upload.filename)),
            filename: Some(upload.filename),
            title: Some(upload.title),
            uid: uid.clone(),
        };
        self.lock().assets.insert(
            uid,
            StoredAsset {
                record: record.clone(),
                published: false,
            },
        );
        Ok(record)
    }

    async fn publish_asset(&self, uid: &str) -> Result<(), CmsError> {
        let mut state = self.lock();
        let asset = state.assets.get_mut(uid).ok_or_else(|| CmsError::NotFound {
            subject: uid.to_string(),
        })?;
        asset.published = true;
        Ok(())
    }

    async fn fetch_asset(&self, uid: &str) -> Result<AssetRecord, CmsError> {
        self.lock()
            .assets
            .get(uid)
            .map(|asset| asset.record.clone())
            .ok_or_else(|| CmsError::NotFound {
                subject: uid.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content_types::BLOG_POST;

    #[tokio::test]
    async fn duplicate_content_types_are_refused() {
        let store = MemoryStore::new();
        let schema = ContentTypeSchema::blog_post();

        store.create_content_type(&schema).await.expect("first");
        let err = store.create_content_type(&schema).await.expect_err("second");
        assert!(matches!(err, CmsError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn delivery_only_sees_published_entries() {
        let store = MemoryStore::new();
        store
            .create_content_type(&ContentTypeSchema::blog_post())
            .await
            .expect("schema");
        let created = store
            .create_entry(BLOG_POST, &json!({"title": "Draft", "slug": "draft"}))
            .await
            .expect("entry");

        let query = EntryQuery::new(BLOG_POST);
        assert_eq!(store.delivery_entries(&query).await.expect("delivery"), json!({"entries": []}));

        store.publish_entry(BLOG_POST, &created.uid).await.expect("publish");
        let delivered = store.delivery_entries(&query).await.expect("delivery");
        assert_eq!(delivered["entries"][0]["slug"], "draft");
    }

    #[tokio::test]
    async fn queries_filter_order_and_limit() {
        let store = MemoryStore::seeded();
        let query = EntryQuery::new(BLOG_POST)
            .newest_first("published_date")
            .limit(1);

        let payload = store.delivery_entries(&query).await.expect("entries");
        let entries = payload["entries"].as_array().expect("list");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["slug"], "getting-started-headless-cms");

        let filtered = EntryQuery::new(BLOG_POST).matching("slug", "building-scalable-web-applications");
        let payload = store.delivery_entries(&filtered).await.expect("entries");
        assert_eq!(payload["entries"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn unknown_content_type_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .delivery_entries(&EntryQuery::new(BLOG_POST))
            .await
            .expect_err("missing");
        assert!(matches!(err, CmsError::NotFound { .. }));
    }
}
