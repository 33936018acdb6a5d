//! Port to the headless CMS.
//!
//! Management operations write content types, entries and assets; delivery
//! reads only see published entries. Entry reads return the raw JSON payload
//! so callers can normalise the shapes different APIs produce.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::content_types::ContentTypeSchema;

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("`{subject}` already exists")]
    AlreadyExists { subject: String },
    #[error("`{subject}` was not found")]
    NotFound { subject: String },
    #[error("cms rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("cms request failed: {0}")]
    Transport(String),
    #[error("cms response could not be decoded: {0}")]
    Decode(String),
    #[error("cms credential `{0}` is not configured")]
    MissingCredentials(&'static str),
}

impl CmsError {
    /// Field-level validation failure (HTTP 422 without the duplicate marker).
    pub fn is_validation(&self) -> bool {
        matches!(self, CmsError::Rejected { status: 422, .. })
    }

    pub fn transport(err: impl fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryQuery {
    pub content_type: &'static str,
    /// Equality filter object, sent as the `query` parameter.
    pub filter: Option<Value>,
    pub order: Option<(&'static str, SortDirection)>,
    pub limit: Option<u32>,
}

impl EntryQuery {
    pub fn new(content_type: &'static str) -> Self {
        Self {
            content_type,
            filter: None,
            order: None,
            limit: None,
        }
    }

    pub fn matching(mut self, field: &str, value: impl Into<Value>) -> Self {
        let mut filter = match self.filter.take() {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        filter.insert(field.to_string(), value.into());
        self.filter = Some(Value::Object(filter));
        self
    }

    pub fn newest_first(mut self, field: &'static str) -> Self {
        self.order = Some((field, SortDirection::Descending));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRef {
    pub uid: String,
}

#[derive(Clone)]
pub struct AssetUpload {
    pub filename: String,
    pub content_type: String,
    pub title: String,
    pub bytes: Bytes,
}

impl fmt::Debug for AssetUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetUpload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("title", &self.title)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetRecord {
    pub uid: String,
    pub url: Option<String>,
    pub filename: Option<String>,
    pub title: Option<String>,
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn content_type_uids(&self) -> Result<Vec<String>, CmsError>;

    /// Fails with [`CmsError::AlreadyExists`] when the uid is taken.
    async fn create_content_type(&self, schema: &ContentTypeSchema) -> Result<(), CmsError>;

    async fn delivery_entries(&self, query: &EntryQuery) -> Result<Value, CmsError>;

    async fn management_entries(&self, query: &EntryQuery) -> Result<Value, CmsError>;

    async fn create_entry(&self, content_type: &str, entry: &Value) -> Result<EntryRef, CmsError>;

    async fn update_entry(
        &self,
        content_type: &str,
        uid: &str,
        entry: &Value,
    ) -> Result<EntryRef, CmsError>;

    async fn publish_entry(&self, content_type: &str, uid: &str) -> Result<(), CmsError>;

    async fn upload_asset(&self, upload: AssetUpload) -> Result<AssetRecord, CmsError>;

    async fn publish_asset(&self, uid: &str) -> Result<(), CmsError>;

    async fn fetch_asset(&self, uid: &str) -> Result<AssetRecord, CmsError>;
}
