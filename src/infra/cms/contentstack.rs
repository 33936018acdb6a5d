//! Contentstack v3 adapter over `reqwest`.
//!
//! Management calls authenticate with `api_key` + `authorization`; delivery
//! calls with `api_key` + `access_token` and only see published entries.

use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::{Client, Method, RequestBuilder, StatusCode, multipart};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::{
    application::cms::{
        AssetRecord, AssetUpload, CmsError, ContentStore, EntryQuery, EntryRef, SortDirection,
    },
    config::CmsSettings,
    domain::content_types::ContentTypeSchema,
    infra::error::InfraError,
};

const METRIC_CMS_REQUESTS: &str = "folio_cms_requests_total";
const METRIC_CMS_FAILURES: &str = "folio_cms_request_failures_total";
const METRIC_CMS_REQUEST_MS: &str = "folio_cms_request_ms";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Api {
    Management,
    Delivery,
}

impl Api {
    fn as_str(self) -> &'static str {
        match self {
            Api::Management => "management",
            Api::Delivery => "delivery",
        }
    }
}

enum Payload {
    Empty,
    Json(Value),
    Multipart(multipart::Form),
}

#[derive(Clone)]
pub struct ContentstackClient {
    client: Client,
    management_base: Url,
    delivery_base: Url,
    api_key: Option<String>,
    delivery_token: Option<String>,
    management_token: Option<String>,
    environment: String,
    locale: String,
}

impl ContentstackClient {
    pub fn new(settings: &CmsSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self {
            client,
            management_base: host_base_url(&settings.api_host)?,
            delivery_base: host_base_url(&settings.cdn_host)?,
            api_key: settings.api_key.clone(),
            delivery_token: settings.delivery_token.clone(),
            management_token: settings.management_token.clone(),
            environment: settings.environment.clone(),
            locale: settings.locale.clone(),
        })
    }

    fn url(&self, api: Api, segments: &[&str]) -> Result<Url, CmsError> {
        let mut url = match api {
            Api::Management => self.management_base.clone(),
            Api::Delivery => self.delivery_base.clone(),
        };
        url.path_segments_mut()
            .map_err(|()| CmsError::Transport("cms base url cannot carry a path".into()))?
            .pop_if_empty()
            .push("v3")
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, api: Api, request: RequestBuilder) -> Result<RequestBuilder, CmsError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(CmsError::MissingCredentials("api_key"))?;
        let request = request.header("api_key", api_key);
        match api {
            Api::Management => {
                let token = self
                    .management_token
                    .as_deref()
                    .ok_or(CmsError::MissingCredentials("management_token"))?;
                Ok(request.header("authorization", token))
            }
            Api::Delivery => {
                let token = self
                    .delivery_token
                    .as_deref()
                    .ok_or(CmsError::MissingCredentials("delivery_token"))?;
                Ok(request.header("access_token", token))
            }
        }
    }

    async fn send(
        &self,
        api: Api,
        method: Method,
        url: Url,
        payload: Payload,
        subject: &str,
    ) -> Result<Value, CmsError> {
        let request = self.authorize(api, self.client.request(method.clone(), url.clone()))?;
        let request = match payload {
            Payload::Empty => request,
            Payload::Json(body) => request.json(&body),
            Payload::Multipart(form) => request.multipart(form),
        };

        counter!(METRIC_CMS_REQUESTS, "api" => api.as_str()).increment(1);
        let started = Instant::now();
        let result = self.execute(request, subject).await;
        histogram!(METRIC_CMS_REQUEST_MS, "api" => api.as_str())
            .record(started.elapsed().as_secs_f64() * 1000.0);

        match &result {
            Ok(_) | Err(CmsError::AlreadyExists { .. }) => {}
            Err(err) => {
                counter!(METRIC_CMS_FAILURES, "api" => api.as_str()).increment(1);
                debug!(
                    target = "infra::cms::contentstack::send",
                    api = api.as_str(),
                    method = %method,
                    path = url.path(),
                    error = %err,
                    "cms request failed"
                );
            }
        }
        result
    }

    async fn execute(&self, request: RequestBuilder, subject: &str) -> Result<Value, CmsError> {
        let response = request.send().await.map_err(CmsError::transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(CmsError::transport)?;

        if status.is_success() {
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_slice(&bytes).map_err(CmsError::decode);
        }

        Err(classify_failure(status, &bytes, subject))
    }

    fn entries_url(&self, api: Api, query: &EntryQuery) -> Result<Url, CmsError> {
        let mut url = self.url(api, &["content_types", query.content_type, "entries"])?;
        {
            let mut pairs = url.query_pairs_mut();
            if api == Api::Delivery {
                pairs.append_pair("environment", &self.environment);
                pairs.append_pair("locale", &self.locale);
            }
            if let Some(filter) = &query.filter {
                pairs.append_pair("query", &filter.to_string());
            }
            if let Some((field, direction)) = query.order {
                let key = match direction {
                    SortDirection::Ascending => "asc",
                    SortDirection::Descending => "desc",
                };
                pairs.append_pair(key, field);
            }
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        Ok(url)
    }

    fn publish_body(&self, kind: &str) -> Value {
        let mut body = serde_json::Map::new();
        body.insert(
            kind.to_string(),
            json!({
                "environments": [self.environment],
                "locales": [self.locale],
            }),
        );
        Value::Object(body)
    }
}

fn host_base_url(host: &str) -> Result<Url, InfraError> {
    let raw = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}/")
    };
    Url::parse(&raw)
        .map_err(|err| InfraError::configuration(format!("invalid CMS host `{host}`: {err}")))
}

#[derive(Debug, Deserialize)]
struct FailureBody {
    #[serde(default)]
    errors: Option<Value>,
}

/// Only a 422 naming a duplicate `title` counts as "already exists".
fn classify_failure(status: StatusCode, bytes: &[u8], subject: &str) -> CmsError {
    let body = String::from_utf8_lossy(bytes).into_owned();
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        let duplicate = serde_json::from_slice::<FailureBody>(bytes)
            .ok()
            .and_then(|failure| failure.errors)
            .and_then(|errors| errors.get("title").cloned())
            .is_some_and(|title| !title.is_null());
        if duplicate {
            return CmsError::AlreadyExists {
                subject: subject.to_string(),
            };
        }
    }
    if status == StatusCode::NOT_FOUND {
        return CmsError::NotFound {
            subject: subject.to_string(),
        };
    }
    CmsError::Rejected {
        status: status.as_u16(),
        body,
    }
}

#[derive(Debug, Default, Deserialize)]
struct AssetEnvelope {
    asset: Option<AssetBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AssetBody {
    uid: String,
    url: Option<String>,
    filename: Option<String>,
    title: Option<String>,
}

impl AssetEnvelope {
    fn into_record(self, subject: &str) -> Result<AssetRecord, CmsError> {
        let asset = self
            .asset
            .filter(|asset| !asset.uid.is_empty())
            .ok_or_else(|| CmsError::Decode(format!("`{subject}` response carried no asset")))?;
        Ok(AssetRecord {
            uid: asset.uid,
            url: asset.url,
            filename: asset.filename,
            title: asset.title,
        })
    }
}

fn entry_ref(payload: Value, subject: &str) -> Result<EntryRef, CmsError> {
    payload
        .get("entry")
        .and_then(|entry| entry.get("uid"))
        .and_then(Value::as_str)
        .map(|uid| EntryRef {
            uid: uid.to_string(),
        })
        .ok_or_else(|| CmsError::Decode(format!("`{subject}` response carried no entry uid")))
}

#[async_trait]
impl ContentStore for ContentstackClient {
    async fn content_type_uids(&self) -> Result<Vec<String>, CmsError> {
        let url = self.url(Api::Management, &["content_types"])?;
        let payload = self
            .send(Api::Management, Method::GET, url, Payload::Empty, "content_types")
            .await?;
        Ok(payload
            .get("content_types")
            .and_then(Value::as_array)
            .map(|types| {
                types
                    .iter()
                    .filter_map(|ty| ty.get("uid").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create_content_type(&self, schema: &ContentTypeSchema) -> Result<(), CmsError> {
        let url = self.url(Api::Management, &["content_types"])?;
        let body = json!({ "content_type": schema });
        self.send(Api::Management, Method::POST, url, Payload::Json(body), schema.uid)
            .await
            .map(|_| ())
    }

    async fn delivery_entries(&self, query: &EntryQuery) -> Result<Value, CmsError> {
        let url = self.entries_url(Api::Delivery, query)?;
        self.send(Api::Delivery, Method::GET, url, Payload::Empty, query.content_type)
            .await
    }

    async fn management_entries(&self, query: &EntryQuery) -> Result<Value, CmsError> {
        let url = self.entries_url(Api::Management, query)?;
        self.send(Api::Management, Method::GET, url, Payload::Empty, query.content_type)
            .await
    }

    async fn create_entry(&self, content_type: &str, entry: &Value) -> Result<EntryRef, CmsError> {
        let url = self.url(Api::Management, &["content_types", content_type, "entries"])?;
        let body = json!({ "entry": entry });
        let payload = self
            .send(Api::Management, Method::POST, url, Payload::Json(body), content_type)
            .await?;
        entry_ref(payload, content_type)
    }

    async fn update_entry(
        &self,
        content_type: &str,
        uid: &str,
        entry: &Value,
    ) -> Result<EntryRef, CmsError> {
        let url = self.url(Api::Management, &["content_types", content_type, "entries", uid])?;
        let body = json!({ "entry": entry });
        let payload = self
            .send(Api::Management, Method::PUT, url, Payload::Json(body), uid)
            .await?;
        entry_ref(payload, uid)
    }

    async fn publish_entry(&self, content_type: &str, uid: &str) -> Result<(), CmsError> {
        let url = self.url(
            Api::Management,
            &["content_types", content_type, "entries", uid, "publish"],
        )?;
        let body = self.publish_body("entry");
        self.send(Api::Management, Method::POST, url, Payload::Json(body), uid)
            .await
            .map(|_| ())
    }

    async fn upload_asset(&self, upload: AssetUpload) -> Result<AssetRecord, CmsError> {
        let url = self.url(Api::Management, &["assets"])?;
        let part = multipart::Part::bytes(upload.bytes.to_vec())
            .file_name(upload.filename.clone())
            .mime_str(&upload.content_type)
            .map_err(CmsError::transport)?;
        let form = multipart::Form::new()
            .part("asset[upload]", part)
            .text("asset[title]", upload.title);

        let payload = self
            .send(
                Api::Management,
                Method::POST,
                url,
                Payload::Multipart(form),
                &upload.filename,
            )
            .await?;
        serde_json::from_value::<AssetEnvelope>(payload)
            .map_err(CmsError::decode)?
            .into_record(&upload.filename)
    }

    async fn publish_asset(&self, uid: &str) -> Result<(), CmsError> {
        let url = self.url(Api::Management, &["assets", uid, "publish"])?;
        let body = self.publish_body("asset");
        self.send(Api::Management, Method::POST, url, Payload::Json(body), uid)
            .await
            .map(|_| ())
    }

    async fn fetch_asset(&self, uid: &str) -> Result<AssetRecord, CmsError> {
        let url = self.url(Api::Management, &["assets", uid])?;
        let payload = self
            .send(Api::Management, Method::GET, url, Payload::Empty, uid)
            .await?;
        serde_json::from_value::<AssetEnvelope>(payload)
            .map_err(CmsError::decode)?
            .into_record(uid)
    }
}
