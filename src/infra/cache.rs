//! Rendered-page cache.
//!
//! Only the home page is cached; it is the one page that fans out to every
//! collection. Entries expire after the configured TTL or when a force
//! refresh clears them. A zero TTL disables caching.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use http_body_util::BodyExt;
use metrics::counter;
use thiserror::Error;
use tokio::sync::RwLock;

pub const HOME_PAGE_KEY: &str = "page:/";

const METRIC_CACHE_HIT: &str = "folio_page_cache_hit_total";
const METRIC_CACHE_MISS: &str = "folio_page_cache_miss_total";

#[derive(Clone)]
pub struct ResponseCache {
    entries: Arc<RwLock<HashMap<String, CachedResponse>>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::default(),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<Response<Body>> {
        let guard = self.entries.read().await;
        match guard.get(key).filter(|cached| cached.is_fresh(self.ttl)) {
            Some(cached) => {
                counter!(METRIC_CACHE_HIT).increment(1);
                Some(cached.clone().into_response())
            }
            None => {
                counter!(METRIC_CACHE_MISS).increment(1);
                None
            }
        }
    }

    /// Buffers `response` into the cache when it is cacheable and hands back
    /// an equivalent response.
    pub async fn store_response(
        &self,
        key: &str,
        response: Response,
    ) -> Result<Response, (Response, CacheStoreError)> {
        if self.ttl.is_zero() || !should_store_response(&response) {
            return Ok(response);
        }

        let (rebuilt, cached) = buffer_response(response).await?;
        let mut guard = self.entries.write().await;
        guard.insert(key.to_string(), cached);
        Ok(rebuilt)
    }

    /// Drops every entry, returning how many were still fresh.
    pub async fn invalidate_all(&self) -> usize {
        let mut guard = self.entries.write().await;
        let cleared = guard
            .values()
            .filter(|cached| cached.is_fresh(self.ttl))
            .count();
        guard.clear();
        cleared
    }
}

#[derive(Clone)]
pub struct CachedResponse {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
    stored_at: Instant,
}

impl CachedResponse {
    fn new(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers: headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            body,
            stored_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }

    fn into_response(self) -> Response<Body> {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        headers.clear();
        for (name, value) in self.headers {
            headers.append(name, value);
        }

        response
    }
}

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("failed to buffer response body: {0}")]
    Buffer(String),
}

fn should_store_response(response: &Response) -> bool {
    response.status() == StatusCode::OK
        && !response.headers().contains_key(header::SET_COOKIE)
        && !response.headers().contains_key(header::LOCATION)
}

async fn buffer_response(
    response: Response,
) -> Result<(Response, CachedResponse), (Response, CacheStoreError)> {
    let (parts, body) = response.into_parts();
    match BodyExt::collect(body).await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            let cached = CachedResponse::new(parts.status, &parts.headers, bytes.clone());
            let rebuilt = Response::from_parts(parts, Body::from(bytes));
            Ok((rebuilt, cached))
        }
        Err(error) => {
            let rebuilt = Response::from_parts(parts, Body::empty());
            Err((rebuilt, CacheStoreError::Buffer(error.to_string())))
        }
    }
}
