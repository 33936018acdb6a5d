use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{info, warn};

use crate::application::{
    cms::{AssetRecord, CmsError},
    diagnostics::{DebugConfigReport, DebugReport, DebugSetupReport},
    setup::{SetupOutcome, SetupStatus},
};

use super::error::ApiError;
use super::payload::SetupPayload;
use super::state::ApiState;

const ASSET_CACHE_CONTROL: &str = "public, max-age=3600, s-maxage=3600";
const NO_STORE: &str = "no-cache, no-store, must-revalidate";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: SetupOutcome,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupStatusResponse {
    #[serde(flatten)]
    pub status: SetupStatus,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ForceRefreshResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
}

pub async fn complete_setup(
    State(state): State<ApiState>,
    SetupPayload(request): SetupPayload,
) -> Result<Json<SetupResponse>, ApiError> {
    let outcome = state.setup.complete(request).await?;
    state.cache.invalidate_all().await;

    Ok(Json(SetupResponse {
        success: true,
        outcome,
    }))
}

pub async fn setup_status(State(state): State<ApiState>) -> Response {
    let status = state.setup.status().await;
    let mut response = Json(SetupStatusResponse {
        status,
        timestamp: now_rfc3339(),
    })
    .into_response();

    forbid_caching(&mut response);
    response
        .headers_mut()
        .insert(header::EXPIRES, HeaderValue::from_static("0"));
    response
}

pub async fn asset(
    State(state): State<ApiState>,
    Path(uid): Path<String>,
) -> Result<Response, ApiError> {
    let record: AssetRecord = state.store.fetch_asset(&uid).await.map_err(|err| {
        if !matches!(err, CmsError::NotFound { .. }) {
            warn!(
                target = "folio::http::api::asset",
                uid = %uid,
                error = %err,
                "asset lookup failed"
            );
        }
        ApiError::from_cms("Asset lookup failed", &err)
    })?;

    let mut response = Json(record).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(ASSET_CACHE_CONTROL),
    );
    Ok(response)
}

pub async fn force_refresh(State(state): State<ApiState>) -> Response {
    let cleared = state.cache.invalidate_all().await;
    info!(
        target = "folio::http::api::force_refresh",
        cleared, "page cache cleared"
    );

    let mut response = Json(ForceRefreshResponse {
        success: true,
        message: format!("Cleared {cleared} cached page(s)"),
        timestamp: now_rfc3339(),
    })
    .into_response();
    forbid_caching(&mut response);
    response
}

pub async fn debug(State(state): State<ApiState>) -> Json<DebugReport> {
    Json(state.diagnostics.debug().await)
}

pub async fn debug_config(State(state): State<ApiState>) -> Json<DebugConfigReport> {
    Json(state.diagnostics.debug_config().await)
}

pub async fn debug_setup(State(state): State<ApiState>) -> Json<DebugSetupReport> {
    let recently_completed = state.setup.recent().is_recent();
    Json(state.diagnostics.debug_setup(recently_completed).await)
}

fn forbid_caching(response: &mut Response) {
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
