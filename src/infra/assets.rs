//! Embedded static assets: stylesheet, theme toggle and canvas animations.

use axum::{
    body::Body,
    extract::Path,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use include_dir::{Dir, include_dir};

use crate::application::error::ErrorReport;

static STATIC_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

pub async fn serve_static(path: Option<Path<String>>) -> Response {
    let captured = path.map(|Path(value)| value).unwrap_or_default();
    match resolve_asset(&captured) {
        Some((name, contents)) => build_response(name, contents),
        None => {
            let mut response = StatusCode::NOT_FOUND.into_response();
            ErrorReport::from_message(
                "infra::assets::serve_static",
                StatusCode::NOT_FOUND,
                format!("Static asset `{captured}` not found"),
            )
            .attach(&mut response);
            response
        }
    }
}

fn resolve_asset(path: &str) -> Option<(&str, &'static [u8])> {
    let candidate = path.trim_start_matches('/');
    if candidate.is_empty() || candidate.ends_with('/') || candidate.contains("..") {
        return None;
    }
    STATIC_ASSETS
        .get_file(candidate)
        .map(|file| (candidate, file.contents()))
}

fn build_response(name: &str, contents: &'static [u8]) -> Response {
    let mime = mime_guess::from_path(name).first_or_octet_stream();
    let mut response = Response::new(Body::from(Bytes::from_static(contents)));

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(contents.len()));
    // Asset names are not fingerprinted, so keep revalidation cheap.
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );

    response
}
