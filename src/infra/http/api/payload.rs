//! Setup form decoding.
//!
//! The setup endpoint accepts JSON, urlencoded forms and multipart bodies;
//! all three land in the same [`SetupRequest`].

use axum::{
    Form, Json,
    extract::{FromRequest, Multipart, Request},
    http::{StatusCode, header},
};
use serde::Deserialize;

use crate::{
    application::setup::{AvatarUpload, SetupRequest},
    domain::setup::SetupSubmission,
};

use super::error::ApiError;

const AVATAR_FIELDS: [&str; 2] = ["avatarPhoto", "avatar_photo"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetupFields {
    #[serde(default, alias = "owner_name")]
    owner_name: Option<String>,
    #[serde(default, alias = "owner_email")]
    owner_email: Option<String>,
    #[serde(default, alias = "site_name")]
    site_name: Option<String>,
    #[serde(default, alias = "site_subtitle")]
    site_subtitle: Option<String>,
    #[serde(default)]
    bio: Option<String>,
}

impl From<SetupFields> for SetupSubmission {
    fn from(fields: SetupFields) -> Self {
        Self {
            owner_name: fields.owner_name,
            owner_email: fields.owner_email,
            site_name: fields.site_name,
            site_subtitle: fields.site_subtitle,
            bio: fields.bio,
        }
    }
}

/// Setup submission decoded from whichever body encoding the client used.
#[derive(Debug)]
pub struct SetupPayload(pub SetupRequest);

impl<S> FromRequest<S> for SetupPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_ascii_lowercase())
            .unwrap_or_default();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|rejection| rejected(rejection.status(), rejection.body_text()))?;
            return read_multipart(multipart).await.map(SetupPayload);
        }

        let fields = if content_type.starts_with("application/json") {
            let Json(fields) = Json::<SetupFields>::from_request(req, state)
                .await
                .map_err(|rejection| rejected(rejection.status(), rejection.body_text()))?;
            fields
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<SetupFields>::from_request(req, state)
                .await
                .map_err(|rejection| rejected(rejection.status(), rejection.body_text()))?;
            fields
        } else {
            return Err(ApiError::bad_request(
                "Unsupported content type",
                Some(
                    "Send application/json, application/x-www-form-urlencoded or multipart/form-data"
                        .to_string(),
                ),
            ));
        };

        Ok(SetupPayload(SetupRequest {
            submission: fields.into(),
            avatar: None,
        }))
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<SetupRequest, ApiError> {
    let mut submission = SetupSubmission::default();
    let mut avatar = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| rejected(err.status(), err.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if AVATAR_FIELDS.contains(&name.as_str()) {
            let filename = field.file_name().unwrap_or("avatar").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| rejected(err.status(), err.body_text()))?;
            // Browsers send an empty part when no file was chosen.
            if !bytes.is_empty() {
                avatar = Some(AvatarUpload {
                    filename,
                    content_type,
                    bytes,
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|err| rejected(err.status(), err.body_text()))?;
        let slot = match name.as_str() {
            "ownerName" | "owner_name" => &mut submission.owner_name,
            "ownerEmail" | "owner_email" => &mut submission.owner_email,
            "siteName" | "site_name" => &mut submission.site_name,
            "siteSubtitle" | "site_subtitle" => &mut submission.site_subtitle,
            "bio" => &mut submission.bio,
            _ => continue,
        };
        *slot = Some(value);
    }

    Ok(SetupRequest { submission, avatar })
}

fn rejected(status: StatusCode, detail: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(Some(detail))
    } else {
        ApiError::bad_request("Malformed setup payload", Some(detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    async fn decode(content_type: &str, body: impl Into<Body>) -> Result<SetupRequest, ApiError> {
        let request = Request::builder()
            .method("POST")
            .uri("/api/setup")
            .header(header::CONTENT_TYPE, content_type)
            .body(body.into())
            .expect("request");
        SetupPayload::from_request(request, &())
            .await
            .map(|SetupPayload(request)| request)
    }

    #[tokio::test]
    async fn json_accepts_camel_and_snake_case() {
        let camel = decode(
            "application/json",
            r#"{"ownerName":"Ada","siteName":"Notes","bio":"hi"}"#,
        )
        .await
        .expect("camelCase");
        assert_eq!(camel.submission.owner_name.as_deref(), Some("Ada"));
        assert_eq!(camel.submission.bio.as_deref(), Some("hi"));

        let snake = decode("application/json", r#"{"owner_name":"Ada","site_name":"Notes"}"#)
            .await
            .expect("snake_case");
        assert_eq!(snake.submission.site_name.as_deref(), Some("Notes"));
    }

    #[tokio::test]
    async fn urlencoded_form_is_decoded() {
        let request = decode(
            "application/x-www-form-urlencoded",
            "ownerName=Ada+Lovelace&siteName=Notes&ownerEmail=ada%40example.com",
        )
        .await
        .expect("form");
        assert_eq!(request.submission.owner_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(
            request.submission.owner_email.as_deref(),
            Some("ada@example.com")
        );
        assert!(request.avatar.is_none());
    }

    #[tokio::test]
    async fn multipart_reads_text_fields_and_avatar() {
        let boundary = "folio-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"ownerName\"\r\n\r\n\
             Ada\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"site_name\"\r\n\r\n\
             Notes\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"avatarPhoto\"; filename=\"me.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             PNGDATA\r\n\
             --{boundary}--\r\n"
        );

        let request = decode(&format!("multipart/form-data; boundary={boundary}"), body)
            .await
            .expect("multipart");

        assert_eq!(request.submission.owner_name.as_deref(), Some("Ada"));
        assert_eq!(request.submission.site_name.as_deref(), Some("Notes"));
        let avatar = request.avatar.expect("avatar");
        assert_eq!(avatar.filename, "me.png");
        assert_eq!(avatar.content_type, "image/png");
        assert_eq!(&avatar.bytes[..], b"PNGDATA");
    }

    #[tokio::test]
    async fn empty_file_part_is_ignored() {
        let boundary = "folio-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"ownerName\"\r\n\r\n\
             Ada\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"avatarPhoto\"; filename=\"\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             \r\n\
             --{boundary}--\r\n"
        );

        let request = decode(&format!("multipart/form-data; boundary={boundary}"), body)
            .await
            .expect("multipart");
        assert!(request.avatar.is_none());
    }

    #[tokio::test]
    async fn unknown_content_type_is_rejected() {
        let err = decode("text/plain", "ownerName=Ada")
            .await
            .expect_err("unsupported");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let err = decode("application/json", "{not json")
            .await
            .expect_err("malformed");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
