use crate::application::{cms::CmsError, error::ErrorReport, setup::SetupError};
use crate::domain::{error::DomainError, setup::MISSING_REQUIRED_FIELDS};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INVALID_AVATAR: &str = "invalid_avatar";
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";
    pub const ALREADY_COMPLETED: &str = "already_completed";
    pub const CONTENT_TYPES_MISSING: &str = "content_types_missing";
    pub const CMS_NOT_CONFIGURED: &str = "cms_not_configured";
    pub const CMS: &str = "cms_error";
    pub const NOT_FOUND: &str = "not_found";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn payload_too_large(hint: Option<String>) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            codes::PAYLOAD_TOO_LARGE,
            "Request body is too large",
            hint,
        )
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    /// Maps a failed store call to 500 when credentials are missing and 502
    /// for anything the CMS itself got wrong.
    pub fn from_cms(message: &'static str, err: &CmsError) -> Self {
        match err {
            CmsError::MissingCredentials(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::CMS_NOT_CONFIGURED,
                "CMS credentials are not configured",
                Some(err.to_string()),
            ),
            CmsError::NotFound { .. } => Self::new(
                StatusCode::NOT_FOUND,
                codes::NOT_FOUND,
                message,
                Some(err.to_string()),
            ),
            _ => Self::new(
                StatusCode::BAD_GATEWAY,
                codes::CMS,
                message,
                Some(err.to_string()),
            ),
        }
    }
}

impl From<SetupError> for ApiError {
    fn from(err: SetupError) -> Self {
        match err {
            SetupError::Validation(DomainError::MissingFields { fields }) => Self::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_INPUT,
                MISSING_REQUIRED_FIELDS,
                Some(format!("Missing: {}", fields.join(", "))),
            ),
            err @ SetupError::AvatarNotImage(_) => Self::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_AVATAR,
                "Avatar must be an image",
                Some(err.to_string()),
            ),
            err @ SetupError::AvatarTooLarge { .. } => Self::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                codes::PAYLOAD_TOO_LARGE,
                "Avatar exceeds the upload limit",
                Some(err.to_string()),
            ),
            SetupError::AlreadyCompleted => Self::new(
                StatusCode::CONFLICT,
                codes::ALREADY_COMPLETED,
                "Setup has already been completed",
                None,
            ),
            SetupError::ContentTypesMissing => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::CONTENT_TYPES_MISSING,
                "Content types are not provisioned yet",
                Some("Run `folio provision` or retry shortly".to_string()),
            ),
            SetupError::Cms { source, .. } => Self::from_cms("CMS request failed", &source),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http::api",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
        )
        .attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_errors_map_to_statuses() {
        let cases = [
            (
                SetupError::Validation(DomainError::missing_fields(vec!["ownerName"])),
                StatusCode::BAD_REQUEST,
                codes::INVALID_INPUT,
            ),
            (
                SetupError::AlreadyCompleted,
                StatusCode::CONFLICT,
                codes::ALREADY_COMPLETED,
            ),
            (
                SetupError::AvatarTooLarge { size: 10, limit: 5 },
                StatusCode::PAYLOAD_TOO_LARGE,
                codes::PAYLOAD_TOO_LARGE,
            ),
            (
                SetupError::Cms {
                    operation: "create_entry",
                    source: CmsError::MissingCredentials("management_token"),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::CMS_NOT_CONFIGURED,
            ),
            (
                SetupError::Cms {
                    operation: "create_entry",
                    source: CmsError::Transport("reset".into()),
                },
                StatusCode::BAD_GATEWAY,
                codes::CMS,
            ),
        ];

        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status(), status);
            assert_eq!(api.code(), code);
        }
    }

    #[test]
    fn response_carries_report() {
        let response = ApiError::not_found("Asset not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorReport>().is_some());
    }
}
