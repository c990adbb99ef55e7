use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use unevent_api_types::{ApiErrorBody, ApiErrorMessage};

use crate::application::content::ContentError;
use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const NOT_FOUND: &str = "not_found";
    pub const DUPLICATE: &str = "duplicate";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const REPO: &str = "repo_error";
}

/// JSON error returned by API routes.
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

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Bearer token required",
            None,
        )
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::ConstraintViolation(field) => Self::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_INPUT,
                "Invalid input",
                Some(field.to_string()),
            ),
            ContentError::NotFound(what) => Self::new(
                StatusCode::NOT_FOUND,
                codes::NOT_FOUND,
                "Resource not found",
                Some(what.to_string()),
            ),
            ContentError::Domain(DomainError::Validation { message }) => Self::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_INPUT,
                "Invalid input",
                Some(message),
            ),
            ContentError::Repo(repo) => Self::from(repo),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::from(ContentError::Domain(err))
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate { constraint } => Self::new(
                StatusCode::CONFLICT,
                codes::DUPLICATE,
                "Duplicate record",
                Some(constraint),
            ),
            RepoError::NotFound => Self::not_found("Resource not found"),
            RepoError::Persistence(message) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::REPO,
                "Persistence error",
                Some(message),
            ),
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
    fn content_errors_map_to_status() {
        let err = ApiError::from(ContentError::ConstraintViolation("title"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(ContentError::NotFound("profile"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::from(ContentError::Repo(RepoError::Duplicate {
            constraint: "users_email_key".to_string(),
        }));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn response_carries_report() {
        let response = ApiError::unauthorized().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.messages, vec!["unauthorized: Bearer token required"]);
    }
}
