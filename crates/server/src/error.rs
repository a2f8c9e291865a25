use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use database::services::error::ServiceError;
use log::error;
use serde_json::json;

/// Error type for JSON view handlers.
///
/// Form submissions never return this; they turn errors into notices.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Service(#[from] ServiceError),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Service(err) = &self;

        let (status, code, message) = match err {
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ServiceError::PermissionDenied(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            ServiceError::Validation(errors) => {
                let body = json!({
                    "error": errors.to_string(),
                    "code": "VALIDATION_ERROR",
                    "fields": errors,
                });
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
            ServiceError::Duplicate { message, .. } => {
                (StatusCode::CONFLICT, "CONFLICT", message.clone())
            }
            ServiceError::Database(db_err) => {
                error!("Database error: {db_err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::validation::ValidationErrors;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::from(ServiceError::not_found("x")), StatusCode::NOT_FOUND),
            (
                AppError::from(ServiceError::permission_denied("x")),
                StatusCode::FORBIDDEN,
            ),
            (
                AppError::from(ServiceError::from(ValidationErrors::single("f", "bad"))),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(ServiceError::duplicate("course_id", "taken")),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(ServiceError::from(sea_orm::DbErr::Custom("boom".into()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
