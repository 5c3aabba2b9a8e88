//! Mapping of core errors onto HTTP statuses.

use app_core::{CoreError, DbError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Boundary wrapper so handlers can use `?` on core calls.
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    status_code: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            CoreError::Field(_)
            | CoreError::Validation(_)
            | CoreError::Parsing(_)
            | CoreError::Upstream(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            CoreError::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            CoreError::Unauthorized => (StatusCode::FORBIDDEN, "Permission denied".to_string()),
            CoreError::Conflict(_) => (StatusCode::CONFLICT, self.0.to_string()),
            CoreError::Db(DbError::UniqueViolation(_)) => {
                (StatusCode::CONFLICT, self.0.to_string())
            }
            CoreError::Db(DbError::NotFound) => (StatusCode::NOT_FOUND, self.0.to_string()),
            CoreError::Db(_) | CoreError::Internal(_) => {
                error!(error = %self.0, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                status_code: status.as_u16(),
                message,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// 400 with a caller-facing message, for malformed request bodies.
pub fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError(CoreError::Parsing(message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_core::utils::validation::FieldError;

    fn status_of(err: CoreError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(
            status_of(FieldError::required("name").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CoreError::not_found("player")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(CoreError::Unauthorized), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(CoreError::conflict("player already merged")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(CoreError::Upstream("scraper exploded".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CoreError::Db(DbError::UniqueViolation(None))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(CoreError::Db(DbError::SerializationFailure)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
