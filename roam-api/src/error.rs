use axum::{
    extract::multipart::MultipartError,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use roam_booking::LifecycleError;
use roam_catalog::CatalogError;
use roam_core::ArtifactError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    UpstreamError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::UpstreamError(msg) => {
                tracing::error!("Upstream failure: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Upstream service failed".to_string())
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Validation(msg) => AppError::ValidationError(msg),
            LifecycleError::NotFound(what) => AppError::NotFoundError(format!("{} not found", what)),
            LifecycleError::Conflict(msg) => AppError::ConflictError(msg),
            LifecycleError::InvalidTransition(msg) => AppError::ValidationError(msg),
            e @ LifecycleError::InvalidSignature => AppError::ValidationError(e.to_string()),
            e @ LifecycleError::InvoiceUnavailable => AppError::ValidationError(e.to_string()),
            LifecycleError::Upstream(msg) => AppError::UpstreamError(msg),
            LifecycleError::Store(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(msg) => AppError::ValidationError(msg),
            CatalogError::NotFound(what) => AppError::NotFoundError(format!("{} not found", what)),
            CatalogError::Forbidden(msg) => AppError::AuthorizationError(msg),
            CatalogError::Conflict(msg) => AppError::ConflictError(msg),
            CatalogError::Store(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<ArtifactError> for AppError {
    fn from(err: ArtifactError) -> Self {
        match err {
            ArtifactError::Empty => AppError::ValidationError(err.to_string()),
            ArtifactError::Io(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::ValidationError(format!("Malformed form data: {}", err.body_text()))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Anyhow(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_status_codes() {
        let cases = [
            (LifecycleError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (LifecycleError::NotFound("Booking".into()), StatusCode::NOT_FOUND),
            (LifecycleError::Conflict("taken".into()), StatusCode::CONFLICT),
            (LifecycleError::InvalidTransition("late".into()), StatusCode::BAD_REQUEST),
            (LifecycleError::InvalidSignature, StatusCode::BAD_REQUEST),
            (LifecycleError::InvoiceUnavailable, StatusCode::BAD_REQUEST),
            (LifecycleError::Upstream("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_store_failures_do_not_leak() {
        let err: AppError = LifecycleError::Store(roam_shared::StoreError::Backend("password=hunter2".into())).into();
        assert!(matches!(err, AppError::InternalServerError(ref m) if m.contains("hunter2")));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
