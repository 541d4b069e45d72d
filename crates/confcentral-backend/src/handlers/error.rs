use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use confcentral::data::ErrorBody;
use confcentral::errors::{ErrorKind, ServiceError};
use confcentral::log;

/// An error rendered as `{"error": "<KIND>", "message": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        Self::new(error.kind(), error.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(ErrorKind::BadRequest, rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        Self::new(ErrorKind::BadRequest, rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(ErrorKind::BadRequest, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.kind == ErrorKind::Unavailable {
            log::error!("Request failed: {}", self.message);
        } else {
            log::debug!("Request rejected with {status}: {}", self.message);
        }

        let body = ErrorBody {
            error: self.kind.code().to_string(),
            message: self.message,
        };
        (status, Json(body)).into_response()
    }
}

/// JSON body whose rejection renders as an [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Form body whose rejection renders as an [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(ApiError))]
pub struct ApiForm<T>(pub T);

/// Path parameters whose rejection renders as an [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

pub type ApiResult<T> = Result<Json<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use confcentral::errors::FilterError;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (ServiceError::Forbidden("no".to_string()), StatusCode::FORBIDDEN),
            (ServiceError::conference_not_found("abc"), StatusCode::NOT_FOUND),
            (ServiceError::AlreadyRegistered, StatusCode::CONFLICT),
            (
                ServiceError::Filter(FilterError::InvalidOperator("LIKE".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::Unavailable("down".to_string()), StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).into_response().status(), status);
        }
    }
}
