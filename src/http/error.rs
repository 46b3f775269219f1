use crate::error::{Error, ErrorKind};
use crate::http::schema::ErrorBody;
use axum::Json;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// A service error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &*self.0 {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn validation(detail: String) -> Self {
        Self(Error::from(ErrorKind::Validation(detail)))
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind: &ErrorKind = &self.0;
        let detail = if status.is_server_error() {
            tracing::error!(error = ?self.0, "request failed");
            "Internal Server Error".to_string()
        } else {
            tracing::debug!(%status, error = %kind, "request rejected");
            kind.to_string()
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}
