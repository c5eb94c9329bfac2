use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use domain::error::{
    ContextErrorKind, DomainErrorKind, EntityErrorKind, Error as DomainError, InternalErrorKind,
};

use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, reason) = match &self.0.error_kind {
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Entity(entity_error_kind) => match entity_error_kind {
                    EntityErrorKind::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
                    EntityErrorKind::Invalid(reason) => {
                        (StatusCode::UNPROCESSABLE_ENTITY, reason.clone())
                    }
                    EntityErrorKind::Conflict => (
                        StatusCode::CONFLICT,
                        "resource is already in use".to_string(),
                    ),
                    EntityErrorKind::DbTransaction | EntityErrorKind::Other(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal server error".to_string(),
                    ),
                },
                InternalErrorKind::Other(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                ),
            },
            DomainErrorKind::Context(context_error_kind) => match context_error_kind {
                ContextErrorKind::Canceled => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "request canceled".to_string(),
                ),
                ContextErrorKind::DeadlineExceeded => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "request deadline exceeded".to_string(),
                ),
            },
        };

        if status.is_server_error() {
            error!("Request failed with {status}: {}", self.0);
        } else {
            debug!("Request rejected with {status}: {}", self.0);
        }

        (status, Json(json!({ "reason": reason }))).into_response()
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
