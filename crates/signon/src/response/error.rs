use std::panic::Location;

use axum::response::{IntoResponse, Response};

/// The standard error response returned by handlers.
///
/// Everything that is not the client's fault collapses into a bare `500`; the details only go to
/// the logs.
#[derive(Debug)]
pub struct ErrorResponse(ErrorKind);

#[derive(Debug)]
enum ErrorKind {
    Unauthorized,
    InvalidQueryString { detail: String },
    InternalServerError,
}

impl ErrorResponse {
    pub(crate) fn unauthorized() -> Self {
        Self(ErrorKind::Unauthorized)
    }

    pub(crate) fn invalid_query_string(detail: impl Into<String>) -> Self {
        Self(ErrorKind::InvalidQueryString { detail: detail.into() })
    }

    #[track_caller]
    pub(crate) fn internal_server_error<E>(error: E) -> Self
    where
        E: std::error::Error + 'static,
    {
        error!(
            error = &error as &dyn std::error::Error,
            loc = %Location::caller(),
            "internal server error",
        );

        Self(ErrorKind::InternalServerError)
    }

    /// Like [`internal_server_error()`](Self::internal_server_error), for when there is no error
    /// value to log (the panic has been logged already).
    pub(crate) fn panicked() -> Self {
        Self(ErrorKind::InternalServerError)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        match self.0 {
            ErrorKind::Unauthorized => {
                (http::StatusCode::UNAUTHORIZED, "you are not logged in").into_response()
            },
            ErrorKind::InvalidQueryString { detail } => {
                (http::StatusCode::BAD_REQUEST, detail).into_response()
            },
            ErrorKind::InternalServerError => {
                http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
            },
        }
    }
}
