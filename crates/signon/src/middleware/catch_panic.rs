use std::any::Any;

use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};

use crate::response::ErrorResponse;

/// Returns a [`tower::Layer`] that turns panicking handlers into `500 Internal Server Error`.
pub fn layer() -> CatchPanicLayer<PanicResponse> {
    CatchPanicLayer::custom(PanicResponse)
}

#[derive(Debug, Clone, Copy)]
pub struct PanicResponse;

impl ResponseForPanic for PanicResponse {
    type ResponseBody = axum::body::Body;

    fn response_for_panic(&mut self, panic_payload: Box<dyn Any + Send + 'static>) -> Response {
        let message = panic_payload
            .downcast_ref::<&'static str>()
            .copied()
            .or_else(|| panic_payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("<unavailable>");

        error!(message, "request handler panicked");

        ErrorResponse::panicked().into_response()
    }
}
