use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use axum::body::HttpBody;
use axum::extract::ConnectInfo;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::request_id::RequestId;
use tower_http::trace::{
    DefaultOnBodyChunk,
    HttpMakeClassifier,
    MakeSpan,
    OnEos,
    OnFailure,
    OnRequest,
    OnResponse,
    TraceLayer,
};

/// Returns a [`tower::Layer`] for emitting [`tracing`] events as requests are processed.
pub fn layer<RequestBody, ResponseBody>() -> TraceLayer<
    HttpMakeClassifier,
    impl MakeSpan<RequestBody> + Clone,
    impl OnRequest<RequestBody> + Clone,
    impl OnResponse<ResponseBody> + Clone,
    DefaultOnBodyChunk,
    impl OnEos + Clone,
    impl OnFailure<ServerErrorsFailureClass> + Clone,
>
where
    RequestBody: HttpBody,
    ResponseBody: HttpBody,
    ResponseBody::Error: fmt::Display + 'static,
{
    TraceLayer::new_for_http()
        .make_span_with(make_span::<RequestBody>)
        .on_request(on_request::<RequestBody>)
        .on_response(on_response::<ResponseBody>)
        .on_eos(on_eos)
        .on_failure(on_failure)
}

/// Creates the span every other callback records into.
///
/// `ConnectInfo` and `RequestId` are only missing when the router is driven directly (e.g. in
/// tests), so both fields are optional.
fn make_span<B>(request: &http::Request<B>) -> tracing::Span {
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|&ConnectInfo(addr)| addr.ip());

    let request_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok());

    info_span! {
        target: "signon::http",
        "request",
        client_addr = client_addr.map(tracing::field::display),
        request.id = request_id,
        request.method = %request.method(),
        request.uri = %request.uri(),
        request.version = ?request.version(),
        response.status = tracing::field::Empty,
    }
}

fn on_request<B>(request: &http::Request<B>, _span: &tracing::Span) {
    debug!(target: "signon::http::request", headers = ?request.headers(), "starting to process request");
}

fn on_response<B>(response: &http::Response<B>, latency: Duration, span: &tracing::Span) {
    span.record("response.status", response.status().as_u16());

    if let Some(location) = response.headers().get(http::header::LOCATION) {
        debug!(target: "signon::http::response", ?location, "redirecting");
    }

    info!(target: "signon::http::response", ?latency, "finished processing request");
}

fn on_eos(trailers: Option<&http::HeaderMap>, stream_duration: Duration, _span: &tracing::Span) {
    trace!(target: "signon::http::response", ?trailers, ?stream_duration);
}

fn on_failure(failure_class: ServerErrorsFailureClass, latency: Duration, span: &tracing::Span) {
    match failure_class {
        ServerErrorsFailureClass::StatusCode(status) => {
            span.record("response.status", status.as_u16());
            error!(target: "signon::http", status = status.as_u16(), ?latency, "failed to handle request");
        },
        ServerErrorsFailureClass::Error(error) => {
            error!(target: "signon::http", %error, ?latency, "failed to handle request");
        },
    }
}
