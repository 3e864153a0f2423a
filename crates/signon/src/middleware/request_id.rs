use tower_http::request_id::{MakeRequestId, RequestId};
use ulid::Ulid;

/// Returns an implementation of [`MakeRequestId`] that can be used with [`SetRequestIdLayer`].
///
/// Every request gets a fresh [ULID], so ids sort by arrival time in the logs.
///
/// [`SetRequestIdLayer`]: tower_http::request_id::SetRequestIdLayer
/// [ULID]: ulid::Ulid
pub fn make_request_id() -> impl MakeRequestId + Clone {
    UlidRequestId
}

#[derive(Debug, Clone, Copy)]
struct UlidRequestId;

impl MakeRequestId for UlidRequestId {
    fn make_request_id<B>(&mut self, _: &http::Request<B>) -> Option<RequestId> {
        http::HeaderValue::from_str(&Ulid::new().to_string())
            .map(RequestId::new)
            .ok()
    }
}
