//! Middleware to add an ULID-based request id response header

use http::{header::HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};

/// A `MakeRequestId` that tags each request with a fresh ULID
#[derive(Clone, Copy, Debug, Default)]
pub struct MakeRequestUlid;

impl MakeRequestId for MakeRequestUlid {
    fn make_request_id<B>(&mut self, _: &Request<B>) -> Option<RequestId> {
        let ulid = ulid::Ulid::new();

        HeaderValue::from_str(&ulid.to_string())
            .ok()
            .map(RequestId::new)
    }
}
