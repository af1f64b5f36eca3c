//! Request and trace identifier injection.
//!
//! Each request gets a fresh UUID v4 in `x-request-id` and `x-trace-id`.
//! Client-supplied values are replaced, never trusted. Both headers are
//! forwarded to the backend with the rest of the request headers, and the
//! request id is echoed on the response.

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
pub const TRACE_ID_HEADER: HeaderName = HeaderName::from_static("x-trace-id");

/// Identifiers assigned to the current request, readable by later stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestIds {
    pub request_id: Uuid,
    pub trace_id: Uuid,
}

impl RequestIds {
    #[must_use]
    pub fn generate() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            trace_id: Uuid::new_v4(),
        }
    }
}

fn header_value(id: Uuid) -> HeaderValue {
    // A hyphenated UUID is always visible ASCII.
    HeaderValue::from_str(&id.to_string()).unwrap_or_else(|_| HeaderValue::from_static(""))
}

pub async fn inject_ids(mut req: Request, next: Next) -> Response {
    let ids = RequestIds::generate();
    let request_id = header_value(ids.request_id);

    let headers = req.headers_mut();
    headers.insert(REQUEST_ID_HEADER, request_id.clone());
    headers.insert(TRACE_ID_HEADER, header_value(ids.trace_id));
    req.extensions_mut().insert(ids);

    let mut response = next.run(req).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, request_id);
    response
}
