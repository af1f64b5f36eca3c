//! Access logging.
//!
//! Emits exactly one `request completed` event per request with the method,
//! path, status, wall-clock duration and both bodies. Bodies are not
//! buffered: request and response frames are teed into bounded captures as
//! they stream past, and the event fires when the response body is finished
//! or dropped. A request dropped before any response exists is logged with
//! status 0.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use axum::body::Body;
use axum::extract::Request;
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use http_body_util::BodyExt;
use uuid::Uuid;

use super::request_id::RequestIds;

/// Maximum bytes kept per body.
pub const CAPTURE_LIMIT: usize = 64 * 1024;

#[derive(Debug, Default)]
struct Capture {
    bytes: Vec<u8>,
    truncated: bool,
}

impl Capture {
    fn push(&mut self, chunk: &[u8]) {
        let room = CAPTURE_LIMIT.saturating_sub(self.bytes.len());
        if chunk.len() > room {
            self.truncated = true;
        }
        self.bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

type SharedCapture = Arc<Mutex<Capture>>;

fn lock(capture: &SharedCapture) -> std::sync::MutexGuard<'_, Capture> {
    capture.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Pending log entry. Emitted on drop.
struct Entry {
    method: Method,
    path: String,
    request_id: Option<Uuid>,
    start: Instant,
    status: u16,
    request_body: SharedCapture,
    response_body: Capture,
}

impl Drop for Entry {
    fn drop(&mut self) {
        let request_body = lock(&self.request_body);
        let request_id = self.request_id.map(|id| id.to_string()).unwrap_or_default();
        tracing::info!(
            method = %self.method,
            path = %self.path,
            status = self.status,
            duration_ms = u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX),
            request_id = %request_id,
            request_body = %request_body.text(),
            request_body_truncated = request_body.truncated,
            response_body = %self.response_body.text(),
            response_body_truncated = self.response_body.truncated,
            "request completed"
        );
    }
}

pub async fn access_log(req: Request, next: Next) -> Response {
    let request_body: SharedCapture = Arc::default();
    let mut entry = Entry {
        method: req.method().clone(),
        path: req.uri().path().to_string(),
        request_id: req.extensions().get::<RequestIds>().map(|ids| ids.request_id),
        start: Instant::now(),
        status: 0,
        request_body: Arc::clone(&request_body),
        response_body: Capture::default(),
    };

    let (parts, body) = req.into_parts();
    let body = body.map_frame(move |frame| {
        if let Some(data) = frame.data_ref() {
            lock(&request_body).push(data);
        }
        frame
    });
    let req = Request::from_parts(parts, Body::new(body));

    let response = next.run(req).await;
    entry.status = response.status().as_u16();

    let (parts, body) = response.into_parts();
    let body = body.map_frame(move |frame| {
        if let Some(data) = frame.data_ref() {
            entry.response_body.push(data);
        }
        frame
    });
    Response::from_parts(parts, Body::new(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::middleware::from_fn;
    use axum::routing::post;
    use axum::Router;
    use bytes::Bytes;
    use tower::ServiceExt;

    use crate::test_support::{record_events, Fields};

    fn app() -> Router {
        Router::new()
            .route("/echo", post(|body: Bytes| async move { body }))
            .route(
                "/ignore",
                post(|| async { (StatusCode::CREATED, "ignored") }),
            )
            .layer(from_fn(access_log))
    }

    fn post_to(uri: &str, body: impl Into<Body>) -> Request {
        axum::http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(body.into())
            .unwrap()
    }

    async fn record<F, Fut>(f: F) -> Vec<Fields>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        record_events("request completed", f).await
    }

    #[tokio::test]
    async fn logs_one_entry_with_both_bodies() {
        let events = record(|| async {
            let response = app().oneshot(post_to("/echo", "hello")).await.unwrap();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert_eq!(&bytes[..], b"hello");
        })
        .await;

        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e["method"], "POST");
        assert_eq!(e["path"], "/echo");
        assert_eq!(e["status"], "200");
        assert_eq!(e["request_body"], "hello");
        assert_eq!(e["response_body"], "hello");
        assert_eq!(e["request_body_truncated"], "false");
        assert!(e.contains_key("duration_ms"));
    }

    #[tokio::test]
    async fn unread_response_still_logs_once() {
        let events = record(|| async {
            let response = app().oneshot(post_to("/ignore", "payload")).await.unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            drop(response);
        })
        .await;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["status"], "201");
        assert_eq!(events[0]["response_body"], "");
    }

    #[tokio::test]
    async fn large_bodies_are_truncated() {
        let big = vec![b'x'; CAPTURE_LIMIT + 10];
        let events = record(move || async move {
            let response = app().oneshot(post_to("/echo", big)).await.unwrap();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert_eq!(bytes.len(), CAPTURE_LIMIT + 10);
        })
        .await;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["request_body"].len(), CAPTURE_LIMIT);
        assert_eq!(events[0]["request_body_truncated"], "true");
        assert_eq!(events[0]["response_body_truncated"], "true");
    }

    #[test]
    fn capture_respects_limit_across_chunks() {
        let mut capture = Capture::default();
        capture.push(&vec![b'a'; CAPTURE_LIMIT - 1]);
        assert!(!capture.truncated);
        capture.push(b"bc");
        assert!(capture.truncated);
        assert_eq!(capture.bytes.len(), CAPTURE_LIMIT);
        assert_eq!(capture.bytes.last(), Some(&b'b'));
    }
}
