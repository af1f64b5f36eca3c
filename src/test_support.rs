//! Shared helpers for unit tests that assert on emitted events.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

pub type Fields = BTreeMap<String, String>;

#[derive(Default)]
struct Visitor(Fields);

impl Visit for Visitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

struct Recorder {
    message: &'static str,
    events: Arc<Mutex<Vec<Fields>>>,
}

impl<S: Subscriber> Layer<S> for Recorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = Visitor::default();
        event.record(&mut visitor);
        if visitor.0.get("message").map(String::as_str) == Some(self.message) {
            self.events.lock().unwrap().push(visitor.0);
        }
    }
}

/// Run `f` on the current thread and return the fields of every event whose
/// message equals `message`.
pub async fn record_events<F, Fut>(message: &'static str, f: F) -> Vec<Fields>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(Recorder {
        message,
        events: Arc::clone(&events),
    });
    let _guard = tracing::subscriber::set_default(subscriber);
    f().await;
    let recorded = events.lock().unwrap().clone();
    recorded
}
