use std::sync::{Arc, Mutex, OnceLock};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, layer::Context};

/// One structured log event emitted by the engine.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub fields: Vec<(String, String)>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The `event` field every engine log line carries.
    pub fn name(&self) -> Option<&str> {
        self.field("event")
    }
}

/// Events recorded by the process-wide test subscriber.
#[derive(Debug, Clone, Default)]
pub struct CapturedEvents {
    inner: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CapturedEvents {
    pub fn named(&self, event: &str) -> Vec<CapturedEvent> {
        self.inner
            .lock()
            .expect("event log poisoned")
            .iter()
            .filter(|e| e.name() == Some(event))
            .cloned()
            .collect()
    }
}

/// Install the capturing subscriber once per test binary.
pub fn init_test_tracing() -> CapturedEvents {
    static EVENTS: OnceLock<CapturedEvents> = OnceLock::new();

    EVENTS
        .get_or_init(|| {
            let events = CapturedEvents::default();
            let subscriber = tracing_subscriber::registry().with(TestEventLayer {
                events: events.clone(),
            });

            tracing::subscriber::set_global_default(subscriber)
                .expect("failed to set global tracing subscriber");

            events
        })
        .clone()
}

struct TestEventLayer {
    events: CapturedEvents,
}

impl<S> Layer<S> for TestEventLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor { fields: Vec::new() };
        event.record(&mut visitor);

        let meta = event.metadata();

        self.events
            .inner
            .lock()
            .expect("event log poisoned")
            .push(CapturedEvent {
                level: *meta.level(),
                target: meta.target().to_string(),
                fields: visitor.fields,
            });
    }
}

struct FieldVisitor {
    fields: Vec<(String, String)>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields
            .push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields
            .push((field.name().to_string(), value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.fields
            .push((field.name().to_string(), format!("{value:?}")));
    }
}
