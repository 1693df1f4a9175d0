//! Job and tag repositories that execute against the tenant-resolved store.
//!
//! Repositories never receive a store handle from their caller. They wrap each
//! operation in `ScopedConnectionContext::run` and ask the context for the
//! current connection from inside it.

use tracing::Span;

use crate::context::{Connection, ScopedConnectionContext};

pub mod job;
pub mod tag;

pub use job::{JobRepository, RoutedJobRepository};
pub use tag::{RoutedTagRepository, TagRepository};

/// The connection bound for this call, noted on the enclosing span as `store`.
fn current(context: &ScopedConnectionContext) -> Connection {
    let connection = context.current();
    Span::current().record("store", connection.name().as_str());
    connection
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use std::fmt;
    use std::sync::{Arc, Mutex};

    use tracing::Subscriber;
    use tracing::field::{Field, Visit};
    use tracing::span::{Attributes, Id, Record};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    use eventhorizon_core::{StoreDescriptor, TenantMapping};

    use crate::registry::StoreRegistry;
    use crate::resolver::TenantConnectionResolver;
    use crate::store::InMemoryStore;

    type Fields = BTreeMap<&'static str, String>;

    /// Keeps the name and fields of every span opened while installed.
    #[derive(Clone, Default)]
    struct SpanRecorder {
        spans: Arc<Mutex<Vec<(u64, &'static str, Fields)>>>,
    }

    struct FieldVisitor<'a>(&'a mut Fields);

    impl Visit for FieldVisitor<'_> {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name(), value.to_string());
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.insert(field.name(), format!("{value:?}"));
        }
    }

    impl<S: Subscriber> Layer<S> for SpanRecorder {
        fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, _ctx: Context<'_, S>) {
            let mut fields = Fields::new();
            attrs.record(&mut FieldVisitor(&mut fields));
            self.spans
                .lock()
                .unwrap()
                .push((id.into_u64(), attrs.metadata().name(), fields));
        }

        fn on_record(&self, id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
            let mut spans = self.spans.lock().unwrap();
            // Ids are reused once a span closes; the open one is the latest.
            let open = spans.iter_mut().rev().find(|(span, _, _)| *span == id.into_u64());
            if let Some((_, _, fields)) = open {
                values.record(&mut FieldVisitor(fields));
            }
        }
    }

    fn context() -> Arc<ScopedConnectionContext> {
        let registry = StoreRegistry::builder("horizon")
            .register(StoreDescriptor::new("horizon", 0), InMemoryStore::arc())
            .unwrap()
            .register(StoreDescriptor::new("service_billing", 1), InMemoryStore::arc())
            .unwrap()
            .build()
            .unwrap();
        let resolver = TenantConnectionResolver::new(
            Arc::new(registry),
            [TenantMapping::new("billing_service", "service_billing")],
        );
        Arc::new(ScopedConnectionContext::new(resolver, "test-horizon-prefix:"))
    }

    fn field<'a>(fields: &'a Fields, name: &str) -> Option<&'a str> {
        fields.get(name).map(String::as_str)
    }

    #[test]
    fn every_operation_spans_tenant_and_resolved_store() {
        let context = context();
        let jobs = RoutedJobRepository::new(Arc::clone(&context));
        let tags = RoutedTagRepository::new(context);
        let recorder = SpanRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());

        tracing::subscriber::with_default(subscriber, || {
            let billing = Some("billing_service");
            let monitored = BTreeSet::from(["billing".to_string()]);

            jobs.count_recent(billing).unwrap();
            jobs.count_pending(billing).unwrap();
            tags.monitor("billing", billing).unwrap();
            tags.monitoring(billing).unwrap();
            tags.monitored(&monitored, billing).unwrap();
            tags.count("billing", billing).unwrap();
            tags.jobs("billing", billing).unwrap();
            tags.stop_monitoring("billing", billing).unwrap();
            tags.count("billing", Some("nobody")).unwrap();
        });

        let spans = recorder.spans.lock().unwrap();
        let names: BTreeSet<&str> = spans.iter().map(|(_, name, _)| *name).collect();
        for op in [
            "count_recent",
            "count_pending",
            "monitor",
            "monitoring",
            "monitored",
            "count",
            "jobs",
            "stop_monitoring",
        ] {
            assert!(names.contains(op), "no span for {op}");
        }

        for (_, name, fields) in spans.iter() {
            let expected = match field(fields, "tenant") {
                Some("billing_service") => "service_billing",
                Some("nobody") => "horizon",
                other => panic!("{name} recorded unexpected tenant {other:?}"),
            };
            assert_eq!(field(fields, "store"), Some(expected), "{name}");
        }
    }
}
