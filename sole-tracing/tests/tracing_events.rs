use std::{
    fmt,
    sync::{Arc, Mutex},
};

use sole::{hooks::Hooks, prelude::*};
use sole_tracing::{TARGET, TracingObserver};
use tracing::field::{Field, Visit};
use tracing_subscriber::{Registry, layer::SubscriberExt};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Recorded {
    message: String,
    type_name: String,
    attached: u64,
}

#[derive(Clone, Default)]
struct RecordingLayer(Arc<Mutex<Vec<Recorded>>>);

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for RecordingLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        if event.metadata().target() != TARGET {
            return;
        }

        struct FieldVisitor(Recorded);

        impl Visit for FieldVisitor {
            fn record_str(&mut self, field: &Field, value: &str) {
                if field.name() == "type_name" {
                    self.0.type_name = value.to_owned();
                }
            }

            fn record_u64(&mut self, field: &Field, value: u64) {
                if field.name() == "attached" {
                    self.0.attached = value;
                }
            }

            fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
                if field.name() == "message" {
                    self.0.message = format!("{value:?}");
                }
            }
        }

        let mut visitor = FieldVisitor(Recorded {
            message: String::new(),
            type_name: String::new(),
            attached: 0,
        });
        event.record(&mut visitor);
        self.0.lock().unwrap().push(visitor.0);
    }
}

struct Connection {
    _port: u16,
}

// Hooks are global, so everything runs in a single test
#[test]
fn test_lifecycle_events() {
    Hooks::new()
        .observer(TracingObserver {
            allocations: true,
            attachments: true,
            disposals: true,
        })
        .install()
        .unwrap();

    // The convenience installer refuses to replace existing hooks
    assert!(sole_tracing::install().is_err());

    let layer = RecordingLayer::default();
    let subscriber = Registry::default().with(layer.clone());

    tracing::subscriber::with_default(subscriber, || {
        let connection: Own<Connection> = Own::new(Connection { _port: 80 });
        let buffer: Own<Vec<u8>> = Own::new(vec![0; 8]);
        let connection = connection.attach(buffer);
        drop(connection);
    });

    let connection = std::any::type_name::<Connection>();
    let buffer = std::any::type_name::<Vec<u8>>();
    let recorded = layer.0.lock().unwrap().clone();
    let summary: Vec<(&str, &str, u64)> = recorded
        .iter()
        .map(|r| (r.message.as_str(), r.type_name.as_str(), r.attached))
        .collect();

    assert_eq!(
        summary,
        [
            ("allocated", connection, 0),
            ("allocated", buffer, 0),
            ("attached", connection, 1),
            ("disposed", connection, 1),
        ]
    );
}
