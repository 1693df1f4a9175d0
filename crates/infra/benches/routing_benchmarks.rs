use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use eventhorizon_core::{JobPayload, StoreDescriptor, TenantMapping};
use eventhorizon_events::{JobPushed, Listener};
use eventhorizon_infra::{
    EventHorizon, InMemoryConnector, JobRepository, RoutingConfig, TagRepository,
};

/// A config with `tenants` mapped tenants spread over four stores.
fn config(tenants: usize) -> RoutingConfig {
    let mut config = RoutingConfig::default()
        .with_prefix("bench:")
        .with_store(StoreDescriptor::new("horizon", 0));
    for db in 1..=4 {
        config = config.with_store(StoreDescriptor::new(format!("service_{db}"), db));
    }
    for i in 0..tenants {
        let store = format!("service_{}", i % 4 + 1);
        config = config.with_tenant(TenantMapping::new(format!("tenant_{i}"), store));
    }
    config
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for tenants in [10usize, 1_000] {
        let horizon = EventHorizon::bootstrap(&config(tenants), &InMemoryConnector::new()).unwrap();
        let resolver = horizon.context().resolver();

        group.bench_with_input(BenchmarkId::new("mapped", tenants), &tenants, |b, _| {
            b.iter(|| black_box(resolver.resolve(black_box(Some("tenant_7")))))
        });
        group.bench_with_input(BenchmarkId::new("unmapped", tenants), &tenants, |b, _| {
            b.iter(|| black_box(resolver.resolve(black_box(Some("nobody")))))
        });
        group.bench_with_input(BenchmarkId::new("absent", tenants), &tenants, |b, _| {
            b.iter(|| black_box(resolver.resolve(black_box(None))))
        });
    }

    group.finish();
}

fn bench_scoped_run(c: &mut Criterion) {
    let horizon = EventHorizon::bootstrap(&config(100), &InMemoryConnector::new()).unwrap();
    let context = horizon.context();

    c.bench_function("run/bind_and_release", |b| {
        b.iter(|| context.run(black_box(Some("tenant_3")), || black_box(context.current())))
    });

    c.bench_function("run/nested", |b| {
        b.iter(|| {
            context.run(Some("tenant_1"), || {
                context.run(Some("tenant_2"), || black_box(context.current()))
            })
        })
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let horizon = EventHorizon::bootstrap(&config(100), &InMemoryConnector::new()).unwrap();
    let tags = vec!["billing".to_string(), "payment".to_string()];
    let payload = JobPayload::new("BenchJob", tags, serde_json::json!({}));
    horizon.tags().monitor("billing", Some("tenant_5")).unwrap();

    c.bench_function("jobs/pushed", |b| {
        b.iter(|| horizon.jobs().pushed(Some("tenant_5"), "default", black_box(&payload)))
    });

    c.bench_function("tags/monitored_empty", |b| {
        let empty = Default::default();
        b.iter(|| horizon.tags().monitored(black_box(&empty), Some("tenant_5")))
    });

    let listener = horizon.monitored_tags_listener();
    let event = JobPushed::new(payload.clone()).connection("tenant_5").queue("default");
    c.bench_function("listener/monitored_tags", |b| {
        b.iter(|| listener.handle(black_box(&event)))
    });
}

criterion_group!(benches, bench_resolution, bench_scoped_run, bench_dispatch);
criterion_main!(benches);
