use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use evbus::{BusError, Event, EventBus, Payload, Subscriber};

use async_trait::async_trait;
use std::sync::Arc;

/// Accepts everything and does nothing, so the bench measures bus
/// overhead rather than handler work.
struct SinkSubscriber;

#[async_trait]
impl Subscriber for SinkSubscriber {
  async fn handle_event(&self, _event: &Event) -> Result<(), BusError> {
    Ok(())
  }

  fn id(&self) -> String {
    "sink".to_string()
  }
}

fn bench_publish(c: &mut Criterion) {
  let rt = tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .build()
    .expect("failed to build Tokio runtime");

  let mut group = c.benchmark_group("publish");
  group.throughput(Throughput::Elements(1));

  for subscribers in [1usize, 8] {
    let bus = EventBus::synchronous("bench");
    for _ in 0..subscribers {
      bus.subscribe(Arc::new(SinkSubscriber), None);
    }
    group.bench_function(format!("sync_{}_subscribers", subscribers), |b| {
      b.to_async(&rt).iter(|| async {
        let event = Event::new("bench_event", Payload::from_static("bench/v1", b"payload"), "bench");
        bus.publish(event).await.expect("publish failed");
      });
    });
  }

  group.finish();
}

criterion_group!(benches, bench_publish);
criterion_main!(benches);
