use criterion::{criterion_group, criterion_main, Criterion};
use lazyshot::{bridge::CaptureBridge, config::BridgeConfig, format::PixelFormat, sim::SimulatedPlatform};

pub fn benchmark_callback(c: &mut Criterion) {
    let mut group = c.benchmark_group("callback");
    for depth in [1, 16, 256] {
        let config = BridgeConfig::default().with_frame_queue_depth(depth);
        let (bridge, rx) = CaptureBridge::new(SimulatedPlatform::default(), config).unwrap();
        let surface = bridge.create_stream(640, 480, PixelFormat::RAW16).unwrap();
        let mut timestamp = 0;
        group.bench_function(format!("queue-depth-{depth}"), |b| {
            b.iter(|| {
                timestamp += 33_333_333;
                surface.queue_frame(timestamp);
                while let Ok(Some(_)) = rx.try_recv() {}
            })
        });
    }
}

criterion_group!(benches, benchmark_callback);
criterion_main!(benches);
