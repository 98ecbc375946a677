// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use lazyshot::{
    bridge::{CaptureBridge, ReaderBackend},
    config::BridgeConfig,
    format::PixelFormat,
    frame::{FrameMetadata, FrameStats},
    monitor::{run_frame_worker, FrameMonitor},
    registry::StreamSpec,
    sim::SimulatedPlatform,
};
use serial_test::serial;
use std::{
    error::Error,
    io,
    sync::{Arc, Mutex},
    thread,
};

/// Collects formatted log output for the duration of a test.
#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn with_captured_logs<F: FnOnce()>(f: F) -> Vec<String> {
    let capture = LogCapture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    capture.lines()
}

#[test]
#[serial]
fn test_frame_logs_format_and_timestamp() -> Result<(), Box<dyn Error>> {
    let platform = SimulatedPlatform::default();
    let (bridge, rx) = CaptureBridge::new(platform.clone(), BridgeConfig::default())?;
    let surface = bridge.create_stream(4096, 3072, PixelFormat::RAW16)?;

    let lines = with_captured_logs(|| {
        assert!(surface.queue_frame(123456789));
    });

    let acquired: Vec<_> = lines
        .iter()
        .filter(|l| l.contains("Image acquired!"))
        .collect();
    assert_eq!(acquired.len(), 1, "{lines:?}");
    assert!(acquired[0].contains("0x20"));
    assert!(acquired[0].contains("123456789"));

    // the image is released before the callback returns
    assert_eq!(platform.acquired(), 1);
    assert_eq!(platform.released(), 1);
    assert_eq!(surface.pending(), 0);

    let meta = rx.try_recv()?.expect("metadata queued");
    assert_eq!(
        meta,
        FrameMetadata {
            stream: surface.stream(),
            format: PixelFormat::RAW16,
            timestamp: 123456789,
        }
    );

    Ok(())
}

#[test]
#[serial]
fn test_acquisition_failure_holds_nothing() -> Result<(), Box<dyn Error>> {
    let platform = SimulatedPlatform::default();
    let (bridge, rx) = CaptureBridge::new(platform.clone(), BridgeConfig::default())?;
    let surface = bridge.create_stream(640, 480, PixelFormat::YCBCR_P010)?;

    let lines = with_captured_logs(|| surface.notify());

    assert!(lines.iter().any(|l| l.contains("Failed to acquire image")));
    assert!(!lines.iter().any(|l| l.contains("Image acquired!")));
    assert_eq!(platform.acquired(), 0);
    assert_eq!(platform.released(), 0);
    assert_eq!(
        bridge.stats(),
        FrameStats {
            delivered: 0,
            dropped: 0,
            acquisition_failures: 1,
        }
    );
    assert!(rx.is_empty());

    Ok(())
}

#[test]
fn test_every_frame_released_once() -> Result<(), Box<dyn Error>> {
    let platform = SimulatedPlatform::default();
    let (bridge, rx) = CaptureBridge::new(platform.clone(), BridgeConfig::default())?;
    let raw = bridge.create_stream(640, 480, PixelFormat::RAW16)?;
    let p010 = bridge.create_stream(640, 480, PixelFormat::YCBCR_P010)?;

    let consumer = thread::spawn(move || run_frame_worker(rx, 0));
    let producers: Vec<_> = [raw, p010]
        .into_iter()
        .map(|surface| {
            thread::spawn(move || {
                (0..200i64)
                    .filter(|i| surface.queue_frame(*i * 33_333_333))
                    .count() as u64
            })
        })
        .collect();
    let queued: u64 = producers.into_iter().map(|p| p.join().unwrap()).sum();

    assert_eq!(queued, 400);
    assert_eq!(platform.acquired(), 400);
    assert_eq!(platform.released(), 400);

    let stats = bridge.stats();
    assert_eq!(stats.delivered + stats.dropped, 400);
    assert_eq!(stats.acquisition_failures, 0);

    drop(bridge);
    let monitor = consumer.join().unwrap();
    assert_eq!(monitor.frames(), stats.delivered);

    Ok(())
}

#[test]
fn test_full_queue_counts_dropped() -> Result<(), Box<dyn Error>> {
    let config = BridgeConfig::default().with_frame_queue_depth(2);
    let (bridge, rx) = CaptureBridge::new(SimulatedPlatform::default(), config)?;
    let surface = bridge.create_stream(640, 480, PixelFormat::RAW16)?;

    for ts in 0..5 {
        assert!(surface.queue_frame(ts));
    }

    let stats = bridge.stats();
    assert_eq!(stats.delivered, 2);
    assert_eq!(stats.dropped, 3);
    assert_eq!(rx.len(), 2);

    // the oldest entries are the ones kept
    assert_eq!(rx.try_recv()?.map(|m| m.timestamp), Some(0));
    assert_eq!(rx.try_recv()?.map(|m| m.timestamp), Some(1));

    Ok(())
}

#[test]
fn test_closed_queue_counts_dropped() -> Result<(), Box<dyn Error>> {
    let (bridge, rx) = CaptureBridge::new(SimulatedPlatform::default(), BridgeConfig::default())?;
    let surface = bridge.create_stream(640, 480, PixelFormat::RAW16)?;
    drop(rx);

    assert!(surface.queue_frame(42));
    let stats = bridge.stats();
    assert_eq!(stats.delivered, 0);
    assert_eq!(stats.dropped, 1);

    Ok(())
}

#[test]
fn test_ring_buffer_bounds_pending_images() {
    let platform = SimulatedPlatform::default();
    let spec = StreamSpec {
        width: 640,
        height: 480,
        format: PixelFormat::RAW16,
        max_images: 4,
    };
    let reader = platform.allocate(&spec).unwrap();
    // no listener registered, so nothing drains the reader
    let surface = platform.window(&reader).unwrap();

    for ts in 0..4 {
        assert!(surface.queue_frame(ts));
    }
    assert!(!surface.queue_frame(4));
    assert_eq!(surface.pending(), 4);

    drop(reader);
    assert_eq!(platform.live_readers(), 0);
}

#[test]
fn test_monitor_rate_from_timestamps() {
    let mut monitor = FrameMonitor::new(10);
    let mut report = None;
    for i in 0..10 {
        let meta = FrameMetadata {
            stream: 7,
            format: PixelFormat::YCBCR_P010,
            timestamp: 1_000 + i * 16_666_667,
        };
        report = monitor.observe(&meta);
        if i < 9 {
            assert!(report.is_none());
        }
    }

    let rate = report.expect("report after 10 frames");
    assert_eq!(rate.stream, 7);
    assert_eq!(rate.frames, 10);
    assert!((rate.fps - 60.0).abs() < 0.01, "{}", rate.fps);
}

#[test]
fn test_monitor_ignores_out_of_order_timestamps() {
    let mut monitor = FrameMonitor::new(0);
    for timestamp in [0, 100_000_000, 50_000_000, 150_000_000, 150_000_000] {
        let meta = FrameMetadata {
            stream: 1,
            format: PixelFormat::RAW16,
            timestamp,
        };
        assert!(monitor.observe(&meta).is_none());
    }

    let rate = monitor.rate(1).unwrap();
    assert_eq!(rate.frames, 5);
    // intervals: 100ms and 100ms (50ms -> 150ms); backwards and zero steps skipped
    assert!((rate.fps - 10.0).abs() < 1e-9, "{}", rate.fps);
    assert!(monitor.rate(2).is_none());
}

#[test]
fn test_monitor_tracks_streams_separately() {
    let mut monitor = FrameMonitor::new(0);
    for i in 0..4 {
        for (stream, step) in [(1, 10_000_000), (2, 20_000_000)] {
            monitor.observe(&FrameMetadata {
                stream,
                format: PixelFormat::RAW16,
                timestamp: i * step,
            });
        }
    }

    let rates = monitor.rates();
    assert_eq!(rates.len(), 2);
    assert_eq!(rates[0].stream, 1);
    assert!((rates[0].fps - 100.0).abs() < 1e-9);
    assert_eq!(rates[1].stream, 2);
    assert!((rates[1].fps - 50.0).abs() < 1e-9);
    assert_eq!(monitor.frames(), 8);
}

#[test]
fn test_monitor_survives_extreme_timestamps() {
    let mut monitor = FrameMonitor::new(1);
    let meta = |timestamp| FrameMetadata {
        stream: 3,
        format: PixelFormat::RAW16,
        timestamp,
    };

    // steps that do not fit in an i64 are skipped
    monitor.observe(&meta(-10));
    let rate = monitor.observe(&meta(i64::MAX)).expect("report every frame");
    assert_eq!(rate.frames, 2);
    assert_eq!(rate.fps, 0.0);
    monitor.observe(&meta(i64::MIN));
    assert_eq!(monitor.rate(3).map(|r| r.fps), Some(0.0));

    // two intervals of i64::MAX each, whose sum exceeds i64
    let mut monitor = FrameMonitor::new(0);
    let stream = 4;
    for timestamp in [i64::MIN, -1, i64::MAX - 1] {
        monitor.observe(&FrameMetadata {
            stream,
            format: PixelFormat::YCBCR_P010,
            timestamp,
        });
    }
    let rate = monitor.rate(stream).unwrap();
    assert_eq!(rate.frames, 3);
    let expected = 1e9 / i64::MAX as f64;
    assert!(rate.fps > 0.0 && (rate.fps - expected).abs() < 1e-15, "{}", rate.fps);
}

#[test]
fn test_frame_worker_survives_extreme_timestamps() -> Result<(), Box<dyn Error>> {
    let (bridge, rx) = CaptureBridge::new(SimulatedPlatform::default(), BridgeConfig::default())?;
    let surface = bridge.create_stream(640, 480, PixelFormat::RAW16)?;
    let consumer = thread::spawn(move || run_frame_worker(rx, 1));

    for timestamp in [-10, i64::MAX, i64::MIN, 0] {
        assert!(surface.queue_frame(timestamp));
    }
    drop(surface);
    drop(bridge);

    let monitor = consumer.join().expect("frame worker exits cleanly");
    assert_eq!(monitor.frames(), 4);

    Ok(())
}
