// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

mod args;

use args::Args;
use clap::Parser;
use lazyshot::{
    bridge::CaptureBridge,
    config::BridgeConfig,
    monitor::run_frame_worker_async,
    sim::{SimSurface, SimulatedPlatform},
};
use serde_json::json;
use std::{
    error::Error,
    fs, thread,
    time::{Duration, Instant},
};
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, Layer, Registry};

fn init_logging(args: &Args) -> Result<(), Box<dyn Error>> {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let stdout_log = tracing_subscriber::fmt::layer().with_filter(level);

    let journald = if args.journald {
        match tracing_journald::layer() {
            Ok(layer) => Some(layer.with_filter(level)),
            Err(e) => {
                eprintln!("journald logging unavailable: {e}");
                None
            }
        }
    } else {
        None
    };

    let tracy = if args.tracy {
        tracy_client::Client::start();
        Some(tracing_tracy::TracyLayer::default())
    } else {
        None
    };

    let console = if args.tokio_console {
        Some(console_subscriber::ConsoleLayer::builder().with_default_env().spawn())
    } else {
        None
    };

    let subscriber = Registry::default()
        .with(stdout_log)
        .with(journald)
        .with(tracy)
        .with(console);
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

/// Plays the camera for one stream, returning how many frames the reader
/// had no room for.
fn produce(surface: SimSurface, frames: u64, interval: Duration) -> u64 {
    let base = Instant::now();
    let mut dropped = 0;
    for _ in 0..frames {
        let timestamp = base.elapsed().as_nanos() as i64;
        if !surface.queue_frame(timestamp) {
            dropped += 1;
        }
        thread::sleep(interval);
    }
    dropped
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args)?;
    info!("LazyShot simulated capture");

    let (bridge, rx) = CaptureBridge::new(SimulatedPlatform::default(), BridgeConfig::from(&args))?;
    let worker = tokio::spawn(run_frame_worker_async(rx.to_async(), args.report_every));

    let mut surfaces = Vec::new();
    for stream in &args.streams {
        match bridge.create_stream(stream.width, stream.height, stream.format) {
            Ok(surface) => surfaces.push(surface),
            Err(e) => warn!("stream {stream} not created: {e}"),
        }
    }
    if surfaces.is_empty() {
        return Err(Box::from("no capture stream could be created"));
    }

    let interval = Duration::from_secs_f64(1.0 / args.fps.max(1) as f64);
    let start = Instant::now();
    let producers: Vec<_> = surfaces
        .iter()
        .cloned()
        .map(|surface| {
            let frames = args.frames;
            thread::spawn(move || produce(surface, frames, interval))
        })
        .collect();

    let mut camera_dropped = 0;
    for producer in producers {
        match producer.join() {
            Ok(dropped) => camera_dropped += dropped,
            Err(_) => error!("camera producer thread panicked"),
        }
    }
    let elapsed = start.elapsed();

    let stats = bridge.stats();
    // Releasing the readers drops the last frame senders and ends the worker.
    drop(surfaces);
    drop(bridge);
    let monitor = worker.await?;

    let streams: Vec<_> = monitor
        .rates()
        .iter()
        .map(|r| json!({ "stream": r.stream, "frames": r.frames, "fps": r.fps }))
        .collect();
    let summary = json!({
        "elapsed_ms": elapsed.as_millis() as u64,
        "camera_dropped": camera_dropped,
        "delivered": stats.delivered,
        "dropped": stats.dropped,
        "acquisition_failures": stats.acquisition_failures,
        "streams": streams,
    });

    println!("{}", serde_json::to_string_pretty(&summary)?);
    if let Some(path) = &args.stats_json {
        fs::write(path, serde_json::to_vec_pretty(&summary)?)?;
        info!("statistics written to {}", path.display());
    }
    Ok(())
}
