// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Frame-arrival path: from a platform reader callback to the bounded
//! metadata queue consumed by [`crate::monitor`].

use crate::{error::Result, format::PixelFormat};
use kanal::{Receiver, Sender};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::{debug, error, info};

/// Identifier assigned to every successfully created stream, starting at 1.
pub type StreamId = u32;

/// An image acquired from a reader.
///
/// Implementors release the underlying platform image when dropped, so a
/// frame is released exactly once whichever way the callback returns.
pub trait CapturedFrame {
    fn format(&self) -> Result<PixelFormat>;

    /// Capture timestamp in nanoseconds.
    fn timestamp(&self) -> Result<i64>;
}

/// A reader that frames can be acquired from.
pub trait FrameSource {
    type Frame: CapturedFrame;

    /// Acquires the next available image, `Ok(None)` when none is queued.
    fn acquire_next(&self) -> Result<Option<Self::Frame>>;
}

/// Metadata copied out of a frame before it is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMetadata {
    pub stream: StreamId,
    pub format: PixelFormat,
    pub timestamp: i64,
}

/// Counters kept by a [`FrameSink`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Metadata entries accepted by the queue
    pub delivered: u64,
    /// Frames acquired but not queued because the queue was full or closed
    pub dropped: u64,
    /// Callbacks that found no image to acquire
    pub acquisition_failures: u64,
}

/// Producer end of the frame metadata queue.
///
/// Publishing never blocks the platform callback thread: when the queue is
/// full the entry is dropped and counted.
pub struct FrameSink {
    tx: Sender<FrameMetadata>,
    delivered: AtomicU64,
    dropped: AtomicU64,
    acquisition_failures: AtomicU64,
}

/// Creates a bounded metadata queue of `depth` entries.
pub fn frame_channel(depth: usize) -> (FrameSink, Receiver<FrameMetadata>) {
    let (tx, rx) = kanal::bounded(depth);
    let sink = FrameSink {
        tx,
        delivered: AtomicU64::new(0),
        dropped: AtomicU64::new(0),
        acquisition_failures: AtomicU64::new(0),
    };
    (sink, rx)
}

impl FrameSink {
    /// Queues `meta`, returning whether it was accepted.
    pub fn publish(&self, meta: FrameMetadata) -> bool {
        match self.tx.try_send(meta) {
            Ok(true) => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
                true
            }
            Ok(false) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(stream = meta.stream, dropped, "frame queue full, metadata dropped");
                false
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(stream = meta.stream, "frame queue closed, metadata dropped");
                false
            }
        }
    }

    pub fn record_acquisition_failure(&self) {
        self.acquisition_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            acquisition_failures: self.acquisition_failures.load(Ordering::Relaxed),
        }
    }
}

/// State handed to the platform together with the frame-arrival callback.
#[derive(Clone)]
pub struct ListenerContext {
    pub stream: StreamId,
    pub sink: Arc<FrameSink>,
}

/// Handles one frame-arrival notification.
///
/// Acquires the next image from `source`, logs its format and timestamp,
/// publishes the metadata and releases the image before returning. When no
/// image can be acquired nothing is held and nothing is released.
pub fn on_image_available<S: FrameSource>(
    source: &S,
    context: &ListenerContext,
) -> Option<FrameMetadata> {
    let frame = match source.acquire_next() {
        Ok(Some(frame)) => frame,
        Ok(None) => {
            context.sink.record_acquisition_failure();
            error!(stream = context.stream, "Failed to acquire image: no image available");
            return None;
        }
        Err(e) => {
            context.sink.record_acquisition_failure();
            error!(stream = context.stream, kind = e.kind(), "{e}");
            return None;
        }
    };

    let format = frame.format().unwrap_or_else(|e| {
        debug!(stream = context.stream, "{e}");
        PixelFormat(0)
    });
    let timestamp = frame.timestamp().unwrap_or_else(|e| {
        debug!(stream = context.stream, "{e}");
        0
    });

    info!(
        stream = context.stream,
        "Image acquired! format: {format} timestamp: {timestamp}"
    );

    // Plane access (AImage_getPlaneData) hooks in here while the frame is held.

    let meta = FrameMetadata {
        stream: context.stream,
        format,
        timestamp,
    };
    context.sink.publish(meta);
    drop(frame);
    Some(meta)
}
