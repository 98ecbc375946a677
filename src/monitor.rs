// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::frame::{FrameMetadata, StreamId};
use kanal::{AsyncReceiver, Receiver};
use std::collections::HashMap;
use tracing::{debug, info};

/// Number of frame intervals averaged into a rate.
pub const RATE_HISTORY: usize = 30;

/// Frame rate of one stream, computed from capture timestamps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamRate {
    pub stream: StreamId,
    pub frames: u64,
    pub fps: f64,
}

struct StreamHistory {
    prev: Option<i64>,
    history: [i64; RATE_HISTORY],
    index: usize,
    filled: usize,
    frames: u64,
}

impl StreamHistory {
    fn new() -> Self {
        Self {
            prev: None,
            history: [0; RATE_HISTORY],
            index: 0,
            filled: 0,
            frames: 0,
        }
    }

    fn update(&mut self, timestamp: i64) {
        self.frames += 1;
        if let Some(prev) = self.prev {
            // steps that are not positive or overflow carry no rate information
            if let Some(elapsed) = timestamp.checked_sub(prev).filter(|e| *e > 0) {
                self.history[self.index] = elapsed;
                self.index = (self.index + 1) % RATE_HISTORY;
                self.filled = (self.filled + 1).min(RATE_HISTORY);
            }
        }
        self.prev = Some(timestamp);
    }

    fn fps(&self) -> f64 {
        if self.filled == 0 {
            return 0.0;
        }
        let total: i128 = self.history[..self.filled]
            .iter()
            .map(|e| i128::from(*e))
            .sum();
        1e9 / (total as f64 / self.filled as f64)
    }
}

/// Consumer-side bookkeeping for the frame metadata queue.
///
/// # Example
///
/// ```
/// use lazyshot::{format::PixelFormat, frame::FrameMetadata, monitor::FrameMonitor};
///
/// let mut monitor = FrameMonitor::new(2);
/// let frame = |timestamp| FrameMetadata { stream: 1, format: PixelFormat::RAW16, timestamp };
/// assert!(monitor.observe(&frame(0)).is_none());
/// let rate = monitor.observe(&frame(33_333_333)).unwrap();
/// assert_eq!(rate.frames, 2);
/// assert_eq!(rate.fps.round(), 30.0);
/// ```
pub struct FrameMonitor {
    streams: HashMap<StreamId, StreamHistory>,
    report_every: u64,
}

impl FrameMonitor {
    /// Creates a monitor reporting a rate every `report_every` frames per
    /// stream. Zero disables reporting.
    pub fn new(report_every: u64) -> Self {
        Self {
            streams: HashMap::new(),
            report_every,
        }
    }

    /// Records `meta`, returning the stream's rate when a report is due.
    pub fn observe(&mut self, meta: &FrameMetadata) -> Option<StreamRate> {
        let history = self
            .streams
            .entry(meta.stream)
            .or_insert_with(StreamHistory::new);
        history.update(meta.timestamp);

        if self.report_every == 0 || history.frames % self.report_every != 0 {
            return None;
        }
        Some(StreamRate {
            stream: meta.stream,
            frames: history.frames,
            fps: history.fps(),
        })
    }

    pub fn rate(&self, stream: StreamId) -> Option<StreamRate> {
        self.streams.get(&stream).map(|h| StreamRate {
            stream,
            frames: h.frames,
            fps: h.fps(),
        })
    }

    /// Rates of every stream seen so far, ordered by stream id.
    pub fn rates(&self) -> Vec<StreamRate> {
        let mut ids: Vec<_> = self.streams.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().filter_map(|id| self.rate(id)).collect()
    }

    /// Total frames observed across streams.
    pub fn frames(&self) -> u64 {
        self.streams.values().map(|h| h.frames).sum()
    }

    fn record(&mut self, meta: &FrameMetadata) {
        if let Some(rate) = self.observe(meta) {
            debug!(
                stream = rate.stream,
                frames = rate.frames,
                "stream rate {:.1} fps",
                rate.fps
            );
        }
    }
}

/// Drains `rx` on the calling thread until every sender is gone.
pub fn run_frame_worker(rx: Receiver<FrameMetadata>, report_every: u64) -> FrameMonitor {
    let mut monitor = FrameMonitor::new(report_every);
    while let Ok(meta) = rx.recv() {
        monitor.record(&meta);
    }
    info!(frames = monitor.frames(), "frame queue closed");
    monitor
}

/// Async counterpart of [`run_frame_worker`].
pub async fn run_frame_worker_async(
    rx: AsyncReceiver<FrameMetadata>,
    report_every: u64,
) -> FrameMonitor {
    let mut monitor = FrameMonitor::new(report_every);
    while let Ok(meta) = rx.recv().await {
        monitor.record(&meta);
    }
    info!(frames = monitor.frames(), "frame queue closed");
    monitor
}
