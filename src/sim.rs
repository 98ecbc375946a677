// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! In-process stand-in for the platform image reader.
//!
//! Behaves like `AImageReader` where the bridge can observe it: a bounded ring
//! of images per reader, a single listener, images released on drop. Used by
//! the `lazyshot-sim` binary, the tests and the benches on hosts without a
//! camera.

use crate::{
    bridge::ReaderBackend,
    error::{BridgeError, Result},
    format::PixelFormat,
    frame::{self, CapturedFrame, FrameSource, ListenerContext, StreamId},
    registry::StreamSpec,
};
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
};
use tracing::trace;

/// `AMEDIA_ERROR_UNKNOWN`
pub const STATUS_UNKNOWN: i32 = -10000;
/// `AMEDIA_ERROR_UNSUPPORTED`
pub const STATUS_UNSUPPORTED: i32 = -10002;
/// `AMEDIA_ERROR_INVALID_OBJECT`
pub const STATUS_INVALID_OBJECT: i32 = -10003;
/// `AMEDIA_ERROR_INVALID_PARAMETER`
pub const STATUS_INVALID_PARAMETER: i32 = -10004;
/// `AMEDIA_IMGREADER_MAX_IMAGES_ACQUIRED`
pub const STATUS_MAX_IMAGES_ACQUIRED: i32 = -30002;

/// Largest width or height accepted unless overridden.
pub const DEFAULT_MAX_DIMENSION: i32 = 8192;

#[derive(Default)]
struct Counters {
    allocations: AtomicUsize,
    live_readers: AtomicUsize,
    acquired: AtomicU64,
    released: AtomicU64,
}

/// Simulated image-reader platform.
///
/// # Example
///
/// ```
/// use lazyshot::{format::PixelFormat, sim::SimulatedPlatform};
///
/// let platform = SimulatedPlatform::default()
///     .reject_format(PixelFormat::JPEG)
///     .with_max_dimension(4096);
/// assert_eq!(platform.live_readers(), 0);
/// ```
///
/// Clones share counters, so a clone kept outside the bridge observes the
/// readers the bridge allocates.
#[derive(Clone)]
pub struct SimulatedPlatform {
    rejected: Vec<PixelFormat>,
    max_dimension: i32,
    fail_registration: bool,
    fail_window: bool,
    counters: Arc<Counters>,
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self {
            rejected: Vec::new(),
            max_dimension: DEFAULT_MAX_DIMENSION,
            fail_registration: false,
            fail_window: false,
            counters: Arc::new(Counters::default()),
        }
    }
}

impl SimulatedPlatform {
    /// Makes allocation fail for `format`.
    pub fn reject_format(mut self, format: PixelFormat) -> Self {
        self.rejected.push(format);
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: i32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Makes every listener registration fail.
    pub fn fail_registration(mut self, fail: bool) -> Self {
        self.fail_registration = fail;
        self
    }

    /// Makes every window retrieval fail.
    pub fn fail_window(mut self, fail: bool) -> Self {
        self.fail_window = fail;
        self
    }

    /// Readers allocated and not yet released.
    pub fn live_readers(&self) -> usize {
        self.counters.live_readers.load(Ordering::SeqCst)
    }

    /// Successful allocations since the platform was created.
    pub fn allocations(&self) -> usize {
        self.counters.allocations.load(Ordering::SeqCst)
    }

    pub fn acquired(&self) -> u64 {
        self.counters.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u64 {
        self.counters.released.load(Ordering::SeqCst)
    }

    fn check_allocation(&self, spec: &StreamSpec) -> Result<()> {
        let status = if spec.width <= 0 || spec.height <= 0 || spec.max_images <= 0 {
            Some(STATUS_INVALID_PARAMETER)
        } else if spec.width > self.max_dimension || spec.height > self.max_dimension {
            Some(STATUS_INVALID_PARAMETER)
        } else if spec.format.code() < 0 || self.rejected.contains(&spec.format) {
            Some(STATUS_UNSUPPORTED)
        } else {
            None
        };

        match status {
            Some(status) => Err(BridgeError::Allocation {
                width: spec.width,
                height: spec.height,
                format: spec.format,
                status,
            }),
            None => Ok(()),
        }
    }
}

impl ReaderBackend for SimulatedPlatform {
    type Reader = SimReader;
    type Window = SimSurface;

    fn allocate(&self, spec: &StreamSpec) -> Result<SimReader> {
        self.check_allocation(spec)?;
        self.counters.allocations.fetch_add(1, Ordering::SeqCst);
        self.counters.live_readers.fetch_add(1, Ordering::SeqCst);
        trace!("sim reader allocated");
        Ok(SimReader {
            queue: Arc::new(SimQueue {
                spec: *spec,
                stream: AtomicU32::new(0),
                pending: Mutex::new(VecDeque::new()),
                outstanding: Arc::new(AtomicUsize::new(0)),
                listener: Mutex::new(None),
                closed: AtomicBool::new(false),
                counters: self.counters.clone(),
            }),
        })
    }

    fn register(&self, reader: &mut SimReader, context: ListenerContext) -> Result<()> {
        if self.fail_registration {
            return Err(BridgeError::Registration(STATUS_UNKNOWN));
        }
        reader.queue.stream.store(context.stream, Ordering::SeqCst);
        *reader.queue.listener() = Some(context);
        Ok(())
    }

    fn window(&self, reader: &SimReader) -> Result<SimSurface> {
        if self.fail_window {
            return Err(BridgeError::SurfaceRetrieval(STATUS_UNKNOWN));
        }
        Ok(SimSurface {
            queue: reader.queue.clone(),
        })
    }
}

struct SimQueue {
    spec: StreamSpec,
    stream: AtomicU32,
    pending: Mutex<VecDeque<i64>>,
    outstanding: Arc<AtomicUsize>,
    listener: Mutex<Option<ListenerContext>>,
    closed: AtomicBool,
    counters: Arc<Counters>,
}

impl SimQueue {
    fn listener(&self) -> std::sync::MutexGuard<'_, Option<ListenerContext>> {
        self.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, VecDeque<i64>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        let context = self.listener().clone();
        if let Some(context) = context {
            frame::on_image_available(self, &context);
        }
    }
}

impl FrameSource for SimQueue {
    type Frame = SimImage;

    fn acquire_next(&self) -> Result<Option<SimImage>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BridgeError::Acquisition(STATUS_INVALID_OBJECT));
        }
        if self.outstanding.load(Ordering::SeqCst) >= self.spec.max_images as usize {
            return Err(BridgeError::Acquisition(STATUS_MAX_IMAGES_ACQUIRED));
        }
        let Some(timestamp) = self.pending().pop_front() else {
            return Ok(None);
        };

        self.outstanding.fetch_add(1, Ordering::SeqCst);
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Some(SimImage {
            format: self.spec.format,
            timestamp,
            outstanding: self.outstanding.clone(),
            counters: self.counters.clone(),
        }))
    }
}

/// Reader guard handed to the bridge. Dropping it closes the reader.
pub struct SimReader {
    queue: Arc<SimQueue>,
}

impl Drop for SimReader {
    fn drop(&mut self) {
        self.queue.closed.store(true, Ordering::SeqCst);
        self.queue.listener().take();
        self.queue.counters.live_readers.fetch_sub(1, Ordering::SeqCst);
        trace!("sim reader released");
    }
}

/// Producer end of a simulated reader, standing in for the camera pipeline
/// writing into the reader's surface.
#[derive(Clone)]
pub struct SimSurface {
    queue: Arc<SimQueue>,
}

impl SimSurface {
    /// Stream the surface belongs to.
    pub fn stream(&self) -> StreamId {
        self.queue.stream.load(Ordering::SeqCst)
    }

    pub fn spec(&self) -> StreamSpec {
        self.queue.spec
    }

    /// Number of images queued and not yet acquired.
    pub fn pending(&self) -> usize {
        self.queue.pending().len()
    }

    /// Writes a frame captured at `timestamp` and invokes the listener.
    ///
    /// Returns `false` without notifying when the reader is closed or its
    /// ring buffer is full, the way a camera drops frames into a stalled
    /// reader.
    pub fn queue_frame(&self, timestamp: i64) -> bool {
        if self.queue.closed.load(Ordering::SeqCst) {
            return false;
        }
        {
            let mut pending = self.queue.pending();
            let in_flight = pending.len() + self.queue.outstanding.load(Ordering::SeqCst);
            if in_flight >= self.queue.spec.max_images as usize {
                return false;
            }
            pending.push_back(timestamp);
        }
        self.queue.notify();
        true
    }

    /// Invokes the listener without writing a frame.
    pub fn notify(&self) {
        self.queue.notify();
    }
}

/// Image acquired from a simulated reader.
pub struct SimImage {
    format: PixelFormat,
    timestamp: i64,
    outstanding: Arc<AtomicUsize>,
    counters: Arc<Counters>,
}

impl CapturedFrame for SimImage {
    fn format(&self) -> Result<PixelFormat> {
        Ok(self.format)
    }

    fn timestamp(&self) -> Result<i64> {
        Ok(self.timestamp)
    }
}

impl Drop for SimImage {
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}
