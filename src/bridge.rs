// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    config::BridgeConfig,
    error::Result,
    format::{FormatSlot, PixelFormat},
    frame::{frame_channel, FrameMetadata, FrameSink, FrameStats, ListenerContext, StreamId},
    registry::{ReaderRegistry, StreamInfo, StreamSpec},
};
use kanal::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{error, info, instrument, warn};

/// Platform image-reader API used by [`CaptureBridge`].
///
/// `Reader` is an owning guard: dropping it releases the platform reader and
/// stops its callbacks. The bridge relies on this to release readers on every
/// failure path after allocation.
pub trait ReaderBackend {
    type Reader: Send;

    /// Drawable target handed back to the capture session.
    type Window;

    fn allocate(&self, spec: &StreamSpec) -> Result<Self::Reader>;

    /// Attaches the frame-arrival callback. The backend keeps `context` alive
    /// for as long as the reader exists.
    fn register(&self, reader: &mut Self::Reader, context: ListenerContext) -> Result<()>;

    fn window(&self, reader: &Self::Reader) -> Result<Self::Window>;
}

struct Streams<R> {
    registry: ReaderRegistry<R>,
    next_id: StreamId,
}

/// Creates image-reader streams and keeps them alive for the capture session.
///
/// # Example
///
/// ```
/// use lazyshot::{bridge::CaptureBridge, config::BridgeConfig, format::{FormatSlot, PixelFormat}, sim::SimulatedPlatform};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (bridge, _frames) = CaptureBridge::new(SimulatedPlatform::default(), BridgeConfig::default())?;
/// let surface = bridge.create_stream(640, 480, PixelFormat::RAW16)?;
/// assert_eq!(bridge.slot(FormatSlot::Raw).map(|s| s.id), Some(surface.stream()));
/// # Ok(())
/// # }
/// ```
pub struct CaptureBridge<B: ReaderBackend> {
    backend: B,
    config: BridgeConfig,
    sink: Arc<FrameSink>,
    streams: Mutex<Streams<B::Reader>>,
}

impl<B: ReaderBackend> CaptureBridge<B> {
    /// Creates a bridge and the receiving end of its frame metadata queue.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BridgeError::InvalidConfig`] if `config` does
    /// not validate.
    pub fn new(backend: B, config: BridgeConfig) -> Result<(Self, Receiver<FrameMetadata>)> {
        config.validate()?;
        let (sink, rx) = frame_channel(config.frame_queue_depth);
        let bridge = Self {
            backend,
            config,
            sink: Arc::new(sink),
            streams: Mutex::new(Streams {
                registry: ReaderRegistry::new(),
                next_id: 1,
            }),
        };
        Ok((bridge, rx))
    }

    /// Allocates a reader for `width` x `height` images of `format` and returns
    /// its window.
    ///
    /// Dimensions and format are forwarded to the platform unchecked. The
    /// reader is recorded in the registry only once every step succeeded;
    /// on failure it is released and no slot changes.
    pub fn create_stream(
        &self,
        width: i32,
        height: i32,
        format: PixelFormat,
    ) -> Result<B::Window> {
        self.create_stream_with(width, height, format, Ok)
    }

    /// Like [`CaptureBridge::create_stream`], with `convert` applied to the
    /// window before the reader is committed.
    ///
    /// A `convert` failure releases the reader like any other setup failure,
    /// so a caller that cannot hand the surface on leaves the slots as they
    /// were.
    #[instrument(skip(self, format, convert), fields(format = %format))]
    pub fn create_stream_with<T, F>(
        &self,
        width: i32,
        height: i32,
        format: PixelFormat,
        convert: F,
    ) -> Result<T>
    where
        F: FnOnce(B::Window) -> Result<T>,
    {
        let spec = StreamSpec {
            width,
            height,
            format,
            max_images: self.config.max_images,
        };

        let mut streams = self.lock();
        match self.setup(&mut streams, spec, convert) {
            Ok(surface) => Ok(surface),
            Err(e) => {
                error!(kind = e.kind(), "{e}");
                Err(e)
            }
        }
    }

    fn setup<T, F>(
        &self,
        streams: &mut Streams<B::Reader>,
        spec: StreamSpec,
        convert: F,
    ) -> Result<T>
    where
        F: FnOnce(B::Window) -> Result<T>,
    {
        let id = streams.next_id;
        let mut reader = self.backend.allocate(&spec)?;

        let context = ListenerContext {
            stream: id,
            sink: self.sink.clone(),
        };
        self.backend.register(&mut reader, context)?;
        let window = self.backend.window(&reader)?;
        let surface = convert(window)?;

        streams.next_id += 1;
        let info = StreamInfo { id, spec };
        if let Some(replaced) = streams.registry.install(info, reader) {
            warn!(
                stream = id,
                replaced = replaced.id,
                "replaced reader for format {}",
                spec.format
            );
        }
        info!(
            stream = id,
            "created image reader {}x{} format {} max_images {}",
            spec.width,
            spec.height,
            spec.format,
            spec.max_images
        );
        Ok(surface)
    }

    /// Stream currently recorded in `slot`.
    pub fn slot(&self, slot: FormatSlot) -> Option<StreamInfo> {
        self.lock().registry.slot(slot)
    }

    /// Streams of formats with no named slot.
    pub fn untracked(&self) -> Vec<StreamInfo> {
        self.lock().registry.untracked().collect()
    }

    /// Number of live readers, including retired and untracked ones.
    pub fn stream_count(&self) -> usize {
        self.lock().registry.len()
    }

    pub fn stats(&self) -> FrameStats {
        self.sink.stats()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn lock(&self) -> MutexGuard<'_, Streams<B::Reader>> {
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
