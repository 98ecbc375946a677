// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    bridge::ReaderBackend,
    error::{BridgeError, Result},
    format::PixelFormat,
    frame::{self, CapturedFrame, FrameSource, ListenerContext},
    registry::StreamSpec,
};
use ndk_sys::{
    media_status_t, AImage, AImageReader, AImageReader_ImageListener, AImageReader_acquireNextImage,
    AImageReader_delete, AImageReader_getWindow, AImageReader_new, AImageReader_setImageListener,
    AImage_delete, AImage_getFormat, AImage_getTimestamp, ANativeWindow,
};
use std::{
    ffi::c_void,
    panic::{self, AssertUnwindSafe},
    ptr::{null_mut, NonNull},
};
use tracing::{debug, error};

/// `AImageReader` backend.
pub struct NdkBackend;

/// Owning guard for an `AImageReader`.
///
/// Deleting the reader stops its listener, after which the boxed listener
/// context can be freed.
pub struct NdkReader {
    reader: NonNull<AImageReader>,
    _context: Option<Box<ListenerContext>>,
}

// The NDK reader handle may be used and deleted from any thread.
unsafe impl Send for NdkReader {}

impl Drop for NdkReader {
    fn drop(&mut self) {
        unsafe { AImageReader_delete(self.reader.as_ptr()) };
        debug!("AImageReader deleted");
    }
}

/// Window owned by an `AImageReader`, valid while the reader lives.
pub struct NdkWindow {
    window: NonNull<ANativeWindow>,
}

impl NdkWindow {
    pub fn as_ptr(&self) -> *mut ANativeWindow {
        self.window.as_ptr()
    }
}

impl ReaderBackend for NdkBackend {
    type Reader = NdkReader;
    type Window = NdkWindow;

    fn allocate(&self, spec: &StreamSpec) -> Result<NdkReader> {
        let allocation_error = |status: media_status_t| BridgeError::Allocation {
            width: spec.width,
            height: spec.height,
            format: spec.format,
            status: status.0,
        };

        let mut reader: *mut AImageReader = null_mut();
        let status = unsafe {
            AImageReader_new(
                spec.width,
                spec.height,
                spec.format.code(),
                spec.max_images,
                &mut reader,
            )
        };
        if status != media_status_t::AMEDIA_OK {
            return Err(allocation_error(status));
        }
        let reader =
            NonNull::new(reader).ok_or(allocation_error(media_status_t::AMEDIA_ERROR_UNKNOWN))?;
        debug!("AImageReader created");
        Ok(NdkReader {
            reader,
            _context: None,
        })
    }

    fn register(&self, reader: &mut NdkReader, context: ListenerContext) -> Result<()> {
        let context = Box::new(context);
        let mut listener = AImageReader_ImageListener {
            context: &*context as *const ListenerContext as *mut c_void,
            onImageAvailable: Some(on_image_available),
        };
        let status = unsafe { AImageReader_setImageListener(reader.reader.as_ptr(), &mut listener) };
        if status != media_status_t::AMEDIA_OK {
            return Err(BridgeError::Registration(status.0));
        }
        reader._context = Some(context);
        Ok(())
    }

    fn window(&self, reader: &NdkReader) -> Result<NdkWindow> {
        let mut window: *mut ANativeWindow = null_mut();
        let status = unsafe { AImageReader_getWindow(reader.reader.as_ptr(), &mut window) };
        if status != media_status_t::AMEDIA_OK {
            return Err(BridgeError::SurfaceRetrieval(status.0));
        }
        NonNull::new(window)
            .map(|window| NdkWindow { window })
            .ok_or(BridgeError::SurfaceRetrieval(
                media_status_t::AMEDIA_ERROR_UNKNOWN.0,
            ))
    }
}

/// Reader as seen from inside its own listener callback.
struct CallbackReader(NonNull<AImageReader>);

impl FrameSource for CallbackReader {
    type Frame = NdkImage;

    fn acquire_next(&self) -> Result<Option<NdkImage>> {
        let mut image: *mut AImage = null_mut();
        let status = unsafe { AImageReader_acquireNextImage(self.0.as_ptr(), &mut image) };
        if status == media_status_t::AMEDIA_IMGREADER_NO_BUFFER_AVAILABLE {
            return Ok(None);
        }
        if status != media_status_t::AMEDIA_OK {
            return Err(BridgeError::Acquisition(status.0));
        }
        Ok(NonNull::new(image).map(|image| NdkImage { image }))
    }
}

/// Owning guard for an acquired `AImage`.
pub struct NdkImage {
    image: NonNull<AImage>,
}

impl CapturedFrame for NdkImage {
    fn format(&self) -> Result<PixelFormat> {
        let mut format = 0;
        let status = unsafe { AImage_getFormat(self.image.as_ptr(), &mut format) };
        if status != media_status_t::AMEDIA_OK {
            return Err(BridgeError::Acquisition(status.0));
        }
        Ok(PixelFormat(format))
    }

    fn timestamp(&self) -> Result<i64> {
        let mut timestamp = 0;
        let status = unsafe { AImage_getTimestamp(self.image.as_ptr(), &mut timestamp) };
        if status != media_status_t::AMEDIA_OK {
            return Err(BridgeError::Acquisition(status.0));
        }
        Ok(timestamp)
    }
}

impl Drop for NdkImage {
    fn drop(&mut self) {
        unsafe { AImage_delete(self.image.as_ptr()) };
    }
}

unsafe extern "C" fn on_image_available(context: *mut c_void, reader: *mut AImageReader) {
    let (Some(context), Some(reader)) = (
        NonNull::new(context.cast::<ListenerContext>()),
        NonNull::new(reader),
    ) else {
        error!("image listener invoked without context or reader");
        return;
    };

    // The context box is owned by the NdkReader, which outlives its listener.
    let context = unsafe { context.as_ref() };
    let source = CallbackReader(reader);
    let handled = panic::catch_unwind(AssertUnwindSafe(|| {
        frame::on_image_available(&source, context);
    }));
    if handled.is_err() {
        error!(stream = context.stream, "panic in image listener");
    }
}
