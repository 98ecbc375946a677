// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! JNI entry points called from `com.example.lazyshot`.

use super::{logcat, NdkBackend, NdkWindow};
use crate::{
    bridge::CaptureBridge,
    config::BridgeConfig,
    error::{BridgeError, Result},
    format::PixelFormat,
    monitor::run_frame_worker,
};
use jni::{
    objects::JObject,
    sys::{jint, jobject, jstring},
    JNIEnv,
};
use std::{
    panic::{self, AssertUnwindSafe},
    ptr::null_mut,
    sync::OnceLock,
    thread,
};
use tracing::{error, info, warn};

/// Frames per stream between rate reports from the frame worker.
const REPORT_EVERY: u64 = 300;

static BRIDGE: OnceLock<Option<CaptureBridge<NdkBackend>>> = OnceLock::new();

fn bridge() -> Option<&'static CaptureBridge<NdkBackend>> {
    BRIDGE
        .get_or_init(|| {
            logcat::init();
            let (bridge, rx) = match CaptureBridge::new(NdkBackend, BridgeConfig::default()) {
                Ok(v) => v,
                Err(e) => {
                    error!("{e}");
                    return None;
                }
            };
            let worker = thread::Builder::new()
                .name("frame-worker".to_string())
                .spawn(move || {
                    run_frame_worker(rx, REPORT_EVERY);
                });
            if let Err(e) = worker {
                warn!("frame worker not started, frame metadata will be dropped: {e}");
            }
            info!("capture bridge initialized");
            Some(bridge)
        })
        .as_ref()
}

fn to_surface(env: &JNIEnv, window: &NdkWindow) -> Result<jobject> {
    let surface = unsafe {
        ndk_sys::ANativeWindow_toSurface(env.get_raw().cast(), window.as_ptr())
    };
    if surface.is_null() {
        return Err(BridgeError::SurfaceConversion);
    }
    Ok(surface as jobject)
}

fn create_native_image_reader(env: &JNIEnv, width: jint, height: jint, format: jint) -> jobject {
    let Some(bridge) = bridge() else {
        return null_mut();
    };
    // failures, including surface conversion, are logged by the bridge
    bridge
        .create_stream_with(width, height, PixelFormat::from(format), |window| {
            to_surface(env, &window)
        })
        .unwrap_or(null_mut())
}

/// `CameraRepository.createNativeImageReader(width, height, format): Surface?`
#[no_mangle]
pub extern "system" fn Java_com_example_lazyshot_CameraRepository_createNativeImageReader<
    'local,
>(
    env: JNIEnv<'local>,
    _this: JObject<'local>,
    width: jint,
    height: jint,
    format: jint,
) -> jobject {
    panic::catch_unwind(AssertUnwindSafe(|| {
        create_native_image_reader(&env, width, height, format)
    }))
    .unwrap_or_else(|_| {
        error!("panic in createNativeImageReader");
        null_mut()
    })
}

/// `MainActivity.stringFromJNI(): String`
#[no_mangle]
pub extern "system" fn Java_com_example_lazyshot_MainActivity_stringFromJNI<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
) -> jstring {
    let banner = format!("LazyShot native {}", env!("CARGO_PKG_VERSION"));
    match env.new_string(banner) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            error!("{e}");
            null_mut()
        }
    }
}
