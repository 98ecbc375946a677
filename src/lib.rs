// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # LazyShot Native Capture Bridge
//!
//! Native side of the LazyShot camera app. The managed `CameraRepository`
//! asks the bridge for one image-reader surface per capture stream (a RAW16
//! stream and a P010 stream) and routes those surfaces into its capture
//! session. Every frame the camera writes is acquired, its format and
//! timestamp logged, its metadata queued for the frame worker, and the image
//! released.
//!
//! ## Features
//!
//! - **Scoped readers**: platform readers are owned by guards and released on
//!   every setup failure path, or when the bridge is dropped.
//! - **Explicit registry**: the latest RAW16 and P010 readers are kept in
//!   named slots of a registry owned by the bridge.
//! - **Bounded frame queue**: frame metadata flows through a `kanal` queue;
//!   overflow is counted instead of blocking the camera callback thread.
//! - **Simulated platform**: [`sim::SimulatedPlatform`] runs the same bridge
//!   on hosts without a camera.
//!
//! ## Example
//!
//! ```
//! use lazyshot::{
//!     bridge::CaptureBridge,
//!     config::BridgeConfig,
//!     format::{FormatSlot, PixelFormat},
//!     sim::SimulatedPlatform,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (bridge, frames) = CaptureBridge::new(SimulatedPlatform::default(), BridgeConfig::default())?;
//! let raw = bridge.create_stream(640, 480, PixelFormat::RAW16)?;
//! let p010 = bridge.create_stream(640, 480, PixelFormat::YCBCR_P010)?;
//!
//! raw.queue_frame(1_000);
//! p010.queue_frame(1_000);
//! assert_eq!(frames.len(), 2);
//! assert_eq!(bridge.slot(FormatSlot::LumaChroma).map(|s| s.id), Some(p010.stream()));
//! # Ok(())
//! # }
//! ```
//!
//! ## Platform Requirements
//!
//! - **Android**: API level 26+ (`AImageReader`, `ANativeWindow_toSurface`).
//!   The JNI entry points live in the `android` module, compiled only for
//!   Android targets.
//! - **Host**: the simulated platform and `lazyshot-sim` binary build on any
//!   target.
//!
//! ## Safety
//!
//! The NDK backend uses `unsafe` FFI calls. They are confined to the
//! `android` module and wrapped in owning guards.

pub mod bridge;
pub mod config;
pub mod error;
pub mod format;
pub mod frame;
pub mod monitor;
pub mod registry;
pub mod sim;

#[cfg(target_os = "android")]
pub mod android;
