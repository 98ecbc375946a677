// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::format::PixelFormat;
use thiserror::Error;

/// Reasons a bridge operation can fail.
///
/// Platform status codes are carried as the raw `media_status_t` value so the
/// same error type serves the NDK backend and the simulated platform.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Failed to create image reader {width}x{height} format {format} (status {status})")]
    Allocation {
        width: i32,
        height: i32,
        format: PixelFormat,
        status: i32,
    },

    #[error("Failed to set image listener (status {0})")]
    Registration(i32),

    #[error("Failed to get window from reader (status {0})")]
    SurfaceRetrieval(i32),

    #[error("Failed to convert native window to a Surface")]
    SurfaceConversion,

    #[error("Failed to acquire image (status {0})")]
    Acquisition(i32),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BridgeError {
    /// Short name of the failure kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::Allocation { .. } => "allocation",
            BridgeError::Registration(_) => "registration",
            BridgeError::SurfaceRetrieval(_) => "surface_retrieval",
            BridgeError::SurfaceConversion => "surface_conversion",
            BridgeError::Acquisition(_) => "acquisition",
            BridgeError::InvalidConfig(_) => "invalid_config",
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
