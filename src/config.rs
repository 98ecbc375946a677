// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::error::{BridgeError, Result};

/// Number of images each reader can hold in flight.
pub const DEFAULT_MAX_IMAGES: i32 = 4;

/// Frame metadata entries buffered between the callback and its consumer.
pub const DEFAULT_FRAME_QUEUE_DEPTH: usize = 16;

/// Bridge configuration.
///
/// # Example
///
/// ```
/// use lazyshot::config::BridgeConfig;
///
/// let config = BridgeConfig::default().with_max_images(6);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_images, 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Ring-buffer capacity of every reader the bridge allocates
    pub max_images: i32,
    /// Bounded queue depth for frame metadata
    pub frame_queue_depth: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_images: DEFAULT_MAX_IMAGES,
            frame_queue_depth: DEFAULT_FRAME_QUEUE_DEPTH,
        }
    }
}

impl BridgeConfig {
    pub fn with_max_images(mut self, max_images: i32) -> Self {
        self.max_images = max_images;
        self
    }

    pub fn with_frame_queue_depth(mut self, depth: usize) -> Self {
        self.frame_queue_depth = depth;
        self
    }

    /// Checks the values the bridge itself depends on.
    ///
    /// Stream dimensions and formats are not checked here; they are forwarded
    /// to the platform allocator.
    pub fn validate(&self) -> Result<()> {
        if self.max_images < 1 {
            return Err(BridgeError::InvalidConfig(format!(
                "max_images must be at least 1, got {}",
                self.max_images
            )));
        }
        if self.frame_queue_depth == 0 {
            return Err(BridgeError::InvalidConfig(
                "frame_queue_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
