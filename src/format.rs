// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use core::fmt;

/// Platform image format code (`AIMAGE_FORMAT_*`).
///
/// Kept as an open newtype rather than an enum: any code the caller passes is
/// forwarded to the platform allocator unchanged, only a few are recognized.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PixelFormat(pub i32);

impl PixelFormat {
    /// 16-bit raw Bayer sensor data
    pub const RAW16: PixelFormat = PixelFormat(0x20);

    /// 10-bit YCbCr 4:2:0 semi-planar (P010)
    pub const YCBCR_P010: PixelFormat = PixelFormat(0x36);

    /// 8-bit YCbCr 4:2:0 flexible layout
    pub const YUV_420_888: PixelFormat = PixelFormat(0x23);

    /// Compressed JPEG
    pub const JPEG: PixelFormat = PixelFormat(0x100);

    /// Raw 10-bit packed sensor data
    pub const RAW10: PixelFormat = PixelFormat(0x25);

    /// Slot this format is tracked under, if any.
    pub const fn slot(self) -> Option<FormatSlot> {
        match self {
            PixelFormat::RAW16 => Some(FormatSlot::Raw),
            PixelFormat::YCBCR_P010 => Some(FormatSlot::LumaChroma),
            _ => None,
        }
    }

    pub const fn code(self) -> i32 {
        self.0
    }
}

impl From<i32> for PixelFormat {
    fn from(value: i32) -> Self {
        PixelFormat(value)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Named registry slots for the two streams the camera session configures.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FormatSlot {
    /// RAW16 sensor stream
    Raw,
    /// P010 processed stream
    LumaChroma,
}

impl FormatSlot {
    pub const ALL: [FormatSlot; 2] = [FormatSlot::Raw, FormatSlot::LumaChroma];

    pub const fn format(self) -> PixelFormat {
        match self {
            FormatSlot::Raw => PixelFormat::RAW16,
            FormatSlot::LumaChroma => PixelFormat::YCBCR_P010,
        }
    }
}

impl fmt::Display for FormatSlot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FormatSlot::Raw => write!(f, "raw"),
            FormatSlot::LumaChroma => write!(f, "luma-chroma"),
        }
    }
}
