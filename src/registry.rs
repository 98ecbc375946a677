// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    format::{FormatSlot, PixelFormat},
    frame::StreamId,
};

/// Parameters a reader was allocated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub width: i32,
    pub height: i32,
    pub format: PixelFormat,
    pub max_images: i32,
}

/// A created stream as seen from outside the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub id: StreamId,
    pub spec: StreamSpec,
}

struct Entry<R> {
    info: StreamInfo,
    _reader: R,
}

/// Owner of every reader the bridge has handed a surface out for.
///
/// The two named slots hold the latest RAW16 and P010 readers. A reader
/// replaced in a slot moves to the retired list rather than being released,
/// since the capture session may still be writing into its surface. Streams
/// of other formats are kept in the untracked list. All readers are released
/// when the registry is dropped.
pub struct ReaderRegistry<R> {
    raw: Option<Entry<R>>,
    luma_chroma: Option<Entry<R>>,
    retired: Vec<Entry<R>>,
    untracked: Vec<Entry<R>>,
}

impl<R> Default for ReaderRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> ReaderRegistry<R> {
    pub fn new() -> Self {
        Self {
            raw: None,
            luma_chroma: None,
            retired: Vec::new(),
            untracked: Vec::new(),
        }
    }

    /// Records a committed reader, returning the stream it displaced from a
    /// named slot, if any.
    pub fn install(&mut self, info: StreamInfo, reader: R) -> Option<StreamInfo> {
        let entry = Entry {
            info,
            _reader: reader,
        };
        let slot = match info.spec.format.slot() {
            Some(FormatSlot::Raw) => &mut self.raw,
            Some(FormatSlot::LumaChroma) => &mut self.luma_chroma,
            None => {
                self.untracked.push(entry);
                return None;
            }
        };

        let previous = slot.replace(entry)?;
        let replaced = previous.info;
        self.retired.push(previous);
        Some(replaced)
    }

    pub fn slot(&self, slot: FormatSlot) -> Option<StreamInfo> {
        let entry = match slot {
            FormatSlot::Raw => self.raw.as_ref(),
            FormatSlot::LumaChroma => self.luma_chroma.as_ref(),
        };
        entry.map(|e| e.info)
    }

    pub fn untracked(&self) -> impl Iterator<Item = StreamInfo> + '_ {
        self.untracked.iter().map(|e| e.info)
    }

    pub fn retired(&self) -> impl Iterator<Item = StreamInfo> + '_ {
        self.retired.iter().map(|e| e.info)
    }

    /// Number of readers currently owned.
    pub fn len(&self) -> usize {
        self.raw.is_some() as usize
            + self.luma_chroma.is_some() as usize
            + self.retired.len()
            + self.untracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
