// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use ndk_sys::{__android_log_write, android_LogPriority};
use std::{
    ffi::{CStr, CString},
    io,
    os::raw::c_int,
};
use tracing::{warn, Level, Metadata};
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    Layer,
};

const TAG: &CStr = c"NativeCameraEngine";

/// `MakeWriter` that sends each formatted event to logcat as one entry.
pub struct Logcat;

pub struct LogcatWriter {
    priority: android_LogPriority,
    buf: Vec<u8>,
}

impl io::Write for LogcatWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LogcatWriter {
    fn drop(&mut self) {
        while self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        self.buf.retain(|&b| b != 0);
        let Ok(text) = CString::new(std::mem::take(&mut self.buf)) else {
            return;
        };
        unsafe {
            __android_log_write(self.priority.0 as c_int, TAG.as_ptr(), text.as_ptr());
        }
    }
}

impl<'a> MakeWriter<'a> for Logcat {
    type Writer = LogcatWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogcatWriter {
            priority: android_LogPriority::ANDROID_LOG_INFO,
            buf: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        let priority = match *meta.level() {
            Level::ERROR => android_LogPriority::ANDROID_LOG_ERROR,
            Level::WARN => android_LogPriority::ANDROID_LOG_WARN,
            Level::INFO => android_LogPriority::ANDROID_LOG_INFO,
            Level::DEBUG => android_LogPriority::ANDROID_LOG_DEBUG,
            Level::TRACE => android_LogPriority::ANDROID_LOG_VERBOSE,
        };
        LogcatWriter {
            priority,
            buf: Vec::new(),
        }
    }
}

/// Installs the logcat subscriber and forwards `log` records into it.
///
/// Does nothing if a global subscriber is already set.
pub fn init() {
    let layer = fmt::layer()
        .with_writer(Logcat)
        .with_ansi(false)
        .without_time()
        .with_level(false)
        .with_target(false)
        .with_filter(LevelFilter::DEBUG);
    let subscriber = tracing_subscriber::registry().with(layer);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return;
    }
    if let Err(e) = tracing_log::LogTracer::init() {
        warn!("log records will not reach logcat: {e}");
    }
}
