// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use lazyshot::{config::BridgeConfig, format::PixelFormat};
use std::{fmt, path::PathBuf, str::FromStr};

/// One simulated capture stream: width, height and platform format code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamArg {
    pub width: i32,
    pub height: i32,
    pub format: PixelFormat,
}

impl FromStr for StreamArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        let [width, height, format] = parts.as_slice() else {
            return Err(format!("expected \"WIDTH HEIGHT FORMAT\", got \"{s}\""));
        };
        let width = width.parse::<i32>().map_err(|e| format!("width {width}: {e}"))?;
        let height = height.parse::<i32>().map_err(|e| format!("height {height}: {e}"))?;
        let format = parse_format(format)?;
        Ok(Self {
            width,
            height,
            format,
        })
    }
}

impl fmt::Display for StreamArg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.format)
    }
}

fn parse_format(s: &str) -> Result<PixelFormat, String> {
    let code = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => i32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    code.map(PixelFormat).map_err(|e| format!("format {s}: {e}"))
}

/// Command-line arguments for the LazyShot simulated capture run.
///
/// Drives the capture bridge against the simulated image-reader platform so
/// the frame path can be exercised on a host.
///
/// # Example
///
/// ```bash
/// # Two streams at 60 fps with a deeper ring buffer
/// lazyshot-sim --stream "4096 3072 0x20" --stream "1920 1080 0x36" --fps 60 --max-images 6
///
/// # Via environment variables
/// export FRAMES=600
/// lazyshot-sim --stats-json stats.json
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Capture stream as "WIDTH HEIGHT FORMAT", format in decimal or 0x hex
    /// (repeatable)
    #[arg(
        long = "stream",
        default_values = ["640 480 0x20", "640 480 0x36"],
    )]
    pub streams: Vec<StreamArg>,

    /// Frames produced per stream
    #[arg(long, env = "FRAMES", default_value = "120")]
    pub frames: u64,

    /// Frame rate of each simulated camera stream
    #[arg(long, env = "FPS", default_value = "30")]
    pub fps: u32,

    /// Ring-buffer capacity of each image reader
    #[arg(long, env = "MAX_IMAGES", default_value = "4")]
    pub max_images: i32,

    /// Depth of the frame metadata queue
    #[arg(long, env = "QUEUE_DEPTH", default_value = "16")]
    pub queue_depth: usize,

    /// Frames per stream between frame rate reports
    #[arg(long, env = "REPORT_EVERY", default_value = "30")]
    pub report_every: u64,

    /// Write final statistics as JSON to this path
    #[arg(long, env = "STATS_JSON")]
    pub stats_json: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Also log to the systemd journal
    #[arg(long, env = "JOURNALD")]
    pub journald: bool,

    /// Enable Tracy profiler for performance analysis
    #[arg(long, env = "TRACY")]
    pub tracy: bool,

    /// Enable Tokio async runtime console for debugging
    #[arg(long, env = "TOKIO_CONSOLE")]
    pub tokio_console: bool,
}

impl From<&Args> for BridgeConfig {
    fn from(args: &Args) -> Self {
        BridgeConfig::default()
            .with_max_images(args.max_images)
            .with_frame_queue_depth(args.queue_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_arg_hex_format() {
        let arg: StreamArg = "640 480 0x20".parse().unwrap();
        assert_eq!(
            arg,
            StreamArg {
                width: 640,
                height: 480,
                format: PixelFormat::RAW16,
            }
        );
        assert_eq!(arg.to_string(), "640x480 0x20");
    }

    #[test]
    fn test_stream_arg_decimal_format() {
        let arg: StreamArg = "640 480 54".parse().unwrap();
        assert_eq!(arg.format, PixelFormat::YCBCR_P010);
        let arg: StreamArg = "  1920   1080 0X36 ".parse().unwrap();
        assert_eq!((arg.width, arg.height), (1920, 1080));
        assert_eq!(arg.format, PixelFormat::YCBCR_P010);
    }

    #[test]
    fn test_stream_arg_malformed() {
        let err = "640 480".parse::<StreamArg>().unwrap_err();
        assert!(err.contains("WIDTH HEIGHT FORMAT"), "{err}");
        assert!("640 480 0x20 1".parse::<StreamArg>().is_err());

        let err = "wide 480 0x20".parse::<StreamArg>().unwrap_err();
        assert!(err.starts_with("width wide"), "{err}");
        let err = "640 480 0xZZ".parse::<StreamArg>().unwrap_err();
        assert!(err.starts_with("format 0xZZ"), "{err}");
    }

    #[test]
    fn test_default_streams_parse() {
        let args = Args::parse_from(["lazyshot-sim"]);
        assert_eq!(args.streams.len(), 2);
        assert_eq!(args.streams[0].format, PixelFormat::RAW16);
        assert_eq!(args.streams[1].format, PixelFormat::YCBCR_P010);
    }
}
