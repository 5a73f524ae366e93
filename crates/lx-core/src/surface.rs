//! Host surface types
//!
//! A surface is owned by the host windowing system. The shell only carries
//! an opaque handle to it and never frees the underlying memory.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

/// Opaque reference to a host-provided render surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(NonZeroU64);

impl SurfaceHandle {
    /// Wrap a raw host handle. Zero is the host's null surface.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Raw host value
    pub fn raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Pixel layout of a host surface
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// 16-bit 5:6:5
    Rgb565,
    /// 24-bit 8:8:8 (also used for 32-bit RGBX windows)
    #[default]
    Rgb888,
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb565" => Ok(Self::Rgb565),
            "rgb888" => Ok(Self::Rgb888),
            other => Err(format!("unknown pixel format '{}'", other)),
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb565 => write!(f, "rgb565"),
            Self::Rgb888 => write!(f, "rgb888"),
        }
    }
}

/// Everything the engine needs to attach to a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDesc {
    pub handle: SurfaceHandle,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl SurfaceDesc {
    /// Describe a surface in the default pixel format
    pub fn new(handle: SurfaceHandle, width: u32, height: u32) -> Self {
        Self {
            handle,
            width,
            height,
            format: PixelFormat::default(),
        }
    }

    /// Override the pixel format
    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    /// A zero-area surface cannot produce a valid frame
    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl fmt::Display for SurfaceDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}x{} {}",
            self.handle, self.width, self.height, self.format
        )
    }
}
