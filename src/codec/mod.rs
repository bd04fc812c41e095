//! Codec-level types and H.264 bitstream inspection.
//!
//! The pipeline never decodes video itself; this module only carries the
//! codec identity and the minimal bitstream parsing needed to spot a
//! resolution change inside a keyframe (start code scan + SPS header).

pub mod bitread;
pub mod sps;

pub use sps::{find_nal_unit, parse_sps_dimensions};

/// Horizontal alignment the decoder requires for its coded frame width.
pub const WIDTH_ALIGN: u32 = 32;

/// Vertical alignment the decoder requires for its coded frame height.
pub const HEIGHT_ALIGN: u32 = 16;

/// Round `value` up to the next multiple of `align`.
///
/// `align` must be a power of two.
#[inline]
pub const fn align_up(value: u32, align: u32) -> u32 {
    (value + align - 1) & !(align - 1)
}

/// Compressed video codec carried by the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    H264,
    Hevc,
}

impl std::fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoCodec::H264 => write!(f, "H.264"),
            VideoCodec::Hevc => write!(f, "HEVC"),
        }
    }
}

/// True (display) dimensions of the video stream.
///
/// The decoder works on alignment-rounded coded dimensions while the crop
/// keeps the true ones; [`StreamDimensions::coded`] performs the rounding.
/// Two streams are "the same size" for reconfiguration purposes when their
/// coded forms match, so a 1920×1080 stream re-announced as 1920×1088 does
/// not force a pipeline rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDimensions {
    pub width: u32,
    pub height: u32,
}

impl StreamDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width rounded up to the decoder's horizontal alignment.
    pub const fn coded_width(&self) -> u32 {
        align_up(self.width, WIDTH_ALIGN)
    }

    /// Height rounded up to the decoder's vertical alignment.
    pub const fn coded_height(&self) -> u32 {
        align_up(self.height, HEIGHT_ALIGN)
    }

    /// Alignment-rounded dimensions as committed to the decoder.
    pub const fn coded(&self) -> StreamDimensions {
        StreamDimensions {
            width: self.coded_width(),
            height: self.coded_height(),
        }
    }
}

impl std::fmt::Display for StreamDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
