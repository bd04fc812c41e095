//! Hardware component contract.
//!
//! The pipeline drives a platform decode engine through these traits; the
//! embedding application supplies the implementation (V4L2, MMAL, VideoCore
//! and friends all fit the port model). Two rules keep the boundary safe:
//!
//! - Buffers move: `send_input`/`send_output` take the buffer by value and
//!   either keep it (hardware owns it until a completion event carries it
//!   back) or give it straight back inside [`Rejected`].
//! - Completion callbacks never run pipeline code. Implementations push
//!   [`HwEvent`]s into the channel sender handed over at port-enable time
//!   and return; the pipeline drains the channel on its own thread. Senders
//!   must be dropped when the component is dropped so the channel can
//!   disconnect.

use crossbeam_channel::Sender;

use crate::codec::{StreamDimensions, VideoCodec};
use crate::error::HwError;
use crate::hw::buffer::HwBuffer;

/// Buffer count/size requirements reported by a port after its format is
/// committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferHint {
    /// Recommended number of buffers for smooth operation.
    pub count: usize,
    /// Required size of each buffer in bytes.
    pub size: usize,
}

/// Compressed-side format committed to the decoder input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputFormat {
    pub codec: VideoCodec,
    /// Alignment-rounded dimensions the decoder works on.
    pub coded: StreamDimensions,
    /// True display dimensions (crop window).
    pub crop: StreamDimensions,
    /// Frames per second as a rational; (0, 1) when unknown.
    pub frame_rate: (u32, u32),
    /// Pixel aspect ratio as a rational.
    pub pixel_aspect: (u32, u32),
}

impl InputFormat {
    /// Format for a variable-rate interactive stream: square pixels,
    /// unknown frame rate, coded dimensions derived from `dims`.
    pub fn interactive(codec: VideoCodec, dims: StreamDimensions) -> Self {
        Self {
            codec,
            coded: dims.coded(),
            crop: dims,
            frame_rate: (0, 1),
            pixel_aspect: (1, 1),
        }
    }
}

/// Decoded-frame memory layout shared by decoder output and renderer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLayout {
    /// GPU-resident frames; the CPU never sees pixels.
    Opaque,
}

/// Format committed to the decoder output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub layout: FrameLayout,
}

/// Format committed to the renderer input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderFormat {
    pub layout: FrameLayout,
    pub dims: StreamDimensions,
}

/// Destination rectangle in display coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Rotation applied by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayTransform {
    #[default]
    Rot0,
    Rot90,
    Rot180,
    Rot270,
}

/// Where and how decoded video lands on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayRegion {
    /// Cover the whole display; `dest` is ignored when set.
    pub fullscreen: bool,
    pub dest: Rect,
    /// Z-order layer; compositor stacks decide the useful values.
    pub layer: i32,
    pub transform: DisplayTransform,
}

impl DisplayRegion {
    pub fn fullscreen() -> Self {
        Self {
            fullscreen: true,
            dest: Rect::default(),
            layer: 0,
            transform: DisplayTransform::Rot0,
        }
    }

    pub fn windowed(dest: Rect) -> Self {
        Self { fullscreen: false, dest, ..Self::fullscreen() }
    }

    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_transform(mut self, transform: DisplayTransform) -> Self {
        self.transform = transform;
        self
    }
}

impl Default for DisplayRegion {
    fn default() -> Self {
        Self::fullscreen()
    }
}

/// Completion events emitted by hardware components.
///
/// Buffer-carrying variants complete a buffer's round trip; the buffer they
/// hold is the one originally handed to the port.
#[derive(Debug)]
pub enum HwEvent {
    /// The decoder consumed an input buffer (decoder input port).
    InputReturned(HwBuffer),
    /// The decoder filled an output buffer with a frame (decoder output port).
    FrameDecoded(HwBuffer),
    /// The renderer finished displaying a frame buffer (renderer input port).
    FrameRetired(HwBuffer),
    /// Asynchronous hardware error with its platform status code (control port).
    ControlError(u32),
}

/// A hand-off the port refused; the buffer comes straight back to the caller.
#[derive(Debug)]
pub struct Rejected(pub HwBuffer);

/// Hardware H.264 decoder component.
///
/// Call order: `commit_input_format` → `commit_output_format` →
/// (`*_buffer_hint`) → `enable_control` → `enable_input`/`enable_output` →
/// `enable`. `disable_ports` must come before drop.
pub trait DecoderComponent: Send {
    fn commit_input_format(&mut self, format: &InputFormat) -> Result<(), HwError>;

    fn commit_output_format(&mut self, format: &OutputFormat) -> Result<(), HwError>;

    /// Valid after `commit_input_format`.
    fn input_buffer_hint(&self) -> BufferHint;

    /// Valid after `commit_output_format`.
    fn output_buffer_hint(&self) -> BufferHint;

    fn enable_control(&mut self, events: Sender<HwEvent>) -> Result<(), HwError>;

    fn enable_input(&mut self, events: Sender<HwEvent>) -> Result<(), HwError>;

    fn enable_output(&mut self, events: Sender<HwEvent>) -> Result<(), HwError>;

    /// Switch the component on once ports are enabled.
    fn enable(&mut self) -> Result<(), HwError>;

    /// Queue a compressed access unit for decoding.
    fn send_input(&mut self, buffer: HwBuffer) -> Result<(), Rejected>;

    /// Give the decoder an empty buffer to decode the next frame into.
    fn send_output(&mut self, buffer: HwBuffer) -> Result<(), Rejected>;

    /// Stop port activity and event delivery. Safe to call more than once.
    fn disable_ports(&mut self);
}

/// Hardware video renderer component.
pub trait RendererComponent: Send {
    fn commit_input_format(&mut self, format: &RenderFormat) -> Result<(), HwError>;

    fn set_display_region(&mut self, region: &DisplayRegion) -> Result<(), HwError>;

    fn enable_control(&mut self, events: Sender<HwEvent>) -> Result<(), HwError>;

    fn enable_input(&mut self, events: Sender<HwEvent>) -> Result<(), HwError>;

    fn enable(&mut self) -> Result<(), HwError>;

    /// Queue a decoded frame for display.
    fn send_input(&mut self, buffer: HwBuffer) -> Result<(), Rejected>;

    fn disable_ports(&mut self);
}

/// Factory for the platform's decode and render components.
pub trait VideoDriver: Send + Sync {
    fn create_decoder(&self) -> Result<Box<dyn DecoderComponent>, HwError>;

    fn create_renderer(&self) -> Result<Box<dyn RendererComponent>, HwError>;
}
