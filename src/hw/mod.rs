//! Hardware abstraction for decode and render components.
//!
//! The crate never talks to hardware directly. Everything below the
//! pipeline goes through the [`VideoDriver`] trait family, which models the
//! port-based component engines common to embedded decode hardware: commit
//! a format, enable ports with an event sender, move buffers in, get them
//! back through completion events.

pub mod buffer;
pub mod component;
#[cfg(test)]
pub(crate) mod mock;

pub use buffer::{BufferFlags, HwBuffer};
pub use component::{
    BufferHint, DecoderComponent, DisplayRegion, DisplayTransform, FrameLayout, HwEvent,
    InputFormat, OutputFormat, Rect, Rejected, RenderFormat, RendererComponent, VideoDriver,
};
