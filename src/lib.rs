//! Hardware-accelerated video decode and display for interactive streams.
//!
//! Takes complete H.264 access units from a low-latency stream source,
//! decodes them on platform hardware and hands the frames to a hardware
//! renderer without the pixels ever crossing the CPU. Designed for
//! remote-desktop style streams: variable frame rate, keyframe-based
//! recovery, mid-stream resolution changes.
//!
//! The platform decode engine is supplied by the embedding application as
//! a [`hw::VideoDriver`]; everything above that boundary is portable.
//!
//! ```no_run
//! use std::sync::Arc;
//! use viewcast::codec::{StreamDimensions, VideoCodec};
//! use viewcast::config::PipelineConfig;
//! use viewcast::hw::DisplayRegion;
//! use viewcast::pipeline::PipelineController;
//! use viewcast::session::AccessUnit;
//!
//! # fn driver() -> Arc<dyn viewcast::hw::VideoDriver> { unimplemented!() }
//! # fn main() -> Result<(), viewcast::error::DecoderError> {
//! let mut pipeline =
//!     PipelineController::new(driver(), PipelineConfig::default(), DisplayRegion::fullscreen());
//! pipeline.start(VideoCodec::H264, StreamDimensions::new(1920, 1080))?;
//!
//! let first_unit: &[u8] = &[];
//! let result = pipeline.submit(AccessUnit::keyframe(first_unit));
//! if result.needs_keyframe() {
//!     // relay the request to the stream source
//! }
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod hw;
pub mod pipeline;
pub mod session;

pub use codec::{StreamDimensions, VideoCodec};
pub use config::PipelineConfig;
pub use error::{DecoderError, HwError};
pub use pipeline::{PipelineController, PipelineHealth};
pub use session::{AccessUnit, SubmitResult, VideoStreamHandler};
