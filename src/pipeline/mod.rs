//! Hardware decode-and-display pipeline
//!
//! This module provides the full path from compressed access units to
//! frames on screen, separating concerns between:
//! - Control/Coordination: state machine and lifecycle management
//! - Flow Control: buffer pools and the submission gate
//! - Media Processing: hardware decode and display stages
//! - Observability: health metrics and stream format monitoring
//!
//! # Architecture
//!
//! The pipeline is organized around buffer ownership:
//! - BufferPool hands buffers out; components give them back via events
//! - FlowControlGate bounds in-flight input, one permit per buffer
//! - DecodeStage and DisplaySink each own one hardware component
//! - A completion pump thread turns hardware events back into capacity
//! - PipelineController chains it all together and manages lifecycle

pub mod controller;
pub mod decode;
pub mod display;
pub mod gate;
pub mod health;
pub mod monitor;
pub mod pool;
pub mod state;

pub use controller::PipelineController;
pub use decode::DecodeStage;
pub use display::DisplaySink;
pub use gate::FlowControlGate;
pub use health::{HealthSummary, PipelineHealth};
pub use monitor::{dimensions_changed, probe_access_unit};
pub use pool::BufferPool;
pub use state::PipelineState;
