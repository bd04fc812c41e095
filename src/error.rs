//! Typed errors for the decode pipeline.
//!
//! Uses `thiserror` for library-grade errors. The session layer surfaces
//! [`DecoderError::code`] as a stable nonzero integer across the transport
//! boundary, so codes must never be renumbered.

use crate::codec::VideoCodec;

/// Errors reported by a hardware video component.
///
/// Every variant is terminal for the configure attempt that produced it:
/// the pipeline tears down whatever was built so far and reports upward,
/// it never retries a partially-opened component.
#[derive(Debug, thiserror::Error)]
pub enum HwError {
    #[error("component creation failed: {0}")]
    ComponentCreate(String),

    #[error("format rejected by {port} port: {reason}")]
    FormatRejected { port: &'static str, reason: String },

    #[error("failed to enable {0}")]
    EnableFailed(String),

    #[error("parameter rejected: {0}")]
    ParameterRejected(String),
}

/// Errors raised while opening or reconfiguring the decode pipeline.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    /// The stream announced a codec this pipeline cannot decode in hardware.
    #[error("{0} is not supported by the hardware decode pipeline")]
    UnsupportedCodec(VideoCodec),

    /// Some step of hardware bring-up failed; the pipeline is stopped.
    #[error("failed to open hardware decode pipeline: {0}")]
    OpenFailed(#[from] HwError),
}

impl DecoderError {
    /// Stable nonzero integer code for the session/transport boundary.
    pub fn code(&self) -> i32 {
        match self {
            Self::UnsupportedCodec(_) => 1,
            Self::OpenFailed(_) => 2,
        }
    }
}
