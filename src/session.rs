//! Submission-side types shared between the stream transport and the pipeline.

use crate::codec::{StreamDimensions, VideoCodec};
use crate::error::DecoderError;

/// A complete compressed video access unit, borrowed from the transport layer.
///
/// The pipeline copies the payload into a hardware buffer during submission,
/// so the borrow only needs to outlive the `submit` call.
#[derive(Debug, Clone, Copy)]
pub struct AccessUnit<'a> {
    data: &'a [u8],
    keyframe: bool,
}

impl<'a> AccessUnit<'a> {
    pub fn new(data: &'a [u8], keyframe: bool) -> Self {
        Self { data, keyframe }
    }

    /// A unit the transport marked as a random access point.
    pub fn keyframe(data: &'a [u8]) -> Self {
        Self::new(data, true)
    }

    /// A unit that depends on earlier frames.
    pub fn delta(data: &'a [u8]) -> Self {
        Self::new(data, false)
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn is_keyframe(&self) -> bool {
        self.keyframe
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Outcome of submitting one access unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitResult {
    /// Unit accepted by the decoder
    Ok,
    /// Unit dropped; the stream source should send a keyframe before
    /// the pipeline will accept delta frames again
    NeedKeyframe,
    /// No input buffer free; the unit was dropped without touching
    /// decoder state
    BufferExhausted,
}

impl SubmitResult {
    /// True when the caller should relay a keyframe request upstream.
    ///
    /// Covers `BufferExhausted` too: a dropped unit leaves a gap that
    /// later delta frames would reference, so recovery always goes
    /// through a keyframe.
    pub fn needs_keyframe(&self) -> bool {
        matches!(
            self,
            SubmitResult::NeedKeyframe | SubmitResult::BufferExhausted
        )
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, SubmitResult::Ok)
    }
}

/// Decode-and-display entry point the stream transport drives.
///
/// One handler instance serves one video stream; calls arrive from the
/// transport's receive thread in stream order.
pub trait VideoStreamHandler {
    /// Bring the pipeline up for the given codec and initial dimensions.
    fn on_stream_start(
        &mut self,
        codec: VideoCodec,
        dimensions: StreamDimensions,
    ) -> Result<(), DecoderError>;

    /// Hand one complete access unit to the decoder.
    fn on_access_unit(&mut self, unit: AccessUnit<'_>) -> SubmitResult;

    /// Tear the pipeline down, releasing all hardware resources.
    fn on_stream_stop(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_unit_constructors() {
        let payload = [1u8, 2, 3];
        let key = AccessUnit::keyframe(&payload);
        assert!(key.is_keyframe());
        assert_eq!(key.data(), &payload);
        assert_eq!(key.len(), 3);

        let delta = AccessUnit::delta(&payload);
        assert!(!delta.is_keyframe());
        assert!(!delta.is_empty());
    }

    #[test]
    fn test_submit_result_predicates() {
        assert!(SubmitResult::Ok.is_ok());
        assert!(!SubmitResult::Ok.needs_keyframe());
        assert!(SubmitResult::NeedKeyframe.needs_keyframe());
        assert!(!SubmitResult::BufferExhausted.is_ok());
        assert!(SubmitResult::BufferExhausted.needs_keyframe());
    }
}
