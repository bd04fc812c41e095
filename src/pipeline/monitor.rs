//! Stream format monitoring.
//!
//! Keyframes carry the sequence parameter set, so they are the only place a
//! resolution change can announce itself. The monitor is pure inspection:
//! it reports what the bitstream says and leaves every decision to the
//! controller.

use crate::codec::sps::{NAL_SPS, find_nal_unit, parse_sps_dimensions};
use crate::codec::StreamDimensions;

/// Extract the stream dimensions embedded in a keyframe access unit.
///
/// Returns `None` when the unit carries no SPS or the SPS does not parse;
/// a malformed keyframe therefore leaves the running configuration alone.
pub fn probe_access_unit(au: &[u8]) -> Option<StreamDimensions> {
    let sps = find_nal_unit(au, NAL_SPS)?;
    parse_sps_dimensions(sps)
}

/// Whether `parsed` requires a pipeline rebuild relative to `current`.
///
/// Compared in alignment-rounded (coded) form, exactly as the decoder was
/// configured: a 1080-row stream re-announced as 1088 coded rows is the
/// same decoder configuration and must not trigger a reconfigure.
pub fn dimensions_changed(current: StreamDimensions, parsed: StreamDimensions) -> bool {
    current.coded() != parsed.coded()
}
