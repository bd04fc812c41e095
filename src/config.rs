//! Pipeline tuning knobs.

/// Buffer provisioning for the decode pipeline.
///
/// The hardware reports its own minimums after format negotiation; these
/// values set the floor, and the larger of the two wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Number of compressed-input buffers; bounds access units in flight
    pub input_buffer_count: usize,
    /// Capacity of each input buffer; larger access units are refused
    pub max_access_unit_size: usize,
    /// Minimum number of decoded-frame buffers
    pub output_buffer_count: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_buffer_count: 5,            // enough slack for bursty delivery
            max_access_unit_size: 256 * 1024, // largest unit interactive encoders emit
            output_buffer_count: 3,
        }
    }
}
