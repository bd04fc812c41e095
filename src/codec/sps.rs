//! H.264 sequence parameter set inspection.
//!
//! Walks an Annex B access unit for the SPS NAL unit and extracts the true
//! (cropped) frame dimensions. Only the SPS header up to the cropping block
//! is parsed; nothing downstream of the dimensions is touched. Any parse
//! failure yields `None` so a malformed keyframe never disturbs a healthy
//! pipeline.

use crate::codec::StreamDimensions;
use crate::codec::bitread::BitReader;

/// NAL unit type carrying a sequence parameter set.
pub const NAL_SPS: u8 = 7;

/// NAL unit type carrying an IDR slice.
pub const NAL_IDR: u8 = 5;

/// Largest frame edge the parser accepts as plausible.
const MAX_PLAUSIBLE_DIM: u32 = 8192;

/// Profiles whose SPS carries the chroma/bit-depth/scaling-matrix block.
const EXTENDED_PROFILE_IDCS: [u32; 13] =
    [100, 110, 122, 244, 44, 83, 86, 118, 128, 138, 139, 134, 135];

/// Locate the first NAL unit of `nal_type` in Annex B `data`.
///
/// Handles both 3-byte and 4-byte start codes. The returned slice spans
/// from the NAL header byte up to the next start code, with start-code
/// leading zeros trimmed off the tail.
pub fn find_nal_unit(data: &[u8], nal_type: u8) -> Option<&[u8]> {
    let mut start: Option<usize> = None;
    let mut i = 0usize;

    while i + 3 <= data.len() {
        if data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1 {
            let header = i + 3;
            if let Some(s) = start {
                return Some(trim_start_code_zeros(data, s, i));
            }
            if header < data.len() && data[header] & 0x1F == nal_type {
                start = Some(header);
            }
            i = header;
        } else {
            i += 1;
        }
    }

    start.map(|s| trim_start_code_zeros(data, s, data.len()))
}

fn trim_start_code_zeros(data: &[u8], start: usize, mut end: usize) -> &[u8] {
    while end > start && data[end - 1] == 0 {
        end -= 1;
    }
    &data[start..end]
}

/// Parse the frame dimensions out of an SPS NAL unit (header byte included).
///
/// Returns the true display dimensions with frame cropping applied, before
/// any decoder alignment rounding.
pub fn parse_sps_dimensions(nal: &[u8]) -> Option<StreamDimensions> {
    if nal.first().map(|b| b & 0x1F) != Some(NAL_SPS) {
        return None;
    }

    let rbsp = strip_emulation_prevention(&nal[1..]);
    let mut r = BitReader::new(&rbsp);

    let profile_idc = r.read_bits(8)?;
    r.read_bits(8)?; // constraint flags + reserved
    r.read_bits(8)?; // level_idc
    r.read_ue()?; // seq_parameter_set_id

    let mut chroma_format_idc = 1; // 4:2:0 unless stated otherwise
    let mut separate_colour_plane = false;

    if EXTENDED_PROFILE_IDCS.contains(&profile_idc) {
        chroma_format_idc = r.read_ue()?;
        if chroma_format_idc == 3 {
            separate_colour_plane = r.read_bit()? == 1;
        }
        r.read_ue()?; // bit_depth_luma_minus8
        r.read_ue()?; // bit_depth_chroma_minus8
        r.read_bit()?; // qpprime_y_zero_transform_bypass_flag
        if r.read_bit()? == 1 {
            let list_count = if chroma_format_idc == 3 { 12 } else { 8 };
            for i in 0..list_count {
                if r.read_bit()? == 1 {
                    skip_scaling_list(&mut r, if i < 6 { 16 } else { 64 })?;
                }
            }
        }
    }

    r.read_ue()?; // log2_max_frame_num_minus4
    let pic_order_cnt_type = r.read_ue()?;
    if pic_order_cnt_type == 0 {
        r.read_ue()?; // log2_max_pic_order_cnt_lsb_minus4
    } else if pic_order_cnt_type == 1 {
        r.read_bit()?; // delta_pic_order_always_zero_flag
        r.read_se()?; // offset_for_non_ref_pic
        r.read_se()?; // offset_for_top_to_bottom_field
        let cycle_len = r.read_ue()?;
        if cycle_len > 256 {
            return None;
        }
        for _ in 0..cycle_len {
            r.read_se()?;
        }
    }

    r.read_ue()?; // max_num_ref_frames
    r.read_bit()?; // gaps_in_frame_num_value_allowed_flag

    let pic_width_in_mbs = r.read_ue()?.checked_add(1)?;
    let pic_height_in_map_units = r.read_ue()?.checked_add(1)?;
    let frame_mbs_only = r.read_bit()?;
    if frame_mbs_only == 0 {
        r.read_bit()?; // mb_adaptive_frame_field_flag
    }
    r.read_bit()?; // direct_8x8_inference_flag

    let (mut crop_left, mut crop_right, mut crop_top, mut crop_bottom) = (0, 0, 0, 0);
    if r.read_bit()? == 1 {
        crop_left = r.read_ue()?;
        crop_right = r.read_ue()?;
        crop_top = r.read_ue()?;
        crop_bottom = r.read_ue()?;
    }

    // Crop offsets scale by the chroma sampling grid (H.264 table 6-1).
    let chroma_array_type = if separate_colour_plane { 0 } else { chroma_format_idc };
    let (crop_unit_x, crop_unit_y) = match chroma_array_type {
        0 => (1, 2 - frame_mbs_only),
        1 => (2, 2 * (2 - frame_mbs_only)),
        2 => (2, 2 - frame_mbs_only),
        3 => (1, 2 - frame_mbs_only),
        _ => return None,
    };

    let coded_width = pic_width_in_mbs.checked_mul(16)?;
    let coded_height = pic_height_in_map_units
        .checked_mul(16)?
        .checked_mul(2 - frame_mbs_only)?;

    let width =
        coded_width.checked_sub(crop_left.checked_add(crop_right)?.checked_mul(crop_unit_x)?)?;
    let height =
        coded_height.checked_sub(crop_top.checked_add(crop_bottom)?.checked_mul(crop_unit_y)?)?;

    if width == 0 || height == 0 || width > MAX_PLAUSIBLE_DIM || height > MAX_PLAUSIBLE_DIM {
        return None;
    }

    Some(StreamDimensions::new(width, height))
}

/// Consume one scaling list without keeping its values.
///
/// The sum runs in i64: a hostile delta_scale can decode all the way to
/// ±`i32::MAX`, far outside the [-128, 127] range a real encoder emits.
fn skip_scaling_list(r: &mut BitReader<'_>, size: usize) -> Option<()> {
    let mut last_scale = 8i64;
    let mut next_scale = 8i64;
    for _ in 0..size {
        if next_scale != 0 {
            let delta = i64::from(r.read_se()?);
            next_scale = (last_scale + delta).rem_euclid(256);
        }
        if next_scale != 0 {
            last_scale = next_scale;
        }
    }
    Some(())
}

/// Undo emulation prevention: every `00 00 03` becomes `00 00`.
fn strip_emulation_prevention(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut zeros = 0u32;
    for &byte in data {
        if zeros >= 2 && byte == 3 {
            zeros = 0;
            continue;
        }
        zeros = if byte == 0 { zeros + 1 } else { 0 };
        out.push(byte);
    }
    out
}
