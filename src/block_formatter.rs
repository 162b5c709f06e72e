//! Assembles a segment list into the final interleaved, remainder-padded
//! codeword bitstream that the symbol builder paints onto the module grid.

use crate::bit_buffer::Bitstream;
use crate::level::RecoveryLevel;
use crate::reed_solomon::ReedSolomonGenerator;
use crate::segment::Segment;
use crate::version::{self, Version};

/// Concatenates `segs` and pads/splits/interleaves them into the final codeword
/// bitstream for `version` at `level`.
///
/// Requires `Segment::get_total_bits(segs, version) <= Some(version::data_capacity_bits(version, level))`;
/// this is exactly the condition the version selector already checked, so it is only
/// asserted here, not re-validated as a recoverable error.
pub fn format_codewords(segs: &[Segment], version: Version, level: RecoveryLevel) -> Bitstream {
    let capacity_bits = version::data_capacity_bits(version, level);

    let mut bb = Bitstream::new();
    for seg in segs {
        bb.append_bits(seg.mode().mode_bits(), 4);
        bb.append_bits(
            seg.num_chars() as u32,
            seg.mode().num_char_count_bits(version),
        );
        bb.append(seg.data());
    }
    assert!(
        bb.len() <= capacity_bits,
        "segment bits ({}) exceed capacity ({capacity_bits}) for version {}",
        bb.len(),
        version.value()
    );

    // Terminator: up to 4 zero bits.
    let num_terminator_bits = std::cmp::min(4, capacity_bits - bb.len());
    bb.append_bools(num_terminator_bits, false);

    // Pad to a byte boundary.
    let pad_to_byte = bb.len().wrapping_neg() & 7;
    bb.append_bools(pad_to_byte, false);

    // Alternate 0xEC/0x11 pad bytes until the codeword capacity is filled.
    let mut pad_byte: u32 = 0xEC;
    while bb.len() < capacity_bits {
        bb.append_bits(pad_byte, 8);
        pad_byte ^= 0xEC ^ 0x11;
    }
    assert_eq!(
        bb.len(),
        capacity_bits,
        "padding did not reach exact capacity"
    );

    let data_codewords = bb.to_bytes();
    let interleaved = interleave_with_ec(&data_codewords, version, level);

    let mut out = Bitstream::new();
    for b in interleaved {
        out.append_bits(u32::from(b), 8);
    }
    out.append_bools(version::num_remainder_bits(version), false);
    out
}

/// Splits `data` into the per-version/level blocks, computes Reed-Solomon parity for
/// each, then interleaves data codewords (round-robin, skipping exhausted blocks) and
/// appends the interleaved EC codewords.
fn interleave_with_ec(data: &[u8], version: Version, level: RecoveryLevel) -> Vec<u8> {
    let groups = version::block_groups(version, level);
    let ecc_len = version::ecc_codewords_per_block(version, level);
    let rs = ReedSolomonGenerator::new(ecc_len);

    let mut data_blocks: Vec<&[u8]> = Vec::new();
    let mut ec_blocks: Vec<Vec<u8>> = Vec::new();
    let mut offset = 0usize;
    for group in &groups {
        for _ in 0..group.count {
            let block = &data[offset..offset + group.data_codewords];
            offset += group.data_codewords;
            ec_blocks.push(rs.get_remainder(block));
            data_blocks.push(block);
        }
    }
    assert_eq!(
        offset,
        data.len(),
        "blocks did not consume all data codewords"
    );

    let max_data_len = data_blocks.iter().map(|b| b.len()).max().unwrap_or(0);
    let mut result = Vec::with_capacity(data.len() + ec_blocks.len() * ecc_len);
    for i in 0..max_data_len {
        for block in &data_blocks {
            if i < block.len() {
                result.push(block[i]);
            }
        }
    }
    for i in 0..ecc_len {
        for block in &ec_blocks {
            result.push(block[i]);
        }
    }
    result
}
