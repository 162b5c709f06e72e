//! Per-run optimal segmentation: splits a string into runs and picks the
//! cheapest mode for each run by dynamic programming, instead of committing
//! the whole payload to one mode. See [`make_segments_optimally`].

use crate::level::RecoveryLevel;
use crate::segment::{Segment, ALPHANUMERIC_CHARSET};
use crate::segment_mode::SegmentMode;
use crate::version::{self, Version};

const MODE_TYPES: [SegmentMode; 3] = [
    SegmentMode::Byte,
    SegmentMode::Alphanumeric,
    SegmentMode::Numeric,
];
const NUM_MODES: usize = MODE_TYPES.len();

/// Returns the segment list that minimizes total encoded bit length for `text` at some
/// version in `[min_version, max_version]` and `level`, or `None` if no version in the
/// range has enough capacity.
///
/// Unlike [`Segment::make_segments`], which commits the whole string to one mode, this
/// splits `text` into runs and lets each run use whichever of Numeric/Alphanumeric/Byte
/// is cheapest, re-optimizing at the version buckets B1/B2/B3 where the character-count
/// field width (and so the fixed cost of starting a new segment) changes.
pub fn make_segments_optimally(
    text: &str,
    level: RecoveryLevel,
    min_version: Version,
    max_version: Version,
) -> Option<Vec<Segment>> {
    if min_version > max_version {
        return None;
    }
    let code_points: Vec<char> = text.chars().collect();

    let mut segs = Vec::new();
    for v in min_version.value()..=max_version.value() {
        if v == min_version.value() || v == 10 || v == 27 {
            segs = make_segments_optimally_at_version(&code_points, Version::new(v));
        }
        let ver = Version::new(v);
        let capacity_bits = version::data_capacity_bits(ver, level);
        if let Some(used_bits) = Segment::get_total_bits(&segs, ver) {
            if used_bits <= capacity_bits {
                return Some(segs);
            }
        }
    }
    None
}

fn make_segments_optimally_at_version(code_points: &[char], version: Version) -> Vec<Segment> {
    let char_modes = compute_character_modes(code_points, version);
    split_into_segments(code_points, &char_modes)
}

/// Returns the optimal mode for every code point, found by dynamic programming over
/// "end the string here in mode X" costs, measured in 1/6 bits so the 5.5- and
/// 3.33-bit-per-character costs of Alphanumeric/Numeric stay exact integers.
fn compute_character_modes(code_points: &[char], version: Version) -> Vec<SegmentMode> {
    let mut head_costs = [0usize; NUM_MODES];
    for i in 0..NUM_MODES {
        head_costs[i] = (4 + usize::from(MODE_TYPES[i].num_char_count_bits(version))) * 6;
    }

    // char_modes[i][j]: the mode that should precede MODE_TYPES[j] in the optimal
    // encoding of the prefix ending at code point i, if the prefix ends in MODE_TYPES[j].
    let mut char_modes = vec![[None::<SegmentMode>; NUM_MODES]; code_points.len()];
    let mut prev_costs = head_costs;

    for (i, &c) in code_points.iter().enumerate() {
        let mut cur_costs = [0usize; NUM_MODES];

        // Byte mode can always extend.
        cur_costs[0] = prev_costs[0] + c.len_utf8() * 8 * 6;
        char_modes[i][0] = Some(MODE_TYPES[0]);

        if ALPHANUMERIC_CHARSET.contains(c) {
            cur_costs[1] = prev_costs[1] + 33; // 5.5 bits/char
            char_modes[i][1] = Some(MODE_TYPES[1]);
        }
        if c.is_ascii_digit() {
            cur_costs[2] = prev_costs[2] + 20; // 3.33 bits/char
            char_modes[i][2] = Some(MODE_TYPES[2]);
        }

        // Consider starting a new segment (mode switch) ending at this code point.
        for j in 0..NUM_MODES {
            for k in 0..NUM_MODES {
                let new_cost = (cur_costs[k] + 5) / 6 * 6 + head_costs[j];
                if char_modes[i][k].is_some()
                    && (char_modes[i][j].is_none() || new_cost < cur_costs[j])
                {
                    cur_costs[j] = new_cost;
                    char_modes[i][j] = Some(MODE_TYPES[k]);
                }
            }
        }

        prev_costs = cur_costs;
    }

    // Trace back from the cheapest final mode.
    let mut cur_mode = MODE_TYPES[0];
    let mut min_cost = prev_costs[0];
    for i in 1..NUM_MODES {
        if prev_costs[i] < min_cost {
            min_cost = prev_costs[i];
            cur_mode = MODE_TYPES[i];
        }
    }

    let mut result = vec![SegmentMode::Byte; char_modes.len()];
    for i in (0..char_modes.len()).rev() {
        let j = MODE_TYPES.iter().position(|&m| m == cur_mode).unwrap();
        cur_mode = char_modes[i][j].unwrap();
        result[i] = cur_mode;
    }
    result
}

/// Groups consecutive code points sharing a mode into one segment each.
fn split_into_segments(code_points: &[char], char_modes: &[SegmentMode]) -> Vec<Segment> {
    let mut result = Vec::new();
    let mut cur_mode = char_modes[0];
    let mut start = 0;
    let mut i = 0;
    loop {
        i += 1;
        if i < code_points.len() && char_modes[i] == cur_mode {
            continue;
        }
        let run: String = code_points[start..i].iter().collect();
        result.push(match cur_mode {
            SegmentMode::Byte => Segment::make_bytes(run.as_bytes()),
            SegmentMode::Numeric => Segment::make_numeric(&run),
            SegmentMode::Alphanumeric => Segment::make_alphanumeric(&run),
            SegmentMode::Eci => unreachable!("ECI is never produced by this DP"),
        });
        if i >= code_points.len() {
            return result;
        }
        cur_mode = char_modes[i];
        start = i;
    }
}
