//! Per-version static tables: error-correction block layout, alignment-pattern
//! coordinates, raw module counts and the remainder bits they imply.

use crate::level::RecoveryLevel;

/// A QR Code version number, in the range `[1, 40]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version(u8);

impl Version {
    /// The smallest version supported by the QR Code Model 2 standard.
    pub const MIN: Version = Version(1);
    /// The largest version supported by the QR Code Model 2 standard.
    pub const MAX: Version = Version(40);

    /// Creates a version from the given number.
    ///
    /// Panics if the number is outside `[1, 40]`; use [`Version::try_new`] to
    /// get a `Result` instead.
    pub fn new(ver: u8) -> Self {
        Self::try_new(ver).unwrap_or_else(|| panic!("version number out of range: {ver}"))
    }

    /// Creates a version from the given number, returning `None` if it is outside `[1, 40]`.
    pub fn try_new(ver: u8) -> Option<Self> {
        if (Self::MIN.value()..=Self::MAX.value()).contains(&ver) {
            Some(Self(ver))
        } else {
            None
        }
    }

    /// Returns the version number, in `[1, 40]`.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Returns the side length of the symbol at this version, excluding the quiet zone:
    /// `17 + 4 * version`.
    pub fn modules_per_side(self) -> i32 {
        17 + 4 * i32::from(self.0)
    }
}

/// One homogeneous group of error-correction blocks within a version/level: `count`
/// blocks, each with `total_codewords` codewords of which `data_codewords` carry data
/// (the rest are Reed-Solomon parity).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGroup {
    pub count: usize,
    pub total_codewords: usize,
    pub data_codewords: usize,
}

/// Returns the list of block groups (in declaration order) for `version` at `level`.
///
/// ISO/IEC 18004 versions split each level's blocks into at most two groups: a run of
/// "short" blocks and a run of "long" blocks one codeword bigger, so every block has the
/// same EC length but the short ones have one fewer data codeword. This is derived here
/// from the raw module count, EC-per-block table and block-count table, which is
/// arithmetically equivalent to hard-coding the per-version group table from the standard.
pub fn block_groups(ver: Version, level: RecoveryLevel) -> Vec<BlockGroup> {
    let num_blocks = table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, level);
    let ecc_per_block = table_get(&ECC_CODEWORDS_PER_BLOCK, ver, level);
    let raw_codewords = num_raw_data_modules(ver) / 8;
    let num_short_blocks = num_blocks - raw_codewords % num_blocks;
    let short_block_len = raw_codewords / num_blocks;

    let mut groups = Vec::with_capacity(2);
    if num_short_blocks > 0 {
        groups.push(BlockGroup {
            count: num_short_blocks,
            total_codewords: short_block_len,
            data_codewords: short_block_len - ecc_per_block,
        });
    }
    if num_blocks > num_short_blocks {
        groups.push(BlockGroup {
            count: num_blocks - num_short_blocks,
            total_codewords: short_block_len + 1,
            data_codewords: short_block_len + 1 - ecc_per_block,
        });
    }
    groups
}

/// Returns the number of error-correction blocks a symbol of this version/level is split into.
pub fn num_blocks(ver: Version, level: RecoveryLevel) -> usize {
    table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, level)
}

/// Returns the number of Reed-Solomon parity codewords appended to every block at this
/// version/level.
pub fn ecc_codewords_per_block(ver: Version, level: RecoveryLevel) -> usize {
    table_get(&ECC_CODEWORDS_PER_BLOCK, ver, level)
}

/// Returns the positions of the alignment pattern centers for `ver`, ascending, used on
/// both axes. Empty for version 1. This could equally be a 40-entry lookup table; it is
/// computed here because the formula is short and exact.
pub fn alignment_pattern_positions(ver: Version) -> Vec<i32> {
    let ver = ver.value();
    if ver == 1 {
        return vec![];
    }
    let num_align = i32::from(ver) / 7 + 2;
    let step = if ver != 32 {
        // ceil((size - 13) / (2*numAlign - 2)) * 2
        (i32::from(ver) * 4 + num_align * 2 + 1) / (2 * num_align - 2) * 2
    } else {
        26
    };
    let mut result = vec![6i32];
    let mut pos = i32::from(ver) * 4 + 10;
    for _ in 0..num_align - 1 {
        result.insert(1, pos);
        pos -= step;
    }
    result
}

/// Returns the number of data-carrying modules available in a symbol of this version,
/// after every function pattern and (for version >= 7) the version-info blocks are
/// excluded. Not necessarily a multiple of 8; the remainder is the remainder-bit count.
pub fn num_raw_data_modules(ver: Version) -> usize {
    let v = usize::from(ver.value());
    let mut result = (16 * v + 128) * v + 64;
    if v >= 2 {
        let num_align = v / 7 + 2;
        result -= (25 * num_align - 10) * num_align - 55;
        if v >= 7 {
            result -= 18 * 2; // version information
        }
    }
    result
}

/// Returns the number of 8-bit data (non-EC) codewords a symbol of this version/level
/// can carry, with remainder bits discarded.
pub fn num_data_codewords(ver: Version, level: RecoveryLevel) -> usize {
    num_raw_data_modules(ver) / 8 - ecc_codewords_per_block(ver, level) * num_blocks(ver, level)
}

/// Returns the data bit capacity (`num_data_codewords * 8`) of this version/level.
pub fn data_capacity_bits(ver: Version, level: RecoveryLevel) -> usize {
    num_data_codewords(ver, level) * 8
}

/// Returns the number of all-zero bits appended after the interleaved codewords to pad
/// out to a whole number of modules: `num_raw_data_modules(ver) % 8`.
pub fn num_remainder_bits(ver: Version) -> usize {
    num_raw_data_modules(ver) % 8
}

fn table_get(table: &'static [[i16; 41]; 4], ver: Version, level: RecoveryLevel) -> usize {
    table[level.ordinal()][usize::from(ver.value())] as usize
}

static ECC_CODEWORDS_PER_BLOCK: [[i16; 41]; 4] = [
    // Version:
    //0,  1,  2,  3,  4,  5,  6,  7,  8,  9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28,
        30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30,
        30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

static NUM_ERROR_CORRECTION_BLOCKS: [[i16; 41]; 4] = [
    // Version:
    //0, 1, 2, 3, 4, 5, 6, 7, 8, 9,10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27,
        29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32,
        35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_monotonic_in_version() {
        for level in RecoveryLevel::ASCENDING {
            let mut prev = 0;
            for v in Version::MIN.value()..=Version::MAX.value() {
                let bits = data_capacity_bits(Version::new(v), level);
                assert!(
                    bits > prev,
                    "version {v} did not grow capacity at {level:?}"
                );
                prev = bits;
            }
        }
    }

    #[test]
    fn block_groups_account_for_every_raw_codeword() {
        for level in RecoveryLevel::ASCENDING {
            for v in Version::MIN.value()..=Version::MAX.value() {
                let ver = Version::new(v);
                let groups = block_groups(ver, level);
                let total_blocks: usize = groups.iter().map(|g| g.count).sum();
                assert_eq!(total_blocks, num_blocks(ver, level));
                let total_codewords: usize =
                    groups.iter().map(|g| g.count * g.total_codewords).sum();
                assert_eq!(total_codewords, num_raw_data_modules(ver) / 8);
                let total_data: usize = groups.iter().map(|g| g.count * g.data_codewords).sum();
                assert_eq!(total_data, num_data_codewords(ver, level));
            }
        }
    }

    #[test]
    fn alignment_pattern_positions_empty_only_for_version_1() {
        assert!(alignment_pattern_positions(Version::new(1)).is_empty());
        for v in 2..=40 {
            assert!(!alignment_pattern_positions(Version::new(v)).is_empty());
        }
    }

    #[test]
    fn remainder_bits_match_known_values() {
        // Spot-check a few versions against the well-known ISO remainder-bit sequence.
        assert_eq!(num_remainder_bits(Version::new(1)), 0);
        assert_eq!(num_remainder_bits(Version::new(2)), 7);
        assert_eq!(num_remainder_bits(Version::new(7)), 0);
        assert_eq!(num_remainder_bits(Version::new(14)), 3);
    }

    proptest::proptest! {
        /// Generalizes `capacity_is_monotonic_in_version`: for any adjacent version pair
        /// and any level, capacity must strictly increase going to the higher version.
        #[test]
        fn capacity_is_monotonic_for_arbitrary_adjacent_versions(
            v in 1u8..40,
            level_ord in 0usize..4,
        ) {
            let level = RecoveryLevel::ASCENDING[level_ord];
            let lo = data_capacity_bits(Version::new(v), level);
            let hi = data_capacity_bits(Version::new(v + 1), level);
            proptest::prop_assert!(hi > lo, "version {} did not grow capacity over {} at {:?}", v + 1, v, level);
        }
    }
}
