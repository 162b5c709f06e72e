//! The four-bit mode indicator and its version-dependent character-count width.

use crate::version::Version;

/// Describes how a segment's data bits are to be interpreted by a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    Numeric,
    Alphanumeric,
    Byte,
    /// Extended Channel Interpretation designator. Carries no character-count field.
    Eci,
}

impl SegmentMode {
    /// Returns the 4-bit mode indicator.
    pub(crate) fn mode_bits(self) -> u32 {
        use SegmentMode::*;
        match self {
            Numeric => 0x1,
            Alphanumeric => 0x2,
            Byte => 0x4,
            Eci => 0x7,
        }
    }

    /// Returns the bit width of the character-count field for this mode at `ver`,
    /// per the version bucket B1=1..9, B2=10..26, B3=27..40.
    pub fn num_char_count_bits(self, ver: Version) -> u8 {
        use SegmentMode::*;
        let buckets: [u8; 3] = match self {
            Numeric => [10, 12, 14],
            Alphanumeric => [9, 11, 13],
            Byte => [8, 16, 16],
            Eci => [0, 0, 0],
        };
        match ver.value() {
            1..=9 => buckets[0],
            10..=26 => buckets[1],
            27..=40 => buckets[2],
            v => panic!("version number out of range: {v}"),
        }
    }
}
