//! Building data segments (mode indicator + character count + payload bits).

use crate::bit_buffer::Bitstream;
use crate::segment_mode::SegmentMode;
use crate::version::Version;

/// The set of characters encodable in alphanumeric mode, in indicator order.
pub(crate) static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// A character string (or ECI designator) to be encoded in a QR Code symbol, already
/// reduced to mode + character count + payload bits. Instances are immutable.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Segment {
    mode: SegmentMode,
    numchars: usize,
    data: Bitstream,
}

impl Segment {
    /// Returns a segment representing `data` in byte mode. Always succeeds.
    pub fn make_bytes(data: &[u8]) -> Self {
        let mut bb = Bitstream::new();
        for &b in data {
            bb.append_bits(u32::from(b), 8);
        }
        Segment::new(SegmentMode::Byte, data.len(), bb)
    }

    /// Returns a segment representing `text` (decimal digits only) in numeric mode.
    ///
    /// Panics if `text` contains a non-digit byte.
    pub fn make_numeric(text: &str) -> Self {
        let mut bb = Bitstream::new();
        let mut accum: u32 = 0;
        let mut count: u32 = 0;
        for b in text.bytes() {
            assert!(b.is_ascii_digit(), "string contains non-numeric characters");
            accum = accum * 10 + u32::from(b - b'0');
            count += 1;
            if count == 3 {
                bb.append_bits(accum, 10);
                accum = 0;
                count = 0;
            }
        }
        if count > 0 {
            // 1 or 2 digits remaining
            bb.append_bits(accum, (count as u8) * 3 + 1);
        }
        Segment::new(SegmentMode::Numeric, text.len(), bb)
    }

    /// Returns a segment representing `text` in alphanumeric mode.
    ///
    /// Allowed characters: `0`-`9`, `A`-`Z` (uppercase only), space, `$`, `%`, `*`,
    /// `+`, `-`, `.`, `/`, `:`. Panics on any other character.
    pub fn make_alphanumeric(text: &str) -> Self {
        let mut bb = Bitstream::new();
        let mut accum: u32 = 0;
        let mut count: u32 = 0;
        let mut numchars = 0usize;
        for c in text.chars() {
            let i = ALPHANUMERIC_CHARSET
                .find(c)
                .expect("string contains unencodable characters in alphanumeric mode");
            accum = accum * 45 + i as u32;
            count += 1;
            numchars += 1;
            if count == 2 {
                bb.append_bits(accum, 11);
                accum = 0;
                count = 0;
            }
        }
        if count > 0 {
            bb.append_bits(accum, 6);
        }
        Segment::new(SegmentMode::Alphanumeric, numchars, bb)
    }

    /// Returns the segment list best representing `text`: a single Numeric segment if
    /// every character is a digit, a single Alphanumeric segment if every character is
    /// in the 45-character alphanumeric alphabet, otherwise a single Byte segment over
    /// the UTF-8 encoding of `text`.
    ///
    /// This is a whole-payload mode choice rather than per-run mode switching; see
    /// [`crate::advanced::make_segments_optimally`] for the latter.
    pub fn make_segments(text: &str) -> Vec<Self> {
        if text.is_empty() {
            vec![]
        } else if Segment::is_numeric(text) {
            vec![Segment::make_numeric(text)]
        } else if Segment::is_alphanumeric(text) {
            vec![Segment::make_alphanumeric(text)]
        } else {
            vec![Segment::make_bytes(text.as_bytes())]
        }
    }

    /// Returns the single segment list best representing raw `data`: an Alphanumeric or
    /// Numeric segment if the bytes happen to be ASCII text in that alphabet, otherwise a
    /// Byte segment. Used by [`crate::encode`] so that e.g. a numeric string handed in as
    /// bytes still gets the denser encoding.
    pub fn make_segments_for_bytes(data: &[u8]) -> Vec<Self> {
        match std::str::from_utf8(data) {
            Ok(text) if Segment::is_numeric(text) => vec![Segment::make_numeric(text)],
            Ok(text) if Segment::is_alphanumeric(text) => vec![Segment::make_alphanumeric(text)],
            _ => vec![Segment::make_bytes(data)],
        }
    }

    /// Returns a segment carrying an Extended Channel Interpretation designator.
    pub fn make_eci(assignval: u32) -> Self {
        let mut bb = Bitstream::new();
        if assignval < (1 << 7) {
            bb.append_bits(assignval, 8);
        } else if assignval < (1 << 14) {
            bb.append_bits(0b10, 2);
            bb.append_bits(assignval, 14);
        } else if assignval < 1_000_000 {
            bb.append_bits(0b110, 3);
            bb.append_bits(assignval, 21);
        } else {
            panic!("ECI assignment value out of range");
        }
        Segment::new(SegmentMode::Eci, 0, bb)
    }

    /// Creates a segment from raw parts. The caller is responsible for `numchars`
    /// agreeing with `mode` and the length of `data`; this isn't checked.
    pub fn new(mode: SegmentMode, numchars: usize, data: Bitstream) -> Self {
        Self {
            mode,
            numchars,
            data,
        }
    }

    pub fn mode(&self) -> SegmentMode {
        self.mode
    }

    pub fn num_chars(&self) -> usize {
        self.numchars
    }

    pub fn data(&self) -> &Bitstream {
        &self.data
    }

    /// Returns the total bit length (mode indicator + character count + payload) that
    /// `segs` would occupy at `version`, or `None` if a segment's character count
    /// overflows its count field's width at that version.
    pub fn get_total_bits(segs: &[Self], version: Version) -> Option<usize> {
        let mut result: usize = 0;
        for seg in segs {
            let ccbits = seg.mode.num_char_count_bits(version);
            if let Some(limit) = 1usize.checked_shl(u32::from(ccbits)) {
                if seg.numchars >= limit {
                    return None;
                }
            }
            result = result.checked_add(4 + usize::from(ccbits))?;
            result = result.checked_add(seg.data.len())?;
        }
        Some(result)
    }

    /// Tests whether every character of `text` is an ASCII digit.
    pub fn is_numeric(text: &str) -> bool {
        text.bytes().all(|b| b.is_ascii_digit())
    }

    /// Tests whether every character of `text` is in the 45-character alphanumeric alphabet.
    pub fn is_alphanumeric(text: &str) -> bool {
        text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_packs_three_digits_per_ten_bits() {
        let seg = Segment::make_numeric("123456");
        assert_eq!(seg.num_chars(), 6);
        assert_eq!(seg.data().len(), 20);
    }

    #[test]
    fn numeric_remainder_of_one_digit_uses_four_bits() {
        let seg = Segment::make_numeric("7");
        assert_eq!(seg.data().len(), 4);
    }

    #[test]
    fn numeric_remainder_of_two_digits_uses_seven_bits() {
        let seg = Segment::make_numeric("12");
        assert_eq!(seg.data().len(), 7);
    }

    #[test]
    fn alphanumeric_packs_two_chars_per_eleven_bits() {
        let seg = Segment::make_alphanumeric("AB1");
        assert_eq!(seg.num_chars(), 3);
        assert_eq!(seg.data().len(), 11 + 6);
    }

    #[test]
    fn byte_mode_is_eight_bits_per_byte() {
        let seg = Segment::make_bytes(b"hi");
        assert_eq!(seg.data().len(), 16);
    }

    #[test]
    fn make_segments_for_bytes_upgrades_digit_strings() {
        let segs = Segment::make_segments_for_bytes(b"0123456789");
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].mode(), SegmentMode::Numeric);
    }

    #[test]
    fn make_segments_for_bytes_falls_back_to_byte_mode() {
        let segs = Segment::make_segments_for_bytes(&[0xFF, 0x00, 0x7F]);
        assert_eq!(segs[0].mode(), SegmentMode::Byte);
    }

    #[test]
    fn total_bits_rejects_overflowing_character_count() {
        // Byte mode at version 1 has an 8-bit count field: max 255 characters.
        let data = vec![0u8; 256];
        let segs = vec![Segment::make_bytes(&data)];
        assert!(Segment::get_total_bits(&segs, Version::new(1)).is_none());
        assert!(Segment::get_total_bits(&segs, Version::new(10)).is_some());
    }
}
