/*
 * QR Code generator library (Rust)
 *
 * Copyright (c) Project Nayuki. (MIT License)
 * https://www.nayuki.io/page/qr-code-generator-library
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of
 * this software and associated documentation files (the "Software"), to deal in
 * the Software without restriction, including without limitation the rights to
 * use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
 * the Software, and to permit persons to whom the Software is furnished to do so,
 * subject to the following conditions:
 * - The above copyright notice and this permission notice shall be included in
 *   all copies or substantial portions of the Software.
 * - The Software is provided "as is", without warranty of any kind, express or
 *   implied, including but not limited to the warranties of merchantability,
 *   fitness for a particular purpose and noninfringement. In no event shall the
 *   authors or copyright holders be liable for any claim, damages or other
 *   liability, whether in an action of contract, tort or otherwise, arising from,
 *   out of or in connection with the Software or the use or other dealings in the
 *   Software.
 */

//! A QR Code (ISO/IEC 18004:2006, Model 2) symbol encoder.
//!
//! Three layers, from easiest to most flexible:
//!
//! - [`encode`]: bytes (UTF-8 text or raw binary) plus a [`RecoveryLevel`] in, an
//!   [`EncodedSymbol`] out. Picks the smallest version and upgrades the recovery level
//!   for free where doing so doesn't cost a bigger symbol.
//! - [`encode_forced_version`]: same, but pinned to one version instead of searching.
//! - [`encode_segments_advanced`]: a caller-built [`Segment`] list (see [`segmentation`]
//!   for an optimal per-run mode-switching segmenter) encoded over a version range with
//!   an optional forced [`Mask`].
//!
//! ```
//! use qr_core::{encode, RecoveryLevel};
//!
//! let symbol = encode(b"Hello, world!", RecoveryLevel::Medium).unwrap();
//! assert!(symbol.bitmap().len() >= 21 + 8); // side length includes the quiet zone
//! ```

mod advanced;
mod bit_buffer;
mod block_formatter;
mod error;
mod level;
mod mask;
mod reed_solomon;
mod segment;
mod segment_mode;
mod symbol;
mod version;

pub use bit_buffer::Bitstream;
pub use error::QrError;
pub use level::RecoveryLevel;
pub use mask::Mask;
pub use segment::Segment;
pub use segment_mode::SegmentMode;
pub use version::Version;

pub mod segmentation {
    //! Optimal per-run mode-switching segmentation, as an alternative to
    //! [`Segment::make_segments`](crate::Segment::make_segments)'s whole-payload choice.
    pub use crate::advanced::make_segments_optimally;
}

use symbol::Symbol;

/// A built QR Code symbol: the module grid plus the geometry callers need to render or
/// overlay it (a logo in the middle, a highlight ring around a finder pattern, and so on).
#[derive(Debug, Clone)]
pub struct EncodedSymbol {
    version: Version,
    level: RecoveryLevel,
    mask: Mask,
    bitmap: Vec<Vec<bool>>,
    finder_bitmap: Vec<Vec<bool>>,
    last_alignment_bitmap: Vec<Vec<bool>>,
    finder_points: [(i32, i32); 3],
    border_size: i32,
}

impl EncodedSymbol {
    fn from_symbol(sym: &Symbol, level: RecoveryLevel) -> Self {
        let (bitmap, finder_bitmap, last_alignment_bitmap) = sym.render_bitmaps();
        EncodedSymbol {
            version: sym.version(),
            level,
            mask: sym.mask(),
            bitmap,
            finder_bitmap,
            last_alignment_bitmap,
            finder_points: sym.finder_points(),
            border_size: sym.bordered_size(),
        }
    }

    /// The version (size class, `1..=40`) this symbol was built at.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The recovery level actually used. May be higher than the level [`encode`] or
    /// [`encode_segments_advanced`] was asked for, if `boost_level` upgraded it for free.
    pub fn level(&self) -> RecoveryLevel {
        self.level
    }

    /// The mask pattern applied to this symbol's data modules.
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// The full module grid, quiet zone included: `true` is a dark module. Square, with
    /// side length [`EncodedSymbol::border_size`].
    pub fn bitmap(&self) -> &[Vec<bool>] {
        &self.bitmap
    }

    /// A same-size grid, `true` over the 7x7 core of each of the three finder patterns
    /// (the concentric squares at the top-left, top-right and bottom-left corners).
    /// Useful for a renderer that wants to style those regions apart from ordinary data
    /// modules, e.g. to draw them as rounded squares.
    pub fn finder_pattern_bitmap(&self) -> &[Vec<bool>] {
        &self.finder_bitmap
    }

    /// A same-size grid, `true` over the 5x5 alignment pattern closest to the bottom-right
    /// corner. All false at version 1, which has no alignment patterns.
    pub fn last_alignment_pattern_bitmap(&self) -> &[Vec<bool>] {
        &self.last_alignment_bitmap
    }

    /// Center coordinates (in this bitmap's own coordinate space, quiet zone included) of
    /// the three finder patterns, as `(top_left, top_right, bottom_left)`.
    pub fn finder_points(&self) -> ((i32, i32), (i32, i32), (i32, i32)) {
        (
            self.finder_points[0],
            self.finder_points[1],
            self.finder_points[2],
        )
    }

    /// The side length of [`EncodedSymbol::bitmap`], including the quiet zone on all sides.
    pub fn border_size(&self) -> i32 {
        self.border_size
    }
}

/// Encodes `content` (UTF-8 text is preferred over raw bytes when it fits in Numeric or
/// Alphanumeric mode, for a denser symbol) at `level` or higher, using the smallest
/// version that fits.
///
/// Errors with [`QrError::ContentTooLong`] if `content` doesn't fit any version at `level`.
pub fn encode(content: &[u8], level: RecoveryLevel) -> Result<EncodedSymbol, QrError> {
    let segs = Segment::make_segments_for_bytes(content);
    encode_segments_advanced(&segs, level, Version::MIN, Version::MAX, None, true)
}

/// Encodes `content` at exactly `version` (no automatic version search), at `level` or
/// higher if `boost_level` allows a free upgrade.
///
/// Errors with [`QrError::InvalidVersion`] if `version` is outside `1..=40`, or
/// [`QrError::VersionCapacityExceeded`] if the encoded data doesn't fit that version.
pub fn encode_forced_version(
    content: &[u8],
    version: u8,
    level: RecoveryLevel,
    boost_level: bool,
) -> Result<EncodedSymbol, QrError> {
    let ver = Version::try_new(version).ok_or(QrError::InvalidVersion(version))?;
    let segs = Segment::make_segments_for_bytes(content);
    match encode_segments_advanced(&segs, level, ver, ver, None, boost_level) {
        Ok(sym) => Ok(sym),
        Err(QrError::ContentTooLong(used, capacity)) => {
            Err(QrError::VersionCapacityExceeded(used, capacity))
        }
        Err(e) => Err(e),
    }
}

/// Encodes a caller-built segment list (see [`segmentation::make_segments_optimally`] for
/// a DP-based alternative to [`Segment::make_segments`]'s whole-payload mode choice) over
/// `min_version..=max_version` at `level` or higher, with an optional forced `mask`.
///
/// If `boost_level` is true, the recovery level is raised to the strongest level that
/// still fits the chosen version's capacity, without affecting which version is chosen.
///
/// Errors with [`QrError::ContentTooLong`] if no version in range fits `segs` at `level`.
pub fn encode_segments_advanced(
    segs: &[Segment],
    level: RecoveryLevel,
    min_version: Version,
    max_version: Version,
    mask: Option<Mask>,
    boost_level: bool,
) -> Result<EncodedSymbol, QrError> {
    assert!(
        min_version <= max_version,
        "min_version must not exceed max_version"
    );

    let mut version = min_version;
    let data_used_bits;
    loop {
        let capacity_bits = version::data_capacity_bits(version, level);
        if let Some(n) = Segment::get_total_bits(segs, version) {
            if n <= capacity_bits {
                data_used_bits = n;
                break;
            }
        }
        if version.value() >= max_version.value() {
            let widest_capacity = version::data_capacity_bits(max_version, level);
            let n = Segment::get_total_bits(segs, max_version).unwrap_or(widest_capacity + 1);
            return Err(QrError::ContentTooLong(n, widest_capacity));
        }
        version = Version::new(version.value() + 1);
    }

    let mut level = level;
    if boost_level {
        for &candidate in &RecoveryLevel::ASCENDING {
            if candidate > level
                && data_used_bits <= version::data_capacity_bits(version, candidate)
            {
                level = candidate;
            }
        }
    }

    let codewords = block_formatter::format_codewords(segs, version, level);
    let sym = Symbol::build(version, level, &codewords, mask);
    Ok(EncodedSymbol::from_symbol(&sym, level))
}

/// Encodes a caller-built segment list at exactly `version`/`level` with a single forced
/// `mask`, skipping both the version search and the eight-mask trial-and-score loop that
/// [`encode_segments_advanced`] runs internally.
///
/// This is the primitive a caller who wants masks evaluated in parallel builds on: call it
/// once per mask (on whatever thread pool suits the caller) and pick the lowest-penalty
/// result itself, rather than letting this crate's own sequential trial loop do it.
///
/// Errors with [`QrError::VersionCapacityExceeded`] if the encoded data doesn't fit
/// `version` at `level`.
pub fn encode_codewords_with_mask(
    segs: &[Segment],
    version: Version,
    level: RecoveryLevel,
    mask: Mask,
) -> Result<EncodedSymbol, QrError> {
    let capacity_bits = version::data_capacity_bits(version, level);
    let data_used_bits = Segment::get_total_bits(segs, version).unwrap_or(capacity_bits + 1);
    if data_used_bits > capacity_bits {
        return Err(QrError::VersionCapacityExceeded(
            data_used_bits,
            capacity_bits,
        ));
    }

    let codewords = block_formatter::format_codewords(segs, version, level);
    let sym = Symbol::build(version, level, &codewords, Some(mask));
    Ok(EncodedSymbol::from_symbol(&sym, level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_round_trips_a_plain_string_at_version_1() {
        let sym = encode(b"HELLO WORLD", RecoveryLevel::Low).unwrap();
        assert_eq!(sym.version().value(), 1);
        assert_eq!(sym.bitmap().len() as i32, sym.border_size());
    }

    #[test]
    fn codewords_with_mask_matches_the_mask_the_trial_loop_would_have_picked() {
        let segs = Segment::make_segments_for_bytes(b"HELLO WORLD");
        let version = Version::new(1);
        let level = RecoveryLevel::Low;
        let auto = encode_segments_advanced(&segs, level, version, version, None, false).unwrap();

        let forced = encode_codewords_with_mask(&segs, version, level, auto.mask()).unwrap();
        assert_eq!(forced.bitmap(), auto.bitmap());
    }

    #[test]
    fn codewords_with_mask_reports_capacity_exceeded_for_oversized_content() {
        let content = "A".repeat(200);
        let segs = Segment::make_segments_for_bytes(content.as_bytes());
        let err =
            encode_codewords_with_mask(&segs, Version::new(1), RecoveryLevel::High, Mask::new(0))
                .unwrap_err();
        assert!(matches!(err, QrError::VersionCapacityExceeded(_, _)));
    }

    #[test]
    fn boost_level_upgrades_when_free() {
        // A short string at Low almost always has room to spare at the chosen version;
        // boosting should never choose a level weaker than requested.
        let sym = encode(b"1", RecoveryLevel::Low).unwrap();
        assert!(sym.level() >= RecoveryLevel::Low);
    }

    #[test]
    fn forced_version_too_small_reports_version_capacity_exceeded() {
        let content = "A".repeat(200);
        let err =
            encode_forced_version(content.as_bytes(), 1, RecoveryLevel::High, false).unwrap_err();
        assert!(matches!(err, QrError::VersionCapacityExceeded(_, _)));
    }

    #[test]
    fn invalid_forced_version_is_rejected() {
        let err = encode_forced_version(b"x", 41, RecoveryLevel::Low, true).unwrap_err();
        assert_eq!(err, QrError::InvalidVersion(41));
    }

    #[test]
    fn content_too_long_for_any_version_is_reported() {
        let content = vec![b'A'; 10_000];
        let err = encode(&content, RecoveryLevel::High).unwrap_err();
        assert!(matches!(err, QrError::ContentTooLong(_, _)));
    }

    #[test]
    fn finder_points_land_on_dark_modules_at_their_own_centers() {
        let sym = encode(b"center check", RecoveryLevel::Medium).unwrap();
        let (tl, tr, bl) = sym.finder_points();
        for (x, y) in [tl, tr, bl] {
            assert!(
                sym.bitmap()[y as usize][x as usize],
                "finder center should be dark"
            );
        }
    }

    /// Encoding the same content at the same level twice must produce byte-for-byte
    /// identical bitmaps: nothing in the pipeline (mask search, level boosting, version
    /// search) may depend on anything but its own inputs.
    #[test]
    fn encoding_is_deterministic() {
        use proptest::{arbitrary::any, prop_assert_eq, proptest};

        let arb_input = (proptest::collection::vec(any::<u8>(), 0..80), 0usize..4);
        let config = proptest::test_runner::Config::with_cases(20);
        proptest!(config, |((data, level_ord) in arb_input)| {
            let level = RecoveryLevel::ASCENDING[level_ord];
            let a = encode(&data, level).unwrap();
            let b = encode(&data, level).unwrap();
            prop_assert_eq!(a.version(), b.version());
            prop_assert_eq!(a.level(), b.level());
            prop_assert_eq!(a.mask(), b.mask());
            prop_assert_eq!(a.bitmap().to_vec(), b.bitmap().to_vec());
        });
    }
}
