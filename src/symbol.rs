//! Module-grid construction: function patterns, data placement, masking and
//! the penalty function used to pick the best mask.

use crate::bit_buffer::Bitstream;
use crate::level::RecoveryLevel;
use crate::mask::Mask;
use crate::version::{self, Version};

const PENALTY_N1: i32 = 3;
const PENALTY_N2: i32 = 3;
const PENALTY_N3: i32 = 40;
const PENALTY_N4: i32 = 10;

/// The quiet zone width, in modules, added on all four sides of every emitted symbol.
pub const QUIET_ZONE: i32 = 4;

/// A built QR Code module grid, without the quiet zone: coordinates `(x, y)` run
/// `0..modules_per_side`. [`Symbol::into_encoded`] adds the quiet zone when handing the
/// result to callers.
pub(crate) struct Symbol {
    version: Version,
    size: i32,
    level: RecoveryLevel,
    mask: Mask,
    modules: Vec<bool>,
    is_function: Vec<bool>,
    /// Set true by `draw_codewords` for every module it actually wrote a data/EC/remainder
    /// bit into. Independent of `is_function`, so `num_empty_modules` can verify the
    /// placement walk actually reached every non-function coordinate exactly once,
    /// instead of trusting the arithmetic that should imply it.
    placed: Vec<bool>,
}

impl Symbol {
    /// Builds the unmasked symbol (function patterns + codewords placed) for `version`/`level`.
    fn new_unmasked(version: Version, level: RecoveryLevel, codewords: &Bitstream) -> Self {
        let size = version.modules_per_side();
        let mut sym = Symbol {
            version,
            size,
            level,
            mask: Mask::new(0), // overwritten once a mask is chosen
            modules: vec![false; (size * size) as usize],
            is_function: vec![false; (size * size) as usize],
            placed: vec![false; (size * size) as usize],
        };
        sym.draw_function_patterns();
        sym.draw_codewords(codewords);
        assert_eq!(sym.num_empty_modules(), 0);
        sym
    }

    /// Builds the symbol for `version`/`level`/`codewords`, either with the given mask or,
    /// if `None`, by trying all eight and keeping the lowest-penalty one (ties broken by
    /// lowest mask index).
    pub(crate) fn build(
        version: Version,
        level: RecoveryLevel,
        codewords: &Bitstream,
        forced_mask: Option<Mask>,
    ) -> Self {
        let mut sym = Symbol::new_unmasked(version, level, codewords);
        let chosen = match forced_mask {
            Some(m) => m,
            None => {
                let mut best_mask = Mask::new(0);
                let mut best_penalty = i32::MAX;
                for m in Mask::ALL {
                    sym.draw_format_bits(m);
                    sym.apply_mask(m);
                    let penalty = sym.penalty_score();
                    if penalty < best_penalty {
                        best_penalty = penalty;
                        best_mask = m;
                    }
                    sym.apply_mask(m); // undo (XOR is its own inverse)
                }
                best_mask
            }
        };
        sym.draw_format_bits(chosen);
        sym.apply_mask(chosen);
        sym.mask = chosen;
        sym
    }

    pub(crate) fn version(&self) -> Version {
        self.version
    }

    pub(crate) fn mask(&self) -> Mask {
        self.mask
    }

    /// Returns the color of the module at `(x, y)`, which must be in bounds.
    fn module(&self, x: i32, y: i32) -> bool {
        self.modules[(y * self.size + x) as usize]
    }

    fn module_mut(&mut self, x: i32, y: i32) -> &mut bool {
        &mut self.modules[(y * self.size + x) as usize]
    }

    fn is_function(&self, x: i32, y: i32) -> bool {
        self.is_function[(y * self.size + x) as usize]
    }

    fn set_function_module(&mut self, x: i32, y: i32, is_dark: bool) {
        *self.module_mut(x, y) = is_dark;
        self.is_function[(y * self.size + x) as usize] = true;
    }

    /*---- Function patterns ----*/

    fn draw_function_patterns(&mut self) {
        let size = self.size;
        for i in 0..size {
            self.set_function_module(6, i, i % 2 == 0);
            self.set_function_module(i, 6, i % 2 == 0);
        }

        self.draw_finder_pattern(3, 3);
        self.draw_finder_pattern(size - 4, 3);
        self.draw_finder_pattern(3, size - 4);

        let positions = version::alignment_pattern_positions(self.version);
        let n = positions.len();
        for i in 0..n {
            for j in 0..n {
                let is_finder_corner =
                    (i == 0 && j == 0) || (i == 0 && j == n - 1) || (i == n - 1 && j == 0);
                if !is_finder_corner {
                    self.draw_alignment_pattern(positions[i], positions[j]);
                }
            }
        }

        self.draw_format_bits(Mask::new(0)); // placeholder, overwritten after masking
        self.draw_version_info();
    }

    /// Draws a 9x9 finder pattern (including its 1-module separator ring) centered at `(x, y)`.
    fn draw_finder_pattern(&mut self, x: i32, y: i32) {
        for i in -4..5 {
            for j in -4..5 {
                let xx = x + j;
                let yy = y + i;
                if 0 <= xx && xx < self.size && 0 <= yy && yy < self.size {
                    let dist = i.abs().max(j.abs());
                    self.set_function_module(xx, yy, dist != 2 && dist != 4);
                }
            }
        }
    }

    /// Draws a 5x5 alignment pattern centered at `(x, y)`.
    fn draw_alignment_pattern(&mut self, x: i32, y: i32) {
        for i in -2..3 {
            for j in -2..3 {
                self.set_function_module(x + j, y + i, i.abs().max(j.abs()) != 1);
            }
        }
    }

    /// Draws both copies of the 15-bit format information field for `mask`.
    fn draw_format_bits(&mut self, mask: Mask) {
        let size = self.size;
        let mut data: u32 = self.level.format_bits() << 3 | u32::from(mask.value());
        let mut rem = data;
        for _ in 0..10 {
            rem = (rem << 1) ^ ((rem >> 9) * 0x537);
        }
        data = data << 10 | rem;
        data ^= 0x5412;
        assert_eq!(data >> 15, 0);

        for i in 0..6 {
            self.set_function_module(8, i, (data >> i) & 1 != 0);
        }
        self.set_function_module(8, 7, (data >> 6) & 1 != 0);
        self.set_function_module(8, 8, (data >> 7) & 1 != 0);
        self.set_function_module(7, 8, (data >> 8) & 1 != 0);
        for i in 9..15 {
            self.set_function_module(14 - i, 8, (data >> i) & 1 != 0);
        }

        for i in 0..8 {
            self.set_function_module(size - 1 - i, 8, (data >> i) & 1 != 0);
        }
        for i in 8..15 {
            self.set_function_module(8, size - 15 + i, (data >> i) & 1 != 0);
        }
        self.set_function_module(8, size - 8, true);
    }

    /// Draws both copies of the 18-bit version information field, a no-op below version 7.
    fn draw_version_info(&mut self) {
        if self.version.value() < 7 {
            return;
        }
        let mut rem = u32::from(self.version.value());
        for _ in 0..12 {
            rem = (rem << 1) ^ ((rem >> 11) * 0x1F25);
        }
        let data = u32::from(self.version.value()) << 12 | rem;
        assert_eq!(data >> 18, 0);

        for i in 0..18 {
            let bit = (data >> i) & 1 != 0;
            let a = self.size - 11 + i % 3;
            let b = i / 3;
            self.set_function_module(a, b, bit);
            self.set_function_module(b, a, bit);
        }
    }

    /*---- Codeword placement ----*/

    /// Zig-zags `codewords` (already interleaved, with remainder bits appended) onto
    /// every data-carrying module, skipping the vertical timing column and any module
    /// already claimed by a function pattern.
    fn draw_codewords(&mut self, codewords: &Bitstream) {
        assert_eq!(codewords.len(), version::num_raw_data_modules(self.version));
        let mut i: usize = 0;
        let mut right = self.size - 1;
        while right >= 1 {
            if right == 6 {
                right = 5; // skip the vertical timing column
            }
            for vert in 0..self.size {
                for j in 0..2 {
                    let x = right - j;
                    let upward = (right + 1) & 2 == 0;
                    let y = if upward { self.size - 1 - vert } else { vert };
                    if !self.is_function(x, y) && i < codewords.len() {
                        *self.module_mut(x, y) = codewords.0[i];
                        self.placed[(y * self.size + x) as usize] = true;
                        i += 1;
                    }
                }
            }
            right -= 2;
        }
        assert_eq!(
            i,
            codewords.len(),
            "internal invariant: data placement left unused bits"
        );
    }

    /// Returns the count of grid coordinates that are neither a function module nor were
    /// reached by the zig-zag placement walk. Always zero for a correctly built symbol.
    pub(crate) fn num_empty_modules(&self) -> usize {
        self.is_function
            .iter()
            .zip(self.placed.iter())
            .filter(|(&f, &p)| !f && !p)
            .count()
    }

    /// XORs every non-function module with mask `m`'s predicate. Calling this twice with
    /// the same mask is a no-op (XOR is its own inverse), which is how [`Symbol::build`]
    /// evaluates all eight masks without rebuilding the grid each time.
    fn apply_mask(&mut self, m: Mask) {
        for y in 0..self.size {
            for x in 0..self.size {
                if !self.is_function(x, y) {
                    *self.module_mut(x, y) ^= m.invert_at(x, y);
                }
            }
        }
    }

    fn penalty_score(&self) -> i32 {
        let mut result = 0;
        let size = self.size;

        for y in 0..size {
            let mut color = false;
            let mut run = 0;
            for x in 0..size {
                if x == 0 || self.module(x, y) != color {
                    color = self.module(x, y);
                    run = 1;
                } else {
                    run += 1;
                    if run == 5 {
                        result += PENALTY_N1;
                    } else if run > 5 {
                        result += 1;
                    }
                }
            }
        }
        for x in 0..size {
            let mut color = false;
            let mut run = 0;
            for y in 0..size {
                if y == 0 || self.module(x, y) != color {
                    color = self.module(x, y);
                    run = 1;
                } else {
                    run += 1;
                    if run == 5 {
                        result += PENALTY_N1;
                    } else if run > 5 {
                        result += 1;
                    }
                }
            }
        }

        for y in 0..size - 1 {
            for x in 0..size - 1 {
                let c = self.module(x, y);
                if c == self.module(x + 1, y)
                    && c == self.module(x, y + 1)
                    && c == self.module(x + 1, y + 1)
                {
                    result += PENALTY_N2;
                }
            }
        }

        for y in 0..size {
            let mut bits: u32 = 0;
            for x in 0..size {
                bits = ((bits << 1) & 0x7FF) | self.module(x, y) as u32;
                if x >= 10 && (bits == 0x05D || bits == 0x5D0) {
                    result += PENALTY_N3;
                }
            }
        }
        for x in 0..size {
            let mut bits: u32 = 0;
            for y in 0..size {
                bits = ((bits << 1) & 0x7FF) | self.module(x, y) as u32;
                if y >= 10 && (bits == 0x05D || bits == 0x5D0) {
                    result += PENALTY_N3;
                }
            }
        }

        let dark: i32 = self.modules.iter().map(|&c| c as i32).sum();
        let total = size * size;
        let mut k = 0;
        while dark * 20 < (9 - k) * total || dark * 20 > (11 + k) * total {
            result += PENALTY_N4;
            k += 1;
        }
        result
    }

    /*---- Consumer-facing geometry (see EncodedSymbol) ----*/

    /// Full side length of the emitted symbol, including the quiet zone on both sides.
    pub(crate) fn bordered_size(&self) -> i32 {
        self.size + 2 * QUIET_ZONE
    }

    /// Returns `(bitmap, finder_pattern_bitmap, last_alignment_pattern_bitmap)`, each a
    /// `bordered_size x bordered_size` row-major grid.
    pub(crate) fn render_bitmaps(&self) -> (Vec<Vec<bool>>, Vec<Vec<bool>>, Vec<Vec<bool>>) {
        let full = self.bordered_size() as usize;
        let mut bitmap = vec![vec![false; full]; full];
        for y in 0..self.size {
            for x in 0..self.size {
                bitmap[(y + QUIET_ZONE) as usize][(x + QUIET_ZONE) as usize] = self.module(x, y);
            }
        }

        let mut finder = vec![vec![false; full]; full];
        for &(fx, fy) in &self.finder_corners() {
            for dy in 0..7 {
                for dx in 0..7 {
                    finder[(fy + dy + QUIET_ZONE) as usize][(fx + dx + QUIET_ZONE) as usize] = true;
                }
            }
        }

        let mut last_align = vec![vec![false; full]; full];
        if let Some((cx, cy)) = self.last_alignment_center() {
            for dy in -2..3 {
                for dx in -2..3 {
                    last_align[(cy + dy + QUIET_ZONE) as usize][(cx + dx + QUIET_ZONE) as usize] =
                        true;
                }
            }
        }

        (bitmap, finder, last_align)
    }

    /// Top-left corner of each of the three finder patterns, in unbordered symbol
    /// coordinates, as `(top_left, top_right, bottom_left)`.
    fn finder_corners(&self) -> [(i32, i32); 3] {
        [(0, 0), (self.size - 7, 0), (0, self.size - 7)]
    }

    /// Center module coordinates of each finder pattern, in bordered (quiet-zone-included)
    /// coordinates, as `(top_left, top_right, bottom_left)`.
    pub(crate) fn finder_points(&self) -> [(i32, i32); 3] {
        self.finder_corners()
            .map(|(x, y)| (x + 3 + QUIET_ZONE, y + 3 + QUIET_ZONE))
    }

    /// Center of the alignment pattern whose coordinates sort last (bottom-right-most),
    /// in unbordered symbol coordinates; `None` on version 1, which has none.
    fn last_alignment_center(&self) -> Option<(i32, i32)> {
        let positions = version::alignment_pattern_positions(self.version);
        let n = positions.len();
        if n == 0 {
            return None;
        }
        // The bottom-right-most candidate is the one using the largest coordinate on
        // both axes that isn't a finder corner (handled by skipping (last, last) only
        // when it would coincide with... it never does: (last,last) is never a finder
        // corner since finder corners use index 0 on at least one axis).
        Some((positions[n - 1], positions[n - 1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_formatter::format_codewords;
    use crate::segment::Segment;

    fn build_symbol(text: &str, version: u8, level: RecoveryLevel) -> Symbol {
        let ver = Version::new(version);
        let segs = Segment::make_segments(text);
        let codewords = format_codewords(&segs, ver, level);
        Symbol::build(ver, level, &codewords, None)
    }

    #[test]
    fn completeness_no_empty_modules_and_expected_size() {
        let sym = build_symbol("HELLO WORLD", 1, RecoveryLevel::Medium);
        assert_eq!(sym.num_empty_modules(), 0);
        assert_eq!(sym.size, 17 + 4);
        assert_eq!(sym.bordered_size(), 17 + 4 + 8);
    }

    #[test]
    fn dark_module_is_always_set() {
        for v in [1u8, 2, 7, 13, 40] {
            let sym = build_symbol("A", v, RecoveryLevel::Low);
            let y = 4 * i32::from(v) + 9;
            assert!(sym.module(8, y), "dark module missing at version {v}");
        }
    }

    #[test]
    fn mask_choice_is_deterministic_and_ties_break_to_lowest_index() {
        let a = build_symbol("HELLO WORLD", 1, RecoveryLevel::Medium);
        let b = build_symbol("HELLO WORLD", 1, RecoveryLevel::Medium);
        assert_eq!(a.mask().value(), b.mask().value());
    }

    #[test]
    fn version_info_blocks_are_present_and_valid_from_version_7() {
        let sym = build_symbol(&"A".repeat(100), 7, RecoveryLevel::Low);
        // Extract the top-right version block (6 rows x 3 cols) and check its BCH remainder.
        let mut data: u32 = 0;
        for i in (0..18).rev() {
            let a = sym.size - 11 + i % 3;
            let b = i / 3;
            data = (data << 1) | sym.module(a, b) as u32;
        }
        assert_eq!(bch_remainder_18_6(data), 0);
    }

    fn bch_remainder_18_6(mut data: u32) -> u32 {
        for _ in 0..18 {
            if data & (1 << 17) != 0 {
                data ^= 0x1F25 << (17 - 12);
            }
            data <<= 1;
            data &= (1 << 18) - 1;
        }
        data
    }

    #[test]
    fn finder_and_last_alignment_bitmaps_have_expected_area_and_are_disjoint_from_each_other() {
        let sym = build_symbol(&"1".repeat(20), 7, RecoveryLevel::Low);
        let (_, finder, last_align) = sym.render_bitmaps();
        let finder_count: usize = finder.iter().flatten().filter(|&&b| b).count();
        assert_eq!(finder_count, 7 * 7 * 3);
        let align_count: usize = last_align.iter().flatten().filter(|&&b| b).count();
        assert_eq!(align_count, 5 * 5);
        for row in 0..finder.len() {
            for col in 0..finder.len() {
                assert!(!(finder[row][col] && last_align[row][col]));
            }
        }
    }

    #[test]
    fn version_one_has_no_alignment_pattern() {
        let sym = build_symbol("1", 1, RecoveryLevel::Low);
        let (_, _, last_align) = sym.render_bitmaps();
        assert!(last_align.iter().flatten().all(|&b| !b));
    }

    fn bch_remainder_15_5(mut data: u32) -> u32 {
        for _ in 0..15 {
            if data & (1 << 14) != 0 {
                data ^= 0x537 << (14 - 10);
            }
            data <<= 1;
            data &= (1 << 15) - 1;
        }
        data
    }

    fn level_ordinal_to_format_bits(level: RecoveryLevel) -> u32 {
        level.format_bits()
    }

    proptest::proptest! {
        /// Every format-info field this crate draws (for any mask/level combination) is a
        /// valid BCH(15,5) codeword: the raw 5 bits, shifted up and XORed with its own
        /// remainder, always leaves a zero remainder under the generator `0x537`.
        #[test]
        fn format_info_is_always_a_valid_bch_codeword(
            mask_value in 0u8..=7,
            level_ord in 0usize..4,
        ) {
            let level = RecoveryLevel::ASCENDING[level_ord];
            let mask = Mask::new(mask_value);
            let mut sym = build_symbol("PROPTEST", 3, level);
            sym.draw_format_bits(mask);

            let mut data: u32 = 0;
            for i in 0..6 {
                data |= (sym.module(8, i) as u32) << i;
            }
            data |= (sym.module(8, 7) as u32) << 6;
            data |= (sym.module(8, 8) as u32) << 7;
            data |= (sym.module(7, 8) as u32) << 8;
            for i in 9..15 {
                data |= (sym.module(14 - i, 8) as u32) << i;
            }
            data ^= 0x5412;
            proptest::prop_assert_eq!(bch_remainder_15_5(data), 0);

            let expected_low5 = level_ordinal_to_format_bits(level) << 3 | u32::from(mask.value());
            proptest::prop_assert_eq!(data >> 10, expected_low5);
        }

        /// The dark module, timing patterns and finder patterns are fixed modules: present
        /// at the same relative position regardless of the encoded content.
        #[test]
        fn fixed_modules_are_independent_of_content(
            text in "[A-Z0-9 ]{1,40}",
            level_ord in 0usize..4,
        ) {
            let level = RecoveryLevel::ASCENDING[level_ord];
            let sym = build_symbol(&text, 7, level);
            let y = 4 * 7 + 9;
            proptest::prop_assert!(sym.module(8, y), "dark module missing");
            // Restrict to the span between the finder patterns' 8x8 (incl. separator)
            // bounding boxes, where nothing but the timing pattern itself is drawn.
            for i in 8..sym.size - 8 {
                proptest::prop_assert_eq!(sym.module(6, i), i % 2 == 0, "vertical timing pattern mismatch at {}", i);
                proptest::prop_assert_eq!(sym.module(i, 6), i % 2 == 0, "horizontal timing pattern mismatch at {}", i);
            }
        }
    }
}
