use std::collections::BTreeMap;

use at_core::error::CoreError;

use crate::glyph::{GlyphCoverage, GlyphRasterizer};

/// Valeur normalisée quand le charset a moins de deux luminosités distinctes.
pub const DEGENERATE_NORMALIZED: f64 = 0.5;

/// A character and its brightness metadata within the live charset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    /// The character.
    pub ch: char,
    /// Ink coverage under the reference font, fixed once computed.
    pub raw: f64,
    /// `raw` stretched across the charset's current min/max.
    pub normalized: f64,
}

/// Charset vivant : luminosité brute et normalisée par caractère.
///
/// Les glyphes sont indexés par point de code, ce qui donne une énumération
/// stable et le départage des égalités par le plus petit point de code.
///
/// # Example
/// ```
/// use at_ascii::table::GlyphBrightnessTable;
///
/// let mut table = GlyphBrightnessTable::new(|ch: char| if ch == 'a' { 0.1 } else { 0.9 });
/// table.add_char('a');
/// table.add_char('b');
/// assert_eq!(table.nearest_char(0.0).unwrap(), 'a');
/// assert_eq!(table.nearest_char(1.0).unwrap(), 'b');
/// ```
pub struct GlyphBrightnessTable<R = GlyphRasterizer> {
    glyphs: BTreeMap<char, Glyph>,
    /// (min, max) des luminosités brutes. `None` si vide.
    range: Option<(f64, f64)>,
    revision: u64,
    source: R,
}

impl Default for GlyphBrightnessTable<GlyphRasterizer> {
    fn default() -> Self {
        Self::new(GlyphRasterizer::reference())
    }
}

impl<R: GlyphCoverage> GlyphBrightnessTable<R> {
    /// Empty table reading raw brightness from `source`.
    pub fn new(source: R) -> Self {
        Self {
            glyphs: BTreeMap::new(),
            range: None,
            revision: 0,
            source,
        }
    }

    /// Add `ch`. Returns `false` if it was already present.
    ///
    /// Only `ch` is normalized when its raw brightness lies within the tracked
    /// range; otherwise the range grows and every glyph is renormalized.
    pub fn add_char(&mut self, ch: char) -> bool {
        if self.glyphs.contains_key(&ch) {
            return false;
        }
        let raw = self.source.coverage(ch);
        debug_assert!((0.0..=1.0).contains(&raw), "couverture hors [0, 1] : {raw}");

        let (range, extended) = match self.range {
            None => ((raw, raw), true),
            Some((min, max)) if raw < min => ((raw, max), true),
            Some((min, max)) if raw > max => ((min, raw), true),
            Some(range) => (range, false),
        };
        self.range = Some(range);
        self.glyphs.insert(
            ch,
            Glyph {
                ch,
                raw,
                normalized: normalize(raw, range),
            },
        );
        if extended {
            log::trace!("Plage étendue à {range:?} par {ch:?}, renormalisation");
            self.renormalize();
        }
        self.revision += 1;
        true
    }

    /// Remove `ch`. Returns `false` if it was absent.
    ///
    /// The tracked range is rescanned from the remaining glyphs, since `ch`
    /// may have been an extremum, and every glyph is renormalized.
    pub fn remove_char(&mut self, ch: char) -> bool {
        if self.glyphs.remove(&ch).is_none() {
            return false;
        }
        self.range = self.glyphs.values().fold(None, |acc, g| match acc {
            None => Some((g.raw, g.raw)),
            Some((min, max)) => Some((min.min(g.raw), max.max(g.raw))),
        });
        self.renormalize();
        self.revision += 1;
        true
    }

    /// Add every character of `chars`; returns how many were new.
    pub fn add_chars(&mut self, chars: impl IntoIterator<Item = char>) -> usize {
        chars.into_iter().filter(|&ch| self.add_char(ch)).count()
    }

    /// Remove every character of `chars`; returns how many were present.
    pub fn remove_chars(&mut self, chars: impl IntoIterator<Item = char>) -> usize {
        chars.into_iter().filter(|&ch| self.remove_char(ch)).count()
    }

    fn renormalize(&mut self) {
        let Some(range) = self.range else {
            return;
        };
        for glyph in self.glyphs.values_mut() {
            glyph.normalized = normalize(glyph.raw, range);
        }
    }
}

impl<R> GlyphBrightnessTable<R> {
    /// Character whose normalized brightness is closest to `brightness`.
    ///
    /// Ties go to the lowest code point.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyCharset`] if the charset is empty.
    pub fn nearest_char(&self, brightness: f64) -> Result<char, CoreError> {
        let mut best: Option<(char, f64)> = None;
        // Parcours croissant : `<` strict garde le plus petit point de code.
        for glyph in self.glyphs.values() {
            let dist = (glyph.normalized - brightness).abs();
            if best.is_none_or(|(_, d)| dist < d) {
                best = Some((glyph.ch, dist));
            }
        }
        best.map(|(ch, _)| ch).ok_or(CoreError::EmptyCharset)
    }

    /// Current characters in code-point order.
    pub fn charset(&self) -> impl Iterator<Item = char> + '_ {
        self.glyphs.keys().copied()
    }

    /// Metadata for `ch`, if present.
    #[must_use]
    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    /// Tracked (min, max) raw brightness.
    #[must_use]
    pub fn range(&self) -> Option<(f64, f64)> {
        self.range
    }

    /// Number of glyphs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether the charset is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Counter bumped on every effective mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// `(raw - min) / (max - min)`, or the midpoint for a degenerate range.
fn normalize(raw: f64, (min, max): (f64, f64)) -> f64 {
    if max > min {
        (raw - min) / (max - min)
    } else {
        DEGENERATE_NORMALIZED
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn fixed(values: &[(char, f64)]) -> impl FnMut(char) -> f64 + use<> {
        let map: HashMap<char, f64> = values.iter().copied().collect();
        move |ch| map.get(&ch).copied().unwrap_or(0.5)
    }

    fn snapshot<R>(table: &GlyphBrightnessTable<R>) -> Vec<Glyph> {
        table.charset().filter_map(|c| table.glyph(c).copied()).collect()
    }

    #[test]
    fn two_glyph_scenario() {
        let mut table = GlyphBrightnessTable::new(fixed(&[('a', 0.1), ('b', 0.9)]));
        table.add_chars(['a', 'b']);
        assert_eq!(table.glyph('a').unwrap().normalized, 0.0);
        assert_eq!(table.glyph('b').unwrap().normalized, 1.0);
        assert_eq!(table.nearest_char(0.0).unwrap(), 'a');
        assert_eq!(table.nearest_char(1.0).unwrap(), 'b');
        // Égalité parfaite : le plus petit point de code gagne.
        assert_eq!(table.nearest_char(0.5).unwrap(), 'a');
    }

    #[test]
    fn extremes_normalize_to_zero_and_one() {
        let mut table = GlyphBrightnessTable::new(fixed(&[
            ('x', 0.3),
            ('y', 0.05),
            ('z', 0.6),
            ('w', 0.42),
        ]));
        table.add_chars("xyzw".chars());
        assert_eq!(table.range(), Some((0.05, 0.6)));
        assert_eq!(table.glyph('y').unwrap().normalized, 0.0);
        assert_eq!(table.glyph('z').unwrap().normalized, 1.0);
    }

    #[test]
    fn inner_add_keeps_other_glyphs_untouched() {
        let mut table = GlyphBrightnessTable::new(fixed(&[('a', 0.1), ('b', 0.9), ('c', 0.5)]));
        table.add_chars(['a', 'b']);
        let before = snapshot(&table);
        assert!(table.add_char('c'));
        assert!((table.glyph('c').unwrap().normalized - 0.5).abs() < 1e-12);
        assert_eq!(&snapshot(&table)[..1], &before[..1]);
        assert_eq!(table.glyph('b'), before.last());
    }

    #[test]
    fn extending_add_renormalizes_everything() {
        let mut table = GlyphBrightnessTable::new(fixed(&[('a', 0.2), ('b', 0.6), ('c', 1.0)]));
        table.add_chars(['a', 'b']);
        assert_eq!(table.glyph('b').unwrap().normalized, 1.0);
        table.add_char('c');
        assert!((table.glyph('b').unwrap().normalized - 0.5).abs() < 1e-12);
        assert_eq!(table.glyph('c').unwrap().normalized, 1.0);
    }

    #[test]
    fn add_then_remove_round_trips_exactly() {
        let mut table = GlyphBrightnessTable::new(fixed(&[
            ('a', 0.13),
            ('b', 0.71),
            ('c', 0.37),
            ('d', 0.95),
            ('e', 0.01),
            ('f', 0.5),
        ]));
        table.add_chars(['a', 'b', 'c']);
        for extra in ['d', 'e', 'f'] {
            let before = snapshot(&table);
            assert!(table.add_char(extra));
            assert!(table.remove_char(extra));
            assert_eq!(snapshot(&table), before, "aller-retour de {extra:?}");
        }
    }

    #[test]
    fn removing_an_extremum_rescans_the_range() {
        let mut table = GlyphBrightnessTable::new(fixed(&[('a', 0.1), ('b', 0.5), ('c', 0.9)]));
        table.add_chars(['a', 'b', 'c']);
        table.remove_char('c');
        assert_eq!(table.range(), Some((0.1, 0.5)));
        assert_eq!(table.glyph('b').unwrap().normalized, 1.0);
        assert_eq!(table.nearest_char(1.0).unwrap(), 'b');
    }

    #[test]
    fn nearest_of_own_normalized_value_is_itself() {
        let mut table: GlyphBrightnessTable = GlyphBrightnessTable::default();
        table.add_chars(at_core::charset::CHARSET_COMPACT.chars());
        for ch in table.charset().collect::<Vec<_>>() {
            let n = table.glyph(ch).unwrap().normalized;
            let found = table.nearest_char(n).unwrap();
            // Deux glyphes de même couverture : le plus petit point de code.
            assert_eq!(table.glyph(found).unwrap().normalized, n);
            assert!(found <= ch);
        }
    }

    #[test]
    fn nearest_is_exact_for_distinct_values() {
        let mut table = GlyphBrightnessTable::new(fixed(&[
            ('.', 0.05),
            (':', 0.1),
            ('+', 0.2),
            ('#', 0.4),
            ('@', 0.55),
        ]));
        table.add_chars(".:+#@".chars());
        for ch in ".:+#@".chars() {
            let n = table.glyph(ch).unwrap().normalized;
            assert_eq!(table.nearest_char(n).unwrap(), ch);
        }
    }

    #[test]
    fn duplicates_and_absent_removals_are_no_ops() {
        let mut table = GlyphBrightnessTable::new(fixed(&[('a', 0.1), ('b', 0.9)]));
        table.add_chars(['a', 'b']);
        let rev = table.revision();
        assert!(!table.add_char('a'));
        assert!(!table.remove_char('q'));
        assert_eq!(table.revision(), rev);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn degenerate_charsets_use_the_midpoint() {
        let mut table = GlyphBrightnessTable::new(fixed(&[('b', 0.3), ('a', 0.3)]));
        table.add_char('b');
        assert_eq!(table.glyph('b').unwrap().normalized, DEGENERATE_NORMALIZED);
        table.add_char('a');
        assert_eq!(table.glyph('a').unwrap().normalized, DEGENERATE_NORMALIZED);
        assert_eq!(table.nearest_char(0.0).unwrap(), 'a');
        assert_eq!(table.nearest_char(1.0).unwrap(), 'a');
    }

    #[test]
    fn empty_table_has_no_nearest() {
        let mut table = GlyphBrightnessTable::new(fixed(&[]));
        assert_eq!(table.nearest_char(0.5), Err(CoreError::EmptyCharset));
        table.add_char('x');
        table.remove_char('x');
        assert!(table.is_empty());
        assert_eq!(table.range(), None);
        assert_eq!(table.nearest_char(0.5), Err(CoreError::EmptyCharset));
    }

    #[test]
    fn charset_enumerates_in_code_point_order() {
        let mut table = GlyphBrightnessTable::new(fixed(&[]));
        table.add_chars("zam".chars());
        assert_eq!(table.charset().collect::<String>(), "amz");
    }
}
