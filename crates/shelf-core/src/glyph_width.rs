//! Display cell width of a single glyph.
//!
//! The shelf display is a fixed-pitch character grid. Every glyph occupies
//! either one cell or two; there is no zero-width case, because a cell that
//! nothing occupies would let two labels silently overlap. Any measurement
//! below one is clamped up and any measurement above two is clamped down.
//!
//! [`GlyphPolicy`] selects which characters count as wide.

use std::fmt;

use unicode_width::UnicodeWidthChar;

/// First code point of the Hangul Syllables block.
pub const HANGUL_SYLLABLES_START: char = '\u{AC00}';
/// Last code point of the Hangul Syllables block.
pub const HANGUL_SYLLABLES_END: char = '\u{D7A3}';

/// Glyph width measurement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GlyphPolicy {
    /// Only precomposed Hangul syllables (U+AC00..=U+D7A3) are wide.
    ///
    /// This matches the display font the shelf controllers ship with, where
    /// Latin letters, digits and punctuation are narrow and Hangul is the only
    /// double-pitch script in use.
    #[default]
    Hangul,

    /// East Asian Wide and Fullwidth characters are wide, as measured by
    /// `unicode-width`. Control and combining characters still take a cell.
    Unicode,
}

impl GlyphPolicy {
    /// Parse a policy name (`hangul` or `unicode`), case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hangul" | "default" => Some(Self::Hangul),
            "unicode" | "wcwidth" => Some(Self::Unicode),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hangul => "hangul",
            Self::Unicode => "unicode",
        }
    }

    /// Number of display cells `ch` occupies: always 1 or 2.
    #[inline]
    #[must_use]
    pub fn width(self, ch: char) -> usize {
        let raw = match self {
            Self::Hangul => {
                if is_hangul_syllable(ch) {
                    2
                } else {
                    1
                }
            }
            Self::Unicode => UnicodeWidthChar::width(ch).unwrap_or(0),
        };
        raw.clamp(1, 2)
    }

    /// Total cell width of `text`.
    #[must_use]
    pub fn text_width(self, text: &str) -> usize {
        if text.is_ascii() {
            return text.len();
        }
        text.chars().map(|ch| self.width(ch)).sum()
    }
}

impl fmt::Display for GlyphPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `ch` is a precomposed Hangul syllable.
#[inline]
#[must_use]
pub fn is_hangul_syllable(ch: char) -> bool {
    (HANGUL_SYLLABLES_START..=HANGUL_SYLLABLES_END).contains(&ch)
}

/// Cell width of `ch` under the default policy.
#[inline]
#[must_use]
pub fn width(ch: char) -> usize {
    GlyphPolicy::default().width(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── ASCII ──────────────────────────────────────────────────────────

    #[test]
    fn ascii_is_narrow_for_both_policies() {
        for ch in ['a', 'Z', '0', '~', ' ', '(', ','] {
            assert_eq!(GlyphPolicy::Hangul.width(ch), 1, "Hangul: {ch:?}");
            assert_eq!(GlyphPolicy::Unicode.width(ch), 1, "Unicode: {ch:?}");
        }
    }

    // ── Hangul band ───────────────────────────────────────────────────

    #[test]
    fn hangul_syllables_are_wide_for_both_policies() {
        for ch in ['가', '행', '사', '힣'] {
            assert_eq!(GlyphPolicy::Hangul.width(ch), 2, "Hangul: {ch:?}");
            assert_eq!(GlyphPolicy::Unicode.width(ch), 2, "Unicode: {ch:?}");
        }
    }

    #[test]
    fn band_edges_are_inclusive() {
        assert_eq!(GlyphPolicy::Hangul.width('\u{AC00}'), 2);
        assert_eq!(GlyphPolicy::Hangul.width('\u{D7A3}'), 2);
        assert_eq!(GlyphPolicy::Hangul.width('\u{ABFF}'), 1);
        assert_eq!(GlyphPolicy::Hangul.width('\u{D7A4}'), 1);
    }

    // ── Policies disagree outside the band ────────────────────────────

    #[test]
    fn cjk_ideograph_only_wide_under_unicode() {
        assert_eq!(GlyphPolicy::Hangul.width('中'), 1);
        assert_eq!(GlyphPolicy::Unicode.width('中'), 2);
    }

    // ── Clamping ──────────────────────────────────────────────────────

    #[test]
    fn zero_width_measurements_clamp_to_one() {
        for ch in ['\u{0301}', '\u{200D}', '\u{0007}', '\u{0000}'] {
            assert_eq!(GlyphPolicy::Unicode.width(ch), 1, "{ch:?}");
            assert_eq!(GlyphPolicy::Hangul.width(ch), 1, "{ch:?}");
        }
    }

    #[test]
    fn width_is_always_one_or_two() {
        for ch in ['a', '가', '中', '\u{1F680}', '\u{0301}', '\u{FFFF}'] {
            for policy in [GlyphPolicy::Hangul, GlyphPolicy::Unicode] {
                let w = policy.width(ch);
                assert!(w == 1 || w == 2, "{policy}: {ch:?} -> {w}");
            }
        }
    }

    // ── Text width ────────────────────────────────────────────────────

    #[test]
    fn text_width_sums_glyphs() {
        assert_eq!(GlyphPolicy::Hangul.text_width("AB"), 2);
        assert_eq!(GlyphPolicy::Hangul.text_width("콜라"), 4);
        assert_eq!(GlyphPolicy::Hangul.text_width("(행사X)"), 7);
        assert_eq!(GlyphPolicy::Hangul.text_width(""), 0);
    }

    #[test]
    fn parse_accepts_known_names() {
        assert_eq!(GlyphPolicy::parse("hangul"), Some(GlyphPolicy::Hangul));
        assert_eq!(GlyphPolicy::parse(" Unicode "), Some(GlyphPolicy::Unicode));
        assert_eq!(GlyphPolicy::parse("wcwidth"), Some(GlyphPolicy::Unicode));
        assert_eq!(GlyphPolicy::parse("nope"), None);
    }

    #[test]
    fn default_is_hangul() {
        assert_eq!(GlyphPolicy::default(), GlyphPolicy::Hangul);
        assert_eq!(width('가'), 2);
    }
}
