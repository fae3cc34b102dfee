//! Text measurement — measure text BEFORE placing it in shapes.
//!
//! Character widths are in em units (relative to font size), from static
//! per-family tables covering ASCII 0x20..=0x7E. Non-ASCII code points fall
//! back to a per-family average width; a string-level CJK multiplier corrects
//! for fullwidth scripts. Static tables catch real overflow while tolerating
//! borderline ambiguity of a percent or two of block width.
//!
//! ALWAYS call `fit` before creating any text-carrying shape. Renderers never
//! auto-fit — they write the pre-wrapped lines at the pre-computed size.

use serde::{Deserialize, Serialize};

use crate::layout::units::{
    BLOCK_LABEL_MAX_FONT_SIZE_PT, BLOCK_LABEL_MIN_FONT_SIZE_PT, TEXT_PADDING_H, TEXT_PADDING_V,
};

/// Line height as a multiple of single-line text height.
pub const LINE_SPACING: f64 = 1.3;

/// Text cap-height in em units, shared across families.
const TEXT_HEIGHT_EM: f64 = 0.72;

/// Bold widens glyphs slightly; the tables hold regular weights.
const BOLD_WIDTH_FACTOR: f64 = 1.05;

/// Fullwidth scripts widen the effective string by up to 80%.
const CJK_WIDTH_BOOST: f64 = 0.8;

/// Truncation cap when text cannot fit at the minimum size.
const TRUNCATE_CHARS: usize = 30;

// ────────────────────────────────────────────────────────────────────────────
// Script classification
// ────────────────────────────────────────────────────────────────────────────

/// Non-Latin script groups a font family may cover beyond ASCII.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    Cjk,
    Arabic,
    Hebrew,
}

/// Classifies a code point into a script group. ASCII returns `None` —
/// every family in the registry covers it.
pub fn classify_script(c: char) -> Option<Script> {
    let cp = c as u32;
    match cp {
        0x0000..=0x007F => None,
        // Han + extensions, kana, Hangul, CJK punctuation, fullwidth forms
        0x3000..=0x303F
        | 0x3040..=0x309F
        | 0x30A0..=0x30FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xAC00..=0xD7AF
        | 0x1100..=0x11FF
        | 0xFF00..=0xFFEF => Some(Script::Cjk),
        0x0590..=0x05FF => Some(Script::Hebrew),
        0x0600..=0x06FF | 0x0750..=0x077F | 0x08A0..=0x08FF => Some(Script::Arabic),
        _ => Some(Script::Latin),
    }
}

/// Fraction of CJK/Hiragana/Katakana/Hangul code points in a string.
pub fn cjk_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let cjk = text
        .chars()
        .filter(|&c| classify_script(c) == Some(Script::Cjk))
        .count();
    cjk as f64 / total as f64
}

/// True when the string contains Arabic or Hebrew code points (RTL scripts).
pub fn is_rtl(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(
            classify_script(c),
            Some(Script::Arabic) | Some(Script::Hebrew)
        )
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric tables
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for one font family.
///
/// `widths[i]` = em-width of ASCII character `(i + 32)`, covering 0x20 (space)
/// through 0x7E (~). Non-ASCII code points use `average_char_width` when the
/// family covers their script.
pub struct FontMetrics {
    pub family: &'static str,
    widths: [f64; 95],
    average_char_width: f64,
    space_width: f64,
    coverage: &'static [Script],
    /// The universal fallback covers every script.
    universal: bool,
}

impl FontMetrics {
    /// True when this family can render every code point of `text`.
    pub fn covers(&self, text: &str) -> bool {
        if self.universal {
            return true;
        }
        text.chars().all(|c| match classify_script(c) {
            None => true,
            Some(script) => self.coverage.contains(&script),
        })
    }

    /// Em-width of a single string at 1 em, before the CJK multiplier.
    fn width_em(&self, text: &str) -> f64 {
        text.chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    self.widths[code - 32]
                } else {
                    self.average_char_width
                }
            })
            .sum()
    }
}

#[rustfmt::skip]
const CALIBRI_WIDTHS: [f64; 95] = [
    // sp    !     "     #     $     %     &     '     (     )     *     +     ,     -     .     /
    0.23, 0.27, 0.37, 0.50, 0.50, 0.77, 0.64, 0.20, 0.30, 0.30, 0.36, 0.53, 0.25, 0.31, 0.25, 0.37,
    // 0     1     2     3     4     5     6     7     8     9
    0.51, 0.51, 0.51, 0.51, 0.51, 0.51, 0.51, 0.51, 0.51, 0.51,
    // :     ;     <     =     >     ?     @
    0.27, 0.27, 0.53, 0.53, 0.53, 0.46, 0.92,
    // A     B     C     D     E     F     G     H     I     J     K     L     M
    0.60, 0.56, 0.53, 0.61, 0.49, 0.47, 0.62, 0.62, 0.25, 0.34, 0.55, 0.42, 0.87,
    // N     O     P     Q     R     S     T     U     V     W     X     Y     Z
    0.65, 0.66, 0.53, 0.67, 0.56, 0.47, 0.50, 0.64, 0.59, 0.89, 0.53, 0.53, 0.50,
    // [     \     ]     ^     _     `
    0.30, 0.37, 0.30, 0.53, 0.50, 0.31,
    // a     b     c     d     e     f     g     h     i     j     k     l     m
    0.48, 0.52, 0.43, 0.52, 0.50, 0.30, 0.47, 0.52, 0.23, 0.24, 0.46, 0.23, 0.79,
    // n     o     p     q     r     s     t     u     v     w     x     y     z
    0.52, 0.52, 0.52, 0.52, 0.35, 0.41, 0.31, 0.52, 0.45, 0.71, 0.44, 0.45, 0.40,
    // {     |     }     ~
    0.31, 0.24, 0.31, 0.53,
];

#[rustfmt::skip]
const DEJAVU_WIDTHS: [f64; 95] = [
    // sp    !     "     #     $     %     &     '     (     )     *     +     ,     -     .     /
    0.32, 0.40, 0.46, 0.84, 0.64, 0.95, 0.78, 0.27, 0.39, 0.39, 0.50, 0.84, 0.32, 0.36, 0.32, 0.34,
    // 0     1     2     3     4     5     6     7     8     9
    0.64, 0.64, 0.64, 0.64, 0.64, 0.64, 0.64, 0.64, 0.64, 0.64,
    // :     ;     <     =     >     ?     @
    0.34, 0.34, 0.84, 0.84, 0.84, 0.53, 1.00,
    // A     B     C     D     E     F     G     H     I     J     K     L     M
    0.68, 0.69, 0.70, 0.77, 0.63, 0.58, 0.77, 0.75, 0.29, 0.29, 0.66, 0.56, 0.86,
    // N     O     P     Q     R     S     T     U     V     W     X     Y     Z
    0.75, 0.79, 0.60, 0.79, 0.70, 0.63, 0.61, 0.73, 0.68, 0.99, 0.69, 0.61, 0.69,
    // [     \     ]     ^     _     `
    0.39, 0.34, 0.39, 0.84, 0.50, 0.50,
    // a     b     c     d     e     f     g     h     i     j     k     l     m
    0.61, 0.63, 0.55, 0.63, 0.62, 0.35, 0.63, 0.63, 0.28, 0.28, 0.58, 0.28, 0.97,
    // n     o     p     q     r     s     t     u     v     w     x     y     z
    0.63, 0.61, 0.63, 0.63, 0.41, 0.52, 0.39, 0.63, 0.59, 0.82, 0.59, 0.59, 0.53,
    // {     |     }     ~
    0.64, 0.34, 0.64, 0.84,
];

/// Latin default — matches the editable-slide renderer's default typeface.
static CALIBRI: FontMetrics = FontMetrics {
    family: "Calibri",
    widths: CALIBRI_WIDTHS,
    average_char_width: 0.50,
    space_width: 0.23,
    coverage: &[Script::Latin],
    universal: false,
};

static ARIAL: FontMetrics = FontMetrics {
    family: "Arial",
    widths: DEJAVU_WIDTHS,
    average_char_width: 0.55,
    space_width: 0.28,
    coverage: &[Script::Latin],
    universal: false,
};

/// CJK fallback — fullwidth glyphs measure a full em.
static NOTO_SANS_CJK: FontMetrics = FontMetrics {
    family: "Noto Sans CJK",
    widths: DEJAVU_WIDTHS,
    average_char_width: 1.0,
    space_width: 0.32,
    coverage: &[Script::Latin, Script::Cjk],
    universal: false,
};

static NOTO_SANS_ARABIC: FontMetrics = FontMetrics {
    family: "Noto Sans Arabic",
    widths: DEJAVU_WIDTHS,
    average_char_width: 0.58,
    space_width: 0.32,
    coverage: &[Script::Latin, Script::Arabic],
    universal: false,
};

static NOTO_SANS_HEBREW: FontMetrics = FontMetrics {
    family: "Noto Sans Hebrew",
    widths: DEJAVU_WIDTHS,
    average_char_width: 0.56,
    space_width: 0.32,
    coverage: &[Script::Latin, Script::Hebrew],
    universal: false,
};

/// Universal fallback — last resort, covers everything.
static DEJAVU_SANS: FontMetrics = FontMetrics {
    family: "DejaVu Sans",
    widths: DEJAVU_WIDTHS,
    average_char_width: 0.62,
    space_width: 0.32,
    coverage: &[Script::Latin],
    universal: true,
};

static ALL_FAMILIES: [&FontMetrics; 6] = [
    &CALIBRI,
    &ARIAL,
    &NOTO_SANS_CJK,
    &NOTO_SANS_ARABIC,
    &NOTO_SANS_HEBREW,
    &DEJAVU_SANS,
];

fn lookup_family(name: &str) -> Option<&'static FontMetrics> {
    ALL_FAMILIES
        .iter()
        .copied()
        .find(|f| f.family.eq_ignore_ascii_case(name))
}

// ────────────────────────────────────────────────────────────────────────────
// Font registry
// ────────────────────────────────────────────────────────────────────────────

/// Immutable registry built once at startup from the configured fallback
/// chain. Shared read-only across all requests.
pub struct FontRegistry {
    chain: Vec<&'static FontMetrics>,
}

impl FontRegistry {
    /// Builds the registry from an ordered family-name chain. Unknown names
    /// are skipped; the universal fallback is always appended.
    pub fn new(fallback_chain: &[String]) -> Self {
        let mut chain: Vec<&'static FontMetrics> = fallback_chain
            .iter()
            .filter_map(|name| lookup_family(name))
            .collect();
        if !chain.iter().any(|f| f.universal) {
            chain.push(&DEJAVU_SANS);
        }
        Self { chain }
    }

    /// The default chain: brand font first (when configured), then Latin
    /// default, CJK, Arabic, Hebrew, universal.
    pub fn with_defaults(brand_font: Option<&str>) -> Self {
        let mut names: Vec<String> = Vec::new();
        if let Some(brand) = brand_font {
            names.push(brand.to_string());
        }
        names.extend(
            [
                "Calibri",
                "Noto Sans CJK",
                "Noto Sans Arabic",
                "Noto Sans Hebrew",
                "DejaVu Sans",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        Self::new(&names)
    }

    /// Resolves the family actually used for `text`: the requested family if
    /// it covers every code point, otherwise the first chain entry that does.
    pub fn resolve(&self, requested: &str, text: &str) -> &'static FontMetrics {
        if let Some(metrics) = lookup_family(requested) {
            if metrics.covers(text) {
                return metrics;
            }
        }
        self.chain
            .iter()
            .copied()
            .find(|f| f.covers(text))
            .unwrap_or(&DEJAVU_SANS)
    }

    /// Measures a single line of text. Returns `(width_in, height_in)`.
    pub fn measure(&self, text: &str, family: &str, size_pt: u32, bold: bool) -> (f64, f64) {
        let metrics = self.resolve(family, text);
        let mut width_em = metrics.width_em(text);
        if bold {
            width_em *= BOLD_WIDTH_FACTOR;
        }
        width_em *= 1.0 + CJK_WIDTH_BOOST * cjk_ratio(text);

        let em_in = size_pt as f64 / 72.0;
        (width_em * em_in, TEXT_HEIGHT_EM * em_in)
    }

    /// Finds the largest font size in `[min_size, max_size]` at which `text`
    /// fits `max_width_in` on up to three lines. Never errors: when nothing
    /// fits at the minimum size the result carries `fits = false` and a
    /// truncated single line.
    pub fn fit(
        &self,
        text: &str,
        max_width_in: f64,
        family: &str,
        min_size: u32,
        max_size: u32,
        bold: bool,
    ) -> MeasuredText {
        let available = max_width_in - 2.0 * TEXT_PADDING_H;
        let text = text.trim();

        if text.is_empty() {
            return MeasuredText {
                content: String::new(),
                lines: vec![String::new()],
                font_size_pt: max_size,
                total_height_in: TEXT_PADDING_V,
                fits: true,
            };
        }

        for size in (min_size..=max_size).rev() {
            let (w, h) = self.measure(text, family, size, bold);
            if w <= available {
                return MeasuredText {
                    content: text.to_string(),
                    lines: vec![text.to_string()],
                    font_size_pt: size,
                    total_height_in: h + TEXT_PADDING_V,
                    fits: true,
                };
            }

            if let Some(result) = self.try_word_wrap(text, available, family, size, bold) {
                return result;
            }
        }

        // Nothing fits — truncate a single line at the minimum size.
        let truncated: String = if text.chars().count() > TRUNCATE_CHARS {
            let head: String = text.chars().take(TRUNCATE_CHARS).collect();
            format!("{head}...")
        } else {
            text.to_string()
        };
        let (_, h) = self.measure(&truncated, family, min_size, bold);
        MeasuredText {
            content: text.to_string(),
            lines: vec![truncated],
            font_size_pt: min_size,
            total_height_in: h + TEXT_PADDING_V,
            fits: false,
        }
    }

    /// `fit` with the standard block-label size range.
    pub fn fit_label(&self, text: &str, max_width_in: f64, family: &str, bold: bool) -> MeasuredText {
        self.fit(
            text,
            max_width_in,
            family,
            BLOCK_LABEL_MIN_FONT_SIZE_PT,
            BLOCK_LABEL_MAX_FONT_SIZE_PT,
            bold,
        )
    }

    fn try_word_wrap(
        &self,
        text: &str,
        available: f64,
        family: &str,
        size: u32,
        bold: bool,
    ) -> Option<MeasuredText> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() < 2 {
            return None;
        }

        // 2-line split: scan every split point until both halves fit.
        for i in 1..words.len() {
            let line1 = words[..i].join(" ");
            let line2 = words[i..].join(" ");
            let (w1, _) = self.measure(&line1, family, size, bold);
            let (w2, _) = self.measure(&line2, family, size, bold);
            if w1 <= available && w2 <= available {
                return Some(self.wrapped(text, vec![line1, line2], family, size, bold));
            }
        }

        // 3-line equal-thirds split for long text at small sizes.
        if size <= 14 && words.len() >= 3 {
            let n = words.len();
            let third = n / 3;
            for i in third.saturating_sub(1).max(1)..(third + 2).min(n - 1) {
                for j in (2 * third).saturating_sub(1).max(i + 1)..(2 * third + 2).min(n) {
                    let line1 = words[..i].join(" ");
                    let line2 = words[i..j].join(" ");
                    let line3 = words[j..].join(" ");
                    let fits = [&line1, &line2, &line3]
                        .iter()
                        .all(|l| self.measure(l, family, size, bold).0 <= available);
                    if fits {
                        return Some(self.wrapped(
                            text,
                            vec![line1, line2, line3],
                            family,
                            size,
                            bold,
                        ));
                    }
                }
            }
        }

        None
    }

    fn wrapped(
        &self,
        original: &str,
        lines: Vec<String>,
        family: &str,
        size: u32,
        bold: bool,
    ) -> MeasuredText {
        let mut total = 0.0;
        for (i, line) in lines.iter().enumerate() {
            let (_, h) = self.measure(line, family, size, bold);
            if i == 0 {
                total = h;
            } else {
                total += h * LINE_SPACING;
            }
        }
        MeasuredText {
            content: original.to_string(),
            lines,
            font_size_pt: size,
            total_height_in: total + TEXT_PADDING_V,
            fits: true,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Result type
// ────────────────────────────────────────────────────────────────────────────

/// Pre-measured, pre-wrapped text. Invariants: height > 0, at most 3 lines.
/// `fits = false` propagates as a warning, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasuredText {
    pub content: String,
    pub lines: Vec<String>,
    pub font_size_pt: u32,
    pub total_height_in: f64,
    pub fits: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> FontRegistry {
        FontRegistry::with_defaults(None)
    }

    #[test]
    fn test_measure_empty_is_zero_width() {
        let (w, h) = registry().measure("", "Calibri", 14, false);
        assert_eq!(w, 0.0);
        assert!(h > 0.0);
    }

    #[test]
    fn test_measure_monotone_in_size() {
        let reg = registry();
        let mut prev = 0.0;
        for size in [8, 10, 14, 18, 24, 32] {
            let (w, _) = reg.measure("Business Units", "Calibri", size, false);
            assert!(w >= prev, "width must be monotone non-decreasing in size");
            prev = w;
        }
    }

    #[test]
    fn test_bold_wider_than_regular() {
        let reg = registry();
        let (regular, _) = reg.measure("Platform", "Calibri", 14, false);
        let (bold, _) = reg.measure("Platform", "Calibri", 14, true);
        assert!(bold > regular);
    }

    #[test]
    fn test_cjk_ratio_and_multiplier() {
        assert_eq!(cjk_ratio("hello"), 0.0);
        assert_eq!(cjk_ratio("日本語"), 1.0);
        let reg = registry();
        let (latin, _) = reg.measure("aaaa", "Calibri", 14, false);
        let (cjk, _) = reg.measure("ああああ", "Calibri", 14, false);
        assert!(cjk > latin, "fullwidth text must measure wider");
    }

    #[test]
    fn test_fallback_resolution_for_cjk() {
        let reg = registry();
        let metrics = reg.resolve("Calibri", "戦略プラットフォーム");
        assert_eq!(metrics.family, "Noto Sans CJK");
    }

    #[test]
    fn test_fallback_resolution_for_hebrew() {
        let reg = registry();
        let metrics = reg.resolve("Calibri", "אסטרטגיה");
        assert_eq!(metrics.family, "Noto Sans Hebrew");
    }

    #[test]
    fn test_requested_family_kept_when_covering() {
        let reg = registry();
        let metrics = reg.resolve("Arial", "Strategy 2026");
        assert_eq!(metrics.family, "Arial");
    }

    #[test]
    fn test_fit_single_short_word_at_max_size() {
        let fit = registry().fit("API", 3.0, "Calibri", 10, 24, true);
        assert!(fit.fits);
        assert_eq!(fit.lines.len(), 1);
        assert_eq!(fit.font_size_pt, 24);
        assert!(fit.total_height_in > 0.0);
    }

    #[test]
    fn test_fit_wraps_to_two_lines() {
        let fit = registry().fit("Customer Relationship Management", 2.0, "Calibri", 10, 24, true);
        assert!(fit.fits);
        assert!(fit.lines.len() >= 2, "long label should wrap, got {:?}", fit.lines);
        assert!(fit.lines.len() <= 3);
    }

    #[test]
    fn test_fit_never_exceeds_three_lines() {
        let long = "enterprise content management platform with federated governance controls";
        let fit = registry().fit(long, 1.8, "Calibri", 10, 24, true);
        assert!(fit.lines.len() <= 3);
    }

    #[test]
    fn test_fit_truncates_when_nothing_fits() {
        let long = "X".repeat(120);
        let fit = registry().fit(&long, 0.8, "Calibri", 10, 24, true);
        assert!(!fit.fits);
        assert_eq!(fit.lines.len(), 1);
        assert!(fit.lines[0].ends_with("..."));
        assert!(fit.lines[0].chars().count() <= TRUNCATE_CHARS + 3);
        assert!(fit.total_height_in > 0.0);
    }

    #[test]
    fn test_fit_empty_text_fits() {
        let fit = registry().fit("   ", 2.0, "Calibri", 10, 24, false);
        assert!(fit.fits);
        assert!(fit.total_height_in > 0.0);
    }

    #[test]
    fn test_is_rtl() {
        assert!(is_rtl("אסטרטגיה"));
        assert!(is_rtl("استراتيجية"));
        assert!(!is_rtl("strategy"));
        assert!(!is_rtl("戦略"));
    }
}
