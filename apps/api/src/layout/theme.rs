//! Theme model and color math.
//!
//! Entities map to theme roles by emphasis; `normal` entities take a subdued
//! tint of the primary (lightness +20%). Text color is picked for contrast
//! against the fill using WCAG relative luminance.

use serde::{Deserialize, Serialize};

use crate::layout::units::{hex_to_rgb, rgb_to_hex, DEFAULT_CORNER_RADIUS};

pub const DEFAULT_PRIMARY: &str = "0073e6";
pub const DEFAULT_SECONDARY: &str = "00a3e0";
pub const DEFAULT_ACCENT: &str = "6cc24a";
pub const DEFAULT_BACKGROUND: &str = "ffffff";
pub const DEFAULT_TEXT: &str = "333333";
pub const DEFAULT_FONT_FAMILY: &str = "Calibri";

/// Luminance threshold above which a fill is "light" and takes dark text.
const CONTRAST_THRESHOLD: f64 = 0.5;

/// Lightness boost applied to the primary for normal-emphasis fills.
const NORMAL_TINT_BOOST: f64 = 0.20;

// ────────────────────────────────────────────────────────────────────────────
// Theme
// ────────────────────────────────────────────────────────────────────────────

/// Visual theme carried by the Brief. Hex colors are stored as 6 lowercase
/// digits without `#` — normalisation happens when the Brief is parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,
    pub font_family: String,
    pub corner_radius_in: f64,
    pub padding_in: f64,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY.to_string(),
            secondary: DEFAULT_SECONDARY.to_string(),
            accent: DEFAULT_ACCENT.to_string(),
            background: DEFAULT_BACKGROUND.to_string(),
            text: DEFAULT_TEXT.to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            corner_radius_in: DEFAULT_CORNER_RADIUS,
            padding_in: 0.15,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Color math
// ────────────────────────────────────────────────────────────────────────────

/// WCAG relative luminance of an sRGB hex color, in [0, 1].
pub fn relative_luminance(hex: &str) -> f64 {
    let (r, g, b) = hex_to_rgb(hex).unwrap_or((0, 0, 0));
    let lin = |c: u8| {
        let s = c as f64 / 255.0;
        if s <= 0.03928 {
            s / 12.92
        } else {
            ((s + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * lin(r) + 0.7152 * lin(g) + 0.0722 * lin(b)
}

/// Picks the text color with enough contrast against `fill`: the theme text
/// color on light fills, white on dark fills.
pub fn text_color_for(fill: &str, theme: &Theme) -> String {
    if relative_luminance(fill) > CONTRAST_THRESHOLD {
        theme.text.clone()
    } else {
        "ffffff".to_string()
    }
}

/// Raises the HSL lightness of a hex color by `amount` (0..1), clamped.
pub fn lighten(hex: &str, amount: f64) -> String {
    let (r, g, b) = match hex_to_rgb(hex) {
        Some(rgb) => rgb,
        None => return hex.to_string(),
    };
    let (h, s, l) = rgb_to_hsl(r, g, b);
    let (r, g, b) = hsl_to_rgb(h, s, (l + amount).clamp(0.0, 1.0));
    rgb_to_hex(r, g, b)
}

/// The subdued fill for normal-emphasis entities.
pub fn normal_tint(theme: &Theme) -> String {
    lighten(&theme.primary, NORMAL_TINT_BOOST)
}

fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < f64::EPSILON {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if (max - r).abs() < f64::EPSILON {
        ((g - b) / d + if g < b { 6.0 } else { 0.0 }) / 6.0
    } else if (max - g).abs() < f64::EPSILON {
        ((b - r) / d + 2.0) / 6.0
    } else {
        ((r - g) / d + 4.0) / 6.0
    };
    (h, s, l)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    if s.abs() < f64::EPSILON {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let hue = |mut t: f64| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 1.0 / 2.0 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round() as u8
    };
    (hue(h + 1.0 / 3.0), hue(h), hue(h - 1.0 / 3.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luminance_extremes() {
        assert!(relative_luminance("ffffff") > 0.99);
        assert!(relative_luminance("000000") < 0.01);
    }

    #[test]
    fn test_text_color_dark_fill_gets_white() {
        let theme = Theme::default();
        assert_eq!(text_color_for("0073e6", &theme), "ffffff");
        assert_eq!(text_color_for("1b365d", &theme), "ffffff");
    }

    #[test]
    fn test_text_color_light_fill_gets_theme_text() {
        let theme = Theme::default();
        assert_eq!(text_color_for("ffffff", &theme), "333333");
        assert_eq!(text_color_for("f0f4f8", &theme), "333333");
    }

    #[test]
    fn test_lighten_raises_luminance() {
        let base = "0073e6";
        let tinted = lighten(base, 0.20);
        assert_ne!(tinted, base);
        assert!(relative_luminance(&tinted) > relative_luminance(base));
    }

    #[test]
    fn test_lighten_white_saturates() {
        assert_eq!(lighten("ffffff", 0.20), "ffffff");
    }

    #[test]
    fn test_normal_tint_differs_from_primary() {
        let theme = Theme::default();
        let tint = normal_tint(&theme);
        assert_ne!(tint, theme.primary);
        assert_eq!(tint.len(), 6);
    }

    #[test]
    fn test_hsl_round_trip_stability() {
        let (h, s, l) = rgb_to_hsl(0, 0x73, 0xe6);
        let (r, g, b) = hsl_to_rgb(h, s, l);
        // Round-trip within 1/255 per channel
        assert!((r as i32).abs_diff(0) <= 1);
        assert!((g as i32).abs_diff(0x73) <= 1);
        assert!((b as i32).abs_diff(0xe6) <= 1);
    }
}
