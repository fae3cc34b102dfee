//! Input preprocessing — palette, logo colors, template snapshot, language.
//!
//! Everything here runs before the reasoning call: malformed colors and
//! unreadable uploads are rejected as `InputInvalid` so no cost accrues for
//! garbage input.

use anyhow::anyhow;
use image::GenericImageView;
use tracing::debug;

use crate::models::brief::normalize_hex;
use crate::reasoning::BrandSnapshot;

/// Palettes are capped at this many colors.
pub const MAX_PALETTE_COLORS: usize = 10;

/// Logo pixels are downscaled to fit this square before clustering.
const LOGO_SCALE_MAX: u32 = 500;

/// Dominant-color cluster count.
const KMEANS_K: usize = 5;
const KMEANS_ITERATIONS: usize = 10;

/// Normalises an ordered palette of hex colors. Malformed entries are an
/// error, not a warning — the caller sent them explicitly.
pub fn parse_palette(raw: &[String]) -> Result<Vec<String>, String> {
    if raw.len() > MAX_PALETTE_COLORS {
        return Err(format!(
            "palette has {} colors; at most {MAX_PALETTE_COLORS} are allowed",
            raw.len()
        ));
    }
    raw.iter()
        .map(|color| {
            normalize_hex(color).ok_or_else(|| format!("malformed palette color: {color}"))
        })
        .collect()
}

/// Extracts up to five dominant colors from logo bytes via k-means over the
/// downscaled pixels. Deterministic: centroids seed from evenly spaced
/// pixels, no randomness.
pub fn extract_logo_colors(bytes: &[u8]) -> anyhow::Result<Vec<String>> {
    let decoded = image::load_from_memory(bytes).map_err(|e| anyhow!("unreadable logo: {e}"))?;
    let (w, h) = decoded.dimensions();
    let scaled = if w > LOGO_SCALE_MAX || h > LOGO_SCALE_MAX {
        decoded.thumbnail(LOGO_SCALE_MAX, LOGO_SCALE_MAX)
    } else {
        decoded
    };

    let rgb = scaled.to_rgb8();
    let pixels: Vec<[f64; 3]> = rgb
        .pixels()
        .map(|p| [p.0[0] as f64, p.0[1] as f64, p.0[2] as f64])
        .collect();
    if pixels.is_empty() {
        return Err(anyhow!("logo has no pixels"));
    }

    let k = KMEANS_K.min(pixels.len());
    let mut centroids: Vec<[f64; 3]> = (0..k).map(|i| pixels[i * pixels.len() / k]).collect();
    let mut assignments = vec![0usize; pixels.len()];

    for _ in 0..KMEANS_ITERATIONS {
        for (pixel_idx, pixel) in pixels.iter().enumerate() {
            let mut best = 0;
            let mut best_dist = f64::MAX;
            for (centroid_idx, centroid) in centroids.iter().enumerate() {
                let dist = distance_sq(pixel, centroid);
                if dist < best_dist {
                    best_dist = dist;
                    best = centroid_idx;
                }
            }
            assignments[pixel_idx] = best;
        }

        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (pixel, &cluster) in pixels.iter().zip(&assignments) {
            for channel in 0..3 {
                sums[cluster][channel] += pixel[channel];
            }
            counts[cluster] += 1;
        }
        for cluster in 0..k {
            if counts[cluster] > 0 {
                for channel in 0..3 {
                    centroids[cluster][channel] = sums[cluster][channel] / counts[cluster] as f64;
                }
            }
        }
    }

    let mut counts = vec![0usize; k];
    for &cluster in &assignments {
        counts[cluster] += 1;
    }
    let mut ranked: Vec<(usize, [f64; 3])> = counts.into_iter().zip(centroids).collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    let colors: Vec<String> = ranked
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(_, c)| {
            format!(
                "{:02x}{:02x}{:02x}",
                c[0].round() as u8, c[1].round() as u8, c[2].round() as u8
            )
        })
        .collect();
    debug!(colors = ?colors, "extracted logo colors");
    Ok(colors)
}

fn distance_sq(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

/// Shallow theme snapshot from an uploaded template: colors and font family
/// only, no deep parsing. The template itself stays an opaque blob.
pub fn extract_template_snapshot(bytes: &[u8]) -> anyhow::Result<BrandSnapshot> {
    let mut snapshot: BrandSnapshot =
        serde_json::from_slice(bytes).map_err(|e| anyhow!("unreadable template theme: {e}"))?;
    for color in [
        &mut snapshot.primary,
        &mut snapshot.secondary,
        &mut snapshot.accent,
        &mut snapshot.background,
    ] {
        if let Some(value) = color.take() {
            *color = normalize_hex(&value);
        }
    }
    Ok(snapshot)
}

/// Script-based language tag detection for prompts without an explicit tag.
pub fn detect_language(prompt: &str) -> &'static str {
    let mut kana = 0usize;
    let mut han = 0usize;
    let mut hangul = 0usize;
    let mut arabic = 0usize;
    let mut hebrew = 0usize;
    for c in prompt.chars() {
        match c as u32 {
            0x3040..=0x30FF => kana += 1,
            0x3400..=0x4DBF | 0x4E00..=0x9FFF => han += 1,
            0xAC00..=0xD7AF | 0x1100..=0x11FF => hangul += 1,
            0x0600..=0x06FF | 0x0750..=0x077F => arabic += 1,
            0x0590..=0x05FF => hebrew += 1,
            _ => {}
        }
    }
    if kana > 0 {
        "ja"
    } else if hangul > 0 {
        "ko"
    } else if han > 0 {
        "zh"
    } else if arabic > 0 {
        "ar"
    } else if hebrew > 0 {
        "he"
    } else {
        "en"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::io::Cursor;

    #[test]
    fn test_parse_palette_normalises() {
        let palette = parse_palette(&["#0073E6".to_string(), "6cc24a".to_string()]).unwrap();
        assert_eq!(palette, vec!["0073e6", "6cc24a"]);
    }

    #[test]
    fn test_parse_palette_rejects_malformed() {
        assert!(parse_palette(&["not-a-color".to_string()]).is_err());
    }

    #[test]
    fn test_parse_palette_rejects_more_than_ten() {
        let raw: Vec<String> = (0..11).map(|i| format!("{i:06x}")).collect();
        assert!(parse_palette(&raw).is_err());
    }

    fn png_of(colors: &[(u8, u8, u8)]) -> Vec<u8> {
        // Stripes of equal width, 60x30
        let width = 60u32;
        let img = ImageBuffer::from_fn(width, 30, |x, _| {
            let stripe = (x * colors.len() as u32 / width) as usize;
            let (r, g, b) = colors[stripe.min(colors.len() - 1)];
            Rgb([r, g, b])
        });
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_logo_colors_find_dominant_stripes() {
        let bytes = png_of(&[(0, 115, 230), (255, 255, 255)]);
        let colors = extract_logo_colors(&bytes).unwrap();
        assert!(!colors.is_empty());
        assert!(colors.len() <= 5);
        // Both stripe colors should appear among the clusters.
        assert!(colors.iter().any(|c| c == "0073e6"), "got {colors:?}");
        assert!(colors.iter().any(|c| c == "ffffff"), "got {colors:?}");
    }

    #[test]
    fn test_logo_colors_deterministic() {
        let bytes = png_of(&[(10, 20, 30), (200, 100, 50), (0, 0, 0)]);
        assert_eq!(
            extract_logo_colors(&bytes).unwrap(),
            extract_logo_colors(&bytes).unwrap()
        );
    }

    #[test]
    fn test_unreadable_logo_is_an_error() {
        assert!(extract_logo_colors(b"definitely not an image").is_err());
    }

    #[test]
    fn test_template_snapshot_shallow_read() {
        let theme = br##"{"primary": "#1B365D", "font_family": "Arial"}"##;
        let snapshot = extract_template_snapshot(theme).unwrap();
        assert_eq!(snapshot.primary.as_deref(), Some("1b365d"));
        assert_eq!(snapshot.font_family.as_deref(), Some("Arial"));
        assert!(snapshot.secondary.is_none());
    }

    #[test]
    fn test_detect_language_scripts() {
        assert_eq!(detect_language("Build a marketecture"), "en");
        assert_eq!(detect_language("プロセスフローを作成"), "ja");
        assert_eq!(detect_language("业务流程图"), "zh");
        assert_eq!(detect_language("조직도를 만들어"), "ko");
        assert_eq!(detect_language("ارسم مخططا"), "ar");
        assert_eq!(detect_language("צור תרשים"), "he");
    }
}
