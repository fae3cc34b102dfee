//! Renderers — stateless consumers of `PositionedLayout`.
//!
//! Both outputs reproduce the same logical element set and ordering from the
//! same positioned intermediate; a reader comparing them sees identical
//! shapes, text, colors, and relative positions within rounding.

pub mod pptx;
pub mod svg;
pub mod xml;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::layout::positioned::PositionedLayout;

/// Requested output formats. Raster stays in the wire contract but has no
/// renderer — the SVG is the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    EditableSlide,
    Svg,
    Raster,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::EditableSlide => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            OutputFormat::Svg => "image/svg+xml",
            OutputFormat::Raster => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::EditableSlide => "pptx",
            OutputFormat::Svg => "svg",
            OutputFormat::Raster => "png",
        }
    }
}

/// Renders one format. Returns `None` for formats without a renderer.
pub fn render_format(format: OutputFormat, layout: &PositionedLayout) -> Result<Option<Vec<u8>>> {
    match format {
        OutputFormat::EditableSlide => Ok(Some(pptx::render(layout)?)),
        OutputFormat::Svg => Ok(Some(svg::render(layout).into_bytes())),
        OutputFormat::Raster => Ok(None),
    }
}
