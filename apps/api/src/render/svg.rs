//! SVG renderer — the self-contained preview document.
//!
//! Consumes a `PositionedLayout` and only converts inches to pixels at
//! 96 DPI; it never computes positions. Every element becomes exactly one
//! shape node (`<rect>`, or `<ellipse>` where the layout says so) with a
//! stable id and a `data-kind` attribute; text is written as `<text>` nodes,
//! never paths. No external references.

use crate::layout::positioned::{
    ConnectorStyle, ElementKind, PositionedConnector, PositionedElement, PositionedLayout,
    PositionedText, ShapeHint,
};
use crate::layout::text_measure::LINE_SPACING;
use crate::layout::units::{inches_to_px, pt_to_px};
use crate::render::xml::escape_xml;

/// Renders the layout to a complete SVG document.
pub fn render(layout: &PositionedLayout) -> String {
    let width = inches_to_px(layout.slide_width_in);
    let height = inches_to_px(layout.slide_height_in);

    let mut svg = String::with_capacity(16 * 1024);
    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
         viewBox=\"0 0 {w} {h}\" style=\"background-color:#{bg}\">\n",
        w = fmt_px(width),
        h = fmt_px(height),
        bg = layout.background_color,
    ));

    write_defs(&mut svg);

    // Back-to-front: bands (z < 0) precede blocks.
    for element in layout.elements_by_z() {
        write_element(&mut svg, element);
    }

    for connector in &layout.connectors {
        write_connector(&mut svg, connector);
    }

    // Title and subtitle are text-only nodes.
    if let Some(title) = &layout.title {
        write_text_only(&mut svg, title);
    }
    if let Some(subtitle) = &layout.subtitle {
        write_text_only(&mut svg, subtitle);
    }

    svg.push_str("</svg>\n");
    svg
}

fn write_defs(svg: &mut String) {
    svg.push_str(
        "  <defs>\n\
         \x20   <marker id=\"arrow-end\" markerWidth=\"8\" markerHeight=\"8\" refX=\"6\" \
         refY=\"3\" orient=\"auto\" markerUnits=\"strokeWidth\">\n\
         \x20     <path d=\"M0,0 L6,3 L0,6 z\" fill=\"#666666\"/>\n\
         \x20   </marker>\n\
         \x20   <marker id=\"arrow-start\" markerWidth=\"8\" markerHeight=\"8\" refX=\"0\" \
         refY=\"3\" orient=\"auto\" markerUnits=\"strokeWidth\">\n\
         \x20     <path d=\"M6,0 L0,3 L6,6 z\" fill=\"#666666\"/>\n\
         \x20   </marker>\n\
         \x20 </defs>\n",
    );
}

fn write_element(svg: &mut String, element: &PositionedElement) {
    let x = inches_to_px(element.x_in);
    let y = inches_to_px(element.y_in);
    let w = inches_to_px(element.width_in);
    let h = inches_to_px(element.height_in);
    let kind = kind_attr(element.kind);
    let id = escape_xml(&element.id);

    let opacity = if element.opacity < 1.0 {
        format!(" opacity=\"{:.2}\"", element.opacity)
    } else {
        String::new()
    };
    let stroke = match &element.stroke_color {
        Some(color) => format!(
            " stroke=\"#{color}\" stroke-width=\"{}\"",
            fmt_px(pt_to_px(element.stroke_width_pt))
        ),
        None => String::new(),
    };

    match element.shape {
        ShapeHint::Ellipse => {
            svg.push_str(&format!(
                "  <ellipse id=\"{id}\" data-kind=\"{kind}\" cx=\"{}\" cy=\"{}\" rx=\"{}\" \
                 ry=\"{}\" style=\"fill:#{}\"{stroke}{opacity}/>\n",
                fmt_px(x + w / 2.0),
                fmt_px(y + h / 2.0),
                fmt_px(w / 2.0),
                fmt_px(h / 2.0),
                element.fill_color,
            ));
        }
        ShapeHint::RoundedRect | ShapeHint::Chevron => {
            let rx = inches_to_px(element.corner_radius_in.min(element.height_in / 2.0));
            svg.push_str(&format!(
                "  <rect id=\"{id}\" data-kind=\"{kind}\" x=\"{}\" y=\"{}\" width=\"{}\" \
                 height=\"{}\" rx=\"{}\" style=\"fill:#{}\"{stroke}{opacity}/>\n",
                fmt_px(x),
                fmt_px(y),
                fmt_px(w),
                fmt_px(h),
                fmt_px(rx),
                element.fill_color,
            ));
        }
    }

    if let Some(text) = &element.text {
        write_text(svg, text, x + w / 2.0, y + h / 2.0);
    }
}

/// Title/subtitle: a text node centered in the element's box, no shape.
fn write_text_only(svg: &mut String, element: &PositionedElement) {
    if let Some(text) = &element.text {
        write_text(
            svg,
            text,
            inches_to_px(element.x_in + element.width_in / 2.0),
            inches_to_px(element.y_in + element.height_in / 2.0),
        );
    }
}

/// Pre-wrapped lines, vertically centered around `(cx, cy)`.
fn write_text(svg: &mut String, text: &PositionedText, cx: f64, cy: f64) {
    let lines: Vec<&str> = text
        .measured
        .lines
        .iter()
        .map(|l| l.as_str())
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return;
    }

    let size_px = pt_to_px(text.measured.font_size_pt as f64);
    let line_h = size_px * LINE_SPACING;
    let weight = if text.bold { " font-weight=\"bold\"" } else { "" };
    // Baseline sits ~0.35em below the line's vertical center.
    let first_y = cy - (lines.len() as f64 - 1.0) * line_h / 2.0 + size_px * 0.35;

    svg.push_str(&format!(
        "  <text text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\"{weight} \
         style=\"fill:#{}\">\n",
        escape_xml(&text.font_family),
        fmt_px(size_px),
        text.color,
    ));
    for (i, line) in lines.iter().enumerate() {
        svg.push_str(&format!(
            "    <tspan x=\"{}\" y=\"{}\">{}</tspan>\n",
            fmt_px(cx),
            fmt_px(first_y + i as f64 * line_h),
            escape_xml(line),
        ));
    }
    svg.push_str("  </text>\n");
}

fn write_connector(svg: &mut String, connector: &PositionedConnector) {
    let x1 = inches_to_px(connector.start_x);
    let y1 = inches_to_px(connector.start_y);
    let x2 = inches_to_px(connector.end_x);
    let y2 = inches_to_px(connector.end_y);

    let markers = match connector.style {
        ConnectorStyle::Arrow | ConnectorStyle::Dashed => {
            " marker-end=\"url(#arrow-end)\"".to_string()
        }
        ConnectorStyle::Bidirectional => {
            " marker-start=\"url(#arrow-start)\" marker-end=\"url(#arrow-end)\"".to_string()
        }
        ConnectorStyle::Plain => String::new(),
    };
    let dash = if connector.style == ConnectorStyle::Dashed {
        " stroke-dasharray=\"6,4\""
    } else {
        ""
    };

    svg.push_str(&format!(
        "  <line id=\"{}\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" \
         style=\"stroke:#{}\" stroke-width=\"{}\"{dash}{markers}/>\n",
        escape_xml(&connector.id),
        fmt_px(x1),
        fmt_px(y1),
        fmt_px(x2),
        fmt_px(y2),
        connector.color,
        fmt_px(pt_to_px(connector.stroke_width_pt)),
    ));

    if let Some(label) = &connector.label {
        let (mx, my) = connector.midpoint();
        write_text(svg, label, inches_to_px(mx), inches_to_px(my) - 6.0);
    }
}

fn kind_attr(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Block => "block",
        ElementKind::Band => "band",
        ElementKind::Title => "title",
        ElementKind::Subtitle => "subtitle",
        ElementKind::Label => "label",
    }
}

fn fmt_px(value: f64) -> String {
    format!("{value:.2}")
}
