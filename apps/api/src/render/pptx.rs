//! Editable-slide renderer — emits a native PPTX package.
//!
//! One 13.333" × 7.5" slide on a blank master. Blocks and bands become
//! rounded-rectangle shapes with pre-wrapped text runs at the pre-computed
//! font size (vertical-center anchor, word-wrap on, auto-fit off);
//! titles and subtitles become text boxes; connectors are plain line shapes
//! with arrowheads, never auto-binding connectors. Shapes are written in
//! ascending z-order so back-to-front stacking is correct. Inches convert to
//! EMU exactly once, here.

use std::io::{Cursor, Write};

use anyhow::{Context, Result};
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::layout::positioned::{
    ConnectorStyle, ElementKind, PositionedConnector, PositionedElement, PositionedLayout,
    PositionedText, ShapeHint,
};
use crate::layout::text_measure::is_rtl;
use crate::layout::units::{inches_to_emu, pt_to_emu, TEXT_PADDING_H, TEXT_PADDING_V};
use crate::render::xml::escape_xml;

/// Upper bound on the rounded-rect corner adjustment fraction.
const MAX_CORNER_ADJUST: f64 = 0.15;

const XMLNS: &str = "xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
                     xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" \
                     xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\"";

/// Renders the layout into a complete `.pptx` byte stream.
pub fn render(layout: &PositionedLayout) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let parts: [(&str, String); 12] = [
        ("[Content_Types].xml", content_types()),
        ("_rels/.rels", package_rels()),
        ("docProps/core.xml", core_props()),
        ("docProps/app.xml", app_props()),
        ("ppt/presentation.xml", presentation(layout)),
        ("ppt/_rels/presentation.xml.rels", presentation_rels()),
        ("ppt/slideMasters/slideMaster1.xml", slide_master()),
        ("ppt/slideMasters/_rels/slideMaster1.xml.rels", master_rels()),
        ("ppt/slideLayouts/slideLayout1.xml", slide_layout()),
        ("ppt/slideLayouts/_rels/slideLayout1.xml.rels", layout_rels()),
        ("ppt/theme/theme1.xml", theme_part()),
        ("ppt/slides/slide1.xml", slide(layout)),
    ];

    for (name, content) in parts {
        zip.start_file(name, options)
            .with_context(|| format!("start zip entry {name}"))?;
        zip.write_all(content.as_bytes())
            .with_context(|| format!("write zip entry {name}"))?;
    }
    zip.start_file("ppt/slides/_rels/slide1.xml.rels", options)?;
    zip.write_all(slide_rels().as_bytes())?;

    let cursor = zip.finish().context("finalise pptx container")?;
    Ok(cursor.into_inner())
}

// ────────────────────────────────────────────────────────────────────────────
// Slide content
// ────────────────────────────────────────────────────────────────────────────

fn slide(layout: &PositionedLayout) -> String {
    let mut shapes = String::new();
    let mut next_id: u32 = 2;

    // Ascending z-order: bands land behind blocks in the shape tree.
    for element in layout.elements_by_z() {
        write_shape(&mut shapes, element, &mut next_id);
    }
    for connector in &layout.connectors {
        write_connector(&mut shapes, connector, &mut next_id);
    }
    if let Some(title) = &layout.title {
        write_text_box(&mut shapes, title, &mut next_id);
    }
    if let Some(subtitle) = &layout.subtitle {
        write_text_box(&mut shapes, subtitle, &mut next_id);
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <p:sld {XMLNS}><p:cSld>\
         <p:bg><p:bgPr><a:solidFill><a:srgbClr val=\"{bg}\"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>\
         <p:spTree>\
         <p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
         <p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/>\
         <a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>\
         {shapes}\
         </p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>",
        bg = hex_upper(&layout.background_color),
    )
}

fn write_shape(out: &mut String, element: &PositionedElement, next_id: &mut u32) {
    let id = *next_id;
    *next_id += 1;

    let x = inches_to_emu(element.x_in);
    let y = inches_to_emu(element.y_in);
    let cx = inches_to_emu(element.width_in);
    let cy = inches_to_emu(element.height_in);

    let geometry = match element.shape {
        ShapeHint::Ellipse => "<a:prstGeom prst=\"ellipse\"><a:avLst/></a:prstGeom>".to_string(),
        ShapeHint::Chevron => {
            let adj = geometry_adjust(element.corner_radius_in, element.width_in, element.height_in);
            format!(
                "<a:prstGeom prst=\"chevron\"><a:avLst>\
                 <a:gd name=\"adj\" fmla=\"val {adj}\"/></a:avLst></a:prstGeom>"
            )
        }
        ShapeHint::RoundedRect => {
            let adjust = (element.corner_radius_in / element.height_in.max(1e-6))
                .min(MAX_CORNER_ADJUST);
            let adj = (adjust * 100_000.0).round() as i64;
            format!(
                "<a:prstGeom prst=\"roundRect\"><a:avLst>\
                 <a:gd name=\"adj\" fmla=\"val {adj}\"/></a:avLst></a:prstGeom>"
            )
        }
    };

    let line = match &element.stroke_color {
        Some(color) if element.stroke_width_pt > 0.0 => format!(
            "<a:ln w=\"{}\"><a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill></a:ln>",
            pt_to_emu(element.stroke_width_pt),
            hex_upper(color),
        ),
        _ => "<a:ln><a:noFill/></a:ln>".to_string(),
    };

    let alpha = if element.opacity < 1.0 {
        format!("<a:alpha val=\"{}\"/>", (element.opacity * 100_000.0).round() as i64)
    } else {
        String::new()
    };

    out.push_str(&format!(
        "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"{name}\"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>\
         <p:spPr><a:xfrm><a:off x=\"{x}\" y=\"{y}\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>\
         {geometry}\
         <a:solidFill><a:srgbClr val=\"{fill}\">{alpha}</a:srgbClr></a:solidFill>\
         {line}</p:spPr>\
         {body}</p:sp>",
        name = escape_xml(&element.id),
        fill = hex_upper(&element.fill_color),
        body = text_body(element.text.as_ref()),
    ));
}

/// Titles and subtitles are text boxes: no fill, no outline.
fn write_text_box(out: &mut String, element: &PositionedElement, next_id: &mut u32) {
    let id = *next_id;
    *next_id += 1;

    out.push_str(&format!(
        "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"{name}\"/>\
         <p:cNvSpPr txBox=\"1\"/><p:nvPr/></p:nvSpPr>\
         <p:spPr><a:xfrm><a:off x=\"{x}\" y=\"{y}\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>\
         <a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>\
         {body}</p:sp>",
        name = escape_xml(&element.id),
        x = inches_to_emu(element.x_in),
        y = inches_to_emu(element.y_in),
        cx = inches_to_emu(element.width_in),
        cy = inches_to_emu(element.height_in),
        body = text_body(element.text.as_ref()),
    ));
}

/// Pre-wrapped runs at the pre-computed size: one paragraph per line,
/// centered, RTL paragraph direction for Arabic/Hebrew lines, word-wrap on,
/// auto-fit off. The frame is never empty — a single space is inserted.
fn text_body(text: Option<&PositionedText>) -> String {
    let body_pr = format!(
        "<a:bodyPr anchor=\"ctr\" wrap=\"square\" lIns=\"{h}\" tIns=\"{v}\" rIns=\"{h}\" \
         bIns=\"{v}\"><a:noAutofit/></a:bodyPr>",
        h = inches_to_emu(TEXT_PADDING_H),
        v = inches_to_emu(TEXT_PADDING_V),
    );
    let Some(text) = text else {
        return format!(
            "<p:txBody>{body_pr}<a:lstStyle/><a:p><a:r>\
             <a:rPr lang=\"en-US\" sz=\"1200\" dirty=\"0\"/>\
             <a:t> </a:t></a:r></a:p></p:txBody>"
        );
    };

    let sz = text.measured.font_size_pt * 100;
    let bold = if text.bold { " b=\"1\"" } else { "" };
    let color = hex_upper(&text.color);
    let family = escape_xml(&text.font_family);

    let mut lines: Vec<&str> = text
        .measured
        .lines
        .iter()
        .map(|l| l.as_str())
        .filter(|l| !l.trim().is_empty())
        .collect();
    if lines.is_empty() {
        lines.push(" ");
    }

    let paragraphs: String = lines
        .iter()
        .map(|line| {
            let rtl = if is_rtl(line) { " rtl=\"1\"" } else { "" };
            format!(
                "<a:p><a:pPr algn=\"ctr\"{rtl}/>\
                 <a:r><a:rPr lang=\"en-US\" sz=\"{sz}\"{bold} dirty=\"0\">\
                 <a:solidFill><a:srgbClr val=\"{color}\"/></a:solidFill>\
                 <a:latin typeface=\"{family}\"/></a:rPr>\
                 <a:t>{}</a:t></a:r></a:p>",
                escape_xml(line),
            )
        })
        .collect();

    format!("<p:txBody>{body_pr}<a:lstStyle/>{paragraphs}</p:txBody>")
}

/// Plain line shapes with arrow markers, not auto-binding connectors. The
/// flip flags keep the drawn start at the connector's start point so the
/// tail arrowhead lands on the end point.
fn write_connector(out: &mut String, connector: &PositionedConnector, next_id: &mut u32) {
    let id = *next_id;
    *next_id += 1;

    let x = inches_to_emu(connector.start_x.min(connector.end_x));
    let y = inches_to_emu(connector.start_y.min(connector.end_y));
    let cx = inches_to_emu((connector.end_x - connector.start_x).abs());
    let cy = inches_to_emu((connector.end_y - connector.start_y).abs());
    let flip_h = if connector.end_x < connector.start_x { " flipH=\"1\"" } else { "" };
    let flip_v = if connector.end_y < connector.start_y { " flipV=\"1\"" } else { "" };

    let dash = if connector.style == ConnectorStyle::Dashed {
        "<a:prstDash val=\"dash\"/>"
    } else {
        ""
    };
    let head = if connector.style == ConnectorStyle::Bidirectional {
        "<a:headEnd type=\"triangle\"/>"
    } else {
        "<a:headEnd type=\"none\"/>"
    };
    let tail = match connector.style {
        ConnectorStyle::Plain => "<a:tailEnd type=\"none\"/>",
        _ => "<a:tailEnd type=\"triangle\"/>",
    };

    out.push_str(&format!(
        "<p:cxnSp><p:nvCxnSpPr><p:cNvPr id=\"{id}\" name=\"{name}\"/>\
         <p:cNvCxnSpPr/><p:nvPr/></p:nvCxnSpPr>\
         <p:spPr><a:xfrm{flip_h}{flip_v}><a:off x=\"{x}\" y=\"{y}\"/>\
         <a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>\
         <a:prstGeom prst=\"line\"><a:avLst/></a:prstGeom>\
         <a:ln w=\"{w}\"><a:solidFill><a:srgbClr val=\"{color}\"/></a:solidFill>\
         {dash}{head}{tail}</a:ln></p:spPr></p:cxnSp>",
        name = escape_xml(&connector.id),
        w = pt_to_emu(connector.stroke_width_pt),
        color = hex_upper(&connector.color),
    ));

    // Connector labels ride as small text boxes at the midpoint.
    if let Some(label) = &connector.label {
        let (mx, my) = connector.midpoint();
        let label_elem = PositionedElement {
            id: format!("{}_label", connector.id),
            kind: ElementKind::Label,
            shape: ShapeHint::RoundedRect,
            x_in: mx - 0.8,
            y_in: my - 0.35,
            width_in: 1.6,
            height_in: 0.3,
            fill_color: String::new(),
            stroke_color: None,
            stroke_width_pt: 0.0,
            corner_radius_in: 0.0,
            text: Some(label.clone()),
            opacity: 1.0,
            z_order: 0,
            layer_id: None,
        };
        write_text_box(out, &label_elem, next_id);
    }
}

fn geometry_adjust(tip_in: f64, width_in: f64, height_in: f64) -> i64 {
    let reference = width_in.min(height_in).max(1e-6);
    ((tip_in / reference) * 100_000.0).round().clamp(0.0, 100_000.0) as i64
}

fn hex_upper(hex: &str) -> String {
    hex.trim_start_matches('#').to_uppercase()
}

// ────────────────────────────────────────────────────────────────────────────
// Static package parts
// ────────────────────────────────────────────────────────────────────────────

fn content_types() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
     <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
     <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
     <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
     <Override PartName=\"/ppt/presentation.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml\"/>\
     <Override PartName=\"/ppt/slideMasters/slideMaster1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml\"/>\
     <Override PartName=\"/ppt/slideLayouts/slideLayout1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml\"/>\
     <Override PartName=\"/ppt/slides/slide1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>\
     <Override PartName=\"/ppt/theme/theme1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.theme+xml\"/>\
     <Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>\
     <Override PartName=\"/docProps/app.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.extended-properties+xml\"/>\
     </Types>"
        .to_string()
}

fn package_rels() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
     <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
     <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"ppt/presentation.xml\"/>\
     <Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>\
     <Relationship Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties\" Target=\"docProps/app.xml\"/>\
     </Relationships>"
        .to_string()
}

fn core_props() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
     <cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
     xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\
     <dc:title>Generated Infographic</dc:title><dc:creator>Slidesmith</dc:creator>\
     </cp:coreProperties>"
        .to_string()
}

fn app_props() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
     <Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\">\
     <Application>Slidesmith</Application><Slides>1</Slides>\
     </Properties>"
        .to_string()
}

fn presentation(layout: &PositionedLayout) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <p:presentation {XMLNS}>\
         <p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst>\
         <p:sldIdLst><p:sldId id=\"256\" r:id=\"rId2\"/></p:sldIdLst>\
         <p:sldSz cx=\"{cx}\" cy=\"{cy}\"/>\
         <p:notesSz cx=\"6858000\" cy=\"9144000\"/>\
         </p:presentation>",
        cx = inches_to_emu(layout.slide_width_in),
        cy = inches_to_emu(layout.slide_height_in),
    )
}

fn presentation_rels() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
     <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
     <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster\" Target=\"slideMasters/slideMaster1.xml\"/>\
     <Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide\" Target=\"slides/slide1.xml\"/>\
     <Relationship Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme\" Target=\"theme/theme1.xml\"/>\
     </Relationships>"
        .to_string()
}

fn slide_master() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <p:sldMaster {XMLNS}><p:cSld>\
         <p:bg><p:bgPr><a:solidFill><a:srgbClr val=\"FFFFFF\"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>\
         <p:spTree>\
         <p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
         <p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/>\
         <a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>\
         </p:spTree></p:cSld>\
         <p:clrMap bg1=\"lt1\" tx1=\"dk1\" bg2=\"lt2\" tx2=\"dk2\" accent1=\"accent1\" \
         accent2=\"accent2\" accent3=\"accent3\" accent4=\"accent4\" accent5=\"accent5\" \
         accent6=\"accent6\" hlink=\"hlink\" folHlink=\"folHlink\"/>\
         <p:sldLayoutIdLst><p:sldLayoutId id=\"2147483649\" r:id=\"rId1\"/></p:sldLayoutIdLst>\
         </p:sldMaster>"
    )
}

fn master_rels() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
     <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
     <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout\" Target=\"../slideLayouts/slideLayout1.xml\"/>\
     <Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme\" Target=\"../theme/theme1.xml\"/>\
     </Relationships>"
        .to_string()
}

fn slide_layout() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <p:sldLayout {XMLNS} type=\"blank\" preserve=\"1\"><p:cSld name=\"Blank\">\
         <p:spTree>\
         <p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
         <p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/>\
         <a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>\
         </p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"
    )
}

fn layout_rels() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
     <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
     <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster\" Target=\"../slideMasters/slideMaster1.xml\"/>\
     </Relationships>"
        .to_string()
}

fn slide_rels() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
     <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
     <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout\" Target=\"../slideLayouts/slideLayout1.xml\"/>\
     </Relationships>"
        .to_string()
}

fn theme_part() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
     <a:theme xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" name=\"Slidesmith\">\
     <a:themeElements>\
     <a:clrScheme name=\"Slidesmith\">\
     <a:dk1><a:srgbClr val=\"333333\"/></a:dk1><a:lt1><a:srgbClr val=\"FFFFFF\"/></a:lt1>\
     <a:dk2><a:srgbClr val=\"1B365D\"/></a:dk2><a:lt2><a:srgbClr val=\"F0F4F8\"/></a:lt2>\
     <a:accent1><a:srgbClr val=\"0073E6\"/></a:accent1><a:accent2><a:srgbClr val=\"00A3E0\"/></a:accent2>\
     <a:accent3><a:srgbClr val=\"6CC24A\"/></a:accent3><a:accent4><a:srgbClr val=\"F5A623\"/></a:accent4>\
     <a:accent5><a:srgbClr val=\"9B59B6\"/></a:accent5><a:accent6><a:srgbClr val=\"E74C3C\"/></a:accent6>\
     <a:hlink><a:srgbClr val=\"0073E6\"/></a:hlink><a:folHlink><a:srgbClr val=\"9B59B6\"/></a:folHlink>\
     </a:clrScheme>\
     <a:fontScheme name=\"Slidesmith\">\
     <a:majorFont><a:latin typeface=\"Calibri\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:majorFont>\
     <a:minorFont><a:latin typeface=\"Calibri\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:minorFont>\
     </a:fontScheme>\
     <a:fmtScheme name=\"Slidesmith\">\
     <a:fillStyleLst><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
     <a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
     <a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:fillStyleLst>\
     <a:lnStyleLst><a:ln w=\"9525\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:ln>\
     <a:ln w=\"19050\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:ln>\
     <a:ln w=\"28575\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:ln></a:lnStyleLst>\
     <a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle>\
     <a:effectStyle><a:effectLst/></a:effectStyle>\
     <a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst>\
     <a:bgFillStyleLst><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
     <a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
     <a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:bgFillStyleLst>\
     </a:fmtScheme>\
     </a:themeElements></a:theme>"
        .to_string()
}
