use crate::config::RenderConfig;
use crate::layout::{Layout, Primitive, StyleClass};
use crate::theme::{Style, Theme};
use anyhow::Result;
use std::path::Path;

/// Serialises a layout to SVG. `size` is the outer width/height (after any aspect-ratio
/// adjustment); the `viewBox` always covers the natural layout size.
pub fn render_svg(layout: &Layout, theme: &Theme, size: (u32, u32)) -> String {
    let mut svg = String::new();
    let (width, height) = size;

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {} {}\" preserveAspectRatio=\"xMidYMid meet\">",
        layout.width, layout.height
    ));
    svg.push_str(&format!("<defs><style>{}</style></defs>", style_sheet(theme)));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(&theme.background)
    ));

    for primitive in &layout.primitives {
        svg.push_str(&primitive_svg(primitive));
    }

    svg.push_str("</svg>");
    svg
}

fn style_sheet(theme: &Theme) -> String {
    let mut css = String::new();
    for class in StyleClass::ALL {
        css.push_str(&format!(".{} {{ {} }}\n", class.as_str(), style_rule(&theme.style(class), theme)));
    }
    css
}

fn style_rule(style: &Style, theme: &Theme) -> String {
    let mut rule = format!("fill: {};", escape_xml(&style.fill));
    if let Some(stroke) = &style.stroke {
        rule.push_str(&format!(" stroke: {}; stroke-width: {};", escape_xml(stroke), style.stroke_width));
    }
    if let Some(dash) = style.dasharray {
        rule.push_str(&format!(" stroke-dasharray: {dash};"));
    }
    if let Some(size) = style.font_size {
        rule.push_str(&format!(
            " font-family: {}; font-size: {size}px;",
            escape_xml(&theme.font_family)
        ));
    }
    if let Some(weight) = style.font_weight {
        rule.push_str(&format!(" font-weight: {weight};"));
    }
    if let Some(anchor) = style.text_anchor {
        rule.push_str(&format!(" text-anchor: {};", anchor.as_str()));
    }
    rule
}

fn primitive_svg(primitive: &Primitive) -> String {
    let class = primitive.class().as_str();
    match primitive {
        Primitive::Rect {
            x,
            y,
            width,
            height,
            rx,
            ..
        } => {
            let corner = if *rx > 0.0 {
                format!(" rx=\"{rx:.2}\"")
            } else {
                String::new()
            };
            format!(
                "<rect class=\"{class}\" x=\"{x:.2}\" y=\"{y:.2}\" width=\"{width:.2}\" height=\"{height:.2}\"{corner}/>"
            )
        }
        Primitive::Line { x1, y1, x2, y2, .. } => format!(
            "<line class=\"{class}\" x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\"/>"
        ),
        Primitive::Polyline { points, .. } => format!(
            "<polyline class=\"{class}\" points=\"{}\"/>",
            points_attr(points)
        ),
        Primitive::Polygon { points, .. } => format!(
            "<polygon class=\"{class}\" points=\"{}\"/>",
            points_attr(points)
        ),
        Primitive::Text {
            x, y, text, anchor, ..
        } => format!(
            "<text class=\"{class}\" x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"{}\">{}</text>",
            anchor.as_str(),
            escape_xml(text)
        ),
    }
}

fn points_attr(points: &[(f32, f32)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{x:.2},{y:.2}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

/// Pixel size and scale factor that fit `natural` inside the configured bounds.
#[cfg_attr(not(feature = "png"), allow(dead_code))]
pub(crate) fn raster_size(natural: (f32, f32), render_cfg: &RenderConfig) -> Result<(u32, u32, f32)> {
    let (max_w, max_h) = (render_cfg.width, render_cfg.height);
    if !(max_w.is_finite() && max_h.is_finite() && max_w >= 1.0 && max_h >= 1.0) {
        anyhow::bail!("invalid render size {max_w}x{max_h}");
    }
    let (width, height) = natural;
    if width <= 0.0 || height <= 0.0 {
        anyhow::bail!("diagram has no area ({width}x{height})");
    }
    let scale = (max_w / width).min(max_h / height);
    let pixels = |side: f32| ((side * scale).round() as u32).max(1);
    Ok((pixels(width), pixels(height), scale))
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Arial".to_string();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let natural = tree.size();
    let (width, height, scale) = raster_size((natural.width(), natural.height()), render_cfg)?;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap_mut,
    );
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    anyhow::bail!("PNG output requires the `png` feature")
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
