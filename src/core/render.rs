use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{imageops::FilterType, Rgba, RgbaImage};
use resvg::tiny_skia;

use crate::core::layout::{cta_colors, resolve_typography, ResolvedTypography, TextRole};
use crate::domain::image::ImagePayload;
use crate::domain::model::{AdComposition, CanvasSize, Theme};
use crate::utils::error::{AdForgeError, Result};

const PADDING: f32 = 100.0;
const COLUMN_MAX_WIDTH: f32 = 1500.0;
const SUBHEADLINE_MAX_WIDTH: f32 = 1200.0;
const BLOCK_GAP: f32 = 35.0;
const CTA_TOP_GAP: f32 = 30.0;
const CTA_PADDING_X: f32 = 70.0;
const CTA_PADDING_Y: f32 = 25.0;
const CTA_ICON_GAP: f32 = 20.0;
const CTA_ICON_SIZE: f32 = 30.0;
const BADGE_LABEL: &str = "MARKET INTELLIGENCE REPORT";
const BUSY_LABEL: &str = "RENDERING ASSET";
const ACCENT_YELLOW: &str = "#eab308";
const CANVAS_FILL: [u8; 4] = [0x18, 0x18, 0x1b, 0xff];
const BUSY_IMAGE_OPACITY: f32 = 0.2;
const MAX_DIM: u32 = 16_384;

/// Average glyph advance, in em, used for line wrapping.
const ADVANCE_EM: f32 = 0.54;
const UPPERCASE_ADVANCE_EM: f32 = 0.66;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Output pixels per logical canvas pixel.
    pub scale: f32,
    /// Draw the in-progress overlay and dim the background.
    pub busy: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            busy: false,
        }
    }
}

/// Rasterizes an [`AdComposition`] to PNG.
#[derive(Clone)]
pub struct AdRenderer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl AdRenderer {
    /// System fonts plus any `.ttf`/`.otf`/`.ttc` files in `fonts_dir`.
    pub fn new(fonts_dir: Option<&Path>) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if let Some(dir) = fonts_dir {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!("Loaded {} font faces", db.faces().count());
        Self {
            fontdb: Arc::new(db),
        }
    }

    pub fn render_png(
        &self,
        composition: &AdComposition,
        background: Option<&ImagePayload>,
        options: RenderOptions,
    ) -> Result<Vec<u8>> {
        let canvas = composition.aspect_ratio.canvas();
        let (width, height) = output_size(canvas, options.scale)?;
        tracing::debug!(
            "Rendering {} composition at {}x{} (scale {})",
            composition.aspect_ratio,
            width,
            height,
            options.scale
        );

        let mut base = RgbaImage::from_pixel(width, height, Rgba(CANVAS_FILL));
        if let Some(payload) = background {
            let decoded = image::load_from_memory(&payload.bytes)?;
            let mut cover = decoded
                .resize_to_fill(width, height, FilterType::Triangle)
                .to_rgba8();
            if options.busy {
                for px in cover.pixels_mut() {
                    px[3] = (f32::from(px[3]) * BUSY_IMAGE_OPACITY).round() as u8;
                }
            }
            image::imageops::overlay(&mut base, &cover, 0, 0);
        }

        let svg = compose_svg(composition, background.is_some(), options.busy);
        let tree_options = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &tree_options).map_err(|e| {
            AdForgeError::RenderError {
                message: format!("Failed to build layout tree: {}", e),
            }
        })?;

        let mut pixmap =
            tiny_skia::Pixmap::new(width, height).ok_or_else(|| AdForgeError::RenderError {
                message: format!("Failed to allocate {}x{} pixmap", width, height),
            })?;
        // The canvas fill is opaque, so straight and premultiplied RGBA agree.
        pixmap.data_mut().copy_from_slice(base.as_raw());
        resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(options.scale, options.scale),
            &mut pixmap.as_mut(),
        );

        let output = RgbaImage::from_raw(width, height, pixmap.take()).ok_or_else(|| {
            AdForgeError::RenderError {
                message: "Pixmap size does not match output buffer".to_string(),
            }
        })?;
        let mut png = Vec::new();
        output.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
        Ok(png)
    }
}

fn output_size(canvas: CanvasSize, scale: f32) -> Result<(u32, u32)> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(AdForgeError::RenderError {
            message: format!("Invalid render scale {}", scale),
        });
    }
    let width = (canvas.width as f32 * scale).round().max(1.0) as u32;
    let height = (canvas.height as f32 * scale).round().max(1.0) as u32;
    if width > MAX_DIM || height > MAX_DIM {
        return Err(AdForgeError::RenderError {
            message: format!("Output size too large: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"),
        });
    }
    Ok((width, height))
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        tracing::warn!("Fonts directory {} is not readable", dir.display());
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        if !matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc") {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!("Skipping font {}: {}", path.display(), e);
        }
    }
}

/// Build the overlay layer (everything above the background photo) as SVG in logical pixels.
pub fn compose_svg(composition: &AdComposition, has_background: bool, busy: bool) -> String {
    let canvas = composition.aspect_ratio.canvas();
    let (w, h) = (canvas.width as f32, canvas.height as f32);
    let mut svg = String::with_capacity(4096);

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    ));
    svg.push_str(&defs(composition.theme));

    if !has_background {
        svg.push_str(&format!(
            r#"<rect width="{w}" height="{h}" fill="url(#theme-fill)"/>"#
        ));
    }
    svg.push_str(&format!(
        r#"<rect width="{w}" height="{h}" fill="url(#fade-up)"/><rect width="{w}" height="{h}" fill="url(#fade-right)"/>"#
    ));

    push_copy_column(&mut svg, composition, w, h);

    if composition.show_badge {
        push_badge(&mut svg);
    }
    if busy {
        push_busy_overlay(&mut svg, w, h);
    }

    svg.push_str("</svg>");
    svg
}

fn defs(theme: Theme) -> String {
    let (from, to) = match theme {
        Theme::Dark => ("#27272a", "#000000"),
        Theme::Gold => ("#b45309", "#000000"),
        Theme::Minimal => ("#3f3f46", "#18181b"),
    };
    format!(
        concat!(
            "<defs>",
            r#"<linearGradient id="theme-fill" x1="0" y1="0" x2="1" y2="1"><stop offset="0" stop-color="{from}"/><stop offset="1" stop-color="{to}"/></linearGradient>"#,
            r##"<linearGradient id="fade-up" x1="0" y1="1" x2="0" y2="0"><stop offset="0" stop-color="#000" stop-opacity="1"/><stop offset="0.5" stop-color="#000" stop-opacity="0.3"/><stop offset="1" stop-color="#000" stop-opacity="0"/></linearGradient>"##,
            r##"<linearGradient id="fade-right" x1="0" y1="0" x2="1" y2="0"><stop offset="0" stop-color="#000" stop-opacity="0.8"/><stop offset="0.5" stop-color="#000" stop-opacity="0.2"/><stop offset="1" stop-color="#000" stop-opacity="0"/></linearGradient>"##,
            r##"<filter id="shadow-lg" x="-10%" y="-10%" width="120%" height="140%"><feDropShadow dx="0" dy="10" stdDeviation="5" flood-color="#000" flood-opacity="0.8"/></filter>"##,
            r##"<filter id="shadow-sm" x="-10%" y="-10%" width="120%" height="140%"><feDropShadow dx="0" dy="5" stdDeviation="2.5" flood-color="#000" flood-opacity="0.5"/></filter>"##,
            "</defs>"
        ),
        from = from,
        to = to
    )
}

/// Headline, subheadline and CTA stacked against the bottom edge.
fn push_copy_column(svg: &mut String, composition: &AdComposition, w: f32, h: f32) {
    let column_width = COLUMN_MAX_WIDTH.min(w - 2.0 * PADDING);

    let headline = resolve_typography(TextRole::Headline, &composition.headline_style);
    let headline_text = composition.headline.to_uppercase();
    let headline_lines = wrap_text(
        &headline_text,
        column_width,
        headline.font_size,
        UPPERCASE_ADVANCE_EM,
        -0.025,
    );

    let sub = resolve_typography(TextRole::Subheadline, &composition.subheadline_style);
    let sub_lines = wrap_text(
        &composition.subheadline,
        SUBHEADLINE_MAX_WIDTH.min(column_width),
        sub.font_size,
        ADVANCE_EM,
        0.0,
    );

    let cta = resolve_typography(TextRole::Cta, &composition.cta_style);
    let cta_label = composition.cta.to_uppercase();
    let label_width = estimate_width(&cta_label, cta.font_size, UPPERCASE_ADVANCE_EM, 0.1);
    let button_width = 2.0 * CTA_PADDING_X + label_width + CTA_ICON_GAP + CTA_ICON_SIZE;
    let button_height = 2.0 * CTA_PADDING_Y + cta.line_box().max(CTA_ICON_SIZE);

    let headline_height = headline_lines.len() as f32 * headline.line_box();
    let sub_height = sub_lines.len() as f32 * sub.line_box();
    let block_height =
        headline_height + BLOCK_GAP + sub_height + BLOCK_GAP + CTA_TOP_GAP + button_height;

    let mut y = h - PADDING - block_height;
    push_text_lines(svg, &headline_lines, &headline, PADDING, y, -0.025, "shadow-lg");
    y += headline_height + BLOCK_GAP;
    push_text_lines(svg, &sub_lines, &sub, PADDING, y, 0.0, "shadow-sm");
    y += sub_height + BLOCK_GAP + CTA_TOP_GAP;

    let colors = cta_colors(&composition.cta_style);
    svg.push_str(&format!(
        r#"<rect x="{PADDING}" y="{y}" width="{button_width}" height="{button_height}" fill="{}"/>"#,
        colors.background
    ));
    let label_baseline = y + CTA_PADDING_Y + baseline_offset(&cta);
    svg.push_str(&format!(
        r#"<text x="{}" y="{label_baseline}" font-family="{}" font-size="{}" font-weight="{}" letter-spacing="{}" fill="{}">{}</text>"#,
        PADDING + CTA_PADDING_X,
        escape_xml(&cta.font_family_css()),
        cta.font_size,
        cta.weight,
        cta.font_size * 0.1,
        colors.text,
        escape_xml(&cta_label)
    ));
    let icon_x = PADDING + CTA_PADDING_X + label_width + CTA_ICON_GAP;
    let icon_y = y + (button_height - CTA_ICON_SIZE) / 2.0;
    svg.push_str(&format!(
        r#"<path d="M14 5l7 7m0 0l-7 7m7-7H3" transform="translate({icon_x} {icon_y}) scale({})" fill="none" stroke="{}" stroke-width="3" stroke-linecap="round" stroke-linejoin="round"/>"#,
        CTA_ICON_SIZE / 24.0,
        colors.text
    ));
}

fn push_text_lines(
    svg: &mut String,
    lines: &[String],
    typo: &ResolvedTypography,
    x: f32,
    top: f32,
    tracking_em: f32,
    filter: &str,
) {
    if lines.is_empty() {
        return;
    }
    svg.push_str(&format!(
        r#"<g filter="url(#{filter})" font-family="{}" font-size="{}" font-weight="{}" letter-spacing="{}" fill="{}">"#,
        escape_xml(&typo.font_family_css()),
        typo.font_size,
        typo.weight,
        typo.font_size * tracking_em,
        typo.color
    ));
    for (i, line) in lines.iter().enumerate() {
        let baseline = top + i as f32 * typo.line_box() + baseline_offset(typo);
        svg.push_str(&format!(
            r#"<text x="{x}" y="{baseline}">{}</text>"#,
            escape_xml(line)
        ));
    }
    svg.push_str("</g>");
}

/// Distance from a line box's top to the text baseline.
fn baseline_offset(typo: &ResolvedTypography) -> f32 {
    (typo.line_box() - typo.font_size) / 2.0 + typo.font_size * 0.8
}

fn push_badge(svg: &mut String) {
    const X: f32 = 60.0;
    const Y: f32 = 60.0;
    const PAD_X: f32 = 35.0;
    const PAD_Y: f32 = 15.0;
    const DOT: f32 = 10.0;
    const GAP: f32 = 15.0;
    const FONT_SIZE: f32 = 20.0;

    let label_width = estimate_width(BADGE_LABEL, FONT_SIZE, UPPERCASE_ADVANCE_EM, 0.2);
    let height = 2.0 * PAD_Y + FONT_SIZE * 1.4;
    let width = 2.0 * PAD_X + DOT + GAP + label_width;
    svg.push_str(&format!(
        r##"<rect x="{X}" y="{Y}" width="{width}" height="{height}" rx="{}" fill="#000" fill-opacity="0.6" stroke="#fff" stroke-opacity="0.2" stroke-width="1"/>"##,
        height / 2.0
    ));
    svg.push_str(&format!(
        r#"<circle cx="{}" cy="{}" r="{}" fill="{ACCENT_YELLOW}"/>"#,
        X + PAD_X + DOT / 2.0,
        Y + height / 2.0,
        DOT / 2.0
    ));
    svg.push_str(&format!(
        r##"<text x="{}" y="{}" font-family="'Inter', sans-serif" font-size="{FONT_SIZE}" font-weight="900" letter-spacing="{}" fill="#fff">{BADGE_LABEL}</text>"##,
        X + PAD_X + DOT + GAP,
        Y + height / 2.0 + FONT_SIZE * 0.35,
        FONT_SIZE * 0.2
    ));
}

fn push_busy_overlay(svg: &mut String, w: f32, h: f32) {
    const RING: f32 = 100.0;
    const STROKE: f32 = 10.0;
    const FONT_SIZE: f32 = 36.0;

    let group_height = RING + 30.0 + FONT_SIZE * 1.5;
    let top = (h - group_height) / 2.0;
    let cx = w / 2.0;
    let cy = top + RING / 2.0;
    let r = (RING - STROKE) / 2.0;

    svg.push_str(&format!(
        r##"<rect width="{w}" height="{h}" fill="#000" fill-opacity="0.8"/>"##
    ));
    svg.push_str(&format!(
        r#"<circle cx="{cx}" cy="{cy}" r="{r}" fill="none" stroke="{ACCENT_YELLOW}" stroke-opacity="0.2" stroke-width="{STROKE}"/>"#
    ));
    // Quarter arc for the spinner head.
    svg.push_str(&format!(
        r#"<path d="M{} {} A{r} {r} 0 0 1 {} {}" fill="none" stroke="{ACCENT_YELLOW}" stroke-width="{STROKE}"/>"#,
        cx,
        cy - r,
        cx + r,
        cy
    ));
    svg.push_str(&format!(
        r#"<text x="{cx}" y="{}" text-anchor="middle" font-family="'Inter', sans-serif" font-size="{FONT_SIZE}" font-weight="900" letter-spacing="{}" fill="{ACCENT_YELLOW}">{BUSY_LABEL}</text>"#,
        top + RING + 30.0 + FONT_SIZE * 1.1,
        FONT_SIZE * 0.2
    ));
}

fn estimate_width(text: &str, font_size: f32, advance_em: f32, tracking_em: f32) -> f32 {
    text.chars().count() as f32 * font_size * (advance_em + tracking_em)
}

/// Greedy word wrap against an estimated advance width.
///
/// A single word wider than `max_width` keeps its own line.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    font_size: f32,
    advance_em: f32,
    tracking_em: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if current.is_empty()
                || estimate_width(&candidate, font_size, advance_em, tracking_em) <= max_width
            {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Escape markup and drop characters XML 1.0 does not allow.
fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\t' | '\n' | '\r' => out.push(c),
            '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => {}
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::AspectRatio;

    fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> ImagePayload {
        let img = RgbaImage::from_pixel(width, height, Rgba(rgba));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        ImagePayload::png(buf)
    }

    #[test]
    fn test_wrap_text_breaks_on_width() {
        let lines = wrap_text("one two three four five six", 200.0, 20.0, 0.5, 0.0);
        // 10 px per char: "one two three four" is 180 px, adding " five" exceeds 200.
        assert_eq!(lines, vec!["one two three four", "five six"]);
        assert!(lines
            .iter()
            .all(|l| estimate_width(l, 20.0, 0.5, 0.0) <= 200.0));
    }

    #[test]
    fn test_wrap_text_keeps_long_words_whole() {
        let lines = wrap_text("supercalifragilistic ok", 50.0, 20.0, 0.5, 0.0);
        assert_eq!(lines, vec!["supercalifragilistic", "ok"]);
        assert!(wrap_text("   ", 100.0, 20.0, 0.5, 0.0).is_empty());
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("A & B <C>"), "A &amp; B &lt;C&gt;");
        assert_eq!(escape_xml("Gold\u{8} rush\u{0}\u{ffff}"), "Gold rush");
        assert_eq!(escape_xml("a\tb"), "a\tb");
    }

    #[test]
    fn test_render_png_tolerates_control_characters_in_copy() {
        let renderer = AdRenderer::new(None);
        let comp = AdComposition {
            headline: "Gold\u{8} rush".to_string(),
            subheadline: "Line\u{1b}[0m feed".to_string(),
            cta: "Buy\u{7} now".to_string(),
            ..AdComposition::default()
        };

        let svg = compose_svg(&comp, false, false);
        assert!(!svg.contains('\u{8}'));
        assert!(svg.contains("GOLD RUSH"));

        let png = renderer
            .render_png(
                &comp,
                None,
                RenderOptions {
                    scale: 0.25,
                    busy: false,
                },
            )
            .unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 480);
    }

    #[test]
    fn test_compose_svg_contents() {
        let mut comp = AdComposition {
            headline: "Gold & Silver".to_string(),
            show_badge: true,
            ..AdComposition::default()
        };
        let svg = compose_svg(&comp, false, false);
        assert!(svg.contains("GOLD &amp; SILVER"));
        assert!(svg.contains(BADGE_LABEL));
        assert!(svg.contains("url(#theme-fill)"));
        assert!(!svg.contains(BUSY_LABEL));

        comp.show_badge = false;
        let svg = compose_svg(&comp, true, true);
        assert!(!svg.contains(BADGE_LABEL));
        assert!(!svg.contains(r#"fill="url(#theme-fill)""#));
        assert!(svg.contains(BUSY_LABEL));
    }

    #[test]
    fn test_compose_svg_is_parseable() {
        let svg = compose_svg(&AdComposition::default(), false, true);
        let tree = usvg::Tree::from_str(&svg, &usvg::Options::default()).unwrap();
        assert_eq!(tree.size().width(), 1920.0);
        assert_eq!(tree.size().height(), 1080.0);
    }

    #[test]
    fn test_output_size_rejects_bad_scale() {
        let canvas = AspectRatio::Square.canvas();
        assert!(output_size(canvas, 0.0).is_err());
        assert!(output_size(canvas, 100.0).is_err());
        assert_eq!(output_size(canvas, 0.5).unwrap(), (960, 960));
    }

    #[test]
    fn test_render_png_dimensions_follow_ratio_and_scale() {
        let renderer = AdRenderer::new(None);
        let comp = AdComposition {
            aspect_ratio: AspectRatio::Ultrawide21x9,
            ..AdComposition::default()
        };
        let png = renderer
            .render_png(
                &comp,
                None,
                RenderOptions {
                    scale: 0.5,
                    busy: false,
                },
            )
            .unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 960);
        assert_eq!(decoded.height(), 412);
    }

    #[test]
    fn test_render_png_uses_background_image() {
        let renderer = AdRenderer::new(None);
        let comp = AdComposition {
            headline: String::new(),
            subheadline: String::new(),
            ..AdComposition::default()
        };
        let background = solid_png(64, 36, [255, 255, 255, 255]);
        let png = renderer
            .render_png(
                &comp,
                Some(&background),
                RenderOptions {
                    scale: 0.25,
                    busy: false,
                },
            )
            .unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        // Top-right corner sits outside both fades' dark stops.
        let corner = decoded.get_pixel(decoded.width() - 1, 0);
        assert!(corner[0] > 200, "{:?}", corner);
        assert_eq!(corner[3], 255);
    }

    #[test]
    fn test_busy_render_dims_background() {
        let renderer = AdRenderer::new(None);
        let comp = AdComposition::default();
        let background = solid_png(16, 9, [255, 255, 255, 255]);
        let options = |busy| RenderOptions { scale: 0.1, busy };

        let idle = renderer
            .render_png(&comp, Some(&background), options(false))
            .unwrap();
        let busy = renderer
            .render_png(&comp, Some(&background), options(true))
            .unwrap();
        let idle = image::load_from_memory(&idle).unwrap().to_rgba8();
        let busy = image::load_from_memory(&busy).unwrap().to_rgba8();
        let x = idle.width() - 1;
        assert!(busy.get_pixel(x, 0)[0] < idle.get_pixel(x, 0)[0]);
    }

    #[test]
    fn test_render_png_rejects_undecodable_background() {
        let renderer = AdRenderer::new(None);
        let bogus = ImagePayload::png(vec![0, 1, 2, 3]);
        let result = renderer.render_png(
            &AdComposition::default(),
            Some(&bogus),
            RenderOptions::default(),
        );
        assert!(result.is_err());
    }
}
