use image::{imageops::FilterType, ImageBuffer, Rgba, RgbaImage};
use rusttype::{point, Font, Scale};
use tracing::warn;

use super::RenderWarning;
use crate::design::DesignSpec;

const TITLE_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const TAGLINE_COLOR: Rgba<u8> = Rgba([221, 221, 221, 255]);
const DETAIL_COLOR: Rgba<u8> = Rgba([238, 238, 238, 255]);

const LOGO_WIDTH_FRAC: f32 = 0.15;
const LOGO_MARGIN_FRAC: f32 = 0.05;

/// Overlay the poster text and optional logo onto the background. Layout is
/// deterministic given the canvas size; missing fonts or a broken logo only
/// degrade the result, they never fail it.
pub fn compose(
    mut img: RgbaImage,
    spec: &DesignSpec,
    font: Option<&Font<'static>>,
    warnings: &mut Vec<RenderWarning>,
) -> RgbaImage {
    let (width, height) = (img.width() as f32, img.height() as f32);

    if let Some(font) = font {
        let title_px = width / 10.0;
        let subtitle_px = width / 20.0;
        let detail_px = width / 30.0;

        let title_y = height * 0.2;
        draw_centered(&mut img, font, title_px, title_y, TITLE_COLOR, &spec.headline());

        if !spec.tagline.is_empty() {
            let tagline_y = title_y + width / 8.0;
            draw_centered(&mut img, font, subtitle_px, tagline_y, TAGLINE_COLOR, &spec.tagline);
        }

        let mut details = Vec::new();
        if !spec.date.is_empty() {
            details.push(format!("\u{1F4C5} {}", spec.date));
        }
        if !spec.time.is_empty() {
            details.push(format!("\u{23F0} {}", spec.time));
        }
        if !spec.venue.is_empty() {
            details.push(format!("\u{1F4CD} {}", spec.venue));
        }

        let mut y = height * 0.7;
        for detail in &details {
            draw_centered(&mut img, font, detail_px, y, DETAIL_COLOR, detail);
            y += width / 25.0;
        }
    }

    if let Some(ref logo_path) = spec.logo_path {
        if let Err(reason) = composite_logo(&mut img, logo_path) {
            warn!("Error adding logo: {}", reason);
            warnings.push(RenderWarning::LogoSkipped { reason });
        }
    }

    img
}

/// Scale the logo to a fixed share of the canvas width and alpha-composite
/// it at the top-right corner.
fn composite_logo(img: &mut RgbaImage, logo_path: &str) -> Result<(), String> {
    let logo = image::open(logo_path)
        .map_err(|e| format!("{}: {}", logo_path, e))?
        .to_rgba8();

    let width = img.width();
    let target_w = ((width as f32) * LOGO_WIDTH_FRAC) as u32;
    if target_w == 0 || logo.width() == 0 {
        return Err("logo or canvas too small".to_string());
    }
    let ratio = target_w as f32 / logo.width() as f32;
    let target_h = ((logo.height() as f32) * ratio).max(1.0) as u32;
    let logo = image::imageops::resize(&logo, target_w, target_h, FilterType::Lanczos3);

    let margin = ((width as f32) * LOGO_MARGIN_FRAC) as u32;
    let x = width.saturating_sub(target_w + margin);
    let y = margin;
    overlay_alpha(img, &logo, x, y);
    Ok(())
}

pub(super) fn text_width(font: &Font<'static>, px: f32, text: &str) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    let scale = Scale::uniform(px);
    let v_metrics = font.v_metrics(scale);
    font.layout(text, scale, point(0.0, v_metrics.ascent))
        .filter_map(|g| g.pixel_bounding_box().map(|bb| bb.max.x as f32))
        .fold(0.0, f32::max)
}

fn draw_centered(
    img: &mut RgbaImage,
    font: &Font<'static>,
    px: f32,
    y: f32,
    color: Rgba<u8>,
    text: &str,
) {
    let w = text_width(font, px, text);
    let x = (img.width() as f32 - w) / 2.0;
    draw_text(img, font, px, x.max(0.0) as i32, y as i32, color, text);
}

/// Glyph rasterization with src-over alpha blending. `y` is the top of the
/// line; rusttype positions at the baseline.
fn draw_text(
    img: &mut RgbaImage,
    font: &Font<'static>,
    px: f32,
    x: i32,
    y: i32,
    color: Rgba<u8>,
    text: &str,
) {
    let scale = Scale::uniform(px);
    let v_metrics = font.v_metrics(scale);
    let baseline_y = y as f32 + v_metrics.ascent;
    let mut caret_x = x as f32;

    for ch in text.chars() {
        let glyph = font
            .glyph(ch)
            .scaled(scale)
            .positioned(point(caret_x, baseline_y));
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = gx as i32 + bb.min.x;
                let py = gy as i32 + bb.min.y;
                if px < 0 || py < 0 {
                    return;
                }
                let (px, py) = (px as u32, py as u32);
                if px >= img.width() || py >= img.height() {
                    return;
                }
                let a = v.clamp(0.0, 1.0);
                if a == 0.0 {
                    return;
                }
                let dst = img.get_pixel_mut(px, py);
                let inv = 1.0 - a;
                dst.0[0] = (color.0[0] as f32 * a + dst.0[0] as f32 * inv) as u8;
                dst.0[1] = (color.0[1] as f32 * a + dst.0[1] as f32 * inv) as u8;
                dst.0[2] = (color.0[2] as f32 * a + dst.0[2] as f32 * inv) as u8;
                dst.0[3] = 255;
            });
        }
        caret_x += glyph.unpositioned().h_metrics().advance_width;
    }
}

pub(super) fn overlay_alpha(
    base: &mut RgbaImage,
    over: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    x: u32,
    y: u32,
) {
    for oy in 0..over.height() {
        for ox in 0..over.width() {
            let p = over.get_pixel(ox, oy);
            let a = p.0[3] as f32 / 255.0;
            if a <= 0.0 {
                continue;
            }
            let bx = x + ox;
            let by = y + oy;
            if bx >= base.width() || by >= base.height() {
                continue;
            }
            let dst = base.get_pixel_mut(bx, by);
            let inv = 1.0 - a;
            dst.0[0] = (p.0[0] as f32 * a + dst.0[0] as f32 * inv) as u8;
            dst.0[1] = (p.0[1] as f32 * a + dst.0[1] as f32 * inv) as u8;
            dst.0[2] = (p.0[2] as f32 * a + dst.0[2] as f32 * inv) as u8;
            dst.0[3] = 255;
        }
    }
}
