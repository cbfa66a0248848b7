use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Rgb,
};
use rusttype::Font;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use super::{poster, RenderError};
use crate::design::{parse_hex_rgb_f32, DesignSpec};

const PT_TO_MM: f64 = 0.352_777_8;
const PAGE_W_MM: f64 = 297.0;
const PAGE_H_MM: f64 = 210.0;
const EMBED_DPI: f64 = 300.0;

const BORDER_INSET_PT: f64 = 20.0;
const BORDER_WIDTH_PT: f64 = 5.0;

const QR_SIZE_PT: f64 = 80.0;
const QR_X_FROM_RIGHT_PT: f64 = 120.0;
const QR_Y_PT: f64 = 50.0;
const CAPTION_Y_PT: f64 = 40.0;

/// Landscape A4 certificate: the poster stretched full-bleed as background,
/// an accent border, four centered text lines, and the QR at bottom-right.
pub fn generate(
    spec: &DesignSpec,
    poster_path: &Path,
    qr_path: &Path,
    cert_id: &str,
    output_path: &Path,
    metrics_font: Option<&Font<'static>>,
) -> Result<(), RenderError> {
    let (doc, page, layer) =
        PdfDocument::new("Certificate", Mm(PAGE_W_MM as f32), Mm(PAGE_H_MM as f32), "Layer 1");
    let layer = doc.get_page(page).get_layer(layer);

    embed_png(&layer, poster_path, Mm(0.0), Mm(0.0), Some((PAGE_W_MM, PAGE_H_MM)))?;
    draw_border(&layer, &spec.colors.accent);

    let helvetica = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    let helvetica_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;

    let primary = parse_hex_rgb_f32(&spec.colors.primary).unwrap_or((0.1, 0.16, 0.42));
    let secondary = parse_hex_rgb_f32(&spec.colors.secondary).unwrap_or((0.7, 0.12, 0.12));
    let black = (0.0, 0.0, 0.0);

    set_fill(&layer, primary);
    draw_centered(&layer, &spec.title.to_uppercase(), 40.0, from_top(150.0), &helvetica_bold, metrics_font);

    set_fill(&layer, black);
    draw_centered(&layer, "This is to certify that", 20.0, from_top(220.0), &helvetica, metrics_font);

    set_fill(&layer, secondary);
    draw_centered(&layer, &spec.name, 50.0, from_top(300.0), &helvetica_bold, metrics_font);

    set_fill(&layer, black);
    draw_centered(
        &layer,
        &format!("has successfully participated in {}", spec.event),
        18.0,
        from_top(360.0),
        &helvetica,
        metrics_font,
    );

    let qr_x = PAGE_W_MM - QR_X_FROM_RIGHT_PT * PT_TO_MM;
    let qr_edge = QR_SIZE_PT * PT_TO_MM;
    embed_png(
        &layer,
        qr_path,
        Mm(qr_x as f32),
        Mm((QR_Y_PT * PT_TO_MM) as f32),
        Some((qr_edge, qr_edge)),
    )?;

    set_fill(&layer, black);
    layer.use_text(
        format!("Verify: {}", cert_id),
        8.0,
        Mm(qr_x as f32),
        Mm((CAPTION_Y_PT * PT_TO_MM) as f32),
        &helvetica,
    );

    doc.save(&mut BufWriter::new(File::create(output_path)?))
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    Ok(())
}

fn from_top(offset_pt: f64) -> Mm {
    Mm((PAGE_H_MM - offset_pt * PT_TO_MM) as f32)
}

fn set_fill(layer: &PdfLayerReference, (r, g, b): (f32, f32, f32)) {
    layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
}

fn draw_border(layer: &PdfLayerReference, accent: &str) {
    let (r, g, b) = parse_hex_rgb_f32(accent).unwrap_or((0.99, 0.73, 0.18));
    let inset = BORDER_INSET_PT * PT_TO_MM;
    let points = vec![
        (Point::new(Mm(inset as f32), Mm(inset as f32)), false),
        (Point::new(Mm((PAGE_W_MM - inset) as f32), Mm(inset as f32)), false),
        (Point::new(Mm((PAGE_W_MM - inset) as f32), Mm((PAGE_H_MM - inset) as f32)), false),
        (Point::new(Mm(inset as f32), Mm((PAGE_H_MM - inset) as f32)), false),
    ];
    layer.set_outline_color(Color::Rgb(Rgb::new(r, g, b, None)));
    layer.set_outline_thickness(BORDER_WIDTH_PT as f32);
    layer.add_line(Line {
        points,
        is_closed: true,
    });
}

/// Place a PNG on the layer, optionally scaled to an exact size in mm.
fn embed_png(
    layer: &PdfLayerReference,
    path: &Path,
    x: Mm,
    y: Mm,
    target_mm: Option<(f64, f64)>,
) -> Result<(), RenderError> {
    let mut file = File::open(path)?;
    let decoder =
        PngDecoder::new(&mut file).map_err(|e| RenderError::Image(e.to_string()))?;
    let img = Image::try_from(decoder).map_err(|e| RenderError::Image(e.to_string()))?;

    let native_w_mm = img.image.width.0 as f64 * 25.4 / EMBED_DPI;
    let native_h_mm = img.image.height.0 as f64 * 25.4 / EMBED_DPI;
    let (scale_x, scale_y) = match target_mm {
        Some((w, h)) => (w / native_w_mm, h / native_h_mm),
        None => (1.0, 1.0),
    };

    img.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(x),
            translate_y: Some(y),
            scale_x: Some(scale_x as f32),
            scale_y: Some(scale_y as f32),
            dpi: Some(EMBED_DPI as f32),
            ..Default::default()
        },
    );
    Ok(())
}

/// Line width used for horizontal centering. With a platform font we measure
/// real glyphs; the Helvetica fallback uses a rough average glyph width.
fn text_width_mm(text: &str, size_pt: f64, metrics_font: Option<&Font<'static>>) -> f64 {
    match metrics_font {
        Some(font) => poster::text_width(font, size_pt as f32, text) as f64 * PT_TO_MM,
        None => text.chars().count() as f64 * size_pt * 0.5 * PT_TO_MM,
    }
}

fn draw_centered(
    layer: &PdfLayerReference,
    text: &str,
    size_pt: f64,
    y: Mm,
    font: &IndirectFontRef,
    metrics_font: Option<&Font<'static>>,
) {
    if text.is_empty() {
        return;
    }
    let w = text_width_mm(text, size_pt, metrics_font);
    let x = ((PAGE_W_MM - w) / 2.0).max(0.0);
    layer.use_text(text, size_pt as f32, Mm(x as f32), y, font);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb as ImgRgb, RgbImage};

    #[test]
    fn produces_a_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        let poster_path = dir.path().join("poster_test1234.png");
        let qr_path = dir.path().join("qr_test1234.png");
        let cert_path = dir.path().join("cert_test1234.pdf");

        let poster: RgbImage = ImageBuffer::from_pixel(64, 64, ImgRgb([26, 42, 108]));
        poster.save(&poster_path).unwrap();
        let qr: RgbImage = ImageBuffer::from_pixel(32, 32, ImgRgb([0, 0, 0]));
        qr.save(&qr_path).unwrap();

        let spec = DesignSpec::demo("English");
        generate(&spec, &poster_path, &qr_path, "test1234", &cert_path, None).unwrap();

        let bytes = std::fs::read(&cert_path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn width_estimate_scales_with_text() {
        let short = text_width_mm("abc", 20.0, None);
        let long = text_width_mm("abcdef", 20.0, None);
        assert!(long > short);
    }
}
