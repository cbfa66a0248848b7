use image::{ImageBuffer, Rgba, RgbaImage};
use qrcode::{EcLevel, QrCode};

use super::RenderError;

const MODULE_PX: u32 = 10;
const QUIET_MODULES: u32 = 5;

/// Rasterize `payload` as a plain black-on-white QR code with a quiet zone.
pub fn render_qr(payload: &str) -> Result<RgbaImage, RenderError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
        .map_err(|e| RenderError::Qr(e.to_string()))?;

    let width = code.width() as u32;
    let total = (width + 2 * QUIET_MODULES) * MODULE_PX;

    let light = Rgba([255, 255, 255, 255]);
    let dark = Rgba([0, 0, 0, 255]);
    let mut img = ImageBuffer::from_pixel(total, total, light);

    for y in 0..width {
        for x in 0..width {
            if !matches!(code[(x as usize, y as usize)], qrcode::Color::Dark) {
                continue;
            }
            let x0 = (x + QUIET_MODULES) * MODULE_PX;
            let y0 = (y + QUIET_MODULES) * MODULE_PX;
            for py in y0..(y0 + MODULE_PX) {
                for px in x0..(x0 + MODULE_PX) {
                    img.put_pixel(px, py, dark);
                }
            }
        }
    }

    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_square_image_with_quiet_zone() {
        let img = render_qr("https://yourdomain.com/verify/abc12345").unwrap();
        assert_eq!(img.width(), img.height());
        // Quiet zone stays light.
        assert_eq!(img.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        // Finder pattern corner module is dark.
        let edge = QUIET_MODULES * MODULE_PX;
        assert_eq!(img.get_pixel(edge, edge), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn different_payloads_differ() {
        let a = render_qr("https://yourdomain.com/verify/aaaaaaaa").unwrap();
        let b = render_qr("https://yourdomain.com/verify/bbbbbbbb").unwrap();
        assert_ne!(a.as_raw(), b.as_raw());
    }
}
