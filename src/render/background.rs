use image::{ImageBuffer, RgbaImage};
use reqwest::Client;
use tracing::{info, warn};

use super::RenderWarning;
use crate::design::{parse_hex_color, DesignSpec};

/// Fallback canvas edge when no background image can be fetched.
pub const FALLBACK_CANVAS_SIZE: u32 = 1024;

/// Build the image-generation request URL from the interpreted spec.
/// Pollinations takes the whole description in the path, URL-encoded.
pub fn describe(spec: &DesignSpec) -> String {
    let theme = if spec.theme.is_empty() {
        "abstract"
    } else {
        &spec.theme
    };
    let phrase = format!(
        "{} background in {} colors, high quality, 4k, without text",
        theme, spec.colors.primary
    );
    format!(
        "https://image.pollinations.ai/prompt/{}?nologo=true",
        urlencoding::encode(&phrase)
    )
}

fn flat_canvas(spec: &DesignSpec) -> RgbaImage {
    let color = parse_hex_color(&spec.colors.primary)
        .unwrap_or_else(|| parse_hex_color("#1a2a6c").unwrap());
    ImageBuffer::from_pixel(FALLBACK_CANVAS_SIZE, FALLBACK_CANVAS_SIZE, color)
}

/// Download and decode the background, or fall back to a flat canvas in the
/// primary color. Every fallback decision is recorded as a warning.
pub async fn fetch_or_fallback(
    http: &Client,
    image_ref: &str,
    spec: &DesignSpec,
    warnings: &mut Vec<RenderWarning>,
) -> RgbaImage {
    match fetch(http, image_ref).await {
        Ok(img) => img,
        Err(reason) => {
            warn!("Background fetch failed ({}). Using fallback color.", reason);
            warnings.push(RenderWarning::BackgroundFallback { reason });
            flat_canvas(spec)
        }
    }
}

async fn fetch(http: &Client, image_ref: &str) -> Result<RgbaImage, String> {
    if !image_ref.starts_with("http") {
        return Err(format!("not an http reference: {}", image_ref));
    }

    info!("Downloading background from: {}", image_ref);
    let response = http
        .get(image_ref)
        .send()
        .await
        .map_err(|e| format!("request failed: {}", e))?
        .error_for_status()
        .map_err(|e| format!("bad status: {}", e))?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("body read failed: {}", e))?;

    let img = image::load_from_memory(&bytes).map_err(|e| format!("not a decodable image: {}", e))?;
    Ok(img.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_encodes_theme_and_primary() {
        let spec = DesignSpec::demo("English");
        let url = describe(&spec);
        assert!(url.starts_with("https://image.pollinations.ai/prompt/"));
        assert!(url.ends_with("?nologo=true"));
        assert!(url.contains("Modern%20Professional"));
        assert!(url.contains("%231a2a6c"));
    }

    #[test]
    fn describe_falls_back_to_abstract_theme() {
        let mut spec = DesignSpec::demo("English");
        spec.theme.clear();
        assert!(describe(&spec).contains("abstract%20background"));
    }

    #[tokio::test]
    async fn non_http_reference_takes_fallback() {
        let http = Client::new();
        let spec = DesignSpec::demo("English");
        let mut warnings = Vec::new();

        let img = fetch_or_fallback(&http, "none", &spec, &mut warnings).await;
        assert_eq!(img.dimensions(), (FALLBACK_CANVAS_SIZE, FALLBACK_CANVAS_SIZE));
        // #1a2a6c
        assert_eq!(img.get_pixel(0, 0).0, [26, 42, 108, 255]);
        assert!(matches!(
            warnings.as_slice(),
            [RenderWarning::BackgroundFallback { .. }]
        ));
    }

    #[tokio::test]
    async fn unreachable_url_takes_fallback() {
        let http = Client::new();
        let spec = DesignSpec::demo("English");
        let mut warnings = Vec::new();

        let img = fetch_or_fallback(&http, "http://127.0.0.1:9/bg.png", &spec, &mut warnings).await;
        assert_eq!(img.dimensions(), (FALLBACK_CANVAS_SIZE, FALLBACK_CANVAS_SIZE));
        assert_eq!(warnings.len(), 1);
    }
}
