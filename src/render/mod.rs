pub mod background;
mod certificate;
mod fonts;
mod poster;
mod qr;

use image::DynamicImage;
use reqwest::Client;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::design::DesignSpec;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(String),
    #[error("qr error: {0}")]
    Qr(String),
    #[error("pdf error: {0}")]
    Pdf(String),
}

/// Degraded-mode decision taken during rendering. Surfaced in the response
/// payload so callers (and tests) can see which path was taken.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderWarning {
    BackgroundFallback { reason: String },
    LogoSkipped { reason: String },
    FontUnavailable,
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderWarning::BackgroundFallback { reason } => {
                write!(f, "background fallback: {}", reason)
            }
            RenderWarning::LogoSkipped { reason } => write!(f, "logo skipped: {}", reason),
            RenderWarning::FontUnavailable => write!(f, "no platform font, poster text skipped"),
        }
    }
}

/// All artifacts produced for one generation request. File names embed the
/// owning cert id.
#[derive(Debug)]
pub struct RenderedArtifacts {
    pub poster_path: PathBuf,
    pub cert_path: PathBuf,
    pub qr_path: PathBuf,
    pub warnings: Vec<RenderWarning>,
}

pub struct Renderer {
    http: Client,
    output_dir: PathBuf,
    verify_base_url: String,
}

impl Renderer {
    pub fn new(output_dir: PathBuf, verify_base_url: String) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            http,
            output_dir,
            verify_base_url,
        }
    }

    pub fn verify_url(&self, cert_id: &str) -> String {
        format!(
            "{}/verify/{}",
            self.verify_base_url.trim_end_matches('/'),
            cert_id
        )
    }

    /// Produce the poster PNG, QR PNG and certificate PDF for one spec.
    /// Background and logo failures degrade (recorded as warnings); anything
    /// else propagates.
    pub async fn render(
        &self,
        spec: &DesignSpec,
        image_ref: &str,
        cert_id: &str,
    ) -> Result<RenderedArtifacts, RenderError> {
        let mut warnings = Vec::new();

        let bg = background::fetch_or_fallback(&self.http, image_ref, spec, &mut warnings).await;

        let font = fonts::platform_font();
        if font.is_none() {
            warn!("No platform font resolved; poster text will be skipped");
            warnings.push(RenderWarning::FontUnavailable);
        }

        let poster_img = poster::compose(bg, spec, font.as_deref(), &mut warnings);

        let poster_path = self.output_dir.join(format!("poster_{}.png", cert_id));
        DynamicImage::ImageRgba8(poster_img)
            .to_rgb8()
            .save(&poster_path)
            .map_err(|e| RenderError::Image(e.to_string()))?;

        let qr_img = qr::render_qr(&self.verify_url(cert_id))?;
        let qr_path = self.output_dir.join(format!("qr_{}.png", cert_id));
        DynamicImage::ImageRgba8(qr_img)
            .to_rgb8()
            .save(&qr_path)
            .map_err(|e| RenderError::Image(e.to_string()))?;

        let cert_path = self.output_dir.join(format!("cert_{}.pdf", cert_id));
        certificate::generate(
            spec,
            &poster_path,
            &qr_path,
            cert_id,
            &cert_path,
            font.as_deref(),
        )?;

        Ok(RenderedArtifacts {
            poster_path,
            cert_path,
            qr_path,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::DesignSpec;
    use image::{ImageBuffer, Rgba, RgbaImage};

    fn renderer(dir: &std::path::Path) -> Renderer {
        Renderer::new(dir.to_path_buf(), "https://yourdomain.com".to_string())
    }

    #[test]
    fn qr_payload_is_the_verification_url() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(dir.path());
        assert_eq!(
            r.verify_url("abc12345"),
            "https://yourdomain.com/verify/abc12345"
        );
    }

    #[tokio::test]
    async fn unreachable_image_reference_falls_back_and_completes() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(dir.path());
        let spec = DesignSpec::demo("English");

        let artifacts = r.render(&spec, "none", "feedc0de").await.unwrap();

        assert!(artifacts.poster_path.exists());
        assert!(artifacts.cert_path.exists());
        assert!(artifacts.qr_path.exists());
        assert!(artifacts
            .warnings
            .iter()
            .any(|w| matches!(w, RenderWarning::BackgroundFallback { .. })));

        // fallback canvas is the fixed default size
        let poster = image::open(&artifacts.poster_path).unwrap();
        assert_eq!(poster.width(), background::FALLBACK_CANVAS_SIZE);
        assert_eq!(poster.height(), background::FALLBACK_CANVAS_SIZE);
    }

    #[tokio::test]
    async fn artifact_names_embed_the_same_id() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(dir.path());
        let spec = DesignSpec::demo("English");

        let artifacts = r.render(&spec, "none", "12ab34cd").await.unwrap();

        for (path, prefix, ext) in [
            (&artifacts.poster_path, "poster_", "png"),
            (&artifacts.cert_path, "cert_", "pdf"),
            (&artifacts.qr_path, "qr_", "png"),
        ] {
            let name = path.file_name().unwrap().to_string_lossy();
            assert_eq!(name.as_ref(), format!("{}12ab34cd.{}", prefix, ext));
        }

        let cert = std::fs::read(&artifacts.cert_path).unwrap();
        assert!(cert.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn transparent_logo_is_composited_top_right() {
        let dir = tempfile::tempdir().unwrap();
        let logo_path = dir.path().join("logo.png");
        // opaque red center on a transparent sheet
        let logo: RgbaImage = ImageBuffer::from_fn(64, 64, |x, y| {
            if (16..48).contains(&x) && (16..48).contains(&y) {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        logo.save(&logo_path).unwrap();

        let mut spec = DesignSpec::demo("English");
        spec.logo_path = Some(logo_path.to_string_lossy().to_string());

        let r = renderer(dir.path());
        let artifacts = r.render(&spec, "none", "0badf00d").await.unwrap();
        assert!(!artifacts
            .warnings
            .iter()
            .any(|w| matches!(w, RenderWarning::LogoSkipped { .. })));

        let poster = image::open(&artifacts.poster_path).unwrap().to_rgb8();
        let w = poster.width();
        // logo occupies 15% of width at a 5% margin from the top-right corner
        let region_x0 = w - (w as f32 * 0.20) as u32;
        let found_red = (region_x0..w)
            .flat_map(|x| (0..(w as f32 * 0.20) as u32).map(move |y| (x, y)))
            .any(|(x, y)| poster.get_pixel(x, y).0 == [255, 0, 0]);
        assert!(found_red, "logo pixels not found in top-right region");

        // transparent logo corners keep the background color
        assert_eq!(poster.get_pixel(10, 10).0, [26, 42, 108]);
    }

    #[tokio::test]
    async fn corrupt_logo_still_produces_poster() {
        let dir = tempfile::tempdir().unwrap();
        let logo_path = dir.path().join("logo.png");
        std::fs::write(&logo_path, b"definitely not a png").unwrap();

        let mut spec = DesignSpec::demo("English");
        spec.logo_path = Some(logo_path.to_string_lossy().to_string());

        let r = renderer(dir.path());
        let artifacts = r.render(&spec, "none", "c0ffee00").await.unwrap();

        assert!(artifacts.poster_path.exists());
        assert!(artifacts
            .warnings
            .iter()
            .any(|w| matches!(w, RenderWarning::LogoSkipped { .. })));
    }
}
