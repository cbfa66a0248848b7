use image::Rgba;
use serde::{Deserialize, Serialize};

/// Three-color scheme extracted from the prompt. All values are hex strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Palette {
    #[serde(default = "default_primary")]
    pub primary: String,
    #[serde(default = "default_secondary")]
    pub secondary: String,
    #[serde(default = "default_accent")]
    pub accent: String,
}

fn default_primary() -> String {
    "#1a2a6c".to_string()
}

fn default_secondary() -> String {
    "#b21f1f".to_string()
}

fn default_accent() -> String {
    "#fdbb2d".to_string()
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            secondary: default_secondary(),
            accent: default_accent(),
        }
    }
}

/// Structured certificate/poster content extracted from a free-text prompt.
///
/// Every field is always present; model output with missing keys falls back
/// to empty strings (or the default palette) so rendering code never has to
/// do defensive lookups.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DesignSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub colors: Palette,
    #[serde(default)]
    pub font_style: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<String>,
}

impl DesignSpec {
    /// Fixed spec returned when no text-generation credential is configured.
    pub fn demo(language: &str) -> Self {
        Self {
            name: "Candidate Name".to_string(),
            event: "AI Innovation Challenge".to_string(),
            title: "Certificate of Excellence".to_string(),
            colors: Palette::default(),
            font_style: "Serif".to_string(),
            theme: "Modern Professional".to_string(),
            language: language.to_string(),
            ..Default::default()
        }
    }

    /// Headline text for the poster: event name, falling back to the title.
    pub fn headline(&self) -> String {
        let text = if !self.event.is_empty() {
            &self.event
        } else if !self.title.is_empty() {
            &self.title
        } else {
            "Event Name"
        };
        text.to_uppercase()
    }
}

/// Parse a `#rrggbb` string into an opaque pixel. Returns `None` for
/// malformed values so callers can pick their own fallback color.
pub fn parse_hex_color(s: &str) -> Option<Rgba<u8>> {
    let s = s.trim().trim_start_matches('#');
    if s.len() != 6 {
        return None;
    }
    let b = hex::decode(s).ok()?;
    Some(Rgba([b[0], b[1], b[2], 255]))
}

/// Same color as unit floats, for the PDF canvas.
pub fn parse_hex_rgb_f32(s: &str) -> Option<(f32, f32, f32)> {
    let Rgba([r, g, b, _]) = parse_hex_color(s)?;
    Some((r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_spec_matches_fixed_values() {
        let spec = DesignSpec::demo("English");
        assert_eq!(spec.name, "Candidate Name");
        assert_eq!(spec.event, "AI Innovation Challenge");
        assert_eq!(spec.title, "Certificate of Excellence");
        assert_eq!(spec.colors.primary, "#1a2a6c");
        assert_eq!(spec.colors.secondary, "#b21f1f");
        assert_eq!(spec.colors.accent, "#fdbb2d");
        assert_eq!(spec.font_style, "Serif");
        assert_eq!(spec.theme, "Modern Professional");
        assert_eq!(spec.language, "English");
        assert!(spec.date.is_empty());
        assert!(spec.logo_path.is_none());
    }

    #[test]
    fn demo_spec_is_deterministic() {
        assert_eq!(DesignSpec::demo("Spanish"), DesignSpec::demo("Spanish"));
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let spec: DesignSpec = serde_json::from_str(r#"{"name": "Jane Doe"}"#).unwrap();
        assert_eq!(spec.name, "Jane Doe");
        assert_eq!(spec.event, "");
        assert_eq!(spec.colors, Palette::default());
    }

    #[test]
    fn partial_palette_keeps_known_keys() {
        let spec: DesignSpec =
            serde_json::from_str(r##"{"colors": {"primary": "#000000"}}"##).unwrap();
        assert_eq!(spec.colors.primary, "#000000");
        assert_eq!(spec.colors.secondary, "#b21f1f");
    }

    #[test]
    fn headline_prefers_event_over_title() {
        let mut spec = DesignSpec::demo("English");
        assert_eq!(spec.headline(), "AI INNOVATION CHALLENGE");
        spec.event.clear();
        assert_eq!(spec.headline(), "CERTIFICATE OF EXCELLENCE");
        spec.title.clear();
        assert_eq!(spec.headline(), "EVENT NAME");
    }

    #[test]
    fn hex_color_parsing() {
        assert_eq!(parse_hex_color("#1a2a6c"), Some(Rgba([26, 42, 108, 255])));
        assert_eq!(parse_hex_color("ffffff"), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("not-a-color"), None);
    }
}
