use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rusttype::Font;
use std::{collections::HashMap, sync::Arc};

/// Fixed preference order. First path that exists and parses wins; missing
/// fonts degrade text rendering, they never fail a request.
const FONT_SEARCH_PATHS: &[&str] = &[
    "C:/Windows/Fonts/Arial.ttf",
    "C:/Windows/Fonts/Seguibl.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
];

static FONT_CACHE: Lazy<Mutex<HashMap<String, Arc<Font<'static>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn load_font_cached(path: &str) -> Option<Arc<Font<'static>>> {
    if let Some(f) = FONT_CACHE.lock().get(path) {
        return Some(Arc::clone(f));
    }

    let bytes = std::fs::read(path).ok()?;
    let f = Arc::new(Font::try_from_vec(bytes)?);
    FONT_CACHE.lock().insert(path.to_string(), Arc::clone(&f));
    Some(f)
}

/// Resolve the first usable platform font, if any.
pub fn platform_font() -> Option<Arc<Font<'static>>> {
    FONT_SEARCH_PATHS.iter().find_map(|p| load_font_cached(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_never_panics() {
        // Environment dependent: either a font resolves or it does not,
        // both are acceptable outcomes.
        let _ = platform_font();
    }

    #[test]
    fn unknown_path_is_skipped() {
        assert!(load_font_cached("/definitely/not/a/font.ttf").is_none());
    }
}
