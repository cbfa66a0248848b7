use std::sync::OnceLock;
use tera::Tera;

static TERA: OnceLock<Tera> = OnceLock::new();

pub fn get_tera() -> &'static Tera {
    TERA.get_or_init(|| {
        Tera::new("templates/**/*.html").unwrap_or_else(|e| {
            tracing::warn!("Failed to load templates: {}", e);
            Tera::default()
        })
    })
}
