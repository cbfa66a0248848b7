use axum::{
    extract::Path,
    response::{Html, IntoResponse},
};
use tera::Context;

pub async fn welcome() -> impl IntoResponse {
    render_template("welcome.html", Context::new())
}

pub async fn generator_page() -> impl IntoResponse {
    render_template("generator.html", Context::new())
}

/// Placeholder verification view; no cryptographic or database check.
pub async fn verify_page(Path(cert_id): Path<String>) -> impl IntoResponse {
    let mut ctx = Context::new();
    ctx.insert("verified_id", &cert_id);
    render_template("verify.html", ctx)
}

fn render_template(name: &str, ctx: Context) -> Html<String> {
    let tera = crate::templates::get_tera();
    let rendered = tera
        .render(name, &ctx)
        .unwrap_or_else(|_| format!("Template error: {}", name));
    Html(rendered)
}
