mod agents;
mod batch;
mod config;
mod design;
mod render;
mod routes;
mod state;
mod storage;
mod templates;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certforge=info,tower_http=info".into()),
        )
        .init();

    let config = Arc::new(config::Config::from_env());

    storage::ensure_dirs(&config.upload_folder, &config.generated_folder)?;

    let interpreter = match config.claude_api_key.clone() {
        Some(key) => agents::PromptInterpreter::new(Arc::new(agents::ClaudeAgent::new(key))),
        None => {
            tracing::warn!("CLAUDE_API_KEY not set; running in demo mode");
            agents::PromptInterpreter::offline()
        }
    };

    let renderer = render::Renderer::new(
        config.generated_folder.clone(),
        config.verify_base_url.clone(),
    );

    let state = Arc::new(state::AppState {
        config: config.clone(),
        interpreter: Arc::new(interpreter),
        renderer: Arc::new(renderer),
    });

    let app = Router::new()
        .route("/", get(routes::welcome))
        .route("/generate/poster", get(routes::generator_page))
        .route("/generate/certificate", get(routes::generator_page))
        .route("/generate", post(routes::generate_handler))
        .route("/bulk", post(routes::bulk_handler))
        .route("/generated/:filename", get(routes::get_generated))
        .route("/verify/:cert_id", get(routes::verify_page))
        .nest_service("/static", tower_http::services::ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Certforge listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
