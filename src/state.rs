use crate::agents::PromptInterpreter;
use crate::config::Config;
use crate::render::Renderer;
use std::sync::Arc;

/// Explicitly constructed services, injected into every handler; tests swap
/// in fakes through the same seams.
pub struct AppState {
    pub config: Arc<Config>,
    pub interpreter: Arc<PromptInterpreter>,
    pub renderer: Arc<Renderer>,
}
