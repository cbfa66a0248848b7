use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::design::DesignSpec;

/// Boundary to the text-generation model, injectable so handlers and batch
/// runs can be tested with a fake.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String, String>;
}

#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("AI service error: {0}")]
    Upstream(String),
    #[error("model response was not parseable as a design spec: {raw}")]
    Unparseable { raw: String },
}

/// One retry after a parse failure, with a literal fallback input. Bounded
/// loop, never recursion.
const MAX_ATTEMPTS: usize = 2;
const FALLBACK_INPUT: &str = "fallback";

static FENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?").unwrap());

fn schema_prompt(language: &str) -> String {
    format!(
        r#"Extract certificate details from the user prompt into JSON.
Required keys:
- name
- event
- title
- colors (keys: primary, secondary, accent - all hex)
- font_style
- theme
- date (e.g. "January 22, 2026")
- time (e.g. "9:00 AM")
- venue (e.g. "Main Hall")
- tagline (short description)

Target Language: {language}
Return ONLY valid JSON."#
    )
}

/// Strip markdown code fences the model sometimes wraps around its JSON.
fn strip_fences(raw: &str) -> String {
    FENCE_RE.replace_all(raw, "").trim().to_string()
}

fn parse_design_json(raw: &str) -> Result<DesignSpec, serde_json::Error> {
    serde_json::from_str(&strip_fences(raw))
}

pub struct PromptInterpreter {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl PromptInterpreter {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    /// Demo mode: no model call, fixed deterministic spec.
    pub fn offline() -> Self {
        Self { generator: None }
    }

    pub async fn interpret(
        &self,
        prompt: &str,
        language: &str,
    ) -> Result<DesignSpec, InterpretError> {
        let Some(generator) = &self.generator else {
            return Ok(DesignSpec::demo(language));
        };

        let system = schema_prompt(language);
        let mut input = prompt.to_string();
        let mut last_raw = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            let raw = generator
                .generate(&system, &input)
                .await
                .map_err(InterpretError::Upstream)?;

            match parse_design_json(&raw) {
                Ok(mut spec) => {
                    if spec.language.is_empty() {
                        spec.language = language.to_string();
                    }
                    info!("Interpreted prompt on attempt {}", attempt);
                    return Ok(spec);
                }
                Err(e) => {
                    warn!("JSON parse error on attempt {}: {} | text: {}", attempt, e, raw);
                    last_raw = raw;
                    input = FALLBACK_INPUT.to_string();
                }
            }
        }

        Err(InterpretError::Unparseable { raw: last_raw })
    }
}
