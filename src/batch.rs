use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;

use crate::agents::PromptInterpreter;
use crate::render::Renderer;
use crate::storage;

/// Fixed background used for every bulk row; the image model is bypassed
/// for throughput.
pub const BULK_IMAGE_REF: &str = "https://images.unsplash.com/photo-1557683316-973673baf926";

const DEFAULT_NAME: &str = "Participant";
const DEFAULT_EVENT: &str = "the Event";

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("csv error: {0}")]
    Csv(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(String),
    #[error("summary serialization failed: {0}")]
    Summary(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
pub struct BatchRow {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub event: String,
}

/// Per-row result; failed rows carry their error and do not abort the batch.
#[derive(Debug, Serialize)]
pub struct RowOutcome {
    pub name: String,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub zip_filename: String,
    pub rows: Vec<RowOutcome>,
}

/// Parse `name`,`event` rows from an uploaded CSV. Missing columns fall back
/// to placeholder values, matching single-row behavior.
pub fn parse_rows(bytes: &[u8]) -> Result<Vec<BatchRow>, BatchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.deserialize::<BatchRow>() {
        let mut row = record.map_err(|e| BatchError::Csv(e.to_string()))?;
        if row.name.is_empty() {
            row.name = DEFAULT_NAME.to_string();
        }
        if row.event.is_empty() {
            row.event = DEFAULT_EVENT.to_string();
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Run interpretation and rendering for every row, isolating failures, then
/// pack the successful certificates plus a summary report into one archive.
pub async fn run_batch(
    interpreter: &PromptInterpreter,
    renderer: &Renderer,
    rows: Vec<BatchRow>,
    prompt_template: &str,
    image_ref: &str,
    generated_dir: &Path,
) -> Result<BatchOutcome, BatchError> {
    let mut outcomes = Vec::with_capacity(rows.len());

    for row in rows {
        let outcome = run_row(interpreter, renderer, &row, prompt_template, image_ref).await;
        if let Some(ref e) = outcome.error {
            warn!("Bulk row for '{}' failed: {}", row.name, e);
        }
        outcomes.push(outcome);
    }

    let zip_filename = format!("bulk_{}.zip", storage::new_archive_suffix());
    let zip_path = generated_dir.join(&zip_filename);
    write_archive(&zip_path, generated_dir, &outcomes)?;

    info!(
        "Bulk batch complete: {}/{} rows succeeded",
        outcomes.iter().filter(|o| o.error.is_none()).count(),
        outcomes.len()
    );

    Ok(BatchOutcome {
        zip_filename,
        rows: outcomes,
    })
}

async fn run_row(
    interpreter: &PromptInterpreter,
    renderer: &Renderer,
    row: &BatchRow,
    prompt_template: &str,
    image_ref: &str,
) -> RowOutcome {
    let prompt = format!(
        "Create a certificate for {} for participating in {}. {}",
        row.name, row.event, prompt_template
    );

    let mut spec = match interpreter.interpret(&prompt, "English").await {
        Ok(spec) => spec,
        Err(e) => return row_error(row, e.to_string()),
    };

    // Bulk rows reuse the extracted design but always carry the row's name.
    if spec.name.is_empty() {
        spec.name = row.name.clone();
    }
    if spec.event.is_empty() {
        spec.event = row.event.clone();
    }

    let cert_id = storage::new_cert_id();
    spec.id = cert_id.clone();

    match renderer.render(&spec, image_ref, &cert_id).await {
        Ok(artifacts) => RowOutcome {
            name: row.name.clone(),
            event: row.event.clone(),
            cert_id: Some(cert_id),
            certificate: artifacts
                .cert_path
                .file_name()
                .map(|f| f.to_string_lossy().to_string()),
            error: None,
        },
        Err(e) => row_error(row, e.to_string()),
    }
}

fn row_error(row: &BatchRow, error: String) -> RowOutcome {
    RowOutcome {
        name: row.name.clone(),
        event: row.event.clone(),
        cert_id: None,
        certificate: None,
        error: Some(error),
    }
}

fn write_archive(
    zip_path: &Path,
    generated_dir: &Path,
    outcomes: &[RowOutcome],
) -> Result<(), BatchError> {
    let file = std::fs::File::create(zip_path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().unix_permissions(0o644);

    for outcome in outcomes {
        let Some(ref cert_filename) = outcome.certificate else {
            continue;
        };
        let content = std::fs::read(generated_dir.join(cert_filename))?;
        zip.start_file(cert_filename.as_str(), options)
            .map_err(|e| BatchError::Zip(e.to_string()))?;
        zip.write_all(&content)?;
    }

    let summary = serde_json::json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "rows": outcomes,
    });
    zip.start_file("summary.json", options)
        .map_err(|e| BatchError::Zip(e.to_string()))?;
    zip.write_all(&serde_json::to_vec_pretty(&summary)?)?;

    zip.finish().map_err(|e| BatchError::Zip(e.to_string()))?;
    Ok(())
}
