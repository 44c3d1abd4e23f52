use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{error, info, instrument, warn};

use crate::{
    config::RunConfiguration,
    discovery::{FileDiscoverer, SourceFile},
    llm::Classifier,
    normalize::{normalize, EmptySource},
    report::{report_path, write_report},
};

pub const BLANK_FILE_TEXT: &str = "O arquivo original estava vazio.";
pub const BLANK_FILE_VERDICT: &str = "Não analisado (arquivo vazio).";
pub const COMMENTS_ONLY_VERDICT: &str = "Não analisado (vazio após remoção de comentários).";
pub const FAILED_FILE_TEXT: &str = "Erro durante a leitura ou processamento do arquivo.";

/// How a file's row was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    /// The classifier returned a verdict.
    Analyzed,
    /// Nothing was left to submit after normalization.
    Skipped,
    /// Reading or classification failed.
    Failed,
}

/// Outcome for a single source file within one model run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub relative_path: String,
    pub status: RecordStatus,
    /// Normalized code, or placeholder text when classification did not happen.
    pub normalized_text: String,
    /// Model verdict, or a placeholder verdict.
    pub verdict_text: String,
}

impl FileRecord {
    fn skipped(file: &SourceFile, empty: EmptySource, original: String) -> Self {
        let (normalized_text, verdict_text) = match empty {
            EmptySource::Blank => (BLANK_FILE_TEXT.to_string(), BLANK_FILE_VERDICT),
            EmptySource::CommentsOnly => (original, COMMENTS_ONLY_VERDICT),
        };
        Self {
            relative_path: file.relative_path.clone(),
            status: RecordStatus::Skipped,
            normalized_text,
            verdict_text: verdict_text.to_string(),
        }
    }

    fn failed(file: &SourceFile, err: &anyhow::Error) -> Self {
        Self {
            relative_path: file.relative_path.clone(),
            status: RecordStatus::Failed,
            normalized_text: FAILED_FILE_TEXT.to_string(),
            verdict_text: format!("Erro: {err:#}"),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == RecordStatus::Failed
    }
}

/// Summary of one model's pass over the source tree.
#[derive(Debug, Clone)]
pub struct ModelOutcome {
    pub model: String,
    pub report_path: PathBuf,
    pub files: usize,
    pub failed_files: usize,
    /// Set when the workbook could not be written.
    pub save_error: Option<String>,
}

/// Read a file, dropping byte sequences that are not valid UTF-8.
fn read_dropping_invalid_utf8(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(bytes.utf8_chunks().map(|chunk| chunk.valid()).collect())
}

async fn analyze_file(
    file: &SourceFile,
    classifier: &dyn Classifier,
    model: &str,
) -> FileRecord {
    info!(file = %file.relative_path, "processing");
    let original = match read_dropping_invalid_utf8(&file.path) {
        Ok(text) => text,
        Err(err) => {
            error!(file = %file.relative_path, error = %format!("{err:#}"), "read failed");
            return FileRecord::failed(file, &err);
        }
    };

    let cleaned = match normalize(&original) {
        Ok(cleaned) => cleaned,
        Err(empty) => {
            warn!(file = %file.relative_path, reason = %empty, "not submitted");
            return FileRecord::skipped(file, empty, original);
        }
    };

    info!(file = %file.relative_path, "submitting for analysis");
    match classifier.classify(&cleaned, model).await {
        Ok(verdict) => {
            info!(file = %file.relative_path, "analysis received");
            FileRecord {
                relative_path: file.relative_path.clone(),
                status: RecordStatus::Analyzed,
                normalized_text: cleaned,
                verdict_text: verdict,
            }
        }
        Err(err) => {
            error!(
                file = %file.relative_path,
                error = %format!("{err:#}"),
                "classification failed"
            );
            FileRecord::failed(file, &err)
        }
    }
}

/// Discover, normalize and classify every source file for one model, in walk order.
#[instrument(skip(discoverer, classifier), fields(root = %discoverer.root().display()))]
pub async fn analyze_model(
    discoverer: &FileDiscoverer,
    classifier: &dyn Classifier,
    model: &str,
) -> Vec<FileRecord> {
    let mut records = Vec::new();
    for file in discoverer.files() {
        records.push(analyze_file(&file, classifier, model).await);
    }
    records
}

/// Run the full pipeline once per configured model, writing one workbook each.
///
/// A missing source directory aborts before any model runs. Per-file and
/// per-model failures are recorded in the outcomes instead.
pub async fn run_models(
    config: &RunConfiguration,
    classifier: &dyn Classifier,
) -> Result<Vec<ModelOutcome>> {
    let discoverer = FileDiscoverer::new(&config.root_dir, config.extensions.clone())?;
    let extensions = config.extensions.iter().collect::<Vec<_>>().join(", ");
    info!(
        root = %config.root_dir.display(),
        extensions = %extensions,
        models = config.models.len(),
        "starting analysis"
    );

    let mut outcomes = Vec::with_capacity(config.models.len());
    for model in &config.models {
        info!(model = %model, "running model");
        let records = analyze_model(&discoverer, classifier, model).await;
        let path = report_path(&config.root_dir, model);
        let save_error = match write_report(&path, model, &records) {
            Ok(()) => {
                info!(model = %model, report = %path.display(), "report written");
                None
            }
            Err(err) => {
                error!(model = %model, error = %format!("{err:#}"), "report not saved");
                Some(format!("{err:#}"))
            }
        };
        outcomes.push(ModelOutcome {
            model: model.clone(),
            report_path: path,
            files: records.len(),
            failed_files: records.iter().filter(|r| r.is_failure()).count(),
            save_error,
        });
        info!(model = %model, "model finished");
    }
    Ok(outcomes)
}
