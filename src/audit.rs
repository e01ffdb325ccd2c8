//! High-level orchestration: ingest a batch of files, run the engine, and
//! hand the result to its collaborators.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::engine;
use crate::error::{AuditError, Result};
use crate::io::{excel_read, excel_write};
use crate::model::{ParcelSource, ParsedSource, ReconciliationResult, WarehouseSource};

/// Sources from one ingest batch, partitioned by type, plus per-file
/// warnings for files that could not be used.
#[derive(Debug, Default)]
pub struct IngestBatch {
    pub warehouse: Vec<WarehouseSource>,
    pub parcel: Vec<ParcelSource>,
    /// Human-readable diagnostics: unrecognized files and coercion warnings.
    pub warnings: Vec<String>,
}

impl IngestBatch {
    pub fn file_names(&self) -> Vec<String> {
        self.warehouse
            .iter()
            .map(|source| source.file_name.clone())
            .chain(self.parcel.iter().map(|source| source.file_name.clone()))
            .collect()
    }
}

/// Classifies and normalizes each file in turn. An unrecognized file is
/// reported as a warning and skipped; it never aborts the rest of the batch.
#[instrument(level = "info", skip_all, fields(file_count = paths.len()))]
pub fn ingest_files(paths: &[PathBuf]) -> Result<IngestBatch> {
    let mut batch = IngestBatch::default();

    for path in paths {
        if !path.exists() {
            return Err(AuditError::MissingInput(path.clone()));
        }
        let file_name = display_name(path);
        match excel_read::detect_path(path, &file_name)? {
            ParsedSource::Warehouse(source) => {
                info!(file = %file_name, "classified as warehouse workbook");
                collect_cell_warnings(&source.warnings, &mut batch.warnings);
                batch.warehouse.push(source);
            }
            ParsedSource::Parcel(source) => {
                info!(file = %file_name, "classified as parcel workbook");
                collect_cell_warnings(&source.warnings, &mut batch.warnings);
                batch.parcel.push(source);
            }
            ParsedSource::Unknown { file_name } => {
                warn!(file = %file_name, "unrecognized workbook");
                batch.warnings.push(format!("{file_name}: unrecognized workbook"));
            }
        }
    }

    Ok(batch)
}

/// Runs the engine over an ingested batch.
pub fn reconcile_batch(batch: &IngestBatch) -> ReconciliationResult {
    engine::reconcile(&batch.warehouse, &batch.parcel)
}

/// Writes the result as a JSON document.
#[instrument(level = "info", skip(result), fields(output = %output.display()))]
pub fn export_json(output: &Path, result: &ReconciliationResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(output, json)?;
    Ok(())
}

/// Writes the result as an Excel report workbook.
#[instrument(level = "info", skip(result), fields(output = %output.display()))]
pub fn export_xlsx(output: &Path, result: &ReconciliationResult) -> Result<()> {
    excel_write::write_report(output, result)
}

fn collect_cell_warnings(
    cell_warnings: &[crate::model::CellWarning],
    warnings: &mut Vec<String>,
) {
    for warning in cell_warnings {
        warnings.push(warning.to_string());
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
