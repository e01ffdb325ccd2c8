//! Keyed record store for finished audits.
//!
//! One JSON file per saved report under a store directory. The engine has
//! no knowledge of this layout; it only hands over a serializable
//! [`ReconciliationResult`].

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{AuditError, Result};
use crate::model::ReconciliationResult;

/// A persisted audit: the result plus the metadata the dashboard lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedReport {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub files_uploaded: Vec<String>,
    pub result: ReconciliationResult,
}

/// Directory-backed store of [`SavedReport`] records.
pub struct ReportStore {
    root: PathBuf,
}

impl ReportStore {
    /// Opens (and creates if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Persists a new report and returns its generated identifier.
    #[instrument(level = "info", skip_all, fields(name = %name, owner = %owner))]
    pub fn create(
        &self,
        name: &str,
        owner: &str,
        files_uploaded: Vec<String>,
        result: ReconciliationResult,
    ) -> Result<SavedReport> {
        let report = SavedReport {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            owner: owner.to_string(),
            created_at: Utc::now(),
            files_uploaded,
            result,
        };
        let path = self.record_path(&report.id);
        fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        debug!(path = %path.display(), "report written");
        Ok(report)
    }

    /// Loads one report by identifier.
    pub fn read(&self, id: &str) -> Result<SavedReport> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(AuditError::ReportNotFound(id.to_string()));
        }
        let data = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Lists reports, newest first, optionally filtered to one owner.
    pub fn list(&self, owner: Option<&str>) -> Result<Vec<SavedReport>> {
        let mut reports = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let data = fs::read_to_string(&path)?;
            let report: SavedReport = serde_json::from_str(&data).map_err(|error| {
                AuditError::Store(format!("unreadable report {}: {error}", path.display()))
            })?;
            if owner.is_none_or(|owner| report.owner == owner) {
                reports.push(report);
            }
        }
        reports.sort_by(|lhs, rhs| rhs.created_at.cmp(&lhs.created_at));
        Ok(reports)
    }

    /// Removes one report by identifier.
    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(AuditError::ReportNotFound(id.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }
}

/// Default report name when the caller does not supply one: the uploaded
/// file names joined, or a dated fallback.
pub fn default_report_name(files: &[String]) -> String {
    if files.is_empty() {
        format!("Reconciliation {}", Utc::now().format("%Y-%m-%d"))
    } else {
        files.join(", ")
    }
}
