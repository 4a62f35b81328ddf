//! Manifest serialization.
//!
//! The manifest is written twice by the orchestrator: once before the
//! report exists (so the in-memory copy can be handed to the report
//! renderer), once after (so the file on disk records its own
//! `manifest_path`/`report_path`). This module only knows how to compute
//! paths and write bytes -- the two-phase dance lives in the orchestrator.

use std::path::{Path, PathBuf};

use crate::constants::{MANIFESTS_FOLDER, PROJECT_STATE_DIR, REPORTS_FOLDER};
use crate::error::{IngestError, Result};
use crate::fsutil::{create_dir_owner_only, create_owner_only_file};
use crate::model::IngestManifest;

/// `<project>/.cullmate/manifests/<timestamp>_ingest.json`
pub fn manifest_path(project_root: &Path, timestamp: &str) -> PathBuf {
    project_root
        .join(PROJECT_STATE_DIR)
        .join(MANIFESTS_FOLDER)
        .join(format!("{timestamp}_ingest.json"))
}

/// `<project>/.cullmate/reports/<timestamp>_proof.html`
pub fn report_path(project_root: &Path, timestamp: &str) -> PathBuf {
    project_root
        .join(PROJECT_STATE_DIR)
        .join(REPORTS_FOLDER)
        .join(format!("{timestamp}_proof.html"))
}

/// Pretty-print `manifest` to `path`, UTF-8, owner-only permissions. Failure
/// to write the manifest itself is fatal, unlike the best-effort report write.
pub fn write_manifest(manifest: &IngestManifest, path: &Path) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| IngestError::Report(format!("manifest path has no parent: {}", path.display())))?;
    create_dir_owner_only(dir).map_err(|e| IngestError::Report(format!("create manifest dir: {e}")))?;

    let bytes = serde_json::to_vec_pretty(manifest)?;

    use std::io::Write;
    let mut file = create_owner_only_file(path).map_err(|e| IngestError::Report(format!("create manifest file: {e}")))?;
    file.write_all(&bytes)
        .map_err(|e| IngestError::Report(format!("write manifest: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TriageSummary, Totals};
    use tempfile::TempDir;

    fn sample_manifest() -> IngestManifest {
        IngestManifest {
            tool_version: 1,
            app_version: "0.1.0".into(),
            source: "/card".into(),
            project_root: "/project".into(),
            backup_project_root: None,
            project_name: "shoot".into(),
            hash_algo: "blake3".into(),
            verify_mode: "none".into(),
            started_at: "2024-01-01T00:00:00Z".into(),
            finished_at: "2024-01-01T00:00:01Z".into(),
            template_id: None,
            safe_to_format: false,
            triage: TriageSummary::default(),
            totals: Totals::default(),
            files: Vec::new(),
            manifest_path: None,
            report_path: None,
        }
    }

    #[test]
    fn writes_pretty_json_under_state_dir() {
        let tmp = TempDir::new().unwrap();
        let path = manifest_path(tmp.path(), "20240101_000000");
        write_manifest(&sample_manifest(), &path).unwrap();

        assert!(path.exists());
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"tool_version\": 1"));
        assert!(path.starts_with(tmp.path().join(".cullmate").join("manifests")));
    }

    #[test]
    fn report_path_uses_reports_folder() {
        let tmp = TempDir::new().unwrap();
        let path = report_path(tmp.path(), "20240101_000000");
        assert!(path.ends_with(".cullmate/reports/20240101_000000_proof.html"));
    }
}
