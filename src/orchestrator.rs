//! Ingest orchestrator.
//!
//! Owns the state machine:
//! `init -> scan -> [route -> dedupe? -> copy+hash] -> primary_verify
//!  -> [sidecar] -> backup_copy -> backup_verify -> triage -> write_manifest
//!  -> write_report -> rewrite_manifest_with_report_path -> done`
//!
//! Each phase is a synchronous barrier; this implementation processes files
//! sequentially within a phase, which trivially keeps progress events
//! monotone within one run.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, Utc};
use log::warn;

use crate::constants::TOOL_VERSION;
use crate::error::{IngestError, Result};
use crate::fsutil::create_dir_owner_only;
use crate::hash::hash_reader;
use crate::ingest::copy::atomic_copy;
use crate::ingest::dedupe::DedupeIndex;
use crate::ingest::scan;
use crate::ingest::sidecar::{self, XmpPatch};
use crate::ingest::template;
use crate::ingest::triage::{NullTriageEngine, TriageEngine};
use crate::ingest::verify::{self, Leg};
use crate::manifest;
use crate::metadata;
use crate::model::{
    FileEntry, FileStatus, FolderTemplate, HashAlgorithm, IngestManifest, ScannedFile, Totals, VerifyMode,
};
use crate::progress::{self, IngestEvent, ProgressCallback};
use crate::report;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A single cooperative cancellation flag, cloneable so a caller can hold
/// one half while handing the other to `run_ingest`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Parameters for one ingest run.
pub struct IngestParams {
    pub source_path: PathBuf,
    pub dest_project_path: PathBuf,
    pub project_name: String,
    pub verify_mode: VerifyMode,
    pub overwrite: bool,
    pub hash_algo: HashAlgorithm,
    pub dedupe: bool,
    pub backup_dest: Option<PathBuf>,
    pub folder_template: Option<FolderTemplate>,
    pub template_context: HashMap<String, String>,
    pub xmp_patch: Option<XmpPatch>,
    pub triage_engine: Option<Box<dyn TriageEngine>>,
    pub cancel: Option<CancelToken>,
}

impl IngestParams {
    pub fn new(source_path: PathBuf, dest_project_path: PathBuf, project_name: impl Into<String>) -> Self {
        Self {
            source_path,
            dest_project_path,
            project_name: project_name.into(),
            verify_mode: VerifyMode::None,
            overwrite: false,
            hash_algo: HashAlgorithm::Blake3,
            dedupe: false,
            backup_dest: None,
            folder_template: None,
            template_context: HashMap::new(),
            xmp_patch: None,
            triage_engine: None,
            cancel: None,
        }
    }
}

/// Run one ingest. `on_event`, when provided, receives every `IngestEvent`
/// in the order the phases below execute.
pub fn run_ingest(params: IngestParams, mut on_event: Option<&mut ProgressCallback<'_>>) -> Result<IngestManifest> {
    let start = Instant::now();
    let started_at = Utc::now();

    if params.project_name.is_empty() || params.project_name.contains('/') || params.project_name.contains('\\') {
        return Err(IngestError::InvalidParams(format!(
            "project name must be non-empty and contain no path separators: {:?}",
            params.project_name
        )));
    }

    let source_path = expand_tilde(&params.source_path);
    let dest_project_path = expand_tilde(&params.dest_project_path);
    let project_root = dest_project_path.join(&params.project_name);
    let backup_root = params
        .backup_dest
        .as_ref()
        .map(|p| expand_tilde(p).join(&params.project_name));

    progress::emit(
        &mut on_event,
        IngestEvent::Start {
            source_path: source_path.display().to_string(),
            project_root: project_root.display().to_string(),
        },
    );

    create_dir_owner_only(&project_root).map_err(|e| {
        IngestError::Other(format!("cannot create project root {}: {e}", project_root.display()))
    })?;
    scaffold(&project_root, &params.folder_template)?;

    let scanned = scan::scan(&source_path, &mut on_event)?;

    let mut entries = process_files(&scanned, &project_root, &params, &mut on_event);

    verify::verify(
        &mut entries,
        &project_root,
        params.hash_algo,
        params.verify_mode,
        Leg::Primary,
        &mut on_event,
    );

    if let Some(patch) = &params.xmp_patch {
        run_sidecars(&mut entries, &project_root, patch, &mut on_event);
    }

    if let Some(backup_root) = &backup_root {
        run_backup(&mut entries, backup_root, &params, &mut on_event)?;
        verify::verify(
            &mut entries,
            backup_root,
            params.hash_algo,
            params.verify_mode,
            Leg::Backup,
            &mut on_event,
        );
    }

    let triage_engine: Box<dyn TriageEngine> = params.triage_engine.unwrap_or_else(|| Box::new(NullTriageEngine));
    let triage = triage_engine.run(&mut entries, &project_root, &mut on_event);

    let totals = compute_totals(&entries, &triage);
    let safe_to_format = compute_safe_to_format(backup_root.is_some(), &totals);
    let finished_at = Utc::now();

    let mut manifest = IngestManifest {
        tool_version: TOOL_VERSION,
        app_version: APP_VERSION.to_string(),
        source: source_path.display().to_string(),
        project_root: project_root.display().to_string(),
        backup_project_root: backup_root.as_ref().map(|p| p.display().to_string()),
        project_name: params.project_name.clone(),
        hash_algo: params.hash_algo.as_str().to_string(),
        verify_mode: verify_mode_label(params.verify_mode).to_string(),
        started_at: started_at.to_rfc3339(),
        finished_at: finished_at.to_rfc3339(),
        template_id: params.folder_template.as_ref().map(|t| t.id.clone()),
        safe_to_format,
        triage,
        totals,
        files: entries,
        manifest_path: None,
        report_path: None,
    };

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let manifest_path = manifest::manifest_path(&project_root, &timestamp);
    let report_path = manifest::report_path(&project_root, &timestamp);

    manifest::write_manifest(&manifest, &manifest_path)?;

    if let Err(e) = report::write_report(&manifest, &report_path) {
        warn!("report write failed (non-fatal): {e}");
    }

    manifest.manifest_path = Some(manifest_path.display().to_string());
    manifest.report_path = Some(report_path.display().to_string());
    manifest::write_manifest(&manifest, &manifest_path)?;

    progress::emit(
        &mut on_event,
        IngestEvent::ReportGenerated {
            manifest_path: manifest_path.display().to_string(),
            report_path: report_path.display().to_string(),
        },
    );
    progress::emit(
        &mut on_event,
        IngestEvent::Done {
            success_count: manifest.totals.success_count,
            fail_count: manifest.totals.fail_count,
            elapsed_ms: start.elapsed().as_millis() as u64,
            safe_to_format: manifest.safe_to_format,
        },
    );

    Ok(manifest)
}

fn scaffold(project_root: &Path, template: &Option<FolderTemplate>) -> Result<()> {
    let dirs = match template {
        Some(t) => t.scaffold_dirs.clone(),
        None => template::legacy_scaffolds(),
    };
    for dir in dirs {
        create_dir_owner_only(&project_root.join(dir)).map_err(|e| IngestError::Other(e.to_string()))?;
    }
    Ok(())
}

fn process_files(
    scanned: &[ScannedFile],
    project_root: &Path,
    params: &IngestParams,
    on_event: &mut Option<&mut ProgressCallback<'_>>,
) -> Vec<FileEntry> {
    let mut entries = Vec::with_capacity(scanned.len());
    let mut dedupe_index = DedupeIndex::new();
    let mut total_bytes_copied = 0u64;
    let mut bytes_saved_total = 0u64;
    let mut duplicate_count_total = 0usize;
    let total = scanned.len();
    let import_date = Utc::now();

    for (index, file) in scanned.iter().enumerate() {
        if was_cancelled(&params.cancel) {
            let mut entry = FileEntry::new(file, String::new(), "cancelled".to_string());
            entry.error = Some("run cancelled before this file was processed".to_string());
            entries.push(entry);
            continue;
        }

        let capture = metadata::extract_capture_info(&file.abs_path);
        let ctx = template::build_token_context(
            file,
            &capture,
            import_date,
            params.folder_template.as_ref(),
            &params.template_context,
        );

        let (dst_rel, routed_by) = match &params.folder_template {
            Some(t) => match template::route(&t.rules, file) {
                Some(rule) => {
                    let expanded = template::expand(&rule.dest_pattern, &ctx);
                    (template::compute_dst_rel(&expanded, &file.src_rel), rule.label.clone())
                }
                None => (template::legacy_dst_rel(&file.src_rel), template::LEGACY_ROUTED_BY.to_string()),
            },
            None => (template::legacy_dst_rel(&file.src_rel), template::LEGACY_ROUTED_BY.to_string()),
        };

        let mut entry = FileEntry::new(file, dst_rel.clone(), routed_by);

        if params.dedupe {
            if let Some((hash, existing)) = precheck_duplicate(file, &mut dedupe_index, params.hash_algo) {
                entry.status = FileStatus::SkippedDuplicate;
                entry.duplicate_of = Some(existing.clone());
                entry.hash = Some(hash);
                bytes_saved_total += file.bytes;
                duplicate_count_total += 1;
                progress::emit(
                    on_event,
                    IngestEvent::DedupeHit {
                        rel_path: file.src_rel.clone(),
                        duplicate_of: existing,
                        bytes_saved_total,
                        duplicate_count_total,
                    },
                );
                entries.push(entry);
                continue;
            }
        }

        let dst_abs = project_root.join(&dst_rel);
        let outcome = atomic_copy(&file.abs_path, &dst_abs, params.hash_algo, params.overwrite);
        entry.status = outcome.status;
        entry.hash = outcome.hash.clone();
        entry.error = outcome.error;

        if entry.status == FileStatus::Copied {
            if let Some(hash) = &outcome.hash {
                dedupe_index.record(hash.clone(), dst_rel.clone());
            }
        }

        total_bytes_copied += outcome.bytes;
        progress::emit(
            on_event,
            IngestEvent::CopyProgress {
                index: index + 1,
                total,
                rel_path: file.src_rel.clone(),
                bytes_copied: outcome.bytes,
                total_bytes_copied,
            },
        );

        entries.push(entry);
    }

    entries
}

/// Pre-hash the source file and check it against the dedupe map. Returns
/// the computed hash and the existing `dst_rel` when the content has
/// already landed -- the duplicate entry carries this same hash.
fn precheck_duplicate(file: &ScannedFile, index: &mut DedupeIndex, algo: HashAlgorithm) -> Option<(String, String)> {
    let hash = File::open(&file.abs_path).and_then(|f| hash_reader(f, algo)).ok()?.0;
    let existing = index.lookup(&hash)?.to_string();
    Some((hash, existing))
}

fn run_sidecars(
    entries: &mut [FileEntry],
    project_root: &Path,
    patch: &XmpPatch,
    on_event: &mut Option<&mut ProgressCallback<'_>>,
) {
    let mut written = 0usize;
    let mut failed = 0usize;
    let total = entries.iter().filter(|e| e.status == FileStatus::Copied).count();

    for entry in entries.iter_mut().filter(|e| e.status == FileStatus::Copied) {
        sidecar::write_sidecar(entry, project_root, patch);
        match entry.sidecar_written {
            Some(true) => written += 1,
            Some(false) => failed += 1,
            None => {}
        }
    }

    progress::emit(
        on_event,
        IngestEvent::XmpProgress {
            written_count: written,
            failed_count: failed,
            total,
        },
    );
}

fn run_backup(
    entries: &mut [FileEntry],
    backup_root: &Path,
    params: &IngestParams,
    on_event: &mut Option<&mut ProgressCallback<'_>>,
) -> Result<()> {
    create_dir_owner_only(backup_root)
        .map_err(|e| IngestError::Other(format!("cannot create backup root {}: {e}", backup_root.display())))?;
    scaffold(backup_root, &params.folder_template)?;

    progress::emit(
        on_event,
        IngestEvent::BackupStart {
            backup_root: backup_root.display().to_string(),
        },
    );

    let eligible_count = entries
        .iter()
        .filter(|e| matches!(e.status, FileStatus::Copied | FileStatus::SkippedExists))
        .count();
    let mut total_bytes_copied = 0u64;
    let mut index = 0usize;

    for entry in entries.iter_mut() {
        if !matches!(entry.status, FileStatus::Copied | FileStatus::SkippedExists) {
            continue;
        }
        index += 1;

        if was_cancelled(&params.cancel) {
            entry.backup_status = Some(FileStatus::Error);
            entry.backup_error = Some("run cancelled before backup copy".to_string());
            continue;
        }

        let src_abs = backup_source_path(entry, params);
        let dst_abs = backup_root.join(&entry.dst_rel);
        let outcome = atomic_copy(&src_abs, &dst_abs, params.hash_algo, params.overwrite);

        entry.backup_status = Some(outcome.status);
        entry.backup_hash = outcome.hash.clone();
        entry.backup_error = outcome.error;

        total_bytes_copied += outcome.bytes;
        progress::emit(
            on_event,
            IngestEvent::BackupCopyProgress {
                index,
                total: eligible_count,
                rel_path: entry.src_rel.clone(),
                bytes_copied: outcome.bytes,
                total_bytes_copied,
            },
        );
    }

    Ok(())
}

/// The backup leg mirrors from the original source, not the primary copy,
/// so a corrupted primary copy can never silently reproduce itself as a
/// matching backup.
fn backup_source_path(entry: &FileEntry, params: &IngestParams) -> PathBuf {
    expand_tilde(&params.source_path).join(&entry.src_rel)
}

fn compute_totals(entries: &[FileEntry], triage: &crate::model::TriageSummary) -> Totals {
    let mut totals = Totals::default();
    totals.file_count = entries.len();

    for entry in entries {
        match entry.status {
            FileStatus::Copied => {
                totals.success_count += 1;
                totals.total_bytes += entry.bytes;
            }
            FileStatus::SkippedExists => totals.skip_count += 1,
            FileStatus::SkippedDuplicate => {
                totals.duplicate_count += 1;
                totals.bytes_saved += entry.bytes;
            }
            FileStatus::Error => totals.fail_count += 1,
        }

        match entry.verified {
            Some(true) => {
                totals.verified_count += 1;
                totals.verified_ok += 1;
            }
            Some(false) => {
                totals.verified_count += 1;
                totals.verified_mismatch += 1;
            }
            None => {}
        }

        match entry.backup_status {
            Some(FileStatus::Copied) => totals.backup_success_count += 1,
            Some(FileStatus::SkippedExists) => totals.backup_skip_count += 1,
            Some(FileStatus::Error) => totals.backup_fail_count += 1,
            Some(FileStatus::SkippedDuplicate) | None => {}
        }

        match entry.backup_verified {
            Some(true) => {
                totals.backup_verified_count += 1;
                totals.backup_verified_ok += 1;
            }
            Some(false) => {
                totals.backup_verified_count += 1;
                totals.backup_verified_mismatch += 1;
            }
            None => {}
        }

        match entry.sidecar_written {
            Some(true) => totals.xmp_written_count += 1,
            Some(false) => totals.xmp_failed_count += 1,
            None => {}
        }
    }

    totals.triage_unreadable_count = triage.unreadable_count;
    totals.triage_black_frame_count = triage.black_frame_count;
    totals
}

fn compute_safe_to_format(backup_dest_configured: bool, totals: &Totals) -> bool {
    backup_dest_configured
        && totals.fail_count == 0
        && totals.backup_fail_count == 0
        && totals.verified_mismatch == 0
        && totals.backup_verified_mismatch == 0
        && (totals.success_count + totals.skip_count) == (totals.backup_success_count + totals.backup_skip_count)
        && totals.triage_unreadable_count == 0
}

fn verify_mode_label(mode: VerifyMode) -> &'static str {
    match mode {
        VerifyMode::None => "none",
        VerifyMode::Sentinel => "sentinel",
        VerifyMode::Full => "full",
    }
}

fn was_cancelled(cancel: &Option<CancelToken>) -> bool {
    cancel.as_ref().map(|c| c.is_cancelled()).unwrap_or(false)
}

/// Expand a leading `~` to the user's home directory. Paths without a
/// leading `~` pass through untouched.
fn expand_tilde(path: &Path) -> PathBuf {
    let Some(path_str) = path.to_str() else {
        return path.to_path_buf();
    };
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(base_dirs) = directories::BaseDirs::new() {
            return base_dirs.home_dir().join(rest);
        }
    } else if path_str == "~" {
        if let Some(base_dirs) = directories::BaseDirs::new() {
            return base_dirs.home_dir().to_path_buf();
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_media(dir: &Path, rel: &str, bytes: &[u8]) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }

    fn base_params(source: &Path, dest: &Path) -> IngestParams {
        IngestParams::new(source.to_path_buf(), dest.to_path_buf(), "shoot")
    }

    #[test]
    fn s1_classic_legacy_routing() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("card");
        let dest = tmp.path().join("dest");
        write_media(&source, "a.jpg", b"aaa");
        write_media(&source, "b.jpg", b"bbb");
        write_media(&source, "c.jpg", b"ccc");
        write_media(&source, "d.nef", b"ddd");
        write_media(&source, "e.mov", b"eee");
        write_media(&source, ".DS_Store", b"junk");
        write_media(&source, "notes.txt", b"junk");

        let params = base_params(&source, &dest);
        let manifest = run_ingest(params, None).unwrap();

        assert_eq!(manifest.totals.file_count, 5);
        assert_eq!(manifest.totals.success_count, 5);
        assert_eq!(manifest.totals.fail_count, 0);
        assert!(manifest.files.iter().all(|f| f.status == FileStatus::Copied));
        assert!(manifest.files.iter().all(|f| f.dst_rel.starts_with("01_RAW/")));
    }

    #[test]
    fn s2_overwrite_false_rerun_skips_everything() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("card");
        let dest = tmp.path().join("dest");
        write_media(&source, "a.jpg", b"aaa");

        run_ingest(base_params(&source, &dest), None).unwrap();
        let rerun = run_ingest(base_params(&source, &dest), None).unwrap();

        assert_eq!(rerun.totals.skip_count, 1);
        assert_eq!(rerun.totals.success_count, 0);
        assert!(rerun.files.iter().all(|f| f.status == FileStatus::SkippedExists));
    }

    #[test]
    fn s4_dedupe_across_two_cards() {
        // Both sibling directories are scanned within a single run -- the
        // dedupe map lives only for the run's duration.
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source");
        let dest = tmp.path().join("dest");
        write_media(&source, "card_a/IMG_001.jpg", b"shared-bytes");
        write_media(&source, "card_a/only_a.jpg", b"aaa");
        write_media(&source, "card_b/IMG_001.jpg", b"shared-bytes");

        let mut params = base_params(&source, &dest);
        params.dedupe = true;
        let manifest = run_ingest(params, None).unwrap();

        assert_eq!(manifest.totals.file_count, 3);
        assert_eq!(manifest.totals.success_count, 2);
        assert_eq!(manifest.totals.duplicate_count, 1);
        assert_eq!(manifest.totals.bytes_saved, "shared-bytes".len() as u64);

        let duplicate = manifest
            .files
            .iter()
            .find(|f| f.status == FileStatus::SkippedDuplicate)
            .unwrap();
        let canonical = manifest
            .files
            .iter()
            .find(|f| f.dst_rel == *duplicate.duplicate_of.as_ref().unwrap())
            .unwrap();
        assert_eq!(canonical.status, FileStatus::Copied);
        assert_eq!(canonical.hash, duplicate.hash);
    }

    #[test]
    fn s5_backup_happy_path_is_safe_to_format() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("card");
        let dest = tmp.path().join("dest");
        let backup = tmp.path().join("backup");
        write_media(&source, "a.jpg", b"aaa");
        write_media(&source, "b.jpg", b"bbb");

        let mut params = base_params(&source, &dest);
        params.backup_dest = Some(backup);
        params.verify_mode = VerifyMode::Sentinel;
        let manifest = run_ingest(params, None).unwrap();

        assert!(manifest.safe_to_format);
        assert_eq!(manifest.totals.backup_success_count, 2);
        assert_eq!(manifest.totals.backup_verified_ok, 2);
    }

    #[test]
    fn no_backup_is_never_safe_to_format() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("card");
        let dest = tmp.path().join("dest");
        write_media(&source, "a.jpg", b"aaa");

        let manifest = run_ingest(base_params(&source, &dest), None).unwrap();
        assert!(!manifest.safe_to_format);
    }

    #[test]
    fn rejects_project_name_with_separator() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("card");
        write_media(&source, "a.jpg", b"aaa");
        let mut params = base_params(&source, &tmp.path().join("dest"));
        params.project_name = "bad/name".to_string();
        assert!(run_ingest(params, None).is_err());
    }

    #[test]
    fn s3_sentinel_verify_small_run_verifies_all() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("card");
        let dest = tmp.path().join("dest");
        write_media(&source, "a.jpg", b"aaa");
        write_media(&source, "b.jpg", b"bbb");
        write_media(&source, "c.jpg", b"ccc");
        write_media(&source, "d.nef", b"ddd");
        write_media(&source, "e.mov", b"eee");

        let mut params = base_params(&source, &dest);
        params.verify_mode = VerifyMode::Sentinel;
        let manifest = run_ingest(params, None).unwrap();

        assert_eq!(manifest.totals.verified_count, 5);
        assert_eq!(manifest.totals.verified_ok, 5);
        assert_eq!(manifest.totals.verified_mismatch, 0);
    }

    /// Flags any entry whose source bytes are under `min_bytes` as
    /// unreadable -- stands in for a real image decoder for S6.
    struct TinyFileIsUnreadable {
        min_bytes: u64,
    }

    impl TriageEngine for TinyFileIsUnreadable {
        fn run(
            &self,
            entries: &mut [FileEntry],
            _project_root: &Path,
            _on_event: &mut Option<&mut ProgressCallback<'_>>,
        ) -> crate::model::TriageSummary {
            let mut summary = crate::model::TriageSummary {
                file_count: entries.len(),
                ..Default::default()
            };
            for entry in entries.iter_mut() {
                if entry.status == FileStatus::Copied && entry.bytes < self.min_bytes {
                    entry.triage_flags.push(crate::model::TriageFlag {
                        kind: crate::model::TriageKind::Unreadable,
                        reason: "decoder rejected file".to_string(),
                        confidence: 0.95,
                        metric: None,
                    });
                    summary.unreadable_count += 1;
                    summary.flagged_files.push(entry.dst_rel.clone());
                }
            }
            summary
        }
    }

    #[test]
    fn s6_unreadable_file_forces_unsafe() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("card");
        let dest = tmp.path().join("dest");
        let backup = tmp.path().join("backup");
        write_media(&source, "a.jpg", b"valid jpeg bytes here");
        write_media(&source, "b.jpg", b"valid jpeg bytes here too");
        write_media(&source, "c.jpg", b"another valid jpeg payload");
        write_media(&source, "CORRUPT.jpg", b"CORRUPT!");

        let mut params = base_params(&source, &dest);
        params.backup_dest = Some(backup);
        params.verify_mode = VerifyMode::Sentinel;
        params.triage_engine = Some(Box::new(TinyFileIsUnreadable { min_bytes: 16 }));
        let manifest = run_ingest(params, None).unwrap();

        assert_eq!(manifest.totals.success_count, 4);
        assert_eq!(manifest.totals.triage_unreadable_count, 1);
        assert!(!manifest.safe_to_format);
        let html = crate::report::render(&manifest);
        assert!(html.contains("Unreadable File"));
    }

    #[test]
    fn s7_template_routing_by_media_type() {
        use crate::model::{MediaType, RoutingRule, RuleMatch};

        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("card");
        let dest = tmp.path().join("dest");
        write_media(&source, "a.jpg", b"aaa");
        write_media(&source, "b.png", b"bbb");
        write_media(&source, "c.nef", b"ccc");
        write_media(&source, "d.mov", b"ddd");

        let template = FolderTemplate {
            id: "basic".to_string(),
            name: "Basic".to_string(),
            description: "raw/video/photo split".to_string(),
            rules: vec![
                RoutingRule {
                    label: "raw".to_string(),
                    matches: Some(RuleMatch::MediaType(MediaType::Raw)),
                    dest_pattern: "RAW".to_string(),
                },
                RoutingRule {
                    label: "video".to_string(),
                    matches: Some(RuleMatch::MediaType(MediaType::Video)),
                    dest_pattern: "VIDEO".to_string(),
                },
                RoutingRule {
                    label: "catch_all".to_string(),
                    matches: None,
                    dest_pattern: "PHOTO".to_string(),
                },
            ],
            scaffold_dirs: vec!["RAW".to_string(), "VIDEO".to_string(), "PHOTO".to_string()],
            token_defaults: std::collections::HashMap::new(),
        };

        let mut params = base_params(&source, &dest);
        params.folder_template = Some(template);
        let manifest = run_ingest(params, None).unwrap();

        let by_src = |rel: &str| manifest.files.iter().find(|f| f.src_rel == rel).unwrap();
        assert!(by_src("c.nef").dst_rel.starts_with("RAW/"));
        assert_eq!(by_src("c.nef").routed_by, "raw");
        assert!(by_src("d.mov").dst_rel.starts_with("VIDEO/"));
        assert!(by_src("a.jpg").dst_rel.starts_with("PHOTO/"));
        assert!(by_src("b.png").dst_rel.starts_with("PHOTO/"));
        assert!(!dest.join("shoot").join("01_RAW").exists());
    }
}
