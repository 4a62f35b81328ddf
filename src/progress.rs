//! Typed, coalesced progress event stream.
//!
//! Progress is modeled as a message stream, not a callback the orchestrator
//! reaches into -- the caller supplies a sink closure and the orchestrator
//! only ever calls `ProgressSink::emit`. Events are totally ordered within
//! one run.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IngestEvent {
    #[serde(rename = "ingest.start")]
    Start { source_path: String, project_root: String },

    #[serde(rename = "ingest.scan.progress")]
    ScanProgress { discovered_count: usize },

    #[serde(rename = "ingest.copy.progress")]
    CopyProgress {
        index: usize,
        total: usize,
        rel_path: String,
        bytes_copied: u64,
        total_bytes_copied: u64,
    },

    #[serde(rename = "ingest.dedupe.hit")]
    DedupeHit {
        rel_path: String,
        duplicate_of: String,
        bytes_saved_total: u64,
        duplicate_count_total: usize,
    },

    #[serde(rename = "ingest.verify.progress")]
    VerifyProgress {
        mode: String,
        verified_count: usize,
        verified_total: usize,
    },

    #[serde(rename = "ingest.xmp.progress")]
    XmpProgress {
        written_count: usize,
        failed_count: usize,
        total: usize,
    },

    #[serde(rename = "ingest.backup.start")]
    BackupStart { backup_root: String },

    #[serde(rename = "ingest.backup.copy.progress")]
    BackupCopyProgress {
        index: usize,
        total: usize,
        rel_path: String,
        bytes_copied: u64,
        total_bytes_copied: u64,
    },

    #[serde(rename = "ingest.backup.verify.progress")]
    BackupVerifyProgress {
        mode: String,
        verified_count: usize,
        verified_total: usize,
    },

    #[serde(rename = "ingest.triage.progress")]
    TriageProgress { index: usize, total: usize },

    #[serde(rename = "ingest.triage.done")]
    TriageDone {
        unreadable_count: usize,
        black_frame_count: usize,
    },

    #[serde(rename = "ingest.report.generated")]
    ReportGenerated { manifest_path: String, report_path: String },

    #[serde(rename = "ingest.done")]
    Done {
        success_count: usize,
        fail_count: usize,
        elapsed_ms: u64,
        safe_to_format: bool,
    },
}

/// Callback type accepted by `run_ingest`. `None` is a valid, zero-cost choice.
pub type ProgressCallback<'a> = dyn FnMut(IngestEvent) + 'a;

/// Emit through an optional sink; a no-op when the caller didn't ask for events.
pub(crate) fn emit(sink: &mut Option<&mut ProgressCallback<'_>>, event: IngestEvent) {
    if let Some(cb) = sink.as_mut() {
        cb(event);
    }
}
