//! Integrity triage.
//!
//! Image/video decoding is out of scope for this core;
//! `TriageEngine` is the seam a host application plugs a real decoder into.
//! The default engine never flags anything, which keeps `safe_to_format`
//! driven entirely by copy/verify outcomes until a real engine is wired in.

use std::path::Path;

use crate::model::{FileEntry, TriageSummary};
use crate::progress::{self, IngestEvent, ProgressCallback};

/// Inspects copied files for corruption signals (unreadable containers,
/// all-black frames) and flags the affected `FileEntry` records in place.
pub trait TriageEngine {
    /// `project_root` is where the copied files actually live, since
    /// triage runs against destination copies, never the source card.
    fn run(
        &self,
        entries: &mut [FileEntry],
        project_root: &Path,
        on_event: &mut Option<&mut ProgressCallback<'_>>,
    ) -> TriageSummary;
}

/// No-op engine: every file passes. Used when the host application hasn't
/// wired in a real decoder.
#[derive(Debug, Default)]
pub struct NullTriageEngine;

impl TriageEngine for NullTriageEngine {
    fn run(
        &self,
        entries: &mut [FileEntry],
        _project_root: &Path,
        on_event: &mut Option<&mut ProgressCallback<'_>>,
    ) -> TriageSummary {
        let total = entries.len();
        progress::emit(on_event, IngestEvent::TriageProgress { index: total, total });
        progress::emit(
            on_event,
            IngestEvent::TriageDone {
                unreadable_count: 0,
                black_frame_count: 0,
            },
        );
        TriageSummary {
            file_count: total,
            unreadable_count: 0,
            black_frame_count: 0,
            flagged_files: Vec::new(),
        }
    }
}
