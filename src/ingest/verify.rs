//! Verifier.
//!
//! The same sentinel-selection and rehash algorithm backs both the primary
//! and backup legs; `Leg` picks which fields on `FileEntry` get read and
//! written.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use crate::constants::{SENTINEL_FULL_VERIFY_THRESHOLD, SENTINEL_SAMPLE_SIZE, VERIFY_PROGRESS_INTERVAL};
use crate::hash::hash_reader;
use crate::model::{FileEntry, FileStatus, HashAlgorithm, VerifyMode};
use crate::progress::{self, IngestEvent, ProgressCallback};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Primary,
    Backup,
}

/// Rehash the selected subset of `entries` under `root` and record
/// `verified`/`hash_dest` (or the backup equivalents). Entries not eligible
/// for this leg (wrong status) are left untouched.
pub fn verify(
    entries: &mut [FileEntry],
    root: &Path,
    algo: HashAlgorithm,
    mode: VerifyMode,
    leg: Leg,
    on_event: &mut Option<&mut ProgressCallback<'_>>,
) {
    if mode == VerifyMode::None {
        return;
    }

    let candidates: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| is_eligible(e, leg))
        .map(|(i, _)| i)
        .collect();

    let selected = match mode {
        VerifyMode::None => Vec::new(),
        VerifyMode::Full => candidates,
        VerifyMode::Sentinel => select_sentinel(&candidates, entries),
    };

    let total = selected.len();
    let mode_label = mode_label(mode);
    let mut verified_count = 0usize;

    for &idx in &selected {
        rehash_one(&mut entries[idx], root, algo, leg);
        verified_count += 1;
        if verified_count % VERIFY_PROGRESS_INTERVAL == 0 || verified_count == total {
            emit_progress(on_event, leg, mode_label, verified_count, total);
        }
    }
    if total == 0 {
        emit_progress(on_event, leg, mode_label, 0, 0);
    }
}

fn is_eligible(entry: &FileEntry, leg: Leg) -> bool {
    match leg {
        Leg::Primary => entry.status == FileStatus::Copied,
        Leg::Backup => entry.backup_status == Some(FileStatus::Copied),
    }
}

fn mode_label(mode: VerifyMode) -> &'static str {
    match mode {
        VerifyMode::None => "none",
        VerifyMode::Sentinel => "sentinel",
        VerifyMode::Full => "full",
    }
}

fn emit_progress(
    on_event: &mut Option<&mut ProgressCallback<'_>>,
    leg: Leg,
    mode: &str,
    verified_count: usize,
    verified_total: usize,
) {
    let event = match leg {
        Leg::Primary => IngestEvent::VerifyProgress {
            mode: mode.to_string(),
            verified_count,
            verified_total,
        },
        Leg::Backup => IngestEvent::BackupVerifyProgress {
            mode: mode.to_string(),
            verified_count,
            verified_total,
        },
    };
    progress::emit(on_event, event);
}

/// Deterministic sentinel sample: first 25 by ascending `src_rel`, last 25
/// in the same order, and the 25 largest by byte size, de-duplicated.
/// `candidates` is assumed to already be in ascending-`src_rel` order
/// (true because the scanner sorts files before the orchestrator builds
/// entries from them).
fn select_sentinel(candidates: &[usize], entries: &[FileEntry]) -> Vec<usize> {
    if candidates.len() <= SENTINEL_FULL_VERIFY_THRESHOLD {
        return candidates.to_vec();
    }

    let mut picked: BTreeSet<usize> = BTreeSet::new();
    picked.extend(candidates.iter().take(SENTINEL_SAMPLE_SIZE));
    picked.extend(candidates.iter().rev().take(SENTINEL_SAMPLE_SIZE));

    let mut by_size: Vec<usize> = candidates.to_vec();
    by_size.sort_by(|&a, &b| entries[b].bytes.cmp(&entries[a].bytes));
    picked.extend(by_size.into_iter().take(SENTINEL_SAMPLE_SIZE));

    picked.into_iter().collect()
}

fn rehash_one(entry: &mut FileEntry, root: &Path, algo: HashAlgorithm, leg: Leg) {
    let full_path = root.join(&entry.dst_rel);
    let result = File::open(&full_path).and_then(|f| hash_reader(f, algo));

    match leg {
        Leg::Primary => match result {
            Ok((digest, _bytes)) => {
                let matched = Some(&digest) == entry.hash.as_ref();
                entry.hash_dest = Some(digest);
                entry.verified = Some(matched);
            }
            Err(e) => {
                entry.verified = Some(false);
                entry.error = Some(format!("rehash failed: {e}"));
            }
        },
        Leg::Backup => match result {
            Ok((digest, _bytes)) => {
                let matched = Some(&digest) == entry.backup_hash.as_ref();
                entry.backup_hash_dest = Some(digest);
                entry.backup_verified = Some(matched);
            }
            Err(e) => {
                entry.backup_verified = Some(false);
                entry.backup_error = Some(format!("rehash failed: {e}"));
            }
        },
    }
}
