//! HTML proof renderer.
//!
//! Report-write failures are best-effort: `write_report` returning an
//! error never aborts the run -- that failure mode is fatal only for the
//! manifest itself.

use std::io;
use std::path::Path;

use maud::{html, Markup, DOCTYPE};

use crate::fsutil::{create_dir_owner_only, create_owner_only_file};
use crate::model::{FileEntry, FileStatus, IngestManifest};

pub fn render(manifest: &IngestManifest) -> String {
    markup(manifest).into_string()
}

pub fn write_report(manifest: &IngestManifest, path: &Path) -> io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "report path has no parent"))?;
    create_dir_owner_only(dir)?;
    let mut file = create_owner_only_file(path)?;
    use std::io::Write;
    file.write_all(render(manifest).as_bytes())
}

fn markup(m: &IngestManifest) -> Markup {
    let (banner_label, banner_class) = if m.safe_to_format {
        ("SAFE TO FORMAT", "banner-safe")
    } else {
        ("NOT SAFE TO FORMAT", "banner-unsafe")
    };

    let failures: Vec<&FileEntry> = m.files.iter().filter(|f| f.status == FileStatus::Error).collect();
    let backup_failures: Vec<&FileEntry> = m
        .files
        .iter()
        .filter(|f| f.backup_status == Some(FileStatus::Error))
        .collect();
    let mismatches: Vec<&FileEntry> = m.files.iter().filter(|f| f.verified == Some(false)).collect();
    let backup_mismatches: Vec<&FileEntry> = m.files.iter().filter(|f| f.backup_verified == Some(false)).collect();
    let duplicates: Vec<&FileEntry> = m
        .files
        .iter()
        .filter(|f| f.status == FileStatus::SkippedDuplicate)
        .collect();

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "Ingest proof -- " (m.project_name) }
                style { (STYLE) }
            }
            body {
                div class=(banner_class) { (banner_label) }

                h1 { "Ingest proof: " (m.project_name) }

                table class="summary" {
                    tr { th { "Source" } td { (m.source) } }
                    tr { th { "Project root" } td { (m.project_root) } }
                    @if let Some(backup_root) = &m.backup_project_root {
                        tr { th { "Backup root" } td { (backup_root) } }
                    }
                    tr { th { "Hash algorithm" } td { (m.hash_algo) } }
                    tr { th { "Verify mode" } td { (m.verify_mode) } }
                    tr { th { "Started" } td { (m.started_at) } }
                    tr { th { "Finished" } td { (m.finished_at) } }
                    tr { th { "Files" } td { (m.totals.file_count) } }
                    tr { th { "Copied" } td { (m.totals.success_count) } }
                    tr { th { "Failed" } td { (m.totals.fail_count) } }
                    tr { th { "Skipped (already present)" } td { (m.totals.skip_count) } }
                    tr { th { "Duplicates skipped" } td { (m.totals.duplicate_count) } }
                    tr { th { "Bytes saved by dedupe" } td { (m.totals.bytes_saved) } }
                    tr { th { "Total bytes copied" } td { (m.totals.total_bytes) } }
                }

                p class="verify-note" {
                    "Verified " (m.totals.verified_count) " of " (m.totals.success_count)
                    " primary files (" (m.totals.verified_ok) " ok, " (m.totals.verified_mismatch) " mismatched)."
                    @if m.backup_project_root.is_some() {
                        " Verified " (m.totals.backup_verified_count) " backup files ("
                        (m.totals.backup_verified_ok) " ok, " (m.totals.backup_verified_mismatch) " mismatched)."
                    }
                }

                @if m.triage.unreadable_count > 0 || m.triage.black_frame_count > 0 {
                    h2 { "Triage flags" }
                    table {
                        thead { tr { th { "File" } th { "Kind" } th { "Reason" } } }
                        tbody {
                            @for file in &m.files {
                                @for flag in &file.triage_flags {
                                    tr {
                                        td { (file.dst_rel) }
                                        td {
                                            @match flag.kind {
                                                crate::model::TriageKind::Unreadable => "Unreadable File",
                                                crate::model::TriageKind::BlackFrame => "Black Frame",
                                            }
                                        }
                                        td { (flag.reason) }
                                    }
                                }
                            }
                        }
                    }
                }

                @if !failures.is_empty() {
                    (entry_table("Primary failures", &failures, |f| f.error.clone().unwrap_or_default()))
                }
                @if !backup_failures.is_empty() {
                    (entry_table("Backup failures", &backup_failures, |f| f.backup_error.clone().unwrap_or_default()))
                }
                @if !mismatches.is_empty() {
                    (entry_table("Primary verification mismatches", &mismatches, |f| f.hash_dest.clone().unwrap_or_default()))
                }
                @if !backup_mismatches.is_empty() {
                    (entry_table("Backup verification mismatches", &backup_mismatches, |f| f.backup_hash_dest.clone().unwrap_or_default()))
                }
                @if !duplicates.is_empty() {
                    (entry_table("Duplicates skipped", &duplicates, |f| f.duplicate_of.clone().unwrap_or_default()))
                }

                h2 { "All files" }
                table {
                    thead { tr { th { "Source" } th { "Destination" } th { "Status" } th { "Routed by" } } }
                    tbody {
                        @for file in &m.files {
                            tr {
                                td { (file.src_rel) }
                                td { (file.dst_rel) }
                                td { (status_label(file.status)) }
                                td { (file.routed_by) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn entry_table(title: &str, entries: &[&FileEntry], detail: impl Fn(&FileEntry) -> String) -> Markup {
    html! {
        h2 { (title) }
        table {
            thead { tr { th { "File" } th { "Detail" } } }
            tbody {
                @for entry in entries {
                    tr {
                        td { (entry.src_rel) }
                        td { (detail(entry)) }
                    }
                }
            }
        }
    }
}

fn status_label(status: FileStatus) -> &'static str {
    match status {
        FileStatus::Copied => "copied",
        FileStatus::SkippedExists => "skipped_exists",
        FileStatus::SkippedDuplicate => "skipped_duplicate",
        FileStatus::Error => "error",
    }
}

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 2rem; }
.banner-safe, .banner-unsafe { padding: 1rem; font-weight: bold; font-size: 1.25rem; color: white; }
.banner-safe { background: #1a7f37; }
.banner-unsafe { background: #c0362c; }
table { border-collapse: collapse; margin-bottom: 1.5rem; }
th, td { border: 1px solid #ccc; padding: 0.25rem 0.5rem; text-align: left; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TriageFlag, TriageKind, TriageSummary, Totals, MediaType, ScannedFile};

    fn base_manifest() -> IngestManifest {
        IngestManifest {
            tool_version: 1,
            app_version: "0.1.0".into(),
            source: "/card".into(),
            project_root: "/project".into(),
            backup_project_root: None,
            project_name: "shoot <script>".into(),
            hash_algo: "blake3".into(),
            verify_mode: "sentinel".into(),
            started_at: "2024-01-01T00:00:00Z".into(),
            finished_at: "2024-01-01T00:00:01Z".into(),
            template_id: None,
            safe_to_format: true,
            triage: TriageSummary::default(),
            totals: Totals::default(),
            files: Vec::new(),
            manifest_path: None,
            report_path: None,
        }
    }

    #[test]
    fn escapes_html_in_manifest_strings() {
        let html = render(&base_manifest());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn safe_run_shows_safe_banner() {
        let html = render(&base_manifest());
        assert!(html.contains("SAFE TO FORMAT"));
        assert!(!html.contains("NOT SAFE TO FORMAT"));
    }

    #[test]
    fn triage_section_only_rendered_when_flagged() {
        let mut manifest = base_manifest();
        manifest.safe_to_format = false;
        manifest.triage = TriageSummary {
            file_count: 1,
            unreadable_count: 1,
            black_frame_count: 0,
            flagged_files: vec!["RAW/bad.jpg".into()],
        };
        let scanned = ScannedFile {
            src_rel: "bad.jpg".into(),
            abs_path: "bad.jpg".into(),
            bytes: 8,
            media_type: MediaType::Photo,
        };
        let mut entry = FileEntry::new(&scanned, "RAW/bad.jpg".into(), "raw".into());
        entry.status = FileStatus::Copied;
        entry.triage_flags.push(TriageFlag {
            kind: TriageKind::Unreadable,
            reason: "decoder rejected file".into(),
            confidence: 0.9,
            metric: None,
        });
        manifest.files.push(entry);

        let html = render(&manifest);
        assert!(html.contains("Unreadable File"));
        assert!(html.contains("NOT SAFE TO FORMAT"));
    }
}
