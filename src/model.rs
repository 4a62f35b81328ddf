//! Data model shared across the ingest pipeline.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One of the three media buckets the scanner partitions files into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Raw,
    Photo,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Raw => "raw",
            MediaType::Photo => "photo",
            MediaType::Video => "video",
        }
    }

    /// Classify a lowercase, dot-less extension into a media bucket.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        if crate::constants::RAW_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaType::Raw)
        } else if crate::constants::PHOTO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaType::Photo)
        } else if crate::constants::VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaType::Video)
        } else {
            None
        }
    }
}

/// The hash algorithm selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Blake3 => "blake3",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Some(HashAlgorithm::Sha256),
            "sha512" => Some(HashAlgorithm::Sha512),
            "blake3" => Some(HashAlgorithm::Blake3),
            _ => None,
        }
    }
}

/// Rehash strategy selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyMode {
    None,
    Sentinel,
    Full,
}

impl VerifyMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Some(VerifyMode::None),
            "sentinel" => Some(VerifyMode::Sentinel),
            "full" => Some(VerifyMode::Full),
            _ => None,
        }
    }
}

/// One source file discovered by the scanner.
/// Lifetime: created by the scanner, consumed immediately by the orchestrator.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Source-relative path, forward-slash normalized. Identity within a run.
    pub src_rel: String,
    pub abs_path: PathBuf,
    pub bytes: u64,
    pub media_type: MediaType,
}

/// Per-file copy/verify outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Copied,
    SkippedExists,
    SkippedDuplicate,
    Error,
}

/// A triage flag kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageKind {
    Unreadable,
    BlackFrame,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageFlag {
    pub kind: TriageKind,
    pub reason: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<i64>,
}

/// The authoritative per-file record, mutated across phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub src_rel: String,
    pub dst_rel: String,
    pub bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_dest: Option<String>,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<String>,
    pub media_type: MediaType,
    pub routed_by: String,
    /// Tri-state: Some(true) = match, Some(false) = mismatch, None = not checked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_status: Option<FileStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_hash_dest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidecar_written: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidecar_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidecar_error: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triage_flags: Vec<TriageFlag>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileEntry {
    pub fn new(scanned: &ScannedFile, dst_rel: String, routed_by: String) -> Self {
        Self {
            src_rel: scanned.src_rel.clone(),
            dst_rel,
            bytes: scanned.bytes,
            hash: None,
            hash_dest: None,
            status: FileStatus::Error,
            duplicate_of: None,
            media_type: scanned.media_type,
            routed_by,
            verified: None,
            backup_status: None,
            backup_hash: None,
            backup_hash_dest: None,
            backup_verified: None,
            backup_error: None,
            sidecar_written: None,
            sidecar_path: None,
            sidecar_error: None,
            triage_flags: Vec::new(),
            error: None,
        }
    }
}

/// A routing rule's match predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMatch {
    MediaType(MediaType),
    Extensions(Vec<String>),
}

impl RuleMatch {
    pub fn accepts(&self, file: &ScannedFile) -> bool {
        match self {
            RuleMatch::MediaType(mt) => *mt == file.media_type,
            RuleMatch::Extensions(exts) => {
                let ext = format!(
                    ".{}",
                    file.src_rel
                        .rsplit('.')
                        .next()
                        .unwrap_or("")
                        .to_ascii_lowercase()
                );
                exts.iter().any(|e| e.to_ascii_lowercase() == ext)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRule {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<RuleMatch>,
    pub dest_pattern: String,
}

impl RoutingRule {
    /// No match field means catch-all -- always accepts.
    pub fn accepts(&self, file: &ScannedFile) -> bool {
        match &self.matches {
            None => true,
            Some(m) => m.accepts(file),
        }
    }
}

/// A declarative routing config consumed by the template engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rules: Vec<RoutingRule>,
    pub scaffold_dirs: Vec<String>,
    #[serde(default)]
    pub token_defaults: HashMap<String, String>,
}

/// The substitution environment for one file.
#[derive(Debug, Clone, Default)]
pub struct TokenContext {
    pub values: HashMap<String, String>,
}

impl TokenContext {
    pub fn get(&self, token: &str) -> &str {
        self.values.get(token).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn set(&mut self, token: impl Into<String>, value: impl Into<String>) {
        self.values.insert(token.into(), value.into());
    }
}

/// Aggregate triage results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageSummary {
    pub file_count: usize,
    pub unreadable_count: usize,
    pub black_frame_count: usize,
    pub flagged_files: Vec<String>,
}

/// Manifest totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Totals {
    pub file_count: usize,
    pub success_count: usize,
    pub fail_count: usize,
    pub skip_count: usize,
    pub duplicate_count: usize,
    pub bytes_saved: u64,
    pub total_bytes: u64,
    pub verified_count: usize,
    pub verified_ok: usize,
    pub verified_mismatch: usize,
    pub backup_success_count: usize,
    pub backup_fail_count: usize,
    pub backup_skip_count: usize,
    pub backup_verified_count: usize,
    pub backup_verified_ok: usize,
    pub backup_verified_mismatch: usize,
    pub xmp_written_count: usize,
    pub xmp_failed_count: usize,
    pub triage_unreadable_count: usize,
    pub triage_black_frame_count: usize,
}

/// The per-run record written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestManifest {
    pub tool_version: u32,
    pub app_version: String,
    pub source: String,
    pub project_root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_project_root: Option<String>,
    pub project_name: String,
    pub hash_algo: String,
    pub verify_mode: String,
    pub started_at: String,
    pub finished_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub safe_to_format: bool,
    pub triage: TriageSummary,
    pub totals: Totals,
    pub files: Vec<FileEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
}
