//! Atomic file copier.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::constants::TEMP_FILE_SUFFIX;
use crate::error::{IngestError, Result};
use crate::fsutil::{create_dir_owner_only, create_owner_only_file};
use crate::hash::HashingReader;
use crate::model::{FileStatus, HashAlgorithm};

/// Outcome of a single atomic copy attempt.
pub struct CopyOutcome {
    pub status: FileStatus,
    pub bytes: u64,
    pub hash: Option<String>,
    pub error: Option<String>,
}

/// Copy `src` to `dst`, hashing while streaming, and only renaming the
/// temp file into place once the stream has closed successfully.
///
/// Guarantees:
/// 1. `overwrite=false` and `dst` exists -> `skipped_exists` without
///    touching `dst`.
/// 2. Otherwise write to a sibling `.partial` temp file and rename it into
///    place only after the stream closes -- readers never see a half
///    written `dst`.
/// 3. The temp file is removed on any error path (best-effort).
/// 4. The destination directory is created if missing.
/// 5. Files are created owner-only; directories created along the way are
///    owner-only too.
pub fn atomic_copy(src: &Path, dst: &Path, algo: HashAlgorithm, overwrite: bool) -> CopyOutcome {
    match atomic_copy_inner(src, dst, algo, overwrite) {
        Ok(outcome) => outcome,
        Err(e) => CopyOutcome {
            status: FileStatus::Error,
            bytes: 0,
            hash: None,
            error: Some(e.to_string()),
        },
    }
}

fn atomic_copy_inner(src: &Path, dst: &Path, algo: HashAlgorithm, overwrite: bool) -> Result<CopyOutcome> {
    if !overwrite && dst.exists() {
        let bytes = fs::metadata(dst)?.len();
        return Ok(CopyOutcome {
            status: FileStatus::SkippedExists,
            bytes,
            hash: None,
            error: None,
        });
    }

    let dst_dir = dst.parent().ok_or_else(|| {
        IngestError::Copy(format!("destination has no parent directory: {}", dst.display()))
    })?;
    create_dir_owner_only(dst_dir)?;

    let tmp_path = sibling_temp_path(dst);

    let copy_result = (|| -> Result<(String, u64)> {
        let src_file = File::open(src).map_err(|e| IngestError::Copy(format!("open source: {e}")))?;
        let mut reader = HashingReader::new(BufReader::new(src_file), algo);

        let tmp_file = create_owner_only_file(&tmp_path).map_err(|e| IngestError::Copy(format!("create temp file: {e}")))?;
        let mut writer = BufWriter::new(tmp_file);

        io::copy(&mut reader, &mut writer).map_err(|e| IngestError::Copy(format!("stream copy: {e}")))?;
        writer.flush().map_err(|e| IngestError::Copy(format!("flush: {e}")))?;
        writer
            .into_inner()
            .map_err(|e| IngestError::Copy(format!("finalize writer: {e}")))?
            .sync_all()
            .map_err(|e| IngestError::Copy(format!("fsync: {e}")))?;

        let (hash, bytes) = reader.finish();

        fs::rename(&tmp_path, dst).map_err(|e| {
            IngestError::Copy(format!(
                "rename temp into place (must be same filesystem as destination): {e}"
            ))
        })?;

        if let Ok(src_meta) = fs::metadata(src) {
            if let Ok(modified) = src_meta.modified() {
                let _ = filetime::set_file_mtime(dst, filetime::FileTime::from_system_time(modified));
            }
        }

        Ok((hash, bytes))
    })();

    match copy_result {
        Ok((hash, bytes)) => Ok(CopyOutcome {
            status: FileStatus::Copied,
            bytes,
            hash: Some(hash),
            error: None,
        }),
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            Err(e)
        }
    }
}

/// The temp path is a sibling of the destination -- never a process-wide
/// temp directory -- so the final rename is always same-filesystem.
fn sibling_temp_path(dst: &Path) -> PathBuf {
    let file_name = dst
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    dst.with_file_name(format!("{file_name}{TEMP_FILE_SUFFIX}"))
}
