//! Source scanner.

use std::path::Path;

use walkdir::WalkDir;

use crate::constants::SCAN_PROGRESS_INTERVAL;
use crate::error::{IngestError, Result};
use crate::model::{MediaType, ScannedFile};
use crate::progress::{self, IngestEvent, ProgressCallback};

/// Walk `source` recursively, yielding one `ScannedFile` per included file
/// in deterministic `src_rel`-ascending order. Directory entries and files
/// whose name starts with `.` are skipped, as are extensions outside the
/// fixed media set.
pub fn scan(source: &Path, on_event: &mut Option<&mut ProgressCallback<'_>>) -> Result<Vec<ScannedFile>> {
    if !source.is_dir() {
        return Err(IngestError::InvalidSource(format!(
            "source path does not exist or is not a directory: {}",
            source.display()
        )));
    }

    let mut files = Vec::new();
    let mut discovered = 0usize;

    let walker = WalkDir::new(source).into_iter().filter_entry(|entry| {
        entry
            .file_name()
            .to_str()
            .map(|name| entry.depth() == 0 || !name.starts_with('.'))
            .unwrap_or(true)
    });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let Some(media_type) = MediaType::from_extension(ext) else {
            continue;
        };

        let rel = path.strip_prefix(source).unwrap_or(path);
        let src_rel = to_posix(rel);
        let bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        files.push(ScannedFile {
            src_rel,
            abs_path: path.to_path_buf(),
            bytes,
            media_type,
        });

        discovered += 1;
        if discovered % SCAN_PROGRESS_INTERVAL == 0 {
            progress::emit(on_event, IngestEvent::ScanProgress { discovered_count: discovered });
        }
    }

    files.sort_by(|a, b| a.src_rel.as_bytes().cmp(b.src_rel.as_bytes()));
    progress::emit(on_event, IngestEvent::ScanProgress { discovered_count: discovered });

    Ok(files)
}

/// Convert a platform path into a forward-slash, POSIX-style relative path.
pub fn to_posix(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str, bytes: usize) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![0u8; bytes]).unwrap();
    }

    #[test]
    fn filters_hidden_and_non_media_files() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.jpg", 10);
        touch(tmp.path(), ".DS_Store", 4);
        touch(tmp.path(), "notes.txt", 4);
        touch(tmp.path(), "sub/.hidden/b.jpg", 4);
        touch(tmp.path(), "b.NEF", 10);

        let mut sink: Option<&mut ProgressCallback<'_>> = None;
        let files = scan(tmp.path(), &mut sink).unwrap();
        let rels: Vec<_> = files.iter().map(|f| f.src_rel.clone()).collect();

        assert_eq!(rels, vec!["a.jpg", "b.NEF"]);
        assert_eq!(files[1].media_type, MediaType::Raw);
    }

    #[test]
    fn sorts_deterministically_by_src_rel() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "z.jpg", 1);
        touch(tmp.path(), "a.jpg", 1);
        touch(tmp.path(), "m/b.jpg", 1);

        let mut sink: Option<&mut ProgressCallback<'_>> = None;
        let files = scan(tmp.path(), &mut sink).unwrap();
        let rels: Vec<_> = files.iter().map(|f| f.src_rel.clone()).collect();
        assert_eq!(rels, vec!["a.jpg", "m/b.jpg", "z.jpg"]);
    }

    #[test]
    fn rejects_missing_source() {
        let mut sink: Option<&mut ProgressCallback<'_>> = None;
        let result = scan(Path::new("/does/not/exist"), &mut sink);
        assert!(result.is_err());
    }
}
