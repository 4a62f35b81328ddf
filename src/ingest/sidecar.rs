//! XMP metadata sidecar writer.
//!
//! Sidecar failures are recorded on `FileEntry.sidecar_error` and never
//! affect `safe_to_format` -- metadata stamping is a convenience pass over
//! already-safe copies, not a safety gate.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::model::FileEntry;

/// Metadata values a caller wants stamped onto copied files. All fields are
/// optional; an empty patch still writes a sidecar with just the schema tag.
#[derive(Debug, Clone, Default, Serialize)]
pub struct XmpPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rights: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "webStatement")]
    pub web_statement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit: Option<String>,
}

impl XmpPatch {
    pub fn is_empty(&self) -> bool {
        self.creator.is_none() && self.rights.is_none() && self.web_statement.is_none() && self.credit.is_none()
    }
}

/// Writes a `<original-filename>.xmp.json` sidecar next to the copied file,
/// carrying `patch`. A JSON sidecar rather than real XMP/XML keeps this
/// dependency-free; the field names mirror XMP's `dc`/`plus` namespaces so a
/// downstream tool can map them straight across.
pub fn write_sidecar(entry: &mut FileEntry, project_root: &Path, patch: &XmpPatch) {
    if patch.is_empty() {
        return;
    }
    let dest = project_root.join(&entry.dst_rel);
    let sidecar_path = sidecar_path_for(&dest);

    match serde_json::to_vec_pretty(patch).map(|bytes| fs::write(&sidecar_path, bytes)) {
        Ok(Ok(())) => {
            entry.sidecar_written = Some(true);
            entry.sidecar_path = Some(sidecar_path.to_string_lossy().into_owned());
        }
        Ok(Err(e)) => {
            entry.sidecar_written = Some(false);
            entry.sidecar_error = Some(e.to_string());
        }
        Err(e) => {
            entry.sidecar_written = Some(false);
            entry.sidecar_error = Some(e.to_string());
        }
    }
}

fn sidecar_path_for(dest: &Path) -> std::path::PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".xmp.json");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileStatus, MediaType, ScannedFile};
    use tempfile::TempDir;

    fn entry_for(dst_rel: &str) -> FileEntry {
        let scanned = ScannedFile {
            src_rel: dst_rel.into(),
            abs_path: dst_rel.into(),
            bytes: 1,
            media_type: MediaType::Photo,
        };
        let mut e = FileEntry::new(&scanned, dst_rel.into(), "raw".into());
        e.status = FileStatus::Copied;
        e
    }

    #[test]
    fn empty_patch_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut entry = entry_for("a.jpg");
        write_sidecar(&mut entry, tmp.path(), &XmpPatch::default());
        assert!(entry.sidecar_written.is_none());
    }

    #[test]
    fn writes_sidecar_next_to_destination() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.jpg"), b"x").unwrap();
        let mut entry = entry_for("a.jpg");
        let patch = XmpPatch {
            creator: Some("Jane".into()),
            ..Default::default()
        };
        write_sidecar(&mut entry, tmp.path(), &patch);

        assert_eq!(entry.sidecar_written, Some(true));
        let sidecar_path = tmp.path().join("a.jpg.xmp.json");
        assert!(sidecar_path.exists());
        let contents = std::fs::read_to_string(sidecar_path).unwrap();
        assert!(contents.contains("Jane"));
    }
}
