//! Template engine: token expansion and rule-based routing.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Datelike, Utc};

use crate::constants::{LEGACY_RAW_FOLDER, LEGACY_SCAFFOLDS};
use crate::metadata::CaptureInfo;
use crate::model::{FolderTemplate, RoutingRule, ScannedFile, TokenContext};

pub const LEGACY_ROUTED_BY: &str = "legacy";

/// Build the substitution environment for one file. `import_date` is the
/// run's started-at timestamp, used as
/// the calendar fallback when EXIF has no capture date.
pub fn build_token_context(
    file: &ScannedFile,
    capture: &CaptureInfo,
    import_date: DateTime<Utc>,
    template: Option<&FolderTemplate>,
    user_context: &HashMap<String, String>,
) -> TokenContext {
    let mut ctx = TokenContext::default();

    if let Some(t) = template {
        for (k, v) in &t.token_defaults {
            ctx.set(k.clone(), v.clone());
        }
    }

    let calendar = capture.captured_at.unwrap_or(import_date);
    ctx.set("YYYY", format!("{:04}", calendar.year()));
    ctx.set("MM", format!("{:02}", calendar.month()));
    ctx.set("DD", format!("{:02}", calendar.day()));

    let ext = Path::new(&file.src_rel)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string();
    let original_filename = Path::new(&file.src_rel)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    ctx.set("EXT", ext);
    ctx.set("ORIGINAL_FILENAME", original_filename);
    ctx.set("MEDIA_TYPE", file.media_type.as_str());

    if let Some(model) = &capture.camera_model {
        ctx.set("CAMERA_MODEL", model.clone());
        ctx.set("CAMERA_LABEL", model.clone());
    }
    if let Some(serial) = &capture.camera_serial {
        let short = if serial.len() > 4 { &serial[serial.len() - 4..] } else { serial.as_str() };
        ctx.set("CAMERA_SERIAL_SHORT", short);
    }

    for (k, v) in user_context {
        ctx.set(k.clone(), v.clone());
    }

    ctx
}

/// Replace every `{TOKEN}` occurrence in `pattern` with its value from
/// `ctx` in a single left-to-right pass. Token names are the uppercase
/// ASCII + underscore character class; unknown tokens
/// expand to the empty string, never the literal token text. A `{...}`
/// span that doesn't match the token character class is left untouched.
pub fn expand(pattern: &str, ctx: &TokenContext) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '{' {
            if let Some(end) = find_token_close(&chars, i + 1) {
                let token: String = chars[i + 1..end].iter().collect();
                out.push_str(ctx.get(&token));
                i = end + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

/// Find the index of a `}` closing a run of uppercase-ASCII-or-underscore
/// characters starting at `start`. Returns `None` if the span is empty or
/// contains a character outside the token class.
fn find_token_close(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start;
    while j < chars.len() && (chars[j].is_ascii_uppercase() || chars[j] == '_') {
        j += 1;
    }
    if j > start && j < chars.len() && chars[j] == '}' {
        Some(j)
    } else {
        None
    }
}

/// Return the first routing rule that accepts `file`, in declaration order.
pub fn route<'a>(rules: &'a [RoutingRule], file: &ScannedFile) -> Option<&'a RoutingRule> {
    rules.iter().find(|r| r.accepts(file))
}

/// Compute the project-relative destination path for a routed file:
/// `normalize(expanded_dest_pattern / src_rel)`.
pub fn compute_dst_rel(expanded_dest_pattern: &str, src_rel: &str) -> String {
    normalize_path(&format!("{expanded_dest_pattern}/{src_rel}"))
}

/// Legacy (no-template) destination: `01_RAW/<src_rel>`.
pub fn legacy_dst_rel(src_rel: &str) -> String {
    normalize_path(&format!("{LEGACY_RAW_FOLDER}/{src_rel}"))
}

pub fn legacy_scaffolds() -> Vec<String> {
    LEGACY_SCAFFOLDS.iter().map(|s| s.to_string()).collect()
}

/// Forward-slash normalize, collapse empty components, and strip any `..`
/// component so a crafted destination pattern can never escape the
/// project root.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|c| !c.is_empty() && *c != "." && *c != "..")
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MediaType;

    fn ctx_with(pairs: &[(&str, &str)]) -> TokenContext {
        let mut ctx = TokenContext::default();
        for (k, v) in pairs {
            ctx.set(*k, *v);
        }
        ctx
    }

    #[test]
    fn expands_known_tokens() {
        let ctx = ctx_with(&[("YYYY", "2024"), ("MM", "03")]);
        assert_eq!(expand("{YYYY}/{MM}", &ctx), "2024/03");
    }

    #[test]
    fn unknown_tokens_expand_to_empty_string() {
        let ctx = TokenContext::default();
        assert_eq!(expand("prefix-{CAMERA_SERIAL_SHORT}-suffix", &ctx), "prefix--suffix");
    }

    #[test]
    fn non_token_braces_pass_through() {
        let ctx = TokenContext::default();
        assert_eq!(expand("{not a token}", &ctx), "{not a token}");
    }

    #[test]
    fn normalize_strips_dot_dot_and_empty_components() {
        assert_eq!(normalize_path("RAW//../..//sub/file.jpg"), "RAW/sub/file.jpg");
    }

    #[test]
    fn legacy_dst_rel_prefixes_raw() {
        assert_eq!(legacy_dst_rel("DCIM/100CANON/IMG_0001.JPG"), "01_RAW/DCIM/100CANON/IMG_0001.JPG");
    }

    #[test]
    fn routes_to_first_matching_rule() {
        let rules = vec![
            RoutingRule {
                label: "raw".into(),
                matches: Some(crate::model::RuleMatch::MediaType(MediaType::Raw)),
                dest_pattern: "RAW".into(),
            },
            RoutingRule {
                label: "catch_all".into(),
                matches: None,
                dest_pattern: "PHOTO".into(),
            },
        ];
        let file = ScannedFile {
            src_rel: "a.jpg".into(),
            abs_path: "/tmp/a.jpg".into(),
            bytes: 1,
            media_type: MediaType::Photo,
        };
        let matched = route(&rules, &file).unwrap();
        assert_eq!(matched.label, "catch_all");
    }
}
