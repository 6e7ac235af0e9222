//! Module resolution
//!
//! Maps a relative import specifier to a file path known to the current run:
//! relative-path join, then extension probing in a fixed priority order, then
//! a directory-index fallback. Non-relative specifiers (package imports) are
//! never resolved here; they stay as unresolved edge targets.

use std::collections::HashSet;

/// Extension probe order, highest priority first.
pub const EXTENSION_PROBE_ORDER: &[&str] = &["ts", "tsx", "js", "jsx"];

/// Whether a specifier is relative (and therefore resolvable within the repo).
pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Resolve a relative import from `importing_file` against the run's file set.
///
/// Probes, in order: the joined path as written, the path with each extension
/// appended, then `<path>/index.<ext>` for each extension.
pub fn resolve_import(
    importing_file: &str,
    specifier: &str,
    files: &HashSet<String>,
) -> Option<String> {
    if !is_relative(specifier) {
        return None;
    }

    let base_dir = match importing_file.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    };
    let joined = join_normalized(base_dir, specifier)?;

    if files.contains(&joined) {
        return Some(joined);
    }

    for ext in EXTENSION_PROBE_ORDER {
        let candidate = format!("{}.{}", joined, ext);
        if files.contains(&candidate) {
            return Some(candidate);
        }
    }

    for ext in EXTENSION_PROBE_ORDER {
        let candidate = format!("{}/index.{}", joined, ext);
        if files.contains(&candidate) {
            return Some(candidate);
        }
    }

    None
}

/// Join a directory and a relative specifier, collapsing `.` and `..`
/// segments. Returns None when `..` escapes the repository root.
fn join_normalized(base_dir: &str, specifier: &str) -> Option<String> {
    let mut segments: Vec<&str> = if base_dir.is_empty() {
        Vec::new()
    } else {
        base_dir.split('/').collect()
    };

    for part in specifier.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }

    Some(segments.join("/"))
}
