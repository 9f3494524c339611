//! Collection path normalization.
//!
//! Stored paths are slash-separated and relative: no leading `/` or `./`, no
//! trailing `/`. Lookups, patterns, and directory listings all go through
//! [`normalize`] so they compare against the same form.

/// Normalize a path: backslashes become `/`, empty and `.` segments are dropped,
/// leading and trailing slashes are removed. `..` segments are kept verbatim.
pub fn normalize(input: &str) -> String {
    let replaced = input.replace('\\', "/");
    let segments: Vec<&str> = replaced
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    segments.join("/")
}

/// True if any segment of an already-normalized path escapes its root.
pub fn has_parent_segment(normalized: &str) -> bool {
    normalized.split('/').any(|s| s == "..")
}

/// Parent of a normalized path; `""` is the root and has no parent.
pub fn parent(normalized: &str) -> Option<&str> {
    if normalized.is_empty() {
        return None;
    }
    match normalized.rfind('/') {
        Some(pos) => Some(&normalized[..pos]),
        None => Some(""),
    }
}

/// Final segment of a normalized path.
pub fn base_name(normalized: &str) -> &str {
    match normalized.rfind('/') {
        Some(pos) => &normalized[pos + 1..],
        None => normalized,
    }
}
