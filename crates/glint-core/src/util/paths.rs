//! Slash-separated path helpers.
//!
//! Container paths and tool-reported filenames are always `/`-separated,
//! regardless of the host platform, so these helpers work on strings
//! rather than `std::path::Path`.

/// Lexically clean a slash path.
///
/// Drops empty and `.` segments, resolves `..` against preceding
/// segments, and never climbs above a leading `/`. An empty result is
/// returned as `.` (or `/` for rooted input).
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Join slash path elements and clean the result.
///
/// Empty elements are ignored; if every element is empty the result is
/// the empty string.
pub fn join(elements: &[&str]) -> String {
    let parts: Vec<&str> = elements.iter().copied().filter(|e| !e.is_empty()).collect();
    if parts.is_empty() {
        return String::new();
    }
    clean(&parts.join("/"))
}

/// Why a caller-supplied subpath cannot be used, if it cannot.
pub fn subpath_violation(subpath: &str) -> Option<&'static str> {
    if subpath.starts_with('/') {
        return Some("must be relative to the source root");
    }
    let cleaned = clean(subpath);
    if cleaned == ".." || cleaned.starts_with("../") {
        return Some("escapes the source root");
    }
    None
}
