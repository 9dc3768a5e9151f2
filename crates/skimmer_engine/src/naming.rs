use std::collections::HashSet;

use url::Url;

use crate::types::{FileCandidate, FinalizedFile};

const FALLBACK_NAME: &str = "unknown_file";

/// Maps candidates to batch-unique local names, preserving extraction order.
///
/// The base name prefers the filename parsed out of the locator over the raw
/// display text; collisions get a ` (n)` suffix inserted before the last-dot
/// extension. Splitting at the last dot means compound extensions keep only
/// their final part: a colliding `archive.tar.gz` becomes
/// `archive.tar (1).gz`. That is long-standing documented behavior.
pub fn finalize_names(candidates: Vec<FileCandidate>) -> Vec<FinalizedFile> {
    let mut assigned: HashSet<String> = HashSet::new();
    candidates
        .into_iter()
        .map(|candidate| {
            let base = sanitize_name(&derive_base_name(&candidate));
            let name = unique_name(base, &assigned);
            assigned.insert(name.clone());
            FinalizedFile {
                name,
                url: candidate.url,
            }
        })
        .collect()
}

/// Picks the pre-uniqueness name for one candidate: the percent-decoded
/// final path segment of the locator when it looks like a filename, the
/// display text otherwise, and a literal placeholder as a last resort.
fn derive_base_name(candidate: &FileCandidate) -> String {
    if let Some(segment) = decoded_last_segment(&candidate.url) {
        if !segment.is_empty() && segment.contains('.') && segment.chars().count() > 2 {
            return segment;
        }
    }

    let text = candidate.display_text.trim();
    if text.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        text.to_string()
    }
}

fn decoded_last_segment(url: &str) -> Option<String> {
    // Parsing drops the query string and fragment before the segment is taken.
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    Some(decoded)
}

/// Windows-safe cleanup of a chosen name: forbidden characters become `_`,
/// surrounding separators are trimmed, reserved device names are defused.
fn sanitize_name(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let mut name = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if name.is_empty() {
        name = FALLBACK_NAME.to_string();
    }
    if is_reserved_windows_name(&name) {
        name.push('_');
    }
    name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn unique_name(base: String, assigned: &HashSet<String>) -> String {
    if !assigned.contains(&base) {
        return base;
    }

    // Split at the *last* dot; without one the whole string is the stem.
    let (stem, extension) = match base.rfind('.') {
        Some(at) => base.split_at(at),
        None => (base.as_str(), ""),
    };

    let mut counter = 1usize;
    loop {
        let attempt = format!("{stem} ({counter}){extension}");
        if !assigned.contains(&attempt) {
            return attempt;
        }
        counter += 1;
    }
}
