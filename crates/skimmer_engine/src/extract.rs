use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::types::FileCandidate;

const DEFAULT_MAX_CANDIDATES: usize = 5_000;

/// Elements whose structural role marks "one row = one listing entry".
const ROW_SELECTOR: &str = r#"[role="row"], [role="listitem"], tr"#;
const ANCHOR_SELECTOR: &str = "a[href]";

/// Navigation targets (folder views, metadata pages), not file content.
const PAGE_EXTENSIONS: &[&str] = &[".aspx", ".html", ".htm"];

#[derive(Debug, Clone)]
pub struct ExtractSettings {
    /// Only keep entries whose display text contains this substring.
    /// `None` or an empty string disables filtering.
    pub filter_keyword: Option<String>,
    /// Hard cap on candidates per scan, against pathological documents.
    pub max_candidates: usize,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            filter_keyword: None,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

/// One way of scanning a listing document for downloadable entries.
///
/// Strategies are tried in a fixed order and never merged: the first one
/// that yields any candidate wins the whole scan.
pub trait CandidateStrategy {
    fn scan(
        &self,
        document: &Html,
        base: Option<&Url>,
        settings: &ExtractSettings,
    ) -> Vec<FileCandidate>;
}

/// Primary, structural strategy: one candidate per listing row, taken from
/// the first usable hyperlink inside the row.
#[derive(Debug, Default)]
pub struct RowStrategy;

impl CandidateStrategy for RowStrategy {
    fn scan(
        &self,
        document: &Html,
        base: Option<&Url>,
        settings: &ExtractSettings,
    ) -> Vec<FileCandidate> {
        let (Ok(row_sel), Ok(anchor_sel)) =
            (Selector::parse(ROW_SELECTOR), Selector::parse(ANCHOR_SELECTOR))
        else {
            return Vec::new();
        };

        let mut acc = ScanAccumulator::new(settings.max_candidates);
        for row in document.select(&row_sel) {
            let Some((url, anchor)) = first_usable_anchor(row, &anchor_sel, base) else {
                continue;
            };
            let text = collapsed_text(anchor);
            if !passes_filter(&text, settings) {
                continue;
            }
            acc.push(text, url);
        }
        acc.into_candidates()
    }
}

/// Permissive fallback strategy for unrecognized layouts: every hyperlink
/// in the document, in document order, independent of row grouping.
#[derive(Debug, Default)]
pub struct DocumentStrategy;

impl CandidateStrategy for DocumentStrategy {
    fn scan(
        &self,
        document: &Html,
        base: Option<&Url>,
        settings: &ExtractSettings,
    ) -> Vec<FileCandidate> {
        let Ok(anchor_sel) = Selector::parse(ANCHOR_SELECTOR) else {
            return Vec::new();
        };

        let mut acc = ScanAccumulator::new(settings.max_candidates);
        for anchor in document.select(&anchor_sel) {
            let Some(url) = usable_anchor_target(anchor, base) else {
                continue;
            };
            let text = collapsed_text(anchor);
            if !passes_filter(&text, settings) {
                continue;
            }
            acc.push(text, url);
        }
        acc.into_candidates()
    }
}

/// Scans a listing document for downloadable file entries.
///
/// Runs the structural [`RowStrategy`] first and falls back to the global
/// [`DocumentStrategy`] only when the structural scan finds nothing. The
/// fallback's output (possibly also empty) is final. Output order is
/// encounter order; duplicate locators keep their first occurrence.
pub fn extract_candidates(
    html: &str,
    base: Option<&Url>,
    settings: &ExtractSettings,
) -> Vec<FileCandidate> {
    let document = Html::parse_document(html);

    let candidates = RowStrategy.scan(&document, base, settings);
    if !candidates.is_empty() {
        log::debug!("structural scan found {} candidates", candidates.len());
        return candidates;
    }

    log::debug!("structural scan found nothing, trying the global fallback");
    DocumentStrategy.scan(&document, base, settings)
}

/// Scoped dedupe state for one strategy scan: seen locators and the ordered
/// candidates collected so far.
struct ScanAccumulator {
    candidates: Vec<FileCandidate>,
    seen: HashSet<String>,
    max: usize,
}

impl ScanAccumulator {
    fn new(max: usize) -> Self {
        Self {
            candidates: Vec::new(),
            seen: HashSet::new(),
            max,
        }
    }

    fn push(&mut self, display_text: String, url: Url) {
        if self.candidates.len() >= self.max {
            return;
        }
        let url = String::from(url);
        // First occurrence wins; later duplicates of the locator are dropped.
        if !self.seen.insert(url.clone()) {
            return;
        }
        self.candidates.push(FileCandidate { display_text, url });
    }

    fn into_candidates(self) -> Vec<FileCandidate> {
        self.candidates
    }
}

fn first_usable_anchor<'a>(
    row: ElementRef<'a>,
    anchor_sel: &Selector,
    base: Option<&Url>,
) -> Option<(Url, ElementRef<'a>)> {
    row.select(anchor_sel)
        .find_map(|anchor| usable_anchor_target(anchor, base).map(|url| (url, anchor)))
}

fn usable_anchor_target(anchor: ElementRef<'_>, base: Option<&Url>) -> Option<Url> {
    let raw = anchor.value().attr("href")?;
    let url = resolve_href(raw, base)?;
    usable_target(&url).then_some(url)
}

/// Resolves an href to an absolute URL, rejecting script pseudo-locators
/// and fragment/query-only references. Malformed hrefs yield `None`.
fn resolve_href(reference: &str, base: Option<&Url>) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with('?') || lower.starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url);
    }
    base.and_then(|base| base.join(trimmed).ok())
}

/// A locator is usable when it is fetchable over HTTP, does not look like a
/// navigation page, and its last path segment carries a file-extension dot.
fn usable_target(url: &Url) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let path = url.path().to_ascii_lowercase();
    if PAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return false;
    }
    let Some(segment) = url.path_segments().and_then(|mut segments| segments.next_back()) else {
        return false;
    };
    !segment.is_empty() && segment.contains('.')
}

fn passes_filter(display_text: &str, settings: &ExtractSettings) -> bool {
    match settings.filter_keyword.as_deref() {
        None | Some("") => true,
        Some(keyword) => display_text.contains(keyword),
    }
}

fn collapsed_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for piece in element.text() {
        for ch in piece.chars() {
            if ch.is_whitespace() {
                if !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
            } else {
                out.push(ch);
            }
        }
    }
    out.trim().to_string()
}
