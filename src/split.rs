//! Chapter splitting for pasted manuscripts.
//!
//! A heuristic boundary regex locates "Chapter N" headers (arabic or roman),
//! or numbered-list headers at line starts, and slices the text at each
//! match. An incidental mid-sentence mention ("chapter 5 was his favorite")
//! will trigger a split; that is a known limitation of the heuristic, kept
//! deliberately rather than corrected.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::ChapterCandidate;

/// Title used when no chapter boundary is found.
const FALLBACK_TITLE: &str = "Full Volume";

static RE_CHAPTER_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)chapter\s+(?:\d+|[ivxlcdm]+)\b|^\d+\.").unwrap());

/// Slice pasted text into chapters at heuristic boundaries.
///
/// Zero matches yields the whole input as a single chapter titled
/// "Full Volume". Otherwise each chapter spans from its match to the start
/// of the next match (or end of text); the title is the matched header text.
pub fn split_pasted(text: &str) -> Vec<ChapterCandidate> {
    let matches: Vec<_> = RE_CHAPTER_BOUNDARY.find_iter(text).collect();

    if matches.is_empty() {
        return vec![ChapterCandidate {
            title: FALLBACK_TITLE.to_string(),
            content: text.to_string(),
        }];
    }

    let mut chapters = Vec::with_capacity(matches.len());
    for (i, m) in matches.iter().enumerate() {
        let end = matches.get(i + 1).map_or(text.len(), |next| next.start());
        let content = text[m.start()..end].trim_end();
        chapters.push(ChapterCandidate {
            title: m.as_str().trim().to_string(),
            content: content.to_string(),
        });
    }
    chapters
}
