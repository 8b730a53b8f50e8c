//! Text normalization: strips application artifacts and boilerplate.
//!
//! Pure function over text blobs; always returns a string, possibly empty.
//! Applied to every EPUB chapter after HTML reduction and to pasted text
//! before chapter splitting.

use std::sync::LazyLock;

use regex::Regex;

/// Literal UI-artifact strings that leak into pasted content when text is
/// captured from a browser surface.
const UI_ARTIFACTS: &[&str] = &[
    "[scroll-restoration]",
    "Skip to main content",
    "Loading…",
];

/// Whole lines of publisher/credit boilerplate, matched case-insensitively.
/// The trailing newline is consumed so removal leaves no blank line behind.
static RE_BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mi)^[^\n]*(?:project gutenberg|all rights reserved|copyright\s*(?:©|\(c\)|\d{4})|converted by|this ebook is for|ebook conversion)[^\n]*\n?",
    )
    .unwrap()
});

/// Zero-width spaces (U+200B) injected by rich-text editors.
static RE_ZERO_WIDTH: LazyLock<Regex> = LazyLock::new(|| Regex::new("\u{200B}").unwrap());

/// Remove UI artifacts, zero-width characters, and known boilerplate lines,
/// then trim. Pure; never fails.
pub fn normalize(text: &str) -> String {
    let mut out = text.to_string();

    for artifact in UI_ARTIFACTS {
        out = out.replace(artifact, "");
    }

    out = RE_ZERO_WIDTH.replace_all(&out, "").into_owned();
    out = RE_BOILERPLATE.replace_all(&out, "").into_owned();

    out.trim().to_string()
}
