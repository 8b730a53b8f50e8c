//! HTML reduction: EPUB-internal (X)HTML fragments to plain text.
//!
//! Tag-to-newline strategy: block-level tags become newlines, every other
//! tag is stripped, the common entities are decoded, and non-empty lines
//! are rejoined with one blank line between paragraphs. Output is guaranteed
//! free of tag markup.

use std::sync::LazyLock;

use regex::Regex;

/// Block-level tags that imply a paragraph break, opening or self-closing.
static RE_BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?:p|div|h[1-6]|li|br|section|article)\b[^>]*>").unwrap()
});

/// Any remaining tag, opening or closing.
static RE_ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[^>]*>").unwrap());

/// The entities that actually occur in EPUB chapter markup.
/// `&amp;` is decoded last so entity text is not double-decoded.
const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&rsquo;", "\u{2019}"),
    ("&lsquo;", "\u{2018}"),
    ("&rdquo;", "\u{201D}"),
    ("&ldquo;", "\u{201C}"),
    ("&amp;", "&"),
];

/// Reduce an HTML fragment to plain text with `\n\n` paragraph breaks.
pub fn reduce(html: &str) -> String {
    let broken = RE_BLOCK_TAG.replace_all(html, "\n");
    let stripped = RE_ANY_TAG.replace_all(&broken, "");

    let mut text = stripped.into_owned();
    for (entity, replacement) in ENTITIES {
        text = text.replace(entity, replacement);
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_become_double_newlines() {
        let html = "<html><body><p>First.</p><p>Second.</p></body></html>";
        assert_eq!(reduce(html), "First.\n\nSecond.");
    }

    #[test]
    fn headings_and_divs_break_lines() {
        let html = "<h1>Title</h1><div>Body text.</div>";
        assert_eq!(reduce(html), "Title\n\nBody text.");
    }

    #[test]
    fn no_tag_markup_survives() {
        let html = r#"<section class="x"><p>A <em>styled</em> <span id="y">word</span>.</p></section>"#;
        let out = reduce(html);
        assert!(!out.contains('<'));
        assert_eq!(out, "A styled word.");
    }

    #[test]
    fn entities_are_decoded() {
        let html = "<p>Fish &amp; chips&nbsp;&ldquo;cost&rdquo; &lt;5&gt; &#39;quid&#39;</p>";
        assert_eq!(reduce(html), "Fish & chips \u{201C}cost\u{201D} <5> 'quid'");
    }

    #[test]
    fn amp_is_not_double_decoded() {
        // &amp;lt; is the text "&lt;", not a less-than sign.
        assert_eq!(reduce("<p>&amp;lt;</p>"), "&lt;");
    }

    #[test]
    fn consecutive_blank_lines_collapse() {
        let html = "<p>One.</p>\n\n\n<br/><br/>\n<p>Two.</p>";
        assert_eq!(reduce(html), "One.\n\nTwo.");
    }

    #[test]
    fn br_inside_paragraph_splits() {
        let html = "<p>Line one<br>Line two</p>";
        assert_eq!(reduce(html), "Line one\n\nLine two");
    }

    #[test]
    fn empty_fragment_reduces_to_empty() {
        assert_eq!(reduce(""), "");
        assert_eq!(reduce("<div></div>"), "");
    }
}
