//! Size-bounded chunking of chapter content.
//!
//! Storage backends cap the size of one chapter record, so oversized
//! chapters are split into consecutive character-counted slices. Splitting
//! is lossless: concatenating the chunks reproduces the input exactly.

/// Per-record content ceiling, in characters.
pub const MAX_CHUNK_CHARS: usize = 15_000;

/// Slice `text` into consecutive pieces of at most `max_chars` characters.
///
/// Always succeeds for a nonzero ceiling: empty input yields an empty vec;
/// input at or under the ceiling yields a single element. Counts characters,
/// not bytes, so multi-byte text never splits inside a code point.
///
/// # Panics
///
/// Panics if `max_chars` is zero.
pub fn chunk(text: &str, max_chars: usize) -> Vec<String> {
    assert!(max_chars > 0, "chunk ceiling must be positive");

    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk("", MAX_CHUNK_CHARS).is_empty());
    }

    #[test]
    fn short_input_is_one_chunk() {
        let chunks = chunk("hello", MAX_CHUNK_CHARS);
        assert_eq!(chunks, vec!["hello".to_string()]);
    }

    #[test]
    fn concatenation_reproduces_input() {
        let text = "abcdefghij".repeat(37);
        let chunks = chunk(&text, 23);
        assert_eq!(chunks.concat(), text);
        assert!(chunks[..chunks.len() - 1].iter().all(|c| c.chars().count() == 23));
        assert!(chunks.last().unwrap().chars().count() <= 23);
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let chunks = chunk(&"x".repeat(30), 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == 10));
    }

    #[test]
    #[should_panic(expected = "chunk ceiling must be positive")]
    fn zero_ceiling_panics() {
        chunk("anything", 0);
    }

    #[test]
    fn multibyte_text_splits_on_character_boundaries() {
        let text = "héllo wörld ẞcharf".repeat(10);
        let chunks = chunk(&text, 7);
        assert_eq!(chunks.concat(), text);
        for piece in &chunks {
            assert!(piece.chars().count() <= 7);
        }
    }
}
