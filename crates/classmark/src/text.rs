//! Character-offset helpers over the annotated text.
//!
//! Spans count Unicode scalar values, not bytes, so every lookup into the
//! text goes through these helpers.

use unicode_segmentation::UnicodeSegmentation;

use classmark_core::Span;

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The text covered by `span`, or `None` if it runs past the end.
pub fn slice(text: &str, span: Span) -> Option<&str> {
    let start = byte_offset(text, span.start())?;
    let end = byte_offset(text, span.end())?;
    text.get(start..end)
}

/// Every word in `text` with its character span, in order.
///
/// Words follow Unicode word boundaries; punctuation and whitespace runs
/// are skipped.
pub fn words(text: &str) -> impl Iterator<Item = (Span, &str)> {
    let mut chars_before = 0;
    let mut bytes_before = 0;
    text.split_word_bound_indices()
        .filter_map(move |(byte_index, segment)| {
            chars_before += char_len(&text[bytes_before..byte_index]);
            bytes_before = byte_index;
            let start = chars_before;
            let is_word = segment.chars().any(char::is_alphanumeric);
            if is_word {
                Span::try_new(start, start + char_len(segment)).map(|span| (span, segment))
            } else {
                None
            }
        })
}

/// The word under the character `offset`, as an editor selects it on click.
pub fn word_at(text: &str, offset: usize) -> Option<(Span, &str)> {
    words(text)
        .take_while(|(span, _)| span.start() <= offset)
        .find(|(span, _)| span.contains(offset))
}

/// The `nth` (1-based) whole-word occurrence of `word`.
pub fn find_word<'a>(text: &'a str, word: &str, nth: usize) -> Option<(Span, &'a str)> {
    words(text)
        .filter(|(_, candidate)| *candidate == word)
        .nth(nth.checked_sub(1)?)
}

fn byte_offset(text: &str, char_offset: usize) -> Option<usize> {
    if char_offset == 0 {
        return Some(0);
    }
    text.char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .nth(char_offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = "A User can borrow a Book.";

    #[test]
    fn test_words() {
        let found: Vec<_> = words(SCENARIO).map(|(span, word)| (span.range(), word)).collect();
        assert_eq!(
            found,
            vec![
                (0..1, "A"),
                (2..6, "User"),
                (7..10, "can"),
                (11..17, "borrow"),
                (18..19, "a"),
                (20..24, "Book"),
            ]
        );
    }

    #[test]
    fn test_word_at() {
        assert_eq!(word_at(SCENARIO, 3), Some((Span::new(2..6), "User")));
        assert_eq!(word_at(SCENARIO, 20), Some((Span::new(20..24), "Book")));
        assert_eq!(word_at(SCENARIO, 6), None);
        assert_eq!(word_at(SCENARIO, 24), None);
        assert_eq!(word_at(SCENARIO, 100), None);
    }

    #[test]
    fn test_offsets_count_characters() {
        let text = "Ünïcode Café owns a Straße";
        let (span, word) = word_at(text, 9).unwrap();
        assert_eq!(word, "Café");
        assert_eq!(span, Span::new(8..12));
        assert_eq!(slice(text, span), Some("Café"));
        assert_eq!(char_len(text), 26);
        assert_eq!(find_word(text, "Straße", 1), Some((Span::new(20..26), "Straße")));
    }

    #[test]
    fn test_slice_out_of_bounds() {
        assert_eq!(slice(SCENARIO, Span::new(20..24)), Some("Book"));
        assert_eq!(slice(SCENARIO, Span::new(24..25)), Some("."));
        assert_eq!(slice(SCENARIO, Span::new(24..26)), None);
    }

    #[test]
    fn test_find_word_nth() {
        let text = "a Book and a Book";
        assert_eq!(find_word(text, "Book", 2), Some((Span::new(13..17), "Book")));
        assert_eq!(find_word(text, "Book", 3), None);
        assert_eq!(find_word(text, "Book", 0), None);
        assert_eq!(find_word(text, "Boo", 1), None);
    }
}
