//! # Caption Wrapping
//!
//! Greedy, character-count line breaking for panel captions.
//!
//! Break opportunities come from UAX#14 (after spaces, after hyphens, ...).
//! Lines are filled greedily up to a character budget. A word longer than
//! the budget is split mid-word, first filling whatever room is left on the
//! current line. Whitespace at line ends is dropped.

use unicode_linebreak::linebreaks;

/// Captions are cut to this many lines. Later lines are dropped silently.
pub const MAX_CAPTION_LINES: usize = 4;

/// Split `text` into segments at every UAX#14 break opportunity.
///
/// Each segment keeps its trailing whitespace, so concatenating the
/// segments reproduces `text`.
fn segments(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    // linebreaks() yields the byte offset where the next segment begins;
    // the final entry is always text.len().
    for (offset, _) in linebreaks(text) {
        if offset > start {
            out.push(&text[start..offset]);
            start = offset;
        }
    }
    out
}

/// Wrap `text` into lines of at most `width` characters.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0usize;
    let mut pending_space = 0usize;

    for segment in segments(text) {
        let word = segment.trim_end();
        let trailing = segment[word.len()..].chars().count();
        let word = word.trim_start();

        if word.is_empty() {
            if line_len > 0 {
                pending_space += trailing;
            }
            continue;
        }

        let mut rest = word;
        loop {
            let gap = if line_len > 0 { pending_space } else { 0 };
            let room = width.saturating_sub(line_len + gap);
            let rest_len = rest.chars().count();

            if rest_len <= room {
                push_with_gap(&mut line, gap, rest);
                line_len += gap + rest_len;
                break;
            }

            if rest_len > width {
                // Too long for any line: fill what is left here, then continue.
                if room > 0 {
                    let split = byte_index_of_char(rest, room);
                    push_with_gap(&mut line, gap, &rest[..split]);
                    rest = &rest[split..];
                }
                lines.push(std::mem::take(&mut line));
                line_len = 0;
                pending_space = 0;
                continue;
            }

            lines.push(std::mem::take(&mut line));
            line_len = 0;
            pending_space = 0;
        }
        pending_space = trailing;
    }

    if line_len > 0 {
        lines.push(line);
    }
    lines
}

/// The lines actually drawn under a panel: wrapped, then cut to
/// [`MAX_CAPTION_LINES`].
pub fn caption_lines(caption: &str, chars_per_line: usize) -> Vec<String> {
    let mut lines = wrap(caption, chars_per_line);
    lines.truncate(MAX_CAPTION_LINES);
    lines
}

fn push_with_gap(line: &mut String, gap: usize, text: &str) {
    for _ in 0..gap {
        line.push(' ');
    }
    line.push_str(text);
}

fn byte_index_of_char(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_rejoin() {
        let text = "A well-known tale, told twice.";
        assert_eq!(segments(text).concat(), text);
    }

    #[test]
    fn test_short_text_single_line() {
        assert_eq!(wrap("The cat sat.", 50), vec!["The cat sat."]);
    }

    #[test]
    fn test_empty_text_no_lines() {
        assert!(wrap("", 50).is_empty());
        assert!(wrap("   ", 50).is_empty());
    }

    #[test]
    fn test_greedy_fill() {
        let lines = wrap("aaa bbb ccc ddd", 7);
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn test_exact_fit() {
        let lines = wrap("abcde fghij", 5);
        assert_eq!(lines, vec!["abcde", "fghij"]);
    }

    #[test]
    fn test_breaks_after_hyphen() {
        let lines = wrap("a well-known story", 7);
        assert_eq!(lines, vec!["a well-", "known", "story"]);
    }

    #[test]
    fn test_long_word_split() {
        let lines = wrap("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_long_word_fills_current_line_first() {
        let lines = wrap("ab cdefghij", 5);
        assert_eq!(lines, vec!["ab cd", "efghi", "j"]);
    }

    #[test]
    fn test_leading_and_double_spaces() {
        let lines = wrap("  one  two", 20);
        assert_eq!(lines, vec!["one  two"]);
    }

    #[test]
    fn test_no_line_exceeds_width() {
        let text = "The lighthouse keeper climbed the spiral stairs, counting each of the \
                    two hundred and twelve steps as the storm battered the windows.";
        for width in [10, 25, 50, 70] {
            for line in wrap(text, width) {
                assert!(line.chars().count() <= width, "{:?} exceeds {}", line, width);
                assert_eq!(line.trim(), line);
            }
        }
    }

    #[test]
    fn test_wrap_preserves_words() {
        let text = "one two three four five six seven eight nine ten";
        let joined = wrap(text, 12).join(" ");
        assert_eq!(joined, text);
    }

    #[test]
    fn test_caption_lines_caps_at_four() {
        let caption = "word ".repeat(100);
        let lines = caption_lines(&caption, 10);
        assert_eq!(lines.len(), MAX_CAPTION_LINES);
        assert!(wrap(&caption, 10).len() > MAX_CAPTION_LINES);
    }

    #[test]
    fn test_multibyte_long_word() {
        let lines = wrap("ééééé", 2);
        assert_eq!(lines, vec!["éé", "éé", "é"]);
    }
}
