//! # Scene Splitting
//!
//! Turns raw story text into an ordered list of caption-sized scenes.
//!
//! The pipeline is three pure string passes:
//!
//! ```text
//! story text
//!     ↓  normalize        — drop <tags>, collapse whitespace
//!     ↓  split_sentences  — break after . ! ? before a capital or quote
//!     ↓  chunk            — greedily join sentences until a word minimum
//! scenes (capped at max_scenes)
//! ```
//!
//! Sentence detection is a heuristic. "Dr. Smith" splits after "Dr." and a
//! sentence ending in a lowercase word never splits. Both are accepted.

use serde::Serialize;

/// One caption-sized unit of the story, 1-indexed in story order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scene {
    pub index: usize,
    pub text: String,
}

impl Scene {
    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }
}

/// Number of whitespace-delimited words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split a story into scenes.
///
/// Sentences are accumulated into a running chunk until it reaches
/// `min_words_per_panel` words, at which point the chunk becomes a scene.
/// Whatever is left after the last sentence becomes the final scene even if
/// it is short. The result is truncated to `max_scenes`.
pub fn split_story(text: &str, max_scenes: usize, min_words_per_panel: usize) -> Vec<Scene> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(&normalized) {
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(sentence);

        if word_count(&current) >= min_words_per_panel {
            chunks.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
        .into_iter()
        .take(max_scenes)
        .enumerate()
        .map(|(i, text)| Scene { index: i + 1, text })
        .collect()
}

/// Strip `<...>` tags, collapse whitespace runs into single spaces, trim.
pub fn normalize(text: &str) -> String {
    let stripped = strip_tags(text);
    let mut out = String::with_capacity(stripped.len());
    for word in stripped.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Remove every `<` … `>` span with at least one character inside.
///
/// Tags may span lines. A lone `<` with no closing `>`, or an empty `<>`, is
/// kept as text.
fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('>') {
            Some(close) if close > 0 => {
                rest = &after[close + 1..];
            }
            _ => {
                out.push('<');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Split text into sentences.
///
/// A boundary is a whitespace run preceded by `.`, `!` or `?` and followed by
/// an ASCII capital letter or a quote. A run that contains a newline after
/// its first character is also a boundary. Returned sentences are trimmed;
/// empty ones are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 1;

    while i < chars.len() {
        let (byte, ch) = chars[i];
        if !ch.is_whitespace() || !ends_sentence(chars[i - 1].1) {
            i += 1;
            continue;
        }

        let mut j = i;
        while j < chars.len() && chars[j].1.is_whitespace() {
            j += 1;
        }

        let newline_inside = chars[i + 1..j].iter().any(|&(_, c)| c == '\n');
        let opens_next = j < chars.len() && opens_sentence(chars[j].1);
        if opens_next || (newline_inside && j < chars.len()) {
            sentences.push(&text[start..byte]);
            start = chars[j].0;
        }
        i = j;
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn ends_sentence(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

fn opens_sentence(ch: char) -> bool {
    ch.is_ascii_uppercase() || ch == '"' || ch == '\''
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(scenes: &[Scene]) -> Vec<&str> {
        scenes.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_normalize_strips_tags_and_whitespace() {
        let raw = "  <p>The   ship\n\nsailed.</p>\t<br/>It sank.  ";
        assert_eq!(normalize(raw), "The ship sailed. It sank.");
    }

    #[test]
    fn test_normalize_tag_spanning_lines() {
        assert_eq!(normalize("a <span\nclass=x>b"), "a b");
    }

    #[test]
    fn test_normalize_keeps_unclosed_and_empty_brackets() {
        assert_eq!(normalize("1 < 2"), "1 < 2");
        assert_eq!(normalize("a <> b"), "a <> b");
    }

    #[test]
    fn test_normalize_stray_bracket_runs_to_next_close() {
        assert_eq!(normalize("1 < 2 and <> stays"), "1 stays");
    }

    #[test]
    fn test_normalize_nested_open_brackets() {
        // The first '<' runs to the first '>', swallowing the second '<'.
        assert_eq!(normalize("x<a<b>y"), "xy");
    }

    #[test]
    fn test_normalize_whitespace_only() {
        assert_eq!(normalize(" \n\t "), "");
    }

    #[test]
    fn test_split_sentences_basic() {
        let s = split_sentences("It rained. She ran! Why? \"Run,\" he said. 'Now.'");
        assert_eq!(s, vec!["It rained.", "She ran!", "Why?", "\"Run,\" he said.", "'Now.'"]);
    }

    #[test]
    fn test_split_sentences_requires_capital() {
        let s = split_sentences("He paid 3.50 dollars. then left. And 1. 2 stayed.");
        assert_eq!(s, vec!["He paid 3.50 dollars. then left.", "And 1. 2 stayed."]);
    }

    #[test]
    fn test_split_sentences_abbreviation_false_split() {
        let s = split_sentences("Dr. Smith arrived.");
        assert_eq!(s, vec!["Dr.", "Smith arrived."]);
    }

    #[test]
    fn test_split_sentences_newline_run() {
        let s = split_sentences("One. \ntwo");
        assert_eq!(s, vec!["One.", "two"]);
    }

    #[test]
    fn test_split_sentences_no_punctuation() {
        assert_eq!(split_sentences("just words here"), vec!["just words here"]);
    }

    #[test]
    fn test_pairs_single_word_sentences() {
        let scenes = split_story("A. B. C. D. E. F.", 50, 2);
        assert_eq!(texts(&scenes), vec!["A. B.", "C. D.", "E. F."]);
        assert_eq!(scenes[0].index, 1);
        assert_eq!(scenes[2].index, 3);
    }

    #[test]
    fn test_leftover_becomes_last_scene() {
        let scenes = split_story("A. B. C. D. E.", 50, 2);
        assert_eq!(texts(&scenes), vec!["A. B.", "C. D.", "E."]);
    }

    #[test]
    fn test_long_sentence_is_own_scene() {
        let story = "The old lighthouse keeper climbed the stairs. Wind. It howled at the door all night.";
        let scenes = split_story(story, 50, 5);
        assert_eq!(
            texts(&scenes),
            vec![
                "The old lighthouse keeper climbed the stairs.",
                "Wind. It howled at the door all night.",
            ]
        );
    }

    #[test]
    fn test_max_scenes_truncates() {
        let scenes = split_story("A. B. C. D. E. F.", 2, 1);
        assert_eq!(texts(&scenes), vec!["A.", "B."]);
    }

    #[test]
    fn test_max_scenes_zero() {
        assert!(split_story("A. B.", 0, 1).is_empty());
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(split_story("", 50, 5).is_empty());
        assert!(split_story("   \n\n  ", 50, 5).is_empty());
        assert!(split_story("<p></p>", 50, 5).is_empty());
    }

    #[test]
    fn test_word_minimum_holds_except_last() {
        let story = "Mira found a map. It was old. The ink had faded to brown. She traced the coast. \
                     A red X marked an island! Nobody had heard of it. \"We sail at dawn,\" she said. Go.";
        let scenes = split_story(story, 50, 5);
        assert!(scenes.len() > 1);
        for scene in &scenes[..scenes.len() - 1] {
            assert!(scene.word_count() >= 5, "short scene: {:?}", scene.text);
        }
    }

    #[test]
    fn test_scenes_rejoin_to_normalized_text() {
        let story = "<h1>Title</h1>\nMira found a map.  It was old.\n\nThe ink had faded. She traced it. Go.";
        let scenes = split_story(story, 50, 4);
        let joined = texts(&scenes).join(" ");
        assert_eq!(joined, normalize(story));
    }

    #[test]
    fn test_deterministic() {
        let story = "One two three. Four five six. Seven eight nine. Ten.";
        assert_eq!(split_story(story, 50, 3), split_story(story, 50, 3));
    }
}
