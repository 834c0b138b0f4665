//! Sentence-aligned text chunking
//!
//! Sentences are accumulated greedily until the next one would push the chunk
//! past `max_size` characters. A sentence that is longer than `max_size` on its
//! own becomes a single oversized chunk; it is never cut.

use std::iter::Peekable;

use unicode_segmentation::{USentenceBoundIndices, UnicodeSegmentation};

/// A contiguous, trimmed slice of a document's text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Position within the document, starting at 0
    pub index: usize,
    /// Chunk text
    pub text: &'a str,
}

impl Chunk<'_> {
    /// Size in characters
    pub fn size(&self) -> usize {
        self.text.chars().count()
    }
}

/// Splits text into chunks of at most `max_size` characters
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    max_size: usize,
}

impl TextChunker {
    /// Create a new chunker. `max_size` is clamped to at least 1.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
        }
    }

    /// Maximum chunk size in characters
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Lazily chunk `text`. Each call starts from scratch.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            sentences: text.split_sentence_bound_indices().peekable(),
            max_size: self.max_size,
            next_index: 0,
        }
    }
}

/// Chunk `text` into pieces of at most `max_size` characters
pub fn chunk(text: &str, max_size: usize) -> Chunks<'_> {
    TextChunker::new(max_size).chunks(text)
}

/// Iterator returned by [`TextChunker::chunks`]
pub struct Chunks<'a> {
    text: &'a str,
    sentences: Peekable<USentenceBoundIndices<'a>>,
    max_size: usize,
    next_index: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut start: Option<usize> = None;
        let mut end = 0usize;
        // Characters in the trimmed chunk so far, and trailing whitespace
        // after it that a later sentence may pull in.
        let mut body_chars = 0usize;
        let mut trailing_ws = 0usize;

        while let Some(&(offset, sentence)) = self.sentences.peek() {
            let sentence_end = offset + sentence.len();
            let content = sentence.trim_end();
            let sentence_trailing = sentence[content.len()..].chars().count();

            match start {
                None => {
                    self.sentences.next();
                    let content = content.trim_start();
                    if content.is_empty() {
                        continue;
                    }
                    start = Some(offset);
                    end = sentence_end;
                    body_chars = content.chars().count();
                    trailing_ws = sentence_trailing;
                }
                Some(_) if content.is_empty() => {
                    self.sentences.next();
                    end = sentence_end;
                    trailing_ws += sentence_trailing;
                }
                Some(_) => {
                    let candidate = body_chars + trailing_ws + content.chars().count();
                    if candidate > self.max_size {
                        break;
                    }
                    self.sentences.next();
                    end = sentence_end;
                    body_chars = candidate;
                    trailing_ws = sentence_trailing;
                }
            }
        }

        let start = start?;
        let chunk = Chunk {
            index: self.next_index,
            text: self.text[start..end].trim(),
        };
        self.next_index += 1;
        Some(chunk)
    }
}

impl std::iter::FusedIterator for Chunks<'_> {}

/// Group consecutive sentences `group_size` at a time.
///
/// Groups are untrimmed contiguous slices, so concatenating them gives back
/// `text` exactly.
pub fn sentence_groups(text: &str, group_size: usize) -> Vec<&str> {
    let group_size = group_size.max(1);
    let mut groups = Vec::new();
    let mut start = 0usize;
    let mut count = 0usize;

    for (offset, sentence) in text.split_sentence_bound_indices() {
        if sentence.trim().is_empty() {
            continue;
        }
        count += 1;
        if count == group_size {
            let end = offset + sentence.len();
            groups.push(&text[start..end]);
            start = end;
            count = 0;
        }
    }

    if start < text.len() {
        groups.push(&text[start..]);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn texts(text: &str, max_size: usize) -> Vec<&str> {
        chunk(text, max_size).map(|c| c.text).collect()
    }

    fn normalize(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_one_sentence_per_chunk_when_pairs_overflow() {
        assert_eq!(texts("A. B. C.", 3), vec!["A.", "B.", "C."]);
    }

    #[test]
    fn test_greedy_accumulation() {
        let text = "One two. Three four. Five six. Seven.";
        assert_eq!(
            texts(text, 20),
            vec!["One two. Three four.", "Five six. Seven."]
        );
    }

    #[test]
    fn test_oversized_sentence_is_kept_whole() {
        let long = "This single sentence is far longer than the limit.";
        let text = format!("Hi. {} Bye.", long);
        let chunks = texts(&text, 10);
        assert_eq!(chunks, vec!["Hi.", long, "Bye."]);
    }

    #[test]
    fn test_size_includes_whitespace_between_sentences() {
        let text = "Alpha beta.\n\n  Gamma.";
        assert_eq!(texts(text, 21), vec!["Alpha beta.\n\n  Gamma."]);
        assert_eq!(texts(text, 20), vec!["Alpha beta.", "Gamma."]);
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(texts("", 100).is_empty());
        assert!(texts("   \n\t ", 100).is_empty());
    }

    #[test]
    fn test_indices_are_sequential_and_restartable() {
        let chunker = TextChunker::new(3);
        let first: Vec<_> = chunker.chunks("A. B. C.").map(|c| c.index).collect();
        let second: Vec<_> = chunker.chunks("A. B. C.").map(|c| c.index).collect();
        assert_eq!(first, vec![0, 1, 2]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_size_counts_characters_not_bytes() {
        let chunks: Vec<_> = chunk("Ça va. Très bien.", 6).collect();
        assert_eq!(chunks[0].text, "Ça va.");
        assert_eq!(chunks[0].size(), 6);
    }

    #[test]
    fn test_sentence_groups_cover_text() {
        let text = "One. Two. Three. Four. Five.";
        let groups = sentence_groups(text, 2);
        assert_eq!(groups, vec!["One. Two. ", "Three. Four. ", "Five."]);
        assert_eq!(groups.concat(), text);
        assert!(sentence_groups("", 2).is_empty());
    }

    proptest! {
        #[test]
        fn prop_chunks_reconstruct_text(
            words in prop::collection::vec("[a-zA-Z]{1,12}", 0..60),
            ends in prop::collection::vec(prop::sample::select(vec![" ", ". ", "! ", "? ", ".\n\n"]), 60),
            max_size in 1usize..80,
        ) {
            let text: String = words
                .iter()
                .zip(ends.iter())
                .map(|(w, e)| format!("{}{}", w, e))
                .collect();

            let joined = chunk(&text, max_size).map(|c| c.text).collect::<Vec<_>>().join(" ");
            prop_assert_eq!(normalize(&joined), normalize(&text));
        }

        #[test]
        fn prop_chunks_respect_max_size(
            words in prop::collection::vec("[a-z]{1,10}", 1..60),
            max_size in 1usize..60,
        ) {
            let text = words
                .chunks(3)
                .map(|s| format!("{}.", s.join(" ")))
                .collect::<Vec<_>>()
                .join(" ");

            for c in chunk(&text, max_size) {
                if c.size() > max_size {
                    let sentences = c.text.split_sentence_bounds().filter(|s| !s.trim().is_empty()).count();
                    prop_assert_eq!(sentences, 1);
                }
            }
        }
    }
}
