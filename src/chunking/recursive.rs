//! Recursive, boundary-aware character splitter.
//!
//! Text is split on the coarsest boundary it contains (paragraph, line,
//! sentence, word), pieces small enough are merged back into chunks up to
//! `chunk_size` characters, and pieces that are still too large are split
//! again at the next finer boundary. Cutting between individual characters is
//! the final fallback.
//!
//! Sentence pieces keep their terminating `.`, `?` or `!` and are rejoined
//! with a single space.
//!
//! When a chunk is emitted, pieces are dropped from its front until at most
//! `chunk_overlap` characters remain; those carry over into the next chunk.
//!
//! All lengths are counted in `char`s, never bytes.

use std::collections::VecDeque;

const SENTENCE_TERMINATORS: [char; 3] = ['.', '?', '!'];

/// Boundaries a text can be split on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Separator {
    Paragraph,
    Line,
    /// `.`, `?` or `!` followed by a space.
    Sentence,
    Word,
    Char,
}

/// Boundaries tried from coarsest to finest.
const SEPARATORS: [Separator; 5] = [
    Separator::Paragraph,
    Separator::Line,
    Separator::Sentence,
    Separator::Word,
    Separator::Char,
];

impl Separator {
    /// Text placed between pieces when they are merged back together.
    fn joiner(self) -> &'static str {
        match self {
            Separator::Paragraph => "\n\n",
            Separator::Line => "\n",
            Separator::Sentence | Separator::Word => " ",
            Separator::Char => "",
        }
    }

    fn occurs_in(self, text: &str) -> bool {
        match self {
            Separator::Sentence => sentence_breaks(text).next().is_some(),
            Separator::Char => true,
            other => text.contains(other.joiner()),
        }
    }

    fn split(self, text: &str) -> Vec<&str> {
        match self {
            Separator::Char => text
                .char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect(),
            Separator::Sentence => {
                let mut pieces = Vec::new();
                let mut start = 0;
                for end in sentence_breaks(text) {
                    pieces.push(&text[start..end]);
                    // Skip the single space after the terminator.
                    start = end + 1;
                }
                pieces.push(&text[start..]);
                pieces
            }
            other => text.split(other.joiner()).collect(),
        }
    }
}

/// Byte offsets just past each sentence terminator that is followed by a space.
fn sentence_breaks(text: &str) -> impl Iterator<Item = usize> + '_ {
    let mut chars = text.char_indices().peekable();
    std::iter::from_fn(move || {
        while let Some((i, c)) = chars.next() {
            if SENTENCE_TERMINATORS.contains(&c) && matches!(chars.peek(), Some((_, ' '))) {
                return Some(i + c.len_utf8());
            }
        }
        None
    })
}

/// Splits text into overlapping, size-bounded chunks.
#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveCharacterSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into chunks. Whitespace-only input yields no chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_with(text, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[Separator]) -> Vec<String> {
        let (separator, finer) = pick_separator(text, separators);
        let joiner = separator.joiner();

        let mut chunks = Vec::new();
        let mut small: Vec<&str> = Vec::new();

        for piece in separator.split(text) {
            if char_len(piece) < self.chunk_size {
                small.push(piece);
                continue;
            }

            if !small.is_empty() {
                chunks.extend(self.merge(&small, joiner));
                small.clear();
            }

            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, finer));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge(&small, joiner));
        }

        chunks
    }

    /// Greedily join pieces into chunks of at most `chunk_size` characters.
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let piece_len = char_len(piece);
            let joined_sep = if current.is_empty() { 0 } else { sep_len };

            if total + piece_len + joined_sep > self.chunk_size && !current.is_empty() {
                if let Some(chunk) = join(&current, separator) {
                    chunks.push(chunk);
                }

                // Keep only the tail that fits in the overlap window.
                while !current.is_empty()
                    && (total > self.chunk_overlap
                        || (total > 0 && total + piece_len + sep_len > self.chunk_size))
                {
                    if current.len() > 1 {
                        total -= sep_len;
                    }
                    if let Some(dropped) = current.pop_front() {
                        total -= char_len(dropped);
                    }
                }
            }

            current.push_back(piece);
            total += piece_len;
            if current.len() > 1 {
                total += sep_len;
            }
        }

        if let Some(chunk) = join(&current, separator) {
            chunks.push(chunk);
        }

        chunks
    }
}

/// First boundary present in `text`, plus the finer ones after it.
fn pick_separator<'a>(text: &str, separators: &'a [Separator]) -> (Separator, &'a [Separator]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.occurs_in(text) {
            return (*sep, &separators[i + 1..]);
        }
    }
    (Separator::Char, &[])
}

fn join(pieces: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = pieces.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_whitespace_yield_nothing() {
        let splitter = RecursiveCharacterSplitter::new(500, 20);
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text("  \n\n \t ").is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = RecursiveCharacterSplitter::new(500, 20);
        let chunks = splitter.split_text("What is retrieval augmented generation?");
        assert_eq!(chunks, vec!["What is retrieval augmented generation?".to_string()]);
    }

    #[test]
    fn test_no_boundaries_hard_cut_with_exact_overlap() {
        let splitter = RecursiveCharacterSplitter::new(500, 20);
        let text: String = (0..1000).map(|i| (b'a' + (i % 26) as u8) as char).collect();

        let chunks = splitter.split_text(&text);

        // ceil(1000 / (500 - 20)) == 3
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks[..chunks.len() - 1] {
            assert_eq!(chunk.chars().count(), 500);
        }
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().skip(pair[0].chars().count() - 20).collect();
            let head: String = pair[1].chars().take(20).collect();
            assert_eq!(tail, head);
        }
        assert!(text.ends_with(chunks.last().unwrap().as_str()));
    }

    #[test]
    fn test_chunk_count_tracks_stride() {
        let splitter = RecursiveCharacterSplitter::new(500, 20);
        for len in [480usize, 2_000, 4_801, 10_000] {
            let text = "x".repeat(len);
            let chunks = splitter.split_text(&text);
            let expected = (len as f64 / 480.0).ceil() as usize;
            assert!(
                chunks.len().abs_diff(expected) <= 1,
                "len {} produced {} chunks, expected about {}",
                len,
                chunks.len(),
                expected
            );
            assert!(chunks.iter().all(|c| c.chars().count() <= 500));
        }
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let splitter = RecursiveCharacterSplitter::new(10, 2);
        let text = "é".repeat(25);
        let chunks = splitter.split_text(&text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks[0].chars().count(), 10);
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let splitter = RecursiveCharacterSplitter::new(60, 0);
        let first = "First paragraph talks about embeddings.";
        let second = "Second paragraph talks about vector stores.";
        let text = format!("{}\n\n{}", first, second);

        let chunks = splitter.split_text(&text);
        assert_eq!(chunks, vec![first.to_string(), second.to_string()]);
    }

    #[test]
    fn test_falls_back_to_words_inside_long_paragraph() {
        let splitter = RecursiveCharacterSplitter::new(20, 5);
        let text = "alpha beta gamma delta epsilon zeta eta theta";

        let chunks = splitter.split_text(text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20);
            // Word boundaries are respected: no chunk starts or ends mid-word.
            for word in chunk.split(' ') {
                assert!(text.split(' ').any(|w| w == word), "unexpected fragment {:?}", word);
            }
        }
    }

    #[test]
    fn test_word_overlap_repeats_tail_words() {
        let splitter = RecursiveCharacterSplitter::new(11, 5);
        let chunks = splitter.split_text("aaaa bbbb cccc dddd");
        assert_eq!(chunks, vec!["aaaa bbbb", "bbbb cccc", "cccc dddd"]);
    }

    #[test]
    fn test_single_line_transcript_breaks_between_sentences() {
        let splitter = RecursiveCharacterSplitter::new(500, 20);
        let sentence = "Retrieval augmented generation grounds each answer in passages found by search.";
        let text = vec![sentence; 20].join(" ");
        assert!(!text.contains('\n'));

        let chunks = splitter.split_text(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 500);
            assert!(chunk.starts_with("Retrieval"), "chunk starts mid-sentence: {:?}", chunk);
            assert!(chunk.ends_with('.'), "chunk ends mid-sentence: {:?}", chunk);
        }
    }

    #[test]
    fn test_sentence_terminators_stay_attached() {
        let splitter = RecursiveCharacterSplitter::new(12, 0);
        let chunks = splitter.split_text("Is it fast? Yes! It is.");
        assert_eq!(chunks, vec!["Is it fast?", "Yes! It is."]);
    }

    #[test]
    fn test_decimal_point_is_not_a_sentence_break() {
        let splitter = RecursiveCharacterSplitter::new(500, 0);
        let text = "Version 2.5 shipped today. It is faster.";
        assert_eq!(splitter.split_text(text), vec![text.to_string()]);
        assert_eq!(Separator::Sentence.split(text), vec!["Version 2.5 shipped today.", "It is faster."]);
    }
}
